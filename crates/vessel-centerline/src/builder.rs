//! Fluent builder for the full centerline pipeline.
//!
//! # Example
//!
//! ```
//! use vessel_centerline::CenterlineBuilder;
//! use vessel_mesh::Mesh;
//!
//! let mesh = Mesh::open_tube(12.0, 60.0, 24, 60);
//!
//! let result = CenterlineBuilder::new(&mesh)
//!     .acc_radius(15.0)
//!     .track_step(5.0)
//!     .build()
//!     .unwrap();
//!
//! assert!(!result.points.is_empty());
//! ```

use nalgebra::Point3;
use tracing::info;

use vessel_mesh::progress::{
    CallbackProgressReporter, NoOpProgressReporter, ProgressCallback, ProgressReporter,
};
use vessel_mesh::tracing_ext::{OperationTimer, log_domain, log_mesh_stats, log_progress};
use vessel_mesh::{Domain, FaceIndex, Mesh};

use crate::accumulate::{AccumulationStats, accumulate_with_progress};
use crate::error::{CenterlineError, CenterlineResult};
use crate::params::CenterlineParams;
use crate::relax::optimize_elastic_forces_with_progress;
use crate::track::track_centerline;

/// Statistics gathered across the pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CenterlineStats {
    /// Accumulation pass statistics.
    pub accumulation: AccumulationStats,
    /// Voxel domain the volume covered.
    pub domain: Option<Domain>,
    /// Points produced by tracking.
    pub tracked_points: usize,
    /// Tracked points without cross-section faces.
    pub dropped_points: usize,
    /// Relaxation iterations run.
    pub iterations: usize,
    /// Total squared radial error after relaxation.
    pub final_error: f64,
    /// Mean distance from the relaxed centerline to the surface.
    pub target_radius: f64,
    /// Whether relaxation converged before its iteration ceiling.
    pub converged: bool,
}

/// Result from [`CenterlineBuilder`].
#[derive(Debug, Clone)]
pub struct CenterlineBuildResult {
    /// Relaxed centerline, sorted by `z`.
    pub points: Vec<Point3<f64>>,
    /// Tracked centerline before relaxation.
    pub raw_points: Vec<Point3<f64>>,
    /// Voxel with the highest hit count, where tracking started.
    pub peak: [i64; 3],
    /// Pipeline statistics.
    pub stats: CenterlineStats,
}

/// Fluent builder for centerline extraction.
///
/// Runs accumulation, tracking and relaxation on a mesh expressed in voxel
/// units.
pub struct CenterlineBuilder<'a> {
    mesh: &'a Mesh,
    params: CenterlineParams,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> CenterlineBuilder<'a> {
    /// Create a builder with default parameters.
    pub fn new(mesh: &'a Mesh) -> Self {
        Self {
            mesh,
            params: CenterlineParams::default(),
            progress_callback: None,
        }
    }

    /// Replace all parameters.
    pub fn params(mut self, params: CenterlineParams) -> Self {
        self.params = params;
        self
    }

    /// Set the scan radius in voxels.
    ///
    /// Should exceed the vessel radius so rays from opposite walls meet
    /// near the axis.
    pub fn acc_radius(mut self, radius: f64) -> Self {
        self.params.acc_radius = radius;
        self
    }

    /// Set the tracking step in voxels.
    pub fn track_step(mut self, step: f64) -> Self {
        self.params.track_step = step;
        self
    }

    /// Flip every face's scan direction.
    pub fn invert_normals(mut self, invert: bool) -> Self {
        self.params.invert_normals = invert;
        self
    }

    /// Set the relaxation convergence threshold.
    pub fn relaxation_epsilon(mut self, epsilon: f64) -> Self {
        self.params.relaxation_epsilon = epsilon;
        self
    }

    /// Use the thin-vessel preset.
    pub fn fine(mut self) -> Self {
        self.params = CenterlineParams::fine();
        self
    }

    /// Use the wide-vessel preset.
    pub fn coarse(mut self) -> Self {
        self.params = CenterlineParams::coarse();
        self
    }

    /// Set a progress callback.
    ///
    /// Receives face counts during accumulation and iteration counts
    /// during relaxation.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Run the pipeline.
    pub fn build(self) -> CenterlineResult<CenterlineBuildResult> {
        let callback_reporter = self
            .progress_callback
            .as_ref()
            .map(CallbackProgressReporter::new);
        let reporter: &dyn ProgressReporter = match &callback_reporter {
            Some(r) => r,
            None => &NoOpProgressReporter,
        };
        run_pipeline(self.mesh, &self.params, reporter)
    }
}

/// Extract the centerline of `mesh` with the given parameters.
pub fn compute_centerline(
    mesh: &Mesh,
    params: &CenterlineParams,
) -> CenterlineResult<CenterlineBuildResult> {
    run_pipeline(mesh, params, &NoOpProgressReporter)
}

fn run_pipeline(
    mesh: &Mesh,
    params: &CenterlineParams,
    reporter: &dyn ProgressReporter,
) -> CenterlineResult<CenterlineBuildResult> {
    params.validate()?;
    if mesh.vertices.is_empty() || mesh.faces.is_empty() {
        return Err(CenterlineError::empty_mesh());
    }

    let _timer = OperationTimer::with_context("compute_centerline", mesh.face_count());
    log_mesh_stats(mesh, "centerline input");

    let domain = Domain::from_mesh_bounds(mesh, params.domain_padding, params.max_voxels)?;
    log_domain(&domain, "centerline volume");

    log_progress("compute_centerline", 0, 3, Some("accumulate"));
    let acc = accumulate_with_progress(mesh, domain, params, reporter)?;
    let peak = acc.peak();

    log_progress("compute_centerline", 1, 3, Some("track"));
    let seed = Domain::voxel_center(peak);
    let raw_points = track_centerline(&acc.hits, &acc.directions, seed, params);

    log_progress("compute_centerline", 2, 3, Some("relax"));
    let index = FaceIndex::new(mesh);
    let relaxed = optimize_elastic_forces_with_progress(
        mesh,
        &index,
        &acc.directions,
        &raw_points,
        params,
        reporter,
    );
    if relaxed.points.is_empty() {
        return Err(CenterlineError::empty_centerline(format!(
            "none of {} tracked points had cross-section faces",
            raw_points.len()
        )));
    }
    log_progress("compute_centerline", 3, 3, None);

    info!(
        tracked = raw_points.len(),
        relaxed = relaxed.points.len(),
        iterations = relaxed.iterations,
        radius = relaxed.target_radius,
        "Centerline complete"
    );

    let stats = CenterlineStats {
        accumulation: acc.stats,
        domain: Some(domain),
        tracked_points: raw_points.len(),
        dropped_points: relaxed.dropped,
        iterations: relaxed.iterations,
        final_error: relaxed.final_error,
        target_radius: relaxed.target_radius,
        converged: relaxed.converged,
    };

    Ok(CenterlineBuildResult {
        points: relaxed.points,
        raw_points,
        peak,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn create_test_tube() -> Mesh {
        Mesh::open_tube(12.0, 60.0, 24, 60)
    }

    #[test]
    fn test_builder_defaults() {
        let mesh = create_test_tube();
        let builder = CenterlineBuilder::new(&mesh);
        assert_eq!(builder.params, CenterlineParams::default());
    }

    #[test]
    fn test_builder_chaining() {
        let mesh = create_test_tube();
        let builder = CenterlineBuilder::new(&mesh)
            .acc_radius(15.0)
            .track_step(4.0)
            .invert_normals(true)
            .relaxation_epsilon(1e-4);
        assert_eq!(builder.params.acc_radius, 15.0);
        assert_eq!(builder.params.track_step, 4.0);
        assert!(builder.params.invert_normals);
        assert_eq!(builder.params.relaxation_epsilon, 1e-4);

        let coarse = CenterlineBuilder::new(&mesh).coarse();
        assert_eq!(coarse.params, CenterlineParams::coarse());
    }

    #[test]
    fn test_build_tube() {
        let mesh = create_test_tube();
        let result = CenterlineBuilder::new(&mesh)
            .acc_radius(15.0)
            .build()
            .unwrap();

        assert!(result.stats.domain.unwrap().contains_voxel(result.peak));
        assert!(result.points.len() <= result.raw_points.len());
        assert!(result.stats.converged);
        for p in &result.points {
            assert!(p.x.hypot(p.y) < 2.0, "{p:?} far from axis");
        }
    }

    #[test]
    fn test_build_reports_progress() {
        let mesh = create_test_tube();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let result = CenterlineBuilder::new(&mesh)
            .acc_radius(15.0)
            .with_progress(Box::new(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            }))
            .build();

        assert!(result.is_ok());
        assert!(calls.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = Mesh::new();
        let err = CenterlineBuilder::new(&mesh).build().unwrap_err();
        assert!(matches!(err, CenterlineError::EmptyMesh));
    }

    #[test]
    fn test_invalid_params_rejected_first() {
        let mesh = Mesh::new();
        let err = CenterlineBuilder::new(&mesh)
            .track_step(-1.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, CenterlineError::InvalidParams { .. }));
    }

    #[test]
    fn test_compute_centerline_matches_builder() {
        let mesh = create_test_tube();
        let params = CenterlineParams::default().with_acc_radius(15.0);
        let a = compute_centerline(&mesh, &params).unwrap();
        let b = CenterlineBuilder::new(&mesh).params(params).build().unwrap();
        assert_eq!(a.points, b.points);
        assert_eq!(a.peak, b.peak);
    }
}

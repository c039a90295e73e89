//! Elastic relaxation of a tracked polyline toward the vessel axis.
//!
//! Each point is tied to the faces of its cross-section. Every iteration
//! pushes the point so that its distances to those faces approach one
//! global target radius, moving only within the cross-section plane.

use nalgebra::{Point3, Vector3};
use tracing::{debug, info, warn};

use vessel_mesh::progress::{NoOpProgressReporter, ProgressReporter};
use vessel_mesh::tracing_ext::OperationTimer;
use vessel_mesh::{Mesh, SectionQuery, VoxelGrid};

use crate::accumulate::inward_normal;
use crate::params::CenterlineParams;

/// Outcome of [`optimize_elastic_forces`].
#[derive(Debug, Clone, Default)]
pub struct RelaxationResult {
    /// Relaxed points, in input order, without dropped points.
    pub points: Vec<Point3<f64>>,
    /// Iterations run.
    pub iterations: usize,
    /// Total squared radial error of the last iteration.
    pub final_error: f64,
    /// Mean point-to-face distance all points are pulled toward.
    pub target_radius: f64,
    /// Input points discarded for having no cross-section faces.
    pub dropped: usize,
    /// Whether the error drop fell below the threshold before the
    /// iteration ceiling.
    pub converged: bool,
}

/// A face tied to a point: its centroid and unit inward normal.
#[derive(Debug, Clone, Copy)]
struct SectionFace {
    centroid: Point3<f64>,
    normal: Option<Vector3<f64>>,
}

/// A polyline point with its cross-section faces.
#[derive(Debug, Clone)]
struct Anchor {
    position: Point3<f64>,
    direction: Vector3<f64>,
    faces: Vec<SectionFace>,
}

/// Relax `polyline` against the surface of `mesh`.
///
/// Returns an empty result when no point has cross-section faces.
pub fn optimize_elastic_forces(
    mesh: &Mesh,
    sections: &impl SectionQuery,
    directions: &VoxelGrid<Vector3<f64>>,
    polyline: &[Point3<f64>],
    params: &CenterlineParams,
) -> RelaxationResult {
    optimize_elastic_forces_with_progress(
        mesh,
        sections,
        directions,
        polyline,
        params,
        &NoOpProgressReporter,
    )
}

/// Relax `polyline`, reporting each iteration.
pub fn optimize_elastic_forces_with_progress(
    mesh: &Mesh,
    sections: &impl SectionQuery,
    directions: &VoxelGrid<Vector3<f64>>,
    polyline: &[Point3<f64>],
    params: &CenterlineParams,
    reporter: &dyn ProgressReporter,
) -> RelaxationResult {
    let _timer = OperationTimer::with_context("relax", polyline.len());

    let mut anchors = associate(mesh, sections, directions, polyline, params);
    let dropped = polyline.len() - anchors.len();
    if dropped > 0 {
        debug!(dropped, "Dropped points without cross-section faces");
    }
    if anchors.is_empty() {
        warn!(input = polyline.len(), "No point has cross-section faces");
        return RelaxationResult {
            dropped,
            ..Default::default()
        };
    }

    let target_radius = mean_radius(&anchors);
    info!(
        points = anchors.len(),
        target_radius, "Starting optimisation"
    );

    let ceiling = params.max_relaxation_iterations as u64;
    let mut previous_total = 0.0;
    let mut total = 0.0;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < params.max_relaxation_iterations {
        total = relax_once(&mut anchors, target_radius, params.face_angle_limit);
        iterations += 1;
        reporter.report_progress(iterations as u64, ceiling, "relax");

        let delta = if iterations == 1 {
            total
        } else {
            previous_total - total
        };
        debug!(iteration = iterations, total, delta, "Relaxation step");
        previous_total = total;

        if delta <= params.relaxation_epsilon {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            limit = params.max_relaxation_iterations,
            total, "Relaxation stopped at iteration limit"
        );
    }
    info!(iterations, final_error = total, converged, "Optimisation complete");

    RelaxationResult {
        points: anchors.iter().map(|a| a.position).collect(),
        iterations,
        final_error: total,
        target_radius,
        dropped,
        converged,
    }
}

fn associate(
    mesh: &Mesh,
    sections: &impl SectionQuery,
    directions: &VoxelGrid<Vector3<f64>>,
    polyline: &[Point3<f64>],
    params: &CenterlineParams,
) -> Vec<Anchor> {
    let radius = params.section_radius();
    polyline
        .iter()
        .filter_map(|&position| {
            let direction = directions
                .at_point(&position)
                .copied()
                .unwrap_or_else(Vector3::zeros);
            let faces: Vec<SectionFace> = sections
                .section_faces(&position, &direction, params.section_tolerance, radius)
                .into_iter()
                .filter_map(|fi| {
                    Some(SectionFace {
                        centroid: mesh.face_centroid(fi)?,
                        normal: inward_normal(mesh, fi),
                    })
                })
                .collect();
            (!faces.is_empty()).then_some(Anchor {
                position,
                direction,
                faces,
            })
        })
        .collect()
}

fn mean_radius(anchors: &[Anchor]) -> f64 {
    let (sum, count) = anchors
        .iter()
        .flat_map(|a| a.faces.iter().map(move |f| (f.centroid - a.position).norm()))
        .fold((0.0, 0usize), |(s, n), d| (s + d, n + 1));
    sum / count as f64
}

/// Apply one round of radial forces. Returns the total squared error.
fn relax_once(anchors: &mut [Anchor], target_radius: f64, angle_limit: f64) -> f64 {
    let mut total = 0.0;
    for anchor in anchors.iter_mut() {
        let mut sum = Vector3::zeros();
        let mut contributing = 0usize;

        for face in &anchor.faces {
            let v = face.centroid - anchor.position;
            let Some(unit) = v.try_normalize(f64::EPSILON) else {
                continue;
            };
            let Some(normal) = face.normal else {
                continue;
            };
            if unit.dot(&normal).abs().clamp(0.0, 1.0).acos() > angle_limit {
                continue;
            }
            let d = v.norm() - target_radius;
            sum += unit * d;
            total += d * d;
            contributing += 1;
        }

        if contributing == 0 {
            continue;
        }
        let dir_sq = anchor.direction.norm_squared();
        let radial = if dir_sq > 0.0 {
            sum - anchor.direction * (anchor.direction.dot(&sum) / dir_sq)
        } else {
            sum
        };
        anchor.position += radial / contributing as f64;
    }
    total
}

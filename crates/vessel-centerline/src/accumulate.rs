//! Directional accumulation of face rays into a voxel volume.
//!
//! Every face casts a ray from its centroid into the vessel. Voxels crossed
//! by many rays lie near the axis; the cross product of two rays meeting in
//! a voxel is parallel to the local axis, so summing those products yields a
//! direction field along the vessel.

use nalgebra::{Point3, Vector3};
use tracing::{debug, info, warn};

use vessel_mesh::progress::{NoOpProgressReporter, ProgressReporter};
use vessel_mesh::tracing_ext::OperationTimer;
use vessel_mesh::{Domain, MAX_FACE_VERTICES, Mesh, Triangle, VoxelGrid, nearest_voxel};

use crate::error::{CenterlineError, CenterlineResult};
use crate::params::CenterlineParams;

/// Faces between two progress reports.
const PROGRESS_INTERVAL: usize = 1024;

/// Statistics from an accumulation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulationStats {
    /// Voxel with the highest hit count (first reached on ties).
    pub peak: [i64; 3],
    /// Hit count at the peak voxel.
    pub max_hits: u32,
    /// Faces whose ray was walked.
    pub faces_processed: usize,
    /// Faces skipped for having fewer than three or more than four vertices.
    pub faces_skipped: usize,
    /// Faces skipped because their leading triangle has zero area.
    pub degenerate_faces: usize,
    /// Faces whose scan direction was flipped by the probe test.
    pub normals_flipped: usize,
}

impl std::fmt::Display for AccumulationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "peak {:?} ({} hits), {} faces scanned, {} skipped, {} degenerate, {} flipped",
            self.peak,
            self.max_hits,
            self.faces_processed,
            self.faces_skipped,
            self.degenerate_faces,
            self.normals_flipped
        )
    }
}

/// Hit counts and direction field produced by [`accumulate`].
#[derive(Debug, Clone)]
pub struct Accumulation {
    /// Number of rays that visited each voxel.
    pub hits: VoxelGrid<u32>,
    /// Unit local axis direction per voxel, zero where none was recorded.
    pub directions: VoxelGrid<Vector3<f64>>,
    /// Pass statistics.
    pub stats: AccumulationStats,
}

impl Accumulation {
    /// The voxel domain both grids cover.
    #[inline]
    pub fn domain(&self) -> &Domain {
        self.hits.domain()
    }

    /// Voxel with the highest hit count.
    #[inline]
    pub fn peak(&self) -> [i64; 3] {
        self.stats.peak
    }

    /// Direction at the voxel nearest to `point`; zero outside the domain.
    #[inline]
    pub fn direction_at(&self, point: &Point3<f64>) -> Vector3<f64> {
        self.directions
            .at_point(point)
            .copied()
            .unwrap_or_else(Vector3::zeros)
    }
}

/// Scan direction of a face: the normal of its leading triangle taken in
/// `v0, v2, v1` order, which points into the tube for outward-wound meshes.
pub(crate) fn inward_normal(mesh: &Mesh, face_idx: usize) -> Option<Vector3<f64>> {
    let tri = mesh.triangle(face_idx)?;
    Triangle::new(tri.v0, tri.v2, tri.v1).normal()
}

/// Ray origin of a face: the centroid of the triangle that gives the normal.
pub(crate) fn ray_origin(mesh: &Mesh, face_idx: usize) -> Option<Point3<f64>> {
    mesh.triangle(face_idx).map(|tri| tri.centroid())
}

/// Accumulate face rays over `domain`.
///
/// Fails with `MeshError` for out-of-range indices or non-finite
/// coordinates, and with `EmptyAccumulation` when no ray visits a voxel of
/// the domain.
pub fn accumulate(
    mesh: &Mesh,
    domain: Domain,
    params: &CenterlineParams,
) -> CenterlineResult<Accumulation> {
    accumulate_with_progress(mesh, domain, params, &NoOpProgressReporter)
}

/// Accumulate face rays over `domain`, reporting progress per face batch.
pub fn accumulate_with_progress(
    mesh: &Mesh,
    domain: Domain,
    params: &CenterlineParams,
    reporter: &dyn ProgressReporter,
) -> CenterlineResult<Accumulation> {
    mesh.check_indices()?;
    let _timer = OperationTimer::with_context("accumulate", mesh.face_count());
    info!(
        faces = mesh.face_count(),
        acc_radius = params.acc_radius,
        "Accumulate"
    );

    let mut hits: VoxelGrid<u32> = VoxelGrid::new(domain);
    let mut directions: VoxelGrid<Vector3<f64>> = VoxelGrid::new(domain);
    let mut last_scan: VoxelGrid<Vector3<f64>> = VoxelGrid::new(domain);
    let mut stats = AccumulationStats::default();
    let total = mesh.face_count() as u64;

    for face_idx in 0..mesh.face_count() {
        if face_idx % PROGRESS_INTERVAL == 0 {
            reporter.report_progress(face_idx as u64, total, "accumulate");
        }

        let face_len = mesh.faces[face_idx].len();
        if !(3..=MAX_FACE_VERTICES).contains(&face_len) {
            warn!(
                face = face_idx,
                vertices = face_len,
                "Ignoring face, not a triangle or quad"
            );
            stats.faces_skipped += 1;
            continue;
        }

        let (Some(mut scan_dir), Some(centroid)) = (
            inward_normal(mesh, face_idx),
            ray_origin(mesh, face_idx),
        ) else {
            debug!(face = face_idx, "Skipping degenerate face");
            stats.degenerate_faces += 1;
            continue;
        };

        if params.invert_normals {
            scan_dir = -scan_dir;
        }
        if !domain.contains(&(centroid + scan_dir * params.probe_distance)) {
            scan_dir = -scan_dir;
            stats.normals_flipped += 1;
        }

        walk_ray(
            centroid,
            scan_dir,
            params,
            &mut hits,
            &mut directions,
            &mut last_scan,
            &mut stats,
        );
        stats.faces_processed += 1;
    }

    for dir in directions.values_mut() {
        let norm = dir.norm();
        if norm > 0.0 {
            *dir /= norm;
        }
    }
    reporter.report_progress(total, total, "accumulate");

    if stats.max_hits == 0 {
        return Err(CenterlineError::empty_accumulation(stats.faces_processed));
    }

    info!(
        peak = ?stats.peak,
        max_hits = stats.max_hits,
        processed = stats.faces_processed,
        skipped = stats.faces_skipped,
        flipped = stats.normals_flipped,
        "Accumulation complete"
    );

    Ok(Accumulation {
        hits,
        directions,
        stats,
    })
}

/// Walk one ray a voxel at a time and record it in every distinct voxel.
fn walk_ray(
    origin: Point3<f64>,
    scan_dir: Vector3<f64>,
    params: &CenterlineParams,
    hits: &mut VoxelGrid<u32>,
    directions: &mut VoxelGrid<Vector3<f64>>,
    last_scan: &mut VoxelGrid<Vector3<f64>>,
    stats: &mut AccumulationStats,
) {
    let mut current = origin;
    let mut previous_voxel = None;

    while (current - origin).norm() < params.acc_radius {
        let voxel = nearest_voxel(&current);
        if voxel != previous_voxel
            && let Some(idx) = voxel.and_then(|v| hits.index_of(v))
        {
            if hits.values()[idx] != 0 {
                let mut axis = last_scan.values()[idx].cross(&scan_dir);
                let field = &mut directions.values_mut()[idx];
                if axis.dot(field) < 0.0 {
                    axis = -axis;
                }
                if axis.norm() > params.area_epsilon {
                    *field += axis;
                }
            }
            last_scan.values_mut()[idx] = scan_dir;

            let values = hits.values_mut();
            values[idx] += 1;
            if values[idx] > stats.max_hits {
                stats.max_hits = values[idx];
                stats.peak = hits.voxel_at(idx);
            }
        }
        previous_voxel = voxel;
        current += scan_dir;
    }
}

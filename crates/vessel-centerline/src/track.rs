//! Centerline tracking through the accumulated volume.
//!
//! From a seed voxel the tracker steps along the direction field, samples a
//! square cross-section of the hit volume a step ahead and moves to the
//! brightest pixel. Each direction runs as its own [`TrackingContext`].

use nalgebra::{Point3, Vector3};
use tracing::{debug, info, trace, warn};

use vessel_mesh::tracing_ext::OperationTimer;
use vessel_mesh::{PlaneEmbedder, VolumeQuery, VoxelGrid};

use crate::params::CenterlineParams;

/// Why a tracking branch stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The seed voxel had no direction.
    NoSeedDirection,
    /// The current voxel had no direction.
    NoDirection,
    /// No hit voxel lies ahead of the current point.
    NothingAhead,
    /// The next patch centre left the domain.
    LeftDomain,
    /// The cross-section patch was empty.
    EmptyPatch,
    /// `max_track_steps` was reached.
    StepLimit,
}

/// Per-direction tracking state.
#[derive(Debug, Clone)]
pub struct TrackingContext {
    /// Point most recently accepted.
    pub current: Point3<f64>,
    /// Point accepted before `current`.
    pub previous: Point3<f64>,
    /// Direction of the last step, used to keep the field's sign consistent.
    pub last_direction: Vector3<f64>,
    /// Points visited so far, seed first.
    pub points: Vec<Point3<f64>>,
}

impl TrackingContext {
    /// Start a branch at `seed` heading along `direction`.
    ///
    /// `previous` is placed one step behind the seed so the first
    /// look-ahead test already has a heading.
    pub fn new(seed: Point3<f64>, direction: Vector3<f64>, step: f64) -> Self {
        Self {
            current: seed,
            previous: seed - direction * step,
            last_direction: direction,
            points: Vec::new(),
        }
    }

    /// Advance by one step. Returns the reason when the branch ends.
    ///
    /// The current point is recorded before anything else, so a stopped
    /// branch always ends with the last accepted point.
    pub fn step(
        &mut self,
        volume: &impl VolumeQuery,
        directions: &VoxelGrid<Vector3<f64>>,
        params: &CenterlineParams,
    ) -> Result<(), StopReason> {
        self.points.push(self.current);

        let mut dir = unit_direction(directions, &self.current).ok_or(StopReason::NoDirection)?;
        if self.last_direction.dot(&dir) < 0.0 {
            dir = -dir;
        }

        if !volume.oriented_sample_exists(
            &self.current,
            &self.previous,
            params.track_step,
            true,
            1,
        ) {
            return Err(StopReason::NothingAhead);
        }

        self.previous = self.current;
        let centre = self.current + dir * params.track_step;
        if !directions.domain().contains(&centre) {
            return Err(StopReason::LeftDomain);
        }

        let embedder =
            PlaneEmbedder::new(centre, dir, params.patch_size()).ok_or(StopReason::NoDirection)?;
        let patch = volume.extract_patch(&embedder);
        let (u, v) = patch.peak().ok_or(StopReason::EmptyPatch)?;

        self.last_direction = dir;
        let peak = embedder.embed(u, v);
        trace!(?centre, ?peak, "Patch peak");

        self.current = damp_peak(&self.previous, &centre, peak, &dir);
        Ok(())
    }
}

/// Pull a peak that keeps heading along `dir` halfway back to the patch
/// centre. A peak behind `previous`, or on top of it, is kept as is.
fn damp_peak(
    previous: &Point3<f64>,
    centre: &Point3<f64>,
    peak: Point3<f64>,
    dir: &Vector3<f64>,
) -> Point3<f64> {
    let Some(step_dir) = (peak - previous).try_normalize(f64::EPSILON) else {
        return peak;
    };
    let cos = step_dir.dot(dir).clamp(-1.0, 1.0);
    if cos.acos() < std::f64::consts::FRAC_PI_2 {
        Point3::from((centre.coords + peak.coords) * 0.5)
    } else {
        peak
    }
}

/// Unit direction stored at the voxel nearest `point`, if any.
fn unit_direction(directions: &VoxelGrid<Vector3<f64>>, point: &Point3<f64>) -> Option<Vector3<f64>> {
    directions
        .at_point(point)
        .and_then(|d| d.try_normalize(f64::EPSILON))
}

/// Follow the centerline from `seed` in one direction.
///
/// `forward` follows the direction stored at the seed, otherwise its
/// opposite. The seed is the first returned point.
pub fn track_patch_center(
    volume: &impl VolumeQuery,
    directions: &VoxelGrid<Vector3<f64>>,
    seed: Point3<f64>,
    forward: bool,
    params: &CenterlineParams,
) -> (Vec<Point3<f64>>, StopReason) {
    let Some(seed_dir) = unit_direction(directions, &seed) else {
        debug!(?seed, "Seed has no direction");
        return (vec![seed], StopReason::NoSeedDirection);
    };
    let seed_dir = if forward { seed_dir } else { -seed_dir };

    let mut ctx = TrackingContext::new(seed, seed_dir, params.track_step);
    let reason = loop {
        if ctx.points.len() >= params.max_track_steps {
            warn!(
                limit = params.max_track_steps,
                forward, "Tracking stopped at step limit"
            );
            break StopReason::StepLimit;
        }
        if let Err(reason) = ctx.step(volume, directions, params) {
            break reason;
        }
    };

    debug!(forward, points = ctx.points.len(), ?reason, "Tracking branch finished");
    (ctx.points, reason)
}

/// Track both directions from `seed` and join the branches.
///
/// The forward branch is reversed without its seed copy, the backward branch
/// is appended and the result is sorted by `z`.
pub fn track_centerline(
    volume: &impl VolumeQuery,
    directions: &VoxelGrid<Vector3<f64>>,
    seed: Point3<f64>,
    params: &CenterlineParams,
) -> Vec<Point3<f64>> {
    let _timer = OperationTimer::new("track_centerline");
    info!(?seed, step = params.track_step, "Track centerline");

    let (forward, forward_stop) = track_patch_center(volume, directions, seed, true, params);
    let (backward, backward_stop) = track_patch_center(volume, directions, seed, false, params);

    let mut points: Vec<Point3<f64>> = forward.iter().skip(1).rev().copied().collect();
    points.extend(backward);
    points.sort_by(|a, b| a.z.total_cmp(&b.z));

    info!(
        points = points.len(),
        ?forward_stop,
        ?backward_stop,
        "Tracking complete"
    );
    points
}

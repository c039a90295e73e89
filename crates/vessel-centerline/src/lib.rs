//! Centerline extraction for tubular vessel surfaces.
//!
//! The pipeline has three stages:
//!
//! - **Accumulation**: every face casts a ray into the vessel; voxels where
//!   many rays meet lie near the axis and receive a local axis direction
//!   ([`accumulate`])
//! - **Tracking**: starting at the busiest voxel, follow the direction field
//!   both ways by locating the brightest pixel of successive cross-section
//!   patches ([`track_centerline`])
//! - **Relaxation**: push each tracked point within its cross-section plane
//!   until its distances to the surrounding faces approach a common radius
//!   ([`optimize_elastic_forces`])
//!
//! # Quick Start
//!
//! ```
//! use vessel_centerline::{CenterlineBuilder, CenterlineParams};
//! use vessel_mesh::Mesh;
//!
//! let mesh = Mesh::open_tube(12.0, 60.0, 24, 60);
//! let result = CenterlineBuilder::new(&mesh)
//!     .params(CenterlineParams::default().with_acc_radius(15.0))
//!     .build()
//!     .unwrap();
//!
//! // Sorted by height along the vessel.
//! assert!(result.points.windows(2).all(|w| w[0].z <= w[1].z));
//! ```
//!
//! # Low-Level API
//!
//! The stages can be run separately, for example to inspect the volume:
//!
//! ```
//! use vessel_centerline::{CenterlineParams, accumulate, track_centerline};
//! use vessel_mesh::{Domain, Mesh};
//!
//! let mesh = Mesh::open_tube(12.0, 40.0, 24, 40);
//! let params = CenterlineParams::default().with_acc_radius(15.0);
//! let domain = Domain::from_mesh_bounds(&mesh, params.domain_padding, params.max_voxels).unwrap();
//!
//! let acc = accumulate(&mesh, domain, &params).unwrap();
//! let seed = Domain::voxel_center(acc.peak());
//! let polyline = track_centerline(&acc.hits, &acc.directions, seed, &params);
//! assert!(!polyline.is_empty());
//! ```

mod accumulate;
mod builder;
mod error;
mod params;
mod relax;
mod track;

pub use accumulate::{Accumulation, AccumulationStats, accumulate, accumulate_with_progress};
pub use builder::{CenterlineBuildResult, CenterlineBuilder, CenterlineStats, compute_centerline};
pub use error::{
    CenterlineError, CenterlineErrorCode, CenterlineRecoverySuggestion, CenterlineResult,
};
pub use params::CenterlineParams;
pub use relax::{RelaxationResult, optimize_elastic_forces, optimize_elastic_forces_with_progress};
pub use track::{StopReason, TrackingContext, track_centerline, track_patch_center};

// Re-export mesh types for convenience
pub use vessel_mesh::{Domain, Mesh, VoxelGrid};

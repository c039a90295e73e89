//! Geometry shared by vessel centerline extraction and surface unrolling.
//!
//! This crate holds the data the centerline stages operate on and the
//! proximity queries they rely on:
//!
//! - **Mesh**: indexed vertices with triangle or quad faces
//! - **Voxel lattice**: an integer [`Domain`] and dense [`VoxelGrid`] arrays
//! - **Queries**: faces crossing a cross-section plane ([`SectionQuery`]),
//!   oriented samples and plane patches of a hit-count volume
//!   ([`VolumeQuery`])
//! - **Diagnostics**: [`MeshError`] codes, tracing helpers, progress reporting
//!
//! # Units
//!
//! Mesh coordinates are **voxel units**: a point maps to the voxel with the
//! nearest integer coordinates. Scan radii, step lengths and patch sizes in
//! the downstream crates are all expressed in voxels.
//!
//! # Coordinate System
//!
//! Right-handed. Faces wind counter-clockwise when viewed from outside the
//! tube, so right-hand normals point away from the vessel axis.
//!
//! # Quick Start
//!
//! ```
//! use nalgebra::{Point3, Vector3};
//! use vessel_mesh::{FaceIndex, Mesh, SectionQuery};
//!
//! let mesh = Mesh::open_tube(5.0, 20.0, 16, 10);
//! let index = FaceIndex::new(&mesh);
//!
//! let ring = index.section_faces(&Point3::new(0.0, 0.0, 10.0 + 2.0 / 3.0), &Vector3::z(), 0.1, 7.5);
//! assert!(!ring.is_empty());
//! ```

mod error;
mod types;

#[cfg(feature = "config")]
pub mod config;
pub mod grid;
pub mod patch;
pub mod progress;
pub mod query;
pub mod tracing_ext;

pub use error::{ErrorCode, MeshError, MeshLocation, MeshResult, RecoverySuggestion};
pub use types::{MAX_FACE_VERTICES, Mesh, Triangle, Vertex};

pub use grid::{Domain, VoxelGrid, nearest_voxel};
pub use patch::{Patch, PlaneEmbedder};
pub use query::{FaceIndex, SectionQuery, VolumeQuery};

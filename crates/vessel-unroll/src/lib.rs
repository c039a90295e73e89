//! Cylindrical unrolling of vessel surfaces into relief rasters.
//!
//! Surface points are expressed in cylindrical coordinates around the
//! vessel axis and binned into a height × angle grid ([`UnrolledMap`]). A
//! scalar relief value per point, such as its distance to the centerline,
//! is then aggregated over blocks of cells into a normalized raster, either
//! at one fixed resolution or with a per-cell adaptive block size.
//!
//! # Example
//!
//! ```
//! use nalgebra::{Point3, Vector3};
//! use vessel_unroll::{UnrollParams, UnrolledMap, gray_image, unroll_points};
//!
//! // A ring of points per unit of height on a cylinder of radius 5.
//! let mut surface = Vec::new();
//! for z in 0..=30 {
//!     for k in 0..64 {
//!         let t = std::f64::consts::TAU * k as f64 / 64.0;
//!         surface.push(Point3::new(5.0 * t.cos(), 5.0 * t.sin(), z as f64));
//!     }
//! }
//!
//! let points = unroll_points(&surface, &Point3::origin(), &Vector3::z()).unwrap();
//! let relief: Vec<f64> = points.iter().map(|p| p.height).collect();
//! let map = UnrolledMap::new(points, relief).unwrap();
//! assert_eq!(map.dims(), (30, 31));
//!
//! let normalized = map.relief_image(&UnrollParams::default()).unwrap();
//! let gray = gray_image(&normalized);
//! assert_eq!(gray.dims(), map.dims());
//! ```

mod cylindrical;
mod error;
mod map;
mod params;
mod raster;

pub use cylindrical::{CylindricalPoint, unroll_points};
pub use error::{UnrollError, UnrollErrorCode, UnrollRecoverySuggestion, UnrollResult};
pub use map::UnrolledMap;
pub use params::{Aggregate, UnrollParams};
pub use raster::{ColorMap, Raster, gray_image, rgb_image, to_gray};

//! Cylindrical coordinates of surface points around a vessel axis.

use nalgebra::{Point3, Vector3};
use vessel_mesh::PlaneEmbedder;

/// A surface point in cylindrical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CylindricalPoint {
    /// Angle around the axis in radians.
    pub angle: f64,
    /// Position along the axis.
    pub height: f64,
    /// Distance from the axis.
    pub radius: f64,
}

impl CylindricalPoint {
    /// Create a point from its coordinates.
    #[inline]
    pub fn new(angle: f64, height: f64, radius: f64) -> Self {
        Self {
            angle,
            height,
            radius,
        }
    }

    /// Express `point` in cylindrical coordinates about the line through
    /// `axis_origin` along `axis_direction`.
    ///
    /// Heights are measured from `axis_origin`. Angles lie in `(-π, π]`,
    /// measured from the world axis least aligned with the cylinder axis.
    /// Returns `None` for a zero axis direction.
    pub fn from_cartesian(
        point: &Point3<f64>,
        axis_origin: &Point3<f64>,
        axis_direction: &Vector3<f64>,
    ) -> Option<Self> {
        let frame = PlaneEmbedder::new(*axis_origin, *axis_direction, 0)?;
        let axis = axis_direction.try_normalize(f64::EPSILON)?;
        let offset = point - axis_origin;
        let height = offset.dot(&axis);
        let radial = offset - axis * height;
        Some(Self {
            angle: radial
                .dot(&frame.second_axis())
                .atan2(radial.dot(&frame.first_axis())),
            height,
            radius: radial.norm(),
        })
    }

    /// Whether all coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.angle.is_finite() && self.height.is_finite() && self.radius.is_finite()
    }
}

/// Project every point of a cloud about a common axis.
///
/// Returns `None` for a zero axis direction.
pub fn unroll_points(
    points: &[Point3<f64>],
    axis_origin: &Point3<f64>,
    axis_direction: &Vector3<f64>,
) -> Option<Vec<CylindricalPoint>> {
    points
        .iter()
        .map(|p| CylindricalPoint::from_cartesian(p, axis_origin, axis_direction))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_z_axis_coordinates() {
        let origin = Point3::origin();
        let cp = CylindricalPoint::from_cartesian(&Point3::new(0.0, 3.0, 7.0), &origin, &Vector3::z())
            .unwrap();
        assert!(approx_eq(cp.height, 7.0));
        assert!(approx_eq(cp.radius, 3.0));

        let cq = CylindricalPoint::from_cartesian(&Point3::new(3.0, 0.0, 7.0), &origin, &Vector3::z())
            .unwrap();
        // Quarter turn between the two points.
        let diff = (cp.angle - cq.angle).abs();
        assert!(approx_eq(diff, FRAC_PI_2) || approx_eq(diff, 3.0 * FRAC_PI_2));
    }

    #[test]
    fn test_tilted_axis() {
        let origin = Point3::new(1.0, 2.0, 3.0);
        let axis = Vector3::new(1.0, 1.0, 0.0);
        let p = origin + axis.normalize() * 4.0 + Vector3::z() * 2.5;
        let cp = CylindricalPoint::from_cartesian(&p, &origin, &axis).unwrap();
        assert!(approx_eq(cp.height, 4.0));
        assert!(approx_eq(cp.radius, 2.5));
        assert!(cp.angle > -PI && cp.angle <= PI);
    }

    #[test]
    fn test_zero_axis() {
        let origin = Point3::origin();
        assert!(CylindricalPoint::from_cartesian(&origin, &origin, &Vector3::zeros()).is_none());
        assert!(unroll_points(&[origin], &origin, &Vector3::zeros()).is_none());
    }

    #[test]
    fn test_unroll_ring() {
        let points: Vec<_> = (0..8)
            .map(|k| {
                let t = PI * k as f64 / 4.0;
                Point3::new(5.0 * t.cos(), 5.0 * t.sin(), 1.0)
            })
            .collect();
        let cps = unroll_points(&points, &Point3::origin(), &Vector3::z()).unwrap();
        assert_eq!(cps.len(), 8);
        assert!(cps.iter().all(|c| approx_eq(c.radius, 5.0) && approx_eq(c.height, 1.0)));

        let mut angles: Vec<f64> = cps.iter().map(|c| c.angle).collect();
        angles.sort_by(f64::total_cmp);
        assert!(angles.windows(2).all(|w| approx_eq(w[1] - w[0], PI / 4.0)));
    }
}

//! Square cross-section patches embedded in 3D.

use nalgebra::{Point3, Vector3};

/// Maps 2D patch pixels onto a plane in 3D.
///
/// The plane passes through `centre` with the given normal. Pixel `(u, v)`
/// for `u, v ∈ [0, size]` maps to `origin − u·e1 − v·e2`, where `e1`, `e2`
/// are an orthonormal in-plane basis and `origin = centre + (e1 + e2)·size/2`,
/// so the middle pixel lands on the centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneEmbedder {
    origin: Point3<f64>,
    e1: Vector3<f64>,
    e2: Vector3<f64>,
    size: usize,
}

impl PlaneEmbedder {
    /// Build an embedder for a plane through `centre` orthogonal to `normal`.
    ///
    /// Returns `None` if the normal is zero or not finite.
    pub fn new(centre: Point3<f64>, normal: Vector3<f64>, size: usize) -> Option<Self> {
        let n = normal.try_normalize(f64::EPSILON)?;
        if !n.iter().all(|c| c.is_finite()) {
            return None;
        }

        // Seed the basis with the world axis least aligned with the normal.
        let abs = n.abs();
        let helper = if abs.x <= abs.y && abs.x <= abs.z {
            Vector3::x()
        } else if abs.y <= abs.z {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let e1 = (helper - n * n.dot(&helper)).try_normalize(f64::EPSILON)?;
        let e2 = n.cross(&e1);

        let half = size as f64 / 2.0;
        Some(Self {
            origin: centre + (e1 + e2) * half,
            e1,
            e2,
            size,
        })
    }

    /// Side length of the patch in pixels minus one.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// First in-plane axis.
    #[inline]
    pub fn first_axis(&self) -> Vector3<f64> {
        self.e1
    }

    /// Second in-plane axis.
    #[inline]
    pub fn second_axis(&self) -> Vector3<f64> {
        self.e2
    }

    /// 3D position of pixel `(u, v)`.
    #[inline]
    pub fn embed(&self, u: usize, v: usize) -> Point3<f64> {
        self.origin - self.e1 * u as f64 - self.e2 * v as f64
    }
}

/// Row-major `(size+1) × (size+1)` samples of a volume over a plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    size: usize,
    values: Vec<u32>,
}

impl Patch {
    /// Build a patch by sampling `f(u, v)` for every pixel.
    pub fn from_fn(size: usize, mut f: impl FnMut(usize, usize) -> u32) -> Self {
        let side = size + 1;
        let mut values = Vec::with_capacity(side * side);
        for v in 0..side {
            for u in 0..side {
                values.push(f(u, v));
            }
        }
        Self { size, values }
    }

    /// Patch size; the patch has `size + 1` pixels per side.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Sample at pixel `(u, v)`.
    #[inline]
    pub fn get(&self, u: usize, v: usize) -> Option<u32> {
        let side = self.size + 1;
        if u >= side || v >= side {
            return None;
        }
        self.values.get(v * side + u).copied()
    }

    /// All samples, `v` major.
    #[inline]
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Pixel holding the largest sample.
    ///
    /// Ties resolve to the first pixel in scan order. Returns `None` when
    /// every sample is zero.
    pub fn peak(&self) -> Option<(usize, usize)> {
        let side = self.size + 1;
        let mut best: Option<(usize, u32)> = None;
        for (i, &value) in self.values.iter().enumerate() {
            if value > best.map_or(0, |(_, b)| b) {
                best = Some((i, value));
            }
        }
        best.map(|(i, _)| (i % side, i / side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_embedder_centre_pixel() {
        let c = Point3::new(3.0, -2.0, 7.0);
        let e = PlaneEmbedder::new(c, Vector3::new(0.0, 0.0, 2.0), 10).unwrap();
        let mid = e.embed(5, 5);
        assert!(approx_eq(mid.x, c.x));
        assert!(approx_eq(mid.y, c.y));
        assert!(approx_eq(mid.z, c.z));
    }

    #[test]
    fn test_embedder_stays_in_plane() {
        let n = Vector3::new(1.0, 2.0, -0.5);
        let c = Point3::new(1.0, 1.0, 1.0);
        let e = PlaneEmbedder::new(c, n, 8).unwrap();
        let unit = n.normalize();
        for (u, v) in [(0, 0), (8, 0), (3, 7), (8, 8)] {
            let p = e.embed(u, v);
            assert!(approx_eq((p - c).dot(&unit), 0.0));
        }
        assert!(approx_eq(e.first_axis().dot(&e.second_axis()), 0.0));
        assert!(approx_eq(e.first_axis().norm(), 1.0));
    }

    #[test]
    fn test_embedder_rejects_zero_normal() {
        assert!(PlaneEmbedder::new(Point3::origin(), Vector3::zeros(), 4).is_none());
    }

    #[test]
    fn test_patch_peak_first_strict_maximum() {
        let patch = Patch::from_fn(2, |u, v| if (u, v) == (1, 1) || (u, v) == (2, 2) { 5 } else { 1 });
        assert_eq!(patch.values().len(), 9);
        assert_eq!(patch.peak(), Some((1, 1)));
        assert_eq!(patch.get(2, 2), Some(5));
        assert_eq!(patch.get(3, 0), None);
    }

    #[test]
    fn test_patch_peak_all_zero() {
        let patch = Patch::from_fn(4, |_, _| 0);
        assert_eq!(patch.peak(), None);
    }
}

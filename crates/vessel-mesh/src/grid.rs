//! Integer voxel domain and dense voxel arrays.
//!
//! Mesh coordinates are voxel units, so a real point maps to the voxel whose
//! integer coordinates are nearest to it. A [`VoxelGrid`] is an arena over a
//! [`Domain`]: it owns one value per voxel and is passed by reference to
//! whichever stage reads or writes it.

use nalgebra::Point3;
use tracing::info;

use crate::error::{MeshError, MeshResult};
use crate::types::Mesh;

/// Inclusive box of integer voxel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    /// Lowest voxel coordinate on each axis.
    pub lower: [i64; 3],
    /// Highest voxel coordinate on each axis (inclusive).
    pub upper: [i64; 3],
}

impl Domain {
    /// Create a domain from its inclusive corners.
    ///
    /// Corners are reordered per axis so `lower <= upper` always holds.
    pub fn new(lower: [i64; 3], upper: [i64; 3]) -> Self {
        let mut lo = lower;
        let mut hi = upper;
        for axis in 0..3 {
            if lo[axis] > hi[axis] {
                std::mem::swap(&mut lo[axis], &mut hi[axis]);
            }
        }
        Self {
            lower: lo,
            upper: hi,
        }
    }

    /// Smallest domain covering the mesh bounds plus `padding` voxels.
    ///
    /// Fails with `EmptyMesh` when the mesh has no vertices and with
    /// `GridTooLarge` when the domain would hold more than `max_voxels`
    /// cells.
    pub fn from_mesh_bounds(mesh: &Mesh, padding: f64, max_voxels: usize) -> MeshResult<Self> {
        let (min, max) = mesh
            .bounds()
            .ok_or_else(|| MeshError::empty_mesh("mesh has no vertices"))?;
        if !padding.is_finite() || padding < 0.0 {
            return Err(MeshError::invalid_params(format!(
                "domain padding must be a non-negative number, got {padding}"
            )));
        }

        let lower = [
            (min.x - padding).floor() as i64,
            (min.y - padding).floor() as i64,
            (min.z - padding).floor() as i64,
        ];
        let upper = [
            (max.x + padding).ceil() as i64,
            (max.y + padding).ceil() as i64,
            (max.z + padding).ceil() as i64,
        ];
        let domain = Self::new(lower, upper);

        let dims = domain.dims();
        let total = dims[0]
            .checked_mul(dims[1])
            .and_then(|v| v.checked_mul(dims[2]));
        match total {
            Some(total) if total <= max_voxels => {
                info!(
                    dims = ?dims,
                    total = total,
                    padding = padding,
                    "Creating voxel domain"
                );
                Ok(domain)
            }
            _ => Err(MeshError::grid_too_large(dims, max_voxels)),
        }
    }

    /// Number of voxels along each axis.
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        [
            (self.upper[0] - self.lower[0] + 1) as usize,
            (self.upper[1] - self.lower[1] + 1) as usize,
            (self.upper[2] - self.lower[2] + 1) as usize,
        ]
    }

    /// Total number of voxels.
    #[inline]
    pub fn cell_count(&self) -> usize {
        let [dx, dy, dz] = self.dims();
        dx * dy * dz
    }

    /// Whether an integer voxel lies inside the domain.
    #[inline]
    pub fn contains_voxel(&self, voxel: [i64; 3]) -> bool {
        (0..3).all(|a| voxel[a] >= self.lower[a] && voxel[a] <= self.upper[a])
    }

    /// Whether the voxel nearest to `point` lies inside the domain.
    #[inline]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        self.voxel_of(point).is_some()
    }

    /// Voxel nearest to `point`, or `None` if it falls outside the domain
    /// or the point is not finite.
    pub fn voxel_of(&self, point: &Point3<f64>) -> Option<[i64; 3]> {
        let voxel = nearest_voxel(point)?;
        self.contains_voxel(voxel).then_some(voxel)
    }

    /// Geometric centre of a voxel.
    #[inline]
    pub fn voxel_center(voxel: [i64; 3]) -> Point3<f64> {
        Point3::new(voxel[0] as f64, voxel[1] as f64, voxel[2] as f64)
    }
}

/// Round a point to the nearest integer voxel, ignoring any domain.
pub fn nearest_voxel(point: &Point3<f64>) -> Option<[i64; 3]> {
    if !(point.x.is_finite() && point.y.is_finite() && point.z.is_finite()) {
        return None;
    }
    Some([
        point.x.round() as i64,
        point.y.round() as i64,
        point.z.round() as i64,
    ])
}

/// Dense array holding one value per voxel of a [`Domain`].
#[derive(Debug, Clone)]
pub struct VoxelGrid<T> {
    domain: Domain,
    dims: [usize; 3],
    values: Vec<T>,
}

impl<T: Clone + Default> VoxelGrid<T> {
    /// Create a grid filled with `T::default()`.
    pub fn new(domain: Domain) -> Self {
        Self::filled(domain, T::default())
    }
}

impl<T: Clone> VoxelGrid<T> {
    /// Create a grid with every voxel set to `value`.
    pub fn filled(domain: Domain, value: T) -> Self {
        let dims = domain.dims();
        Self {
            domain,
            dims,
            values: vec![value; dims[0] * dims[1] * dims[2]],
        }
    }
}

impl<T> VoxelGrid<T> {
    /// The domain this grid covers.
    #[inline]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Grid dimensions [x, y, z].
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Total number of voxels in the grid.
    #[inline]
    pub fn total_voxels(&self) -> usize {
        self.values.len()
    }

    /// Convert 3D grid offsets to a linear index.
    #[inline]
    pub fn linearize(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.dims[0] + z * self.dims[0] * self.dims[1]
    }

    /// Convert a linear index to 3D grid offsets.
    #[inline]
    pub fn delinearize(&self, idx: usize) -> [usize; 3] {
        let z = idx / (self.dims[0] * self.dims[1]);
        let rem = idx % (self.dims[0] * self.dims[1]);
        let y = rem / self.dims[0];
        let x = rem % self.dims[0];
        [x, y, z]
    }

    /// Linear index of a voxel, or `None` if it is outside the domain.
    #[inline]
    pub fn index_of(&self, voxel: [i64; 3]) -> Option<usize> {
        if !self.domain.contains_voxel(voxel) {
            return None;
        }
        let lo = self.domain.lower;
        Some(self.linearize(
            (voxel[0] - lo[0]) as usize,
            (voxel[1] - lo[1]) as usize,
            (voxel[2] - lo[2]) as usize,
        ))
    }

    /// Voxel coordinate of a linear index.
    #[inline]
    pub fn voxel_at(&self, idx: usize) -> [i64; 3] {
        let [x, y, z] = self.delinearize(idx);
        let lo = self.domain.lower;
        [lo[0] + x as i64, lo[1] + y as i64, lo[2] + z as i64]
    }

    /// Value at a voxel.
    #[inline]
    pub fn get(&self, voxel: [i64; 3]) -> Option<&T> {
        self.index_of(voxel).map(|i| &self.values[i])
    }

    /// Mutable value at a voxel.
    #[inline]
    pub fn get_mut(&mut self, voxel: [i64; 3]) -> Option<&mut T> {
        self.index_of(voxel).map(move |i| &mut self.values[i])
    }

    /// Value at the voxel nearest to a real point.
    #[inline]
    pub fn at_point(&self, point: &Point3<f64>) -> Option<&T> {
        self.domain.voxel_of(point).and_then(|v| self.get(v))
    }

    /// All values in linear order.
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// All values in linear order, mutably.
    #[inline]
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Iterate over `(voxel, value)` pairs in linear order.
    pub fn iter(&self) -> impl Iterator<Item = ([i64; 3], &T)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, v)| (self.voxel_at(i), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_contains_inclusive_bounds() {
        let d = Domain::new([0, 0, 0], [4, 4, 4]);
        assert!(d.contains_voxel([0, 0, 0]));
        assert!(d.contains_voxel([4, 4, 4]));
        assert!(!d.contains_voxel([5, 0, 0]));
        assert!(!d.contains_voxel([0, -1, 0]));
        assert_eq!(d.dims(), [5, 5, 5]);
        assert_eq!(d.cell_count(), 125);
    }

    #[test]
    fn test_voxel_of_rounds_to_nearest() {
        let d = Domain::new([-2, -2, -2], [2, 2, 2]);
        assert_eq!(d.voxel_of(&Point3::new(0.4, -0.6, 1.5)), Some([0, -1, 2]));
        assert_eq!(d.voxel_of(&Point3::new(2.6, 0.0, 0.0)), None);
        assert_eq!(d.voxel_of(&Point3::new(f64::NAN, 0.0, 0.0)), None);
    }

    #[test]
    fn test_domain_reorders_corners() {
        let d = Domain::new([3, 0, 5], [0, 2, 1]);
        assert_eq!(d.lower, [0, 0, 1]);
        assert_eq!(d.upper, [3, 2, 5]);
    }

    #[test]
    fn test_from_mesh_bounds_pads() {
        let mesh = Mesh::open_tube(3.0, 10.0, 12, 2);
        let d = Domain::from_mesh_bounds(&mesh, 1.0, 1_000_000).unwrap();
        assert_eq!(d.lower, [-4, -4, -1]);
        assert_eq!(d.upper, [4, 4, 11]);
    }

    #[test]
    fn test_from_mesh_bounds_limits() {
        let mesh = Mesh::open_tube(50.0, 100.0, 12, 2);
        let err = Domain::from_mesh_bounds(&mesh, 0.0, 1000).unwrap_err();
        assert!(matches!(err, MeshError::GridTooLarge { max: 1000, .. }));

        assert!(matches!(
            Domain::from_mesh_bounds(&Mesh::new(), 0.0, 1000),
            Err(MeshError::EmptyMesh { .. })
        ));
    }

    #[test]
    fn test_linearize_roundtrip() {
        let grid: VoxelGrid<u32> = VoxelGrid::new(Domain::new([-1, 2, 3], [3, 5, 4]));
        for idx in [0, 7, grid.total_voxels() - 1] {
            let [x, y, z] = grid.delinearize(idx);
            assert_eq!(grid.linearize(x, y, z), idx);
            assert_eq!(grid.index_of(grid.voxel_at(idx)), Some(idx));
        }
    }

    #[test]
    fn test_get_and_set() {
        let mut grid: VoxelGrid<u32> = VoxelGrid::new(Domain::new([0, 0, 0], [2, 2, 2]));
        *grid.get_mut([1, 2, 0]).unwrap() += 3;
        assert_eq!(grid.get([1, 2, 0]), Some(&3));
        assert_eq!(grid.at_point(&Point3::new(1.2, 1.9, -0.3)), Some(&3));
        assert!(grid.get([3, 0, 0]).is_none());
        assert_eq!(grid.iter().filter(|(_, v)| **v > 0).count(), 1);
    }
}

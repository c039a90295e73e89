//! Proximity queries against the mesh surface and the hit-count volume.
//!
//! The centerline stages only see these traits, so alternative spatial
//! indices can be plugged in without touching the algorithms.

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::grid::VoxelGrid;
use crate::patch::{Patch, PlaneEmbedder};
use crate::types::Mesh;

/// Faces crossing the cross-section plane through a point.
pub trait SectionQuery {
    /// Indices of faces whose centroid lies within `radius` of `point` and
    /// whose direction from `point` is nearly orthogonal to `direction`.
    ///
    /// A face qualifies when `|cos|` of the angle between the unit
    /// point-to-centroid vector and `direction` is below `tolerance`. A zero
    /// `direction` keeps every face in the ball. Results are sorted by face
    /// index.
    fn section_faces(
        &self,
        point: &Point3<f64>,
        direction: &Vector3<f64>,
        tolerance: f64,
        radius: f64,
    ) -> Vec<usize>;
}

/// Sampling of a scalar volume around a point.
pub trait VolumeQuery {
    /// Whether any voxel within `distance` of `point` holds at least
    /// `min_count`.
    ///
    /// When `oriented` is set, only voxels strictly ahead of `point` along
    /// `point − previous` count. If the two points coincide there is no
    /// heading and orientation is ignored.
    fn oriented_sample_exists(
        &self,
        point: &Point3<f64>,
        previous: &Point3<f64>,
        distance: f64,
        oriented: bool,
        min_count: u32,
    ) -> bool;

    /// Sample the volume over the plane described by `embedder`.
    ///
    /// Pixels whose 3D position falls outside the volume read as zero.
    fn extract_patch(&self, embedder: &PlaneEmbedder) -> Patch;
}

/// KD-tree over the centroids of the triangle and quad faces of a mesh.
///
/// Built in bulk, so regular meshes with many centroids sharing a
/// coordinate index without trouble.
pub struct FaceIndex {
    tree: Option<kiddo::ImmutableKdTree<f64, 3>>,
    faces: Vec<usize>,
    centroids: Vec<Option<Point3<f64>>>,
}

impl FaceIndex {
    /// Index every triangle and quad of `mesh`.
    ///
    /// Larger polygons and faces with dangling vertex indices are left out.
    pub fn new(mesh: &Mesh) -> Self {
        let mut centroids = Vec::with_capacity(mesh.face_count());
        let mut points = Vec::with_capacity(mesh.face_count());
        let mut faces = Vec::with_capacity(mesh.face_count());

        for face_idx in 0..mesh.face_count() {
            let centroid = mesh
                .is_supported_face(face_idx)
                .then(|| mesh.face_centroid(face_idx))
                .flatten();
            if let Some(c) = centroid {
                points.push([c.x, c.y, c.z]);
                faces.push(face_idx);
            }
            centroids.push(centroid);
        }

        debug!(
            faces = mesh.face_count(),
            indexed = faces.len(),
            "Built face centroid index"
        );

        let tree = (!points.is_empty()).then(|| kiddo::ImmutableKdTree::new_from_slice(&points));
        Self {
            tree,
            faces,
            centroids,
        }
    }

    /// Number of indexed faces.
    #[inline]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Whether no face was indexed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Centroid of an indexed face.
    #[inline]
    pub fn centroid(&self, face_idx: usize) -> Option<Point3<f64>> {
        self.centroids.get(face_idx).copied().flatten()
    }
}

impl SectionQuery for FaceIndex {
    fn section_faces(
        &self,
        point: &Point3<f64>,
        direction: &Vector3<f64>,
        tolerance: f64,
        radius: f64,
    ) -> Vec<usize> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        if radius.is_nan() || radius <= 0.0 {
            return Vec::new();
        }
        let axis = direction.try_normalize(f64::EPSILON);

        let neighbors =
            tree.within::<kiddo::SquaredEuclidean>(&[point.x, point.y, point.z], radius * radius);

        let mut faces: Vec<usize> = neighbors
            .iter()
            .filter_map(|n| {
                let face_idx = *self.faces.get(n.item as usize)?;
                let to_face = self.centroid(face_idx)? - point;
                let unit = to_face.try_normalize(f64::EPSILON)?;
                let cos = axis.map_or(0.0, |a| a.dot(&unit).abs());
                (cos < tolerance).then_some(face_idx)
            })
            .collect();
        faces.sort_unstable();
        faces
    }
}

impl VolumeQuery for VoxelGrid<u32> {
    fn oriented_sample_exists(
        &self,
        point: &Point3<f64>,
        previous: &Point3<f64>,
        distance: f64,
        oriented: bool,
        min_count: u32,
    ) -> bool {
        if distance.is_nan() || distance < 0.0 || !point.iter().all(|c| c.is_finite()) {
            return false;
        }
        let heading = if oriented {
            (point - previous).try_normalize(f64::EPSILON)
        } else {
            None
        };

        let domain = *self.domain();
        let lo = [
            ((point.x - distance).floor() as i64).max(domain.lower[0]),
            ((point.y - distance).floor() as i64).max(domain.lower[1]),
            ((point.z - distance).floor() as i64).max(domain.lower[2]),
        ];
        let hi = [
            ((point.x + distance).ceil() as i64).min(domain.upper[0]),
            ((point.y + distance).ceil() as i64).min(domain.upper[1]),
            ((point.z + distance).ceil() as i64).min(domain.upper[2]),
        ];
        let dist_sq = distance * distance;

        for z in lo[2]..=hi[2] {
            for y in lo[1]..=hi[1] {
                for x in lo[0]..=hi[0] {
                    let voxel = [x, y, z];
                    let offset = crate::grid::Domain::voxel_center(voxel) - point;
                    if offset.norm_squared() > dist_sq {
                        continue;
                    }
                    if heading.is_some_and(|h| offset.dot(&h) <= 0.0) {
                        continue;
                    }
                    if self.get(voxel).is_some_and(|&hits| hits >= min_count) {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn extract_patch(&self, embedder: &PlaneEmbedder) -> Patch {
        Patch::from_fn(embedder.size(), |u, v| {
            self.at_point(&embedder.embed(u, v)).copied().unwrap_or(0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Domain;

    #[test]
    fn test_section_faces_ring() {
        let mesh = Mesh::open_tube(5.0, 20.0, 16, 10);
        let index = FaceIndex::new(&mesh);
        assert_eq!(index.len(), mesh.face_count());

        // Level with one row of triangle centroids.
        let p = Point3::new(0.0, 0.0, 10.0 + 2.0 / 3.0);
        let faces = index.section_faces(&p, &Vector3::z(), 0.1, 7.5);
        assert!(!faces.is_empty());
        for &f in &faces {
            let c = index.centroid(f).unwrap();
            let unit = (c - p).normalize();
            assert!(unit.z.abs() < 0.1);
        }
        assert!(faces.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_section_faces_zero_direction_keeps_ball() {
        let mesh = Mesh::open_tube(5.0, 20.0, 16, 10);
        let index = FaceIndex::new(&mesh);
        let p = Point3::new(0.0, 0.0, 10.0 + 2.0 / 3.0);
        let along = index.section_faces(&p, &Vector3::z(), 0.1, 7.5);
        let all = index.section_faces(&p, &Vector3::zeros(), 0.1, 7.5);
        assert!(all.len() > along.len());
    }

    #[test]
    fn test_face_index_skips_polygons() {
        let mut mesh = Mesh::open_tube(5.0, 5.0, 5, 1);
        mesh.faces.push(vec![0, 1, 2, 3, 4]);
        let index = FaceIndex::new(&mesh);
        assert_eq!(index.len(), mesh.face_count() - 1);
        assert!(index.centroid(mesh.face_count() - 1).is_none());
    }

    #[test]
    fn test_oriented_sample() {
        let mut grid: VoxelGrid<u32> = VoxelGrid::new(Domain::new([0, 0, 0], [10, 10, 10]));
        *grid.get_mut([5, 5, 8]).unwrap() = 2;

        let p = Point3::new(5.0, 5.0, 5.0);
        let behind = Point3::new(5.0, 5.0, 4.0);
        let ahead = Point3::new(5.0, 5.0, 6.0);

        assert!(grid.oriented_sample_exists(&p, &behind, 3.0, true, 1));
        assert!(!grid.oriented_sample_exists(&p, &ahead, 3.0, true, 1));
        assert!(grid.oriented_sample_exists(&p, &ahead, 3.0, false, 1));
        assert!(!grid.oriented_sample_exists(&p, &behind, 2.0, true, 1));
        assert!(!grid.oriented_sample_exists(&p, &behind, 3.0, true, 3));
    }

    #[test]
    fn test_extract_patch_outside_reads_zero() {
        let mut grid: VoxelGrid<u32> = VoxelGrid::new(Domain::new([0, 0, 0], [4, 4, 4]));
        *grid.get_mut([2, 2, 2]).unwrap() = 9;

        let embedder = PlaneEmbedder::new(Point3::new(2.0, 2.0, 2.0), Vector3::z(), 10).unwrap();
        let patch = grid.extract_patch(&embedder);
        assert_eq!(patch.get(5, 5), Some(9));
        assert_eq!(patch.get(0, 0), Some(0));

        let (u, v) = patch.peak().unwrap();
        let p = embedder.embed(u, v);
        assert!((p - Point3::new(2.0, 2.0, 2.0)).norm() < 1e-9);
    }
}

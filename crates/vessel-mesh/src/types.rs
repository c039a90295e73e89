//! Core mesh data types.

use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, MeshResult};

/// Largest face the accumulation pipeline accepts (triangles and quads).
pub const MAX_FACE_VERTICES: usize = 4;

/// A vertex in the mesh.
///
/// Coordinates are expressed in voxel units: one unit of mesh space is one
/// cell of the accumulation lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a new vertex.
    #[inline]
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Create a vertex from raw coordinates.
    #[inline]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// A surface mesh with indexed vertices and polygonal faces.
///
/// Faces are ordered vertex index lists. Only triangles and quads take part
/// in centerline extraction; larger polygons are tolerated in storage and
/// skipped by the algorithms with a warning.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Faces as indices into the vertex array, counter-clockwise when viewed
    /// from outside the tube.
    pub faces: Vec<Vec<u32>>,
}

impl Mesh {
    /// An empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty mesh with room for the given element counts.
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// True when there is nothing to scan: no vertices or no faces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Axis-aligned `(lower, upper)` corners of all vertices, `None` when
    /// there are no vertices.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), v| (lo.inf(&v.position), hi.sup(&v.position))),
        )
    }

    /// Whether a face has a vertex count the algorithms can use.
    #[inline]
    pub fn is_supported_face(&self, face_idx: usize) -> bool {
        self.faces
            .get(face_idx)
            .is_some_and(|f| (3..=MAX_FACE_VERTICES).contains(&f.len()))
    }

    /// Triangle spanned by the first three vertices of a face.
    ///
    /// Returns `None` for out-of-range faces and faces with fewer than three
    /// vertices. Quads are represented by their leading triangle, which is
    /// coplanar with the rest of the face for planar quads.
    pub fn triangle(&self, face_idx: usize) -> Option<Triangle> {
        let face = self.faces.get(face_idx)?;
        if face.len() < 3 {
            return None;
        }
        Some(Triangle {
            v0: self.vertices.get(face[0] as usize)?.position,
            v1: self.vertices.get(face[1] as usize)?.position,
            v2: self.vertices.get(face[2] as usize)?.position,
        })
    }

    /// Mean of all vertex positions of a face.
    pub fn face_centroid(&self, face_idx: usize) -> Option<Point3<f64>> {
        let face = self.faces.get(face_idx)?;
        if face.is_empty() {
            return None;
        }
        let mut sum = Vector3::zeros();
        for &vi in face {
            sum += self.vertices.get(vi as usize)?.position.coords;
        }
        Some(Point3::from(sum / face.len() as f64))
    }

    /// Check that every face references existing vertices and every
    /// coordinate is finite.
    pub fn check_indices(&self) -> MeshResult<()> {
        for (vi, v) in self.vertices.iter().enumerate() {
            for (axis, value) in [("x", v.position.x), ("y", v.position.y), ("z", v.position.z)] {
                if !value.is_finite() {
                    return Err(MeshError::invalid_coordinate(vi, axis, value));
                }
            }
        }
        let vertex_count = self.vertices.len();
        for (fi, face) in self.faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(MeshError::invalid_vertex_index(fi, bad, vertex_count));
            }
        }
        Ok(())
    }

    /// Translate mesh by the given vector.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position += offset;
        }
    }

    /// Build an open triangulated tube around the z axis.
    ///
    /// The tube spans `z ∈ [0, length]` with `rings + 1` vertex rings of
    /// `segments` vertices each. Faces wind counter-clockwise seen from
    /// outside, so their right-hand normals point away from the axis.
    pub fn open_tube(radius: f64, length: f64, segments: usize, rings: usize) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(1);
        let mut mesh = Self::with_capacity(segments * (rings + 1), 2 * segments * rings);

        for k in 0..=rings {
            let z = length * k as f64 / rings as f64;
            for s in 0..segments {
                let theta = std::f64::consts::TAU * s as f64 / segments as f64;
                mesh.vertices.push(Vertex::from_coords(
                    radius * theta.cos(),
                    radius * theta.sin(),
                    z,
                ));
            }
        }

        let seg = segments as u32;
        for k in 0..rings as u32 {
            for s in 0..seg {
                let a = k * seg + s;
                let b = k * seg + (s + 1) % seg;
                let c = (k + 1) * seg + (s + 1) % seg;
                let d = (k + 1) * seg + s;
                mesh.faces.push(vec![a, b, c]);
                mesh.faces.push(vec![a, c, d]);
            }
        }

        mesh
    }
}

/// Three resolved vertex positions.
///
/// The right-hand normal of `v0 → v1 → v2` is the front side. For tube faces
/// wound as [`Mesh`] expects, the front faces away from the axis.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// `(v1 − v0) × (v2 − v0)`; its length is twice the area.
    #[inline]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Unit front normal, `None` for slivers of (near) zero area.
    pub fn normal(&self) -> Option<Vector3<f64>> {
        self.normal_unnormalized().try_normalize(f64::EPSILON.sqrt())
    }

    #[inline]
    pub fn area(&self) -> f64 {
        0.5 * self.normal_unnormalized().norm()
    }

    #[inline]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }
}

//! Error types for mesh and lattice operations with rich diagnostics.
//!
//! Every error carries:
//! - A machine-readable code in the format `VESSEL-XXXX`
//! - A recovery suggestion for the caller
//! - Location information when a vertex or face is at fault
//!
//! # Error Codes
//!
//! - `VESSEL-1xxx`: Validation errors (indices, coordinates, empty input)
//! - `VESSEL-2xxx`: Lattice errors (domain size, parameters)
//!
//! # Example
//!
//! ```
//! use vessel_mesh::{ErrorCode, MeshError};
//!
//! let err = MeshError::invalid_vertex_index(5, 100, 50);
//! assert_eq!(err.code(), ErrorCode::InvalidVertexIndex);
//! assert_eq!(err.code().as_str(), "VESSEL-1001");
//! ```

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Machine-readable error codes for mesh operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors (1xxx)
    /// VESSEL-1001: Face references invalid vertex index
    InvalidVertexIndex = 1001,
    /// VESSEL-1002: Vertex has NaN or Infinity coordinate
    InvalidCoordinate = 1002,
    /// VESSEL-1003: Mesh has no vertices or faces
    EmptyMesh = 1003,

    // Lattice errors (2xxx)
    /// VESSEL-2001: Voxel domain exceeds the configured cell limit
    GridTooLarge = 2001,
    /// VESSEL-2002: Invalid lattice or query parameters
    InvalidParams = 2002,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `VESSEL-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidVertexIndex => "VESSEL-1001",
            ErrorCode::InvalidCoordinate => "VESSEL-1002",
            ErrorCode::EmptyMesh => "VESSEL-1003",
            ErrorCode::GridTooLarge => "VESSEL-2001",
            ErrorCode::InvalidParams => "VESSEL-2002",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a caller can do about a [`MeshError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Fix the input mesh; `checks` lists what to look at.
    CheckSourceMesh { checks: Vec<String> },
    /// Change parameters, as `(name, hint)` pairs.
    AdjustParameters { parameters: Vec<(String, String)> },
    /// Nothing to suggest.
    None,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::CheckSourceMesh { checks } => {
                write!(f, "inspect the input mesh: {}", checks.join("; "))
            }
            RecoverySuggestion::AdjustParameters { parameters } => {
                f.write_str("change ")?;
                for (i, (name, hint)) in parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "`{name}` ({hint})")?;
                }
                Ok(())
            }
            RecoverySuggestion::None => f.write_str("no suggestion"),
        }
    }
}

/// Mesh element an error points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshLocation {
    Vertex { index: usize },
    Face { index: usize },
}

impl std::fmt::Display for MeshLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshLocation::Vertex { index } => write!(f, "vertex {}", index),
            MeshLocation::Face { index } => write!(f, "face {}", index),
        }
    }
}

/// Errors raised while validating a mesh or sizing its voxel lattice.
#[derive(Debug, Error, Diagnostic)]
pub enum MeshError {
    /// Nothing to scan.
    #[error("empty mesh: {details}")]
    #[diagnostic(
        code(vessel::validation::empty),
        help("Centerline extraction needs a tube surface with vertices and faces.")
    )]
    EmptyMesh { details: String },

    /// A face points past the vertex array.
    #[error("face {face_index} uses vertex {vertex_index} of a mesh with {vertex_count} vertices")]
    #[diagnostic(
        code(vessel::validation::vertex_index),
        help("Remove faces with dangling vertex references before extraction.")
    )]
    InvalidVertexIndex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },

    /// A vertex coordinate is NaN or infinite.
    #[error("vertex {vertex_index} has non-finite {coordinate} = {value}")]
    #[diagnostic(
        code(vessel::validation::coordinate),
        help("Vertex coordinates must be finite voxel-unit values.")
    )]
    InvalidCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },

    /// Voxel domain too large.
    #[error("voxel domain too large: {dims:?} = {total} cells (max: {max})")]
    #[diagnostic(
        code(vessel::lattice::too_large),
        help("Rescale the mesh into fewer voxel units or raise the cell limit.")
    )]
    GridTooLarge {
        dims: [usize; 3],
        total: usize,
        max: usize,
    },

    /// Invalid parameters.
    #[error("invalid parameters: {details}")]
    #[diagnostic(code(vessel::params::invalid))]
    InvalidParams { details: String },
}

impl MeshError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MeshError::EmptyMesh { .. } => ErrorCode::EmptyMesh,
            MeshError::InvalidVertexIndex { .. } => ErrorCode::InvalidVertexIndex,
            MeshError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
            MeshError::GridTooLarge { .. } => ErrorCode::GridTooLarge,
            MeshError::InvalidParams { .. } => ErrorCode::InvalidParams,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            MeshError::EmptyMesh { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["the surface was loaded".into()],
            },
            MeshError::InvalidVertexIndex { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["face index lists".into(), "zero- vs one-based indices".into()],
            },
            MeshError::InvalidCoordinate { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["vertex coordinates".into()],
            },
            MeshError::GridTooLarge { total, max, .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![(
                    "max_voxels".into(),
                    format!("at least {} (currently {})", total, max),
                )],
            },
            MeshError::InvalidParams { .. } => RecoverySuggestion::None,
        }
    }

    /// The offending vertex or face, if any.
    pub fn location(&self) -> Option<MeshLocation> {
        match self {
            MeshError::InvalidVertexIndex { face_index, .. } => {
                Some(MeshLocation::Face { index: *face_index })
            }
            MeshError::InvalidCoordinate { vertex_index, .. } => Some(MeshLocation::Vertex {
                index: *vertex_index,
            }),
            _ => None,
        }
    }

    /// Create an EmptyMesh error.
    pub fn empty_mesh(details: impl Into<String>) -> Self {
        MeshError::EmptyMesh {
            details: details.into(),
        }
    }

    /// Create an InvalidVertexIndex error.
    pub fn invalid_vertex_index(face_index: usize, vertex_index: u32, vertex_count: usize) -> Self {
        MeshError::InvalidVertexIndex {
            face_index,
            vertex_index,
            vertex_count,
        }
    }

    /// Create an InvalidCoordinate error.
    pub fn invalid_coordinate(vertex_index: usize, coordinate: &'static str, value: f64) -> Self {
        MeshError::InvalidCoordinate {
            vertex_index,
            coordinate,
            value,
        }
    }

    /// Create a GridTooLarge error.
    pub fn grid_too_large(dims: [usize; 3], max: usize) -> Self {
        MeshError::GridTooLarge {
            dims,
            total: dims[0].saturating_mul(dims[1]).saturating_mul(dims[2]),
            max,
        }
    }

    /// Create an InvalidParams error.
    pub fn invalid_params(details: impl Into<String>) -> Self {
        MeshError::InvalidParams {
            details: details.into(),
        }
    }
}

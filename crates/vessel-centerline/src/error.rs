// thiserror Display attributes read struct fields the compiler reports as unused.
#![allow(unused_assignments)]

//! Error types for centerline extraction with rich diagnostics.
//!
//! Errors are reserved for inputs rejected before a stage starts. Conditions
//! met while a stage runs (malformed faces, tracking leaving the domain,
//! points without section faces) are logged and handled in place.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for centerline operations.
pub type CenterlineResult<T> = Result<T, CenterlineError>;

/// Machine-readable error codes for centerline operations.
///
/// Codes follow the pattern `CENTERLINE-XXXX` where:
/// - 1xxx = Input validation errors
/// - 2xxx = Computation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CenterlineErrorCode {
    /// CENTERLINE-1001: Input mesh is empty
    EmptyMesh = 1001,
    /// CENTERLINE-1002: Invalid parameters
    InvalidParams = 1002,
    /// CENTERLINE-1003: Underlying mesh or lattice error
    Mesh = 1003,

    /// CENTERLINE-2001: No face ray reached a voxel of the domain
    EmptyAccumulation = 2001,
    /// CENTERLINE-2002: Relaxation received no usable centerline points
    EmptyCenterline = 2002,
}

impl CenterlineErrorCode {
    /// Returns the error code as a string in the format `CENTERLINE-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CenterlineErrorCode::EmptyMesh => "CENTERLINE-1001",
            CenterlineErrorCode::InvalidParams => "CENTERLINE-1002",
            CenterlineErrorCode::Mesh => "CENTERLINE-1003",
            CenterlineErrorCode::EmptyAccumulation => "CENTERLINE-2001",
            CenterlineErrorCode::EmptyCenterline => "CENTERLINE-2002",
        }
    }
}

impl std::fmt::Display for CenterlineErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for centerline errors.
#[derive(Debug, Clone, PartialEq)]
pub enum CenterlineRecoverySuggestion {
    /// Check the input mesh.
    CheckInputMesh,
    /// Enlarge the scan radius so face rays reach the vessel interior.
    IncreaseScanRadius { current: f64, suggested: f64 },
    /// Flip the scan direction of every face.
    InvertNormals,
    /// No specific suggestion.
    None,
}

impl std::fmt::Display for CenterlineRecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CenterlineRecoverySuggestion::CheckInputMesh => {
                write!(f, "Check that the input mesh is a tube with valid faces")
            }
            CenterlineRecoverySuggestion::IncreaseScanRadius { current, suggested } => {
                write!(
                    f,
                    "Increase the scan radius from {:.1} to {:.1} voxels",
                    current, suggested
                )
            }
            CenterlineRecoverySuggestion::InvertNormals => {
                write!(f, "Enable invert_normals if face normals point inward")
            }
            CenterlineRecoverySuggestion::None => {
                write!(f, "No specific suggestion available")
            }
        }
    }
}

/// Errors that can occur during centerline extraction.
#[derive(Debug, Error, Diagnostic)]
pub enum CenterlineError {
    /// Input mesh is empty.
    #[error("input mesh is empty")]
    #[diagnostic(
        code(centerline::input::empty),
        help("The input mesh must have at least one vertex and one face.")
    )]
    EmptyMesh,

    /// No face produced a single hit.
    #[error("accumulation produced no hits ({faces_processed} faces scanned)")]
    #[diagnostic(
        code(centerline::accumulate::empty),
        help("Face rays never entered the voxel domain. Check the scan radius and the mesh scale.")
    )]
    EmptyAccumulation { faces_processed: usize },

    /// Relaxation had nothing to work on.
    #[error("centerline is empty: {details}")]
    #[diagnostic(
        code(centerline::relax::empty),
        help("Tracking stopped immediately or no point had surface faces in its cross-section.")
    )]
    EmptyCenterline { details: String },

    /// Invalid parameters.
    #[error("invalid centerline parameters: {details}")]
    #[diagnostic(
        code(centerline::params::invalid),
        help("Check parameter values: radii and steps > 0, tolerances in (0, 1].")
    )]
    InvalidParams {
        details: String,
        param_name: Option<String>,
        param_value: Option<String>,
    },

    /// Underlying mesh error.
    #[error("mesh operation failed: {0}")]
    #[diagnostic(code(centerline::mesh::error))]
    MeshError(#[from] vessel_mesh::MeshError),
}

impl CenterlineError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> CenterlineErrorCode {
        match self {
            CenterlineError::EmptyMesh => CenterlineErrorCode::EmptyMesh,
            CenterlineError::EmptyAccumulation { .. } => CenterlineErrorCode::EmptyAccumulation,
            CenterlineError::EmptyCenterline { .. } => CenterlineErrorCode::EmptyCenterline,
            CenterlineError::InvalidParams { .. } => CenterlineErrorCode::InvalidParams,
            CenterlineError::MeshError(_) => CenterlineErrorCode::Mesh,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> CenterlineRecoverySuggestion {
        match self {
            CenterlineError::EmptyMesh => CenterlineRecoverySuggestion::CheckInputMesh,
            CenterlineError::EmptyAccumulation { .. } => CenterlineRecoverySuggestion::InvertNormals,
            CenterlineError::EmptyCenterline { .. } => {
                CenterlineRecoverySuggestion::IncreaseScanRadius {
                    current: crate::params::CenterlineParams::default().acc_radius,
                    suggested: 2.0 * crate::params::CenterlineParams::default().acc_radius,
                }
            }
            CenterlineError::InvalidParams { .. } => CenterlineRecoverySuggestion::None,
            CenterlineError::MeshError(_) => CenterlineRecoverySuggestion::CheckInputMesh,
        }
    }

    // Constructor helpers

    /// Create an empty mesh error.
    pub fn empty_mesh() -> Self {
        CenterlineError::EmptyMesh
    }

    /// Create an empty accumulation error.
    pub fn empty_accumulation(faces_processed: usize) -> Self {
        CenterlineError::EmptyAccumulation { faces_processed }
    }

    /// Create an empty centerline error.
    pub fn empty_centerline(details: impl Into<String>) -> Self {
        CenterlineError::EmptyCenterline {
            details: details.into(),
        }
    }

    /// Create an invalid params error.
    pub fn invalid_params(details: impl Into<String>) -> Self {
        CenterlineError::InvalidParams {
            details: details.into(),
            param_name: None,
            param_value: None,
        }
    }

    /// Create an invalid params error with param info.
    pub fn invalid_param(
        param_name: impl Into<String>,
        param_value: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        CenterlineError::InvalidParams {
            details: details.into(),
            param_name: Some(param_name.into()),
            param_value: Some(param_value.into()),
        }
    }
}

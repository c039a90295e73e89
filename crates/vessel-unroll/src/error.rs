// thiserror Display attributes read struct fields the compiler reports as unused.
#![allow(unused_assignments)]

//! Error types for unrolling and raster generation.
//!
//! Empty cells are not errors: aggregates report them as `None` and image
//! builders leave those pixels at zero. Errors cover inputs that cannot be
//! unrolled at all and queries outside the map.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for unroll operations.
pub type UnrollResult<T> = Result<T, UnrollError>;

/// Machine-readable error codes for unroll operations.
///
/// Codes follow the pattern `UNROLL-XXXX` where:
/// - 1xxx = Input validation errors
/// - 2xxx = Query and raster errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnrollErrorCode {
    /// UNROLL-1001: No cylindrical points
    EmptyPointCloud = 1001,
    /// UNROLL-1002: Relief array length differs from the point count
    ReliefLengthMismatch = 1002,
    /// UNROLL-1003: A coordinate or relief value is NaN or infinite
    NonFiniteValue = 1003,
    /// UNROLL-1004: Invalid parameters
    InvalidParams = 1004,

    /// UNROLL-2001: Decrease factor of zero
    InvalidDecreaseFactor = 2001,
    /// UNROLL-2002: Point index beyond the point cloud
    PointIndexOutOfRange = 2002,
    /// UNROLL-2003: Requested raster has no pixels
    EmptyRaster = 2003,
}

impl UnrollErrorCode {
    /// Returns the error code as a string in the format `UNROLL-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnrollErrorCode::EmptyPointCloud => "UNROLL-1001",
            UnrollErrorCode::ReliefLengthMismatch => "UNROLL-1002",
            UnrollErrorCode::NonFiniteValue => "UNROLL-1003",
            UnrollErrorCode::InvalidParams => "UNROLL-1004",
            UnrollErrorCode::InvalidDecreaseFactor => "UNROLL-2001",
            UnrollErrorCode::PointIndexOutOfRange => "UNROLL-2002",
            UnrollErrorCode::EmptyRaster => "UNROLL-2003",
        }
    }
}

impl std::fmt::Display for UnrollErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for unroll errors.
#[derive(Debug, Clone, PartialEq)]
pub enum UnrollRecoverySuggestion {
    /// Check the point cloud and relief values.
    CheckInput,
    /// Use a smaller decrease factor.
    ReduceDecreaseFactor { max: usize },
    /// No specific suggestion.
    None,
}

impl std::fmt::Display for UnrollRecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnrollRecoverySuggestion::CheckInput => {
                write!(f, "Provide one finite relief value per finite cylindrical point")
            }
            UnrollRecoverySuggestion::ReduceDecreaseFactor { max } => {
                write!(f, "Use a decrease factor between 1 and {}", max)
            }
            UnrollRecoverySuggestion::None => {
                write!(f, "No specific suggestion available")
            }
        }
    }
}

/// Errors that can occur while unrolling a surface.
#[derive(Debug, Error, Diagnostic)]
pub enum UnrollError {
    /// No points to unroll.
    #[error("point cloud is empty")]
    #[diagnostic(
        code(unroll::input::empty),
        help("Unrolling needs at least one cylindrical point.")
    )]
    EmptyPointCloud,

    /// Relief and points are not aligned by index.
    #[error("relief has {relief} values for {points} points")]
    #[diagnostic(
        code(unroll::input::relief_length),
        help("The relief array must hold exactly one value per point.")
    )]
    ReliefLengthMismatch { points: usize, relief: usize },

    /// A coordinate or relief value is not finite.
    #[error("{what} of point {index} is not finite ({value})")]
    #[diagnostic(code(unroll::input::non_finite))]
    NonFiniteValue {
        index: usize,
        what: &'static str,
        value: f64,
    },

    /// Invalid parameters.
    #[error("invalid unroll parameters: {details}")]
    #[diagnostic(
        code(unroll::params::invalid),
        help("Scales must satisfy 1 <= min_scale < max_scale.")
    )]
    InvalidParams { details: String },

    /// Decrease factor of zero.
    #[error("decrease factor must be at least 1")]
    #[diagnostic(code(unroll::query::decrease_factor))]
    InvalidDecreaseFactor,

    /// Point index beyond the point cloud.
    #[error("point index {index} out of range (point count: {len})")]
    #[diagnostic(code(unroll::query::index))]
    PointIndexOutOfRange { index: usize, len: usize },

    /// Raster dimensions collapse to zero.
    #[error("decrease factor {factor} leaves no pixels of a {height_div}x{angle_div} grid")]
    #[diagnostic(
        code(unroll::raster::empty),
        help("The decrease factor must not exceed either grid dimension.")
    )]
    EmptyRaster {
        factor: usize,
        height_div: usize,
        angle_div: usize,
    },
}

impl UnrollError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> UnrollErrorCode {
        match self {
            UnrollError::EmptyPointCloud => UnrollErrorCode::EmptyPointCloud,
            UnrollError::ReliefLengthMismatch { .. } => UnrollErrorCode::ReliefLengthMismatch,
            UnrollError::NonFiniteValue { .. } => UnrollErrorCode::NonFiniteValue,
            UnrollError::InvalidParams { .. } => UnrollErrorCode::InvalidParams,
            UnrollError::InvalidDecreaseFactor => UnrollErrorCode::InvalidDecreaseFactor,
            UnrollError::PointIndexOutOfRange { .. } => UnrollErrorCode::PointIndexOutOfRange,
            UnrollError::EmptyRaster { .. } => UnrollErrorCode::EmptyRaster,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> UnrollRecoverySuggestion {
        match self {
            UnrollError::EmptyPointCloud
            | UnrollError::ReliefLengthMismatch { .. }
            | UnrollError::NonFiniteValue { .. }
            | UnrollError::PointIndexOutOfRange { .. } => UnrollRecoverySuggestion::CheckInput,
            UnrollError::EmptyRaster {
                height_div,
                angle_div,
                ..
            } => UnrollRecoverySuggestion::ReduceDecreaseFactor {
                max: (*height_div).min(*angle_div),
            },
            UnrollError::InvalidDecreaseFactor | UnrollError::InvalidParams { .. } => {
                UnrollRecoverySuggestion::None
            }
        }
    }

    // Constructor helpers

    /// Create a relief length mismatch error.
    pub fn relief_length_mismatch(points: usize, relief: usize) -> Self {
        UnrollError::ReliefLengthMismatch { points, relief }
    }

    /// Create a non-finite value error.
    pub fn non_finite(index: usize, what: &'static str, value: f64) -> Self {
        UnrollError::NonFiniteValue { index, what, value }
    }

    /// Create an invalid params error.
    pub fn invalid_params(details: impl Into<String>) -> Self {
        UnrollError::InvalidParams {
            details: details.into(),
        }
    }

    /// Create an index out of range error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        UnrollError::PointIndexOutOfRange { index, len }
    }
}

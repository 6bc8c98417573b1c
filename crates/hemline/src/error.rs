// Fields read only through thiserror's Display impl trip unused_assignments on
// newer toolchains.
#![allow(unused_assignments)]

//! Error types for hem generation with rich diagnostics.
//!
//! Codes have the form `HEM-XXXX`:
//! - `HEM-1xxx`: parameter and configuration errors
//! - `HEM-2xxx`: shape mismatches between curves
//! - `HEM-3xxx`: degenerate geometry
//! - `HEM-4xxx`: curve sampling errors
//! - `HEM-5xxx`: mesh and export errors

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for hem generation.
pub type HemlineResult<T> = Result<T, HemlineError>;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HemErrorCode {
    /// HEM-1001: Fold, offset or stitch parameter out of range
    InvalidParameter = 1001,
    /// HEM-1002: Configuration file could not be read or parsed
    InvalidConfig = 1002,

    /// HEM-2001: Curves differ in length or are empty
    ShapeMismatch = 2001,

    /// HEM-3001: Coincident consecutive points
    DegenerateGeometry = 3001,

    /// HEM-4001: Sampling step or degree out of range
    InvalidSampling = 4001,
    /// HEM-4002: Knot vector has the wrong length or decreases
    InvalidKnotVector = 4002,

    /// HEM-5001: Mesh operation failed
    Mesh = 5001,
}

impl HemErrorCode {
    /// Returns the error code as a string in the format `HEM-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            HemErrorCode::InvalidParameter => "HEM-1001",
            HemErrorCode::InvalidConfig => "HEM-1002",
            HemErrorCode::ShapeMismatch => "HEM-2001",
            HemErrorCode::DegenerateGeometry => "HEM-3001",
            HemErrorCode::InvalidSampling => "HEM-4001",
            HemErrorCode::InvalidKnotVector => "HEM-4002",
            HemErrorCode::Mesh => "HEM-5001",
        }
    }
}

impl std::fmt::Display for HemErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for hem generation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum HemRecoverySuggestion {
    /// Fix the named parameter.
    FixParameter { name: String, constraint: String },
    /// Use a finer sampling step.
    RefineSampling { current: f64, suggested: f64 },
    /// Make sure all boundary curves come from the same sampled curve.
    MatchCurveLengths,
    /// Check the config file syntax.
    CheckConfig,
    /// Run mesh repair.
    RepairMesh,
}

impl std::fmt::Display for HemRecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HemRecoverySuggestion::FixParameter { name, constraint } => {
                write!(f, "Set {} so that {}", name, constraint)
            }
            HemRecoverySuggestion::RefineSampling { current, suggested } => {
                write!(
                    f,
                    "Reduce the sampling step from {} to {} or spread control points further apart",
                    current, suggested
                )
            }
            HemRecoverySuggestion::MatchCurveLengths => {
                write!(f, "Offset all boundary curves from curves sampled with the same step")
            }
            HemRecoverySuggestion::CheckConfig => {
                write!(f, "Check the configuration file for typos and value types")
            }
            HemRecoverySuggestion::RepairMesh => {
                write!(f, "Run `hem repair` on the output, or generate with --repair")
            }
        }
    }
}

/// Errors raised while generating a hem.
#[derive(Debug, Error, Diagnostic)]
pub enum HemlineError {
    /// A parameter bound is violated. Raised before any randomness is drawn.
    #[error("invalid parameter {name}: {details}")]
    #[diagnostic(
        code(hem::params::invalid),
        help("Widths and heights must be finite and positive with min <= max; polar angles at most 360 degrees.")
    )]
    InvalidParameter { name: &'static str, details: String },

    /// Configuration could not be loaded.
    #[error("invalid configuration: {details}")]
    #[diagnostic(code(hem::config::invalid), help("Supported config formats: .toml, .json"))]
    InvalidConfig { details: String },

    /// Curves handed to offsetting or stitching have the wrong length.
    #[error("shape mismatch: {details}")]
    #[diagnostic(
        code(hem::stitch::shape_mismatch),
        help("All boundary curves must be non-empty and have the same number of points.")
    )]
    ShapeMismatch { details: String },

    /// Consecutive curve points coincide, so the tangent is undefined.
    #[error("degenerate geometry at point {index}: consecutive points coincide")]
    #[diagnostic(
        code(hem::offset::degenerate),
        help("Use a finer sampling step relative to control point spacing.")
    )]
    DegenerateGeometry { index: usize },

    /// Sampling step, degree or control point count out of range.
    #[error("invalid sampling setup: {details}")]
    #[diagnostic(
        code(hem::sampler::invalid),
        help("The step must be in (0, 1] and the curve needs at least degree + 1 control points.")
    )]
    InvalidSampling { details: String },

    /// Knot vector has the wrong length or is not non-decreasing.
    #[error("invalid knot vector: {details}")]
    #[diagnostic(
        code(hem::sampler::knots),
        help("A clamped knot vector has length control_points + degree + 1.")
    )]
    InvalidKnotVector { details: String },

    /// Underlying mesh error.
    #[error("mesh operation failed: {0}")]
    #[diagnostic(code(hem::mesh::error))]
    Mesh(#[from] hem_mesh::MeshError),
}

impl HemlineError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> HemErrorCode {
        match self {
            HemlineError::InvalidParameter { .. } => HemErrorCode::InvalidParameter,
            HemlineError::InvalidConfig { .. } => HemErrorCode::InvalidConfig,
            HemlineError::ShapeMismatch { .. } => HemErrorCode::ShapeMismatch,
            HemlineError::DegenerateGeometry { .. } => HemErrorCode::DegenerateGeometry,
            HemlineError::InvalidSampling { .. } => HemErrorCode::InvalidSampling,
            HemlineError::InvalidKnotVector { .. } => HemErrorCode::InvalidKnotVector,
            HemlineError::Mesh(_) => HemErrorCode::Mesh,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> HemRecoverySuggestion {
        match self {
            HemlineError::InvalidParameter { name, details } => {
                HemRecoverySuggestion::FixParameter {
                    name: (*name).to_string(),
                    constraint: details.clone(),
                }
            }
            HemlineError::InvalidConfig { .. } => HemRecoverySuggestion::CheckConfig,
            HemlineError::ShapeMismatch { .. } => HemRecoverySuggestion::MatchCurveLengths,
            HemlineError::DegenerateGeometry { .. } => HemRecoverySuggestion::RefineSampling {
                current: crate::sampler::DEFAULT_SAMPLING_STEP,
                suggested: crate::sampler::DEFAULT_SAMPLING_STEP / 2.0,
            },
            HemlineError::InvalidSampling { .. } | HemlineError::InvalidKnotVector { .. } => {
                HemRecoverySuggestion::FixParameter {
                    name: "sampling".to_string(),
                    constraint: "0 < step <= 1 and degree >= 1".to_string(),
                }
            }
            HemlineError::Mesh(_) => HemRecoverySuggestion::RepairMesh,
        }
    }

    // Constructor helpers

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(name: &'static str, details: impl Into<String>) -> Self {
        HemlineError::InvalidParameter {
            name,
            details: details.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(details: impl Into<String>) -> Self {
        HemlineError::InvalidConfig {
            details: details.into(),
        }
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(details: impl Into<String>) -> Self {
        HemlineError::ShapeMismatch {
            details: details.into(),
        }
    }

    /// Create a DegenerateGeometry error.
    pub fn degenerate_geometry(index: usize) -> Self {
        HemlineError::DegenerateGeometry { index }
    }

    /// Create an InvalidSampling error.
    pub fn invalid_sampling(details: impl Into<String>) -> Self {
        HemlineError::InvalidSampling {
            details: details.into(),
        }
    }

    /// Create an InvalidKnotVector error.
    pub fn invalid_knot_vector(details: impl Into<String>) -> Self {
        HemlineError::InvalidKnotVector {
            details: details.into(),
        }
    }
}

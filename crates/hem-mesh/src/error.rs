//! Mesh errors and validation findings.
//!
//! [`MeshError`] stops an operation. [`ValidationIssue`] is a finding that
//! validation collects; one report can hold many of them, and most only
//! matter for printability.
//!
//! Both share [`ErrorCode`], rendered as `MESH-` plus four digits. The first
//! digit is the family: 1 file access, 2 mesh data, 3 repair, 4 format.
//!
//! ```
//! use hem_mesh::{ErrorCode, MeshError};
//!
//! let err = MeshError::invalid_vertex_index(5, 100, 50);
//! assert_eq!(err.code(), ErrorCode::InvalidVertexIndex);
//! assert_eq!(err.code().to_string(), "MESH-2001");
//! ```

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

pub type MeshResult<T> = Result<T, MeshError>;

/// Stable numeric codes for errors and validation findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    IoRead = 1001,
    IoWrite = 1002,
    ParseError = 1003,

    InvalidVertexIndex = 2001,
    InvalidCoordinate = 2002,
    EmptyMesh = 2003,
    DegenerateFace = 2005,
    NonManifoldEdge = 2006,
    InconsistentWinding = 2007,
    BoundaryEdge = 2008,

    RepairFailed = 3001,
    HoleFillFailed = 3002,

    UnsupportedFormat = 4001,
}

impl ErrorCode {
    pub fn number(self) -> u16 {
        self as u16
    }

    /// Family name taken from the leading digit.
    pub fn family(self) -> &'static str {
        match self.number() / 1000 {
            1 => "io",
            2 => "data",
            3 => "repair",
            _ => "format",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MESH-{:04}", self.number())
    }
}

/// What a user can do about an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// The path is missing, unreadable or unwritable.
    CheckPath(PathBuf),
    /// The file content is unusable; produce it again.
    Regenerate,
    /// Run these repair passes.
    Repair(&'static [&'static str]),
    /// Save with one of these extensions.
    SaveAs(&'static [&'static str]),
    /// Free-form advice.
    Inspect(&'static str),
}

impl fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoverySuggestion::CheckPath(path) => write!(
                f,
                "Check that {} exists and its directory is accessible",
                path.display()
            ),
            RecoverySuggestion::Regenerate => {
                f.write_str("Regenerate the garment or re-export the mesh as binary STL")
            }
            RecoverySuggestion::Repair(passes) => {
                write!(f, "Run `hem repair` (passes: {})", passes.join(", "))
            }
            RecoverySuggestion::SaveAs(extensions) => {
                write!(f, "Use one of these extensions: {}", extensions.join(", "))
            }
            RecoverySuggestion::Inspect(advice) => f.write_str(advice),
        }
    }
}

/// Where in a mesh or on disk an error was found.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshLocation {
    Vertex(usize),
    Face(usize),
    File(PathBuf),
}

impl fmt::Display for MeshLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshLocation::Vertex(index) => write!(f, "vertex {}", index),
            MeshLocation::Face(index) => write!(f, "face {}", index),
            MeshLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum MeshError {
    #[error("cannot read {path}")]
    #[diagnostic(code(hem_mesh::io::read))]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}")]
    #[diagnostic(code(hem_mesh::io::write))]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a readable mesh: {details}")]
    #[diagnostic(
        code(hem_mesh::io::parse),
        help("The file may be truncated. Regenerate it.")
    )]
    ParseError { path: PathBuf, details: String },

    #[error("no mesh format for extension {extension:?}")]
    #[diagnostic(code(hem_mesh::format), help("Use .stl or .obj"))]
    UnsupportedFormat { extension: Option<String> },

    #[error("empty mesh: {details}")]
    #[diagnostic(code(hem_mesh::data::empty))]
    EmptyMesh { details: String },

    #[error("repair stopped: {details}")]
    #[diagnostic(code(hem_mesh::repair))]
    RepairFailed { details: String },

    #[error("face {face_index} uses vertex {vertex_index} of {vertex_count}")]
    #[diagnostic(code(hem_mesh::data::index))]
    InvalidVertexIndex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },

    #[error("vertex {vertex_index} has {coordinate} = {value}")]
    #[diagnostic(
        code(hem_mesh::data::coordinate),
        help("Non-finite positions usually come from a zero-length tangent upstream")
    )]
    InvalidCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },

    #[error("cannot fill hole: {details}")]
    #[diagnostic(code(hem_mesh::repair::hole))]
    HoleFillFailed { details: String },
}

impl MeshError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MeshError::IoRead { .. } => ErrorCode::IoRead,
            MeshError::IoWrite { .. } => ErrorCode::IoWrite,
            MeshError::ParseError { .. } => ErrorCode::ParseError,
            MeshError::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            MeshError::EmptyMesh { .. } => ErrorCode::EmptyMesh,
            MeshError::RepairFailed { .. } => ErrorCode::RepairFailed,
            MeshError::InvalidVertexIndex { .. } => ErrorCode::InvalidVertexIndex,
            MeshError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
            MeshError::HoleFillFailed { .. } => ErrorCode::HoleFillFailed,
        }
    }

    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            MeshError::IoRead { path, .. } | MeshError::IoWrite { path, .. } => {
                RecoverySuggestion::CheckPath(path.clone())
            }
            MeshError::ParseError { .. } | MeshError::EmptyMesh { .. } => {
                RecoverySuggestion::Regenerate
            }
            MeshError::UnsupportedFormat { .. } => RecoverySuggestion::SaveAs(&["stl", "obj"]),
            MeshError::InvalidVertexIndex { .. } => {
                RecoverySuggestion::Repair(&["remove invalid faces"])
            }
            MeshError::InvalidCoordinate { .. } => {
                RecoverySuggestion::Inspect("Use a coarser sampling step or larger thickness")
            }
            MeshError::RepairFailed { .. } => {
                RecoverySuggestion::Inspect("Check the repair parameters; tolerances must be >= 0")
            }
            MeshError::HoleFillFailed { .. } => {
                RecoverySuggestion::Inspect("Raise the maximum hole size or cap the garment ends")
            }
        }
    }

    pub fn location(&self) -> Option<MeshLocation> {
        match self {
            MeshError::InvalidVertexIndex { face_index, .. } => {
                Some(MeshLocation::Face(*face_index))
            }
            MeshError::InvalidCoordinate { vertex_index, .. } => {
                Some(MeshLocation::Vertex(*vertex_index))
            }
            MeshError::ParseError { path, .. }
            | MeshError::IoRead { path, .. }
            | MeshError::IoWrite { path, .. } => Some(MeshLocation::File(path.clone())),
            _ => None,
        }
    }

    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeshError::IoRead {
            path: path.into(),
            source,
        }
    }

    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeshError::IoWrite {
            path: path.into(),
            source,
        }
    }

    pub fn parse_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        MeshError::ParseError {
            path: path.into(),
            details: details.into(),
        }
    }

    pub fn invalid_vertex_index(face_index: usize, vertex_index: u32, vertex_count: usize) -> Self {
        MeshError::InvalidVertexIndex {
            face_index,
            vertex_index,
            vertex_count,
        }
    }

    pub fn invalid_coordinate(vertex_index: usize, coordinate: &'static str, value: f64) -> Self {
        MeshError::InvalidCoordinate {
            vertex_index,
            coordinate,
            value,
        }
    }

    pub fn empty_mesh(details: impl Into<String>) -> Self {
        MeshError::EmptyMesh {
            details: details.into(),
        }
    }

    pub fn repair_failed(details: impl Into<String>) -> Self {
        MeshError::RepairFailed {
            details: details.into(),
        }
    }

    pub fn hole_fill_failed(details: impl Into<String>) -> Self {
        MeshError::HoleFillFailed {
            details: details.into(),
        }
    }

    pub fn unsupported_format(extension: Option<String>) -> Self {
        MeshError::UnsupportedFormat { extension }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssueSeverity {
    /// Printable in principle, but worth fixing.
    Warning,
    /// Not printable as is.
    Error,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IssueSeverity::Warning => "warning",
            IssueSeverity::Error => "error",
        })
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    InvalidVertexIndex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },
    NaNCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
    },
    InfiniteCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },
    /// Zero-area face.
    DegenerateFace { face_index: usize, area: f64 },
    /// Edge with one adjacent face.
    BoundaryEdge { vertex_a: u32, vertex_b: u32 },
    /// Edge with more than two adjacent faces.
    NonManifoldEdge {
        vertex_a: u32,
        vertex_b: u32,
        face_count: usize,
    },
    /// Both faces of an edge traverse it in the same direction.
    InconsistentWinding { vertex_a: u32, vertex_b: u32 },
}

/// Severity, code, category and advice for one kind of finding.
struct IssueTraits {
    severity: IssueSeverity,
    code: ErrorCode,
    category: &'static str,
    suggestion: &'static str,
}

impl ValidationIssue {
    fn traits(&self) -> IssueTraits {
        use IssueSeverity::{Error, Warning};

        let (severity, code, category, suggestion) = match self {
            ValidationIssue::InvalidVertexIndex { .. } => (
                Error,
                ErrorCode::InvalidVertexIndex,
                "data",
                "`hem repair` drops faces with out-of-range indices",
            ),
            ValidationIssue::NaNCoordinate { .. } | ValidationIssue::InfiniteCoordinate { .. } => (
                Error,
                ErrorCode::InvalidCoordinate,
                "data",
                "Regenerate with a coarser sampling step",
            ),
            ValidationIssue::DegenerateFace { .. } => (
                Warning,
                ErrorCode::DegenerateFace,
                "geometry",
                "`hem repair` removes zero-area faces",
            ),
            ValidationIssue::BoundaryEdge { .. } => (
                Error,
                ErrorCode::BoundaryEdge,
                "topology",
                "Cap the garment ends or let `hem repair` fill the holes",
            ),
            ValidationIssue::NonManifoldEdge { .. } => (
                Error,
                ErrorCode::NonManifoldEdge,
                "topology",
                "`hem repair` removes duplicate faces",
            ),
            ValidationIssue::InconsistentWinding { .. } => (
                Warning,
                ErrorCode::InconsistentWinding,
                "winding",
                "`hem repair` reorients faces consistently",
            ),
        };
        IssueTraits {
            severity,
            code,
            category,
            suggestion,
        }
    }

    pub fn severity(&self) -> IssueSeverity {
        self.traits().severity
    }

    pub fn code(&self) -> ErrorCode {
        self.traits().code
    }

    /// Short label used in reports: data, geometry, topology or winding.
    pub fn category(&self) -> &'static str {
        self.traits().category
    }

    pub fn suggestion(&self) -> &'static str {
        self.traits().suggestion
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::InvalidVertexIndex {
                face_index,
                vertex_index,
                vertex_count,
            } => write!(
                f,
                "face {} uses vertex {} of {}",
                face_index, vertex_index, vertex_count
            ),
            ValidationIssue::NaNCoordinate {
                vertex_index,
                coordinate,
            } => write!(f, "vertex {} has {} = NaN", vertex_index, coordinate),
            ValidationIssue::InfiniteCoordinate {
                vertex_index,
                coordinate,
                value,
            } => write!(f, "vertex {} has {} = {}", vertex_index, coordinate, value),
            ValidationIssue::DegenerateFace { face_index, area } => {
                write!(f, "face {} has area {:.2e}", face_index, area)
            }
            ValidationIssue::BoundaryEdge { vertex_a, vertex_b } => {
                write!(f, "open edge {}-{}", vertex_a, vertex_b)
            }
            ValidationIssue::NonManifoldEdge {
                vertex_a,
                vertex_b,
                face_count,
            } => write!(
                f,
                "edge {}-{} joins {} faces",
                vertex_a, vertex_b, face_count
            ),
            ValidationIssue::InconsistentWinding { vertex_a, vertex_b } => {
                write!(f, "faces on edge {}-{} disagree on winding", vertex_a, vertex_b)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_rendering() {
        assert_eq!(ErrorCode::InvalidVertexIndex.to_string(), "MESH-2001");
        assert_eq!(ErrorCode::UnsupportedFormat.family(), "format");
        assert_eq!(ErrorCode::HoleFillFailed.family(), "repair");
        assert_eq!(
            MeshError::unsupported_format(Some("ply".into())).code(),
            ErrorCode::UnsupportedFormat
        );
    }

    #[test]
    fn test_bad_index_suggests_repair() {
        let err = MeshError::invalid_vertex_index(3, 9, 4);
        let RecoverySuggestion::Repair(passes) = err.recovery_suggestion() else {
            panic!("expected a repair suggestion");
        };
        assert_eq!(passes, &["remove invalid faces"]);
    }

    #[test]
    fn test_io_suggestion_names_path() {
        let err = MeshError::io_write(
            "/missing/skirt.stl",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.recovery_suggestion().to_string().contains("/missing/skirt.stl"));
    }

    #[test]
    fn test_location() {
        let err = MeshError::invalid_vertex_index(5, 100, 50);
        assert_eq!(err.location(), Some(MeshLocation::Face(5)));

        let err = MeshError::parse_error("skirt.stl", "truncated");
        assert_eq!(err.location().unwrap().to_string(), "skirt.stl");
        assert_eq!(MeshError::empty_mesh("no faces").location(), None);
    }

    #[test]
    fn test_issue_traits() {
        let degenerate = ValidationIssue::DegenerateFace {
            face_index: 0,
            area: 0.0,
        };
        assert_eq!(degenerate.severity(), IssueSeverity::Warning);
        assert_eq!(degenerate.category(), "geometry");

        let open = ValidationIssue::BoundaryEdge {
            vertex_a: 0,
            vertex_b: 1,
        };
        assert_eq!(open.severity(), IssueSeverity::Error);
        assert_eq!(open.code(), ErrorCode::BoundaryEdge);
        assert_eq!(open.to_string(), "open edge 0-1");
    }

    #[test]
    fn test_error_display() {
        let err = MeshError::invalid_vertex_index(5, 100, 50);
        assert_eq!(err.to_string(), "face 5 uses vertex 100 of 50");
    }
}

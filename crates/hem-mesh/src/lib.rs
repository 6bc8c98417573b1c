//! Indexed triangle meshes for hem generation.
//!
//! This crate holds the mesh side of the hem pipeline: the indexed triangle
//! mesh the stitcher produces, the checks that tell whether it is a closed
//! solid, the passes that fix it when it is not, and STL/OBJ I/O.
//!
//! # Coordinate System
//!
//! Right-handed, Z up. Face winding is **counter-clockwise when viewed from
//! outside**, so normals point outward by the right-hand rule and a closed
//! mesh has positive signed volume. Coordinates are unit-agnostic; generated
//! hems are in centimeters.
//!
//! # Quick Start
//!
//! ```no_run
//! use hem_mesh::Mesh;
//!
//! let mut mesh = Mesh::load("skirt.stl").unwrap();
//!
//! let report = mesh.validate();
//! println!("{}", report);
//!
//! if !report.is_printable() {
//!     let repaired = mesh.repair().unwrap();
//!     println!("{}", repaired);
//! }
//!
//! mesh.save("skirt_fixed.stl").unwrap();
//! ```
//!
//! # Logging
//!
//! All operations emit `tracing` events; see [`tracing_ext`] for targets.

mod error;
mod types;

pub mod adjacency;
pub mod holes;
pub mod io;
pub mod repair;
pub mod tracing_ext;
pub mod validate;
pub mod winding;

pub use error::{
    ErrorCode, IssueSeverity, MeshError, MeshLocation, MeshResult, RecoverySuggestion,
    ValidationIssue,
};
pub use types::{Mesh, Triangle, Vertex};

pub use adjacency::MeshAdjacency;
pub use holes::{BoundaryLoop, detect_holes, fill_holes_with_max_edges};
pub use io::{MeshFormat, decode_stl, encode_stl, load_mesh, save_mesh, save_obj, save_stl};
pub use repair::{
    RepairParams, RepairReport, compute_vertex_normals, remove_degenerate_triangles,
    remove_duplicate_faces, remove_invalid_faces, remove_unreferenced_vertices, repair_mesh,
    repair_mesh_with_config, weld_vertices,
};
pub use tracing_ext::{OperationTimer, log_mesh_stats};
pub use validate::{
    DataValidationResult, MeshReport, ValidationOptions, log_validation, topology_issues,
    validate_mesh, validate_mesh_data,
};
pub use winding::{WindingFix, fix_winding_order, orient_outward};

impl Mesh {
    /// Load a mesh from file, detecting the format from the extension.
    pub fn load(path: impl AsRef<std::path::Path>) -> MeshResult<Self> {
        load_mesh(path.as_ref())
    }

    /// Save a mesh, choosing the format from the extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> MeshResult<()> {
        save_mesh(self, path.as_ref())
    }

    /// Validate the mesh and return a report.
    pub fn validate(&self) -> MeshReport {
        validate_mesh(self)
    }

    /// Run the default repair pipeline.
    pub fn repair(&mut self) -> MeshResult<RepairReport> {
        repair_mesh(self)
    }

    /// Run the repair pipeline with custom parameters.
    pub fn repair_with_config(&mut self, params: &RepairParams) -> MeshResult<RepairReport> {
        repair_mesh_with_config(self, params)
    }

    /// Encode as a binary STL buffer.
    pub fn to_stl_bytes(&self) -> MeshResult<Vec<u8>> {
        encode_stl(self)
    }
}

//! Topology and data checks on a finished mesh.
//!
//! [`validate_mesh`] summarizes a mesh in a [`MeshReport`]: edge topology,
//! orientation, size and connectivity. [`topology_issues`] and
//! [`validate_mesh_data`] list the individual findings behind it.

use std::fmt;

use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::Mesh;
use crate::adjacency::MeshAdjacency;
use crate::error::{MeshError, MeshResult, ValidationIssue};

/// Summary of a mesh's topology and geometry.
#[derive(Debug, Clone)]
pub struct MeshReport {
    /// No edge has a single adjacent face.
    pub is_watertight: bool,
    /// No edge has more than two adjacent faces.
    pub is_manifold: bool,
    pub boundary_edge_count: usize,
    pub non_manifold_edge_count: usize,
    /// Edges whose two faces traverse them in the same direction.
    pub inconsistent_winding_count: usize,
    /// Unique undirected edges.
    pub edge_count: usize,
    pub vertex_count: usize,
    pub face_count: usize,
    /// `(min, max)` corners, `None` for a mesh without vertices.
    pub bounds: Option<(Point3<f64>, Point3<f64>)>,
    /// Positive when faces wind counter-clockwise seen from outside.
    /// Meaningless unless the mesh is watertight.
    pub signed_volume: f64,
    pub surface_area: f64,
    pub is_inside_out: bool,
    /// Face-connected pieces.
    pub component_count: usize,
}

impl MeshReport {
    /// Has at least one vertex and one face.
    pub fn is_valid(&self) -> bool {
        self.vertex_count > 0 && self.face_count > 0
    }

    /// Euler characteristic `V - E + F`.
    ///
    /// 2 for a closed genus-0 surface (a capped strip), 0 for a closed ring.
    pub fn euler_characteristic(&self) -> i64 {
        self.vertex_count as i64 - self.edge_count as i64 + self.face_count as i64
    }

    pub fn volume(&self) -> f64 {
        self.signed_volume.abs()
    }

    /// Bounding box extent along x, y and z.
    pub fn dimensions(&self) -> Option<(f64, f64, f64)> {
        self.bounds
            .map(|(min, max)| (max.x - min.x, max.y - min.y, max.z - min.z))
    }

    /// Watertight, manifold, consistently wound and outward facing.
    pub fn is_printable(&self) -> bool {
        self.is_watertight
            && self.is_manifold
            && self.inconsistent_winding_count == 0
            && !self.is_inside_out
    }

    /// Named pass/fail checks in report order.
    fn checks(&self) -> [(&'static str, bool, usize); 3] {
        [
            ("open edges", self.is_watertight, self.boundary_edge_count),
            ("non-manifold edges", self.is_manifold, self.non_manifold_edge_count),
            (
                "misoriented edges",
                self.inconsistent_winding_count == 0,
                self.inconsistent_winding_count,
            ),
        ]
    }
}

impl fmt::Display for MeshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} vertices, {} edges, {} faces (chi = {}), {} component(s)",
            self.vertex_count,
            self.edge_count,
            self.face_count,
            self.euler_characteristic(),
            self.component_count
        )?;
        if let Some((min, max)) = &self.bounds {
            writeln!(
                f,
                "bounds ({:.2}, {:.2}, {:.2}) .. ({:.2}, {:.2}, {:.2})",
                min.x, min.y, min.z, max.x, max.y, max.z
            )?;
        }
        writeln!(
            f,
            "area {:.2}, signed volume {:.2}",
            self.surface_area, self.signed_volume
        )?;
        for (label, ok, count) in self.checks() {
            writeln!(f, "{:<20}{}", label, if ok { "none".to_string() } else { count.to_string() })?;
        }
        if self.is_inside_out {
            writeln!(f, "inside-out")?;
        }
        write!(
            f,
            "{}",
            if self.is_printable() {
                "printable"
            } else {
                "not printable"
            }
        )
    }
}

/// Build a [`MeshReport`] for `mesh`.
pub fn validate_mesh(mesh: &Mesh) -> MeshReport {
    let adjacency = MeshAdjacency::build(&mesh.faces);
    let signed_volume = mesh.signed_volume();
    let boundary_edge_count = adjacency.boundary_edge_count();
    let non_manifold_edge_count = adjacency.non_manifold_edge_count();

    let report = MeshReport {
        is_watertight: boundary_edge_count == 0,
        is_manifold: non_manifold_edge_count == 0,
        boundary_edge_count,
        non_manifold_edge_count,
        inconsistent_winding_count: adjacency.inconsistent_edge_count(),
        edge_count: adjacency.edge_count(),
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        bounds: mesh.bounds(),
        signed_volume,
        surface_area: mesh.surface_area(),
        is_inside_out: signed_volume < 0.0,
        component_count: count_components(mesh),
    };

    for (label, ok, count) in report.checks() {
        if !ok {
            warn!(count, "Mesh has {}", label);
        }
    }
    if report.is_inside_out && report.is_watertight {
        warn!(signed_volume, "Mesh is inside-out");
    }
    debug!(
        edges = report.edge_count,
        components = report.component_count,
        area = report.surface_area,
        "Validated mesh"
    );

    report
}

/// Log a one-line summary of a validation report.
pub fn log_validation(report: &MeshReport) {
    info!(
        vertices = report.vertex_count,
        faces = report.face_count,
        euler = report.euler_characteristic(),
        printable = report.is_printable(),
        "Mesh validated"
    );
}

/// Per-edge and per-face findings: open, non-manifold and misoriented
/// edges, then zero-area faces.
///
/// At most `max_issues` are returned. Edge order within a kind follows hash
/// iteration and is not stable between runs.
pub fn topology_issues(mesh: &Mesh, max_issues: usize) -> Vec<ValidationIssue> {
    let adjacency = MeshAdjacency::build(&mesh.faces);

    let open = adjacency
        .boundary_edges()
        .map(|(vertex_a, vertex_b)| ValidationIssue::BoundaryEdge { vertex_a, vertex_b });
    let crowded =
        adjacency
            .non_manifold_edges()
            .map(|((vertex_a, vertex_b), face_count)| ValidationIssue::NonManifoldEdge {
                vertex_a,
                vertex_b,
                face_count,
            });
    let flipped = adjacency
        .inconsistent_edges()
        .map(|(vertex_a, vertex_b)| ValidationIssue::InconsistentWinding { vertex_a, vertex_b });
    let flat = mesh
        .triangles()
        .map(|tri| tri.area())
        .enumerate()
        .filter(|&(_, area)| area <= f64::EPSILON)
        .map(|(face_index, area)| ValidationIssue::DegenerateFace { face_index, area });

    open.chain(crowded)
        .chain(flipped)
        .chain(flat)
        .take(max_issues)
        .collect()
}

/// Face-connected components, by union-find over vertex indices.
fn count_components(mesh: &Mesh) -> usize {
    fn root(parent: &mut [u32], mut x: u32) -> u32 {
        while parent[x as usize] != x {
            let grandparent = parent[parent[x as usize] as usize];
            parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    let n = mesh.vertices.len();
    let in_range = |face: &&[u32; 3]| face.iter().all(|&i| (i as usize) < n);
    let mut parent: Vec<u32> = (0..n as u32).collect();

    for face in mesh.faces.iter().filter(in_range) {
        let r = root(&mut parent, face[0]);
        for &v in &face[1..] {
            let rv = root(&mut parent, v);
            parent[rv as usize] = r;
        }
    }

    let mut roots: Vec<u32> = mesh
        .faces
        .iter()
        .filter(in_range)
        .map(|face| root(&mut parent, face[0]))
        .collect();
    roots.sort_unstable();
    roots.dedup();
    roots.len()
}

/// How [`validate_mesh_data`] reacts to bad data.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Fail on the first finding instead of collecting (default: true).
    pub reject_on_invalid: bool,
    /// Stop collecting after this many findings (default: 100).
    pub max_issues: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            reject_on_invalid: true,
            max_issues: 100,
        }
    }
}

impl ValidationOptions {
    /// Collect up to 1000 findings without failing.
    pub fn collect_all() -> Self {
        Self {
            reject_on_invalid: false,
            max_issues: 1000,
        }
    }
}

/// Findings of [`validate_mesh_data`].
#[derive(Debug, Clone, Default)]
pub struct DataValidationResult {
    pub issues: Vec<ValidationIssue>,
    pub invalid_index_count: usize,
    pub nan_count: usize,
    pub infinity_count: usize,
}

impl DataValidationResult {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    fn full(&self, options: &ValidationOptions) -> bool {
        self.issues.len() >= options.max_issues
    }
}

/// Check for non-finite coordinates and out-of-range face indices.
///
/// With `reject_on_invalid` the first finding is returned as an error;
/// otherwise findings are collected and `Ok` is always returned.
pub fn validate_mesh_data(
    mesh: &Mesh,
    options: &ValidationOptions,
) -> MeshResult<DataValidationResult> {
    let mut result = DataValidationResult::default();
    let vertex_count = mesh.vertices.len();

    'vertices: for (vertex_index, vertex) in mesh.vertices.iter().enumerate() {
        let p = vertex.position;
        for (coordinate, value) in [("x", p.x), ("y", p.y), ("z", p.z)] {
            if value.is_finite() {
                continue;
            }
            if options.reject_on_invalid {
                return Err(MeshError::invalid_coordinate(vertex_index, coordinate, value));
            }
            if result.full(options) {
                break 'vertices;
            }
            let issue = if value.is_nan() {
                result.nan_count += 1;
                ValidationIssue::NaNCoordinate {
                    vertex_index,
                    coordinate,
                }
            } else {
                result.infinity_count += 1;
                ValidationIssue::InfiniteCoordinate {
                    vertex_index,
                    coordinate,
                    value,
                }
            };
            result.issues.push(issue);
        }
    }

    'faces: for (face_index, face) in mesh.faces.iter().enumerate() {
        for &vertex_index in face.iter().filter(|&&i| i as usize >= vertex_count) {
            if options.reject_on_invalid {
                return Err(MeshError::invalid_vertex_index(
                    face_index,
                    vertex_index,
                    vertex_count,
                ));
            }
            if result.full(options) {
                break 'faces;
            }
            result.invalid_index_count += 1;
            result.issues.push(ValidationIssue::InvalidVertexIndex {
                face_index,
                vertex_index,
                vertex_count,
            });
        }
    }

    if result.is_valid() {
        debug!("Mesh data is clean");
    } else {
        warn!(
            issues = result.issue_count(),
            invalid_indices = result.invalid_index_count,
            nan = result.nan_count,
            infinite = result.infinity_count,
            "Mesh data has problems"
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vertex;

    fn tetrahedron() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.5, 0.866025, 0.0));
        mesh.vertices
            .push(Vertex::from_coords(0.5, 0.288675, 0.816497));

        mesh.faces.push([0, 2, 1]);
        mesh.faces.push([0, 1, 3]);
        mesh.faces.push([1, 2, 3]);
        mesh.faces.push([2, 0, 3]);

        mesh
    }

    #[test]
    fn test_validate_watertight_mesh() {
        let report = validate_mesh(&tetrahedron());

        assert!(report.is_valid());
        assert!(report.is_watertight);
        assert!(report.is_manifold);
        assert!(report.is_printable());
        assert_eq!(report.edge_count, 6);
        assert_eq!(report.euler_characteristic(), 2);
        assert_eq!(report.component_count, 1);
        assert!(report.volume() > 0.0);
    }

    #[test]
    fn test_validate_open_mesh() {
        let mut mesh = tetrahedron();
        mesh.faces.pop();
        let report = validate_mesh(&mesh);

        assert!(!report.is_watertight);
        assert!(report.is_manifold);
        assert!(!report.is_printable());
        assert_eq!(report.boundary_edge_count, 3);
    }

    #[test]
    fn test_validate_inside_out_mesh() {
        let mut mesh = tetrahedron();
        for face in &mut mesh.faces {
            face.swap(1, 2);
        }
        let report = validate_mesh(&mesh);

        assert!(report.is_watertight);
        assert!(report.is_inside_out);
        assert_eq!(report.inconsistent_winding_count, 0);
        assert!(!report.is_printable());
    }

    #[test]
    fn test_validate_inconsistent_winding() {
        let mut mesh = tetrahedron();
        mesh.faces[1].swap(1, 2);
        let report = validate_mesh(&mesh);

        assert!(report.inconsistent_winding_count > 0);
        assert!(!report.is_printable());
    }

    #[test]
    fn test_component_count() {
        let mut mesh = tetrahedron();
        let offset = mesh.vertices.len() as u32;
        let copies: Vec<Vertex> = mesh
            .vertices
            .iter()
            .map(|v| Vertex::from_coords(v.position.x + 5.0, v.position.y, v.position.z))
            .collect();
        mesh.vertices.extend(copies);
        let faces: Vec<[u32; 3]> = mesh
            .faces
            .iter()
            .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset])
            .collect();
        mesh.faces.extend(faces);

        let report = validate_mesh(&mesh);
        assert_eq!(report.component_count, 2);
        assert_eq!(report.euler_characteristic(), 4);
    }

    #[test]
    fn test_report_display() {
        let output = format!("{}", validate_mesh(&tetrahedron()));

        assert!(output.starts_with("4 vertices, 6 edges, 4 faces (chi = 2), 1 component(s)"));
        assert!(output.contains("open edges          none"));
        assert!(output.ends_with("\nprintable"));
    }

    #[test]
    fn test_topology_issues_for_open_mesh() {
        let mut mesh = tetrahedron();
        mesh.faces.pop();
        let issues = topology_issues(&mesh, 100);

        assert_eq!(issues.len(), 3);
        assert!(
            issues
                .iter()
                .all(|i| matches!(i, ValidationIssue::BoundaryEdge { .. }))
        );
        assert!(topology_issues(&mesh, 1).len() == 1);
    }

    #[test]
    fn test_validate_invalid_vertex_index_strict() {
        let mut mesh = tetrahedron();
        mesh.faces.push([0, 1, 10]);

        match validate_mesh_data(&mesh, &ValidationOptions::default()) {
            Err(MeshError::InvalidVertexIndex {
                face_index,
                vertex_index,
                vertex_count,
            }) => {
                assert_eq!(face_index, 4);
                assert_eq!(vertex_index, 10);
                assert_eq!(vertex_count, 4);
            }
            other => panic!("Expected InvalidVertexIndex error, got: {:?}", other),
        }
    }

    #[test]
    fn test_validate_collects_all_issue_types() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(f64::NAN, 0.0, 0.0));
        mesh.vertices
            .push(Vertex::from_coords(1.0, f64::INFINITY, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 99]);

        let result = validate_mesh_data(&mesh, &ValidationOptions::collect_all()).unwrap();

        assert!(!result.is_valid());
        assert_eq!(result.nan_count, 1);
        assert_eq!(result.infinity_count, 1);
        assert_eq!(result.invalid_index_count, 1);
        assert_eq!(result.issue_count(), 3);
    }

    #[test]
    fn test_validate_nan_strict() {
        let mut mesh = tetrahedron();
        mesh.vertices[2].position.y = f64::NAN;

        let err = validate_mesh_data(&mesh, &ValidationOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidCoordinate {
                vertex_index: 2,
                coordinate: "y",
                ..
            }
        ));
    }
}

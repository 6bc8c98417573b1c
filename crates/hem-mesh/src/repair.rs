//! Mesh repair passes.
//!
//! Each pass is a free function that mutates the mesh in place and returns how
//! much it changed. [`repair_mesh_with_config`] chains them in a fixed order
//! and collects the counts into a [`RepairReport`].

use hashbrown::{HashMap, HashSet};
use nalgebra::{Point3, Vector3};
use tracing::{debug, info, warn};

use crate::Mesh;
use crate::error::{MeshError, MeshResult};
use crate::holes::fill_holes_with_max_edges;
use crate::tracing_ext::{OperationTimer, log_repair_result};
use crate::winding::{fix_winding_order, orient_outward};

/// Parameters for the repair pipeline.
#[derive(Debug, Clone)]
pub struct RepairParams {
    /// Vertices closer than this are merged.
    ///
    /// Generated hems are in centimeters, where 1e-6 catches float noise from
    /// the offset step without merging distinct samples.
    pub weld_epsilon: f64,

    /// Triangles with area below this are removed.
    pub degenerate_area_threshold: f64,

    /// Boundary loops with more edges than this are left open.
    pub max_hole_edges: usize,

    /// Make adjacent faces agree on winding.
    pub fix_winding: bool,

    /// Reverse all faces when the signed volume is negative.
    pub fix_orientation: bool,

    /// Triangulate boundary loops.
    pub fill_holes: bool,

    /// Drop vertices no face references.
    pub remove_unreferenced: bool,

    /// Compute area-weighted vertex normals at the end.
    pub compute_normals: bool,
}

impl Default for RepairParams {
    fn default() -> Self {
        Self {
            weld_epsilon: 1e-6,
            degenerate_area_threshold: 1e-12,
            max_hole_edges: 100,
            fix_winding: true,
            fix_orientation: true,
            fill_holes: true,
            remove_unreferenced: true,
            compute_normals: false,
        }
    }
}

impl RepairParams {
    /// Conservative cleanup that never adds faces.
    pub fn cleanup_only() -> Self {
        Self {
            fill_holes: false,
            ..Default::default()
        }
    }

    /// Preparation for printing: larger weld radius and unbounded hole filling.
    pub fn for_printing() -> Self {
        Self {
            weld_epsilon: 1e-4,
            degenerate_area_threshold: 1e-9,
            max_hole_edges: usize::MAX,
            ..Default::default()
        }
    }

    /// Set the weld epsilon.
    pub fn with_weld_epsilon(mut self, epsilon: f64) -> Self {
        self.weld_epsilon = epsilon;
        self
    }

    /// Set the maximum hole size to fill.
    pub fn with_max_hole_edges(mut self, max_edges: usize) -> Self {
        self.max_hole_edges = max_edges;
        self
    }

    fn check(&self) -> MeshResult<()> {
        if !self.weld_epsilon.is_finite() || self.weld_epsilon < 0.0 {
            return Err(MeshError::repair_failed(format!(
                "weld_epsilon must be finite and non-negative, got {}",
                self.weld_epsilon
            )));
        }
        if !self.degenerate_area_threshold.is_finite() || self.degenerate_area_threshold < 0.0 {
            return Err(MeshError::repair_failed(format!(
                "degenerate_area_threshold must be finite and non-negative, got {}",
                self.degenerate_area_threshold
            )));
        }
        Ok(())
    }
}

/// Counts of what each repair pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub invalid_faces_removed: usize,
    pub degenerate_faces_removed: usize,
    pub vertices_welded: usize,
    pub duplicate_faces_removed: usize,
    pub faces_flipped: usize,
    pub orientation_reversed: bool,
    pub holes_filled: usize,
    pub unreferenced_vertices_removed: usize,
}

impl RepairReport {
    /// Whether any pass changed the mesh.
    pub fn changed(&self) -> bool {
        *self != Self::default()
    }
}

impl std::fmt::Display for RepairReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Repair Report:")?;
        writeln!(f, "  Invalid faces removed: {}", self.invalid_faces_removed)?;
        writeln!(f, "  Degenerate faces removed: {}", self.degenerate_faces_removed)?;
        writeln!(f, "  Vertices welded: {}", self.vertices_welded)?;
        writeln!(f, "  Duplicate faces removed: {}", self.duplicate_faces_removed)?;
        writeln!(f, "  Faces flipped: {}", self.faces_flipped)?;
        writeln!(
            f,
            "  Orientation reversed: {}",
            if self.orientation_reversed { "yes" } else { "no" }
        )?;
        writeln!(f, "  Holes filled: {}", self.holes_filled)?;
        writeln!(
            f,
            "  Unreferenced vertices removed: {}",
            self.unreferenced_vertices_removed
        )
    }
}

/// Drop faces that reference a vertex past the end of the vertex buffer.
pub fn remove_invalid_faces(mesh: &mut Mesh) -> usize {
    let vertex_count = mesh.vertices.len();
    let before = mesh.faces.len();
    mesh.faces
        .retain(|face| face.iter().all(|&i| (i as usize) < vertex_count));
    before - mesh.faces.len()
}

/// Remove triangles whose area is at or below `area_threshold`, or that
/// repeat a vertex index.
pub fn remove_degenerate_triangles(mesh: &mut Mesh, area_threshold: f64) -> usize {
    let vertices = &mesh.vertices;
    let before = mesh.faces.len();

    mesh.faces.retain(|&[a, b, c]| {
        if a == b || b == c || a == c {
            return false;
        }
        let pa = vertices[a as usize].position;
        let pb = vertices[b as usize].position;
        let pc = vertices[c as usize].position;
        (pb - pa).cross(&(pc - pa)).norm() * 0.5 > area_threshold
    });

    let removed = before - mesh.faces.len();
    if removed > 0 {
        debug!("Removed {} degenerate triangles", removed);
    }
    removed
}

fn cell_of(pos: &Point3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (pos.x / cell_size).floor() as i64,
        (pos.y / cell_size).floor() as i64,
        (pos.z / cell_size).floor() as i64,
    )
}

/// Merge vertices closer than `epsilon`, keeping the lowest index of each
/// cluster.
///
/// Candidates are found through a spatial hash with cells of size
/// `2 * epsilon`, checking the 27 surrounding cells. Faces that collapse are
/// removed. Vertices are not deleted here; run
/// [`remove_unreferenced_vertices`] afterwards.
pub fn weld_vertices(mesh: &mut Mesh, epsilon: f64) -> usize {
    if mesh.vertices.is_empty() || epsilon <= 0.0 {
        return 0;
    }

    let cell_size = epsilon * 2.0;
    let mut grid: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        grid.entry(cell_of(&vertex.position, cell_size))
            .or_default()
            .push(idx as u32);
    }

    let mut remap: Vec<u32> = (0..mesh.vertices.len() as u32).collect();
    let mut merged = 0;

    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        let idx = idx as u32;
        if remap[idx as usize] != idx {
            continue;
        }

        let (cx, cy, cz) = cell_of(&vertex.position, cell_size);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(candidates) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &other in candidates {
                        if other <= idx || remap[other as usize] != other {
                            continue;
                        }
                        let dist = (vertex.position - mesh.vertices[other as usize].position).norm();
                        if dist < epsilon {
                            remap[other as usize] = idx;
                            merged += 1;
                        }
                    }
                }
            }
        }
    }

    if merged == 0 {
        return 0;
    }

    for face in &mut mesh.faces {
        for i in face.iter_mut() {
            *i = remap[*i as usize];
        }
    }
    mesh.faces.retain(|&[a, b, c]| a != b && b != c && a != c);

    info!("Welded {} vertices (epsilon = {:.1e})", merged, epsilon);
    merged
}

/// Remove faces that use the same three vertices as an earlier face,
/// regardless of winding.
pub fn remove_duplicate_faces(mesh: &mut Mesh) -> usize {
    let mut seen: HashSet<[u32; 3]> = HashSet::with_capacity(mesh.faces.len());
    let before = mesh.faces.len();

    mesh.faces.retain(|face| {
        let mut key = *face;
        key.sort_unstable();
        seen.insert(key)
    });

    let removed = before - mesh.faces.len();
    if removed > 0 {
        debug!("Removed {} duplicate faces", removed);
    }
    removed
}

/// Drop vertices that no face references and compact the vertex buffer.
///
/// Faces must only reference existing vertices; see [`remove_invalid_faces`].
pub fn remove_unreferenced_vertices(mesh: &mut Mesh) -> usize {
    let mut used = vec![false; mesh.vertices.len()];
    for face in &mesh.faces {
        for &i in face {
            used[i as usize] = true;
        }
    }

    let removed = used.iter().filter(|u| !**u).count();
    if removed == 0 {
        return 0;
    }

    let mut remap = vec![u32::MAX; mesh.vertices.len()];
    let mut next = 0u32;
    for (old, &keep) in used.iter().enumerate() {
        if keep {
            remap[old] = next;
            next += 1;
        }
    }

    let mut old_idx = 0;
    mesh.vertices.retain(|_| {
        let keep = used[old_idx];
        old_idx += 1;
        keep
    });
    for face in &mut mesh.faces {
        for i in face.iter_mut() {
            *i = remap[*i as usize];
        }
    }

    debug!("Removed {} unreferenced vertices", removed);
    removed
}

/// Set every vertex normal to the area-weighted average of its face normals.
pub fn compute_vertex_normals(mesh: &mut Mesh) {
    let mut sums = vec![Vector3::zeros(); mesh.vertices.len()];

    for tri_idx in 0..mesh.faces.len() {
        let face = mesh.faces[tri_idx];
        let Some(tri) = mesh.triangle(tri_idx) else {
            continue;
        };
        // Unnormalized cross product is already weighted by twice the area.
        let weighted = tri.scaled_normal();
        for &i in &face {
            sums[i as usize] += weighted;
        }
    }

    for (vertex, sum) in mesh.vertices.iter_mut().zip(sums) {
        vertex.normal = sum.try_normalize(f64::EPSILON);
    }
}

/// Run the default repair pipeline.
pub fn repair_mesh(mesh: &mut Mesh) -> MeshResult<RepairReport> {
    repair_mesh_with_config(mesh, &RepairParams::default())
}

/// Run every enabled repair pass in order.
///
/// Order: invalid faces, degenerate faces, weld, duplicates, winding, holes,
/// orientation, unreferenced vertices, normals. Orientation runs after hole
/// filling because signed volume is only meaningful on a closed surface.
pub fn repair_mesh_with_config(mesh: &mut Mesh, params: &RepairParams) -> MeshResult<RepairReport> {
    params.check()?;
    let _timer = OperationTimer::with_context("repair", mesh.face_count(), mesh.vertex_count());

    info!(
        "Starting mesh repair (weld={:.1e}, area={:.1e}, max_hole_edges={})",
        params.weld_epsilon, params.degenerate_area_threshold, params.max_hole_edges
    );

    let mut report = RepairReport::default();
    let initial_verts = mesh.vertex_count();
    let initial_faces = mesh.face_count();

    if initial_faces == 0 {
        warn!("Mesh has no faces, skipping repair");
        return Ok(report);
    }

    // 1. Faces that point outside the vertex buffer
    report.invalid_faces_removed = remove_invalid_faces(mesh);
    log_repair_result("remove_invalid_faces", report.invalid_faces_removed);

    // 2. Zero-area triangles
    report.degenerate_faces_removed =
        remove_degenerate_triangles(mesh, params.degenerate_area_threshold);
    log_repair_result("remove_degenerate", report.degenerate_faces_removed);

    // 3. Coincident vertices
    report.vertices_welded = weld_vertices(mesh, params.weld_epsilon);
    log_repair_result("weld_vertices", report.vertices_welded);

    // 4. Welding can create duplicates
    report.duplicate_faces_removed = remove_duplicate_faces(mesh);
    log_repair_result("remove_duplicates", report.duplicate_faces_removed);

    // 5. Winding
    if params.fix_winding {
        report.faces_flipped = fix_winding_order(mesh).flipped_faces;
        log_repair_result("fix_winding", report.faces_flipped);
    }

    // 6. Holes
    if params.fill_holes {
        match fill_holes_with_max_edges(mesh, params.max_hole_edges) {
            Ok(filled) => report.holes_filled = filled,
            Err(e) => warn!("Could not fill holes: {}", e),
        }
        log_repair_result("fill_holes", report.holes_filled);
    }

    // 7. Outward orientation
    if params.fix_orientation {
        report.orientation_reversed = orient_outward(mesh);
    }

    // 8. Compact vertex buffer
    if params.remove_unreferenced {
        report.unreferenced_vertices_removed = remove_unreferenced_vertices(mesh);
        log_repair_result("remove_unreferenced", report.unreferenced_vertices_removed);
    }

    if params.compute_normals {
        compute_vertex_normals(mesh);
    }

    if mesh.faces.is_empty() {
        return Err(MeshError::repair_failed(format!(
            "every one of {} faces was removed",
            initial_faces
        )));
    }

    info!(
        "Repair complete: {} verts -> {}, {} faces -> {}",
        initial_verts,
        mesh.vertex_count(),
        initial_faces,
        mesh.face_count()
    );

    Ok(report)
}

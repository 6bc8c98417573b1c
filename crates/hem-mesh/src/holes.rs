//! Hole detection and filling.

use hashbrown::{HashMap, HashSet};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{MeshError, MeshResult};
use crate::{Mesh, Triangle};

/// A closed chain of boundary edges.
///
/// Vertices are ordered opposite to the winding of the faces that own the
/// boundary edges, so a fan or ear over `vertices` in order matches the
/// surrounding surface.
#[derive(Debug, Clone)]
pub struct BoundaryLoop {
    pub vertices: Vec<u32>,
}

impl BoundaryLoop {
    /// Number of edges (and vertices) in the loop.
    pub fn edge_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Trace all closed boundary loops in the mesh.
///
/// Boundary chains that branch or dead-end (for example at a non-manifold
/// vertex) are logged and skipped.
pub fn detect_holes(mesh: &Mesh) -> Vec<BoundaryLoop> {
    let mut undirected: HashMap<(u32, u32), u32> = HashMap::new();
    for face in &mesh.faces {
        for i in 0..3 {
            let (a, b) = (face[i], face[(i + 1) % 3]);
            let key = if a < b { (a, b) } else { (b, a) };
            *undirected.entry(key).or_default() += 1;
        }
    }

    // Hole loop runs b -> a for every face edge a -> b on the boundary.
    let mut next: HashMap<u32, u32> = HashMap::new();
    let mut branching = false;
    for face in &mesh.faces {
        for i in 0..3 {
            let (a, b) = (face[i], face[(i + 1) % 3]);
            let key = if a < b { (a, b) } else { (b, a) };
            if undirected.get(&key) == Some(&1) && next.insert(b, a).is_some() {
                branching = true;
            }
        }
    }

    if next.is_empty() {
        return Vec::new();
    }
    if branching {
        warn!("Boundary has branching vertices; some loops may be incomplete");
    }
    debug!("Found {} boundary edges", next.len());

    let mut starts: Vec<u32> = next.keys().copied().collect();
    starts.sort_unstable();

    let mut visited: HashSet<u32> = HashSet::new();
    let mut loops = Vec::new();

    for start in starts {
        if visited.contains(&start) {
            continue;
        }

        let mut vertices = vec![start];
        visited.insert(start);
        let mut current = start;
        let closed = loop {
            match next.get(&current) {
                Some(&n) if n == start => break true,
                Some(&n) if visited.insert(n) => {
                    vertices.push(n);
                    current = n;
                }
                _ => break false,
            }
        };

        if closed && vertices.len() >= 3 {
            loops.push(BoundaryLoop { vertices });
        } else {
            warn!("Boundary chain starting at vertex {} is not closed", start);
        }
    }

    info!(
        "Detected {} holes, sizes: {:?}",
        loops.len(),
        loops.iter().map(BoundaryLoop::edge_count).collect::<Vec<_>>()
    );

    loops
}

/// Triangulate a boundary loop by ear clipping, with a fan as fallback.
pub fn triangulate_loop(mesh: &Mesh, boundary: &BoundaryLoop) -> Vec<[u32; 3]> {
    let n = boundary.vertices.len();
    if n < 3 {
        return Vec::new();
    }

    let positions: Vec<Point3<f64>> = boundary
        .vertices
        .iter()
        .map(|&idx| mesh.vertices[idx as usize].position)
        .collect();
    let normal = loop_normal(&positions);

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    while remaining.len() > 3 {
        let len = remaining.len();
        let ear = (0..len).find(|&i| {
            let prev = remaining[(i + len - 1) % len];
            let next = remaining[(i + 1) % len];
            is_ear(&positions, &remaining, prev, remaining[i], next, &normal)
        });

        let Some(i) = ear else {
            warn!(
                "Ear clipping stuck with {} vertices remaining, using fan",
                remaining.len()
            );
            break;
        };

        let prev = remaining[(i + len - 1) % len];
        let next = remaining[(i + 1) % len];
        triangles.push([
            boundary.vertices[prev],
            boundary.vertices[remaining[i]],
            boundary.vertices[next],
        ]);
        remaining.remove(i);
    }

    for i in 1..remaining.len() - 1 {
        triangles.push([
            boundary.vertices[remaining[0]],
            boundary.vertices[remaining[i]],
            boundary.vertices[remaining[i + 1]],
        ]);
    }

    debug!("Filled {}-edge hole with {} triangles", n, triangles.len());
    triangles
}

/// Newell normal of a polygon.
fn loop_normal(positions: &[Point3<f64>]) -> Vector3<f64> {
    let n = positions.len();
    let centroid = positions
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords)
        / n as f64;

    let normal = (0..n).fold(Vector3::zeros(), |acc, i| {
        let a = positions[i].coords - centroid;
        let b = positions[(i + 1) % n].coords - centroid;
        acc + a.cross(&b)
    });

    normal.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::z)
}

fn is_ear(
    positions: &[Point3<f64>],
    remaining: &[usize],
    prev: usize,
    curr: usize,
    next: usize,
    normal: &Vector3<f64>,
) -> bool {
    let tri = Triangle::new(positions[prev], positions[curr], positions[next]);
    let Some(tri_normal) = tri.normal() else {
        return false;
    };
    if tri_normal.dot(normal) < 0.0 {
        return false;
    }

    !remaining
        .iter()
        .filter(|&&idx| idx != prev && idx != curr && idx != next)
        .any(|&idx| contains_projected(&tri, &positions[idx], normal))
}

/// Point-in-triangle test after dropping the axis most aligned with `normal`.
fn contains_projected(tri: &Triangle, p: &Point3<f64>, normal: &Vector3<f64>) -> bool {
    let abs = normal.abs();
    let project = |q: &Point3<f64>| -> (f64, f64) {
        if abs.z >= abs.x && abs.z >= abs.y {
            (q.x, q.y)
        } else if abs.y >= abs.x {
            (q.x, q.z)
        } else {
            (q.y, q.z)
        }
    };

    let (p, a, b, c) = (project(p), project(&tri.v0), project(&tri.v1), project(&tri.v2));
    let side = |p1: (f64, f64), p2: (f64, f64), p3: (f64, f64)| {
        (p1.0 - p3.0) * (p2.1 - p3.1) - (p2.0 - p3.0) * (p1.1 - p3.1)
    };

    let d1 = side(p, a, b);
    let d2 = side(p, b, c);
    let d3 = side(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Fill every hole with at most `max_hole_edges` edges.
///
/// Loops are triangulated in parallel and appended to the face list.
/// Returns the number of holes filled.
pub fn fill_holes_with_max_edges(mesh: &mut Mesh, max_hole_edges: usize) -> MeshResult<usize> {
    if max_hole_edges < 3 {
        return Err(MeshError::hole_fill_failed(format!(
            "max_hole_edges must be at least 3, got {}",
            max_hole_edges
        )));
    }

    let (fillable, skipped): (Vec<_>, Vec<_>) = detect_holes(mesh)
        .into_iter()
        .partition(|hole| hole.edge_count() <= max_hole_edges);

    for hole in &skipped {
        warn!(
            "Skipping hole with {} edges (max: {})",
            hole.edge_count(),
            max_hole_edges
        );
    }

    let patches: Vec<Vec<[u32; 3]>> = fillable
        .par_iter()
        .map(|hole| triangulate_loop(mesh, hole))
        .collect();

    let filled = patches.len();
    for patch in patches {
        mesh.faces.extend(patch);
    }

    if filled > 0 {
        info!("Filled {} holes", filled);
    }
    Ok(filled)
}

//! Winding consistency and outward orientation.

use std::collections::VecDeque;
use tracing::{debug, info};

use crate::Mesh;
use crate::adjacency::{MeshAdjacency, normalize_edge};

/// Outcome of a winding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindingFix {
    /// Faces whose vertex order was reversed.
    pub flipped_faces: usize,
    /// Face-connected components visited.
    pub components: usize,
}

/// Make every face agree with its neighbors on shared-edge direction.
///
/// Each connected component is flood-filled from its lowest-index face, which
/// keeps its orientation. A neighbor that traverses a shared edge in the same
/// direction as an already oriented face gets its winding reversed. Non-manifold
/// edges are followed too, so a fin may end up in either orientation.
pub fn fix_winding_order(mesh: &mut Mesh) -> WindingFix {
    let face_count = mesh.faces.len();
    if face_count == 0 {
        return WindingFix::default();
    }

    let adjacency = MeshAdjacency::build(&mesh.faces);

    // None = unvisited, Some(true) = needs flipping.
    let mut flip: Vec<Option<bool>> = vec![None; face_count];
    let mut queue = VecDeque::new();
    let mut components = 0;

    for seed in 0..face_count {
        if flip[seed].is_some() {
            continue;
        }
        components += 1;
        flip[seed] = Some(false);
        queue.push_back(seed);

        while let Some(face_idx) = queue.pop_front() {
            let face = oriented(mesh.faces[face_idx], flip[face_idx] == Some(true));

            for i in 0..3 {
                let (a, b) = (face[i], face[(i + 1) % 3]);
                let Some(neighbors) = adjacency.edge_to_faces.get(&normalize_edge(a, b)) else {
                    continue;
                };

                for &neighbor in neighbors {
                    let neighbor = neighbor as usize;
                    if neighbor == face_idx || flip[neighbor].is_some() {
                        continue;
                    }
                    let same_direction = traverses(&mesh.faces[neighbor], a, b);
                    flip[neighbor] = Some(same_direction);
                    queue.push_back(neighbor);
                }
            }
        }
    }

    let mut flipped_faces = 0;
    for (face, state) in mesh.faces.iter_mut().zip(&flip) {
        if *state == Some(true) {
            face.swap(1, 2);
            flipped_faces += 1;
        }
    }

    if flipped_faces > 0 {
        info!(
            "Fixed winding order: flipped {} faces across {} component(s)",
            flipped_faces, components
        );
    } else {
        debug!("Winding already consistent across {} component(s)", components);
    }

    WindingFix {
        flipped_faces,
        components,
    }
}

/// Reverse every face when the signed volume is negative.
///
/// Returns true when the mesh was flipped.
pub fn orient_outward(mesh: &mut Mesh) -> bool {
    if !mesh.is_inside_out() {
        return false;
    }
    for face in &mut mesh.faces {
        face.swap(1, 2);
    }
    info!("Mesh was inside-out; reversed all {} faces", mesh.faces.len());
    true
}

fn oriented(mut face: [u32; 3], flipped: bool) -> [u32; 3] {
    if flipped {
        face.swap(1, 2);
    }
    face
}

/// Whether `face` contains the directed edge `a -> b`.
fn traverses(face: &[u32; 3], a: u32, b: u32) -> bool {
    (0..3).any(|i| face[i] == a && face[(i + 1) % 3] == b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_mesh;
    use nalgebra::Point3;

    fn octahedron() -> Mesh {
        let positions = [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let faces = vec![
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];
        Mesh::from_buffers(&positions, faces)
    }

    #[test]
    fn test_already_consistent() {
        let mut mesh = octahedron();
        let fix = fix_winding_order(&mut mesh);
        assert_eq!(fix.flipped_faces, 0);
        assert_eq!(fix.components, 1);
        assert!(!mesh.is_inside_out());
    }

    #[test]
    fn test_single_flipped_face() {
        let mut mesh = octahedron();
        mesh.faces[5].swap(0, 1);
        assert!(validate_mesh(&mesh).inconsistent_winding_count > 0);

        let fix = fix_winding_order(&mut mesh);
        assert_eq!(fix.flipped_faces, 1);
        assert_eq!(validate_mesh(&mesh).inconsistent_winding_count, 0);
        assert!(!mesh.is_inside_out());
    }

    #[test]
    fn test_seed_face_flipped_then_oriented() {
        let mut mesh = octahedron();
        // Flip the seed face so the flood fill reverses everything else.
        mesh.faces[0].swap(1, 2);

        let fix = fix_winding_order(&mut mesh);
        assert_eq!(fix.flipped_faces, 7);
        assert!(mesh.is_inside_out());

        assert!(orient_outward(&mut mesh));
        assert!(!mesh.is_inside_out());
        assert!(!orient_outward(&mut mesh));
    }

    #[test]
    fn test_empty_mesh() {
        let mut mesh = Mesh::new();
        assert_eq!(fix_winding_order(&mut mesh), WindingFix::default());
    }
}

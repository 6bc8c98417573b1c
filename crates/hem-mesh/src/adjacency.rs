//! Mesh adjacency data structures.
//!
//! Edge-to-face lookups used by validation, winding correction and hole
//! detection.

use hashbrown::HashMap;

/// Adjacency information for a triangle list.
#[derive(Debug, Clone)]
pub struct MeshAdjacency {
    /// Maps edge (v0, v1) to the faces that contain it. Always v0 < v1.
    pub edge_to_faces: HashMap<(u32, u32), Vec<u32>>,
    /// Number of faces traversing each directed edge.
    directed_edges: HashMap<(u32, u32), u32>,
}

impl MeshAdjacency {
    /// Build adjacency information from a list of faces.
    ///
    /// ```
    /// use hem_mesh::MeshAdjacency;
    ///
    /// let faces = vec![[0, 1, 2], [1, 3, 2]];
    /// let adj = MeshAdjacency::build(&faces);
    ///
    /// assert_eq!(adj.boundary_edge_count(), 4);
    /// assert_eq!(adj.edge_count(), 5);
    /// ```
    #[must_use]
    pub fn build(faces: &[[u32; 3]]) -> Self {
        let mut edge_to_faces: HashMap<(u32, u32), Vec<u32>> =
            HashMap::with_capacity(faces.len() * 3 / 2);
        let mut directed_edges: HashMap<(u32, u32), u32> = HashMap::with_capacity(faces.len() * 3);

        for (face_idx, face) in faces.iter().enumerate() {
            for i in 0..3 {
                let a = face[i];
                let b = face[(i + 1) % 3];
                edge_to_faces
                    .entry(normalize_edge(a, b))
                    .or_default()
                    .push(face_idx as u32);
                *directed_edges.entry((a, b)).or_default() += 1;
            }
        }

        Self {
            edge_to_faces,
            directed_edges,
        }
    }

    /// Faces adjacent to an edge, in either direction.
    #[must_use]
    pub fn faces_for_edge(&self, v0: u32, v1: u32) -> Option<&[u32]> {
        self.edge_to_faces
            .get(&normalize_edge(v0, v1))
            .map(Vec::as_slice)
    }

    /// Iterate over all boundary edges (edges with exactly one adjacent face).
    pub fn boundary_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(&edge, _)| edge)
    }

    /// Count the number of boundary edges.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() == 1)
            .count()
    }

    /// Iterate over non-manifold edges with their face counts.
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = ((u32, u32), usize)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() > 2)
            .map(|(&edge, faces)| (edge, faces.len()))
    }

    /// Count the number of non-manifold edges (more than two adjacent faces).
    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() > 2)
            .count()
    }

    /// Iterate over edges traversed in the same direction by more than one face.
    ///
    /// On a consistently wound surface every interior edge appears once as
    /// `a -> b` and once as `b -> a`.
    pub fn inconsistent_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.directed_edges
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(&edge, _)| edge)
    }

    /// Count the edges with inconsistent winding.
    #[must_use]
    pub fn inconsistent_edge_count(&self) -> usize {
        self.inconsistent_edges().count()
    }

    /// Check if the mesh is manifold (all edges have at most 2 adjacent faces).
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() <= 2)
    }

    /// Check if the mesh is watertight (no boundary edges).
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() >= 2)
    }

    /// Total number of unique undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_to_faces.len()
    }
}

/// Normalize edge direction so v0 < v1.
#[inline]
pub(crate) fn normalize_edge(v0: u32, v1: u32) -> (u32, u32) {
    if v0 < v1 { (v0, v1) } else { (v1, v0) }
}

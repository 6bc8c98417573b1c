//! Vertex layout and face emission for stitched boundary loops.
//!
//! The vertex buffer holds four blocks of `n` points each, in this order:
//! bottom outer, bottom inner, top outer, top inner. Faces reference those
//! blocks through [`LoopLayout`] rather than raw offsets.
//!
//! Winding is counter-clockwise seen from outside, given that the outer
//! curve lies to the left of the direction of travel.

use super::Topology;

/// Index arithmetic for the four vertex blocks of a stitched loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopLayout {
    n: u32,
}

impl LoopLayout {
    /// Layout for boundary curves of `n` points each.
    pub fn new(n: u32) -> Self {
        Self { n }
    }

    /// Points per boundary curve.
    pub fn len(&self) -> u32 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn vertex_count(&self) -> usize {
        4 * self.n as usize
    }

    pub fn bottom_outer(&self, i: u32) -> u32 {
        i
    }

    pub fn bottom_inner(&self, i: u32) -> u32 {
        self.n + i
    }

    pub fn top_outer(&self, i: u32) -> u32 {
        2 * self.n + i
    }

    pub fn top_inner(&self, i: u32) -> u32 {
        3 * self.n + i
    }

    /// Consecutive point pairs along the curve. Closed topologies include
    /// the wrap from the last point back to the first.
    pub fn segments(&self, topology: Topology) -> impl Iterator<Item = (u32, u32)> {
        let n = self.n;
        let count = if topology.wraps() {
            n
        } else {
            n.saturating_sub(1)
        };
        (0..count).map(move |a| (a, (a + 1) % n))
    }

    /// The eight triangles joining points `a` and `b`: bottom, top, outer
    /// wall, inner wall, two each.
    pub fn segment_faces(&self, a: u32, b: u32) -> [[u32; 3]; 8] {
        let bo = |i: u32| self.bottom_outer(i);
        let bi = |i: u32| self.bottom_inner(i);
        let to = |i: u32| self.top_outer(i);
        let ti = |i: u32| self.top_inner(i);
        [
            [bo(a), bo(b), bi(b)],
            [bo(a), bi(b), bi(a)],
            [to(a), ti(b), to(b)],
            [to(a), ti(a), ti(b)],
            [bo(a), to(b), bo(b)],
            [bo(a), to(a), to(b)],
            [bi(b), ti(b), ti(a)],
            [bi(b), ti(a), bi(a)],
        ]
    }

    /// Quad closing the first cross-section.
    pub fn start_cap(&self) -> [[u32; 3]; 2] {
        [
            [self.bottom_outer(0), self.bottom_inner(0), self.top_inner(0)],
            [self.top_inner(0), self.top_outer(0), self.bottom_outer(0)],
        ]
    }

    /// Quad closing the last cross-section.
    pub fn end_cap(&self) -> [[u32; 3]; 2] {
        let last = self.n.saturating_sub(1);
        [
            [self.bottom_outer(last), self.top_outer(last), self.bottom_inner(last)],
            [self.bottom_inner(last), self.top_outer(last), self.top_inner(last)],
        ]
    }

    /// Every face for `topology`, in emission order: segments first, then
    /// the start and end caps for capped strips.
    pub fn faces(&self, topology: Topology) -> Vec<[u32; 3]> {
        let mut faces = Vec::with_capacity(topology.triangle_count(self.n as usize));
        for (a, b) in self.segments(topology) {
            faces.extend_from_slice(&self.segment_faces(a, b));
        }
        if topology.has_caps() {
            faces.extend_from_slice(&self.start_cap());
            faces.extend_from_slice(&self.end_cap());
        }
        faces
    }
}

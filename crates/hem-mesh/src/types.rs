//! Indexed triangle meshes.

use nalgebra::{Point3, Vector3};

/// A mesh vertex: a position and, once computed, a unit normal.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Option<Vector3<f64>>,
}

impl Vertex {
    #[inline]
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: None,
        }
    }

    #[inline]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// Vertices plus triangles indexing into them.
///
/// Faces wind counter-clockwise seen from outside, so a closed mesh has
/// positive [`signed_volume`](Mesh::signed_volume). Garment meshes are in
/// centimeters.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Build from a position buffer and a face buffer.
    ///
    /// Indices are not checked; run
    /// [`validate_mesh_data`](crate::validate::validate_mesh_data) on
    /// untrusted input.
    pub fn from_buffers(positions: &[Point3<f64>], faces: Vec<[u32; 3]>) -> Self {
        Self {
            vertices: positions.iter().copied().map(Vertex::new).collect(),
            faces,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// True when there is nothing to render: no vertices or no faces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.vertices.iter().map(|v| v.position)
    }

    /// Axis-aligned `(min, max)` corners, `None` without vertices.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut positions = self.positions();
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        }))
    }

    fn corners(&self, [a, b, c]: [u32; 3]) -> Triangle {
        let at = |i: u32| self.vertices[i as usize].position;
        Triangle::new(at(a), at(b), at(c))
    }

    /// Faces resolved to positions. Panics on out-of-range indices.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|&face| self.corners(face))
    }

    pub fn triangle(&self, face_idx: usize) -> Option<Triangle> {
        self.faces.get(face_idx).map(|&face| self.corners(face))
    }

    pub fn translate(&mut self, offset: Vector3<f64>) {
        self.vertices
            .iter_mut()
            .for_each(|vertex| vertex.position += offset);
    }

    /// Shift the mesh so its X and Y minimums sit at zero. Z is unchanged.
    pub fn place_in_positive_xy(&mut self) {
        if let Some((min, _)) = self.bounds() {
            self.translate(Vector3::new(-min.x, -min.y, 0.0));
        }
    }

    /// Sum of the signed tetrahedra between each face and the origin.
    ///
    /// Positive for a closed, outward-wound mesh; negative when inside-out.
    /// Meaningless for open meshes.
    pub fn signed_volume(&self) -> f64 {
        self.triangles().map(|tri| tri.origin_volume()).sum()
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    #[inline]
    pub fn is_inside_out(&self) -> bool {
        self.signed_volume() < 0.0
    }

    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|tri| tri.area()).sum()
    }
}

/// Three resolved corner positions.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Cross product of the two edges from `v0`; its length is twice the area.
    #[inline]
    pub fn scaled_normal(&self) -> Vector3<f64> {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Unit normal, `None` for zero-area triangles.
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.scaled_normal();
        (n.norm_squared() > f64::EPSILON).then(|| n.normalize())
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.scaled_normal().norm() * 0.5
    }

    /// Signed volume of the tetrahedron spanned with the origin.
    #[inline]
    pub fn origin_volume(&self) -> f64 {
        self.v0.coords.dot(&self.v1.coords.cross(&self.v2.coords)) / 6.0
    }
}

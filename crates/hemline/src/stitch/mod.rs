//! Stitching boundary curves into a closed triangle mesh.
//!
//! A stitched hem is a thin wall: bottom and top bands joined by an outer
//! and an inner side. One routine handles every shape, and a [`Topology`]
//! tag picks whether the strip is capped at both ends, left open, or
//! wrapped into a ring.
//!
//! # Example
//!
//! ```
//! use hemline::offset::offset_curve;
//! use hemline::stitch::{Boundaries, Topology, stitch};
//! use nalgebra::Point3;
//!
//! let line = [
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(2.0, 0.0, 0.0),
//!     Point3::new(3.0, 0.0, 0.0),
//! ];
//! let sides = offset_curve(&line, 0.5).unwrap();
//! let boundaries = Boundaries::extruded(&sides, 2.0).unwrap();
//! let mesh = stitch(&boundaries, Topology::OpenStrip).unwrap();
//!
//! assert_eq!(mesh.vertex_count(), 16);
//! assert_eq!(mesh.face_count(), 28);
//! ```

mod layout;

pub use layout::LoopLayout;

use hem_mesh::{Mesh, log_mesh_stats};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HemlineError, HemlineResult};
use crate::offset::OffsetCurves;

/// How the ends of the stitched strip are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    /// Open curve, both ends capped. A closed solid.
    OpenStrip,
    /// Open curve without end caps, for pieces joined to others later.
    OpenCapless,
    /// Closed curve wrapped from the last point back to the first.
    ClosedLoop,
}

impl Topology {
    /// Whether the last point connects back to the first.
    pub fn wraps(&self) -> bool {
        matches!(self, Topology::ClosedLoop)
    }

    /// Whether both ends get a cap.
    pub fn has_caps(&self) -> bool {
        matches!(self, Topology::OpenStrip)
    }

    /// Triangles emitted for boundary curves of `n` points.
    pub fn triangle_count(&self, n: usize) -> usize {
        match self {
            Topology::OpenStrip => 8 * n.saturating_sub(1) + 4,
            Topology::OpenCapless => 8 * n.saturating_sub(1),
            Topology::ClosedLoop => 8 * n,
        }
    }

    /// Quads emitted for `n` points; every quad is two triangles.
    pub fn quad_count(&self, n: usize) -> usize {
        self.triangle_count(n) / 2
    }

    /// Euler characteristic `V - E + F` of the stitched surface.
    ///
    /// A capped strip is a closed solid (2). A ring is a closed torus-like
    /// solid and a capless strip is an open sleeve; both give 0.
    pub fn euler_characteristic(&self) -> i64 {
        match self {
            Topology::OpenStrip => 2,
            Topology::OpenCapless | Topology::ClosedLoop => 0,
        }
    }

    /// Minimum curve length the topology can be stitched from.
    pub fn min_points(&self) -> usize {
        match self {
            Topology::OpenStrip | Topology::OpenCapless => 2,
            Topology::ClosedLoop => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::OpenStrip => "open-strip",
            Topology::OpenCapless => "open-capless",
            Topology::ClosedLoop => "closed-loop",
        }
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four boundary curves of a stitched wall.
///
/// All four have the same length, and index `i` on each is the same point
/// of the source curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundaries {
    pub bottom_outer: Vec<Point3<f64>>,
    pub bottom_inner: Vec<Point3<f64>>,
    pub top_outer: Vec<Point3<f64>>,
    pub top_inner: Vec<Point3<f64>>,
    pub height: f64,
}

impl Boundaries {
    /// Straight wall: the top curves are the bottom curves lifted to
    /// `z = height`.
    pub fn extruded(sides: &OffsetCurves, height: f64) -> HemlineResult<Self> {
        Self::tapered(sides, sides, height)
    }

    /// Tapered wall with independent bottom and top curves.
    pub fn tapered(bottom: &OffsetCurves, top: &OffsetCurves, height: f64) -> HemlineResult<Self> {
        check_height(height)?;
        let boundaries = Self {
            bottom_outer: at_height(&bottom.outer, 0.0),
            bottom_inner: at_height(&bottom.inner, 0.0),
            top_outer: at_height(&top.outer, height),
            top_inner: at_height(&top.inner, height),
            height,
        };
        boundaries.check()?;
        Ok(boundaries)
    }

    /// Points per curve.
    pub fn len(&self) -> usize {
        self.bottom_outer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bottom_outer.is_empty()
    }

    /// Check that all four curves are non-empty and equally long.
    pub fn check(&self) -> HemlineResult<()> {
        let n = self.bottom_outer.len();
        if n == 0 {
            return Err(HemlineError::shape_mismatch("boundary curves are empty"));
        }
        let lengths = [
            ("bottom_inner", self.bottom_inner.len()),
            ("top_outer", self.top_outer.len()),
            ("top_inner", self.top_inner.len()),
        ];
        for (name, len) in lengths {
            if len != n {
                return Err(HemlineError::shape_mismatch(format!(
                    "{} has {} points, bottom_outer has {}",
                    name, len, n
                )));
            }
        }
        Ok(())
    }
}

fn check_height(height: f64) -> HemlineResult<()> {
    if !height.is_finite() || height <= 0.0 {
        return Err(HemlineError::invalid_parameter(
            "height",
            format!("must be finite and > 0, got {}", height),
        ));
    }
    Ok(())
}

fn at_height(curve: &[Point3<f64>], z: f64) -> Vec<Point3<f64>> {
    curve.iter().map(|p| Point3::new(p.x, p.y, z)).collect()
}

/// Stitch the four boundary curves into one mesh.
///
/// The vertex buffer is the four curves concatenated (see [`LoopLayout`]);
/// the face buffer follows the fixed per-segment order. Curves of unequal
/// length, or too short for `topology`, produce no mesh.
pub fn stitch(boundaries: &Boundaries, topology: Topology) -> HemlineResult<Mesh> {
    boundaries.check()?;
    check_height(boundaries.height)?;

    let n = boundaries.len();
    if n < topology.min_points() {
        return Err(HemlineError::shape_mismatch(format!(
            "{} needs at least {} points per curve, got {}",
            topology,
            topology.min_points(),
            n
        )));
    }
    let count = u32::try_from(n).map_err(|_| {
        HemlineError::shape_mismatch(format!("{} points exceed the index range", n))
    })?;
    if count > u32::MAX / 4 {
        return Err(HemlineError::shape_mismatch(format!(
            "{} points exceed the index range",
            n
        )));
    }

    let layout = LoopLayout::new(count);
    let mut positions = Vec::with_capacity(layout.vertex_count());
    positions.extend_from_slice(&boundaries.bottom_outer);
    positions.extend_from_slice(&boundaries.bottom_inner);
    positions.extend_from_slice(&boundaries.top_outer);
    positions.extend_from_slice(&boundaries.top_inner);

    let faces = layout.faces(topology);
    debug!(topology = %topology, points = n, "Stitched boundaries");

    let mesh = Mesh::from_buffers(&positions, faces);
    log_mesh_stats(&mesh, "stitched");
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offset::{offset_closed_curve, offset_curve};
    use hem_mesh::validate_mesh;

    fn line(n: usize) -> Vec<Point3<f64>> {
        (0..n).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect()
    }

    fn ring(n: usize) -> Vec<Point3<f64>> {
        (0..n)
            .map(|i| {
                let a = std::f64::consts::TAU * i as f64 / n as f64;
                Point3::new(10.0 * a.cos(), 10.0 * a.sin(), 0.0)
            })
            .collect()
    }

    #[test]
    fn test_open_strip_counts() {
        let sides = offset_curve(&line(4), 0.5).unwrap();
        let boundaries = Boundaries::extruded(&sides, 1.0).unwrap();
        let mesh = stitch(&boundaries, Topology::OpenStrip).unwrap();

        assert_eq!(Topology::OpenStrip.quad_count(4), 4 * 3 + 2);
        assert_eq!(mesh.face_count(), 28);
        assert_eq!(mesh.vertex_count(), 16);
    }

    #[test]
    fn test_open_strip_is_closed_solid() {
        let sides = offset_curve(&line(10), 0.5).unwrap();
        let mesh = stitch(&Boundaries::extruded(&sides, 2.0).unwrap(), Topology::OpenStrip).unwrap();
        let report = validate_mesh(&mesh);

        assert!(report.is_printable(), "{}", report);
        assert_eq!(report.euler_characteristic(), 2);
        // 9 x 1 x 2 box
        assert!((report.volume() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_capless_strip_is_open() {
        let sides = offset_curve(&line(6), 0.5).unwrap();
        let mesh = stitch(&Boundaries::extruded(&sides, 1.0).unwrap(), Topology::OpenCapless).unwrap();
        let report = validate_mesh(&mesh);

        assert_eq!(mesh.face_count(), Topology::OpenCapless.triangle_count(6));
        assert_eq!(report.boundary_edge_count, 8);
        assert_eq!(report.inconsistent_winding_count, 0);
        assert_eq!(report.euler_characteristic(), 0);
    }

    #[test]
    fn test_closed_loop_is_watertight_ring() {
        let sides = offset_closed_curve(&ring(48), 0.5).unwrap();
        let mesh = stitch(&Boundaries::extruded(&sides, 3.0).unwrap(), Topology::ClosedLoop).unwrap();
        let report = validate_mesh(&mesh);

        assert_eq!(mesh.face_count(), 8 * 48);
        assert!(report.is_watertight);
        assert!(report.is_manifold);
        assert_eq!(report.inconsistent_winding_count, 0);
        assert!(!report.is_inside_out);
        assert_eq!(report.euler_characteristic(), Topology::ClosedLoop.euler_characteristic());
    }

    #[test]
    fn test_tapered_boundaries() {
        let bottom = offset_closed_curve(&ring(32), 0.5).unwrap();
        let top_ring: Vec<_> = ring(32).into_iter().map(|p| Point3::from(p.coords * 0.5)).collect();
        let top = offset_closed_curve(&top_ring, 0.2).unwrap();

        let boundaries = Boundaries::tapered(&bottom, &top, 10.0).unwrap();
        assert!(boundaries.top_outer.iter().all(|p| p.z == 10.0));

        let mesh = stitch(&boundaries, Topology::ClosedLoop).unwrap();
        let report = validate_mesh(&mesh);
        assert!(report.is_watertight);
        assert!(report.signed_volume > 0.0);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let bottom = offset_curve(&line(5), 0.5).unwrap();
        let top = offset_curve(&line(4), 0.5).unwrap();
        let err = Boundaries::tapered(&bottom, &top, 1.0).unwrap_err();
        assert!(matches!(err, HemlineError::ShapeMismatch { .. }));

        let mut boundaries = Boundaries::extruded(&bottom, 1.0).unwrap();
        boundaries.top_inner.pop();
        assert!(stitch(&boundaries, Topology::OpenStrip).is_err());
    }

    #[test]
    fn test_empty_and_short_curves_rejected() {
        let empty = OffsetCurves {
            outer: Vec::new(),
            inner: Vec::new(),
        };
        assert!(Boundaries::extruded(&empty, 1.0).is_err());

        let sides = offset_curve(&line(2), 0.5).unwrap();
        let boundaries = Boundaries::extruded(&sides, 1.0).unwrap();
        assert!(stitch(&boundaries, Topology::OpenStrip).is_ok());
        assert!(stitch(&boundaries, Topology::ClosedLoop).is_err());
    }

    #[test]
    fn test_bad_height_rejected() {
        let sides = offset_curve(&line(3), 0.5).unwrap();
        assert!(Boundaries::extruded(&sides, 0.0).is_err());
        assert!(Boundaries::extruded(&sides, f64::INFINITY).is_err());
    }
}

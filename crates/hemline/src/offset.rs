//! Thickening a sampled curve into a pair of boundary curves.
//!
//! Every point moves by `thickness` along a direction perpendicular to the
//! curve, once each way. Endpoints of an open curve use their single
//! neighbouring segment rotated by 90°. Every other point uses the bisector
//! of the angle between its two neighbours, flipped whenever the turn angle
//! is negative so the offset stays on the same side through concave and
//! convex turns.
//!
//! The outer curve always ends up on the left of the direction of travel.
//! Output curves have the same length as the input and correspond index for
//! index, which is what makes stitching them valid.
//!
//! The flip rule follows the curve well for smooth input. Sharp cusps, where
//! a point's neighbours lie in the same direction, are not handled.

use std::f64::consts::FRAC_PI_2;

use nalgebra::{Point3, Vector2};
use tracing::debug;

use crate::error::{HemlineError, HemlineResult};

/// Points closer than this in XY have no usable direction between them.
pub const DEGENERATE_DISTANCE: f64 = 1e-12;

/// One side of a thickened curve.
pub type BoundaryCurve = Vec<Point3<f64>>;

/// The two offset sides of one curve.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetCurves {
    /// Offset to the left of the direction of travel.
    pub outer: BoundaryCurve,
    /// Offset to the right of the direction of travel.
    pub inner: BoundaryCurve,
}

impl OffsetCurves {
    pub fn len(&self) -> usize {
        self.outer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }
}

/// Offset an open curve by `thickness` on both sides.
pub fn offset_curve(curve: &[Point3<f64>], thickness: f64) -> HemlineResult<OffsetCurves> {
    check_thickness(thickness)?;
    if curve.len() < 2 {
        return Err(HemlineError::shape_mismatch(format!(
            "open offset needs at least 2 points, got {}",
            curve.len()
        )));
    }
    check_segments(curve, false)?;

    let last = curve.len() - 1;
    let directions = curve.iter().enumerate().map(|(i, &point)| {
        if i == 0 {
            endpoint_direction(point, curve[1], FRAC_PI_2)
        } else if i == last {
            endpoint_direction(point, curve[last - 1], -FRAC_PI_2)
        } else {
            interior_direction(curve[i - 1], point, curve[i + 1])
        }
    });

    let result = apply(curve, directions, thickness);
    debug!(points = curve.len(), thickness, "Offset open curve");
    Ok(result)
}

/// Offset a closed curve, treating the last point as adjacent to the first.
///
/// The curve must not repeat its first point at the end; see
/// [`close_loop`](crate::sampler::close_loop).
pub fn offset_closed_curve(curve: &[Point3<f64>], thickness: f64) -> HemlineResult<OffsetCurves> {
    check_thickness(thickness)?;
    let n = curve.len();
    if n < 3 {
        return Err(HemlineError::shape_mismatch(format!(
            "closed offset needs at least 3 points, got {}",
            n
        )));
    }
    check_segments(curve, true)?;

    let directions = (0..n).map(|i| {
        let prev = curve[(i + n - 1) % n];
        let next = curve[(i + 1) % n];
        interior_direction(prev, curve[i], next)
    });

    let result = apply(curve, directions, thickness);
    debug!(points = n, thickness, "Offset closed curve");
    Ok(result)
}

fn check_thickness(thickness: f64) -> HemlineResult<()> {
    if !thickness.is_finite() || thickness <= 0.0 {
        return Err(HemlineError::invalid_parameter(
            "thickness",
            format!("must be finite and > 0, got {}", thickness),
        ));
    }
    Ok(())
}

/// Reject consecutive points that coincide in XY.
fn check_segments(curve: &[Point3<f64>], closed: bool) -> HemlineResult<()> {
    for (i, pair) in curve.windows(2).enumerate() {
        if planar(pair[1] - pair[0]).norm() < DEGENERATE_DISTANCE {
            return Err(HemlineError::degenerate_geometry(i + 1));
        }
    }
    if closed
        && let (Some(first), Some(last)) = (curve.first(), curve.last())
        && planar(first - last).norm() < DEGENERATE_DISTANCE
    {
        return Err(HemlineError::degenerate_geometry(0));
    }
    Ok(())
}

fn planar(v: nalgebra::Vector3<f64>) -> Vector2<f64> {
    Vector2::new(v.x, v.y)
}

/// Four-quadrant direction angle of `to - from`.
fn heading(from: Point3<f64>, to: Point3<f64>) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Neighbour direction rotated by `quarter_turn`.
fn endpoint_direction(point: Point3<f64>, neighbour: Point3<f64>, quarter_turn: f64) -> Vector2<f64> {
    let angle = heading(point, neighbour) + quarter_turn;
    Vector2::new(angle.cos(), angle.sin())
}

/// Bisector of the angle between the two neighbours, seen from `point`.
fn interior_direction(prev: Point3<f64>, point: Point3<f64>, next: Point3<f64>) -> Vector2<f64> {
    let prev_angle = heading(point, prev);
    let next_angle = heading(point, next);
    let open_angle = prev_angle - next_angle;
    let angle = next_angle + open_angle / 2.0;

    let direction = Vector2::new(angle.cos(), angle.sin());
    if open_angle < 0.0 { -direction } else { direction }
}

fn apply(
    curve: &[Point3<f64>],
    directions: impl Iterator<Item = Vector2<f64>>,
    thickness: f64,
) -> OffsetCurves {
    let mut outer = Vec::with_capacity(curve.len());
    let mut inner = Vec::with_capacity(curve.len());

    for (point, direction) in curve.iter().zip(directions) {
        let dx = thickness * direction.x;
        let dy = thickness * direction.y;
        outer.push(Point3::new(point.x + dx, point.y + dy, point.z));
        inner.push(Point3::new(point.x - dx, point.y - dy, point.z));
    }

    OffsetCurves { outer, inner }
}

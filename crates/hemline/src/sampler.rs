//! B-spline evaluation and fixed-step curve sampling.
//!
//! Fold control points are smoothed by a clamped B-spline, so the curve
//! starts at the first control point and ends at the last one. The
//! [`CurveSampler`] trait is the seam between the garment pipeline and the
//! evaluator; [`BSplineSampler`] is the in-tree implementation.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{HemlineError, HemlineResult};

/// Cubic splines unless configured otherwise.
pub const DEFAULT_DEGREE: usize = 3;

/// Parameter step used by the garment presets.
pub const DEFAULT_SAMPLING_STEP: f64 = 0.0005;

/// Largest number of samples a single curve may request.
pub const MAX_SAMPLES: usize = 1_000_000;

/// Distance below which a trailing sample counts as a repeat of the first.
const LOOP_CLOSE_TOLERANCE: f64 = 1e-9;

/// Below this the basis recurrence treats a knot interval as empty.
const KNOT_EPSILON: f64 = 1e-15;

/// Clamped uniform knot vector for `n` control points.
///
/// `degree + 1` zeros, evenly spaced interior knots, `degree + 1` ones. The
/// result is only well formed for `n >= degree + 1`; [`BSpline::new`]
/// rejects anything else.
pub fn clamped_uniform_knots(n: usize, degree: usize) -> Vec<f64> {
    let interior = n.saturating_sub(degree + 1);
    let mut knots = Vec::with_capacity(interior + 2 * (degree + 1));
    knots.extend(std::iter::repeat_n(0.0, degree + 1));
    knots.extend((1..=interior).map(|i| i as f64 / (interior + 1) as f64));
    knots.extend(std::iter::repeat_n(1.0, degree + 1));
    knots
}

/// Number of samples for a step: `floor(1 / step) + 1`, both ends included.
pub fn sample_count(step: f64) -> HemlineResult<usize> {
    if !step.is_finite() || step <= 0.0 || step > 1.0 {
        return Err(HemlineError::invalid_sampling(format!(
            "step must be in (0, 1], got {}",
            step
        )));
    }
    // Nudge so that 1 / 0.0005 lands on 2000, not 1999.999...
    let intervals = (1.0 / step + 1e-9).floor();
    if intervals >= MAX_SAMPLES as f64 {
        return Err(HemlineError::invalid_sampling(format!(
            "step {} needs more than {} samples",
            step, MAX_SAMPLES
        )));
    }
    Ok(intervals as usize + 1)
}

/// A B-spline curve with an explicit knot vector.
#[derive(Debug, Clone, PartialEq)]
pub struct BSpline {
    control_points: Vec<Point3<f64>>,
    knots: Vec<f64>,
    degree: usize,
}

impl BSpline {
    /// Create a spline, checking degree, point count and knot vector shape.
    pub fn new(
        control_points: Vec<Point3<f64>>,
        degree: usize,
        knots: Vec<f64>,
    ) -> HemlineResult<Self> {
        let n = control_points.len();

        if degree == 0 {
            return Err(HemlineError::invalid_sampling("degree must be at least 1"));
        }
        if n < degree + 1 {
            return Err(HemlineError::invalid_sampling(format!(
                "degree {} needs at least {} control points, got {}",
                degree,
                degree + 1,
                n
            )));
        }
        if knots.len() != n + degree + 1 {
            return Err(HemlineError::invalid_knot_vector(format!(
                "expected {} knots for {} points of degree {}, got {}",
                n + degree + 1,
                n,
                degree,
                knots.len()
            )));
        }
        if knots.iter().any(|k| !k.is_finite()) {
            return Err(HemlineError::invalid_knot_vector("knots must be finite"));
        }
        if let Some(i) = knots.windows(2).position(|w| w[1] < w[0]) {
            return Err(HemlineError::invalid_knot_vector(format!(
                "knot {} ({}) is below knot {} ({})",
                i + 1,
                knots[i + 1],
                i,
                knots[i]
            )));
        }
        if knots[degree] >= knots[n] {
            return Err(HemlineError::invalid_knot_vector("parameter domain is empty"));
        }

        Ok(Self {
            control_points,
            knots,
            degree,
        })
    }

    /// Spline with a clamped uniform knot vector.
    pub fn clamped(control_points: Vec<Point3<f64>>, degree: usize) -> HemlineResult<Self> {
        let knots = clamped_uniform_knots(control_points.len(), degree);
        Self::new(control_points, degree, knots)
    }

    pub fn control_points(&self) -> &[Point3<f64>] {
        &self.control_points
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Valid parameter range `[knots[p], knots[n]]`.
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[self.degree], self.knots[self.control_points.len()])
    }

    /// Index `i` with `knots[i] <= u < knots[i + 1]`, clamped to the last
    /// non-empty span at the end of the domain.
    fn find_span(&self, u: f64) -> usize {
        let n = self.control_points.len();
        let p = self.degree;

        if u >= self.knots[n] {
            // Step back over repeated end knots.
            let mut span = n - 1;
            while span > p && self.knots[span] >= self.knots[n] {
                span -= 1;
            }
            return span;
        }
        if u <= self.knots[p] {
            let mut span = p;
            while span + 1 < n && self.knots[span + 1] <= u {
                span += 1;
            }
            return span;
        }

        let (mut low, mut high) = (p, n);
        while low < high {
            let mid = (low + high) / 2;
            if self.knots[mid] > u {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        low - 1
    }

    /// The `degree + 1` basis functions that are non-zero on `span`.
    fn basis(&self, span: usize, u: f64) -> Vec<f64> {
        let p = self.degree;
        let mut values = vec![0.0; p + 1];
        let mut left = vec![0.0; p + 1];
        let mut right = vec![0.0; p + 1];
        values[0] = 1.0;

        for j in 1..=p {
            left[j] = u - self.knots[span + 1 - j];
            right[j] = self.knots[span + j] - u;

            let mut carry = 0.0;
            for r in 0..j {
                let denom = right[r + 1] + left[j - r];
                if denom.abs() > KNOT_EPSILON {
                    let term = values[r] / denom;
                    values[r] = carry + right[r + 1] * term;
                    carry = left[j - r] * term;
                } else {
                    values[r] = carry;
                    carry = 0.0;
                }
            }
            values[j] = carry;
        }
        values
    }

    /// Point at normalized parameter `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        let (lo, hi) = self.domain();
        let u = lo + t.clamp(0.0, 1.0) * (hi - lo);
        let span = self.find_span(u);

        let mut sum = Vector3::zeros();
        for (i, weight) in self.basis(span, u).into_iter().enumerate() {
            sum += self.control_points[span - self.degree + i].coords * weight;
        }
        Point3::from(sum)
    }

    /// Evaluate at `floor(1 / step) + 1` evenly spaced parameters.
    pub fn sample(&self, step: f64) -> HemlineResult<SampledCurve> {
        let count = sample_count(step)?;
        let last = (count - 1).max(1) as f64;
        let points: Vec<Point3<f64>> = (0..count)
            .into_par_iter()
            .map(|i| self.point_at(i as f64 / last))
            .collect();
        Ok(SampledCurve::new(points))
    }
}

/// Ordered points along a sampled curve.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampledCurve {
    pub points: Vec<Point3<f64>>,
}

impl SampledCurve {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Drop a trailing sample that repeats the first one.
    pub fn closed(self) -> Self {
        Self::new(close_loop(self.points))
    }
}

impl From<Vec<Point3<f64>>> for SampledCurve {
    fn from(points: Vec<Point3<f64>>) -> Self {
        Self::new(points)
    }
}

/// Remove the last point of a closed curve when it coincides with the first.
///
/// Closed offsetting and stitching wrap around on their own, so a duplicated
/// seam point would produce a zero-length segment.
pub fn close_loop(mut points: Vec<Point3<f64>>) -> Vec<Point3<f64>> {
    if points.len() > 1
        && let (Some(first), Some(last)) = (points.first(), points.last())
        && (last - first).norm() <= LOOP_CLOSE_TOLERANCE
    {
        points.pop();
    }
    points
}

/// Turns control points into a sampled curve.
pub trait CurveSampler: Send + Sync {
    /// Sample the curve defined by `control_points`, `degree` and `knots`.
    fn sample(
        &self,
        control_points: &[Point3<f64>],
        degree: usize,
        knots: &[f64],
        step: f64,
    ) -> HemlineResult<SampledCurve>;

    /// Sample with a clamped uniform knot vector.
    fn sample_clamped(
        &self,
        control_points: &[Point3<f64>],
        degree: usize,
        step: f64,
    ) -> HemlineResult<SampledCurve> {
        let knots = clamped_uniform_knots(control_points.len(), degree);
        self.sample(control_points, degree, &knots, step)
    }
}

/// [`CurveSampler`] backed by [`BSpline`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BSplineSampler;

impl CurveSampler for BSplineSampler {
    fn sample(
        &self,
        control_points: &[Point3<f64>],
        degree: usize,
        knots: &[f64],
        step: f64,
    ) -> HemlineResult<SampledCurve> {
        let spline = BSpline::new(control_points.to_vec(), degree, knots.to_vec())?;
        let curve = spline.sample(step)?;
        debug!(
            control_points = control_points.len(),
            degree,
            step,
            samples = curve.len(),
            "Sampled B-spline"
        );
        Ok(curve)
    }
}

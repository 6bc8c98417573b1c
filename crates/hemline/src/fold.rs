//! Randomized control points for fold curves.
//!
//! Each fold adds three control points to a running sequence: a left ruffle
//! peak, a right ruffle peak and a base point back on the baseline. Peaks of
//! odd folds sit below the baseline, so the curve zig-zags.
//!
//! All randomness comes from one [`StdRng`] seeded per call, and the seed is
//! returned with the pattern. The same seed and parameters always produce
//! the same control points.

use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::error::HemlineResult;
use crate::params::{FoldParameters, FoldVariant, MAX_POLAR_ANGLE};

/// Upper bound (exclusive) for seeds drawn when none is supplied.
pub const SEED_RANGE: u64 = 1_000_000_000;

/// Jitter applied to evenly spaced full-circle bases, as a fraction of the
/// spacing.
const UNIFORM_JITTER: f64 = 0.1;

/// Control points of one generated fold curve.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldPattern {
    /// `1 + 3 * num_folds` points in the XY plane.
    pub control_points: Vec<Point3<f64>>,
    /// Seed that produced these points.
    pub seed: u64,
    pub variant: FoldVariant,
}

impl FoldPattern {
    pub fn len(&self) -> usize {
        self.control_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.control_points.is_empty()
    }
}

/// Generate the control points for `variant`.
///
/// Parameters are validated before the generator is seeded.
pub fn generate(params: &FoldParameters, variant: FoldVariant) -> HemlineResult<FoldPattern> {
    params.validate(variant)?;

    let seed = resolve_seed(params.random_seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let control_points = match variant {
        FoldVariant::Cartesian => cartesian_points(params, &mut rng),
        FoldVariant::PolarArc => polar_arc_points(params, &mut rng),
        FoldVariant::FullCircle => full_circle_points(params, &mut rng),
    };

    info!(
        variant = %variant,
        seed,
        folds = params.num_folds,
        points = control_points.len(),
        "Generated fold pattern"
    );

    Ok(FoldPattern {
        control_points,
        seed,
        variant,
    })
}

/// Use the given seed, or draw a fresh one from the thread RNG.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    match seed {
        Some(seed) => seed,
        None => {
            let seed = rand::thread_rng().gen_range(0..SEED_RANGE);
            debug!(seed, "No seed supplied, drew one");
            seed
        }
    }
}

/// One uniform draw in `[min, max]`. Always consumes exactly one value.
fn draw(rng: &mut StdRng, min: f64, max: f64) -> f64 {
    min + (max - min) * rng.r#gen::<f64>()
}

/// Per-fold random draws, in draw order.
#[derive(Debug, Clone, Copy)]
struct FoldDraw {
    base_width: f64,
    left_ruffle: f64,
    right_ruffle: f64,
    right_base: f64,
    height: f64,
}

impl FoldDraw {
    fn sample(params: &FoldParameters, rng: &mut StdRng, index: u32) -> Self {
        let base_width = draw(rng, params.min_base_width, params.max_base_width);
        let left_ruffle = draw(rng, params.min_ruffle_width, params.max_ruffle_width);

        let (right_ruffle, right_base) = if params.symmetric_fold {
            (left_ruffle, base_width)
        } else {
            let ruffle = draw(rng, params.min_ruffle_width, params.max_ruffle_width);
            let base = draw(rng, params.min_base_width, params.max_base_width);
            (ruffle, base)
        };

        let mut height = draw(rng, params.min_height, params.max_height);
        if index % 2 == 1 {
            height = -height;
        }

        Self {
            base_width,
            left_ruffle,
            right_ruffle,
            right_base,
            height,
        }
    }
}

fn cartesian_points(params: &FoldParameters, rng: &mut StdRng) -> Vec<Point3<f64>> {
    let mut points = Vec::with_capacity(1 + 3 * params.num_folds as usize);
    points.push(Point3::origin());

    let mut x = 0.0;
    for index in 0..params.num_folds {
        let fold = FoldDraw::sample(params, rng, index);
        let base = x + fold.base_width;

        points.push(Point3::new(base - fold.left_ruffle, fold.height, 0.0));
        points.push(Point3::new(base + fold.right_ruffle, fold.height, 0.0));
        x = base + fold.right_base;
        points.push(Point3::new(x, 0.0, 0.0));
    }
    points
}

/// Point at `radius` and `degrees` in the XY plane.
fn polar(radius: f64, degrees: f64) -> Point3<f64> {
    let angle = degrees.to_radians();
    Point3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
}

fn polar_arc_points(params: &FoldParameters, rng: &mut StdRng) -> Vec<Point3<f64>> {
    let radius = params.radius;
    let mut points = Vec::with_capacity(1 + 3 * params.num_folds as usize);
    points.push(polar(radius, 0.0));

    let mut angle = 0.0;
    for index in 0..params.num_folds {
        let fold = FoldDraw::sample(params, rng, index);
        let base = angle + fold.base_width;
        let peak = radius + fold.height;

        points.push(polar(peak, base - fold.left_ruffle));
        points.push(polar(peak, base + fold.right_ruffle));
        angle = base + fold.right_base;
        points.push(polar(radius, angle));
    }
    points
}

/// Base angles for a full circle, ascending in `[0, 360)`.
fn full_circle_bases(params: &FoldParameters, rng: &mut StdRng) -> Vec<f64> {
    let n = params.num_folds as usize;
    if params.uniform_circle {
        let spacing = MAX_POLAR_ANGLE / n as f64;
        let jitter = spacing * UNIFORM_JITTER;
        (0..n)
            .map(|i| spacing * (i as f64 + 0.5) + draw(rng, -jitter, jitter))
            .collect()
    } else {
        let mut bases: Vec<f64> = (0..n)
            .map(|_| MAX_POLAR_ANGLE * rng.r#gen::<f64>())
            .collect();
        bases.sort_by(f64::total_cmp);
        bases
    }
}

fn full_circle_points(params: &FoldParameters, rng: &mut StdRng) -> Vec<Point3<f64>> {
    let radius = params.radius;
    let bases = full_circle_bases(params, rng);

    let mut points = Vec::with_capacity(1 + 3 * bases.len());
    let start = polar(radius, 0.0);
    points.push(start);

    for (index, base) in bases.iter().enumerate() {
        // base_width is drawn but unused here; dropping the draw changes every seeded skirt.
        let fold = FoldDraw::sample(params, rng, index as u32);
        let peak = radius + fold.height;

        points.push(polar(peak, base - fold.left_ruffle));
        points.push(polar(peak, base + fold.right_ruffle));
        points.push(polar(radius, base + fold.right_base));
    }

    close_seam(&mut points);
    points
}

/// Pin the last point to the start and mirror the first peak through it.
///
/// With a clamped spline the end tangent then matches the start tangent, so
/// the loop closes without a kink.
fn close_seam(points: &mut [Point3<f64>]) {
    let n = points.len();
    if n < 4 {
        return;
    }
    let start = points[0];
    let mirrored: Vector3<f64> = start.coords * 2.0 - points[1].coords;
    points[n - 1] = start;
    points[n - 2] = Point3::from(mirrored);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fixed(min_max: (f64, f64, f64)) -> FoldParameters {
        let (ruffle, base, height) = min_max;
        FoldParameters {
            min_ruffle_width: ruffle,
            max_ruffle_width: ruffle,
            min_base_width: base,
            max_base_width: base,
            min_height: height,
            max_height: height,
            num_folds: 1,
            symmetric_fold: true,
            random_seed: Some(42),
            ..FoldParameters::default()
        }
    }

    #[test]
    fn test_single_symmetric_fold_is_exact() {
        let pattern = generate(&fixed((2.0, 3.0, 1.0)), FoldVariant::Cartesian).unwrap();
        assert_eq!(pattern.seed, 42);
        assert_eq!(
            pattern.control_points,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(5.0, 1.0, 0.0),
                Point3::new(6.0, 0.0, 0.0),
            ]
        );
    }

    fn spread(symmetric: bool) -> FoldParameters {
        FoldParameters {
            min_ruffle_width: 0.5,
            max_ruffle_width: 2.0,
            min_base_width: 3.0,
            max_base_width: 6.0,
            min_height: 1.0,
            max_height: 4.0,
            num_folds: 3,
            symmetric_fold: symmetric,
            random_seed: Some(2024),
            ..FoldParameters::default()
        }
    }

    #[test]
    fn test_symmetric_fold_mirrors_about_base() {
        let params = spread(true);
        let points = generate(&params, FoldVariant::Cartesian).unwrap().control_points;

        for fold in 0..3 {
            let start = points[3 * fold].x;
            let (left, right) = (points[1 + 3 * fold], points[2 + 3 * fold]);
            let end = points[3 + 3 * fold];
            let base_width = (end.x - start) / 2.0;
            let base = start + base_width;

            assert!((3.0..=6.0).contains(&base_width));
            assert_relative_eq!(right.x - base, base - left.x, epsilon = 1e-12);
            assert_relative_eq!(end.x - base, base_width, epsilon = 1e-12);
            assert!((0.5..=2.0).contains(&(base - left.x)));
        }
    }

    #[test]
    fn test_symmetric_fold_draws_three_values() {
        let params = spread(true);
        let mut rng = StdRng::seed_from_u64(2024);
        let points = cartesian_points(&params, &mut rng);

        let mut replay = StdRng::seed_from_u64(2024);
        let mut expected = vec![Point3::origin()];
        let mut x = 0.0;
        for fold in 0..3 {
            let width = draw(&mut replay, 3.0, 6.0);
            let base = x + width;
            let ruffle = draw(&mut replay, 0.5, 2.0);
            let mut height = draw(&mut replay, 1.0, 4.0);
            if fold % 2 == 1 {
                height = -height;
            }
            x = base + width;
            expected.push(Point3::new(base - ruffle, height, 0.0));
            expected.push(Point3::new(base + ruffle, height, 0.0));
            expected.push(Point3::new(x, 0.0, 0.0));
        }
        assert_eq!(points, expected);
        assert_eq!(rng.r#gen::<u64>(), replay.r#gen::<u64>());
    }

    #[test]
    fn test_asymmetric_fold_draw_order() {
        let params = spread(false);
        let points = generate(&params, FoldVariant::Cartesian).unwrap().control_points;

        let mut replay = StdRng::seed_from_u64(2024);
        let mut expected = vec![Point3::origin()];
        let mut x = 0.0;
        for fold in 0..3 {
            let base = x + draw(&mut replay, 3.0, 6.0);
            let left = draw(&mut replay, 0.5, 2.0);
            let right = draw(&mut replay, 0.5, 2.0);
            let right_base = draw(&mut replay, 3.0, 6.0);
            let mut height = draw(&mut replay, 1.0, 4.0);
            if fold % 2 == 1 {
                height = -height;
            }
            x = base + right_base;
            expected.push(Point3::new(base - left, height, 0.0));
            expected.push(Point3::new(base + right, height, 0.0));
            expected.push(Point3::new(x, 0.0, 0.0));
        }
        assert_eq!(points, expected);

        let symmetric = generate(&spread(true), FoldVariant::Cartesian).unwrap().control_points;
        assert_eq!(points[1].x, symmetric[1].x);
        assert_ne!(points[2], symmetric[2]);
        assert_ne!(points[3], symmetric[3]);
    }

    #[test]
    fn test_odd_folds_dip_below_baseline() {
        let params = fixed((2.0, 3.0, 1.0)).with_num_folds(4);
        let pattern = generate(&params, FoldVariant::Cartesian).unwrap();
        for fold in 0..4 {
            let peak = pattern.control_points[1 + 3 * fold];
            let expected = if fold % 2 == 0 { 1.0 } else { -1.0 };
            assert_eq!(peak.y, expected);
            assert_eq!(pattern.control_points[3 + 3 * fold].y, 0.0);
        }
    }

    #[test]
    fn test_sequence_length_for_all_variants() {
        for variant in [
            FoldVariant::Cartesian,
            FoldVariant::PolarArc,
            FoldVariant::FullCircle,
        ] {
            let params = FoldParameters::cape().with_num_folds(7).with_seed(3);
            let pattern = generate(&params, variant).unwrap();
            assert_eq!(pattern.len(), 1 + 3 * 7, "{}", variant);
        }
    }

    #[test]
    fn test_same_seed_same_points() {
        let params = FoldParameters::curtain().with_seed(1234);
        let a = generate(&params, FoldVariant::Cartesian).unwrap();
        let b = generate(&params, FoldVariant::Cartesian).unwrap();
        assert_eq!(a, b);

        let other = generate(&params.clone().with_seed(1235), FoldVariant::Cartesian).unwrap();
        assert_ne!(a.control_points, other.control_points);
    }

    #[test]
    fn test_unseeded_run_reports_seed() {
        let params = FoldParameters::curtain();
        let first = generate(&params, FoldVariant::Cartesian).unwrap();
        assert!(first.seed < SEED_RANGE);

        let replay = generate(&params.with_seed(first.seed), FoldVariant::Cartesian).unwrap();
        assert_eq!(first.control_points, replay.control_points);
    }

    #[test]
    fn test_invalid_params_yield_no_pattern() {
        let params = FoldParameters::curtain().with_num_folds(0);
        assert!(generate(&params, FoldVariant::Cartesian).is_err());
    }

    #[test]
    fn test_polar_arc_bases_on_radius() {
        let params = FoldParameters::cape().with_seed(9);
        let pattern = generate(&params, FoldVariant::PolarArc).unwrap();
        assert_relative_eq!(pattern.control_points[0].x, 20.0);
        for fold in 0..params.num_folds as usize {
            let base = pattern.control_points[3 + 3 * fold];
            assert_relative_eq!(base.coords.norm(), 20.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zero_radius_collapses_bases_to_origin() {
        let params = FoldParameters::cape().with_radius(0.0).with_seed(5);
        let pattern = generate(&params, FoldVariant::PolarArc).unwrap();
        assert_relative_eq!(pattern.control_points[0].coords.norm(), 0.0);
        assert_relative_eq!(pattern.control_points[3].coords.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_full_circle_closes_on_start() {
        for uniform in [true, false] {
            let params = FoldParameters {
                uniform_circle: uniform,
                ..FoldParameters::skirt().with_seed(77)
            };
            let pattern = generate(&params, FoldVariant::FullCircle).unwrap();
            let points = &pattern.control_points;
            let n = points.len();

            assert_eq!(points[n - 1], points[0]);
            let midpoint = (points[1].coords + points[n - 2].coords) / 2.0;
            assert_relative_eq!(midpoint, points[0].coords, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_full_circle_bases_ascend() {
        for uniform in [true, false] {
            let params = FoldParameters {
                uniform_circle: uniform,
                ..FoldParameters::skirt().with_seed(11)
            };
            let mut rng = StdRng::seed_from_u64(11);
            let bases = full_circle_bases(&params, &mut rng);
            assert_eq!(bases.len(), params.num_folds as usize);
            assert!(bases.windows(2).all(|w| w[0] <= w[1]));
            assert!(bases.iter().all(|b| (0.0..360.0).contains(b)));
        }
    }
}

//! End-to-end garment generation.
//!
//! [`GarmentBuilder`] runs the whole chain for one garment: fold control
//! points, spline sampling, offsetting, stitching.
//!
//! # Example
//!
//! ```
//! use hemline::{GarmentBuilder, GarmentKind};
//!
//! let result = GarmentBuilder::new(GarmentKind::Curtain)
//!     .seed(42)
//!     .sampling_step(0.01)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(result.seed, 42);
//! assert!(result.mesh.validate().is_printable());
//! ```

use std::sync::Arc;

use hem_mesh::{Mesh, MeshReport, OperationTimer, validate_mesh};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{HemlineError, HemlineResult};
use crate::fold::{FoldPattern, generate, resolve_seed};
use crate::offset::{OffsetCurves, offset_closed_curve, offset_curve};
use crate::params::{FoldParameters, FoldVariant};
use crate::sampler::{BSplineSampler, CurveSampler, DEFAULT_DEGREE, DEFAULT_SAMPLING_STEP, sample_count};
use crate::stitch::{Boundaries, Topology, stitch};

/// Garment shapes that can be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentKind {
    /// Straight hem along X, capped at both ends.
    Curtain,
    /// Closed ring of constant thickness.
    Tube,
    /// Open arc that narrows towards the top.
    Cape,
    /// Closed ring that narrows towards the top.
    Skirt,
}

impl GarmentKind {
    pub const ALL: [GarmentKind; 4] = [
        GarmentKind::Curtain,
        GarmentKind::Tube,
        GarmentKind::Cape,
        GarmentKind::Skirt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GarmentKind::Curtain => "curtain",
            GarmentKind::Tube => "tube",
            GarmentKind::Cape => "cape",
            GarmentKind::Skirt => "skirt",
        }
    }

    /// Fold curve variant used unless overridden.
    pub fn default_variant(&self) -> FoldVariant {
        match self {
            GarmentKind::Curtain => FoldVariant::Cartesian,
            GarmentKind::Tube | GarmentKind::Skirt => FoldVariant::FullCircle,
            GarmentKind::Cape => FoldVariant::PolarArc,
        }
    }

    /// Fold parameters the kind starts from.
    pub fn default_params(&self) -> FoldParameters {
        match self {
            GarmentKind::Curtain => FoldParameters::curtain(),
            GarmentKind::Tube => FoldParameters::tube(),
            GarmentKind::Cape => FoldParameters::cape(),
            GarmentKind::Skirt => FoldParameters::skirt(),
        }
    }

    /// Whether the top curve is generated separately from the bottom one.
    pub fn is_tapered(&self) -> bool {
        matches!(self, GarmentKind::Cape | GarmentKind::Skirt)
    }

    pub fn default_height(&self) -> f64 {
        if self.is_tapered() { 35.0 } else { 5.0 }
    }

    pub fn default_top_radius(&self) -> f64 {
        match self {
            GarmentKind::Cape => 10.0,
            GarmentKind::Skirt => 6.0,
            GarmentKind::Curtain | GarmentKind::Tube => 20.0,
        }
    }
}

impl std::fmt::Display for GarmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GarmentKind {
    type Err = HemlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "curtain" => Ok(GarmentKind::Curtain),
            "tube" | "full-circle" => Ok(GarmentKind::Tube),
            "cape" => Ok(GarmentKind::Cape),
            "skirt" => Ok(GarmentKind::Skirt),
            other => Err(HemlineError::invalid_parameter(
                "kind",
                format!("unknown garment kind '{}', expected curtain, tube, cape or skirt", other),
            )),
        }
    }
}

/// Topology matching a curve variant.
pub fn default_topology(variant: FoldVariant) -> Topology {
    if variant.is_closed() {
        Topology::ClosedLoop
    } else {
        Topology::OpenStrip
    }
}

/// A generated garment.
#[derive(Debug, Clone)]
pub struct GarmentResult {
    pub mesh: Mesh,
    /// Seed that reproduces this garment.
    pub seed: u64,
    pub kind: GarmentKind,
    pub topology: Topology,
    /// Control points of the bottom fold curve.
    pub control_points: Vec<Point3<f64>>,
    /// Points per boundary curve.
    pub sample_count: usize,
}

impl GarmentResult {
    /// Validate the generated mesh.
    pub fn report(&self) -> MeshReport {
        validate_mesh(&self.mesh)
    }
}

/// One sampled and thickened fold curve.
struct Band {
    pattern: FoldPattern,
    sides: OffsetCurves,
}

/// Fluent builder for garment generation.
///
/// Starts from the presets of the chosen [`GarmentKind`]; every setter
/// overrides one value.
///
/// ```
/// use hemline::{FoldParameters, GarmentBuilder, GarmentKind};
///
/// let skirt = GarmentBuilder::new(GarmentKind::Skirt)
///     .params(FoldParameters::skirt().with_num_folds(12))
///     .top_radius(8.0)
///     .height(20.0)
///     .sampling_step(0.005)
///     .seed(7)
///     .build()
///     .unwrap();
///
/// assert!(skirt.mesh.validate().is_watertight);
/// ```
#[derive(Clone)]
pub struct GarmentBuilder {
    kind: GarmentKind,
    params: FoldParameters,
    variant: FoldVariant,
    topology: Option<Topology>,
    // Thickness of the bottom (or only) band
    thickness: f64,
    // Tapered kinds only
    top_thickness: f64,
    top_radius: f64,
    height: f64,
    // Sampling
    degree: usize,
    sampling_step: f64,
    sampler: Arc<dyn CurveSampler>,
}

impl GarmentBuilder {
    /// Builder with the presets for `kind`.
    pub fn new(kind: GarmentKind) -> Self {
        Self {
            kind,
            params: kind.default_params(),
            variant: kind.default_variant(),
            topology: None,
            thickness: 0.5,
            top_thickness: 0.2,
            top_radius: kind.default_top_radius(),
            height: kind.default_height(),
            degree: DEFAULT_DEGREE,
            sampling_step: DEFAULT_SAMPLING_STEP,
            sampler: Arc::new(BSplineSampler),
        }
    }

    // ========================================================================
    // Fold configuration
    // ========================================================================

    /// Replace the fold parameters.
    pub fn params(mut self, params: FoldParameters) -> Self {
        self.params = params;
        self
    }

    /// Override the curve variant.
    pub fn variant(mut self, variant: FoldVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Override the stitch topology, for example to leave a strip uncapped.
    pub fn topology(mut self, topology: Topology) -> Self {
        self.topology = Some(topology);
        self
    }

    /// Fix the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.params.random_seed = Some(seed);
        self
    }

    // ========================================================================
    // Shape
    // ========================================================================

    /// Offset distance of the bottom band, on each side of the curve.
    pub fn thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }

    /// Offset distance of the top band for tapered kinds.
    pub fn top_thickness(mut self, thickness: f64) -> Self {
        self.top_thickness = thickness;
        self
    }

    /// Baseline radius of the top band for tapered kinds.
    pub fn top_radius(mut self, radius: f64) -> Self {
        self.top_radius = radius;
        self
    }

    /// Distance between bottom and top bands.
    pub fn height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    // ========================================================================
    // Sampling
    // ========================================================================

    pub fn degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    pub fn sampling_step(mut self, step: f64) -> Self {
        self.sampling_step = step;
        self
    }

    /// Use a different curve evaluator.
    pub fn sampler(mut self, sampler: impl CurveSampler + 'static) -> Self {
        self.sampler = Arc::new(sampler);
        self
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Resolved topology for the current variant.
    pub fn resolved_topology(&self) -> Topology {
        self.topology.unwrap_or_else(|| default_topology(self.variant))
    }

    /// Check every setting without drawing any randomness.
    pub fn check(&self) -> HemlineResult<()> {
        self.params.validate(self.variant)?;

        let topology = self.resolved_topology();
        if topology.wraps() != self.variant.is_closed() {
            return Err(HemlineError::invalid_parameter(
                "topology",
                format!("{} cannot be stitched from a {} curve", topology, self.variant),
            ));
        }

        positive("thickness", self.thickness)?;
        positive("height", self.height)?;
        if self.kind.is_tapered() {
            positive("top_thickness", self.top_thickness)?;
            if !self.top_radius.is_finite() || self.top_radius < 0.0 {
                return Err(HemlineError::invalid_parameter(
                    "top_radius",
                    format!("must be finite and >= 0, got {}", self.top_radius),
                ));
            }
        }
        if self.degree == 0 {
            return Err(HemlineError::invalid_sampling("degree must be at least 1"));
        }
        sample_count(self.sampling_step)?;
        Ok(())
    }

    /// Generate the garment.
    pub fn build(self) -> HemlineResult<GarmentResult> {
        self.check()?;
        let _timer = OperationTimer::new("generate_garment");

        let topology = self.resolved_topology();
        let seed = resolve_seed(self.params.random_seed);
        let bottom_params = FoldParameters {
            random_seed: Some(seed),
            ..self.params.clone()
        };

        let (bottom, boundaries) = if self.kind.is_tapered() {
            // Same seed and a smaller radius, so top folds line up with the
            // bottom ones.
            let top_params = bottom_params.clone().with_radius(self.top_radius);
            let (bottom, top) = rayon::join(
                || self.band(&bottom_params, self.thickness),
                || self.band(&top_params, self.top_thickness),
            );
            let (bottom, top) = (bottom?, top?);
            let boundaries = Boundaries::tapered(&bottom.sides, &top.sides, self.height)?;
            (bottom, boundaries)
        } else {
            let bottom = self.band(&bottom_params, self.thickness)?;
            let boundaries = Boundaries::extruded(&bottom.sides, self.height)?;
            (bottom, boundaries)
        };

        let mut mesh = stitch(&boundaries, topology)?;
        if !self.kind.is_tapered() {
            mesh.place_in_positive_xy();
        }

        info!(
            kind = %self.kind,
            seed,
            topology = %topology,
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "Generated garment"
        );

        Ok(GarmentResult {
            mesh,
            seed,
            kind: self.kind,
            topology,
            control_points: bottom.pattern.control_points,
            sample_count: boundaries.len(),
        })
    }

    /// Generate, sample and offset one fold curve.
    fn band(&self, params: &FoldParameters, thickness: f64) -> HemlineResult<Band> {
        let pattern = generate(params, self.variant)?;
        let curve = self
            .sampler
            .sample_clamped(&pattern.control_points, self.degree, self.sampling_step)?;

        let sides = if self.variant.is_closed() {
            let curve = curve.closed();
            offset_closed_curve(curve.points(), thickness)?
        } else {
            offset_curve(curve.points(), thickness)?
        };
        debug!(
            radius = params.radius,
            thickness,
            samples = sides.len(),
            "Built band"
        );

        Ok(Band { pattern, sides })
    }
}

fn positive(name: &'static str, value: f64) -> HemlineResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(HemlineError::invalid_parameter(
            name,
            format!("must be finite and > 0, got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(kind: GarmentKind) -> GarmentBuilder {
        GarmentBuilder::new(kind).sampling_step(0.01).seed(42)
    }

    #[test]
    fn test_kind_defaults() {
        assert_eq!(GarmentKind::Curtain.default_variant(), FoldVariant::Cartesian);
        assert_eq!(GarmentKind::Skirt.default_variant(), FoldVariant::FullCircle);
        assert_eq!(default_topology(FoldVariant::PolarArc), Topology::OpenStrip);
        assert_eq!(default_topology(FoldVariant::FullCircle), Topology::ClosedLoop);
        assert_eq!("Skirt".parse::<GarmentKind>().unwrap(), GarmentKind::Skirt);
        assert!("gown".parse::<GarmentKind>().is_err());
    }

    #[test]
    fn test_curtain_is_printable_and_placed() {
        let result = quick(GarmentKind::Curtain).build().unwrap();
        let report = result.report();

        assert!(report.is_printable(), "{}", report);
        assert_eq!(report.euler_characteristic(), 2);
        assert_eq!(result.sample_count, 101);
        assert_eq!(result.control_points.len(), 1 + 3 * 8);

        let (min, _) = result.mesh.bounds().unwrap();
        assert!(min.x.abs() < 1e-12 && min.y.abs() < 1e-12);
    }

    #[test]
    fn test_tube_is_closed_ring() {
        let result = quick(GarmentKind::Tube).build().unwrap();
        let report = result.report();

        assert_eq!(result.topology, Topology::ClosedLoop);
        // Trailing seam sample is dropped before stitching.
        assert_eq!(result.sample_count, 100);
        assert!(report.is_watertight && report.is_manifold);
        assert_eq!(report.inconsistent_winding_count, 0);
        assert_eq!(report.euler_characteristic(), 0);
    }

    #[test]
    fn test_tapered_kinds_are_watertight() {
        for kind in [GarmentKind::Cape, GarmentKind::Skirt] {
            let report = quick(kind).build().unwrap().report();
            assert!(report.is_watertight, "{}: {}", kind, report);
            assert_eq!(report.inconsistent_winding_count, 0, "{}", kind);
        }
    }

    #[test]
    fn test_same_seed_same_mesh() {
        let a = quick(GarmentKind::Cape).build().unwrap();
        let b = quick(GarmentKind::Cape).build().unwrap();
        assert_eq!(a.mesh.faces, b.mesh.faces);
        assert_eq!(
            a.mesh.positions().collect::<Vec<_>>(),
            b.mesh.positions().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_capless_override() {
        let result = quick(GarmentKind::Curtain)
            .topology(Topology::OpenCapless)
            .build()
            .unwrap();
        assert_eq!(result.mesh.face_count(), Topology::OpenCapless.triangle_count(101));
        assert!(!result.report().is_watertight);
    }

    #[test]
    fn test_incompatible_topology_rejected() {
        let err = quick(GarmentKind::Curtain)
            .topology(Topology::ClosedLoop)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("topology"));
    }

    #[test]
    fn test_invalid_settings_rejected_before_generation() {
        assert!(quick(GarmentKind::Curtain).thickness(0.0).build().is_err());
        assert!(quick(GarmentKind::Curtain).height(-1.0).build().is_err());
        assert!(quick(GarmentKind::Skirt).top_radius(-2.0).build().is_err());
        assert!(quick(GarmentKind::Curtain).sampling_step(0.0).build().is_err());
        assert!(quick(GarmentKind::Curtain).sampling_step(1e-300).build().is_err());
        assert!(
            quick(GarmentKind::Curtain)
                .params(FoldParameters::curtain().with_num_folds(0))
                .build()
                .is_err()
        );
    }
}

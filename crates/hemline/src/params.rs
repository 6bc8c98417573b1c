//! Fold parameters and the curve variants they drive.

use serde::{Deserialize, Serialize};

use crate::error::{HemlineError, HemlineResult};

/// Largest number of folds accepted in one pattern.
pub const MAX_FOLDS: u32 = 100;

/// Largest angular width, in degrees, for polar variants.
pub const MAX_POLAR_ANGLE: f64 = 360.0;

/// Topological variant of a fold curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FoldVariant {
    /// Open strip along +X. Widths are lengths.
    Cartesian,
    /// Open arc around the origin. Widths are angles in degrees.
    PolarArc,
    /// Closed loop around the origin. Widths are angles in degrees.
    FullCircle,
}

impl FoldVariant {
    /// Whether widths are interpreted as angles.
    pub fn is_polar(&self) -> bool {
        !matches!(self, FoldVariant::Cartesian)
    }

    /// Whether the sampled curve closes on itself.
    pub fn is_closed(&self) -> bool {
        matches!(self, FoldVariant::FullCircle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FoldVariant::Cartesian => "cartesian",
            FoldVariant::PolarArc => "polar-arc",
            FoldVariant::FullCircle => "full-circle",
        }
    }
}

impl std::fmt::Display for FoldVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Randomization bounds for one fold pattern.
///
/// Every `min_*`/`max_*` pair is sampled uniformly per fold. Field names
/// serialize in camelCase so a query string or JSON request maps onto this
/// struct directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FoldParameters {
    pub min_ruffle_width: f64,
    pub max_ruffle_width: f64,
    pub min_base_width: f64,
    pub max_base_width: f64,
    pub min_height: f64,
    pub max_height: f64,
    /// Number of folds. Each fold contributes three control points.
    pub num_folds: u32,
    /// Reuse the first ruffle and base draws for the mirrored half of a fold.
    pub symmetric_fold: bool,
    /// Baseline radius for polar variants.
    pub radius: f64,
    /// Full circle only: spread fold bases evenly instead of at random.
    pub uniform_circle: bool,
    /// Seed for reproducible output. Drawn at random when unset.
    pub random_seed: Option<u64>,
}

impl Default for FoldParameters {
    fn default() -> Self {
        Self {
            min_ruffle_width: 0.1,
            max_ruffle_width: 0.3,
            min_base_width: 0.1,
            max_base_width: 0.3,
            min_height: 0.1,
            max_height: 0.3,
            num_folds: 5,
            symmetric_fold: false,
            radius: 20.0,
            uniform_circle: true,
            random_seed: None,
        }
    }
}

impl FoldParameters {
    /// Straight curtain hem: short, tall folds along X.
    pub fn curtain() -> Self {
        Self {
            min_ruffle_width: 2.0,
            max_ruffle_width: 5.0,
            min_base_width: 1.0,
            max_base_width: 3.0,
            min_height: 2.0,
            max_height: 4.0,
            num_folds: 8,
            ..Self::default()
        }
    }

    /// Closed tube with evenly spaced folds.
    pub fn tube() -> Self {
        Self {
            min_ruffle_width: 6.0,
            max_ruffle_width: 8.0,
            min_base_width: 4.0,
            max_base_width: 5.0,
            min_height: 1.0,
            max_height: 3.0,
            num_folds: 20,
            radius: 20.0,
            uniform_circle: true,
            ..Self::default()
        }
    }

    /// Open arc for a cape, with wide folds.
    pub fn cape() -> Self {
        Self {
            min_ruffle_width: 10.0,
            max_ruffle_width: 16.0,
            min_base_width: 5.0,
            max_base_width: 8.0,
            min_height: 1.0,
            max_height: 3.0,
            num_folds: 10,
            radius: 20.0,
            ..Self::default()
        }
    }

    /// Full circle bottom hem of a skirt.
    pub fn skirt() -> Self {
        Self::tube()
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Set the fold count.
    pub fn with_num_folds(mut self, num_folds: u32) -> Self {
        self.num_folds = num_folds;
        self
    }

    /// Set the polar baseline radius.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Check every bound for the given variant.
    ///
    /// Runs before any random draw, so an invalid request never produces a
    /// partial pattern.
    pub fn validate(&self, variant: FoldVariant) -> HemlineResult<()> {
        check_range(
            "ruffle_width",
            self.min_ruffle_width,
            self.max_ruffle_width,
        )?;
        check_range("base_width", self.min_base_width, self.max_base_width)?;
        check_range("height", self.min_height, self.max_height)?;

        if self.num_folds == 0 {
            return Err(HemlineError::invalid_parameter(
                "num_folds",
                "must be at least 1",
            ));
        }
        if self.num_folds > MAX_FOLDS {
            return Err(HemlineError::invalid_parameter(
                "num_folds",
                format!("must be at most {}, got {}", MAX_FOLDS, self.num_folds),
            ));
        }

        if variant.is_polar() {
            if self.max_ruffle_width > MAX_POLAR_ANGLE {
                return Err(HemlineError::invalid_parameter(
                    "max_ruffle_width",
                    format!(
                        "polar angle must be at most {} degrees, got {}",
                        MAX_POLAR_ANGLE, self.max_ruffle_width
                    ),
                ));
            }
            if self.max_base_width > MAX_POLAR_ANGLE {
                return Err(HemlineError::invalid_parameter(
                    "max_base_width",
                    format!(
                        "polar angle must be at most {} degrees, got {}",
                        MAX_POLAR_ANGLE, self.max_base_width
                    ),
                ));
            }
            if !self.radius.is_finite() || self.radius < 0.0 {
                return Err(HemlineError::invalid_parameter(
                    "radius",
                    format!("must be finite and >= 0, got {}", self.radius),
                ));
            }
        }

        Ok(())
    }
}

fn check_range(name: &'static str, min: f64, max: f64) -> HemlineResult<()> {
    if !min.is_finite() || !max.is_finite() {
        return Err(HemlineError::invalid_parameter(
            name,
            format!("bounds must be finite, got [{}, {}]", min, max),
        ));
    }
    if min <= 0.0 {
        return Err(HemlineError::invalid_parameter(
            name,
            format!("minimum must be > 0, got {}", min),
        ));
    }
    if max < min {
        return Err(HemlineError::invalid_parameter(
            name,
            format!("maximum {} is below minimum {}", max, min),
        ));
    }
    Ok(())
}

//! Garment configuration files.
//!
//! A [`GarmentConfig`] stores one garment request so it can be saved,
//! edited and replayed. Unset values fall back to the presets of the
//! garment kind.
//!
//! # Example TOML
//!
//! ```toml
//! kind = "skirt"
//! numFolds = 16
//! minHeight = 1.5
//! maxHeight = 2.5
//! randomSeed = 1234
//! topRadius = 8.0
//! height = 30.0
//! repair = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HemlineError;
use crate::garment::{GarmentBuilder, GarmentKind};
use crate::params::{FoldParameters, FoldVariant};
use crate::stitch::Topology;

/// Fold parameter overrides. Each set field replaces the kind's preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_ruffle_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ruffle_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_base_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_base_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_folds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symmetric_fold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniform_circle: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

impl FoldOverrides {
    /// Overrides that reproduce `params` exactly.
    pub fn from_params(params: &FoldParameters) -> Self {
        Self {
            min_ruffle_width: Some(params.min_ruffle_width),
            max_ruffle_width: Some(params.max_ruffle_width),
            min_base_width: Some(params.min_base_width),
            max_base_width: Some(params.max_base_width),
            min_height: Some(params.min_height),
            max_height: Some(params.max_height),
            num_folds: Some(params.num_folds),
            symmetric_fold: Some(params.symmetric_fold),
            radius: Some(params.radius),
            uniform_circle: Some(params.uniform_circle),
            random_seed: params.random_seed,
        }
    }

    /// Apply the set fields on top of `base`.
    pub fn apply(&self, base: FoldParameters) -> FoldParameters {
        FoldParameters {
            min_ruffle_width: self.min_ruffle_width.unwrap_or(base.min_ruffle_width),
            max_ruffle_width: self.max_ruffle_width.unwrap_or(base.max_ruffle_width),
            min_base_width: self.min_base_width.unwrap_or(base.min_base_width),
            max_base_width: self.max_base_width.unwrap_or(base.max_base_width),
            min_height: self.min_height.unwrap_or(base.min_height),
            max_height: self.max_height.unwrap_or(base.max_height),
            num_folds: self.num_folds.unwrap_or(base.num_folds),
            symmetric_fold: self.symmetric_fold.unwrap_or(base.symmetric_fold),
            radius: self.radius.unwrap_or(base.radius),
            uniform_circle: self.uniform_circle.unwrap_or(base.uniform_circle),
            random_seed: self.random_seed.or(base.random_seed),
        }
    }
}

/// A serializable garment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarmentConfig {
    pub kind: GarmentKind,
    #[serde(flatten)]
    pub folds: FoldOverrides,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<FoldVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<Topology>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_thickness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_step: Option<f64>,
    /// Repair the mesh before export when it is not printable.
    #[serde(default)]
    pub repair: bool,
}

impl GarmentConfig {
    /// Configuration using every preset of `kind`.
    pub fn new(kind: GarmentKind) -> Self {
        Self {
            kind,
            folds: FoldOverrides::default(),
            variant: None,
            topology: None,
            thickness: None,
            top_thickness: None,
            height: None,
            top_radius: None,
            degree: None,
            sampling_step: None,
            repair: false,
        }
    }

    /// Fix the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.folds.random_seed = Some(seed);
        self
    }

    /// Set the sampling step.
    pub fn with_sampling_step(mut self, step: f64) -> Self {
        self.sampling_step = Some(step);
        self
    }

    /// Fold parameters after applying overrides to the kind's presets.
    pub fn fold_parameters(&self) -> FoldParameters {
        self.folds.apply(self.kind.default_params())
    }

    /// Builder carrying every setting of this configuration.
    pub fn into_builder(&self) -> GarmentBuilder {
        let mut builder = GarmentBuilder::new(self.kind).params(self.fold_parameters());

        if let Some(variant) = self.variant {
            builder = builder.variant(variant);
        }
        if let Some(topology) = self.topology {
            builder = builder.topology(topology);
        }
        if let Some(thickness) = self.thickness {
            builder = builder.thickness(thickness);
        }
        if let Some(thickness) = self.top_thickness {
            builder = builder.top_thickness(thickness);
        }
        if let Some(height) = self.height {
            builder = builder.height(height);
        }
        if let Some(radius) = self.top_radius {
            builder = builder.top_radius(radius);
        }
        if let Some(degree) = self.degree {
            builder = builder.degree(degree);
        }
        if let Some(step) = self.sampling_step {
            builder = builder.sampling_step(step);
        }
        builder
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from a `.toml` or `.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;
        match format {
            ConfigFormat::Toml => Ok(toml::from_str(&contents)?),
            ConfigFormat::Json => Ok(serde_json::from_str(&contents)?),
        }
    }

    /// Save to a `.toml` or `.json` file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => self.to_toml()?,
            ConfigFormat::Json => self.to_json()?,
        };
        std::fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for GarmentConfig {
    fn default() -> Self {
        Self::new(GarmentKind::Curtain)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(ConfigError::UnsupportedFormat(ext)),
        }
    }
}

/// Errors that can occur when loading or saving garment configurations.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading or writing file.
    Io(std::io::Error),
    /// TOML parsing error.
    TomlParse(toml::de::Error),
    /// TOML serialization error.
    TomlSerialize(toml::ser::Error),
    /// JSON parsing or serialization error.
    Json(serde_json::Error),
    /// File extension is neither `.toml` nor `.json`.
    UnsupportedFormat(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::TomlParse(e) => write!(f, "TOML parse error: {}", e),
            Self::TomlSerialize(e) => write!(f, "TOML serialize error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
            Self::UnsupportedFormat(ext) => {
                write!(f, "unsupported config format '{}', expected .toml or .json", ext)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::TomlParse(e) => Some(e),
            Self::TomlSerialize(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::UnsupportedFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::TomlParse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        Self::TomlSerialize(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<ConfigError> for HemlineError {
    fn from(e: ConfigError) -> Self {
        HemlineError::invalid_config(e.to_string())
    }
}

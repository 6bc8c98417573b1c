//! Procedural garment hems.
//!
//! `hemline` turns a handful of randomization bounds into a closed,
//! printable triangle mesh of a ruffled hem. The pipeline runs in one
//! direction:
//!
//! 1. [`fold`] draws control points for a zig-zag fold curve
//! 2. [`sampler`] smooths them with a clamped B-spline
//! 3. [`offset`] thickens the sampled curve into outer and inner boundaries
//! 4. [`stitch`] joins the boundaries into a triangle mesh
//! 5. [`export`] validates, optionally repairs, and encodes the mesh as STL
//!
//! [`GarmentBuilder`] runs all of it for one [`GarmentKind`].
//!
//! # Quick Start
//!
//! ```
//! use hemline::{GarmentBuilder, GarmentKind};
//!
//! let curtain = GarmentBuilder::new(GarmentKind::Curtain)
//!     .seed(42)
//!     .thickness(0.4)
//!     .sampling_step(0.01)
//!     .build()
//!     .unwrap();
//!
//! println!("seed {} -> {} faces", curtain.seed, curtain.mesh.face_count());
//! ```
//!
//! # Reproducibility
//!
//! Every random draw goes through one seeded generator per fold curve. The
//! seed is always reported back, so any garment can be regenerated exactly
//! by passing it in again.
//!
//! # Coordinate System
//!
//! Fold curves lie in the XY plane and garments extend along +Z. Units are
//! centimeters for the presets. Face winding follows [`hem_mesh`]:
//! counter-clockwise seen from outside.

mod error;

pub mod config;
pub mod export;
pub mod fold;
pub mod garment;
pub mod offset;
pub mod params;
pub mod sampler;
pub mod stitch;

pub use error::{HemErrorCode, HemRecoverySuggestion, HemlineError, HemlineResult};

pub use config::{ConfigError, FoldOverrides, GarmentConfig};
pub use export::{ExportOptions, GarmentExport, export_garment, generate_stl};
pub use fold::{FoldPattern, generate};
pub use garment::{GarmentBuilder, GarmentKind, GarmentResult, default_topology};
pub use offset::{BoundaryCurve, OffsetCurves, offset_closed_curve, offset_curve};
pub use params::{FoldParameters, FoldVariant};
pub use sampler::{
    BSpline, BSplineSampler, CurveSampler, MAX_SAMPLES, SampledCurve, clamped_uniform_knots,
    close_loop,
};
pub use stitch::{Boundaries, LoopLayout, Topology, stitch};

// Re-export the mesh type so callers don't need a direct dependency.
pub use hem_mesh::Mesh;

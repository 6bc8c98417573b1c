//! Encoding generated garments for transport or storage.
//!
//! The exporter validates a finished mesh, optionally repairs it, and
//! encodes it as binary STL in memory. Invalid requests fail before any
//! geometry exists, so a payload is never built from a partial mesh.

use std::path::Path;

use hem_mesh::{
    MeshError, MeshReport, RepairParams, RepairReport, encode_stl, log_validation,
    repair_mesh_with_config, validate_mesh,
};
use tracing::{info, warn};

use crate::config::GarmentConfig;
use crate::error::HemlineResult;
use crate::garment::{GarmentKind, GarmentResult};

/// How a garment is prepared before encoding.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Repair the mesh when validation says it is not printable.
    pub repair: bool,
    pub repair_params: RepairParams,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            repair: false,
            repair_params: RepairParams::for_printing(),
        }
    }
}

impl ExportOptions {
    /// Options that repair non-printable meshes.
    pub fn with_repair() -> Self {
        Self {
            repair: true,
            ..Self::default()
        }
    }
}

/// An encoded garment.
#[derive(Debug, Clone)]
pub struct GarmentExport {
    /// Binary STL bytes.
    pub stl: Vec<u8>,
    /// Seed that reproduces the garment.
    pub seed: u64,
    pub kind: GarmentKind,
    /// Validation of the encoded mesh.
    pub report: MeshReport,
    /// Present when a repair pass ran.
    pub repair: Option<RepairReport>,
}

impl GarmentExport {
    /// Write the STL bytes to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> HemlineResult<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.stl).map_err(|e| MeshError::io_write(path, e))?;
        info!(path = %path.display(), bytes = self.stl.len(), "Wrote garment STL");
        Ok(())
    }
}

/// Validate, optionally repair, and encode a generated garment.
pub fn export_garment(result: GarmentResult, options: &ExportOptions) -> HemlineResult<GarmentExport> {
    let GarmentResult {
        mut mesh,
        seed,
        kind,
        ..
    } = result;

    let mut report = validate_mesh(&mesh);
    let mut repair = None;

    if !report.is_printable() {
        if options.repair {
            let changes = repair_mesh_with_config(&mut mesh, &options.repair_params)?;
            info!(kind = %kind, "Repaired garment before export");
            report = validate_mesh(&mesh);
            repair = Some(changes);
        } else {
            warn!(kind = %kind, "Exporting garment that is not printable");
        }
    }
    log_validation(&report);

    let stl = encode_stl(&mesh)?;
    info!(
        kind = %kind,
        seed,
        bytes = stl.len(),
        faces = mesh.face_count(),
        "Encoded garment"
    );

    Ok(GarmentExport {
        stl,
        seed,
        kind,
        report,
        repair,
    })
}

/// Generate and encode a garment from one request.
///
/// Takes fold parameters, garment kind and an optional seed; returns the
/// STL payload together with the seed that produced it.
pub fn generate_stl(config: &GarmentConfig) -> HemlineResult<GarmentExport> {
    let result = config.into_builder().build()?;
    let options = ExportOptions {
        repair: config.repair,
        ..ExportOptions::default()
    };
    export_garment(result, &options)
}

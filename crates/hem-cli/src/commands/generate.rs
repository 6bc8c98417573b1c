//! hem generate command - build a garment mesh.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use hem_mesh::MeshFormat;
use hemline::{GarmentConfig, GarmentKind, Topology, export_garment};
use serde::Serialize;

use crate::{Cli, FoldArgs, OutputFormat, ShapeArgs, output};

/// Everything the generate subcommand was given.
pub struct Request<'a> {
    pub kind: Option<GarmentKind>,
    pub output: &'a Path,
    pub config: Option<&'a Path>,
    pub save_config: Option<&'a Path>,
    pub repair: bool,
    pub folds: &'a FoldArgs,
    pub shape: &'a ShapeArgs,
}

#[derive(Serialize)]
struct GenerateResult {
    kind: String,
    seed: u64,
    output: String,
    vertices: usize,
    faces: usize,
    watertight: bool,
    printable: bool,
    euler_characteristic: i64,
    repaired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<String>,
}

/// Merge config file and command-line flags. Flags win.
fn resolve_config(request: &Request<'_>) -> Result<GarmentConfig> {
    let mut config = match request.config {
        Some(path) => GarmentConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => GarmentConfig::new(request.kind.unwrap_or(GarmentKind::Curtain)),
    };
    if let Some(kind) = request.kind {
        config.kind = kind;
    }

    let folds = request.folds;
    let overrides = &mut config.folds;
    overrides.num_folds = folds.num_folds.or(overrides.num_folds);
    overrides.min_ruffle_width = folds.min_ruffle_width.or(overrides.min_ruffle_width);
    overrides.max_ruffle_width = folds.max_ruffle_width.or(overrides.max_ruffle_width);
    overrides.min_base_width = folds.min_base_width.or(overrides.min_base_width);
    overrides.max_base_width = folds.max_base_width.or(overrides.max_base_width);
    overrides.min_height = folds.min_height.or(overrides.min_height);
    overrides.max_height = folds.max_height.or(overrides.max_height);
    overrides.radius = folds.radius.or(overrides.radius);
    overrides.random_seed = folds.seed.or(overrides.random_seed);
    if folds.symmetric {
        overrides.symmetric_fold = Some(true);
    }
    if folds.random_bases {
        overrides.uniform_circle = Some(false);
    }

    let shape = request.shape;
    config.thickness = shape.thickness.or(config.thickness);
    config.top_thickness = shape.top_thickness.or(config.top_thickness);
    config.height = shape.height.or(config.height);
    config.top_radius = shape.top_radius.or(config.top_radius);
    config.degree = shape.degree.or(config.degree);
    config.sampling_step = shape.step.or(config.sampling_step);
    if shape.capless {
        config.topology = Some(Topology::OpenCapless);
    }
    config.repair |= request.repair;

    Ok(config)
}

pub fn run(request: Request<'_>, cli: &Cli) -> Result<()> {
    let mut config = resolve_config(&request)?;

    let result = config
        .into_builder()
        .build()
        .with_context(|| format!("Failed to generate {}", config.kind))?;
    let seed = result.seed;

    // STL goes out through the encoded payload; other formats through the
    // mesh writer.
    let is_stl = matches!(MeshFormat::from_path(request.output), Some(MeshFormat::Stl));
    let (report, repaired) = if is_stl {
        let options = hemline::ExportOptions {
            repair: config.repair,
            ..Default::default()
        };
        let export = export_garment(result, &options)?;
        export
            .write_to(request.output)
            .with_context(|| format!("Failed to save mesh to {:?}", request.output))?;
        (export.report, export.repair.is_some())
    } else {
        let mut mesh = result.mesh;
        let mut repaired = false;
        if config.repair && !mesh.validate().is_printable() {
            mesh.repair_with_config(&hem_mesh::RepairParams::for_printing())
                .context("Repair operation failed")?;
            repaired = true;
        }
        mesh.save(request.output)
            .with_context(|| format!("Failed to save mesh to {:?}", request.output))?;
        (mesh.validate(), repaired)
    };

    // Record the seed so the saved config reproduces this exact mesh.
    config.folds.random_seed = Some(seed);
    if let Some(path) = request.save_config {
        config
            .save(path)
            .with_context(|| format!("Failed to save config to {:?}", path))?;
    }

    let summary = GenerateResult {
        kind: config.kind.to_string(),
        seed,
        output: request.output.display().to_string(),
        vertices: report.vertex_count,
        faces: report.face_count,
        watertight: report.is_watertight,
        printable: report.is_printable(),
        euler_characteristic: report.euler_characteristic(),
        repaired,
        config: request.save_config.map(|p| p.display().to_string()),
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&summary, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                output::success(
                    &format!("Generated {} saved to {}", summary.kind, summary.output),
                    cli.format,
                    cli.quiet,
                );
                println!("  {}: {}", "Seed".cyan(), summary.seed);
                println!("  {}: {}", "Vertices".cyan(), summary.vertices);
                println!("  {}: {}", "Faces".cyan(), summary.faces);
                println!(
                    "  {}: {}",
                    "Watertight".cyan(),
                    output::flag(summary.watertight, true)
                );
                println!(
                    "  {}: {}",
                    "Printable".cyan(),
                    output::flag(summary.printable, true)
                );
                if summary.repaired {
                    println!("  {}: repaired before saving", "Repairs".green());
                }
                if let Some(ref path) = summary.config {
                    println!("  {}: {}", "Config".cyan(), path);
                }
                if !summary.printable {
                    output::warning(
                        "Mesh is not printable; rerun with --repair",
                        cli.format,
                        cli.quiet,
                    );
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(folds: &'a FoldArgs, shape: &'a ShapeArgs) -> Request<'a> {
        Request {
            kind: None,
            output: Path::new("out.stl"),
            config: None,
            save_config: None,
            repair: false,
            folds,
            shape,
        }
    }

    #[test]
    fn test_defaults_to_curtain() {
        let (folds, shape) = (FoldArgs::default(), ShapeArgs::default());
        let config = resolve_config(&request(&folds, &shape)).unwrap();
        assert_eq!(config.kind, GarmentKind::Curtain);
        assert_eq!(config, GarmentConfig::new(GarmentKind::Curtain));
    }

    #[test]
    fn test_flags_override() {
        let folds = FoldArgs {
            num_folds: Some(3),
            seed: Some(9),
            symmetric: true,
            ..FoldArgs::default()
        };
        let shape = ShapeArgs {
            step: Some(0.01),
            capless: true,
            ..ShapeArgs::default()
        };
        let mut req = request(&folds, &shape);
        req.kind = Some(GarmentKind::Cape);

        let config = resolve_config(&req).unwrap();
        assert_eq!(config.kind, GarmentKind::Cape);
        assert_eq!(config.folds.num_folds, Some(3));
        assert_eq!(config.folds.random_seed, Some(9));
        assert_eq!(config.folds.symmetric_fold, Some(true));
        assert_eq!(config.sampling_step, Some(0.01));
        assert_eq!(config.topology, Some(Topology::OpenCapless));
    }
}

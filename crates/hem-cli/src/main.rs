//! hem: command-line interface for garment hem generation.
//!
//! Generates hem meshes with `hemline` and inspects or repairs mesh files
//! with `hem-mesh`. Suitable for scripting: every command supports
//! `--format json`.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=hemline=info` - Generation steps and seeds
//! - `RUST_LOG=hem_mesh=debug` - Detailed validation and repair logging
//! - `RUST_LOG=hem_mesh::timing=debug` - Performance timing
//! - `RUST_LOG=debug` - All debug output
//!
//! # Example
//!
//! ```bash
//! # Reproducible skirt
//! hem generate skirt --seed 1234 -o skirt.stl
//!
//! # Curtain from a config file, repaired if needed
//! hem generate --config curtain.toml --repair -o curtain.stl
//!
//! # Check an existing mesh
//! RUST_LOG=debug hem validate skirt.stl
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use hemline::GarmentKind;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{generate, info, repair, validate};

/// hem - Generate ruffled garment hems as printable meshes.
#[derive(Parser)]
#[command(name = "hem")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

/// Garment shape to generate.
#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    /// Straight hem, capped at both ends
    Curtain,
    /// Closed ring
    Tube,
    /// Open arc narrowing towards the top
    Cape,
    /// Closed ring narrowing towards the top
    Skirt,
}

impl From<KindArg> for GarmentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Curtain => GarmentKind::Curtain,
            KindArg::Tube => GarmentKind::Tube,
            KindArg::Cape => GarmentKind::Cape,
            KindArg::Skirt => GarmentKind::Skirt,
        }
    }
}

/// Fold randomization bounds. Unset values keep the garment's presets.
#[derive(Args, Default)]
pub struct FoldArgs {
    /// Number of folds
    #[arg(long)]
    num_folds: Option<u32>,

    /// Minimum ruffle width (length, or degrees for polar garments)
    #[arg(long)]
    min_ruffle_width: Option<f64>,

    /// Maximum ruffle width
    #[arg(long)]
    max_ruffle_width: Option<f64>,

    /// Minimum base width (length, or degrees for polar garments)
    #[arg(long)]
    min_base_width: Option<f64>,

    /// Maximum base width
    #[arg(long)]
    max_base_width: Option<f64>,

    /// Minimum fold height
    #[arg(long)]
    min_height: Option<f64>,

    /// Maximum fold height
    #[arg(long)]
    max_height: Option<f64>,

    /// Mirror each fold's ruffle and base widths
    #[arg(long)]
    symmetric: bool,

    /// Baseline radius for polar garments
    #[arg(long)]
    radius: Option<f64>,

    /// Place full-circle fold bases at random instead of evenly
    #[arg(long)]
    random_bases: bool,

    /// Random seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

/// Thickness, height and sampling settings.
#[derive(Args, Default)]
pub struct ShapeArgs {
    /// Offset distance on each side of the fold curve
    #[arg(long, short)]
    thickness: Option<f64>,

    /// Offset distance of the top band (cape, skirt)
    #[arg(long)]
    top_thickness: Option<f64>,

    /// Garment height
    #[arg(long)]
    height: Option<f64>,

    /// Baseline radius of the top band (cape, skirt)
    #[arg(long)]
    top_radius: Option<f64>,

    /// B-spline degree
    #[arg(long)]
    degree: Option<usize>,

    /// Curve sampling step in (0, 1]
    #[arg(long)]
    step: Option<f64>,

    /// Leave the ends of open garments uncapped
    #[arg(long)]
    capless: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a garment mesh
    Generate {
        /// Garment kind (defaults to the config file's kind, then curtain)
        kind: Option<KindArg>,

        /// Output file path (.stl or .obj)
        #[arg(short, long)]
        output: PathBuf,

        /// Load settings from a .toml or .json file; flags override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Save the effective settings, including the seed used
        #[arg(long)]
        save_config: Option<PathBuf>,

        /// Repair the mesh if it is not printable
        #[arg(long)]
        repair: bool,

        #[command(flatten)]
        folds: FoldArgs,

        #[command(flatten)]
        shape: ShapeArgs,
    },

    /// Display mesh statistics and information
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Show volume and surface area
        #[arg(long)]
        detailed: bool,
    },

    /// Validate a mesh for topology issues and printability
    Validate {
        /// Input mesh file
        input: PathBuf,

        /// Maximum number of issues to list
        #[arg(long, default_value = "20")]
        max_issues: usize,
    },

    /// Repair common mesh issues
    Repair {
        /// Input mesh file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Use printing-optimized repair settings
        #[arg(long)]
        for_printing: bool,

        /// Fill holes up to this edge count
        #[arg(long)]
        max_hole_edges: Option<usize>,

        /// Vertex welding tolerance
        #[arg(long)]
        weld_tolerance: Option<f64>,
    },
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "hemline=info,hem_mesh=info",
            2 => "hemline=debug,hem_mesh=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Generate {
            kind,
            output,
            config,
            save_config,
            repair,
            folds,
            shape,
        } => generate::run(
            generate::Request {
                kind: kind.map(GarmentKind::from),
                output,
                config: config.as_deref(),
                save_config: save_config.as_deref(),
                repair: *repair,
                folds,
                shape,
            },
            &cli,
        ),
        Commands::Info { input, detailed } => info::run(input, *detailed, &cli),
        Commands::Validate { input, max_issues } => validate::run(input, *max_issues, &cli),
        Commands::Repair {
            input,
            output,
            for_printing,
            max_hole_edges,
            weld_tolerance,
        } => repair::run(
            input,
            output,
            *for_printing,
            *max_hole_edges,
            *weld_tolerance,
            &cli,
        ),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            if let Some(mesh_err) = e.downcast_ref::<hem_mesh::MeshError>() {
                eprintln!("{}: {}", "Error".red().bold(), mesh_err);
                eprintln!("  {}: {}", "Code".cyan(), mesh_err.code());
                eprintln!(
                    "  {}: {}",
                    "Suggestion".green(),
                    mesh_err.recovery_suggestion()
                );
                if let Some(location) = mesh_err.location() {
                    eprintln!("  {}: {}", "Location".yellow(), location);
                }
            } else if let Some(hem_err) = e.downcast_ref::<hemline::HemlineError>() {
                eprintln!("{}: {}", "Error".red().bold(), hem_err);
                eprintln!("  {}: {}", "Code".cyan(), hem_err.code());
                eprintln!(
                    "  {}: {}",
                    "Suggestion".green(),
                    hem_err.recovery_suggestion()
                );
            } else {
                eprintln!("{}: {}", "Error".red().bold(), e);
                for cause in e.chain().skip(1) {
                    eprintln!("  {}: {}", "Caused by".yellow(), cause);
                }
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

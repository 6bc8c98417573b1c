//! hem validate command - check a mesh for topology issues.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use hem_mesh::{IssueSeverity, Mesh, ValidationOptions, topology_issues, validate_mesh_data};
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct ValidationResult {
    path: String,
    valid: bool,
    printable: bool,
    watertight: bool,
    manifold: bool,
    boundary_edges: usize,
    non_manifold_edges: usize,
    inconsistent_edges: usize,
    euler_characteristic: i64,
    inside_out: bool,
    issues: Vec<IssueInfo>,
}

#[derive(Serialize)]
struct IssueInfo {
    code: String,
    category: String,
    message: String,
    severity: String,
    suggestion: String,
}

pub fn run(input: &Path, max_issues: usize, cli: &Cli) -> Result<()> {
    let mesh =
        Mesh::load(input).with_context(|| format!("Failed to load mesh from {:?}", input))?;

    let report = mesh.validate();
    let options = ValidationOptions {
        reject_on_invalid: false,
        max_issues,
    };
    let data = validate_mesh_data(&mesh, &options)?;

    let issues: Vec<IssueInfo> = data
        .issues
        .iter()
        .chain(topology_issues(&mesh, max_issues).iter())
        .take(max_issues)
        .map(|issue| IssueInfo {
            code: issue.code().to_string(),
            category: issue.category().to_string(),
            message: issue.to_string(),
            severity: issue.severity().to_string(),
            suggestion: issue.suggestion().to_string(),
        })
        .collect();

    let has_errors = data
        .issues
        .iter()
        .any(|i| i.severity() == IssueSeverity::Error);

    let result = ValidationResult {
        path: input.display().to_string(),
        valid: report.is_valid() && !has_errors,
        printable: report.is_printable(),
        watertight: report.is_watertight,
        manifold: report.is_manifold,
        boundary_edges: report.boundary_edge_count,
        non_manifold_edges: report.non_manifold_edge_count,
        inconsistent_edges: report.inconsistent_winding_count,
        euler_characteristic: report.euler_characteristic(),
        inside_out: report.is_inside_out,
        issues,
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&result, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Validation Report".bold().underline());
                println!("  {}: {}", "File".cyan(), input.display());

                if result.valid && result.printable {
                    println!("  {}: {}", "Status".cyan(), "Printable".green().bold());
                } else if result.valid {
                    println!("  {}: {}", "Status".cyan(), "Not printable".yellow().bold());
                } else {
                    println!("  {}: {}", "Status".cyan(), "Invalid".red().bold());
                }

                println!(
                    "  {}: {}",
                    "Watertight".cyan(),
                    output::flag(result.watertight, true)
                );
                println!(
                    "  {}: {}",
                    "Manifold".cyan(),
                    output::flag(result.manifold, true)
                );
                println!(
                    "  {}: {}",
                    "Inside-out".cyan(),
                    output::flag(result.inside_out, false)
                );
                println!(
                    "  {}: {}",
                    "Euler characteristic".cyan(),
                    result.euler_characteristic
                );

                if !result.issues.is_empty() {
                    println!("\n{}", "Issues:".bold());
                    for issue in &result.issues {
                        let icon = match issue.severity.as_str() {
                            "error" => "✗".red(),
                            _ => "⚠".yellow(),
                        };
                        println!(
                            "  {} [{}] {} ({})",
                            icon, issue.category, issue.message, issue.code
                        );
                        println!("      {}", issue.suggestion.dimmed());
                    }
                }
            }
        }
    }

    // Exit with error code if not printable
    if !(result.valid && result.printable) {
        std::process::exit(1);
    }

    Ok(())
}

//! hem repair command - fix a mesh file and report what changed.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use hem_mesh::{Mesh, MeshReport, RepairParams, RepairReport};
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

/// Counts compared before and after repair.
#[derive(Serialize)]
struct Snapshot {
    vertices: usize,
    faces: usize,
    open_edges: usize,
    misoriented_edges: usize,
    printable: bool,
}

impl From<&MeshReport> for Snapshot {
    fn from(report: &MeshReport) -> Self {
        Self {
            vertices: report.vertex_count,
            faces: report.face_count,
            open_edges: report.boundary_edge_count,
            misoriented_edges: report.inconsistent_winding_count,
            printable: report.is_printable(),
        }
    }
}

/// Per-pass counts from [`RepairReport`].
#[derive(Serialize)]
struct Passes {
    invalid_faces_removed: usize,
    degenerate_faces_removed: usize,
    vertices_welded: usize,
    duplicate_faces_removed: usize,
    faces_flipped: usize,
    orientation_reversed: bool,
    holes_filled: usize,
    unreferenced_vertices_removed: usize,
}

impl From<&RepairReport> for Passes {
    fn from(r: &RepairReport) -> Self {
        Self {
            invalid_faces_removed: r.invalid_faces_removed,
            degenerate_faces_removed: r.degenerate_faces_removed,
            vertices_welded: r.vertices_welded,
            duplicate_faces_removed: r.duplicate_faces_removed,
            faces_flipped: r.faces_flipped,
            orientation_reversed: r.orientation_reversed,
            holes_filled: r.holes_filled,
            unreferenced_vertices_removed: r.unreferenced_vertices_removed,
        }
    }
}

#[derive(Serialize)]
struct RepairResult {
    input: String,
    output: String,
    before: Snapshot,
    after: Snapshot,
    passes: Passes,
}

fn repair_params(
    for_printing: bool,
    max_hole_edges: Option<usize>,
    weld_tolerance: Option<f64>,
) -> RepairParams {
    let mut params = if for_printing {
        RepairParams::for_printing()
    } else {
        RepairParams::default()
    };
    if let Some(edges) = max_hole_edges {
        params = params.with_max_hole_edges(edges);
    }
    if let Some(tolerance) = weld_tolerance {
        params = params.with_weld_epsilon(tolerance);
    }
    params
}

pub fn run(
    input: &Path,
    output_path: &Path,
    for_printing: bool,
    max_hole_edges: Option<usize>,
    weld_tolerance: Option<f64>,
    cli: &Cli,
) -> Result<()> {
    let mut mesh = Mesh::load(input).with_context(|| format!("Cannot open {}", input.display()))?;
    let before = Snapshot::from(&mesh.validate());

    let params = repair_params(for_printing, max_hole_edges, weld_tolerance);
    let changes = mesh
        .repair_with_config(&params)
        .with_context(|| format!("Cannot repair {}", input.display()))?;

    mesh.save(output_path)
        .with_context(|| format!("Cannot write {}", output_path.display()))?;

    let result = RepairResult {
        input: input.display().to_string(),
        output: output_path.display().to_string(),
        before,
        after: Snapshot::from(&mesh.validate()),
        passes: Passes::from(&changes),
    };

    if matches!(cli.format, OutputFormat::Json) {
        output::print(&result, cli.format, cli.quiet);
        return Ok(());
    }
    if cli.quiet {
        return Ok(());
    }

    output::success(
        &format!("Wrote {}", output_path.display()),
        cli.format,
        cli.quiet,
    );
    let (b, a) = (&result.before, &result.after);
    for (label, was, now) in [
        ("vertices", b.vertices, a.vertices),
        ("faces", b.faces, a.faces),
        ("open edges", b.open_edges, a.open_edges),
        ("misoriented", b.misoriented_edges, a.misoriented_edges),
    ] {
        println!("  {:<12} {} -> {}", label.cyan(), was, now);
    }
    if changes.changed() {
        // Skip the "Repair Report:" heading.
        for line in changes.to_string().lines().skip(1) {
            println!("  {}", line.trim().dimmed());
        }
    } else {
        println!("  {}", "nothing to fix".green());
    }
    println!("  {:<12} {}", "printable".cyan(), output::flag(a.printable, true));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_on_top_of_preset() {
        let params = repair_params(true, Some(12), Some(1e-3));
        assert_eq!(params.max_hole_edges, 12);
        assert_eq!(params.weld_epsilon, 1e-3);

        let defaults = repair_params(false, None, None);
        assert_eq!(defaults.max_hole_edges, RepairParams::default().max_hole_edges);
    }
}

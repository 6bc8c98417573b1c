//! hem info command - summarize a mesh file.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use hem_mesh::{Mesh, MeshReport};
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct InfoResult {
    path: String,
    vertices: usize,
    faces: usize,
    edges: usize,
    components: usize,
    euler_characteristic: i64,
    /// Shape implied by the Euler characteristic of a closed mesh.
    shape: &'static str,
    printable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    extent: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    surface_area: Option<f64>,
}

/// Closed strips have chi 2, closed rings chi 0.
fn shape(report: &MeshReport) -> &'static str {
    if !report.is_watertight {
        return "open";
    }
    match (report.component_count, report.euler_characteristic()) {
        (1, 2) => "strip",
        (1, 0) => "ring",
        _ => "other",
    }
}

pub fn run(input: &Path, detailed: bool, cli: &Cli) -> Result<()> {
    let mesh = Mesh::load(input).with_context(|| format!("Cannot open {}", input.display()))?;
    let report = mesh.validate();

    let result = InfoResult {
        path: input.display().to_string(),
        vertices: report.vertex_count,
        faces: report.face_count,
        edges: report.edge_count,
        components: report.component_count,
        euler_characteristic: report.euler_characteristic(),
        shape: shape(&report),
        printable: report.is_printable(),
        extent: report.dimensions().map(|(x, y, z)| [x, y, z]),
        origin: report.bounds.map(|(min, _)| [min.x, min.y, min.z]),
        volume: detailed.then(|| report.volume()),
        surface_area: detailed.then_some(report.surface_area),
    };

    if matches!(cli.format, OutputFormat::Json) {
        output::print(&result, cli.format, cli.quiet);
        return Ok(());
    }
    if cli.quiet {
        return Ok(());
    }

    println!("{}", input.display().to_string().bold());
    let mut rows = vec![
        ("vertices", result.vertices.to_string()),
        ("faces", result.faces.to_string()),
        ("edges", result.edges.to_string()),
        (
            "shape",
            format!("{} (chi = {})", result.shape, result.euler_characteristic),
        ),
    ];
    if let Some([w, d, h]) = result.extent {
        rows.push(("size", format!("{:.2} x {:.2} x {:.2}", w, d, h)));
        rows.push(("height", format!("{:.2}", h)));
    }
    if let Some(volume) = result.volume {
        rows.push(("volume", format!("{:.3}", volume)));
    }
    if let Some(area) = result.surface_area {
        rows.push(("area", format!("{:.3}", area)));
    }
    for (label, value) in rows {
        println!("  {:<10} {}", label.cyan(), value);
    }
    println!("  {:<10} {}", "printable".cyan(), output::flag(result.printable, true));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hemline::{GarmentBuilder, GarmentKind, Topology};

    fn report(kind: GarmentKind, topology: Option<Topology>) -> MeshReport {
        let mut builder = GarmentBuilder::new(kind).seed(3).sampling_step(0.05);
        if let Some(topology) = topology {
            builder = builder.topology(topology);
        }
        builder.build().unwrap().mesh.validate()
    }

    #[test]
    fn test_shape_from_euler_characteristic() {
        assert_eq!(shape(&report(GarmentKind::Curtain, None)), "strip");
        assert_eq!(shape(&report(GarmentKind::Tube, None)), "ring");
        assert_eq!(
            shape(&report(GarmentKind::Curtain, Some(Topology::OpenCapless))),
            "open"
        );
    }
}

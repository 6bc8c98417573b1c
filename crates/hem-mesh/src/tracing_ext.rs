//! Structured logging helpers.
//!
//! The library only emits events; binaries install the subscriber. Targets:
//!
//! - `hem_mesh::timing`: durations from [`OperationTimer`]
//! - `hem_mesh::mesh_state`: counts and extents from [`log_mesh_stats`]
//! - `hem_mesh::repair`: one event per repair pass
//! - `hem_mesh::io`: file reads and writes
//!
//! `RUST_LOG=hem_mesh::timing=info` shows timings alone.

use std::path::Path;
use std::time::Instant;

use nalgebra::Vector3;
use tracing::{debug, info, warn};

use crate::Mesh;

/// Logs how long an operation took when dropped.
///
/// ```
/// use hem_mesh::OperationTimer;
///
/// let _timer = OperationTimer::new("stitch");
/// // work happens here; the duration is logged at scope end
/// ```
pub struct OperationTimer {
    name: &'static str,
    size: Option<(usize, usize)>,
    start: Instant,
}

impl OperationTimer {
    pub fn new(name: &'static str) -> Self {
        debug!(target: "hem_mesh::timing", operation = name, "Started");
        Self {
            name,
            size: None,
            start: Instant::now(),
        }
    }

    /// Timer that also records the input size as `(faces, vertices)`.
    pub fn with_context(name: &'static str, face_count: usize, vertex_count: usize) -> Self {
        debug!(
            target: "hem_mesh::timing",
            operation = name,
            faces = face_count,
            vertices = vertex_count,
            "Started"
        );
        Self {
            name,
            size: Some((face_count, vertex_count)),
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        match self.size {
            Some((faces, vertices)) => info!(
                target: "hem_mesh::timing",
                operation = self.name,
                faces,
                vertices,
                elapsed_ms,
                "Finished"
            ),
            None => info!(
                target: "hem_mesh::timing",
                operation = self.name,
                elapsed_ms,
                "Finished"
            ),
        }
    }
}

/// Debug-level counts and bounding-box extent, tagged with `stage`.
pub fn log_mesh_stats(mesh: &Mesh, stage: &str) {
    let extent = mesh
        .bounds()
        .map(|(min, max)| max - min)
        .unwrap_or_else(Vector3::zeros);

    debug!(
        target: "hem_mesh::mesh_state",
        stage,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        extent = format!("{:.2} x {:.2} x {:.2}", extent.x, extent.y, extent.z),
        "Mesh state"
    );
}

/// One event per repair pass: info when it changed something.
pub(crate) fn log_repair_result(pass: &str, changed: usize) {
    if changed == 0 {
        debug!(target: "hem_mesh::repair", pass, "No changes");
    } else {
        info!(target: "hem_mesh::repair", pass, changed, "Pass changed the mesh");
    }
}

pub(crate) fn log_io_operation(operation: &str, path: &Path, format: &str, success: bool) {
    if success {
        info!(target: "hem_mesh::io", operation, path = %path.display(), format, "Done");
    } else {
        warn!(target: "hem_mesh::io", operation, path = %path.display(), format, "Failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_timer_measures() {
        let timer = OperationTimer::with_context("weld", 12, 8);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(timer.elapsed_ms() >= 5.0);
    }

    #[test]
    fn test_log_helpers_accept_empty_mesh() {
        log_mesh_stats(&Mesh::new(), "empty");
        log_repair_result("weld", 0);
        log_io_operation("save", Path::new("out.stl"), "stl", true);
    }
}

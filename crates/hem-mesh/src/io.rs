//! Mesh file I/O for STL and OBJ.
//!
//! STL is always written as binary with per-face unit normals. In-memory
//! encoding ([`encode_stl`] / [`decode_stl`]) serves callers that hand the
//! payload to something other than the filesystem.

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::Path;

use nalgebra::Vector3;
use tracing::{debug, info, warn};

use crate::error::{MeshError, MeshResult};
use crate::tracing_ext::log_io_operation;
use crate::validate::{ValidationOptions, validate_mesh_data};
use crate::{Mesh, Vertex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
    Obj,
}

impl MeshFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .and_then(|ext| match ext.as_str() {
                "stl" => Some(MeshFormat::Stl),
                "obj" => Some(MeshFormat::Obj),
                _ => None,
            })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MeshFormat::Stl => "stl",
            MeshFormat::Obj => "obj",
        }
    }
}

fn detect_format(path: &Path) -> MeshResult<MeshFormat> {
    MeshFormat::from_path(path).ok_or_else(|| {
        MeshError::unsupported_format(path.extension().and_then(|e| e.to_str()).map(String::from))
    })
}

/// Load a mesh from file, detecting the format from the extension.
///
/// The loaded mesh is checked for out-of-range indices and non-finite
/// coordinates before it is returned.
pub fn load_mesh(path: &Path) -> MeshResult<Mesh> {
    let format = detect_format(path)?;
    info!("Loading mesh from {:?} (format: {:?})", path, format);

    let loaded = match format {
        MeshFormat::Stl => load_stl(path),
        MeshFormat::Obj => load_obj(path),
    };
    log_io_operation("load", path, format.as_str(), loaded.is_ok());
    let mesh = loaded?;

    if mesh.is_empty() {
        return Err(MeshError::empty_mesh(format!(
            "{} has no vertices or faces",
            path.display()
        )));
    }

    if let Some((min, max)) = mesh.bounds() {
        let dims = max - min;
        info!(
            "Loaded mesh: {} vertices, {} faces",
            mesh.vertex_count(),
            mesh.face_count()
        );
        debug!("Dimensions: {:.2} x {:.2} x {:.2}", dims.x, dims.y, dims.z);
        if dims.x.max(dims.y).max(dims.z) < 0.1 {
            warn!("Mesh largest dimension is below 0.1; it may need scaling");
        }
    }

    validate_mesh_data(&mesh, &ValidationOptions::default())?;
    Ok(mesh)
}

fn load_stl(path: &Path) -> MeshResult<Mesh> {
    let file = File::open(path).map_err(|e| MeshError::io_read(path, e))?;
    let mut reader = BufReader::new(file);
    read_indexed_stl(&mut reader).map_err(|e| MeshError::parse_error(path, e.to_string()))
}

/// Read binary or ASCII STL into an indexed mesh.
///
/// `stl_io` merges identical vertex positions, so the result is already
/// welded at f32 precision. Faces that reference the same vertex twice are
/// dropped.
fn read_indexed_stl<R>(reader: &mut R) -> std::io::Result<Mesh>
where
    R: std::io::Read + std::io::Seek,
{
    let stl = stl_io::read_stl(reader)?;

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());
    mesh.vertices.extend(
        stl.vertices
            .iter()
            .map(|v| Vertex::from_coords(v.0[0] as f64, v.0[1] as f64, v.0[2] as f64)),
    );

    let mut dropped = 0;
    for face in &stl.faces {
        let [a, b, c] = face.vertices.map(|i| i as u32);
        if a != b && b != c && a != c {
            mesh.faces.push([a, b, c]);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        debug!("Dropped {} collapsed STL triangles", dropped);
    }
    Ok(mesh)
}

fn load_obj(path: &Path) -> MeshResult<Mesh> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| MeshError::parse_error(path, e.to_string()))?;

    let mut mesh = Mesh::new();
    for model in &models {
        let offset = mesh.vertices.len() as u32;
        let positions = &model.mesh.positions;

        mesh.vertices.extend(
            positions
                .chunks_exact(3)
                .map(|c| Vertex::from_coords(c[0] as f64, c[1] as f64, c[2] as f64)),
        );
        mesh.faces.extend(
            model
                .mesh
                .indices
                .chunks_exact(3)
                .map(|c| [c[0] + offset, c[1] + offset, c[2] + offset]),
        );
        debug!("OBJ model '{}': {} positions", model.name, positions.len() / 3);
    }

    Ok(mesh)
}

/// Save a mesh, choosing the format from the extension.
pub fn save_mesh(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    let format = detect_format(path)?;
    let saved = match format {
        MeshFormat::Stl => save_stl(mesh, path),
        MeshFormat::Obj => save_obj(mesh, path),
    };
    log_io_operation("save", path, format.as_str(), saved.is_ok());
    saved
}

fn stl_triangles(mesh: &Mesh) -> Vec<stl_io::Triangle> {
    let to_f32 = |p: &nalgebra::Point3<f64>| [p.x as f32, p.y as f32, p.z as f32];

    mesh.triangles()
        .map(|tri| {
            let n = tri.normal().unwrap_or_else(Vector3::zeros);
            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new(to_f32(&tri.v0)),
                    stl_io::Vertex::new(to_f32(&tri.v1)),
                    stl_io::Vertex::new(to_f32(&tri.v2)),
                ],
            }
        })
        .collect()
}

/// Write a mesh as binary STL.
pub fn save_stl(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    info!("Saving mesh to {:?}", path);

    let file = File::create(path).map_err(|e| MeshError::io_write(path, e))?;
    let mut writer = BufWriter::new(file);

    let triangles = stl_triangles(mesh);
    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| MeshError::io_write(path, e))?;
    writer.flush().map_err(|e| MeshError::io_write(path, e))?;

    info!("Saved {} triangles to {:?}", mesh.face_count(), path);
    Ok(())
}

/// Encode a mesh as a binary STL buffer.
///
/// The buffer is `84 + 50 * face_count` bytes: an 80-byte header, a
/// little-endian triangle count, then one 50-byte record per face.
pub fn encode_stl(mesh: &Mesh) -> MeshResult<Vec<u8>> {
    let triangles = stl_triangles(mesh);
    let mut bytes = Vec::with_capacity(84 + 50 * triangles.len());
    stl_io::write_stl(&mut bytes, triangles.iter())
        .map_err(|e| MeshError::io_write("<memory>", e))?;

    debug!(
        "Encoded {} triangles into {} bytes of STL",
        triangles.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Decode a binary or ASCII STL buffer.
pub fn decode_stl(bytes: &[u8]) -> MeshResult<Mesh> {
    read_indexed_stl(&mut Cursor::new(bytes))
        .map_err(|e| MeshError::parse_error("<memory>", e.to_string()))
}

/// Write a mesh as ASCII OBJ, including vertex normals when present.
pub fn save_obj(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    info!("Saving mesh to {:?} (OBJ format)", path);

    let file = File::create(path).map_err(|e| MeshError::io_write(path, e))?;
    let mut writer = BufWriter::new(file);
    write_obj(mesh, &mut writer).map_err(|e| MeshError::io_write(path, e))?;

    info!("Saved {} faces to {:?}", mesh.face_count(), path);
    Ok(())
}

fn write_obj<W: Write>(mesh: &Mesh, w: &mut W) -> std::io::Result<()> {
    writeln!(w, "# hem mesh")?;
    writeln!(w, "# Vertices: {}", mesh.vertex_count())?;
    writeln!(w, "# Faces: {}", mesh.face_count())?;

    for v in &mesh.vertices {
        let p = v.position;
        writeln!(w, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
    }

    // Normals are only written when every vertex has one, so `v` and `vn`
    // indices stay aligned.
    let with_normals = mesh.vertices.iter().all(|v| v.normal.is_some());
    if with_normals {
        for n in mesh.vertices.iter().filter_map(|v| v.normal) {
            writeln!(w, "vn {:.6} {:.6} {:.6}", n.x, n.y, n.z)?;
        }
    }

    for &[a, b, c] in &mesh.faces {
        let (a, b, c) = (a + 1, b + 1, c + 1);
        if with_normals {
            writeln!(w, "f {a}//{a} {b}//{b} {c}//{c}")?;
        } else {
            writeln!(w, "f {a} {b} {c}")?;
        }
    }

    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use tempfile::NamedTempFile;

    fn tetrahedron() -> Mesh {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 0.866025, 0.0),
            Point3::new(0.5, 0.288675, 0.816497),
        ];
        Mesh::from_buffers(&positions, vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]])
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(MeshFormat::from_path(Path::new("a.STL")), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_path(Path::new("a.obj")), Some(MeshFormat::Obj));
        assert_eq!(MeshFormat::from_path(Path::new("a.ply")), None);
        assert_eq!(MeshFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_encode_stl_layout() {
        let bytes = encode_stl(&tetrahedron()).unwrap();
        assert_eq!(bytes.len(), 84 + 50 * 4);
        assert_eq!(u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]), 4);

        // First record normal: face [0, 2, 1] points down.
        let nz = f32::from_le_bytes([bytes[92], bytes[93], bytes[94], bytes[95]]);
        assert!((nz + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_merges_shared_vertices() {
        let bytes = encode_stl(&tetrahedron()).unwrap();
        let mesh = decode_stl(&bytes).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 4);
    }

    #[test]
    fn test_decode_garbage_is_parse_error() {
        let err = decode_stl(b"definitely not an stl").unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::ParseError);
    }

    #[test]
    fn test_stl_file_roundtrip() {
        let file = NamedTempFile::with_suffix(".stl").unwrap();
        save_mesh(&tetrahedron(), file.path()).unwrap();

        let loaded = load_mesh(file.path()).unwrap();
        assert_eq!(loaded.face_count(), 4);
        assert!((loaded.volume() - tetrahedron().volume()).abs() < 1e-6);
    }

    #[test]
    fn test_obj_file_roundtrip() {
        let file = NamedTempFile::with_suffix(".obj").unwrap();
        save_mesh(&tetrahedron(), file.path()).unwrap();

        // tobj renumbers vertices in first-use order, so compare geometry.
        let loaded = load_mesh(file.path()).unwrap();
        assert_eq!(loaded.vertex_count(), 4);
        assert_eq!(loaded.face_count(), 4);
        assert!((loaded.signed_volume() - tetrahedron().signed_volume()).abs() < 1e-6);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = save_mesh(&tetrahedron(), Path::new("out.ply")).unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_missing_file_is_io_read() {
        let err = load_mesh(Path::new("/nonexistent/dir/skirt.stl")).unwrap_err();
        assert!(matches!(err, MeshError::IoRead { .. }));
    }
}

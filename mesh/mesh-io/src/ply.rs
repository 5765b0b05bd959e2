//! PLY (Polygon File Format) support for scan meshes.
//!
//! Scan reconstructions are exchanged as PLY. Besides positions and faces,
//! the loader and writer carry the per-vertex attributes produced by the
//! alignment pipeline.
//!
//! # Supported Properties
//!
//! - Vertex positions (`x`, `y`, `z`) - required
//! - Vertex normals (`nx`, `ny`, `nz`) - optional
//! - Vertex colors (`red`, `green`, `blue` as `uchar`) - optional
//! - Face vertex indices (`vertex_indices` or `vertex_index`) - optional,
//!   a file without faces loads as a point cloud
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{load_ply, save_ply};
//!
//! let mesh = load_ply("scan.ply").unwrap();
//! save_ply(&mesh, "aligned.ply", true).unwrap(); // Binary
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use mesh_types::{Point3, ScanMesh, Vector3, VertexColor};
use ply_rs::parser::Parser;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;
use tracing::debug;

use crate::error::{IoError, IoResult};

/// Load a scan mesh from a PLY file.
///
/// Supports ASCII, binary little-endian, and binary big-endian formats.
/// Normals and colors are kept only when every vertex carries them.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The file is not valid PLY format
/// - A vertex lacks `x`, `y` or `z`
/// - A face references a vertex that does not exist
pub fn load_ply<P: AsRef<Path>>(path: P) -> IoResult<ScanMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| IoError::from_open(e, path))?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let header = parser
        .read_header(&mut reader)
        .map_err(|e| IoError::invalid_content(format!("failed to parse PLY header: {e}")))?;
    let payload = parser
        .read_payload(&mut reader, &header)
        .map_err(|e| IoError::invalid_content(format!("failed to read PLY payload: {e}")))?;

    let mut mesh = ScanMesh::new();

    if let Some(vertex_elements) = payload.get("vertex") {
        mesh.positions.reserve(vertex_elements.len());
        let mut normals = Vec::with_capacity(vertex_elements.len());
        let mut colors = Vec::with_capacity(vertex_elements.len());

        for (i, element) in vertex_elements.iter().enumerate() {
            let coord = |key: &str| {
                get_scalar(element, key).ok_or_else(|| {
                    IoError::invalid_content(format!("vertex {i} has no `{key}` property"))
                })
            };
            mesh.positions.push(Point3::new(coord("x")?, coord("y")?, coord("z")?));

            if let (Some(nx), Some(ny), Some(nz)) = (
                get_scalar(element, "nx"),
                get_scalar(element, "ny"),
                get_scalar(element, "nz"),
            ) {
                normals.push(Vector3::new(nx, ny, nz));
            }
            if let (Some(r), Some(g), Some(b)) = (
                get_channel(element, "red"),
                get_channel(element, "green"),
                get_channel(element, "blue"),
            ) {
                colors.push(VertexColor::new(r, g, b));
            }
        }

        if normals.len() == mesh.positions.len() {
            mesh.normals = normals;
        }
        if colors.len() == mesh.positions.len() {
            mesh.colors = colors;
        }
    }

    if let Some(face_elements) = payload.get("face") {
        let vertex_count = mesh.positions.len();
        mesh.faces.reserve(face_elements.len());
        for (face, element) in face_elements.iter().enumerate() {
            let indices = get_index_list(element);
            if let Some(&index) = indices.iter().find(|&&i| i >= vertex_count) {
                return Err(IoError::IndexOutOfRange {
                    face,
                    index,
                    vertex_count,
                });
            }
            if indices.len() >= 3 {
                // Fan triangulation for polygons
                #[allow(clippy::cast_possible_truncation)]
                for i in 1..indices.len() - 1 {
                    mesh.faces
                        .push([indices[0] as u32, indices[i] as u32, indices[i + 1] as u32]);
                }
            }
        }
    }

    debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        normals = mesh.has_normals(),
        colors = mesh.has_colors(),
        "loaded PLY"
    );
    Ok(mesh)
}

/// Extract a floating-point property, widening to `f64`.
fn get_scalar(element: &DefaultElement, key: &str) -> Option<f64> {
    match element.get(key)? {
        Property::Float(v) => Some(f64::from(*v)),
        Property::Double(v) => Some(*v),
        _ => None,
    }
}

/// Extract an 8-bit color channel.
fn get_channel(element: &DefaultElement, key: &str) -> Option<u8> {
    match element.get(key)? {
        Property::UChar(v) => Some(*v),
        _ => None,
    }
}

/// Extract vertex index list from a face element.
fn get_index_list(element: &DefaultElement) -> Vec<usize> {
    for key in &["vertex_indices", "vertex_index"] {
        if let Some(prop) = element.get(*key) {
            return match prop {
                Property::ListInt(v) =>
                {
                    #[allow(clippy::cast_sign_loss)]
                    v.iter().map(|&i| i.max(0) as usize).collect()
                }
                Property::ListUInt(v) => v.iter().map(|&i| i as usize).collect(),
                Property::ListUChar(v) => v.iter().map(|&i| usize::from(i)).collect(),
                Property::ListShort(v) =>
                {
                    #[allow(clippy::cast_sign_loss)]
                    v.iter().map(|&i| i.max(0) as usize).collect()
                }
                Property::ListUShort(v) => v.iter().map(|&i| usize::from(i)).collect(),
                _ => continue,
            };
        }
    }
    Vec::new()
}

/// Save a scan mesh to a PLY file.
///
/// Normals and colors are written when the mesh carries them for every
/// vertex.
///
/// # Arguments
///
/// * `mesh` - The mesh to save
/// * `path` - Output file path
/// * `binary` - If true, save as binary little-endian; if false, save as ASCII
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_ply<P: AsRef<Path>>(mesh: &ScanMesh, path: P, binary: bool) -> IoResult<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    if binary {
        save_ply_binary(mesh, &mut writer)?;
    } else {
        save_ply_ascii(mesh, &mut writer)?;
    }
    writer.flush()?;

    debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        binary,
        "saved PLY"
    );
    Ok(())
}

/// Save mesh as binary PLY (little-endian).
///
/// Written by hand because ply-rs writes binary list lengths incorrectly.
fn save_ply_binary<W: Write>(mesh: &ScanMesh, writer: &mut W) -> IoResult<()> {
    let with_normals = mesh.has_normals();
    let with_colors = mesh.has_colors();

    writeln!(writer, "ply")?;
    writeln!(writer, "format binary_little_endian 1.0")?;
    writeln!(writer, "comment Generated by scan-align mesh-io")?;
    writeln!(writer, "element vertex {}", mesh.positions.len())?;
    for axis in ["x", "y", "z"] {
        writeln!(writer, "property float {axis}")?;
    }
    if with_normals {
        for axis in ["nx", "ny", "nz"] {
            writeln!(writer, "property float {axis}")?;
        }
    }
    if with_colors {
        for channel in ["red", "green", "blue"] {
            writeln!(writer, "property uchar {channel}")?;
        }
    }
    writeln!(writer, "element face {}", mesh.faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for (i, p) in mesh.positions.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        {
            for c in [p.x, p.y, p.z] {
                writer.write_all(&(c as f32).to_le_bytes())?;
            }
            if with_normals {
                let n = mesh.normals[i];
                for c in [n.x, n.y, n.z] {
                    writer.write_all(&(c as f32).to_le_bytes())?;
                }
            }
        }
        if with_colors {
            let color = mesh.colors[i];
            writer.write_all(&[color.r, color.g, color.b])?;
        }
    }

    for &[i0, i1, i2] in &mesh.faces {
        writer.write_all(&[3u8])?;
        #[allow(clippy::cast_possible_wrap)]
        {
            writer.write_all(&(i0 as i32).to_le_bytes())?;
            writer.write_all(&(i1 as i32).to_le_bytes())?;
            writer.write_all(&(i2 as i32).to_le_bytes())?;
        }
    }

    Ok(())
}

/// Save mesh as ASCII PLY using ply-rs.
fn save_ply_ascii<W: Write>(mesh: &ScanMesh, writer: &mut W) -> IoResult<()> {
    let with_normals = mesh.has_normals();
    let with_colors = mesh.has_colors();

    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header
        .comments
        .push("Generated by scan-align mesh-io".to_string());

    let mut vertex_def = ElementDef::new("vertex".to_string());
    let mut float_keys = vec!["x", "y", "z"];
    if with_normals {
        float_keys.extend(["nx", "ny", "nz"]);
    }
    for key in &float_keys {
        vertex_def.properties.add(PropertyDef::new(
            (*key).to_string(),
            PropertyType::Scalar(ScalarType::Float),
        ));
    }
    if with_colors {
        for key in ["red", "green", "blue"] {
            vertex_def.properties.add(PropertyDef::new(
                key.to_string(),
                PropertyType::Scalar(ScalarType::UChar),
            ));
        }
    }
    vertex_def.count = mesh.positions.len();
    ply.header.elements.add(vertex_def);

    let mut face_def = ElementDef::new("face".to_string());
    face_def.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    face_def.count = mesh.faces.len();
    ply.header.elements.add(face_def);

    let mut vertex_elements = Vec::with_capacity(mesh.positions.len());
    for (i, p) in mesh.positions.iter().enumerate() {
        let mut element = DefaultElement::new();
        #[allow(clippy::cast_possible_truncation)]
        {
            element.insert("x".to_string(), Property::Float(p.x as f32));
            element.insert("y".to_string(), Property::Float(p.y as f32));
            element.insert("z".to_string(), Property::Float(p.z as f32));
            if with_normals {
                let n = mesh.normals[i];
                element.insert("nx".to_string(), Property::Float(n.x as f32));
                element.insert("ny".to_string(), Property::Float(n.y as f32));
                element.insert("nz".to_string(), Property::Float(n.z as f32));
            }
        }
        if with_colors {
            let c = mesh.colors[i];
            element.insert("red".to_string(), Property::UChar(c.r));
            element.insert("green".to_string(), Property::UChar(c.g));
            element.insert("blue".to_string(), Property::UChar(c.b));
        }
        vertex_elements.push(element);
    }
    ply.payload.insert("vertex".to_string(), vertex_elements);

    let mut face_elements = Vec::with_capacity(mesh.faces.len());
    for &[i0, i1, i2] in &mesh.faces {
        let mut element = DefaultElement::new();
        #[allow(clippy::cast_possible_wrap)]
        let indices = vec![i0 as i32, i1 as i32, i2 as i32];
        element.insert("vertex_indices".to_string(), Property::ListInt(indices));
        face_elements.push(element);
    }
    ply.payload.insert("face".to_string(), face_elements);

    Writer::new()
        .write_ply(writer, &mut ply)
        .map_err(|e| IoError::invalid_content(format!("failed to write PLY: {e}")))?;

    Ok(())
}

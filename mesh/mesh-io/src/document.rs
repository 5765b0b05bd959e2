//! Lossless rewriting of PLY files.
//!
//! [`load_ply`](crate::load_ply) reduces a file to a [`ScanMesh`](mesh_types::ScanMesh),
//! which drops any property the mesh type does not model. A [`PlyDocument`]
//! instead keeps the parsed file as is: every element, property, scalar type,
//! comment and the encoding. Only vertex positions and normals are touched
//! when transforming, and they keep their declared precision.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::PlyDocument;
//! use mesh_types::Vector3;
//!
//! let mut doc = PlyDocument::load("scan.labels.ply").unwrap();
//! let offset = Vector3::new(0.0, 0.0, -1.2);
//! doc.transform_vertices(|p| p + offset, |n| *n).unwrap();
//! doc.save("scan.labels.ply").unwrap();
//! ```

use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use mesh_types::{Point3, Vector3};
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, ElementDef, Encoding, Ply, Property, PropertyType, ScalarType};
use ply_rs::writer::Writer;
use tracing::debug;

use crate::error::{IoError, IoResult};

/// A PLY file held exactly as parsed.
#[derive(Debug, Clone)]
pub struct PlyDocument {
    ply: Ply<DefaultElement>,
}

impl PlyDocument {
    /// Parse a PLY file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid PLY.
    pub fn load<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| IoError::from_open(e, path))?;
        let doc = Self::read(&mut BufReader::new(file))?;
        debug!(
            path = %path.display(),
            vertices = doc.vertex_count(),
            binary = doc.is_binary(),
            "loaded PLY document"
        );
        Ok(doc)
    }

    /// Parse PLY data from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid PLY.
    pub fn read<R: BufRead>(reader: &mut R) -> IoResult<Self> {
        let parser = Parser::<DefaultElement>::new();
        let header = parser
            .read_header(reader)
            .map_err(|e| IoError::invalid_content(format!("failed to parse PLY header: {e}")))?;
        let payload = parser
            .read_payload(reader, &header)
            .map_err(|e| IoError::invalid_content(format!("failed to read PLY payload: {e}")))?;
        Ok(Self {
            ply: Ply { header, payload },
        })
    }

    /// True for binary encodings.
    #[must_use]
    pub fn is_binary(&self) -> bool {
        !matches!(self.ply.header.encoding, Encoding::Ascii)
    }

    /// Number of `vertex` elements.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.ply.payload.get("vertex").map_or(0, Vec::len)
    }

    /// Whether the vertex element declares a property called `key`.
    #[must_use]
    pub fn has_vertex_property(&self, key: &str) -> bool {
        self.ply
            .header
            .elements
            .get("vertex")
            .is_some_and(|def| def.properties.contains_key(key))
    }

    /// A scalar vertex property widened to `f64`, whatever its declared type.
    #[must_use]
    pub fn vertex_scalar(&self, index: usize, key: &str) -> Option<f64> {
        let element = self.ply.payload.get("vertex")?.get(index)?;
        Some(match element.get(key)? {
            Property::Char(v) => f64::from(*v),
            Property::UChar(v) => f64::from(*v),
            Property::Short(v) => f64::from(*v),
            Property::UShort(v) => f64::from(*v),
            Property::Int(v) => f64::from(*v),
            Property::UInt(v) => f64::from(*v),
            Property::Float(v) => f64::from(*v),
            Property::Double(v) => *v,
            _ => return None,
        })
    }

    /// Map every vertex position, and every normal when the file has
    /// `nx`/`ny`/`nz`, in place.
    ///
    /// Values are computed in `f64` and stored back with their declared
    /// type. All other properties are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if a vertex lacks a floating-point `x`, `y` or `z`.
    pub fn transform_vertices<F, G>(&mut self, position: F, normal: G) -> IoResult<()>
    where
        F: Fn(&Point3<f64>) -> Point3<f64>,
        G: Fn(&Vector3<f64>) -> Vector3<f64>,
    {
        let Some(vertices) = self.ply.payload.get_mut("vertex") else {
            return Ok(());
        };

        for (i, element) in vertices.iter_mut().enumerate() {
            let coord = |key: &str| {
                float_value(element, key).ok_or_else(|| {
                    IoError::invalid_content(format!("vertex {i} has no floating-point `{key}`"))
                })
            };
            let p = position(&Point3::new(coord("x")?, coord("y")?, coord("z")?));
            set_float(element, "x", p.x);
            set_float(element, "y", p.y);
            set_float(element, "z", p.z);

            if let (Some(nx), Some(ny), Some(nz)) = (
                float_value(element, "nx"),
                float_value(element, "ny"),
                float_value(element, "nz"),
            ) {
                let n = normal(&Vector3::new(nx, ny, nz));
                set_float(element, "nx", n.x);
                set_float(element, "ny", n.y);
                set_float(element, "nz", n.z);
            }
        }
        Ok(())
    }

    /// Write the document with its original header and encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails, or if an element is missing a
    /// property its header declares.
    pub fn write<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        let header = &self.ply.header;
        Writer::<DefaultElement>::new().write_header(writer, header)?;

        let empty = Vec::new();
        for (name, def) in &header.elements {
            let elements = self.ply.payload.get(name).unwrap_or(&empty);
            for element in elements {
                match header.encoding {
                    Encoding::Ascii => write_ascii_element(writer, element, def)?,
                    Encoding::BinaryLittleEndian => {
                        write_binary_element(writer, element, def, Endian::Little)?;
                    }
                    Encoding::BinaryBigEndian => {
                        write_binary_element(writer, element, def, Endian::Big)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Write the document to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> IoResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        debug!(path = %path.display(), vertices = self.vertex_count(), "saved PLY document");
        Ok(())
    }
}

fn float_value(element: &DefaultElement, key: &str) -> Option<f64> {
    match element.get(key)? {
        Property::Float(v) => Some(f64::from(*v)),
        Property::Double(v) => Some(*v),
        _ => None,
    }
}

fn set_float(element: &mut DefaultElement, key: &str, value: f64) {
    match element.get_mut(key) {
        #[allow(clippy::cast_possible_truncation)]
        Some(Property::Float(v)) => *v = value as f32,
        Some(Property::Double(v)) => *v = value,
        _ => {}
    }
}

fn missing_property(element: &ElementDef, key: &str) -> IoError {
    IoError::invalid_content(format!("`{}` element has no `{key}` value", element.name))
}

// =============================================================================
// ASCII payload
// =============================================================================

fn write_ascii_element<W: Write>(
    writer: &mut W,
    element: &DefaultElement,
    def: &ElementDef,
) -> IoResult<()> {
    for (i, (key, _)) in def.properties.iter().enumerate() {
        if i > 0 {
            writer.write_all(b" ")?;
        }
        let value = element.get(key).ok_or_else(|| missing_property(def, key))?;
        match value {
            Property::Char(v) => write!(writer, "{v}")?,
            Property::UChar(v) => write!(writer, "{v}")?,
            Property::Short(v) => write!(writer, "{v}")?,
            Property::UShort(v) => write!(writer, "{v}")?,
            Property::Int(v) => write!(writer, "{v}")?,
            Property::UInt(v) => write!(writer, "{v}")?,
            Property::Float(v) => write!(writer, "{v}")?,
            Property::Double(v) => write!(writer, "{v}")?,
            Property::ListChar(v) => write_ascii_list(writer, v)?,
            Property::ListUChar(v) => write_ascii_list(writer, v)?,
            Property::ListShort(v) => write_ascii_list(writer, v)?,
            Property::ListUShort(v) => write_ascii_list(writer, v)?,
            Property::ListInt(v) => write_ascii_list(writer, v)?,
            Property::ListUInt(v) => write_ascii_list(writer, v)?,
            Property::ListFloat(v) => write_ascii_list(writer, v)?,
            Property::ListDouble(v) => write_ascii_list(writer, v)?,
        }
    }
    writer.write_all(b"\n")?;
    Ok(())
}

fn write_ascii_list<W: Write, T: Display>(writer: &mut W, values: &[T]) -> IoResult<()> {
    write!(writer, "{}", values.len())?;
    for v in values {
        write!(writer, " {v}")?;
    }
    Ok(())
}

// =============================================================================
// Binary payload
// =============================================================================
//
// Written by hand: ply-rs writes the element count as every list length.

#[derive(Debug, Clone, Copy)]
enum Endian {
    Little,
    Big,
}

trait BinaryScalar: Copy {
    fn put<W: Write>(self, writer: &mut W, endian: Endian) -> std::io::Result<()>;
}

macro_rules! binary_scalar {
    ($($t:ty),*) => {
        $(impl BinaryScalar for $t {
            fn put<W: Write>(self, writer: &mut W, endian: Endian) -> std::io::Result<()> {
                match endian {
                    Endian::Little => writer.write_all(&self.to_le_bytes()),
                    Endian::Big => writer.write_all(&self.to_be_bytes()),
                }
            }
        })*
    };
}

binary_scalar!(i8, u8, i16, u16, i32, u32, f32, f64);

fn write_binary_element<W: Write>(
    writer: &mut W,
    element: &DefaultElement,
    def: &ElementDef,
    endian: Endian,
) -> IoResult<()> {
    for (key, prop_def) in &def.properties {
        let value = element.get(key).ok_or_else(|| missing_property(def, key))?;
        let index = match &prop_def.data_type {
            PropertyType::List(index, _) => Some(index),
            PropertyType::Scalar(_) => None,
        };
        match value {
            Property::Char(v) => v.put(writer, endian)?,
            Property::UChar(v) => v.put(writer, endian)?,
            Property::Short(v) => v.put(writer, endian)?,
            Property::UShort(v) => v.put(writer, endian)?,
            Property::Int(v) => v.put(writer, endian)?,
            Property::UInt(v) => v.put(writer, endian)?,
            Property::Float(v) => v.put(writer, endian)?,
            Property::Double(v) => v.put(writer, endian)?,
            Property::ListChar(v) => write_binary_list(writer, index, v, endian)?,
            Property::ListUChar(v) => write_binary_list(writer, index, v, endian)?,
            Property::ListShort(v) => write_binary_list(writer, index, v, endian)?,
            Property::ListUShort(v) => write_binary_list(writer, index, v, endian)?,
            Property::ListInt(v) => write_binary_list(writer, index, v, endian)?,
            Property::ListUInt(v) => write_binary_list(writer, index, v, endian)?,
            Property::ListFloat(v) => write_binary_list(writer, index, v, endian)?,
            Property::ListDouble(v) => write_binary_list(writer, index, v, endian)?,
        }
    }
    Ok(())
}

fn write_binary_list<W: Write, T: BinaryScalar>(
    writer: &mut W,
    index: Option<&ScalarType>,
    values: &[T],
    endian: Endian,
) -> IoResult<()> {
    let len = values.len();
    let too_long = || IoError::invalid_content(format!("list of {len} values overflows its length type"));
    match index {
        Some(ScalarType::Char) => i8::try_from(len).map_err(|_| too_long())?.put(writer, endian)?,
        Some(ScalarType::UChar) => u8::try_from(len).map_err(|_| too_long())?.put(writer, endian)?,
        Some(ScalarType::Short) => i16::try_from(len).map_err(|_| too_long())?.put(writer, endian)?,
        Some(ScalarType::UShort) => u16::try_from(len).map_err(|_| too_long())?.put(writer, endian)?,
        Some(ScalarType::Int) => i32::try_from(len).map_err(|_| too_long())?.put(writer, endian)?,
        Some(ScalarType::UInt) => u32::try_from(len).map_err(|_| too_long())?.put(writer, endian)?,
        Some(ScalarType::Float | ScalarType::Double) | None => {
            return Err(IoError::invalid_content("list length must have an integer type"));
        }
    }
    for &v in values {
        v.put(writer, endian)?;
    }
    Ok(())
}

//! `.aln` transform files.
//!
//! A MeshLab-style alignment file: three header lines (mesh count, mesh
//! name, `#`) followed by the 4×4 transform as 16 whitespace-separated
//! numbers in row-major order. Anything after the 16th number is ignored.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use mesh_transform::RigidTransform;
use nalgebra::Matrix4;
use tracing::debug;

use crate::error::{AlignError, AlignResult};

const HEADER_LINES: usize = 3;

/// Parse `.aln` text into a transform.
///
/// # Errors
///
/// Returns a description of the problem if the header is short, fewer than
/// 16 numbers follow it, or a value is not a finite number.
///
/// # Example
///
/// ```
/// use scan_align::parse_aln;
///
/// let text = "1\nscene.ply\n#\n1 0 0 2\n0 1 0 0\n0 0 1 0\n0 0 0 1\n0\n";
/// let transform = parse_aln(text).unwrap();
/// assert_eq!(transform.translation_part().x, 2.0);
/// ```
pub fn parse_aln(text: &str) -> Result<RigidTransform, String> {
    let mut lines = text.lines();
    for i in 0..HEADER_LINES {
        if lines.next().is_none() {
            return Err(format!("expected {HEADER_LINES} header lines, found {i}"));
        }
    }

    let mut values = [0.0; 16];
    let mut tokens = lines.flat_map(str::split_whitespace);
    for (i, v) in values.iter_mut().enumerate() {
        let token = tokens
            .next()
            .ok_or_else(|| format!("expected 16 matrix values, found {i}"))?;
        *v = token
            .parse()
            .map_err(|_| format!("matrix value {i} is not a number: `{token}`"))?;
    }

    RigidTransform::try_from_matrix(Matrix4::from_row_slice(&values)).map_err(|e| e.to_string())
}

/// Render a transform as `.aln` text for the given mesh name.
#[must_use]
pub fn format_aln(transform: &RigidTransform, mesh_name: &str) -> String {
    let mut text = format!("1\n{mesh_name}\n#\n");
    for row in transform.matrix().row_iter() {
        let cells: Vec<String> = row.iter().map(f64::to_string).collect();
        let _ = writeln!(text, "{}", cells.join(" "));
    }
    text.push_str("0\n");
    text
}

/// Read an `.aln` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse.
pub fn read_aln<P: AsRef<Path>>(path: P) -> AlignResult<RigidTransform> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let transform = parse_aln(&text).map_err(|message| AlignError::AlnFormat {
        path: path.to_path_buf(),
        message,
    })?;
    debug!(path = %path.display(), "read transform file");
    Ok(transform)
}

/// Write an `.aln` file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_aln<P: AsRef<Path>>(
    path: P,
    transform: &RigidTransform,
    mesh_name: &str,
) -> AlignResult<()> {
    fs::write(path, format_aln(transform, mesh_name))?;
    Ok(())
}

//! Scan mesh file I/O.
//!
//! Scans are stored as PLY files next to their trajectory and state files.
//! This crate reads and writes them, including per-vertex normals and
//! colors, and enumerates the PLY files belonging to one scan directory.
//! [`PlyDocument`] rewrites a file in place without losing any of its
//! properties.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{list_ply_files, load_ply, save_ply};
//!
//! for path in list_ply_files("scans/kitchen").unwrap() {
//!     let mesh = load_ply(&path).unwrap();
//!     save_ply(&mesh, &path, true).unwrap();
//! }
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod document;
mod error;
mod ply;

pub use document::PlyDocument;
pub use error::{IoError, IoResult};
pub use ply::{load_ply, save_ply};

use std::path::{Path, PathBuf};

/// List every `.ply` file directly inside `dir`, sorted by path.
///
/// The extension match is case-insensitive. Subdirectories are not
/// searched.
///
/// # Errors
///
/// Returns an error if the directory does not exist or cannot be read.
pub fn list_ply_files<P: AsRef<Path>>(dir: P) -> IoResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| IoError::from_open(e, dir))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_ply(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_ply(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ply"))
}

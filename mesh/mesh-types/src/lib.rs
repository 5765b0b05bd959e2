//! Core mesh types for scan alignment.
//!
//! This crate provides the mesh store used by the alignment pipeline:
//!
//! - [`ScanMesh`] - Vertex positions with optional per-vertex normals and colors
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`VertexColor`] - 8-bit RGB vertex color
//! - [`merge_close_vertices`] / [`remove_isolated_pieces`] - Scan pre-cleaning
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Memory Layout
//!
//! Vertex attributes are stored as parallel arrays (structure of arrays), so
//! bulk passes such as transform application touch one contiguous buffer at a
//! time and never reallocate.
//!
//! # Coordinate System
//!
//! Right-handed. After alignment, Z is up and the floor lies at `z = 0`.
//!
//! # Example
//!
//! ```
//! use mesh_types::{ScanMesh, Point3};
//!
//! let mut mesh = ScanMesh::new();
//! mesh.positions.push(Point3::new(0.0, 0.0, 0.0));
//! mesh.positions.push(Point3::new(1.0, 0.0, 0.0));
//! mesh.positions.push(Point3::new(0.0, 1.0, 0.0));
//! mesh.faces.push([0, 1, 2]);
//!
//! mesh.compute_vertex_normals();
//! assert!(mesh.has_normals());
//! assert!((mesh.normals[0].z - 1.0).abs() < 1e-12);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bounds;
mod cleanup;
mod mesh;
mod vertex;

pub use bounds::Aabb;
pub use cleanup::{merge_close_vertices, remove_isolated_pieces};
pub use mesh::ScanMesh;
pub use vertex::VertexColor;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

//! Rigid transforms and geometric fitting for scan alignment.
//!
//! This crate provides tools for:
//! - Rigid 4x4 transforms applied in place to scan meshes
//! - Ordered, named transform stages ([`TransformChain`])
//! - PCA (Principal Component Analysis) on point sets
//! - Plane signed-distance tests
//! - Oriented bounding boxes, optionally constrained to keep +Z
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Example
//!
//! ```
//! use mesh_transform::{RigidTransform, pca_from_points};
//! use mesh_types::{Point3, ScanMesh};
//! use nalgebra::Vector3;
//!
//! let mut mesh = ScanMesh::from_parts(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![[0, 1, 2]],
//! );
//!
//! // Compute PCA axes
//! let pca = pca_from_points(&mesh.positions);
//! assert!(pca.is_some());
//!
//! // Apply a transformation in place
//! RigidTransform::translation(Vector3::new(1.0, 2.0, 3.0)).apply_to_mesh(&mut mesh);
//! assert_eq!(mesh.positions[0], Point3::new(1.0, 2.0, 3.0));
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod chain;
mod error;
mod obb;
mod pca;
mod plane;
mod transform;

pub use chain::TransformChain;
pub use error::{TransformError, TransformResult};
pub use obb::{ObbConstraint, OrientedBox, oriented_bounding_box};
pub use pca::{PcaResult, pca_checked, pca_from_points};
pub use plane::Plane;
pub use transform::RigidTransform;

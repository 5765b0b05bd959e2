//! Planar clustering of oriented scan vertices.
//!
//! Every vertex with a normal defines a local plane hypothesis
//! ([`PlaneModel`]). [`ClusterSet::extract`] groups these hypotheses in a
//! single greedy pass into [`Cluster`]s whose representative plane is a
//! running average of their members. Clusters can then be filtered by size
//! and by whether they bound the scanned space (floors and walls rather than
//! table tops).
//!
//! Only the clusters that end up driving an alignment need an exact fit:
//! [`Cluster::tighten_and_rotation`] refits the plane by PCA on the members
//! close to it.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use mesh_planes::{ClusterParams, ClusterSet, PlaneModel};
//! use mesh_types::{Point3, Vector3};
//!
//! let floor: Vec<_> = (0..100)
//!     .filter_map(|i| {
//!         let p = Point3::new(f64::from(i % 10) * 0.1, f64::from(i / 10) * 0.1, 0.0);
//!         PlaneModel::new(p, Vector3::z(), i as usize)
//!     })
//!     .collect();
//!
//! let mut clusters = ClusterSet::extract(&floor, &ClusterParams::default());
//! clusters.remove_small(50);
//! clusters.remove_non_bounding(0.1, 10);
//!
//! assert_eq!(clusters.len(), 1);
//! let rotation = clusters.clusters()[0].tighten_and_rotation(0.05).unwrap();
//! assert!(((rotation * Vector3::z()).z - 1.0).abs() < 1e-9);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cluster;
mod error;
mod extract;
mod model;

pub use cluster::Cluster;
pub use error::{PlaneError, PlaneResult};
pub use extract::{ClusterParams, ClusterSet, paint_clusters};
pub use model::PlaneModel;

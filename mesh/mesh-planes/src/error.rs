//! Error types for planar clustering.

use thiserror::Error;

/// Result type for planar clustering operations.
pub type PlaneResult<T> = Result<T, PlaneError>;

/// Errors that can occur while building or refitting plane clusters.
#[derive(Debug, Error)]
pub enum PlaneError {
    /// The mesh carries no per-vertex normals.
    #[error("mesh has {normals} normals for {vertices} vertices")]
    MissingNormals {
        /// Number of vertices.
        vertices: usize,
        /// Number of normals present.
        normals: usize,
    },

    /// Too few members lie close enough to the plane for a refit.
    #[error("plane refit needs at least {required} points within tolerance, found {actual}")]
    InsufficientPoints {
        /// Minimum number of points required.
        required: usize,
        /// Points found within tolerance.
        actual: usize,
    },
}

//! Error types for scan alignment.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for scan alignment operations.
pub type AlignResult<T> = Result<T, AlignError>;

/// Errors that abort the alignment of one scan.
///
/// Precondition failures (missing or invalid reconstruction, already
/// aligned) are not errors; see [`crate::SkipReason`].
#[derive(Debug, Error)]
pub enum AlignError {
    /// The trajectory contains no frames.
    #[error("no frames found in trajectory of {dir}")]
    NoFrames {
        /// Scan directory.
        dir: PathBuf,
    },

    /// The first pose carries a previous alignment but is marked invalid,
    /// so it cannot be reverted.
    #[error("cannot revert previous alignment of {dir}: first pose is invalid")]
    InvalidPriorPose {
        /// Scan directory.
        dir: PathBuf,
    },

    /// The first pose carries a previous alignment that is not invertible.
    #[error("cannot revert previous alignment of {dir}: first pose is singular")]
    SingularPriorPose {
        /// Scan directory.
        dir: PathBuf,
    },

    /// An IMU-based estimate was requested but the trajectory has no IMU data.
    #[error("no IMU data found")]
    NoImuSamples,

    /// Every contribution to the up vector was skipped or they cancel out.
    #[error("cannot estimate up vector: {0}")]
    DegenerateUp(&'static str),

    /// The scan's main mesh has no vertices left after cleaning.
    #[error("mesh {path} has no usable vertices")]
    EmptyMesh {
        /// Mesh file.
        path: PathBuf,
    },

    /// Malformed `.aln` transform file.
    #[error("invalid transform file {path}: {message}")]
    AlnFormat {
        /// Transform file.
        path: PathBuf,
        /// Description of what was invalid.
        message: String,
    },

    /// Malformed state file.
    #[error("invalid state file {path}: {message}")]
    StateFormat {
        /// State file.
        path: PathBuf,
        /// Description of what was invalid.
        message: String,
    },

    /// Mesh file error.
    #[error(transparent)]
    Mesh(#[from] mesh_io::IoError),

    /// Trajectory file or IMU lookup error.
    #[error(transparent)]
    Sensor(#[from] sensor_types::SensorError),

    /// Plane clustering error.
    #[error(transparent)]
    Plane(#[from] mesh_planes::PlaneError),

    /// Geometry error.
    #[error(transparent)]
    Transform(#[from] mesh_transform::TransformError),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

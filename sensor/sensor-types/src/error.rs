//! Error types for capture data.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for capture data operations.
pub type SensorResult<T> = Result<T, SensorError>;

/// Errors that can occur when working with capture data.
#[derive(Debug, Error)]
pub enum SensorError {
    /// Trajectory file not found.
    #[error("trajectory file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// The file is not a trajectory file or is truncated.
    #[error("invalid trajectory file: {0}")]
    InvalidFormat(String),

    /// The trajectory file was written by an unknown format version.
    #[error("unsupported trajectory version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version in the file.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },

    /// An operation needed IMU samples but the trajectory has none.
    #[error("trajectory has no IMU samples")]
    NoImuSamples,

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SensorError {
    /// Creates an invalid format error.
    #[must_use]
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat(message.into())
    }
}

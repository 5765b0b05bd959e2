//! Error types for transform and fitting operations.

use thiserror::Error;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors that can occur while fitting or composing transforms.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Not enough points for the operation.
    #[error("insufficient points: need at least {required}, got {actual}")]
    InsufficientPoints {
        /// Minimum number of points required.
        required: usize,
        /// Actual number of points provided.
        actual: usize,
    },

    /// Matrix is not invertible.
    #[error("matrix is not invertible")]
    NotInvertible,

    /// A matrix entry is NaN or infinite.
    #[error("matrix contains non-finite values")]
    NonFinite,

    /// No stage with the given name exists in the chain.
    #[error("no stage named `{name}` in transform chain")]
    UnknownStage {
        /// The missing stage name.
        name: String,
    },
}

//! Errors raised when a forward call violates the model contract
//!
//! Every check runs before any tensor work, so a failed call leaves nothing
//! half-computed behind.

use thiserror::Error;

/// Errors from model forward passes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Input dimensions do not match the fixed architecture.
    ///
    /// A `0` in the batch position of `expected` means "any batch size".
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A class label falls outside `[0, 9]`
    #[error("Invalid label {label} at batch index {index}: must be in [0, {max}]", max = crate::dims::NUM_CLASSES - 1)]
    InvalidLabel { index: usize, label: i64 },

    /// Image and label counts differ
    #[error("Batch mismatch: {images} images but {labels} labels")]
    BatchMismatch { images: usize, labels: usize },
}

pub type Result<T> = std::result::Result<T, ModelError>;

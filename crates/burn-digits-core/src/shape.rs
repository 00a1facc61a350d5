//! Shape checks for model inputs
//!
//! The architecture is fixed, so only the batch dimension may vary. Each
//! check returns the batch size on success.

use crate::dims::{IMAGE_CHANNELS, IMAGE_PIXELS, IMAGE_SIDE, LATENT_DIM};
use crate::error::{ModelError, Result};

/// Checks a `[batch, features]` tensor shape
pub fn check_features(dims: [usize; 2], features: usize) -> Result<usize> {
    let [batch, actual] = dims;
    if batch == 0 || actual != features {
        return Err(ModelError::ShapeMismatch {
            expected: vec![0, features],
            actual: dims.to_vec(),
        });
    }
    Ok(batch)
}

/// Checks a flattened image batch: `[batch, 784]`
pub fn check_flat_image(dims: [usize; 2]) -> Result<usize> {
    check_features(dims, IMAGE_PIXELS)
}

/// Checks a latent batch: `[batch, 20]`
pub fn check_latent(dims: [usize; 2]) -> Result<usize> {
    check_features(dims, LATENT_DIM)
}

/// Checks a single-channel image batch: `[batch, 1, 28, 28]`
pub fn check_image(dims: [usize; 4]) -> Result<usize> {
    let [batch, channels, height, width] = dims;
    if batch == 0 || channels != IMAGE_CHANNELS || height != IMAGE_SIDE || width != IMAGE_SIDE {
        return Err(ModelError::ShapeMismatch {
            expected: vec![0, IMAGE_CHANNELS, IMAGE_SIDE, IMAGE_SIDE],
            actual: dims.to_vec(),
        });
    }
    Ok(batch)
}

/// Checks that a requested batch is non-empty (used when generating)
pub fn check_nonempty_batch(batch: usize) -> Result<usize> {
    if batch == 0 {
        return Err(ModelError::ShapeMismatch {
            expected: vec![0],
            actual: vec![batch],
        });
    }
    Ok(batch)
}

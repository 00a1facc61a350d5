//! Core Building Blocks for the burn-digits Models
//!
//! This crate provides the pieces shared by the plain and class-conditional
//! variational autoencoders in `burn-digits-vae`.
//!
//! # Modules
//!
//! - [`error`] - Error taxonomy for forward-pass contract violations
//! - [`shape`] - Batch-agnostic shape checks for inputs and latents
//! - [`label`] - One-hot label encoding (channel maps and flat vectors)
//! - [`latent`] - Reparameterized sampling from the latent Gaussian
//!
//! # Example
//!
//! ```ignore
//! use burn_digits_core::latent::{Mode, reparameterize};
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let z = reparameterize(mu, logvar, Mode::Training, &mut rng);
//! ```

pub mod error;
pub mod label;
pub mod latent;
pub mod shape;

pub use error::{ModelError, Result};
pub use latent::Mode;

/// Fixed dimensions of the digit models
pub mod dims {
    /// Side length of a square input image
    pub const IMAGE_SIDE: usize = 28;
    /// Pixels per image (28 * 28)
    pub const IMAGE_PIXELS: usize = IMAGE_SIDE * IMAGE_SIDE;
    /// Channels of an input image (grayscale)
    pub const IMAGE_CHANNELS: usize = 1;
    /// Width of the dense hidden layer in encoder and decoder
    pub const HIDDEN_DIM: usize = 400;
    /// Latent dimensionality
    pub const LATENT_DIM: usize = 20;
    /// Number of label classes
    pub const NUM_CLASSES: usize = 10;
}

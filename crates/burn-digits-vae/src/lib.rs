//! Variational Autoencoders for 28x28 Digit Images
//!
//! This crate provides two small generative models:
//!
//! - [`Vae`] - Plain VAE over flattened 784-pixel images
//! - [`Cvae`] - Class-conditional VAE; a label in `[0, 9]` is injected into
//!   the encoder as one-hot image channels and into the decoder as a
//!   one-hot vector
//!
//! Both compose encoder -> reparameterized latent sample -> decoder and
//! return the reconstruction with the latent mean and log-variance. The
//! loss, optimizer and training loop live with the caller; the models are
//! Burn [`Module`](burn::module::Module)s, so any Burn optimizer can update
//! their parameters.
//!
//! # Example
//!
//! ```ignore
//! use burn_digits_vae::{CvaeConfig, Mode};
//! use rand::SeedableRng;
//!
//! let model = CvaeConfig::new().with_mode(Mode::Evaluation).init::<Backend>(&device);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//!
//! let out = model.forward(images, &[3, 7], &mut rng)?;
//! let (reconstruction, mu, logvar) = out.into_parts();
//! ```

pub mod decoder;
pub mod encoder;
pub mod model;
pub mod summary;

pub use burn_digits_core::label::Labels;
pub use burn_digits_core::{Mode, ModelError, Result};
pub use decoder::{ConditionalDecoder, Decoder};
pub use encoder::{ConditionalEncoder, Encoder};
pub use model::{Cvae, CvaeConfig, Vae, VaeConfig, VaeOutput};
pub use summary::{LayerSummary, ModelSummary};

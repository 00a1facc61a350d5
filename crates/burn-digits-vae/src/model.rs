//! Full models: encoder -> latent sampler -> decoder
//!
//! [`Vae`] works on flattened images, [`Cvae`] on single-channel 28x28
//! images plus one class label per sample. Both return the reconstruction
//! together with the latent parameters, which is everything an external
//! loss needs (reconstruction term plus the closed-form KL term).

use burn::prelude::*;
use rand::Rng;

use burn_digits_core::Result;
use burn_digits_core::label::Labels;
use burn_digits_core::latent::{Mode, reparameterize, sample_prior};
use burn_digits_core::shape::check_image;

use crate::decoder::{ConditionalDecoder, Decoder};
use crate::encoder::{ConditionalEncoder, Encoder};
use crate::summary::ModelSummary;

/// Output of a forward pass
#[derive(Debug, Clone)]
pub struct VaeOutput<B: Backend, const D: usize> {
    /// Reconstructed image, values in (0, 1)
    pub reconstruction: Tensor<B, D>,
    /// Latent means, [batch, 20]
    pub mu: Tensor<B, 2>,
    /// Latent log-variances, [batch, 20]
    pub logvar: Tensor<B, 2>,
}

impl<B: Backend, const D: usize> VaeOutput<B, D> {
    /// Splits into `(reconstruction, mu, logvar)`
    pub fn into_parts(self) -> (Tensor<B, D>, Tensor<B, 2>, Tensor<B, 2>) {
        (self.reconstruction, self.mu, self.logvar)
    }
}

/// Plain VAE configuration
///
/// The architecture is fixed; only the initial sampler mode is chosen here.
#[derive(Debug, Clone, Default)]
pub struct VaeConfig {
    pub mode: Mode,
}

impl VaeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Initialize a VAE with freshly initialized parameters
    pub fn init<B: Backend>(&self, device: &B::Device) -> Vae<B> {
        Vae::new(device).with_mode(self.mode)
    }
}

/// Conditional VAE configuration
#[derive(Debug, Clone, Default)]
pub struct CvaeConfig {
    pub mode: Mode,
}

impl CvaeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Initialize a CVAE with freshly initialized parameters
    pub fn init<B: Backend>(&self, device: &B::Device) -> Cvae<B> {
        Cvae::new(device).with_mode(self.mode)
    }
}

/// Plain variational autoencoder over flattened 28x28 images
#[derive(Module, Debug)]
pub struct Vae<B: Backend> {
    encoder: Encoder<B>,
    decoder: Decoder<B>,
    /// Sampler mode, see [`Mode`]
    training: bool,
}

impl<B: Backend> Vae<B> {
    /// Creates a new VAE in training mode
    pub fn new(device: &B::Device) -> Self {
        Self {
            encoder: Encoder::new(device),
            decoder: Decoder::new(device),
            training: true,
        }
    }

    pub fn mode(&self) -> Mode {
        Mode::from_training(self.training)
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.training = mode.is_training();
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.set_mode(mode);
        self
    }

    /// Switch to stochastic sampling
    pub fn train(self) -> Self {
        self.with_mode(Mode::Training)
    }

    /// Switch to deterministic decoding of the latent mean
    pub fn eval(self) -> Self {
        self.with_mode(Mode::Evaluation)
    }

    /// Encode flattened images: [batch, 784] -> (mu, logvar)
    pub fn encode(&self, x: Tensor<B, 2>) -> Result<(Tensor<B, 2>, Tensor<B, 2>)> {
        self.encoder.forward(x)
    }

    /// Sample a latent according to the current mode
    pub fn reparameterize<R: Rng + ?Sized>(
        &self,
        mu: Tensor<B, 2>,
        logvar: Tensor<B, 2>,
        rng: &mut R,
    ) -> Result<Tensor<B, 2>> {
        reparameterize(mu, logvar, self.mode(), rng)
    }

    /// Decode latents: [batch, 20] -> [batch, 784]
    pub fn decode(&self, z: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        self.decoder.forward(z)
    }

    /// Full forward pass on flattened images
    ///
    /// Input: [batch, 784]
    /// Output: reconstruction [batch, 784] with mu and logvar [batch, 20]
    pub fn forward<R: Rng + ?Sized>(
        &self,
        x: Tensor<B, 2>,
        rng: &mut R,
    ) -> Result<VaeOutput<B, 2>> {
        let [batch, _] = x.dims();
        tracing::debug!(batch, mode = ?self.mode(), "vae forward");

        let (mu, logvar) = self.encode(x)?;
        let z = self.reparameterize(mu.clone(), logvar.clone(), rng)?;
        let reconstruction = self.decode(z)?;

        Ok(VaeOutput {
            reconstruction,
            mu,
            logvar,
        })
    }

    /// Full forward pass on unflattened images
    ///
    /// Input: [batch, 1, 28, 28], flattened to [batch, 784] before encoding
    pub fn forward_image<R: Rng + ?Sized>(
        &self,
        image: Tensor<B, 4>,
        rng: &mut R,
    ) -> Result<VaeOutput<B, 2>> {
        check_image(image.dims())?;
        self.forward(image.flatten(1, 3), rng)
    }

    /// Decode `count` draws from the standard-normal prior: [count, 784]
    pub fn generate<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
        device: &B::Device,
    ) -> Result<Tensor<B, 2>> {
        let z = sample_prior(count, rng, device)?;
        self.decode(z)
    }

    /// Layer listing with parameter counts
    pub fn summary(&self) -> ModelSummary {
        let mut layers = Vec::new();
        self.encoder.describe("encoder", &mut layers);
        self.decoder.describe("decoder", &mut layers);
        ModelSummary { model: "VAE", layers }
    }
}

/// Class-conditional variational autoencoder over 1x28x28 images
#[derive(Module, Debug)]
pub struct Cvae<B: Backend> {
    encoder: ConditionalEncoder<B>,
    decoder: ConditionalDecoder<B>,
    /// Sampler mode, see [`Mode`]
    training: bool,
}

impl<B: Backend> Cvae<B> {
    /// Creates a new CVAE in training mode
    pub fn new(device: &B::Device) -> Self {
        Self {
            encoder: ConditionalEncoder::new(device),
            decoder: ConditionalDecoder::new(device),
            training: true,
        }
    }

    pub fn mode(&self) -> Mode {
        Mode::from_training(self.training)
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.training = mode.is_training();
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.set_mode(mode);
        self
    }

    /// Switch to stochastic sampling
    pub fn train(self) -> Self {
        self.with_mode(Mode::Training)
    }

    /// Switch to deterministic decoding of the latent mean
    pub fn eval(self) -> Self {
        self.with_mode(Mode::Evaluation)
    }

    /// Encode labelled images: [batch, 1, 28, 28] -> (mu, logvar)
    pub fn encode(
        &self,
        image: Tensor<B, 4>,
        labels: &[i64],
    ) -> Result<(Tensor<B, 2>, Tensor<B, 2>)> {
        let batch = check_image(image.dims())?;
        let labels = Labels::for_batch(labels, batch)?;
        self.encoder.forward(image, &labels)
    }

    /// Sample a latent according to the current mode
    pub fn reparameterize<R: Rng + ?Sized>(
        &self,
        mu: Tensor<B, 2>,
        logvar: Tensor<B, 2>,
        rng: &mut R,
    ) -> Result<Tensor<B, 2>> {
        reparameterize(mu, logvar, self.mode(), rng)
    }

    /// Decode labelled latents: [batch, 20] -> [batch, 1, 28, 28]
    pub fn decode(&self, z: Tensor<B, 2>, labels: &[i64]) -> Result<Tensor<B, 4>> {
        let [batch, _] = z.dims();
        let labels = Labels::for_batch(labels, batch)?;
        self.decoder.forward(z, &labels)
    }

    /// Full forward pass
    ///
    /// Input: [batch, 1, 28, 28] image and one label in [0, 9] per sample
    /// Output: reconstruction [batch, 1, 28, 28] with mu and logvar [batch, 20]
    pub fn forward<R: Rng + ?Sized>(
        &self,
        image: Tensor<B, 4>,
        labels: &[i64],
        rng: &mut R,
    ) -> Result<VaeOutput<B, 4>> {
        let batch = check_image(image.dims())?;
        let labels = Labels::for_batch(labels, batch)?;
        tracing::debug!(batch, mode = ?self.mode(), "cvae forward");

        let (mu, logvar) = self.encoder.forward(image, &labels)?;
        let z = self.reparameterize(mu.clone(), logvar.clone(), rng)?;
        let reconstruction = self.decoder.forward(z, &labels)?;

        Ok(VaeOutput {
            reconstruction,
            mu,
            logvar,
        })
    }

    /// Decode one prior draw per requested label: [labels.len(), 1, 28, 28]
    pub fn generate<R: Rng + ?Sized>(
        &self,
        labels: &[i64],
        rng: &mut R,
        device: &B::Device,
    ) -> Result<Tensor<B, 4>> {
        let labels = Labels::new(labels)?;
        let z = sample_prior(labels.len(), rng, device)?;
        self.decoder.forward(z, &labels)
    }

    /// Layer listing with parameter counts
    pub fn summary(&self) -> ModelSummary {
        let mut layers = Vec::new();
        self.encoder.describe("encoder", &mut layers);
        self.decoder.describe("decoder", &mut layers);
        ModelSummary {
            model: "CVAE",
            layers,
        }
    }
}

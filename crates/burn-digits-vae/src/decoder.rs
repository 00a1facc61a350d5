//! VAE Decoders: latent -> image
//!
//! Both decoders finish with a sigmoid, so every output pixel is a
//! Bernoulli mean in (0, 1).

use burn::nn::{
    Linear, LinearConfig, PaddingConfig2d,
    conv::{Conv2d, Conv2dConfig},
};
use burn::prelude::*;
use burn::tensor::activation::{relu, sigmoid};

use burn_digits_core::Result;
use burn_digits_core::dims::{HIDDEN_DIM, IMAGE_PIXELS, LATENT_DIM, NUM_CLASSES};
use burn_digits_core::label::{Labels, one_hot_vector};
use burn_digits_core::shape::check_latent;

use crate::summary::LayerSummary;

/// Decoder input width: one-hot label followed by the latent sample
const CONDITIONED_LATENT: usize = NUM_CLASSES + LATENT_DIM;
/// Channels of the seed feature map produced by the dense layer
const SEED_CHANNELS: usize = 2;
/// Side of the seed feature map (upsampled 2x to 28)
const SEED_SIDE: usize = 14;
const SEED_FEATURES: usize = SEED_CHANNELS * SEED_SIDE * SEED_SIDE;
const WIDE_CHANNELS: usize = 11;
const NARROW_CHANNELS: usize = 3;

/// Dense decoder producing flattened images
#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
}

impl<B: Backend> Decoder<B> {
    /// Creates a new dense decoder
    pub fn new(device: &B::Device) -> Self {
        Self {
            fc1: LinearConfig::new(LATENT_DIM, HIDDEN_DIM).init(device),
            fc2: LinearConfig::new(HIDDEN_DIM, IMAGE_PIXELS).init(device),
        }
    }

    /// Decode latents to flattened images
    ///
    /// Input: [batch, 20]
    /// Output: [batch, 784], values in (0, 1)
    pub fn forward(&self, z: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        check_latent(z.dims())?;

        let h = relu(self.fc1.forward(z));
        Ok(sigmoid(self.fc2.forward(h)))
    }

    pub(crate) fn describe(&self, prefix: &str, layers: &mut Vec<LayerSummary>) {
        layers.push(LayerSummary::linear(
            format!("{prefix}.fc1"),
            LATENT_DIM,
            HIDDEN_DIM,
            self.fc1.num_params(),
        ));
        layers.push(LayerSummary::linear(
            format!("{prefix}.fc2"),
            HIDDEN_DIM,
            IMAGE_PIXELS,
            self.fc2.num_params(),
        ));
    }
}

/// Label-conditioned decoder
///
/// The one-hot label is prepended to the latent sample. A dense layer grows
/// the 30-vector into a 2x14x14 seed map, which a small convolutional stack
/// with one nearest-neighbour upsample turns into a 1x28x28 image.
#[derive(Module, Debug)]
pub struct ConditionalDecoder<B: Backend> {
    fc: Linear<B>,
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
}

impl<B: Backend> ConditionalDecoder<B> {
    /// Creates a new conditional decoder
    pub fn new(device: &B::Device) -> Self {
        let conv = |channels: [usize; 2]| -> Conv2d<B> {
            Conv2dConfig::new(channels, [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device)
        };

        Self {
            fc: LinearConfig::new(CONDITIONED_LATENT, SEED_FEATURES).init(device),
            conv1: conv([SEED_CHANNELS, WIDE_CHANNELS]),
            conv2: conv([WIDE_CHANNELS, NARROW_CHANNELS]),
            conv3: conv([NARROW_CHANNELS, 1]),
        }
    }

    /// Decode latents to labelled images
    ///
    /// Input: [batch, 20] latent, one label per sample
    /// Output: [batch, 1, 28, 28], values in (0, 1)
    pub fn forward(&self, z: Tensor<B, 2>, labels: &Labels) -> Result<Tensor<B, 4>> {
        let batch = check_latent(z.dims())?;
        labels.check_batch(batch)?;

        let onehot = one_hot_vector(labels, &z.device());
        let x = Tensor::cat(vec![onehot, z], 1); // [b, 30]

        let h = relu(self.fc.forward(x));
        let h = h.reshape([batch, SEED_CHANNELS, SEED_SIDE, SEED_SIDE]);

        let h = relu(self.conv1.forward(h));
        let h = upsample_nearest(h); // [b, 11, 28, 28]
        let h = relu(self.conv2.forward(h));
        Ok(sigmoid(self.conv3.forward(h)))
    }

    pub(crate) fn describe(&self, prefix: &str, layers: &mut Vec<LayerSummary>) {
        layers.push(LayerSummary::linear(
            format!("{prefix}.fc"),
            CONDITIONED_LATENT,
            SEED_FEATURES,
            self.fc.num_params(),
        ));
        layers.push(LayerSummary::conv(
            format!("{prefix}.conv1"),
            SEED_CHANNELS,
            WIDE_CHANNELS,
            self.conv1.num_params(),
        ));
        layers.push(LayerSummary::conv(
            format!("{prefix}.conv2"),
            WIDE_CHANNELS,
            NARROW_CHANNELS,
            self.conv2.num_params(),
        ));
        layers.push(LayerSummary::conv(
            format!("{prefix}.conv3"),
            NARROW_CHANNELS,
            1,
            self.conv3.num_params(),
        ));
    }
}

/// 2x nearest-neighbour spatial upsampling
fn upsample_nearest<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    use burn::tensor::module::interpolate;
    use burn::tensor::ops::{InterpolateMode, InterpolateOptions};

    let [_b, _c, h, w] = x.dims();

    interpolate(
        x,
        [h * 2, w * 2],
        InterpolateOptions::new(InterpolateMode::Nearest),
    )
}

//! VAE Encoders: image -> latent distribution parameters
//!
//! Both encoders end in the same dense head: a 784 -> 400 projection with
//! ReLU, then two independent 400 -> 20 projections for the mean and the
//! log-variance.

use burn::nn::{
    Linear, LinearConfig, PaddingConfig2d,
    conv::{Conv2d, Conv2dConfig},
};
use burn::prelude::*;
use burn::tensor::activation::relu;

use burn_digits_core::Result;
use burn_digits_core::dims::{HIDDEN_DIM, IMAGE_PIXELS, IMAGE_SIDE, LATENT_DIM, NUM_CLASSES};
use burn_digits_core::label::{Labels, one_hot_map};
use burn_digits_core::shape::{check_flat_image, check_image};

use crate::summary::LayerSummary;

/// Channels after concatenating the image with its one-hot label map
const CONDITIONED_CHANNELS: usize = 1 + NUM_CLASSES;
/// Channels between the two stem convolutions
const STEM_CHANNELS: usize = 3;

/// Dense encoder for flattened images
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    fc1: Linear<B>,
    fc_mu: Linear<B>,
    fc_logvar: Linear<B>,
}

impl<B: Backend> Encoder<B> {
    /// Creates a new dense encoder
    pub fn new(device: &B::Device) -> Self {
        Self {
            fc1: LinearConfig::new(IMAGE_PIXELS, HIDDEN_DIM).init(device),
            fc_mu: LinearConfig::new(HIDDEN_DIM, LATENT_DIM).init(device),
            fc_logvar: LinearConfig::new(HIDDEN_DIM, LATENT_DIM).init(device),
        }
    }

    /// Encode flattened images to latent distribution parameters
    ///
    /// Input: [batch, 784]
    /// Output: (mu, logvar), each [batch, 20]
    pub fn forward(&self, x: Tensor<B, 2>) -> Result<(Tensor<B, 2>, Tensor<B, 2>)> {
        check_flat_image(x.dims())?;
        Ok(self.project(x))
    }

    fn project(&self, x: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let h = relu(self.fc1.forward(x));
        let mu = self.fc_mu.forward(h.clone());
        let logvar = self.fc_logvar.forward(h);
        (mu, logvar)
    }

    pub(crate) fn describe(&self, prefix: &str, layers: &mut Vec<LayerSummary>) {
        layers.push(LayerSummary::linear(
            format!("{prefix}.fc1"),
            IMAGE_PIXELS,
            HIDDEN_DIM,
            self.fc1.num_params(),
        ));
        layers.push(LayerSummary::linear(
            format!("{prefix}.fc_mu"),
            HIDDEN_DIM,
            LATENT_DIM,
            self.fc_mu.num_params(),
        ));
        layers.push(LayerSummary::linear(
            format!("{prefix}.fc_logvar"),
            HIDDEN_DIM,
            LATENT_DIM,
            self.fc_logvar.num_params(),
        ));
    }
}

/// Label-conditioned encoder
///
/// The label is broadcast to a 10-channel one-hot map and stacked onto the
/// image. A two-layer convolutional stem folds the 11 channels back into a
/// single 28x28 map, which then goes through the dense head.
#[derive(Module, Debug)]
pub struct ConditionalEncoder<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    head: Encoder<B>,
}

impl<B: Backend> ConditionalEncoder<B> {
    /// Creates a new conditional encoder
    pub fn new(device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([CONDITIONED_CHANNELS, STEM_CHANNELS], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let conv2 = Conv2dConfig::new([STEM_CHANNELS, 1], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);

        Self {
            conv1,
            conv2,
            head: Encoder::new(device),
        }
    }

    /// Encode labelled images to latent distribution parameters
    ///
    /// Input: [batch, 1, 28, 28] image, one label per sample
    /// Output: (mu, logvar), each [batch, 20]
    pub fn forward(
        &self,
        image: Tensor<B, 4>,
        labels: &Labels,
    ) -> Result<(Tensor<B, 2>, Tensor<B, 2>)> {
        let batch = check_image(image.dims())?;
        labels.check_batch(batch)?;

        let onehot = one_hot_map(labels, IMAGE_SIDE, IMAGE_SIDE, &image.device());
        let x = Tensor::cat(vec![image, onehot], 1); // [b, 11, 28, 28]

        let h = relu(self.conv1.forward(x));
        let h = relu(self.conv2.forward(h)); // [b, 1, 28, 28]
        let h: Tensor<B, 2> = h.flatten(1, 3);

        Ok(self.head.project(h))
    }

    pub(crate) fn describe(&self, prefix: &str, layers: &mut Vec<LayerSummary>) {
        layers.push(LayerSummary::conv(
            format!("{prefix}.conv1"),
            CONDITIONED_CHANNELS,
            STEM_CHANNELS,
            self.conv1.num_params(),
        ));
        layers.push(LayerSummary::conv(
            format!("{prefix}.conv2"),
            STEM_CHANNELS,
            1,
            self.conv2.num_params(),
        ));
        self.head.describe(prefix, layers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_digits_core::ModelError;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_encoder_shapes() {
        let device = Default::default();
        let encoder = Encoder::<TestBackend>::new(&device);

        for batch in [1, 3, 16] {
            let x = Tensor::zeros([batch, IMAGE_PIXELS], &device);
            let (mu, logvar) = encoder.forward(x).unwrap();
            assert_eq!(mu.dims(), [batch, LATENT_DIM]);
            assert_eq!(logvar.dims(), [batch, LATENT_DIM]);
        }
    }

    #[test]
    fn test_encoder_rejects_wrong_width() {
        let device = Default::default();
        let encoder = Encoder::<TestBackend>::new(&device);

        let x = Tensor::zeros([2, 100], &device);
        assert!(matches!(
            encoder.forward(x),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_conditional_encoder_shapes() {
        let device = Default::default();
        let encoder = ConditionalEncoder::<TestBackend>::new(&device);

        let image = Tensor::ones([2, 1, 28, 28], &device) * 0.5;
        let labels = Labels::new(&[0, 9]).unwrap();
        let (mu, logvar) = encoder.forward(image, &labels).unwrap();

        assert_eq!(mu.dims(), [2, LATENT_DIM]);
        assert_eq!(logvar.dims(), [2, LATENT_DIM]);
    }

    #[test]
    fn test_conditional_encoder_batch_mismatch() {
        let device = Default::default();
        let encoder = ConditionalEncoder::<TestBackend>::new(&device);

        let image = Tensor::zeros([3, 1, 28, 28], &device);
        let labels = Labels::new(&[1, 2]).unwrap();
        assert_eq!(
            encoder.forward(image, &labels).unwrap_err(),
            ModelError::BatchMismatch {
                images: 3,
                labels: 2
            }
        );
    }

    #[test]
    fn test_conditional_encoder_rejects_rgb() {
        let device = Default::default();
        let encoder = ConditionalEncoder::<TestBackend>::new(&device);

        let image = Tensor::zeros([1, 3, 28, 28], &device);
        let labels = Labels::new(&[1]).unwrap();
        assert!(matches!(
            encoder.forward(image, &labels),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }
}

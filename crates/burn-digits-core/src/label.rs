//! One-hot label encoding
//!
//! The conditional model injects the class label at two points:
//!
//! - the encoder sees it as extra image channels, `[batch, 10, h, w]`, with
//!   the label's channel filled with ones across the whole spatial extent
//! - the decoder sees it as a flat `[batch, 10]` vector
//!
//! Both encodings carry the same semantics: exactly one active index per
//! sample. Labels are range-checked once, in [`Labels::new`], so the
//! encoders below can never index outside the class axis.

use burn::prelude::*;

use crate::dims::NUM_CLASSES;
use crate::error::{ModelError, Result};

/// A batch of class labels, each guaranteed to lie in `[0, NUM_CLASSES)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels(Vec<usize>);

impl Labels {
    /// Validates raw labels
    ///
    /// Fails with [`ModelError::InvalidLabel`] on the first label outside
    /// `[0, 9]`.
    pub fn new(labels: &[i64]) -> Result<Self> {
        labels
            .iter()
            .enumerate()
            .map(|(index, &label)| match usize::try_from(label) {
                Ok(class) if class < NUM_CLASSES => Ok(class),
                _ => Err(ModelError::InvalidLabel { index, label }),
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    /// Validates raw labels against an image batch
    ///
    /// The batch size is compared first; label values are checked after.
    pub fn for_batch(labels: &[i64], batch: usize) -> Result<Self> {
        check_label_count(labels.len(), batch)?;
        Self::new(labels)
    }

    /// Fails with [`ModelError::BatchMismatch`] unless there is one label per sample
    pub fn check_batch(&self, batch: usize) -> Result<()> {
        check_label_count(self.len(), batch)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

fn check_label_count(labels: usize, images: usize) -> Result<()> {
    if labels != images {
        return Err(ModelError::BatchMismatch { images, labels });
    }
    Ok(())
}

/// Builds the decoder-side one-hot vector: `[batch, 10]`
pub fn one_hot_vector<B: Backend>(labels: &Labels, device: &B::Device) -> Tensor<B, 2> {
    let batch = labels.len();
    let mut data = vec![0.0f32; batch * NUM_CLASSES];

    for (i, &class) in labels.as_slice().iter().enumerate() {
        data[i * NUM_CLASSES + class] = 1.0;
    }

    Tensor::from_data(TensorData::new(data, [batch, NUM_CLASSES]), device)
}

/// Builds the encoder-side one-hot map: `[batch, 10, height, width]`
///
/// The channel matching each sample's label is all ones, every other
/// channel is all zeros.
pub fn one_hot_map<B: Backend>(
    labels: &Labels,
    height: usize,
    width: usize,
    device: &B::Device,
) -> Tensor<B, 4> {
    let batch = labels.len();
    let plane = height * width;
    let mut data = vec![0.0f32; batch * NUM_CLASSES * plane];

    for (i, &class) in labels.as_slice().iter().enumerate() {
        let start = (i * NUM_CLASSES + class) * plane;
        data[start..start + plane].fill(1.0);
    }

    Tensor::from_data(
        TensorData::new(data, [batch, NUM_CLASSES, height, width]),
        device,
    )
}

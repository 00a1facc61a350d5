//! Layer-by-layer model summaries
//!
//! A summary lists every parameterised layer in forward order, so an
//! external optimizer or a reviewer can see exactly what a model owns.

use std::fmt;

/// One parameterised layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    /// Dotted path, e.g. `encoder.fc1`
    pub name: String,
    /// Human-readable layer shape, e.g. `Linear(784 -> 400)`
    pub description: String,
    /// Number of trainable scalars (weights and bias)
    pub num_params: usize,
}

impl LayerSummary {
    pub(crate) fn linear(name: String, d_input: usize, d_output: usize, num_params: usize) -> Self {
        Self {
            name,
            description: format!("Linear({d_input} -> {d_output})"),
            num_params,
        }
    }

    pub(crate) fn conv(name: String, channels_in: usize, channels_out: usize, num_params: usize) -> Self {
        Self {
            name,
            description: format!("Conv2d({channels_in} -> {channels_out}, 3x3, stride 1, pad 1)"),
            num_params,
        }
    }
}

/// Ordered layer listing for a whole model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    pub model: &'static str,
    pub layers: Vec<LayerSummary>,
}

impl ModelSummary {
    pub fn total_params(&self) -> usize {
        self.layers.iter().map(|layer| layer.num_params).sum()
    }

    /// Looks up a layer by its dotted path
    pub fn layer(&self, name: &str) -> Option<&LayerSummary> {
        self.layers.iter().find(|layer| layer.name == name)
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self
            .layers
            .iter()
            .map(|layer| layer.name.len())
            .max()
            .unwrap_or(0)
            .max("layer".len());
        let desc_width = self
            .layers
            .iter()
            .map(|layer| layer.description.len())
            .max()
            .unwrap_or(0)
            .max("shape".len());

        writeln!(f, "{}", self.model)?;
        writeln!(
            f,
            "  {:<name_width$}  {:<desc_width$}  {:>10}",
            "layer", "shape", "params"
        )?;
        for layer in &self.layers {
            writeln!(
                f,
                "  {:<name_width$}  {:<desc_width$}  {:>10}",
                layer.name, layer.description, layer.num_params
            )?;
        }
        write!(f, "  total parameters: {}", self.total_params())
    }
}

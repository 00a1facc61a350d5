//! burn-digits CLI
//!
//! Command-line interface for the digit VAEs in pure Rust.
//!
//! Supports:
//! - Printing a model's layer table and parameter counts
//! - Running a single forward pass on a constant test image
//! - Decoding samples drawn from the latent prior

use anyhow::{Context, Result, anyhow, bail};
use burn::prelude::*;
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use burn_digits_core::dims::{IMAGE_PIXELS, IMAGE_SIDE, NUM_CLASSES};
use burn_digits_vae::{CvaeConfig, Mode, ModelSummary, VaeConfig};

mod backends;

use backends::DefaultBackend;

/// Model variant selection
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelKind {
    /// Plain VAE on flattened images
    Vae,
    /// Class-conditional VAE
    Cvae,
}

#[derive(Parser)]
#[command(name = "burn-digits")]
#[command(about = "Variational autoencoders for 28x28 digit images in pure Rust")]
#[command(version)]
struct Cli {
    /// Enable debug logging for the model crates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the layer table and parameter counts
    Summary {
        /// Model variant
        #[arg(short, long, value_enum, default_value = "cvae")]
        model: ModelKind,

        /// Show a single layer by dotted path, e.g. `encoder.fc1`
        #[arg(long)]
        layer: Option<String>,
    },

    /// Run one forward pass on a constant image
    Forward {
        /// Model variant
        #[arg(short, long, value_enum, default_value = "cvae")]
        model: ModelKind,

        /// Pixel intensity of the test image, in [0, 1]
        #[arg(long, default_value = "0.5")]
        fill: f32,

        /// Comma-separated class labels (conditional model only)
        #[arg(short, long, value_delimiter = ',')]
        labels: Vec<i64>,

        /// Batch size when no labels are given
        #[arg(short, long, default_value = "1")]
        batch: usize,

        /// Random seed (optional)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Decode the latent mean instead of sampling
        #[arg(long)]
        eval: bool,
    },

    /// Decode draws from the standard-normal prior
    Generate {
        /// Model variant
        #[arg(short, long, value_enum, default_value = "cvae")]
        model: ModelKind,

        /// Comma-separated class labels (conditional model only)
        #[arg(short, long, value_delimiter = ',')]
        labels: Vec<i64>,

        /// Number of samples when no labels are given
        #[arg(short, long, default_value = "4")]
        count: usize,

        /// Random seed (optional)
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let device = backends::default_device();
    tracing::debug!(backend = backends::backend_name(), "using backend");

    match cli.command {
        Commands::Summary { model, layer } => {
            let text = render_summary::<DefaultBackend>(model, layer.as_deref(), &device)?;
            println!("{text}");
            Ok(())
        }
        Commands::Forward {
            model,
            fill,
            labels,
            batch,
            seed,
            eval,
        } => {
            let mode = if eval { Mode::Evaluation } else { Mode::Training };
            run_forward::<DefaultBackend>(model, fill, labels, batch, seed, mode, &device)
        }
        Commands::Generate {
            model,
            labels,
            count,
            seed,
        } => run_generate::<DefaultBackend>(model, labels, count, seed, &device),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "info,burn_digits=debug,burn_digits_vae=debug,burn_digits_core=trace"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn summarize<B: Backend>(model: ModelKind, device: &B::Device) -> ModelSummary {
    match model {
        ModelKind::Vae => VaeConfig::new().init::<B>(device).summary(),
        ModelKind::Cvae => CvaeConfig::new().init::<B>(device).summary(),
    }
}

/// The full layer table, or one `name  shape  params` line when `layer` is set
fn render_summary<B: Backend>(
    model: ModelKind,
    layer: Option<&str>,
    device: &B::Device,
) -> Result<String> {
    let summary = summarize::<B>(model, device);
    let Some(name) = layer else {
        return Ok(summary.to_string());
    };

    let found = summary.layer(name).with_context(|| {
        let known: Vec<&str> = summary.layers.iter().map(|l| l.name.as_str()).collect();
        format!("no layer `{name}` in {}; known layers: {}", summary.model, known.join(", "))
    })?;
    Ok(format!(
        "{}  {}  {}",
        found.name, found.description, found.num_params
    ))
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Labels for a conditional run: the explicit list, or `0, 1, 2, ...` cycling
/// through the classes for `batch` samples
fn labels_or_cycle(labels: Vec<i64>, batch: usize) -> Vec<i64> {
    if labels.is_empty() {
        (0..batch).map(|i| (i % NUM_CLASSES) as i64).collect()
    } else {
        labels
    }
}

/// Minimum and maximum of a tensor's values
fn value_range<B: Backend, const D: usize>(t: Tensor<B, D>) -> Result<(f32, f32)> {
    let values = t
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("failed to read tensor data: {e:?}"))?;

    Ok(values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        }))
}

fn report<B: Backend, const D: usize>(name: &str, t: Tensor<B, D>) -> Result<()> {
    let dims = t.dims();
    let (lo, hi) = value_range(t).with_context(|| format!("reading {name}"))?;
    println!("{name:<15} {dims:?}  min={lo:.4}  max={hi:.4}");
    Ok(())
}

fn run_forward<B: Backend>(
    model: ModelKind,
    fill: f32,
    labels: Vec<i64>,
    batch: usize,
    seed: Option<u64>,
    mode: Mode,
    device: &B::Device,
) -> Result<()> {
    if !(0.0..=1.0).contains(&fill) {
        bail!("--fill must be in [0, 1], got {fill}");
    }
    let mut rng = make_rng(seed);

    match model {
        ModelKind::Vae => {
            if !labels.is_empty() {
                tracing::warn!("labels are ignored by the plain VAE");
            }
            let vae = VaeConfig::new().with_mode(mode).init::<B>(device);
            tracing::info!(batch, ?mode, "running VAE forward pass");

            let x = Tensor::<B, 2>::ones([batch, IMAGE_PIXELS], device) * fill;
            let (reconstruction, mu, logvar) = vae
                .forward(x, &mut rng)
                .context("VAE forward pass failed")?
                .into_parts();

            report("mu", mu)?;
            report("logvar", logvar)?;
            report("reconstruction", reconstruction)?;
        }
        ModelKind::Cvae => {
            let labels = labels_or_cycle(labels, batch);
            let cvae = CvaeConfig::new().with_mode(mode).init::<B>(device);
            tracing::info!(batch = labels.len(), ?labels, ?mode, "running CVAE forward pass");

            let image =
                Tensor::<B, 4>::ones([labels.len(), 1, IMAGE_SIDE, IMAGE_SIDE], device) * fill;
            let (reconstruction, mu, logvar) = cvae
                .forward(image, &labels, &mut rng)
                .context("CVAE forward pass failed")?
                .into_parts();

            report("mu", mu)?;
            report("logvar", logvar)?;
            report("reconstruction", reconstruction)?;
        }
    }

    Ok(())
}

fn run_generate<B: Backend>(
    model: ModelKind,
    labels: Vec<i64>,
    count: usize,
    seed: Option<u64>,
    device: &B::Device,
) -> Result<()> {
    let mut rng = make_rng(seed);

    match model {
        ModelKind::Vae => {
            let vae = VaeConfig::new().init::<B>(device);
            tracing::info!(count, "decoding prior samples");

            let images = vae
                .generate(count, &mut rng, device)
                .context("VAE generation failed")?;
            report("samples", images)?;
        }
        ModelKind::Cvae => {
            let labels = labels_or_cycle(labels, count);
            let cvae = CvaeConfig::new().init::<B>(device);
            tracing::info!(?labels, "decoding prior samples");

            let images = cvae
                .generate(&labels, &mut rng, device)
                .context("CVAE generation failed")?;
            report("samples", images)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_forward() {
        let cli = Cli::try_parse_from([
            "burn-digits",
            "forward",
            "--model",
            "cvae",
            "--labels",
            "3,7",
            "--seed",
            "1",
            "--eval",
        ])
        .unwrap();

        match cli.command {
            Commands::Forward {
                labels, seed, eval, ..
            } => {
                assert_eq!(labels, vec![3, 7]);
                assert_eq!(seed, Some(1));
                assert!(eval);
            }
            _ => panic!("expected forward command"),
        }
    }

    #[test]
    fn test_labels_or_cycle() {
        assert_eq!(labels_or_cycle(vec![], 12)[10..], [0, 1]);
        assert_eq!(labels_or_cycle(vec![4], 12), vec![4]);
    }

    #[test]
    fn test_summary_totals() {
        let device = backends::default_device();
        assert_eq!(
            summarize::<DefaultBackend>(ModelKind::Vae, &device).total_params(),
            652_824
        );
        assert_eq!(
            summarize::<DefaultBackend>(ModelKind::Cvae, &device).total_params(),
            343_057
        );
    }

    #[test]
    fn test_summary_single_layer() {
        let device = backends::default_device();

        let line = render_summary::<DefaultBackend>(ModelKind::Vae, Some("encoder.fc1"), &device)
            .unwrap();
        assert_eq!(line, "encoder.fc1  Linear(784 -> 400)  314000");

        let err = render_summary::<DefaultBackend>(ModelKind::Cvae, Some("encoder.fc9"), &device)
            .unwrap_err();
        assert!(err.to_string().contains("no layer `encoder.fc9` in CVAE"));
    }

    #[test]
    fn test_forward_rejects_bad_label() {
        let device = backends::default_device();
        let err = run_forward::<DefaultBackend>(
            ModelKind::Cvae,
            0.5,
            vec![12],
            1,
            Some(0),
            Mode::Evaluation,
            &device,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("Invalid label 12"));
    }

    #[test]
    fn test_forward_rejects_bad_fill() {
        let device = backends::default_device();
        assert!(
            run_forward::<DefaultBackend>(
                ModelKind::Vae,
                1.5,
                vec![],
                1,
                None,
                Mode::Training,
                &device
            )
            .is_err()
        );
    }
}

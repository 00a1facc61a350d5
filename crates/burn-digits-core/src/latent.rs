//! Latent sampling with the reparameterization trick
//!
//! The encoder produces the mean and log-variance of a diagonal Gaussian.
//! During training a sample is drawn as `z = mu + exp(0.5 * logvar) * eps`
//! with `eps ~ N(0, 1)`; `eps` enters the graph as a constant, so gradients
//! reach `mu` and `logvar` through a deterministic path. During evaluation
//! the mean is returned as is.
//!
//! Noise comes from an explicit [`rand::Rng`] handle rather than the
//! backend's global generator, so seeded runs are reproducible.

use burn::prelude::*;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::dims::LATENT_DIM;
use crate::error::{ModelError, Result};
use crate::shape::check_nonempty_batch;

/// Behaviour selector for the latent sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Draw a stochastic sample around the mean
    #[default]
    Training,
    /// Return the mean unchanged
    Evaluation,
}

impl Mode {
    pub fn is_training(self) -> bool {
        matches!(self, Mode::Training)
    }

    pub fn from_training(training: bool) -> Self {
        if training {
            Mode::Training
        } else {
            Mode::Evaluation
        }
    }
}

/// Creates a tensor of independent standard-normal draws
pub fn standard_normal<B: Backend, R: Rng + ?Sized, const D: usize>(
    shape: [usize; D],
    rng: &mut R,
    device: &B::Device,
) -> Tensor<B, D> {
    let numel: usize = shape.iter().product();
    let values: Vec<f32> = (0..numel)
        .map(|_| rng.sample::<f32, _>(StandardNormal))
        .collect();

    Tensor::from_data(TensorData::new(values, shape), device)
}

/// Samples `z` from `N(mu, diag(exp(logvar)))`
///
/// # Arguments
///
/// * `mu` - Latent means, `[batch, latent]`
/// * `logvar` - Latent log-variances, same shape as `mu`
/// * `mode` - [`Mode::Training`] samples, [`Mode::Evaluation`] returns `mu`
/// * `rng` - Noise source; untouched in evaluation mode
///
/// # Returns
///
/// Latent sample with the same shape as `mu` in both modes
pub fn reparameterize<B: Backend, R: Rng + ?Sized>(
    mu: Tensor<B, 2>,
    logvar: Tensor<B, 2>,
    mode: Mode,
    rng: &mut R,
) -> Result<Tensor<B, 2>> {
    if mu.dims() != logvar.dims() {
        return Err(ModelError::ShapeMismatch {
            expected: mu.dims().to_vec(),
            actual: logvar.dims().to_vec(),
        });
    }

    match mode {
        Mode::Evaluation => Ok(mu),
        Mode::Training => {
            let std = (logvar * 0.5).exp();
            let eps = standard_normal(std.dims(), rng, &std.device());
            tracing::trace!(shape = ?mu.dims(), "reparameterized latent sample");
            Ok(mu + std * eps)
        }
    }
}

/// Draws `batch` latent vectors from the standard-normal prior: `[batch, 20]`
pub fn sample_prior<B: Backend, R: Rng + ?Sized>(
    batch: usize,
    rng: &mut R,
    device: &B::Device,
) -> Result<Tensor<B, 2>> {
    check_nonempty_batch(batch)?;
    Ok(standard_normal([batch, LATENT_DIM], rng, device))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    type TestBackend = NdArray<f32>;

    fn to_vec(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    fn params(
        device: &<TestBackend as Backend>::Device,
    ) -> (Tensor<TestBackend, 2>, Tensor<TestBackend, 2>) {
        let mu = Tensor::from_floats([[0.5, -1.0, 2.0], [0.0, 0.25, -0.75]], device);
        let logvar = Tensor::from_floats([[0.0, -2.0, 1.0], [0.5, 0.0, -1.0]], device);
        (mu, logvar)
    }

    #[test]
    fn test_mode_default_is_training() {
        assert_eq!(Mode::default(), Mode::Training);
        assert!(Mode::from_training(true).is_training());
        assert!(!Mode::from_training(false).is_training());
    }

    #[test]
    fn test_evaluation_returns_mean() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(0);
        let (mu, logvar) = params(&device);

        let z1 = reparameterize(mu.clone(), logvar.clone(), Mode::Evaluation, &mut rng).unwrap();
        let z2 = reparameterize(mu.clone(), logvar, Mode::Evaluation, &mut rng).unwrap();

        assert_eq!(to_vec(z1.clone()), to_vec(mu));
        assert_eq!(to_vec(z1), to_vec(z2));
    }

    #[test]
    fn test_training_is_stochastic() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(1);
        let (mu, logvar) = params(&device);

        let z1 = reparameterize(mu.clone(), logvar.clone(), Mode::Training, &mut rng).unwrap();
        let z2 = reparameterize(mu.clone(), logvar, Mode::Training, &mut rng).unwrap();

        assert_eq!(z1.dims(), mu.dims());
        assert_ne!(to_vec(z1), to_vec(z2));
    }

    #[test]
    fn test_training_is_reproducible_with_seed() {
        let device = Default::default();
        let (mu, logvar) = params(&device);

        let z1 = reparameterize(
            mu.clone(),
            logvar.clone(),
            Mode::Training,
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap();
        let z2 = reparameterize(mu, logvar, Mode::Training, &mut StdRng::seed_from_u64(42)).unwrap();

        assert_eq!(to_vec(z1), to_vec(z2));
    }

    #[test]
    fn test_training_matches_formula() {
        let device = Default::default();
        let (mu, logvar) = params(&device);

        let eps = to_vec(standard_normal::<TestBackend, _, 2>(
            [2, 3],
            &mut StdRng::seed_from_u64(9),
            &device,
        ));
        let z = to_vec(
            reparameterize(
                mu.clone(),
                logvar.clone(),
                Mode::Training,
                &mut StdRng::seed_from_u64(9),
            )
            .unwrap(),
        );

        let mu = to_vec(mu);
        let logvar = to_vec(logvar);
        for i in 0..z.len() {
            let expected = mu[i] + (0.5 * logvar[i]).exp() * eps[i];
            assert!((z[i] - expected).abs() < 1e-5, "index {i}");
        }
    }

    #[test]
    fn test_mismatched_parameters_rejected() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mu = Tensor::<TestBackend, 2>::zeros([2, 20], &device);
        let logvar = Tensor::<TestBackend, 2>::zeros([2, 19], &device);

        let err = reparameterize(mu, logvar, Mode::Training, &mut rng).unwrap_err();
        assert_eq!(
            err,
            ModelError::ShapeMismatch {
                expected: vec![2, 20],
                actual: vec![2, 19],
            }
        );
    }

    mod gradients {
        use super::*;
        use burn_autodiff::Autodiff;

        type AdBackend = Autodiff<TestBackend>;

        fn tracked(
            device: &<AdBackend as Backend>::Device,
        ) -> (Tensor<AdBackend, 2>, Tensor<AdBackend, 2>) {
            let (mu, logvar) = params(device);
            (
                Tensor::from_data(mu.into_data(), device).require_grad(),
                Tensor::from_data(logvar.into_data(), device).require_grad(),
            )
        }

        #[test]
        fn test_training_gradients_reach_mu_and_logvar() {
            let device = Default::default();
            let (mu, logvar) = tracked(&device);

            let z = reparameterize(
                mu.clone(),
                logvar.clone(),
                Mode::Training,
                &mut StdRng::seed_from_u64(17),
            )
            .unwrap();
            let grads = z.sum().backward();

            let grad_mu = to_vec(mu.grad(&grads).unwrap());
            assert!(grad_mu.iter().all(|&g| (g - 1.0).abs() < 1e-6));

            // dz/dlogvar = 0.5 * exp(0.5 * logvar) * eps, with eps from the same seed
            let eps = to_vec(standard_normal::<TestBackend, _, 2>(
                [2, 3],
                &mut StdRng::seed_from_u64(17),
                &device,
            ));
            let logvar_values = to_vec(logvar.clone().inner());
            let grad_logvar = to_vec(logvar.grad(&grads).unwrap());
            for i in 0..grad_logvar.len() {
                let expected = 0.5 * (0.5 * logvar_values[i]).exp() * eps[i];
                assert!(
                    (grad_logvar[i] - expected).abs() < 1e-5,
                    "index {i}: {} vs {expected}",
                    grad_logvar[i]
                );
            }
        }

        #[test]
        fn test_evaluation_has_no_logvar_gradient() {
            let device = Default::default();
            let (mu, logvar) = tracked(&device);

            let z = reparameterize(
                mu.clone(),
                logvar.clone(),
                Mode::Evaluation,
                &mut StdRng::seed_from_u64(17),
            )
            .unwrap();
            let grads = z.sum().backward();

            let grad_mu = to_vec(mu.grad(&grads).unwrap());
            assert!(grad_mu.iter().all(|&g| (g - 1.0).abs() < 1e-6));

            if let Some(grad_logvar) = logvar.grad(&grads) {
                assert!(to_vec(grad_logvar).iter().all(|&g| g == 0.0));
            }
        }
    }

    #[test]
    fn test_sample_prior_shape() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(3);

        let z = sample_prior::<TestBackend, _>(6, &mut rng, &device).unwrap();
        assert_eq!(z.dims(), [6, LATENT_DIM]);
        assert!(sample_prior::<TestBackend, _>(0, &mut rng, &device).is_err());
    }
}

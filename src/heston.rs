//! Heston Stochastic Volatility Model
//!
//! The variance follows a Cox-Ingersoll-Ross process driven by one Brownian
//! motion, and the price is driven by a second Brownian motion correlated
//! with it:
//!
//! dV_t = a (μ_V - V_t) dt + √V_t dW^V_t
//! dS_t = μ S_t dt + V_t S_t dW^S_t,   Corr(dW^S, dW^V) = ρ
//!
//! Note the price diffusion is scaled by the variance level V_t itself rather
//! than by √V_t as in the textbook model. Changing it would change the
//! distribution of every generated series, so it is kept as is.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::brownian::BrownianMotion;
use crate::error::{Result, SimulationError};
use crate::parameters::{ModelParameters, VarianceScheme};

/// Result of a Heston simulation
#[derive(Debug, Clone, PartialEq)]
pub struct HestonPath {
    /// Price path
    pub prices: Vec<f64>,
    /// Variance path
    pub variances: Vec<f64>,
}

/// Simulates the CIR variance levels used as stochastic volatility
///
/// Draws `all_time` increments N(0, sqrt(Δ)·σ) and iterates the Euler scheme
/// v[i] = v[i-1] + a(μ - v[i-1])Δ + sqrt(v[i-1])·dW[i-1] from v[0] = heston_vol0.
///
/// # Returns
/// `(increments, variances)`, both of length `all_time`. The increments are
/// returned so a correlated price path can be built from them.
///
/// # Errors
/// With [`VarianceScheme::Reject`], a negative level reaching the square root
/// yields [`SimulationError::NegativeSquareRoot`]. With
/// [`VarianceScheme::Truncated`] the level is floored at zero instead.
pub fn cox_ingersoll_ross_heston<R: Rng>(params: &ModelParameters, rng: &mut R) -> Result<(Vec<f64>, Vec<f64>)> {
    let bm = BrownianMotion::new(params.sqrt_delta_sigma())?;
    let brownian = bm.increments(rng, params.all_time);

    let (a, mu) = (params.heston_a, params.heston_mu);
    let mut variances = Vec::with_capacity(params.all_time);
    variances.push(params.heston_vol0);

    let mut clamped = 0usize;
    for i in 1..params.all_time {
        let previous = variances[i - 1];
        let root_arg = match params.variance_scheme {
            VarianceScheme::Reject if previous < 0.0 => {
                return Err(SimulationError::NegativeSquareRoot {
                    context: "CIR variance update",
                    step: i - 1,
                    value: previous,
                });
            }
            VarianceScheme::Reject => previous,
            VarianceScheme::Truncated => {
                if previous < 0.0 {
                    clamped += 1;
                }
                previous.max(0.0)
            }
        };

        let drift = a * (mu - previous) * params.all_delta;
        let randomness = root_arg.sqrt() * brownian[i - 1];
        variances.push(previous + drift + randomness);
    }

    if clamped > 0 {
        warn!(clamped, steps = params.all_time, "variance truncated at zero");
    }
    Ok((brownian, variances))
}

/// Builds a Brownian path correlated with `brownian_motion_one`
///
/// Two-asset special case of the Cholesky method:
/// b2[i] = ρ·b1[i] + sqrt(1 - ρ²)·N(0, sqrt(Δ)), for i in 0..all_time-1.
///
/// The independent draw is not scaled by σ, so the sample correlation of the
/// pair equals ρ only when `brownian_motion_one` has per-step standard
/// deviation sqrt(Δ).
///
/// # Returns
/// `(path_one, path_two)` where `path_two` has `all_time - 1` entries
pub fn heston_construct_correlated_path<R: Rng>(
    params: &ModelParameters,
    brownian_motion_one: Vec<f64>,
    rng: &mut R,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let len = params.all_time.saturating_sub(1);
    if brownian_motion_one.len() < len {
        return Err(SimulationError::DimensionMismatch {
            what: "first Brownian path",
            expected: len,
            actual: brownian_motion_one.len(),
        });
    }

    let rho = params.cir_rho;
    let one_minus_rho_sq = 1.0 - rho * rho;
    if one_minus_rho_sq < 0.0 {
        return Err(SimulationError::NegativeSquareRoot {
            context: "correlated path construction",
            step: 0,
            value: one_minus_rho_sq,
        });
    }
    let independent_weight = one_minus_rho_sq.sqrt();
    let bm = BrownianMotion::new(params.all_delta.sqrt())?;

    let brownian_motion_two = brownian_motion_one[..len]
        .iter()
        .map(|b1| rho * b1 + independent_weight * bm.sample(rng))
        .collect();

    Ok((brownian_motion_one, brownian_motion_two))
}

/// Price levels of an underlying following the Heston process
///
/// Runs the CIR variance process, derives the correlated price Brownian
/// motion from its increments, then iterates
/// p[i] = p[i-1] + μ·p[i-1]·Δ + v[i-1]·p[i-1]·dW^S[i-1] from p[0] = all_s0.
///
/// # Returns
/// `(prices, variances)`, both of length `all_time`
///
/// # Example
/// ```
/// use rand::SeedableRng;
/// use synthetic_market::{heston::heston_model_levels, ModelParameters};
///
/// let params = ModelParameters::default_for(100.0, 500, 1.0 / (252.0 * 24.0));
/// let mut rng = rand::rngs::StdRng::seed_from_u64(42);
/// let (prices, variances) = heston_model_levels(&params, &mut rng).unwrap();
/// assert_eq!(prices[0], 100.0);
/// assert_eq!(prices.len(), variances.len());
/// ```
pub fn heston_model_levels<R: Rng>(params: &ModelParameters, rng: &mut R) -> Result<(Vec<f64>, Vec<f64>)> {
    params.validate()?;

    let (brownian, cir_process) = cox_ingersoll_ross_heston(params, rng)?;
    let (_, brownian_motion_market) = heston_construct_correlated_path(params, brownian, rng)?;

    let mut prices = Vec::with_capacity(params.all_time);
    prices.push(params.all_s0);
    for i in 1..params.all_time {
        let previous = prices[i - 1];
        let drift = params.gbm_mu * previous * params.all_delta;
        let vol = cir_process[i - 1] * previous * brownian_motion_market[i - 1];
        prices.push(previous + drift + vol);
    }

    debug!(
        steps = params.all_time,
        final_price = prices[prices.len() - 1],
        final_variance = cir_process[cir_process.len() - 1],
        "simulated heston path"
    );
    Ok((prices, cir_process))
}

/// Simulates `n_paths` independent Heston paths in parallel
///
/// Path `k` uses its own `StdRng` seeded with `seed + k`, so the output does
/// not depend on how rayon schedules the work.
pub fn heston_model_levels_batch(params: &ModelParameters, n_paths: usize, seed: u64) -> Result<Vec<HestonPath>> {
    (0..n_paths)
        .into_par_iter()
        .map(|k| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(k as u64));
            heston_model_levels(params, &mut rng).map(|(prices, variances)| HestonPath { prices, variances })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::sample_correlation;

    fn test_params() -> ModelParameters {
        ModelParameters::default_for(100.0, 1_000, 1.0 / (252.0 * 24.0))
    }

    #[test]
    fn test_variance_starts_at_vol0() {
        let params = test_params();
        let mut rng = StdRng::seed_from_u64(1);

        let (brownian, variances) = cox_ingersoll_ross_heston(&params, &mut rng).unwrap();

        assert_eq!(brownian.len(), params.all_time);
        assert_eq!(variances.len(), params.all_time);
        assert_eq!(variances[0], params.heston_vol0);
    }

    #[test]
    fn test_variance_mean_reversion() {
        let mut params = test_params();
        params.all_delta = 0.01;
        params.all_time = 2_000;
        params.heston_a = 2.0;
        params.all_sigma = 0.1;
        let mut rng = StdRng::seed_from_u64(2);

        let (_, variances) = cox_ingersoll_ross_heston(&params, &mut rng).unwrap();

        // After 20 years at a = 2 the level sits near the long-run mean
        let tail = &variances[1_000..];
        let mean = tail.iter().sum::<f64>() / tail.len() as f64;
        assert!(
            (mean - params.heston_mu).abs() < 0.05,
            "Mean variance: {}, long-run mean: {}",
            mean,
            params.heston_mu
        );
    }

    #[test]
    fn test_negative_variance_rejected() {
        let mut params = test_params();
        params.heston_vol0 = 0.0;
        params.heston_mu = -1.0;
        params.heston_a = 5.0;
        params.all_delta = 0.1;
        let mut rng = StdRng::seed_from_u64(3);

        let err = cox_ingersoll_ross_heston(&params, &mut rng).unwrap_err();
        assert!(err.is_numerical());
        assert!(matches!(err, SimulationError::NegativeSquareRoot { step: 1, .. }));
    }

    #[test]
    fn test_truncated_scheme_survives_negative_variance() {
        let mut params = test_params().with_variance_scheme(VarianceScheme::Truncated);
        params.heston_vol0 = 0.0;
        params.heston_mu = -1.0;
        params.heston_a = 5.0;
        params.all_delta = 0.1;
        let mut rng = StdRng::seed_from_u64(3);

        let (_, variances) = cox_ingersoll_ross_heston(&params, &mut rng).unwrap();
        assert_eq!(variances.len(), params.all_time);
        assert!(variances.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_correlated_path_length_and_correlation() {
        let mut params = test_params();
        params.all_time = 20_000;
        params.all_sigma = 1.0;
        params.cir_rho = 0.6;
        let mut rng = StdRng::seed_from_u64(4);

        let bm = BrownianMotion::new(params.sqrt_delta_sigma()).unwrap();
        let one = bm.increments(&mut rng, params.all_time);
        let (one, two) = heston_construct_correlated_path(&params, one, &mut rng).unwrap();

        assert_eq!(one.len(), params.all_time);
        assert_eq!(two.len(), params.all_time - 1);

        let corr = sample_correlation(&one, &two);
        assert!((corr - 0.6).abs() < 0.1, "Empirical correlation: {}, expected 0.6", corr);
    }

    #[test]
    fn test_short_first_path_rejected() {
        let params = test_params();
        let mut rng = StdRng::seed_from_u64(5);
        let err = heston_construct_correlated_path(&params, vec![0.0; 10], &mut rng).unwrap_err();
        assert!(matches!(err, SimulationError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_rho_beyond_unit_interval_is_numerical_error() {
        let mut params = test_params();
        params.cir_rho = 1.2;
        let mut rng = StdRng::seed_from_u64(6);
        let err = heston_construct_correlated_path(&params, vec![0.0; 1_000], &mut rng).unwrap_err();
        assert!(err.is_numerical());
    }

    #[test]
    fn test_heston_price_starts_at_s0() {
        let params = test_params();
        let mut rng = StdRng::seed_from_u64(7);

        let (prices, variances) = heston_model_levels(&params, &mut rng).unwrap();

        assert_eq!(prices[0], params.all_s0);
        assert_eq!(prices.len(), params.all_time);
        assert_eq!(variances.len(), params.all_time);
        assert!(prices.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_zero_sigma_keeps_path_near_s0() {
        let mut params = test_params();
        params.all_sigma = 0.0;
        let mut rng = StdRng::seed_from_u64(8);

        let (prices, _) = heston_model_levels(&params, &mut rng).unwrap();

        // The variance path is deterministic but the independent part of the
        // price noise is still sqrt(Δ)-scaled.
        let last = prices[prices.len() - 1];
        assert!((last - 100.0).abs() < 10.0, "final price {}", last);
    }

    #[test]
    fn test_batch_is_reproducible() {
        let params = ModelParameters::default_for(100.0, 200, 1.0 / (252.0 * 24.0));

        let first = heston_model_levels_batch(&params, 8, 99).unwrap();
        let second = heston_model_levels_batch(&params, 8, 99).unwrap();

        assert_eq!(first.len(), 8);
        assert_eq!(first, second);
        assert_ne!(first[0].prices, first[1].prices);
    }
}

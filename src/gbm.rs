//! Geometric Brownian Motion (GBM)
//!
//! dS_t = μ S_t dt + σ S_t dW_t
//!
//! Paths are built in log-return space: each step adds
//! (μ - σ²/2)Δ + σ√Δ Z and prices are recovered by compounding.

use rand::Rng;

use crate::brownian::BrownianMotion;
use crate::error::Result;
use crate::parameters::ModelParameters;

/// Driftless Brownian log-returns N(0, sqrt(Δ)·σ), one per step.
pub fn brownian_motion_log_returns<R: Rng>(params: &ModelParameters, rng: &mut R) -> Result<Vec<f64>> {
    let bm = BrownianMotion::new(params.sqrt_delta_sigma())?;
    Ok(bm.increments(rng, params.all_time))
}

/// GBM log-returns: Brownian log-returns plus the Itô-corrected drift.
///
/// # Returns
/// `all_time` log-returns
pub fn geometric_brownian_motion_log_returns<R: Rng>(
    params: &ModelParameters,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let drift = (params.gbm_mu - 0.5 * params.all_sigma * params.all_sigma) * params.all_delta;
    let mut log_returns = brownian_motion_log_returns(params, rng)?;
    for r in log_returns.iter_mut() {
        *r += drift;
    }
    Ok(log_returns)
}

/// Converts log-returns into gross returns exp(r).
pub fn convert_to_returns(log_returns: &[f64]) -> Vec<f64> {
    log_returns.iter().map(|r| r.exp()).collect()
}

/// Compounds log-returns into a price sequence starting at `all_s0`
///
/// The output has the same length as the input: the first price is S_0 and
/// price i is price i-1 times exp(log_returns[i-1]), so the final log-return
/// is not consumed.
pub fn convert_to_prices(params: &ModelParameters, log_returns: &[f64]) -> Vec<f64> {
    let mut prices = Vec::with_capacity(log_returns.len());
    if log_returns.is_empty() {
        return prices;
    }
    prices.push(params.all_s0);

    let mut current = params.all_s0;
    for gross in convert_to_returns(&log_returns[..log_returns.len() - 1]) {
        current *= gross;
        prices.push(current);
    }
    prices
}

/// GBM price levels of length `all_time`.
pub fn geometric_brownian_motion_levels<R: Rng>(params: &ModelParameters, rng: &mut R) -> Result<Vec<f64>> {
    let log_returns = geometric_brownian_motion_log_returns(params, rng)?;
    Ok(convert_to_prices(params, &log_returns))
}

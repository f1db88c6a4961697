//! Merton Jump-Diffusion Model
//!
//! Extends GBM with random jumps in log-return space:
//! d ln S_t = (μ - σ²/2) dt + σ dW_t + dJ_t
//!
//! where J_t is a compound Poisson process with normal jump sizes.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::brownian::poisson_arrival_times;
use crate::error::{Result, SimulationError};
use crate::gbm::{convert_to_prices, geometric_brownian_motion_log_returns};
use crate::parameters::ModelParameters;

/// Locates the step whose window [j·Δ, (j+1)·Δ] contains `arrival·Δ`.
///
/// Δ scales both sides of the comparison, so the window index is found in
/// step units. Boundary instants belong to the earlier window; arrivals
/// beyond the last window return `None`.
fn jump_step(arrival: f64, steps: usize) -> Option<usize> {
    let j = (arrival.ceil() as usize).saturating_sub(1);
    (j < steps).then_some(j)
}

/// Produces the jump sizes of a compound Poisson process, one slot per step
///
/// Arrival times are measured in steps, so `lamda` is the expected number of
/// jumps per step. Every arrival adds one N(jumps_mu, jumps_sigma) draw to
/// its step; several arrivals in one step accumulate.
///
/// # Returns
/// `all_time` jump sizes, mostly zero when jumps are infrequent
///
/// # Errors
/// [`SimulationError::NonPositiveIntensity`] when `lamda` is not positive,
/// [`SimulationError::InvalidParameter`] for a negative `jumps_sigma`.
pub fn jump_diffusion_process<R: Rng>(params: &ModelParameters, rng: &mut R) -> Result<Vec<f64>> {
    if !(params.jumps_sigma.is_finite() && params.jumps_sigma >= 0.0) {
        return Err(SimulationError::invalid(
            "jumps_sigma",
            format!("must be finite and non-negative, got {}", params.jumps_sigma),
        ));
    }
    let normal_j = Normal::new(params.jumps_mu, params.jumps_sigma)
        .map_err(|e| SimulationError::invalid("jumps_sigma", e.to_string()))?;

    let horizon = params.all_time as f64;
    let arrivals = poisson_arrival_times(rng, params.lamda, horizon)?;

    let mut jump_sizes = vec![0.0; params.all_time];
    for arrival in &arrivals {
        if let Some(j) = jump_step(*arrival, params.all_time) {
            jump_sizes[j] += normal_j.sample(rng);
        }
    }

    debug!(arrivals = arrivals.len(), steps = params.all_time, "simulated jump arrivals");
    Ok(jump_sizes)
}

/// GBM log-returns with independent jumps added element-wise.
pub fn geometric_brownian_motion_jump_diffusion_log_returns<R: Rng>(
    params: &ModelParameters,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let jumps = jump_diffusion_process(params, rng)?;
    let diffusion = geometric_brownian_motion_log_returns(params, rng)?;
    Ok(jumps.iter().zip(diffusion.iter()).map(|(j, d)| j + d).collect())
}

/// Price levels of a GBM path that can jump at any step.
pub fn geometric_brownian_motion_jump_diffusion_levels<R: Rng>(
    params: &ModelParameters,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let log_returns = geometric_brownian_motion_jump_diffusion_log_returns(params, rng)?;
    Ok(convert_to_prices(params, &log_returns))
}

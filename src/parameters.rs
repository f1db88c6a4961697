//! Model parameters shared by every stochastic process in the crate
//!
//! A single [`ModelParameters`] value carries the coefficients for the GBM
//! base process, the Merton jump component and the Heston/CIR pair, so one
//! configuration can drive any of the simulators.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// How the CIR variance update treats a negative variance level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceScheme {
    /// Plain Euler scheme; a negative level under the square root is an error.
    #[default]
    Reject,
    /// Full truncation: the level is floored at zero before the square root.
    Truncated,
}

/// Coefficients for the GBM, jump-diffusion and Heston simulators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Initial price level S_0
    pub all_s0: f64,
    /// Number of discrete simulation steps
    pub all_time: usize,
    /// Year fraction covered by one step
    pub all_delta: f64,
    /// Volatility of the GBM and jump base process
    pub all_sigma: f64,
    /// Drift of the GBM component
    pub gbm_mu: f64,
    /// Jump arrival intensity, in jumps per step
    #[serde(alias = "lambda")]
    pub lamda: f64,
    /// Mean of the log jump size
    pub jumps_mu: f64,
    /// Standard deviation of the log jump size
    pub jumps_sigma: f64,
    /// Mean reversion speed of the variance process
    pub heston_a: f64,
    /// Long-run variance level
    pub heston_mu: f64,
    /// Initial variance level
    pub heston_vol0: f64,
    /// Correlation between the variance and price Brownian motions
    pub cir_rho: f64,
    #[serde(default)]
    pub variance_scheme: VarianceScheme,
}

impl ModelParameters {
    /// Baseline coefficients used when the caller supplies none.
    ///
    /// # Arguments
    /// * `base_price` - Initial price level
    /// * `times` - Number of simulation steps
    /// * `delta` - Year fraction per step
    ///
    /// # Example
    /// ```
    /// use synthetic_market::ModelParameters;
    ///
    /// let params = ModelParameters::default_for(100.0, 1440, 1.0 / (252.0 * 24.0));
    /// assert_eq!(params.all_time, 1440);
    /// ```
    pub fn default_for(base_price: f64, times: usize, delta: f64) -> Self {
        Self {
            all_s0: base_price,
            all_time: times,
            all_delta: delta,
            all_sigma: 0.125,
            gbm_mu: 0.058,
            lamda: 0.00125,
            jumps_mu: -0.2,
            jumps_sigma: 0.001,
            heston_a: 0.25,
            heston_mu: 0.35,
            heston_vol0: 0.06125,
            cir_rho: 0.5,
            variance_scheme: VarianceScheme::Reject,
        }
    }

    /// Draws a randomized parameter set around the baseline.
    ///
    /// Useful for producing a variety of market regimes from one seed.
    pub fn random<R: Rng>(base_price: f64, times: usize, delta: f64, rng: &mut R) -> Self {
        Self {
            all_sigma: rng.gen_range(0.1..=0.8),
            gbm_mu: rng.gen_range(-0.3..=0.6),
            lamda: rng.gen_range(0.0071..=0.6),
            jumps_mu: rng.gen_range(-0.2..=0.2),
            jumps_sigma: rng.gen_range(0.001..=0.04),
            heston_a: rng.gen_range(1.0..=5.0),
            heston_mu: rng.gen_range(0.156..=0.693),
            ..Self::default_for(base_price, times, delta)
        }
    }

    /// Returns a copy using the given variance scheme.
    pub fn with_variance_scheme(mut self, scheme: VarianceScheme) -> Self {
        self.variance_scheme = scheme;
        self
    }

    /// Checks the invariants every simulator relies on.
    ///
    /// The jump intensity is checked separately by the jump-diffusion
    /// engine, since the Heston model never divides by it.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("all_s0", self.all_s0.is_finite() && self.all_s0 > 0.0, "must be positive", self.all_s0),
            ("all_delta", self.all_delta.is_finite() && self.all_delta > 0.0, "must be positive", self.all_delta),
            ("all_sigma", self.all_sigma.is_finite() && self.all_sigma >= 0.0, "must be non-negative", self.all_sigma),
            ("jumps_sigma", self.jumps_sigma.is_finite() && self.jumps_sigma >= 0.0, "must be non-negative", self.jumps_sigma),
            ("cir_rho", (-1.0..=1.0).contains(&self.cir_rho), "must lie in [-1, 1]", self.cir_rho),
            ("gbm_mu", self.gbm_mu.is_finite(), "must be finite", self.gbm_mu),
            ("jumps_mu", self.jumps_mu.is_finite(), "must be finite", self.jumps_mu),
            ("heston_a", self.heston_a.is_finite(), "must be finite", self.heston_a),
            ("heston_mu", self.heston_mu.is_finite(), "must be finite", self.heston_mu),
            ("heston_vol0", self.heston_vol0.is_finite(), "must be finite", self.heston_vol0),
        ];
        if self.all_time < 2 {
            return Err(SimulationError::invalid(
                "all_time",
                format!("must be at least 2, got {}", self.all_time),
            ));
        }
        for (field, ok, rule, value) in checks {
            if !ok {
                return Err(SimulationError::invalid(field, format!("{}, got {}", rule, value)));
            }
        }
        Ok(())
    }

    /// sqrt(Δ)·σ, the standard deviation of one Brownian increment.
    pub fn sqrt_delta_sigma(&self) -> f64 {
        self.all_delta.sqrt() * self.all_sigma
    }
}

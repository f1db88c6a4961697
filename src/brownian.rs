//! Brownian and jump-arrival primitives
//!
//! Independent-draw generators that every simulator builds on: scaled
//! Gaussian increments, the Gaussian noise used for volumes, and Poisson
//! arrival times generated from exponential inter-arrival gaps.

use rand::Rng;
use rand_distr::{Distribution, Normal, Open01};

use crate::error::{Result, SimulationError};

/// Generator of independent Brownian increments N(0, scale)
///
/// The scale is the standard deviation of one increment, typically
/// sqrt(Δ)·σ for a process with volatility σ and step Δ.
#[derive(Debug, Clone)]
pub struct BrownianMotion {
    /// Standard deviation of one increment
    pub scale: f64,
    normal: Normal<f64>,
}

impl BrownianMotion {
    /// Creates a generator with the given increment standard deviation
    ///
    /// # Example
    /// ```
    /// use synthetic_market::BrownianMotion;
    /// use rand::SeedableRng;
    ///
    /// let bm = BrownianMotion::new(0.01).unwrap();
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    /// assert_eq!(bm.increments(&mut rng, 100).len(), 100);
    /// ```
    pub fn new(scale: f64) -> Result<Self> {
        if !(scale.is_finite() && scale >= 0.0) {
            return Err(SimulationError::invalid(
                "scale",
                format!("must be finite and non-negative, got {}", scale),
            ));
        }
        let normal = Normal::new(0.0, scale).map_err(|e| {
            SimulationError::invalid("scale", format!("{} (got {})", e, scale))
        })?;
        Ok(Self { scale, normal })
    }

    /// Draws a single increment.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        self.normal.sample(rng)
    }

    /// Draws `n` independent increments.
    pub fn increments<R: Rng>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.normal.sample(rng)).collect()
    }
}

/// Gaussian noise on the interval [0, t]
///
/// Sampling `n` values yields increments with standard deviation sqrt(t / n),
/// so `GaussianNoise::new(n as f64).sample(rng, n)` gives unit-variance draws.
#[derive(Debug, Clone, Copy)]
pub struct GaussianNoise {
    /// Length of the time interval
    pub t: f64,
}

impl GaussianNoise {
    pub fn new(t: f64) -> Self {
        Self { t }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R, n: usize) -> Result<Vec<f64>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let bm = BrownianMotion::new((self.t / n as f64).sqrt())?;
        Ok(bm.increments(rng, n))
    }
}

/// Poisson arrival times on [0, horizon] with the given intensity
///
/// Gaps are drawn as -(1/λ)·ln(U), U ~ Uniform(0, 1). Arrivals strictly past
/// the horizon are not returned.
///
/// # Errors
/// [`SimulationError::NonPositiveIntensity`] when `lamda` is not a positive
/// finite number.
pub fn poisson_arrival_times<R: Rng>(rng: &mut R, lamda: f64, horizon: f64) -> Result<Vec<f64>> {
    if !(lamda.is_finite() && lamda > 0.0) {
        return Err(SimulationError::NonPositiveIntensity { lamda });
    }
    let small_lamda = -1.0 / lamda;

    let mut arrivals = Vec::new();
    let mut s = 0.0;
    while s < horizon {
        // Open01 keeps ln(U) finite
        let u: f64 = Open01.sample(rng);
        s += small_lamda * u.ln();
        if s <= horizon {
            arrivals.push(s);
        }
    }
    Ok(arrivals)
}

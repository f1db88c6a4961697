//! # Synthetic Market Data
//!
//! Stochastic-process generators for artificial price and volume series,
//! resampled into OHLCV bars.
//!
//! ## Modules
//!
//! - [`parameters`] - Model coefficients shared by all processes
//! - [`brownian`] - Brownian increments, Gaussian noise and Poisson arrivals
//! - [`gbm`](mod@gbm) - Geometric Brownian Motion log-returns and price levels
//! - [`jump_diffusion`] - Merton jump-diffusion
//! - [`heston`](mod@heston) - CIR variance process and Heston price integrator
//! - [`correlation`] - Cholesky-correlated Brownian baskets
//! - [`time_frame`] - Bar durations and time-scale conversion
//! - [`resample`] - Per-minute series to OHLCV bars
//! - [`simulation`] - High-level `heston`, `gbm` and `merton` generators
//! - [`config`] - Layered file and environment settings for the CLI
//!
//! Every sampling function takes an explicit random number generator, so
//! runs are reproducible from a seed and safe to execute in parallel.
//!
//! ## Example
//!
//! ```rust
//! use rand::SeedableRng;
//! use synthetic_market::{heston, SimulationRequest};
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let request = SimulationRequest::new(100.0, 1000.0, "2020-01-01", 24, "1h");
//!
//! let frame = heston(&request, &mut rng).unwrap();
//! for bar in &frame.bars {
//!     assert!(bar.low <= bar.open && bar.open <= bar.high);
//! }
//! ```

pub mod brownian;
pub mod config;
pub mod correlation;
pub mod error;
pub mod gbm;
pub mod heston;
pub mod jump_diffusion;
pub mod parameters;
pub mod resample;
pub mod simulation;
pub mod time_frame;

pub use brownian::{BrownianMotion, GaussianNoise};
pub use config::SimulatorConfig;
pub use correlation::{get_correlated_geometric_brownian_motions, sample_correlation, CholeskyFactor, CorrelationMatrix};
pub use error::{Result, SimulationError};
pub use heston::HestonPath;
pub use parameters::{ModelParameters, VarianceScheme};
pub use resample::{resample_ohlcv, Bar, BarFrame};
pub use simulation::{gbm, generate, heston, merton, PriceModel, SimulationRequest};
pub use time_frame::{get_delta, scale_times_to_generate, TimeFrame, TimeUnit};

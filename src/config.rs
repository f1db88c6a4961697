//! Layered settings for the command-line generator
//!
//! Sources in increasing precedence: defaults, an optional file, then
//! `SYNTH_` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::parameters::VarianceScheme;
use crate::simulation::{PriceModel, SimulationRequest};

/// Settings for a generator run
///
/// Loaded from an optional TOML/JSON/YAML file and then from environment
/// variables prefixed with `SYNTH`, nested with `__`
/// (e.g. `SYNTH_REQUEST__TIME_FRAME=15min`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub model: PriceModel,
    /// RNG seed; a random seed is drawn when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Overrides the scheme of default or supplied parameters when set
    #[serde(default)]
    pub variance_scheme: Option<VarianceScheme>,
    #[serde(default)]
    pub request: SimulationRequest,
}

impl SimulatorConfig {
    /// Loads configuration from environment variables only.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(None)
    }

    /// Loads configuration from a file, then environment overrides.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::build(Some(path.as_ref()))
    }

    fn build(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder
            .add_source(
                Environment::with_prefix("SYNTH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

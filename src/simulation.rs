//! High-level generators producing OHLCV bar tables
//!
//! Every model runs on one-minute steps covering the requested number of
//! bars, perturbs a base volume with Gaussian noise, and resamples both
//! series into bars of the requested time frame.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::brownian::GaussianNoise;
use crate::error::{Result, SimulationError};
use crate::gbm::geometric_brownian_motion_levels;
use crate::heston::heston_model_levels;
use crate::jump_diffusion::geometric_brownian_motion_jump_diffusion_levels;
use crate::parameters::ModelParameters;
use crate::resample::{resample_ohlcv, BarFrame};
use crate::time_frame::TimeFrame;

/// Price process driving a generated series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceModel {
    #[default]
    Heston,
    Gbm,
    Merton,
}

impl PriceModel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heston => "heston",
            Self::Gbm => "gbm",
            Self::Merton => "merton",
        }
    }

    fn price_levels<R: Rng>(self, params: &ModelParameters, rng: &mut R) -> Result<Vec<f64>> {
        match self {
            Self::Heston => heston_model_levels(params, rng).map(|(prices, _)| prices),
            Self::Gbm => {
                params.validate()?;
                geometric_brownian_motion_levels(params, rng)
            }
            Self::Merton => {
                params.validate()?;
                geometric_brownian_motion_jump_diffusion_levels(params, rng)
            }
        }
    }
}

impl Display for PriceModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceModel {
    type Err = SimulationError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "heston" => Ok(Self::Heston),
            "gbm" => Ok(Self::Gbm),
            "merton" => Ok(Self::Merton),
            other => Err(SimulationError::invalid(
                "model",
                format!("unknown model '{}', expected heston, gbm or merton", other),
            )),
        }
    }
}

/// Inputs of a generated OHLCV series
///
/// Missing fields deserialize to the values of [`SimulationRequest::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationRequest {
    pub base_price: f64,
    pub base_volume: f64,
    pub start_date: String,
    pub start_date_format: String,
    /// Number of output bars
    pub times_to_generate: usize,
    pub time_frame: String,
    /// Overrides the default coefficients when present
    pub params: Option<ModelParameters>,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            base_price: 1.0,
            base_volume: 1.0,
            start_date: "2010-01-01".to_string(),
            start_date_format: "%Y-%m-%d".to_string(),
            times_to_generate: 1000,
            time_frame: "1h".to_string(),
            params: None,
        }
    }
}

impl SimulationRequest {
    pub fn new(base_price: f64, base_volume: f64, start_date: &str, times_to_generate: usize, time_frame: &str) -> Self {
        Self {
            base_price,
            base_volume,
            start_date: start_date.to_string(),
            times_to_generate,
            time_frame: time_frame.to_string(),
            ..Self::default()
        }
    }

    pub fn with_params(mut self, params: ModelParameters) -> Self {
        self.params = Some(params);
        self
    }
}

/// Parses a start date, accepting date-only formats as midnight.
pub fn parse_start_date(value: &str, format: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, format)
        .or_else(|_| NaiveDate::parse_from_str(value, format).map(|d| d.and_time(NaiveTime::MIN)))
        .map_err(|_| SimulationError::InvalidStartDate {
            value: value.to_string(),
            format: format.to_string(),
        })
}

/// Generates an OHLCV series with the given price model
///
/// Steps:
/// 1. derive Δ and the number of one-minute steps from the time frame
/// 2. build default parameters unless the request carries some
/// 3. simulate the per-minute price path
/// 4. add N(0, 1) noise to the base volume
/// 5. take absolute values of prices and volumes
/// 6. resample to `times_to_generate` bars starting at `start_date`
///
/// # Errors
/// Configuration errors for a bad time frame, start date or bar count, and
/// any numerical error raised by the price model.
pub fn generate<R: Rng>(model: PriceModel, request: &SimulationRequest, rng: &mut R) -> Result<BarFrame> {
    if request.times_to_generate < 1 {
        return Err(SimulationError::NothingToGenerate {
            value: request.times_to_generate,
        });
    }
    let time_frame: TimeFrame = request.time_frame.parse()?;
    let start = parse_start_date(&request.start_date, &request.start_date_format)?;

    let delta = time_frame.delta();
    let steps = time_frame.scale_times_to_generate(request.times_to_generate)?;

    let params = match &request.params {
        Some(params) => params.clone(),
        None => ModelParameters::default_for(request.base_price, steps, delta),
    };
    if params.all_time != steps {
        return Err(SimulationError::DimensionMismatch {
            what: "all_time for requested bars",
            expected: steps,
            actual: params.all_time,
        });
    }

    debug!(model = %model, steps, delta, "generating minute path");
    let prices: Vec<f64> = model.price_levels(&params, rng)?.into_iter().map(f64::abs).collect();

    let noise = GaussianNoise::new(steps as f64).sample(rng, steps)?;
    let volumes: Vec<f64> = noise.iter().map(|n| (n + request.base_volume).abs()).collect();

    let frame = resample_ohlcv(start, &prices, &volumes, time_frame)?;
    info!(model = %model, bars = frame.len(), time_frame = %time_frame, "generated synthetic series");
    Ok(frame)
}

/// OHLCV series following the Heston stochastic volatility model.
///
/// # Example
/// ```
/// use rand::SeedableRng;
/// use synthetic_market::{heston, SimulationRequest};
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let request = SimulationRequest::new(100.0, 1000.0, "2020-01-01", 24, "1h");
/// let frame = heston(&request, &mut rng).unwrap();
/// assert_eq!(frame.len(), 24);
/// ```
pub fn heston<R: Rng>(request: &SimulationRequest, rng: &mut R) -> Result<BarFrame> {
    generate(PriceModel::Heston, request, rng)
}

/// OHLCV series following geometric Brownian motion.
pub fn gbm<R: Rng>(request: &SimulationRequest, rng: &mut R) -> Result<BarFrame> {
    generate(PriceModel::Gbm, request, rng)
}

/// OHLCV series following Merton jump-diffusion.
pub fn merton<R: Rng>(request: &SimulationRequest, rng: &mut R) -> Result<BarFrame> {
    generate(PriceModel::Merton, request, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn hourly_request() -> SimulationRequest {
        SimulationRequest::new(100.0, 1000.0, "2020-01-01", 24, "1h")
    }

    #[test]
    fn test_heston_hourly_bars() {
        let mut rng = StdRng::seed_from_u64(2020);
        let frame = heston(&hourly_request(), &mut rng).unwrap();

        assert_eq!(frame.len(), 24);
        assert_eq!(frame.time_frame, TimeFrame::ONE_HOUR);

        let start = parse_start_date("2020-01-01", "%Y-%m-%d").unwrap();
        for (k, bar) in frame.bars.iter().enumerate() {
            assert_eq!(bar.timestamp, start + Duration::hours(k as i64));
            assert!(bar.low <= bar.open && bar.open <= bar.high, "bar {}: {:?}", k, bar);
            assert!(bar.low <= bar.close && bar.close <= bar.high, "bar {}: {:?}", k, bar);
            assert!(bar.volume > 0.0);
        }
        assert!(frame.bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_minute_bars_are_flat() {
        let mut rng = StdRng::seed_from_u64(1);
        let request = SimulationRequest::new(50.0, 10.0, "2021-06-01", 30, "1min");
        let frame = heston(&request, &mut rng).unwrap();

        assert_eq!(frame.len(), 30);
        assert!(frame
            .bars
            .iter()
            .all(|b| b.open == b.high && b.high == b.low && b.low == b.close));
    }

    #[test]
    fn test_first_open_is_base_price() {
        let mut rng = StdRng::seed_from_u64(3);
        let frame = gbm(&hourly_request(), &mut rng).unwrap();
        assert_eq!(frame.bars[0].open, 100.0);
    }

    #[test]
    fn test_merton_and_gbm_produce_requested_bars() {
        let mut rng = StdRng::seed_from_u64(4);
        let request = SimulationRequest::new(20.0, 500.0, "2019-03-04", 5, "1d");

        assert_eq!(merton(&request, &mut rng).unwrap().len(), 5);
        assert_eq!(gbm(&request, &mut rng).unwrap().len(), 5);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let a = heston(&hourly_request(), &mut StdRng::seed_from_u64(9)).unwrap();
        let b = heston(&hourly_request(), &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_explicit_params_override_defaults() {
        let mut params = ModelParameters::default_for(250.0, 24 * 60, TimeFrame::ONE_HOUR.delta());
        params.gbm_mu = 0.0;
        let request = hourly_request().with_params(params);
        let frame = heston(&request, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(frame.bars[0].open, 250.0);
    }

    #[test]
    fn test_params_must_cover_requested_span() {
        let params = ModelParameters::default_for(100.0, 10, TimeFrame::ONE_HOUR.delta());
        let request = hourly_request().with_params(params);
        let err = heston(&request, &mut StdRng::seed_from_u64(5)).unwrap_err();
        assert!(matches!(err, SimulationError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_configuration_errors() {
        let mut rng = StdRng::seed_from_u64(6);

        let mut request = hourly_request();
        request.time_frame = "1M".to_string();
        assert!(matches!(heston(&request, &mut rng), Err(SimulationError::InvalidTimeFrame { .. })));

        let mut request = hourly_request();
        request.times_to_generate = 0;
        assert!(matches!(heston(&request, &mut rng), Err(SimulationError::NothingToGenerate { .. })));

        let mut request = hourly_request();
        request.start_date = "01/02/2020".to_string();
        assert!(matches!(heston(&request, &mut rng), Err(SimulationError::InvalidStartDate { .. })));

        let mut request = hourly_request();
        request.times_to_generate = usize::MAX / 2;
        assert!(matches!(heston(&request, &mut rng), Err(SimulationError::InvalidParameter { .. })));
    }

    #[test]
    fn test_start_date_with_time_format() {
        let start = parse_start_date("2020-01-01 09:30", "%Y-%m-%d %H:%M").unwrap();
        assert_eq!(start.to_string(), "2020-01-01 09:30:00");

        let mut request = hourly_request();
        request.start_date = "2020-01-01 09:30".to_string();
        request.start_date_format = "%Y-%m-%d %H:%M".to_string();
        let frame = heston(&request, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(frame.bars[0].timestamp, start);
    }

    #[test]
    fn test_request_fills_missing_fields() {
        let request: SimulationRequest =
            serde_json::from_str(r#"{"base_price": 42.0, "time_frame": "15min"}"#).unwrap();
        assert_eq!(request.base_price, 42.0);
        assert_eq!(request.time_frame, "15min");
        assert_eq!(request.start_date_format, "%Y-%m-%d");
        assert_eq!(request.times_to_generate, 1000);
        assert!(request.params.is_none());
    }

    #[test]
    fn test_model_names_parse() {
        assert_eq!("Heston".parse::<PriceModel>().unwrap(), PriceModel::Heston);
        assert_eq!("merton".parse::<PriceModel>().unwrap(), PriceModel::Merton);
        assert!("ou".parse::<PriceModel>().is_err());
    }
}

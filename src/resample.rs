//! Per-minute series to OHLCV bars
//!
//! Buckets are anchored at the start timestamp: bucket k covers minutes
//! [k·m, (k+1)·m) of the series, where m is the bar length in minutes.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::time_frame::TimeFrame;

/// OHLCV bar keyed by the start of its bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    fn opening(timestamp: NaiveDateTime, price: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    fn update(&mut self, price: f64, volume: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.volume += volume;
    }
}

/// Bars at one time frame, ordered by strictly increasing timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarFrame {
    pub time_frame: TimeFrame,
    pub bars: Vec<Bar>,
}

impl BarFrame {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Resamples one-minute prices and volumes into bars of `time_frame`
///
/// Open, high, low and close are the first, max, min and last price of each
/// bucket; volume is summed. A trailing partial bucket is kept.
///
/// # Errors
/// - [`SimulationError::DimensionMismatch`] when prices and volumes differ in length
/// - [`SimulationError::InvalidTimeFrame`] for a zero-length bar
pub fn resample_ohlcv(
    start: NaiveDateTime,
    prices: &[f64],
    volumes: &[f64],
    time_frame: TimeFrame,
) -> Result<BarFrame> {
    if prices.len() != volumes.len() {
        return Err(SimulationError::DimensionMismatch {
            what: "volume series",
            expected: prices.len(),
            actual: volumes.len(),
        });
    }

    let per_bar = time_frame.minutes();
    if per_bar == 0 {
        return Err(SimulationError::InvalidTimeFrame {
            value: time_frame.to_string(),
        });
    }
    let bars = prices
        .chunks(per_bar)
        .zip(volumes.chunks(per_bar))
        .enumerate()
        .map(|(k, (bucket_prices, bucket_volumes))| {
            let timestamp = start + Duration::minutes((k * per_bar) as i64);
            let mut bar = Bar::opening(timestamp, bucket_prices[0], bucket_volumes[0]);
            for (&price, &volume) in bucket_prices.iter().zip(bucket_volumes).skip(1) {
                bar.update(price, volume);
            }
            bar
        })
        .collect();

    Ok(BarFrame { time_frame, bars })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_frame::TimeUnit;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_buckets_aggregate_ohlcv() {
        let prices = [3.0, 5.0, 1.0, 4.0, 2.0, 2.5];
        let volumes = [1.0; 6];
        let frame = resample_ohlcv(start(), &prices, &volumes, TimeFrame::new(3, TimeUnit::Minute)).unwrap();

        assert_eq!(frame.len(), 2);
        let first = &frame.bars[0];
        assert_eq!((first.open, first.high, first.low, first.close), (3.0, 5.0, 1.0, 1.0));
        assert_eq!(first.volume, 3.0);
        let second = &frame.bars[1];
        assert_eq!((second.open, second.high, second.low, second.close), (4.0, 4.0, 2.0, 2.5));
        assert_eq!(second.timestamp, start() + Duration::minutes(3));
    }

    #[test]
    fn test_one_minute_bars_are_flat() {
        let prices = [10.0, 11.0, 9.5, 10.2];
        let volumes = [5.0, 6.0, 7.0, 8.0];
        let frame = resample_ohlcv(start(), &prices, &volumes, TimeFrame::ONE_MINUTE).unwrap();

        assert_eq!(frame.len(), 4);
        for (bar, (&price, &volume)) in frame.bars.iter().zip(prices.iter().zip(volumes.iter())) {
            assert_eq!(bar.open, price);
            assert_eq!(bar.high, price);
            assert_eq!(bar.low, price);
            assert_eq!(bar.close, price);
            assert_eq!(bar.volume, volume);
        }
    }

    #[test]
    fn test_partial_trailing_bucket_kept() {
        let frame = resample_ohlcv(start(), &[1.0; 90], &[1.0; 90], TimeFrame::ONE_HOUR).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.bars[1].volume, 30.0);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = resample_ohlcv(start(), &[1.0; 3], &[1.0; 2], TimeFrame::ONE_MINUTE).unwrap_err();
        assert!(matches!(err, SimulationError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_empty_series_gives_empty_frame() {
        let frame = resample_ohlcv(start(), &[], &[], TimeFrame::ONE_HOUR).unwrap();
        assert!(frame.is_empty());
    }
}

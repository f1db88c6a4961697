//! Bar durations and their conversion to simulation time
//!
//! A bar of `n` units spans `n · minutes(unit)` one-minute simulation steps,
//! and one step advances the year fraction Δ of the bar on a 252-day
//! trading calendar.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SimulationError};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const WEEKS_PER_YEAR: f64 = 52.0;

/// Unit of a bar duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Minute,
    Hour,
    Day,
    Week,
}

impl TimeUnit {
    pub const fn minutes(self) -> usize {
        match self {
            Self::Minute => 1,
            Self::Hour => 60,
            Self::Day => 60 * 24,
            Self::Week => 60 * 24 * 7,
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            Self::Minute => "min",
            Self::Hour => "h",
            Self::Day => "d",
            Self::Week => "w",
        }
    }
}

/// Bar duration such as `1min`, `15min`, `1h` or `1d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeFrame {
    pub count: usize,
    pub unit: TimeUnit,
}

impl TimeFrame {
    pub const ONE_MINUTE: Self = Self::new(1, TimeUnit::Minute);
    pub const ONE_HOUR: Self = Self::new(1, TimeUnit::Hour);
    pub const ONE_DAY: Self = Self::new(1, TimeUnit::Day);

    pub const fn new(count: usize, unit: TimeUnit) -> Self {
        Self { count, unit }
    }

    /// Number of one-minute simulation steps in one bar.
    ///
    /// Saturates for counts built by hand past `usize::MAX` minutes; parsed
    /// time frames never overflow.
    pub const fn minutes(self) -> usize {
        self.count.saturating_mul(self.unit.minutes())
    }

    /// Year fraction covered by one bar, on a 252-day trading calendar.
    pub fn delta(self) -> f64 {
        let count = self.count as f64;
        match self.unit {
            TimeUnit::Minute => count / (TRADING_DAYS_PER_YEAR * 24.0 * 60.0),
            TimeUnit::Hour => count / (TRADING_DAYS_PER_YEAR * 24.0),
            TimeUnit::Day => count / TRADING_DAYS_PER_YEAR,
            TimeUnit::Week => count / WEEKS_PER_YEAR,
        }
    }

    /// Number of one-minute steps needed to cover `times_to_generate` bars.
    ///
    /// # Errors
    /// [`SimulationError::InvalidParameter`] when the step count overflows.
    pub fn scale_times_to_generate(self, times_to_generate: usize) -> Result<usize> {
        times_to_generate.checked_mul(self.minutes()).ok_or_else(|| {
            SimulationError::invalid(
                "times_to_generate",
                format!("{} bars of {} overflow the step count", times_to_generate, self),
            )
        })
    }
}

/// Parses `time_frame` and returns its per-step year fraction.
pub fn get_delta(time_frame: &str) -> Result<f64> {
    Ok(time_frame.parse::<TimeFrame>()?.delta())
}

/// Parses `time_frame` and returns the minute steps for `times_to_generate` bars.
pub fn scale_times_to_generate(times_to_generate: usize, time_frame: &str) -> Result<usize> {
    time_frame
        .parse::<TimeFrame>()?
        .scale_times_to_generate(times_to_generate)
}

impl Display for TimeFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

impl FromStr for TimeFrame {
    type Err = SimulationError;

    fn from_str(value: &str) -> Result<Self> {
        let token = value.trim().to_ascii_lowercase();
        let invalid = || SimulationError::InvalidTimeFrame {
            value: value.to_owned(),
        };

        let split = token
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (digits, suffix) = token.split_at(split);

        let count = if digits.is_empty() {
            1
        } else {
            digits.parse::<usize>().map_err(|_| invalid())?
        };
        if count == 0 {
            return Err(invalid());
        }

        let unit = match suffix {
            "min" | "t" => TimeUnit::Minute,
            "h" => TimeUnit::Hour,
            "d" => TimeUnit::Day,
            "w" => TimeUnit::Week,
            _ => return Err(invalid()),
        };
        count.checked_mul(unit.minutes()).ok_or_else(invalid)?;
        Ok(Self::new(count, unit))
    }
}

impl Serialize for TimeFrame {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeFrame {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_time_frames() {
        assert_eq!("1h".parse::<TimeFrame>().unwrap(), TimeFrame::ONE_HOUR);
        assert_eq!("15MIN".parse::<TimeFrame>().unwrap(), TimeFrame::new(15, TimeUnit::Minute));
        assert_eq!("5T".parse::<TimeFrame>().unwrap(), TimeFrame::new(5, TimeUnit::Minute));
        assert_eq!("d".parse::<TimeFrame>().unwrap(), TimeFrame::ONE_DAY);
        assert_eq!(" 2w ".parse::<TimeFrame>().unwrap(), TimeFrame::new(2, TimeUnit::Week));
    }

    #[test]
    fn rejects_unsupported_time_frames() {
        for token in ["", "60", "0h", "1M", "1y", "h1", "1.5h"] {
            let err = token.parse::<TimeFrame>().expect_err(token);
            assert!(matches!(err, SimulationError::InvalidTimeFrame { .. }), "{}", token);
        }
    }

    #[test]
    fn display_round_trips() {
        for token in ["1min", "30min", "4h", "1d", "1w"] {
            let tf: TimeFrame = token.parse().unwrap();
            assert_eq!(tf.to_string(), token);
        }
    }

    #[test]
    fn scales_to_minutes() {
        assert_eq!(scale_times_to_generate(24, "1h").unwrap(), 1_440);
        assert_eq!(scale_times_to_generate(3, "15min").unwrap(), 45);
        assert_eq!(scale_times_to_generate(2, "1d").unwrap(), 2_880);
        assert!(scale_times_to_generate(2, "1q").is_err());
    }

    #[test]
    fn rejects_overflowing_time_frames() {
        let err = "3000000000000000w".parse::<TimeFrame>().unwrap_err();
        assert!(matches!(err, SimulationError::InvalidTimeFrame { .. }));

        let err = scale_times_to_generate(usize::MAX / 2, "1h").unwrap_err();
        assert!(matches!(err, SimulationError::InvalidParameter { field: "times_to_generate", .. }));
        assert!(get_delta("3000000000000000w").is_err());
    }

    #[test]
    fn delta_per_unit() {
        assert!((get_delta("1h").unwrap() - 1.0 / (252.0 * 24.0)).abs() < 1e-15);
        assert!((get_delta("1d").unwrap() - 1.0 / 252.0).abs() < 1e-15);
        assert!((get_delta("1w").unwrap() - 1.0 / 52.0).abs() < 1e-15);
        assert!((get_delta("1min").unwrap() * 60.0 - get_delta("1h").unwrap()).abs() < 1e-15);
    }

    #[test]
    fn serde_uses_token() {
        let tf: TimeFrame = serde_json::from_str("\"4h\"").unwrap();
        assert_eq!(tf, TimeFrame::new(4, TimeUnit::Hour));
        assert_eq!(serde_json::to_string(&tf).unwrap(), "\"4h\"");
    }
}

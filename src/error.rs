//! Error types shared by every simulation routine.

use thiserror::Error;

/// Errors raised while configuring or running a simulation.
///
/// Variants fall into three groups: configuration errors (bad inputs that are
/// rejected before any sampling), numerical-domain errors (a discretization step
/// produced a value the next step cannot consume) and algebraic-precondition
/// errors (a correlation matrix that cannot be factorized).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("invalid time frame '{value}', expected <n>min, <n>h, <n>d or <n>w")]
    InvalidTimeFrame { value: String },

    #[error("jump intensity must be positive and finite, got {lamda}")]
    NonPositiveIntensity { lamda: f64 },

    #[error("times_to_generate must be at least 1, got {value}")]
    NothingToGenerate { value: usize },

    #[error("parameter '{field}' is invalid: {reason}")]
    InvalidParameter {
        field: &'static str,
        reason: String,
    },

    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("could not parse start date '{value}' with format '{format}'")]
    InvalidStartDate { value: String, format: String },

    #[error("negative value {value} under square root in {context} at step {step}")]
    NegativeSquareRoot {
        context: &'static str,
        step: usize,
        value: f64,
    },

    #[error("correlation matrix is not positive semi-definite (pivot {pivot} = {value})")]
    NotPositiveSemiDefinite { pivot: usize, value: f64 },

    #[error("correlation matrix is not symmetric at ({row}, {col})")]
    NotSymmetric { row: usize, col: usize },
}

impl SimulationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// True for errors caused by the discretization itself rather than by inputs.
    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::NegativeSquareRoot { .. })
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;

//! Crate-wide forecast error taxonomy.
//!
//! Leaf modules keep their own enums ([`EpiweekError`], [`DistributionError`],
//! [`OptError`]); everything that crosses a process or assembler boundary is
//! a [`ForecastError`]. The split between recoverable per-location failures
//! and fatal ones is encoded by [`ForecastError::is_recoverable`].
use crate::{
    calendar::{Epiweek, EpiweekError},
    distribution::DistributionError,
    optimization::errors::OptError,
};

/// Result alias for process, composition and assembly operations.
pub type ForecastResult<T> = Result<T, ForecastError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastError {
    // ---- Calendar ----
    /// Malformed epiweek input.
    InvalidEpiweek(EpiweekError),

    /// Issue epiweek outside the forecast season or in the off-season gap.
    InvalidIssue { issue: Epiweek, season: i32, reason: &'static str },

    // ---- Per-location, recoverable ----
    /// Missing or short history, signals or user submissions.
    InsufficientData { location: String, reason: String },

    /// Model fitting failed or lacked training seasons.
    Training { location: String, reason: String },

    // ---- Configuration ----
    /// Probability floor unsatisfiable by uniform blending.
    ImpossibleFloor { weight: f64, reason: &'static str },

    /// A configuration field is out of range.
    InvalidConfig { field: &'static str, reason: &'static str },

    /// Hybrid halves trained on different seasons.
    SeasonMismatch { past: i32, future: i32 },

    /// Forecast bundles that cannot be joined.
    IncompatibleForecasts { reason: &'static str },

    // ---- Output invariants ----
    /// Sanity check failures, one message per violated invariant.
    DistributionInvariant { violations: Vec<String> },

    // ---- Wrapped leaf errors ----
    Distribution(DistributionError),
    Optimization(OptError),
}

impl ForecastError {
    /// Whether the assembler may skip the location and continue the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ForecastError::InsufficientData { .. } | ForecastError::Training { .. })
    }

    pub(crate) fn insufficient(location: &str, reason: impl Into<String>) -> Self {
        ForecastError::InsufficientData { location: location.to_string(), reason: reason.into() }
    }

    pub(crate) fn training(location: &str, reason: impl Into<String>) -> Self {
        ForecastError::Training { location: location.to_string(), reason: reason.into() }
    }
}

impl std::error::Error for ForecastError {}

impl std::fmt::Display for ForecastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastError::InvalidEpiweek(err) => write!(f, "Invalid epiweek: {err}"),
            ForecastError::InvalidIssue { issue, season, reason } => {
                write!(f, "Invalid issue {issue} for season {season}: {reason}")
            }
            ForecastError::InsufficientData { location, reason } => {
                write!(f, "Insufficient data for {location}: {reason}")
            }
            ForecastError::Training { location, reason } => {
                write!(f, "Training failed for {location}: {reason}")
            }
            ForecastError::ImpossibleFloor { weight, reason } => {
                write!(f, "Impossible probability floor (uniform weight {weight}): {reason}")
            }
            ForecastError::InvalidConfig { field, reason } => {
                write!(f, "Invalid configuration `{field}`: {reason}")
            }
            ForecastError::SeasonMismatch { past, future } => {
                write!(f, "Past process trained on season {past}, future on season {future}")
            }
            ForecastError::IncompatibleForecasts { reason } => {
                write!(f, "Cannot join forecasts: {reason}")
            }
            ForecastError::DistributionInvariant { violations } => {
                write!(f, "Forecast failed sanity check: {}", violations.join("; "))
            }
            ForecastError::Distribution(err) => write!(f, "Distribution error: {err}"),
            ForecastError::Optimization(err) => write!(f, "Optimization error: {err}"),
        }
    }
}

impl From<EpiweekError> for ForecastError {
    fn from(err: EpiweekError) -> Self {
        ForecastError::InvalidEpiweek(err)
    }
}

impl From<DistributionError> for ForecastError {
    fn from(err: DistributionError) -> Self {
        match err {
            DistributionError::ImpossibleFloor { weight, reason } => {
                ForecastError::ImpossibleFloor { weight, reason }
            }
            DistributionError::Calendar(err) => ForecastError::InvalidEpiweek(err),
            other => ForecastError::Distribution(other),
        }
    }
}

impl From<OptError> for ForecastError {
    fn from(err: OptError) -> Self {
        ForecastError::Optimization(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Only data-availability and training failures are skippable.
    fn recoverability_follows_taxonomy() {
        assert!(ForecastError::insufficient("hhs1", "no history").is_recoverable());
        assert!(ForecastError::training("nat", "one season").is_recoverable());
        assert!(!ForecastError::DistributionInvariant { violations: vec![] }.is_recoverable());
        assert!(!ForecastError::ImpossibleFloor { weight: 2.0, reason: "x" }.is_recoverable());
        assert!(!ForecastError::SeasonMismatch { past: 2015, future: 2016 }.is_recoverable());
    }

    #[test]
    // Purpose
    // -------
    // Floor errors keep their identity when lifted out of the distribution
    // layer; other distribution errors are wrapped.
    fn distribution_errors_are_lifted() {
        let floor = DistributionError::ImpossibleFloor { weight: 1.5, reason: "too high" };
        assert_eq!(
            ForecastError::from(floor),
            ForecastError::ImpossibleFloor { weight: 1.5, reason: "too high" }
        );
        assert_eq!(
            ForecastError::from(DistributionError::NoBins),
            ForecastError::Distribution(DistributionError::NoBins)
        );
    }

    #[test]
    // Purpose
    // -------
    // Invariant failures list every violation in the message.
    fn invariant_message_lists_violations() {
        let err = ForecastError::DistributionInvariant {
            violations: vec!["nat/peak: sum 0.9".into(), "hhs1/x1: bin 3 is 0".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("nat/peak: sum 0.9"));
        assert!(msg.contains("hhs1/x1: bin 3 is 0"));
    }
}

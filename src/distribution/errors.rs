//! Errors for distribution building.
//!
//! Every variant is a configuration or input problem; none is retried. The
//! forecast layer maps [`DistributionError::ImpossibleFloor`] onto its own
//! `ImpossibleFloor` variant and wraps the rest.
use crate::calendar::EpiweekError;

/// Result alias for distribution-building operations.
pub type DistributionResult<T> = Result<T, DistributionError>;

#[derive(Debug, Clone, PartialEq)]
pub enum DistributionError {
    /// Uniform blending weight cannot produce the requested floor.
    ImpossibleFloor { weight: f64, reason: &'static str },

    /// Week samples contain `None` but the target forbids it.
    NoneNotAllowed { count: usize },

    /// Smoothing bandwidth must be finite and non-negative.
    InvalidBandwidth { bandwidth: f64 },

    /// ILI bin width must be finite and strictly positive.
    InvalidBinSize { bin_size: f64 },

    /// A distribution needs at least one bin.
    NoBins,

    /// Student-t parameters rejected by the backend.
    InvalidStudentT { location: f64, scale: f64, freedom: f64 },

    /// Point-estimate epiweek could not be formed.
    Calendar(EpiweekError),
}

impl std::error::Error for DistributionError {}

impl std::fmt::Display for DistributionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionError::ImpossibleFloor { weight, reason } => {
                write!(f, "Impossible probability floor (uniform weight {weight}): {reason}")
            }
            DistributionError::NoneNotAllowed { count } => {
                write!(f, "Target does not allow none, but {count} none samples were given")
            }
            DistributionError::InvalidBandwidth { bandwidth } => {
                write!(f, "Invalid smoothing bandwidth {bandwidth}: must be finite and >= 0")
            }
            DistributionError::InvalidBinSize { bin_size } => {
                write!(f, "Invalid ILI bin size {bin_size}: must be finite and > 0")
            }
            DistributionError::NoBins => write!(f, "Distribution requires at least one bin"),
            DistributionError::InvalidStudentT { location, scale, freedom } => {
                write!(
                    f,
                    "Invalid Student-t parameters: location {location}, scale {scale}, df {freedom}"
                )
            }
            DistributionError::Calendar(err) => write!(f, "Point estimate epiweek: {err}"),
        }
    }
}

impl From<EpiweekError> for DistributionError {
    fn from(err: EpiweekError) -> Self {
        DistributionError::Calendar(err)
    }
}

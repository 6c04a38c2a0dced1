//! distribution — binned, smoothed and uniform-blended target distributions.
//!
//! Purpose
//! -------
//! Convert the per-target scalar samples extracted from an ensemble into the
//! discretized probability distributions a forecast submits.
//!
//! Key behaviors
//! -------------
//! - [`builder`] holds the empirical builders ([`build_week_distribution`],
//!   [`build_ili_distribution`]).
//! - [`student_t`] holds the Student-t builders used for crowd-sourced
//!   ensembles.
//! - [`smoothing`] holds kernel smoothing, normalization and blending.
//! - [`DistributionBuilder`] fixes the bin layout, floors and bandwidths for
//!   a forecast run and dispatches on an [`Estimator`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Week distributions have one entry per season week plus an optional
//!   none probability; ILI distributions have `num_ili_bins` entries with
//!   the last bin unbounded.
//! - Week floors are computed over `num_week_bins + 1` entries whether or
//!   not the target allows none, so the floor is identical across week
//!   targets.
//!
//! Conventions
//! -----------
//! - Leaf numeric module: no logging, no I/O.
pub mod builder;
pub mod errors;
pub mod smoothing;
pub mod stats;
pub mod student_t;

pub use self::builder::{IliForecast, WeekForecast, build_ili_distribution, build_week_distribution};
pub use self::errors::{DistributionError, DistributionResult};
pub use self::student_t::{StudentTFit, build_ili_distribution_t, build_week_distribution_t};

use crate::calendar::Epiweek;
use serde::{Deserialize, Serialize};

/// How an ensemble's samples become a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Estimator {
    /// Histogram counts with optional kernel smoothing.
    Empirical,
    /// Student-t fit whose degrees of freedom depend on the number of
    /// forecasters behind the ensemble.
    StudentT { num_users: usize },
}

/// Fixed bin geometry for one forecast season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinLayout {
    pub first_epiweek: Epiweek,
    pub num_week_bins: usize,
    pub ili_bin_size: f64,
    pub num_ili_bins: usize,
}

/// Distribution builder configured for one forecast run.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionBuilder {
    layout: BinLayout,
    week_weight: f64,
    ili_weight: f64,
    week_bandwidth: f64,
    ili_bandwidth: f64,
    estimator: Estimator,
}

impl DistributionBuilder {
    /// Derive blending weights from per-bin floors.
    ///
    /// # Errors
    /// - [`DistributionError::ImpossibleFloor`] if either floor is
    ///   non-positive or needs a blending weight above one.
    /// - [`DistributionError::InvalidBandwidth`] for negative or non-finite
    ///   bandwidths.
    /// - [`DistributionError::NoBins`] / [`DistributionError::InvalidBinSize`]
    ///   for a degenerate layout.
    pub fn new(
        layout: BinLayout, min_week_prob: f64, min_ili_prob: f64, week_bandwidth: f64,
        ili_bandwidth: f64,
    ) -> DistributionResult<Self> {
        if layout.num_week_bins == 0 || layout.num_ili_bins == 0 {
            return Err(DistributionError::NoBins);
        }
        if !layout.ili_bin_size.is_finite() || layout.ili_bin_size <= 0.0 {
            return Err(DistributionError::InvalidBinSize { bin_size: layout.ili_bin_size });
        }
        for bandwidth in [week_bandwidth, ili_bandwidth] {
            if !bandwidth.is_finite() || bandwidth < 0.0 {
                return Err(DistributionError::InvalidBandwidth { bandwidth });
            }
        }
        let week_weight = smoothing::weight_for_floor(min_week_prob, layout.num_week_bins + 1)?;
        let ili_weight = smoothing::weight_for_floor(min_ili_prob, layout.num_ili_bins)?;
        Ok(Self {
            layout,
            week_weight,
            ili_weight,
            week_bandwidth,
            ili_bandwidth,
            estimator: Estimator::Empirical,
        })
    }

    /// Same configuration with a different estimator.
    pub fn with_estimator(mut self, estimator: Estimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn layout(&self) -> &BinLayout {
        &self.layout
    }

    pub fn estimator(&self) -> Estimator {
        self.estimator
    }

    pub fn week_weight(&self) -> f64 {
        self.week_weight
    }

    pub fn ili_weight(&self) -> f64 {
        self.ili_weight
    }

    /// Distribution for a week-valued target.
    pub fn week(
        &self, samples: &[Option<usize>], allow_none: bool,
    ) -> DistributionResult<WeekForecast> {
        let l = &self.layout;
        match self.estimator {
            Estimator::Empirical => build_week_distribution(
                l.first_epiweek,
                l.num_week_bins,
                samples,
                self.week_weight,
                self.week_bandwidth,
                allow_none,
            ),
            Estimator::StudentT { num_users } => build_week_distribution_t(
                l.first_epiweek,
                l.num_week_bins,
                samples,
                self.week_weight,
                allow_none,
                num_users,
            ),
        }
    }

    /// Distribution for an ILI-valued target.
    pub fn ili(&self, samples: &[f64]) -> DistributionResult<IliForecast> {
        let l = &self.layout;
        match self.estimator {
            Estimator::Empirical => build_ili_distribution(
                l.ili_bin_size,
                l.num_ili_bins,
                samples,
                self.ili_weight,
                self.ili_bandwidth,
            ),
            Estimator::StudentT { num_users } => build_ili_distribution_t(
                l.ili_bin_size,
                l.num_ili_bins,
                samples,
                self.ili_weight,
                num_users,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn layout() -> BinLayout {
        BinLayout {
            first_epiweek: Epiweek::join(2016, 40).unwrap(),
            num_week_bins: 33,
            ili_bin_size: 0.1,
            num_ili_bins: 131,
        }
    }

    #[test]
    // Purpose
    // -------
    // Default floors give the contest blending weights; a floor that cannot
    // be met is rejected.
    fn floors_map_to_blending_weights() {
        let b = DistributionBuilder::new(layout(), 0.002, 0.002, 1.0, 1.0).unwrap();
        assert_relative_eq!(b.week_weight(), 0.068, epsilon = 1e-12);
        assert_relative_eq!(b.ili_weight(), 0.262, epsilon = 1e-12);
        assert_eq!(b.estimator(), Estimator::Empirical);

        let err = DistributionBuilder::new(layout(), 0.002, 0.01, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, DistributionError::ImpossibleFloor { .. }));
        assert!(DistributionBuilder::new(layout(), 0.0, 0.002, 1.0, 1.0).is_err());
    }

    #[test]
    // Purpose
    // -------
    // Switching estimator changes the builder used but not the layout.
    //
    // Given
    // -----
    // - The same tight ILI samples built empirically without smoothing and
    //   with a Student-t fit.
    //
    // Expect
    // ------
    // - Both sum to one and peak in the same bin; the t-fit spreads mass to
    //   neighbouring bins.
    fn estimator_dispatch() {
        let samples = [2.05, 2.05, 2.05];
        let empirical = DistributionBuilder::new(layout(), 0.002, 0.002, 0.0, 0.0).unwrap();
        let t = empirical.clone().with_estimator(Estimator::StudentT { num_users: 3 });
        let a = empirical.ili(&samples).unwrap();
        let b = t.ili(&samples).unwrap();
        assert_relative_eq!(a.dist.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(b.dist.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(a.dist[20] > 0.7 && b.dist[20] > 0.7);
        assert_relative_eq!(a.dist[21], 0.262 / 131.0, epsilon = 1e-12);
        assert_eq!(t.layout(), empirical.layout());
    }
}

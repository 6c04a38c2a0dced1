//! process — forecasting processes that sample full-season trajectories.
//!
//! Purpose
//! -------
//! Define the contract every forecasting system implements and the shared
//! value types that flow out of it: a process is trained once per location
//! and season, then sampled at an issue epiweek to produce an [`Ensemble`]
//! of complete-season trajectories.
//!
//! Key behaviors
//! -------------
//! - [`ForecastProcess`] is the seam the assembler depends on. `train`
//!   returns an owned model; `sample` borrows it. Trained models live in a
//!   caller-held [`TrainedModels`] registry, never inside the process.
//! - [`baseline::Baseline`], [`epicast::Epicast`] and
//!   [`hybrid::Hybrid`] implement it here; the archetype filter lives in
//!   [`crate::archetype`].
//! - [`source::SurveillanceSource`] is the only way processes read data.
//!
//! Invariants & assumptions
//! ------------------------
//! - Trajectories cover the contest window of the process season, starting
//!   at week 40, and hold finite non-negative values.
//! - A process never mutates itself while sampling; `sample` takes `&self`
//!   so trained models can be shared read-only.
//!
//! Conventions
//! -----------
//! - Randomness is injected as `&mut dyn RngCore`.
//! - Per-location data problems surface as
//!   [`ForecastError::InsufficientData`] or [`ForecastError::Training`] and
//!   are recoverable at the run level.
pub mod baseline;
pub mod epicast;
pub mod hybrid;
pub mod sampling;
pub mod source;

pub use self::baseline::{Baseline, BaselineConfig, BaselineModel};
pub use self::epicast::{BackfillNoise, Epicast, EpicastConfig};
pub use self::hybrid::{Composition, Hybrid};
pub use self::source::{MemorySource, SurveillanceSource, UserSubmission};

use crate::{
    calendar::{Epiweek, forecast_end, forecast_start},
    distribution::Estimator,
    forecast::errors::{ForecastError, ForecastResult},
};
use rand::RngCore;
use std::collections::BTreeMap;

/// A forecasting system: trained per location, sampled per issue.
pub trait ForecastProcess {
    /// Per-location trained state.
    type Model;

    /// System name reported in forecast metadata.
    fn name(&self) -> &str;

    /// Season the process is trained to forecast.
    fn season(&self) -> i32;

    /// Fit the per-location model from historical data.
    fn train(&self, location: &str, source: &dyn SurveillanceSource)
    -> ForecastResult<Self::Model>;

    /// Sample full-season trajectories for `location` given data up to
    /// `issue`.
    fn sample(
        &self, model: &Self::Model, location: &str, issue: Epiweek,
        source: &dyn SurveillanceSource, rng: &mut dyn RngCore,
    ) -> ForecastResult<Ensemble>;
}

/// Trajectories drawn by one process for one location and issue.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    pub trajectories: Vec<Vec<f64>>,
    /// How the ensemble should be turned into distributions.
    pub estimator: Estimator,
}

impl Ensemble {
    /// Ensemble summarised by empirical histograms.
    pub fn new(trajectories: Vec<Vec<f64>>) -> Self {
        Self { trajectories, estimator: Estimator::Empirical }
    }

    pub fn with_estimator(mut self, estimator: Estimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// Check the ensemble is usable for target extraction.
    ///
    /// # Errors
    /// [`ForecastError::InsufficientData`] when the ensemble is empty, a
    /// trajectory is shorter than `min_len`, or a value is negative or not
    /// finite.
    pub fn validate(&self, location: &str, min_len: usize) -> ForecastResult<()> {
        if self.is_empty() {
            return Err(ForecastError::insufficient(location, "empty ensemble"));
        }
        for (i, trajectory) in self.trajectories.iter().enumerate() {
            if trajectory.len() < min_len {
                return Err(ForecastError::insufficient(
                    location,
                    format!("trajectory {i} has {} weeks, expected {min_len}", trajectory.len()),
                ));
            }
            if let Some(v) = trajectory.iter().find(|v| !v.is_finite() || **v < 0.0) {
                return Err(ForecastError::insufficient(
                    location,
                    format!("trajectory {i} holds invalid value {v}"),
                ));
            }
        }
        Ok(())
    }
}

/// Caller-held registry of trained per-location models for one season.
#[derive(Debug, Clone)]
pub struct TrainedModels<M> {
    season: i32,
    models: BTreeMap<String, M>,
}

impl<M> TrainedModels<M> {
    pub fn new(season: i32) -> Self {
        Self { season, models: BTreeMap::new() }
    }

    pub fn season(&self) -> i32 {
        self.season
    }

    pub fn get(&self, location: &str) -> Option<&M> {
        self.models.get(location)
    }

    pub fn insert(&mut self, location: &str, model: M) {
        self.models.insert(location.to_string(), model);
    }

    pub fn contains(&self, location: &str) -> bool {
        self.models.contains_key(location)
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Train `location` unless a model is already cached; idempotent.
    ///
    /// # Errors
    /// - [`ForecastError::SeasonMismatch`] when `process` targets a
    ///   different season than the registry.
    /// - Any error from [`ForecastProcess::train`].
    pub fn train<P>(
        &mut self, process: &P, location: &str, source: &dyn SurveillanceSource,
    ) -> ForecastResult<&M>
    where
        P: ForecastProcess<Model = M> + ?Sized,
    {
        if process.season() != self.season {
            return Err(ForecastError::SeasonMismatch {
                past: self.season,
                future: process.season(),
            });
        }
        if !self.models.contains_key(location) {
            let model = process.train(location, source)?;
            self.models.insert(location.to_string(), model);
        }
        self.models
            .get(location)
            .ok_or_else(|| ForecastError::training(location, "model missing after training"))
    }
}

/// Number of trajectory points in the contest window of `season`.
pub fn season_length(season: i32) -> ForecastResult<usize> {
    let first = forecast_start(season)?;
    let last = forecast_end(season)?;
    Ok(usize::try_from(first.delta(last) + 1).unwrap_or(0))
}

/// Index of `issue` in the contest window of `season`.
///
/// # Errors
/// [`ForecastError::InvalidIssue`] when `issue` belongs to another season
/// or to the off-season gap.
pub fn issue_offset(season: i32, issue: Epiweek) -> ForecastResult<usize> {
    if issue.season_year() != season {
        return Err(ForecastError::InvalidIssue {
            issue,
            season,
            reason: "issue belongs to another season",
        });
    }
    if issue.is_off_season() {
        return Err(ForecastError::InvalidIssue {
            issue,
            season,
            reason: "weeks 21-39 are not forecast",
        });
    }
    let offset = forecast_start(season)?.delta(issue);
    usize::try_from(offset).map_err(|_| ForecastError::InvalidIssue {
        issue,
        season,
        reason: "issue precedes week 40",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Ensemble validation, the trained-model registry and issue arithmetic.
    // Concrete processes are tested in their own modules.
    // -------------------------------------------------------------------------

    struct Counting {
        season: i32,
        calls: std::cell::Cell<usize>,
    }

    impl ForecastProcess for Counting {
        type Model = usize;

        fn name(&self) -> &str {
            "counting"
        }

        fn season(&self) -> i32 {
            self.season
        }

        fn train(&self, _: &str, _: &dyn SurveillanceSource) -> ForecastResult<usize> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.calls.get())
        }

        fn sample(
            &self, _: &usize, _: &str, _: Epiweek, _: &dyn SurveillanceSource,
            _: &mut dyn RngCore,
        ) -> ForecastResult<Ensemble> {
            Ok(Ensemble::new(vec![vec![0.0; 33]]))
        }
    }

    #[test]
    // Purpose
    // -------
    // Training through the registry happens once per location.
    //
    // Given
    // -----
    // - A process counting its `train` calls.
    //
    // Expect
    // ------
    // - Two `train` requests for "nat" call the process once; "hhs1" adds
    //   a second call.
    fn registry_trains_once_per_location() {
        let process = Counting { season: 2015, calls: std::cell::Cell::new(0) };
        let source = MemorySource::new();
        let mut models = TrainedModels::new(2015);
        assert_eq!(*models.train(&process, "nat", &source).unwrap(), 1);
        assert_eq!(*models.train(&process, "nat", &source).unwrap(), 1);
        assert_eq!(*models.train(&process, "hhs1", &source).unwrap(), 2);
        assert_eq!(models.len(), 2);
        assert!(models.contains("hhs1"));
    }

    #[test]
    // Purpose
    // -------
    // A registry refuses models from a process of another season.
    fn registry_rejects_other_seasons() {
        let process = Counting { season: 2016, calls: std::cell::Cell::new(0) };
        let mut models: TrainedModels<usize> = TrainedModels::new(2015);
        let err = models.train(&process, "nat", &MemorySource::new()).unwrap_err();
        assert_eq!(err, ForecastError::SeasonMismatch { past: 2015, future: 2016 });
    }

    #[test]
    // Purpose
    // -------
    // Validation flags empty ensembles, short trajectories and invalid
    // values as recoverable data errors.
    fn ensemble_validation() {
        assert!(Ensemble::new(vec![vec![1.0; 33]]).validate("nat", 33).is_ok());
        assert!(Ensemble::new(vec![]).validate("nat", 33).unwrap_err().is_recoverable());
        assert!(Ensemble::new(vec![vec![1.0; 5]]).validate("nat", 33).is_err());
        assert!(Ensemble::new(vec![vec![f64::NAN; 33]]).validate("nat", 33).is_err());
    }

    #[test]
    // Purpose
    // -------
    // Issue offsets count weeks from week 40 and reject the off-season and
    // other seasons.
    fn issue_offsets() {
        assert_eq!(issue_offset(2015, Epiweek::new(201540).unwrap()).unwrap(), 0);
        assert_eq!(issue_offset(2015, Epiweek::new(201602).unwrap()).unwrap(), 14);
        assert!(issue_offset(2015, Epiweek::new(201625).unwrap()).is_err());
        assert!(issue_offset(2016, Epiweek::new(201602).unwrap()).is_err());
        assert!(issue_offset(2015, Epiweek::new(201535).unwrap()).is_err());
        assert_eq!(season_length(2015).unwrap(), 33);
        assert_eq!(season_length(2014).unwrap(), 34);
    }
}

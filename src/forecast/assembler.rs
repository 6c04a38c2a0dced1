//! ForecastAssembler — from process ensembles to a checked forecast.
//!
//! Purpose
//! -------
//! Drive one forecasting process over a list of locations for a single
//! issue: train (or reuse) each location's model, sample an ensemble,
//! extract every target from every trajectory, build the blended
//! distributions and assemble a [`Forecast`] that has passed its sanity
//! check.
//!
//! Key behaviors
//! -------------
//! - The issue must lie in the process season's contest window.
//! - Per-location data and training failures are logged and the location
//!   is skipped; every other error aborts the run.
//! - The ensemble's [`crate::distribution::Estimator`] selects the
//!   distribution builder, so an Epicast future (alone or inside a hybrid)
//!   gets Student-t fits with the number of forecasters behind it.
//! - Onset is built only for locations with an onset baseline, and peak
//!   week carries a none bucket only for seasons before the rule cutoff.
//!
//! Invariants & assumptions
//! ------------------------
//! - A returned forecast always passes [`Forecast::sanity_check`]; a run
//!   where no location succeeds is an error, never an empty forecast.
use crate::{
    calendar::Epiweek,
    distribution::DistributionBuilder,
    forecast::{
        bundle::Forecast,
        config::ForecastConfig,
        errors::{ForecastError, ForecastResult},
        location::LocationForecast,
    },
    process::{ForecastProcess, TrainedModels, issue_offset, source::SurveillanceSource},
    targets::{Target, TargetExtractor},
};
use log::{info, warn};
use rand::RngCore;

#[derive(Debug, Clone)]
pub struct ForecastAssembler {
    config: ForecastConfig,
}

impl ForecastAssembler {
    /// # Errors
    /// Propagates [`ForecastConfig::validate`].
    pub fn new(config: ForecastConfig) -> ForecastResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast every location in `locations` at `issue`.
    ///
    /// # Errors
    /// - [`ForecastError::InvalidIssue`] for an issue outside the season.
    /// - [`ForecastError::SeasonMismatch`] when `models` belongs to another
    ///   season than `process`.
    /// - [`ForecastError::InsufficientData`] when no location succeeds.
    /// - [`ForecastError::DistributionInvariant`] when the result fails its
    ///   sanity check.
    /// - Any non-recoverable process or distribution error.
    pub fn run<P>(
        &self, process: &P, models: &mut TrainedModels<P::Model>, locations: &[&str],
        issue: Epiweek, source: &dyn SurveillanceSource, rng: &mut dyn RngCore,
    ) -> ForecastResult<Forecast>
    where
        P: ForecastProcess + ?Sized,
    {
        let season = process.season();
        if models.season() != season {
            return Err(ForecastError::SeasonMismatch { past: models.season(), future: season });
        }
        let offset = issue_offset(season, issue)?;
        let builder = self.config.distribution_builder(season)?;
        let extractor = self.config.extractor();
        info!("{}: forecasting {} locations at {issue}", process.name(), locations.len());

        let mut forecast =
            Forecast::new(season, issue, self.config.team.clone(), *builder.layout());
        for &location in locations {
            let result = self.forecast_location(
                process, models, location, issue, offset, &builder, &extractor, source, rng,
            );
            match result {
                Ok(lf) => forecast.add(lf),
                Err(err) if err.is_recoverable() => {
                    warn!("{}: skipping {location}: {err}", process.name());
                }
                Err(err) => return Err(err),
            }
        }

        if forecast.is_empty() {
            return Err(ForecastError::insufficient(
                "all",
                format!("no location could be forecast at {issue}"),
            ));
        }
        forecast.sanity_check()?;
        info!("{}: forecast for {issue} covers {} locations", process.name(), forecast.len());
        Ok(forecast)
    }

    #[allow(clippy::too_many_arguments)]
    fn forecast_location<P>(
        &self, process: &P, models: &mut TrainedModels<P::Model>, location: &str, issue: Epiweek,
        offset: usize, builder: &DistributionBuilder, extractor: &TargetExtractor,
        source: &dyn SurveillanceSource, rng: &mut dyn RngCore,
    ) -> ForecastResult<LocationForecast>
    where
        P: ForecastProcess + ?Sized,
    {
        let season = process.season();
        let model = models.train(process, location, source)?;
        let mut ensemble = process.sample(model, location, issue, source, rng)?;
        let num_weeks = builder.layout().num_week_bins;
        ensemble.validate(location, num_weeks)?;
        // Weeks past the contest window never count toward any target.
        for trajectory in &mut ensemble.trajectories {
            trajectory.truncate(num_weeks);
        }
        info!("{}: {location} ensemble of {} trajectories", process.name(), ensemble.len());

        let builder = builder.clone().with_estimator(ensemble.estimator);
        let baseline = self.config.onset_baseline(season, location);
        let samples = extractor.extract(&ensemble.trajectories, baseline, offset, Some(season));

        let expected = self.config.targets(season, location);
        let mut lf = LocationForecast::new(location, *builder.layout(), expected);
        if baseline.is_some() {
            lf.set_week(Target::Onset, builder.week(&samples.onset, true)?);
        }
        let allow_none = extractor.peak_week_allows_none(season);
        lf.set_week(Target::PeakWeek, builder.week(&samples.peak_week, allow_none)?);
        lf.set_ili(Target::Peak, builder.ili(&samples.peak)?);
        for (&k, column) in extractor.horizons.iter().zip(&samples.ahead) {
            lf.set_ili(Target::Ahead(k as u8), builder.ili(column)?);
        }
        Ok(lf)
    }
}

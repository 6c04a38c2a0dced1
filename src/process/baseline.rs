//! Empirical baseline process.
//!
//! Purpose
//! -------
//! Forecast a season from the spread of past seasons: the future part of
//! each trajectory is drawn from the per-week mean and variance of stable
//! historical curves, and the already-observed part from the observed values
//! with a backfill variance that depends on how recently each week was
//! reported.
//!
//! Key behaviors
//! -------------
//! - Training reads stable history for every season from
//!   `first_training_season` up to (not including) the forecast season,
//!   skipping excluded (pandemic) seasons and seasons with gaps, and needs at
//!   least two complete curves.
//! - Backfill variance at lag `l` is the sample variance of
//!   `stable - published_at_lag_l` over every week known both ways.
//! - With `do_sampling = false` the future part of each curve is replaced by
//!   a whole historical curve, round-robin, to keep realistic week-to-week
//!   correlation.
//! - Locations without their own history can borrow another location's
//!   statistics through an explicit fallback mapping.
//!
//! Invariants & assumptions
//! ------------------------
//! - Model vectors have the length of the forecast season's contest window.
//! - Sampled values are floored at zero.
use crate::{
    calendar::{Epiweek, forecast_start},
    distribution::stats::{mean, sample_variance},
    forecast::errors::{ForecastError, ForecastResult},
    process::{
        Ensemble, ForecastProcess, issue_offset, sampling::sample_normal_var, season_length,
        source::SurveillanceSource,
    },
};
use log::{info, warn};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Baseline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    pub season: i32,
    /// Trajectories drawn per location.
    pub num_samples: usize,
    /// Number of backfill lags to model; `None` treats observations as
    /// exact.
    pub backfill_weeks: Option<usize>,
    /// Draw independent weekly noise for the future (`true`) or splice in
    /// historical curves (`false`).
    pub do_sampling: bool,
    pub first_training_season: i32,
    /// Seasons never used for training.
    pub excluded_seasons: Vec<i32>,
    /// First season whose revisions feed the backfill model.
    pub first_backfill_season: i32,
    /// Location whose statistics stand in for another location.
    pub fallback: BTreeMap<String, String>,
    /// Stand-in for two-letter (state) codes without an explicit mapping.
    pub state_fallback: Option<String>,
}

impl BaselineConfig {
    /// Defaults for forecasting `season`.
    pub fn new(season: i32) -> Self {
        Self {
            season,
            num_samples: 1000,
            backfill_weeks: Some(10),
            do_sampling: true,
            first_training_season: 2003,
            excluded_seasons: vec![2009],
            first_backfill_season: 2010,
            fallback: BTreeMap::new(),
            state_fallback: Some("hhs4".to_string()),
        }
    }

    /// # Errors
    /// [`ForecastError::InvalidConfig`] for zero samples, zero backfill lags
    /// or a training window that starts after the forecast season.
    pub fn validate(&self) -> ForecastResult<()> {
        if self.num_samples == 0 {
            return Err(ForecastError::InvalidConfig {
                field: "num_samples",
                reason: "must be at least 1",
            });
        }
        if self.backfill_weeks == Some(0) {
            return Err(ForecastError::InvalidConfig {
                field: "backfill_weeks",
                reason: "must be at least 1 or None",
            });
        }
        if self.first_training_season >= self.season {
            return Err(ForecastError::InvalidConfig {
                field: "first_training_season",
                reason: "must precede the forecast season",
            });
        }
        Ok(())
    }

    /// Location whose data trains the model for `location`.
    fn resolve<'a>(&'a self, location: &'a str) -> &'a str {
        if let Some(other) = self.fallback.get(location) {
            return other;
        }
        match &self.state_fallback {
            Some(other) if location.len() == 2 => other,
            _ => location,
        }
    }
}

/// Trained baseline statistics for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineModel {
    /// Location whose history produced these statistics.
    pub source_location: String,
    pub mean: Vec<f64>,
    pub var: Vec<f64>,
    /// Complete historical curves, in season order.
    pub curves: Vec<Vec<f64>>,
    /// Variance of revisions by lag; index 0 is the most recent week.
    pub backfill_var: Vec<f64>,
}

/// Empirical baseline process.
#[derive(Debug, Clone)]
pub struct Baseline {
    config: BaselineConfig,
    name: String,
}

impl Baseline {
    /// # Errors
    /// Propagates [`BaselineConfig::validate`].
    pub fn new(config: BaselineConfig) -> ForecastResult<Self> {
        config.validate()?;
        let name = format!(
            "fc-baseline-{}{}",
            u8::from(config.backfill_weeks.is_some()),
            u8::from(config.do_sampling)
        );
        Ok(Self { config, name })
    }

    pub fn config(&self) -> &BaselineConfig {
        &self.config
    }

    fn training_curves(
        &self, stable: &BTreeMap<Epiweek, f64>, len: usize,
    ) -> ForecastResult<Vec<Vec<f64>>> {
        let mut curves = Vec::new();
        for season in self.config.first_training_season..self.config.season {
            if self.config.excluded_seasons.contains(&season) {
                continue;
            }
            let first = forecast_start(season)?;
            let curve: Option<Vec<f64>> = first
                .range(first.add(len as i64)?, false)
                .map(|week| stable.get(&week).copied())
                .collect();
            if let Some(curve) = curve {
                curves.push(curve);
            }
        }
        Ok(curves)
    }

    fn backfill_variance(
        &self, location: &str, stable: &BTreeMap<Epiweek, f64>,
        source: &dyn SurveillanceSource,
    ) -> ForecastResult<Vec<f64>> {
        let Some(weeks) = self.config.backfill_weeks else {
            return Ok(vec![0.0]);
        };
        let seasons = self.config.first_backfill_season..self.config.season;
        (0..weeks)
            .map(|lag| {
                let published = source.lagged_history(location, lag)?;
                let changes: Vec<f64> = published
                    .iter()
                    .filter(|(week, _)| seasons.contains(&week.season_year()))
                    .filter_map(|(week, value)| stable.get(week).map(|s| s - value))
                    .collect();
                sample_variance(&changes).ok_or_else(|| {
                    ForecastError::training(
                        location,
                        format!("fewer than two revisions at lag {lag}"),
                    )
                })
            })
            .collect()
    }
}

impl ForecastProcess for Baseline {
    type Model = BaselineModel;

    fn name(&self) -> &str {
        &self.name
    }

    fn season(&self) -> i32 {
        self.config.season
    }

    fn train(
        &self, location: &str, source: &dyn SurveillanceSource,
    ) -> ForecastResult<BaselineModel> {
        let trained_on = self.config.resolve(location);
        if trained_on != location {
            warn!("{}: using {trained_on} statistics for {location}", self.name);
        }
        let len = season_length(self.config.season)?;
        let stable = source.stable_history(trained_on)?;
        let curves = self.training_curves(&stable, len)?;
        if curves.len() < 2 {
            return Err(ForecastError::training(
                location,
                format!("{} complete training seasons, need at least 2", curves.len()),
            ));
        }

        let mut emp_mean = Vec::with_capacity(len);
        let mut emp_var = Vec::with_capacity(len);
        for i in 0..len {
            let column: Vec<f64> = curves.iter().map(|c| c[i]).collect();
            emp_mean.push(mean(&column).unwrap_or(0.0));
            emp_var.push(sample_variance(&column).unwrap_or(0.0));
        }

        let backfill_var = self.backfill_variance(trained_on, &stable, source)?;
        info!(
            "{}: {location} trained on {} seasons, backfill std [{}]",
            self.name,
            curves.len(),
            backfill_var.iter().map(|v| format!("{:.3}", v.sqrt())).collect::<Vec<_>>().join(" ")
        );

        Ok(BaselineModel {
            source_location: trained_on.to_string(),
            mean: emp_mean,
            var: emp_var,
            curves,
            backfill_var,
        })
    }

    fn sample(
        &self, model: &BaselineModel, location: &str, issue: Epiweek,
        source: &dyn SurveillanceSource, rng: &mut dyn RngCore,
    ) -> ForecastResult<Ensemble> {
        let offset = issue_offset(self.config.season, issue)?;
        let first = forecast_start(self.config.season)?;
        let observed = source.history(location, first, issue)?;
        if observed.len() != offset + 1 {
            return Err(ForecastError::insufficient(
                location,
                format!("{} observed weeks, expected {}", observed.len(), offset + 1),
            ));
        }
        if offset >= model.mean.len() {
            return Err(ForecastError::InvalidIssue {
                issue,
                season: self.config.season,
                reason: "issue is past the end of the season",
            });
        }

        let mut mean = model.mean.clone();
        let mut var = model.var.clone();
        let last_lag = model.backfill_var.len().saturating_sub(1);
        for (i, value) in observed.iter().enumerate() {
            let lag = (offset - i).min(last_lag);
            mean[i] = *value;
            var[i] = model.backfill_var.get(lag).copied().unwrap_or(0.0);
        }

        let mut curves = sample_normal_var(&mean, &var, self.config.num_samples, rng)?;
        if !self.config.do_sampling {
            for (i, curve) in curves.iter_mut().enumerate() {
                let history = &model.curves[i % model.curves.len()];
                curve[offset + 1..].copy_from_slice(&history[offset + 1..]);
            }
        }
        info!("{}: {location} sampled {} curves at {issue}", self.name, curves.len());
        Ok(Ensemble::new(curves))
    }
}

//! ArchetypeFilter process.
//!
//! Purpose
//! -------
//! Forecast a season by sampling shifted and scaled archetype curves that
//! match the observed (holiday-free) wILI, optionally extended by one week
//! with a nowcast that fuses auxiliary surveillance signals across the ten
//! HHS regions through an unscented Kalman filter.
//!
//! Key behaviors
//! -------------
//! - `train` builds an [`Archetype`] from 52-week stable curves starting at
//!   week 30 of each training season (pandemic seasons excluded).
//! - `sample` removes the holiday effect from the observations, attaches a
//!   lag-dependent backfill variance to each observed week, appends the
//!   nowcast value when one was computed for this issue, and draws curves
//!   from the top of the fit grid with the holiday effect restored.
//! - [`ArchetypeFilter::nowcast`] runs one predict/update step: the state is
//!   the regional wILI of the issue week, the transition refits every
//!   region's archetype with that week pinned and reads the following week,
//!   and the measurements are the configured signals for the following
//!   week. Missing signal values simply drop their measurement rows.
//!
//! Invariants & assumptions
//! ------------------------
//! - Output trajectories cover the contest window (week 40 onward) and are
//!   non-negative.
//! - Backfill variances are indexed by lag, index 0 being the most recent
//!   week; lags beyond the table reuse its last entry.
//! - A nowcast only informs sampling at the issue it was computed for.
use crate::{
    archetype::{
        curve::{ARCHETYPE_WEEKS, Archetype, MIN_VARIANCE},
        fit::{FitTarget, GridSpec, best_fit, sample_fits},
        ukf::{MerweSigmaPoints, UnscentedKalmanFilter},
    },
    calendar::{Epiweek, SEASON_START_WEEK},
    distribution::stats::mean,
    forecast::errors::{ForecastError, ForecastResult},
    process::{
        Ensemble, ForecastProcess, TrainedModels, issue_offset, season_length,
        source::SurveillanceSource,
    },
    targets::locations::{HHS_NATIONAL_WEIGHTS, HHS_REGIONS, national},
};
use log::{info, warn};
use nalgebra::{DMatrix, DVector};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of week 40 in an archetype curve.
const FORECAST_OFFSET: usize = 10;

/// Variance given to the pinned issue week inside the transition.
const PIN_VARIANCE: f64 = 1e-3;

/// Default revision variances by lag, `(location, [lag 0, lag 1, ...])`.
pub const DEFAULT_BACKFILL_VAR: [(&str, [f64; 10]); 11] = [
    ("nat", [0.133, 0.104, 0.071, 0.064, 0.057, 0.048, 0.041, 0.031, 0.028, 0.023]),
    ("hhs1", [0.173, 0.098, 0.083, 0.074, 0.066, 0.052, 0.044, 0.041, 0.036, 0.030]),
    ("hhs2", [0.384, 0.247, 0.179, 0.143, 0.117, 0.086, 0.064, 0.053, 0.049, 0.044]),
    ("hhs3", [0.268, 0.142, 0.106, 0.083, 0.072, 0.067, 0.062, 0.056, 0.052, 0.044]),
    ("hhs4", [0.160, 0.076, 0.051, 0.044, 0.039, 0.031, 0.030, 0.029, 0.024, 0.023]),
    ("hhs5", [0.159, 0.087, 0.071, 0.066, 0.061, 0.056, 0.051, 0.044, 0.037, 0.036]),
    ("hhs6", [0.239, 0.217, 0.096, 0.086, 0.065, 0.054, 0.053, 0.045, 0.041, 0.036]),
    ("hhs7", [0.255, 0.190, 0.124, 0.098, 0.072, 0.050, 0.037, 0.024, 0.023, 0.021]),
    ("hhs8", [0.160, 0.140, 0.130, 0.122, 0.121, 0.114, 0.110, 0.103, 0.098, 0.093]),
    ("hhs9", [0.679, 0.573, 0.446, 0.409, 0.378, 0.320, 0.267, 0.195, 0.170, 0.132]),
    ("hhs10", [0.371, 0.299, 0.250, 0.227, 0.210, 0.201, 0.188, 0.189, 0.186, 0.184]),
];

/// An auxiliary signal measured by the nowcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSpec {
    /// Name passed to [`SurveillanceSource::signal`].
    pub name: String,
    /// Measured for every HHS region as well as nationally.
    pub regional: bool,
    /// The signal includes the holiday effect.
    pub holiday: bool,
    /// Measurement noise standard deviation.
    pub noise_std: f64,
}

impl SignalSpec {
    pub fn new(name: &str, regional: bool, holiday: bool, noise_std: f64) -> Self {
        Self { name: name.to_string(), regional, holiday, noise_std }
    }

    fn locations(&self) -> Vec<&'static str> {
        let mut locations = vec!["nat"];
        if self.regional {
            locations.extend(HHS_REGIONS);
        }
        locations
    }
}

/// ArchetypeFilter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeConfig {
    pub season: i32,
    pub num_samples: usize,
    pub first_training_season: i32,
    pub excluded_seasons: Vec<i32>,
    /// Level the curve scale stretches away from.
    pub baseline: f64,
    /// Factor applied to candidate curve heights before scoring, by
    /// location. Missing locations use 1.0.
    pub height_multipliers: BTreeMap<String, f64>,
    /// Points per axis of the grid seeding the simplex fit.
    pub fit_grid: usize,
    /// Points per axis of the grid curves are sampled from.
    pub sample_grid: usize,
    pub fit_iterations: usize,
    /// Standard deviation of the nowcast transition noise.
    pub process_noise_std: f64,
    pub sigma_alpha: f64,
    pub sigma_beta: f64,
    pub sigma_kappa: f64,
    pub signals: Vec<SignalSpec>,
    /// Revision variance by lag; locations without an entry use `nat`.
    pub backfill_var: BTreeMap<String, Vec<f64>>,
}

impl ArchetypeConfig {
    /// Defaults for forecasting `season`.
    pub fn new(season: i32) -> Self {
        Self {
            season,
            num_samples: 1000,
            first_training_season: 2004,
            excluded_seasons: vec![2008, 2009],
            baseline: 0.0,
            height_multipliers: BTreeMap::new(),
            fit_grid: 32,
            sample_grid: 128,
            fit_iterations: 100,
            process_noise_std: 0.5,
            sigma_alpha: 1.0,
            sigma_beta: 2.0,
            sigma_kappa: 0.0,
            signals: vec![
                SignalSpec::new("twitter", true, false, 0.7),
                SignalSpec::new("wiki", false, false, 0.5),
                SignalSpec::new("uili", true, true, 0.5),
            ],
            backfill_var: DEFAULT_BACKFILL_VAR
                .iter()
                .map(|(location, var)| (location.to_string(), var.to_vec()))
                .collect(),
        }
    }

    /// # Errors
    /// [`ForecastError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> ForecastResult<()> {
        let invalid = |field, reason| Err(ForecastError::InvalidConfig { field, reason });
        if self.num_samples == 0 {
            return invalid("num_samples", "must be at least 1");
        }
        if self.first_training_season >= self.season {
            return invalid("first_training_season", "must precede the forecast season");
        }
        if self.fit_grid < 2 || self.sample_grid < 2 {
            return invalid("fit_grid", "grids need at least 2 points per axis");
        }
        if self.fit_iterations == 0 {
            return invalid("fit_iterations", "must be at least 1");
        }
        if !(self.process_noise_std.is_finite() && self.process_noise_std > 0.0) {
            return invalid("process_noise_std", "must be finite and > 0");
        }
        if !(self.sigma_alpha.is_finite() && self.sigma_alpha > 0.0) {
            return invalid("sigma_alpha", "must be finite and > 0");
        }
        if self.height_multipliers.values().any(|m| !m.is_finite() || *m <= 0.0) {
            return invalid("height_multipliers", "must be finite and > 0");
        }
        if self.signals.iter().any(|s| !s.noise_std.is_finite() || s.noise_std <= 0.0) {
            return invalid("signals", "noise_std must be finite and > 0");
        }
        if !self.backfill_var.contains_key("nat") {
            return invalid("backfill_var", "needs a nat entry");
        }
        if self.backfill_var.values().any(|v| v.is_empty() || v.iter().any(|x| !(*x > 0.0))) {
            return invalid("backfill_var", "tables must be non-empty and positive");
        }
        Ok(())
    }

    pub fn height_multiplier(&self, location: &str) -> f64 {
        self.height_multipliers.get(location).copied().unwrap_or(1.0)
    }

    fn backfill_for(&self, location: &str) -> ForecastResult<&[f64]> {
        self.backfill_var
            .get(location)
            .or_else(|| self.backfill_var.get("nat"))
            .map(Vec::as_slice)
            .ok_or_else(|| ForecastError::training(location, "no backfill variance table"))
    }

    /// Variance of each of `len` observed weeks, the last being the most
    /// recent.
    fn observed_variance(&self, location: &str, len: usize) -> ForecastResult<Vec<f64>> {
        let table = self.backfill_for(location)?;
        let last = table.len() - 1;
        Ok((0..len).map(|i| table[(len - 1 - i).min(last)]).collect())
    }
}

/// One-week-ahead regional state fused from auxiliary signals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Nowcast {
    /// Issue the nowcast extends; it estimates the following week.
    pub issue: Epiweek,
    /// Holiday-free wILI per HHS region.
    pub state: Vec<f64>,
    /// Posterior variance per HHS region.
    pub variances: Vec<f64>,
    pub national: f64,
    pub national_var: f64,
}

impl Nowcast {
    /// `(value, variance)` for `location`, if it is covered.
    pub fn for_location(&self, location: &str) -> Option<(f64, f64)> {
        if location == "nat" {
            return Some((self.national.max(0.0), self.national_var));
        }
        let i = HHS_REGIONS.iter().position(|r| *r == location)?;
        Some((self.state[i].max(0.0), self.variances[i]))
    }
}

/// Archetype-curve process with an optional Kalman nowcast.
#[derive(Debug, Clone)]
pub struct ArchetypeFilter {
    config: ArchetypeConfig,
    nowcast: Option<Nowcast>,
}

impl ArchetypeFilter {
    /// # Errors
    /// Propagates [`ArchetypeConfig::validate`].
    pub fn new(config: ArchetypeConfig) -> ForecastResult<Self> {
        config.validate()?;
        Ok(Self { config, nowcast: None })
    }

    pub fn config(&self) -> &ArchetypeConfig {
        &self.config
    }

    pub fn with_nowcast(mut self, nowcast: Nowcast) -> Self {
        self.nowcast = Some(nowcast);
        self
    }

    pub fn current_nowcast(&self) -> Option<&Nowcast> {
        self.nowcast.as_ref()
    }

    fn season_start(&self) -> ForecastResult<Epiweek> {
        Ok(Epiweek::join(self.config.season, SEASON_START_WEEK)?)
    }

    /// Holiday-free observations from week 30 through `issue` and their
    /// backfill variances.
    fn observations(
        &self, model: &Archetype, location: &str, issue: Epiweek,
        source: &dyn SurveillanceSource,
    ) -> ForecastResult<(Vec<f64>, Vec<f64>)> {
        let observed = source.history(location, self.season_start()?, issue)?;
        if observed.is_empty() || observed.len() >= ARCHETYPE_WEEKS {
            return Err(ForecastError::insufficient(
                location,
                format!("{} observed weeks since week 30", observed.len()),
            ));
        }
        let variance = self.config.observed_variance(location, observed.len())?;
        Ok((model.remove_holiday(&observed), variance))
    }

    /// Fuse the configured signals for the week after `issue` into a
    /// regional nowcast.
    ///
    /// Every HHS region must already be trained in `models`.
    ///
    /// # Errors
    /// - [`ForecastError::Training`] for an untrained region or a numerical
    ///   failure of the filter.
    /// - [`ForecastError::InsufficientData`] when history is missing or no
    ///   signal value is available.
    pub fn nowcast(
        &self, models: &TrainedModels<Archetype>, issue: Epiweek,
        source: &dyn SurveillanceSource,
    ) -> ForecastResult<Nowcast> {
        issue_offset(self.config.season, issue)?;
        let target_week = issue.add(1)?;

        let mut regions = Vec::with_capacity(HHS_REGIONS.len());
        for region in HHS_REGIONS {
            let model = models
                .get(region)
                .ok_or_else(|| ForecastError::training(region, "archetype not trained"))?;
            let (wili, variance) = self.observations(model, region, issue, source)?;
            regions.push((region, model, FitTarget::inform(model, &wili, &variance)));
        }
        let week = regions[0].2.week;

        let x0 = DVector::from_iterator(regions.len(), regions.iter().map(|r| r.2.mean[week - 1]));
        let p0 = DMatrix::from_diagonal(&DVector::from_iterator(
            regions.len(),
            regions.iter().map(|r| r.2.std[week - 1].powi(2)),
        ));

        let mut rows = Vec::new();
        for spec in &self.config.signals {
            for (slot, location) in spec.locations().into_iter().enumerate() {
                match source.signal(&spec.name, location, target_week)? {
                    Some(value) => rows.push((spec, slot, value)),
                    None => {
                        warn!("nowcast: no {} value for {location} at {target_week}", spec.name)
                    }
                }
            }
        }
        if rows.is_empty() {
            return Err(ForecastError::insufficient(
                "nat",
                format!("no nowcast signals for {target_week}"),
            ));
        }
        let z = DVector::from_iterator(rows.len(), rows.iter().map(|r| r.2));
        let r = DMatrix::from_diagonal(&DVector::from_iterator(
            rows.len(),
            rows.iter().map(|r| r.0.noise_std.powi(2)),
        ));
        let n = regions.len();
        let q = DMatrix::identity(n, n) * self.config.process_noise_std.powi(2);
        let points = MerweSigmaPoints::new(
            n,
            self.config.sigma_alpha,
            self.config.sigma_beta,
            self.config.sigma_kappa,
        );
        let mut ukf = UnscentedKalmanFilter::new(x0, p0, q, r, points);

        let grid = GridSpec::new(self.config.fit_grid);
        ukf.predict(|x| {
            let mut next = DVector::zeros(n);
            for (i, (region, model, target)) in regions.iter().enumerate() {
                let pinned = target.pinned(x[i], PIN_VARIANCE);
                let multiplier = self.config.height_multiplier(region);
                let fit = best_fit(model, &pinned, multiplier, &grid, self.config.fit_iterations)?;
                next[i] = fit.curve[week.min(fit.curve.len() - 1)];
            }
            Ok(next)
        })?;
        ukf.update(&z, |x| {
            let plain: Vec<f64> = x.iter().copied().collect();
            let with_holiday: Vec<f64> = regions
                .iter()
                .zip(&plain)
                .map(|((_, model, _), v)| model.add_holiday_week(*v, week))
                .collect();
            let values = rows.iter().map(|(spec, slot, _)| {
                let series = if spec.holiday { &with_holiday } else { &plain };
                match slot {
                    0 => national(series, &HHS_NATIONAL_WEIGHTS),
                    i => series[i - 1],
                }
            });
            Ok(DVector::from_iterator(rows.len(), values))
        })?;

        let state: Vec<f64> = ukf.x.iter().copied().collect();
        let variances: Vec<f64> = ukf.p.diagonal().iter().map(|v| v.max(MIN_VARIANCE)).collect();
        let nowcast = Nowcast {
            issue,
            national: national(&state, &HHS_NATIONAL_WEIGHTS),
            national_var: mean(&variances).unwrap_or(MIN_VARIANCE),
            state,
            variances,
        };
        info!(
            "nowcast for {target_week}: nat {:.3} (var {:.3}) from {} signal values",
            nowcast.national,
            nowcast.national_var,
            rows.len()
        );
        Ok(nowcast)
    }
}

impl ForecastProcess for ArchetypeFilter {
    type Model = Archetype;

    fn name(&self) -> &str {
        "fc-archefilter"
    }

    fn season(&self) -> i32 {
        self.config.season
    }

    fn train(&self, location: &str, source: &dyn SurveillanceSource) -> ForecastResult<Archetype> {
        let stable = source.stable_history(location)?;
        let mut curves = Vec::new();
        for season in self.config.first_training_season..self.config.season {
            if self.config.excluded_seasons.contains(&season) {
                continue;
            }
            let first = Epiweek::join(season, SEASON_START_WEEK)?;
            let curve: Option<Vec<f64>> = first
                .range(first.add(ARCHETYPE_WEEKS as i64)?, false)
                .map(|week| stable.get(&week).copied())
                .collect();
            match curve {
                Some(curve) => curves.push(curve),
                None => warn!("{}: {location} season {season} is incomplete", self.name()),
            }
        }
        let archetype = Archetype::train(location, &curves, self.config.baseline)?;
        info!("{}: {location} archetype from {} seasons", self.name(), curves.len());
        Ok(archetype)
    }

    fn sample(
        &self, model: &Archetype, location: &str, issue: Epiweek,
        source: &dyn SurveillanceSource, rng: &mut dyn RngCore,
    ) -> ForecastResult<Ensemble> {
        issue_offset(self.config.season, issue)?;
        let len = season_length(self.config.season)?;
        let (mut wili, mut variance) = self.observations(model, location, issue, source)?;
        if let Some((value, var)) = self
            .nowcast
            .as_ref()
            .filter(|n| n.issue == issue)
            .and_then(|n| n.for_location(location))
        {
            wili.push(value);
            variance.push(var);
        }

        let target = FitTarget::inform(model, &wili, &variance);
        let curves = sample_fits(
            model,
            &target,
            self.config.height_multiplier(location),
            &GridSpec::new(self.config.sample_grid),
            self.config.num_samples,
            true,
            rng,
        );
        let end = (FORECAST_OFFSET + len).min(ARCHETYPE_WEEKS);
        let trajectories: Vec<Vec<f64>> =
            curves.into_iter().map(|c| c[FORECAST_OFFSET..end].to_vec()).collect();
        info!("{}: {location} sampled {} curves at {issue}", self.name(), trajectories.len());
        Ok(Ensemble::new(trajectories))
    }
}

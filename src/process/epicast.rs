//! Crowd-sourced (Epicast) process.
//!
//! Each forecaster submits predictions for every week after the issue; the
//! ensemble pins the observed prefix in front of each submission. Because
//! ensembles are small, distributions are fitted with a Student-t whose
//! degrees of freedom follow the number of forecasters (see
//! [`crate::distribution::student_t`]).
//!
//! Submissions are dropped (with a warning) when their length does not match
//! the remaining weeks of the season or when they contain a non-positive or
//! non-finite value. An optional backfill noise model draws several copies
//! of the observed prefix per forecaster, perturbing the most recent weeks
//! with age-dependent noise before splicing.
use crate::{
    calendar::{Epiweek, forecast_end, forecast_start},
    distribution::Estimator,
    forecast::errors::{ForecastError, ForecastResult},
    process::{
        Ensemble, ForecastProcess, issue_offset, sampling::normal_noise,
        source::{SurveillanceSource, UserSubmission},
    },
};
use log::{info, warn};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Noise injected into recently observed weeks, which are still subject to
/// revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillNoise {
    /// Noisy copies of the observed prefix per forecaster.
    pub draws_per_user: usize,
    /// Noise standard deviation by age; index 0 is the most recent week.
    pub stdevs: Vec<f64>,
}

impl Default for BackfillNoise {
    fn default() -> Self {
        Self { draws_per_user: 100, stdevs: (0..5).map(|i| 0.5f64.powi(i)).collect() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpicastConfig {
    pub season: i32,
    /// Only these forecasters count, when set.
    pub users: Option<BTreeSet<u64>>,
    pub backfill_noise: Option<BackfillNoise>,
}

impl EpicastConfig {
    pub fn new(season: i32) -> Self {
        Self { season, users: None, backfill_noise: None }
    }

    /// # Errors
    /// [`ForecastError::InvalidConfig`] for a noise model with no draws or
    /// with a negative or non-finite standard deviation.
    pub fn validate(&self) -> ForecastResult<()> {
        if let Some(noise) = &self.backfill_noise {
            if noise.draws_per_user == 0 {
                return Err(ForecastError::InvalidConfig {
                    field: "backfill_noise.draws_per_user",
                    reason: "must be at least 1",
                });
            }
            if noise.stdevs.iter().any(|s| !s.is_finite() || *s < 0.0) {
                return Err(ForecastError::InvalidConfig {
                    field: "backfill_noise.stdevs",
                    reason: "must be finite and >= 0",
                });
            }
        }
        Ok(())
    }
}

/// Epicast process. Needs no training.
#[derive(Debug, Clone)]
pub struct Epicast {
    config: EpicastConfig,
}

impl Epicast {
    /// # Errors
    /// Propagates [`EpicastConfig::validate`].
    pub fn new(config: EpicastConfig) -> ForecastResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Submissions that pass the user filter and cover exactly `expected`
    /// weeks with positive values.
    pub fn usable_submissions(
        &self, location: &str, issue: Epiweek, submissions: Vec<UserSubmission>,
        expected: usize,
    ) -> Vec<UserSubmission> {
        submissions
            .into_iter()
            .filter(|s| self.config.users.as_ref().is_none_or(|users| users.contains(&s.user_id)))
            .filter(|s| {
                let valid = s.values.len() == expected
                    && s.values.iter().all(|v| v.is_finite() && *v > 0.0);
                if !valid {
                    warn!(
                        "epicast: dropping submission of user {} for {location} at {issue} \
                         ({} of {expected} weeks)",
                        s.user_id,
                        s.values.len()
                    );
                }
                valid
            })
            .collect()
    }

    fn noisy_prefix(
        &self, observed: &[f64], noise: &BackfillNoise, rng: &mut dyn RngCore,
    ) -> ForecastResult<Vec<f64>> {
        let mut curve = observed.to_vec();
        for (age, std) in noise.stdevs.iter().enumerate().take(curve.len()) {
            let j = curve.len() - 1 - age;
            curve[j] = (curve[j] + normal_noise(*std, rng)?).max(0.0);
        }
        Ok(curve)
    }
}

impl ForecastProcess for Epicast {
    type Model = ();

    fn name(&self) -> &str {
        "fc-epicast"
    }

    fn season(&self) -> i32 {
        self.config.season
    }

    fn train(&self, _location: &str, _source: &dyn SurveillanceSource) -> ForecastResult<()> {
        Ok(())
    }

    fn sample(
        &self, _model: &(), location: &str, issue: Epiweek, source: &dyn SurveillanceSource,
        rng: &mut dyn RngCore,
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

        let remaining = issue.delta(forecast_end(self.config.season)?);
        let expected = usize::try_from(remaining).unwrap_or(0);
        let submissions = self.usable_submissions(
            location,
            issue,
            source.user_submissions(location, issue)?,
            expected,
        );
        if submissions.is_empty() {
            return Err(ForecastError::insufficient(
                location,
                format!("no usable submissions at {issue}"),
            ));
        }
        info!("epicast: {} users found for {location} on {issue}", submissions.len());

        let mut curves = Vec::new();
        for submission in &submissions {
            match &self.config.backfill_noise {
                None => curves.push([observed.as_slice(), submission.values.as_slice()].concat()),
                Some(noise) => {
                    for _ in 0..noise.draws_per_user {
                        let mut curve = self.noisy_prefix(&observed, noise, rng)?;
                        curve.extend_from_slice(&submission.values);
                        curves.push(curve);
                    }
                }
            }
        }

        let estimator = Estimator::StudentT { num_users: submissions.len() };
        Ok(Ensemble::new(curves).with_estimator(estimator))
    }
}

//! Scalar target extraction from full-season trajectories.
//!
//! All week-valued results are indices into the trajectory (0 = first
//! forecast week). Onset and peak matching compare values rounded to one
//! decimal place with ties to even.
use crate::distribution::stats::{median_low, round1};
use serde::{Deserialize, Serialize};

/// Number of consecutive weeks at or above baseline that define onset.
pub const ONSET_RUN: usize = 3;

/// Default first season for which peak week is always defined.
pub const PEAKWEEK_RULE_CUTOFF: i32 = 2016;

/// Target computation rules shared by every trajectory of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetExtractor {
    /// Only the first `peak_window` weeks count toward the peak; `None`
    /// uses the whole trajectory.
    pub peak_window: Option<usize>,
    /// Seasons before this one report no peak week when onset never occurs.
    pub peakweek_rule_cutoff: i32,
    /// k-week-ahead horizons, in order.
    pub horizons: Vec<usize>,
}

impl Default for TargetExtractor {
    fn default() -> Self {
        Self {
            peak_window: None,
            peakweek_rule_cutoff: PEAKWEEK_RULE_CUTOFF,
            horizons: vec![1, 2, 3, 4],
        }
    }
}

/// All targets of one trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSample {
    pub onset: Option<usize>,
    pub peak_week: Option<usize>,
    pub peak: f64,
    /// One value per configured horizon.
    pub ahead: Vec<f64>,
}

/// Targets of a whole ensemble, one column per target.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TargetSamples {
    pub onset: Vec<Option<usize>>,
    pub peak_week: Vec<Option<usize>>,
    pub peak: Vec<f64>,
    pub ahead: Vec<Vec<f64>>,
}

impl TargetSamples {
    pub fn len(&self) -> usize {
        self.peak.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peak.is_empty()
    }

    fn push(&mut self, sample: TargetSample) {
        if self.ahead.len() < sample.ahead.len() {
            self.ahead.resize_with(sample.ahead.len(), Vec::new);
        }
        self.onset.push(sample.onset);
        self.peak_week.push(sample.peak_week);
        self.peak.push(sample.peak);
        for (column, value) in self.ahead.iter_mut().zip(sample.ahead) {
            column.push(value);
        }
    }
}

impl FromIterator<TargetSample> for TargetSamples {
    fn from_iter<I: IntoIterator<Item = TargetSample>>(iter: I) -> Self {
        let mut samples = TargetSamples::default();
        for sample in iter {
            samples.push(sample);
        }
        samples
    }
}

impl TargetExtractor {
    pub fn new(
        peak_window: Option<usize>, peakweek_rule_cutoff: i32, horizons: Vec<usize>,
    ) -> Self {
        Self { peak_window, peakweek_rule_cutoff, horizons }
    }

    fn window<'a>(&self, trajectory: &'a [f64]) -> &'a [f64] {
        match self.peak_window {
            Some(n) if n > 0 && n < trajectory.len() => &trajectory[..n],
            _ => trajectory,
        }
    }

    /// Maximum value within the peak window; 0 for an empty trajectory.
    pub fn get_peak(&self, trajectory: &[f64]) -> f64 {
        let window = self.window(trajectory);
        if window.is_empty() {
            return 0.0;
        }
        window.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Median-low index among the weeks whose rounded value equals the
    /// rounded peak.
    ///
    /// For a `rule_season` before the cutoff, returns `None` when onset
    /// never occurs (no baseline counts as no onset).
    pub fn get_peak_week(
        &self, trajectory: &[f64], baseline: Option<f64>, rule_season: Option<i32>,
    ) -> Option<usize> {
        if rule_season.is_some_and(|season| season < self.peakweek_rule_cutoff)
            && baseline.and_then(|b| Self::get_onset(trajectory, b)).is_none()
        {
            return None;
        }
        let peak = round1(self.get_peak(trajectory));
        let weeks: Vec<usize> = self
            .window(trajectory)
            .iter()
            .enumerate()
            .filter(|(_, w)| round1(**w) == peak)
            .map(|(i, _)| i)
            .collect();
        median_low(&weeks)
    }

    /// Start of the first run of [`ONSET_RUN`] consecutive rounded values at
    /// or above `baseline`.
    pub fn get_onset(trajectory: &[f64], baseline: f64) -> Option<usize> {
        let mut run = 0;
        for (i, &w) in trajectory.iter().enumerate() {
            if round1(w) >= baseline {
                run += 1;
                if run >= ONSET_RUN {
                    return Some(i + 1 - ONSET_RUN);
                }
            } else {
                run = 0;
            }
        }
        None
    }

    /// Value `k` weeks after `current_index`, clamped to the last week.
    pub fn get_k_week_ahead(trajectory: &[f64], current_index: usize, k: usize) -> f64 {
        let Some(last) = trajectory.len().checked_sub(1) else {
            return 0.0;
        };
        trajectory[(current_index + k).min(last)]
    }

    /// Every target for one trajectory.
    pub fn get_all_targets(
        &self, trajectory: &[f64], baseline: Option<f64>, current_index: usize,
        rule_season: Option<i32>,
    ) -> TargetSample {
        TargetSample {
            onset: baseline.and_then(|b| Self::get_onset(trajectory, b)),
            peak_week: self.get_peak_week(trajectory, baseline, rule_season),
            peak: self.get_peak(trajectory),
            ahead: self
                .horizons
                .iter()
                .map(|&k| Self::get_k_week_ahead(trajectory, current_index, k))
                .collect(),
        }
    }

    /// Targets for every trajectory in an ensemble.
    pub fn extract<'a, I>(
        &self, trajectories: I, baseline: Option<f64>, current_index: usize,
        rule_season: Option<i32>,
    ) -> TargetSamples
    where
        I: IntoIterator<Item = &'a Vec<f64>>,
    {
        trajectories
            .into_iter()
            .map(|t| self.get_all_targets(t, baseline, current_index, rule_season))
            .collect()
    }

    /// Whether the peak-week distribution carries a none bucket in `season`.
    pub fn peak_week_allows_none(&self, season: i32) -> bool {
        season < self.peakweek_rule_cutoff
    }
}

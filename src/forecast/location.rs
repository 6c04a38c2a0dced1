//! Per-location forecast and its sanity check.
//!
//! Purpose
//! -------
//! Hold the distribution and point estimate of every target for one
//! location, and report every way it violates the submission invariants.
//!
//! Invariants & assumptions
//! ------------------------
//! - Week-valued targets hold a [`WeekForecast`] with `num_week_bins`
//!   entries; ILI-valued targets an [`IliForecast`] with `num_ili_bins`.
//! - Every probability (including a none bucket) lies strictly inside
//!   `(0, 1)` and each distribution sums to one within [`SUM_TOLERANCE`].
//! - Week points fall inside the season window; ILI points are finite and
//!   non-negative.
use crate::{
    distribution::{BinLayout, IliForecast, WeekForecast},
    targets::Target,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Allowed distance of a distribution's total mass from one.
pub const SUM_TOLERANCE: f64 = 1e-5;

/// Distribution of one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TargetForecast {
    Week(WeekForecast),
    Ili(IliForecast),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationForecast {
    pub location: String,
    layout: BinLayout,
    /// Targets the location must carry.
    expected: Vec<Target>,
    targets: BTreeMap<Target, TargetForecast>,
}

impl LocationForecast {
    pub fn new(location: impl Into<String>, layout: BinLayout, expected: Vec<Target>) -> Self {
        Self { location: location.into(), layout, expected, targets: BTreeMap::new() }
    }

    pub fn layout(&self) -> &BinLayout {
        &self.layout
    }

    pub fn expected(&self) -> &[Target] {
        &self.expected
    }

    pub fn set_week(&mut self, target: Target, forecast: WeekForecast) {
        self.targets.insert(target, TargetForecast::Week(forecast));
    }

    pub fn set_ili(&mut self, target: Target, forecast: IliForecast) {
        self.targets.insert(target, TargetForecast::Ili(forecast));
    }

    pub fn get(&self, target: Target) -> Option<&TargetForecast> {
        self.targets.get(&target)
    }

    pub fn week(&self, target: Target) -> Option<&WeekForecast> {
        match self.targets.get(&target)? {
            TargetForecast::Week(w) => Some(w),
            TargetForecast::Ili(_) => None,
        }
    }

    pub fn ili(&self, target: Target) -> Option<&IliForecast> {
        match self.targets.get(&target)? {
            TargetForecast::Ili(i) => Some(i),
            TargetForecast::Week(_) => None,
        }
    }

    pub fn targets(&self) -> impl Iterator<Item = (Target, &TargetForecast)> {
        self.targets.iter().map(|(t, f)| (*t, f))
    }

    pub fn has_onset(&self) -> bool {
        self.targets.contains_key(&Target::Onset)
    }

    /// Every invariant violation, as `"target: problem"` messages. Empty
    /// when the forecast is valid.
    pub fn sanity_check(&self) -> Vec<String> {
        let mut violations: Vec<String> = self
            .expected
            .iter()
            .filter(|t| !self.targets.contains_key(*t))
            .map(|t| format!("{t}: missing"))
            .collect();

        for (target, forecast) in &self.targets {
            let mut problems = Vec::new();
            match forecast {
                TargetForecast::Week(w) => {
                    if !target.is_week() {
                        problems.push("week distribution for an ILI target".to_string());
                    }
                    check_dist(&w.dist, w.none, self.layout.num_week_bins, &mut problems);
                    let first = self.layout.first_epiweek;
                    let offset = first.delta(w.point);
                    if offset < 0 || offset >= self.layout.num_week_bins as i64 {
                        problems.push(format!("point {} outside the season window", w.point));
                    }
                }
                TargetForecast::Ili(i) => {
                    if !target.is_ili() {
                        problems.push("ILI distribution for a week target".to_string());
                    }
                    check_dist(&i.dist, None, self.layout.num_ili_bins, &mut problems);
                    if !i.point.is_finite() || i.point < 0.0 {
                        problems.push(format!("point {} is not a valid percentage", i.point));
                    }
                }
            }
            violations.extend(problems.into_iter().map(|p| format!("{target}: {p}")));
        }
        violations
    }
}

fn check_dist(dist: &[f64], none: Option<f64>, expected_len: usize, problems: &mut Vec<String>) {
    if dist.len() != expected_len {
        problems.push(format!("{} bins, expected {expected_len}", dist.len()));
    }
    for (i, p) in dist.iter().enumerate() {
        if !(*p > 0.0 && *p < 1.0) {
            problems.push(format!("bin {i} is {p}"));
        }
    }
    if let Some(p) = none {
        if !(p > 0.0 && p < 1.0) {
            problems.push(format!("none is {p}"));
        }
    }
    let total = dist.iter().sum::<f64>() + none.unwrap_or(0.0);
    if !((1.0 - total).abs() < SUM_TOLERANCE) {
        problems.push(format!("sum is {total}"));
    }
}

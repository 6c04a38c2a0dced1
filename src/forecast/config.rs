//! Run-level forecast configuration.
//!
//! [`ForecastConfig`] fixes the bin layout, probability floors, kernel
//! bandwidths and target rules for one forecast run. It derives the
//! [`DistributionBuilder`] and [`TargetExtractor`] the assembler uses, and
//! decides which targets each location carries.
use crate::{
    calendar::forecast_start,
    distribution::{BinLayout, DistributionBuilder},
    forecast::errors::{ForecastError, ForecastResult},
    process::season_length,
    targets::{
        Target, TargetExtractor,
        extractor::PEAKWEEK_RULE_CUTOFF,
        locations::{is_region, onset_baseline},
    },
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weeks in the contest window (week 40 through week 20) of a 52-week
/// season.
pub const SEASON_LENGTH: usize = 33;
/// Width of one wILI bin, in percentage points.
pub const ILI_BIN_SIZE: f64 = 0.1;
/// Number of wILI bins; the last one is unbounded above.
pub const NUM_ILI_BINS: usize = 131;
/// Default probability floor for every bin.
pub const MIN_PROB: f64 = 0.002;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Team or system name reported in forecast metadata.
    pub team: String,
    /// Minimum number of week bins; seasons with a week 53 get one more.
    pub season_length: usize,
    pub ili_bin_size: f64,
    pub num_ili_bins: usize,
    pub min_week_prob: f64,
    pub min_ili_prob: f64,
    /// Kernel bandwidth in week bins; 0 disables smoothing.
    pub week_bandwidth: f64,
    /// Kernel bandwidth in ILI bins; 0 disables smoothing.
    pub ili_bandwidth: f64,
    pub horizons: Vec<usize>,
    pub peak_window: Option<usize>,
    pub peakweek_rule_cutoff: i32,
    /// Onset baselines that replace the published table, by location.
    pub onset_baselines: BTreeMap<String, f64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            team: "flucast".to_string(),
            season_length: SEASON_LENGTH,
            ili_bin_size: ILI_BIN_SIZE,
            num_ili_bins: NUM_ILI_BINS,
            min_week_prob: MIN_PROB,
            min_ili_prob: MIN_PROB,
            week_bandwidth: 1.0,
            ili_bandwidth: 1.0,
            horizons: vec![1, 2, 3, 4],
            peak_window: None,
            peakweek_rule_cutoff: PEAKWEEK_RULE_CUTOFF,
            onset_baselines: BTreeMap::new(),
        }
    }
}

impl ForecastConfig {
    /// Default configuration for `team`.
    pub fn new(team: impl Into<String>) -> Self {
        Self { team: team.into(), ..Self::default() }
    }

    /// # Errors
    /// [`ForecastError::InvalidConfig`] for an empty team name, an empty
    /// layout, or horizons outside `1..=255`. Floors and bandwidths are
    /// checked when the builder is derived.
    pub fn validate(&self) -> ForecastResult<()> {
        if self.team.trim().is_empty() {
            return Err(ForecastError::InvalidConfig { field: "team", reason: "must not be empty" });
        }
        if self.season_length == 0 || self.num_ili_bins == 0 {
            return Err(ForecastError::InvalidConfig {
                field: "season_length",
                reason: "week and ILI bin counts must be positive",
            });
        }
        if self.horizons.is_empty() || self.horizons.iter().any(|&k| k == 0 || k > 255) {
            return Err(ForecastError::InvalidConfig {
                field: "horizons",
                reason: "need at least one horizon, each in 1..=255",
            });
        }
        Ok(())
    }

    /// Bin layout for `season`. The week bins cover the whole contest
    /// window, so a season with a week 53 has one more bin than usual.
    ///
    /// # Errors
    /// Propagates epiweek errors for seasons outside the calendar.
    pub fn layout(&self, season: i32) -> ForecastResult<BinLayout> {
        Ok(BinLayout {
            first_epiweek: forecast_start(season)?,
            num_week_bins: self.season_length.max(season_length(season)?),
            ili_bin_size: self.ili_bin_size,
            num_ili_bins: self.num_ili_bins,
        })
    }

    /// Builder for `season` with the configured floors and bandwidths.
    ///
    /// # Errors
    /// [`ForecastError::ImpossibleFloor`] or a wrapped distribution error
    /// when floors, bandwidths or the layout are invalid.
    pub fn distribution_builder(&self, season: i32) -> ForecastResult<DistributionBuilder> {
        Ok(DistributionBuilder::new(
            self.layout(season)?,
            self.min_week_prob,
            self.min_ili_prob,
            self.week_bandwidth,
            self.ili_bandwidth,
        )?)
    }

    pub fn extractor(&self) -> TargetExtractor {
        TargetExtractor::new(self.peak_window, self.peakweek_rule_cutoff, self.horizons.clone())
    }

    /// Onset baseline of `location` in `season`. Only regions have one.
    pub fn onset_baseline(&self, season: i32, location: &str) -> Option<f64> {
        if !is_region(location) {
            return None;
        }
        self.onset_baselines
            .get(location)
            .copied()
            .or_else(|| onset_baseline(season, location))
    }

    /// Targets a forecast for `location` must carry.
    pub fn targets(&self, season: i32, location: &str) -> Vec<Target> {
        let mut targets = Vec::with_capacity(self.horizons.len() + 3);
        if self.onset_baseline(season, location).is_some() {
            targets.push(Target::Onset);
        }
        targets.push(Target::PeakWeek);
        targets.push(Target::Peak);
        targets.extend(self.horizons.iter().map(|&k| Target::Ahead(k as u8)));
        targets
    }
}

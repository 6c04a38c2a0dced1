//! targets — forecast targets and their extraction from trajectories.
//!
//! Purpose
//! -------
//! Name the closed set of contest targets and turn each sampled full-season
//! trajectory into the scalar values those targets take.
//!
//! Key behaviors
//! -------------
//! - [`Target`] enumerates onset, peak week, peak height and k-week-ahead.
//!   Week-valued targets index into the season; ILI-valued targets are
//!   percentages.
//! - [`extractor::TargetExtractor`] computes every target for one trajectory
//!   and [`extractor::TargetSamples`] collects them column-wise across an
//!   ensemble.
//! - [`locations`] holds the location registry (region vs state), onset
//!   baselines, and the HHS weights used to aggregate a national value.
//!
//! Conventions
//! -----------
//! - Targets serialize as their short codes (`onset`, `peakweek`, `peak`,
//!   `x1`, `x2`, ...).
pub mod extractor;
pub mod locations;

pub use self::extractor::{TargetExtractor, TargetSample, TargetSamples};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One forecast target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Target {
    /// First week of three consecutive weeks at or above the onset baseline.
    Onset,
    /// Week of the season peak.
    PeakWeek,
    /// Height of the season peak.
    Peak,
    /// Value `k` weeks after the most recent observation.
    Ahead(u8),
}

impl Target {
    /// `true` for ILI-valued targets, `false` for week-valued ones.
    pub fn is_ili(self) -> bool {
        matches!(self, Target::Peak | Target::Ahead(_))
    }

    pub fn is_week(self) -> bool {
        !self.is_ili()
    }

    pub fn code(self) -> String {
        match self {
            Target::Onset => "onset".to_string(),
            Target::PeakWeek => "peakweek".to_string(),
            Target::Peak => "peak".to_string(),
            Target::Ahead(k) => format!("x{k}"),
        }
    }

    /// Human-facing name used by the contest submission templates.
    pub fn display_name(self) -> String {
        match self {
            Target::Onset => "Season onset".to_string(),
            Target::PeakWeek => "Season peak week".to_string(),
            Target::Peak => "Season peak percentage".to_string(),
            Target::Ahead(k) => format!("{k} wk ahead"),
        }
    }

    /// Inverse of [`Target::display_name`].
    pub fn from_display_name(name: &str) -> Option<Target> {
        match name {
            "Season onset" => Some(Target::Onset),
            "Season peak week" => Some(Target::PeakWeek),
            "Season peak percentage" => Some(Target::Peak),
            other => {
                let k = other.strip_suffix(" wk ahead")?.parse::<u8>().ok()?;
                if k == 0 { None } else { Some(Target::Ahead(k)) }
            }
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code())
    }
}

/// Error returned when parsing an unknown target code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTarget(pub String);

impl std::error::Error for UnknownTarget {}

impl std::fmt::Display for UnknownTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown target '{}'", self.0)
    }
}

impl FromStr for Target {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onset" => Ok(Target::Onset),
            "peakweek" => Ok(Target::PeakWeek),
            "peak" => Ok(Target::Peak),
            other => other
                .strip_prefix('x')
                .and_then(|k| k.parse::<u8>().ok())
                .filter(|&k| k > 0)
                .map(Target::Ahead)
                .ok_or_else(|| UnknownTarget(s.to_string())),
        }
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        target.code()
    }
}

impl TryFrom<String> for Target {
    type Error = UnknownTarget;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

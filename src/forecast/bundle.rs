//! Forecast bundle: metadata plus one [`LocationForecast`] per location.
//!
//! A [`Forecast`] is built up location by location and becomes valid only
//! once [`Forecast::sanity_check`] passes. The check collects every
//! violation across all locations before failing, so one error reports the
//! complete list.
use crate::{
    calendar::Epiweek,
    distribution::BinLayout,
    forecast::{
        errors::{ForecastError, ForecastResult},
        location::LocationForecast,
    },
    targets::locations::is_region,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub season: i32,
    pub issue: Epiweek,
    pub team: String,
    pub timestamp: DateTime<Utc>,
    pub layout: BinLayout,
    locations: Vec<LocationForecast>,
}

impl Forecast {
    /// Empty forecast stamped with the current time.
    pub fn new(season: i32, issue: Epiweek, team: impl Into<String>, layout: BinLayout) -> Self {
        Self {
            season,
            issue,
            team: team.into(),
            timestamp: Utc::now(),
            layout,
            locations: Vec::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Add a location, replacing any earlier forecast for it.
    pub fn add(&mut self, forecast: LocationForecast) {
        match self.locations.iter_mut().find(|l| l.location == forecast.location) {
            Some(existing) => *existing = forecast,
            None => self.locations.push(forecast),
        }
    }

    pub fn get(&self, location: &str) -> Option<&LocationForecast> {
        self.locations.iter().find(|l| l.location == location)
    }

    /// Locations in insertion order.
    pub fn locations(&self) -> impl Iterator<Item = &LocationForecast> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// # Errors
    /// [`ForecastError::DistributionInvariant`] listing every violation,
    /// each prefixed by its location, when any location is invalid, uses a
    /// different bin layout, or the forecast is empty.
    pub fn sanity_check(&self) -> ForecastResult<()> {
        let mut violations = Vec::new();
        if self.locations.is_empty() {
            violations.push("forecast has no locations".to_string());
        }
        for location in &self.locations {
            if *location.layout() != self.layout {
                violations
                    .push(format!("{}: bin layout differs from the forecast", location.location));
            }
            violations.extend(
                location.sanity_check().into_iter().map(|v| format!("{}/{v}", location.location)),
            );
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ForecastError::DistributionInvariant { violations })
        }
    }

    fn with_locations(&self, locations: Vec<LocationForecast>) -> Self {
        Self {
            season: self.season,
            issue: self.issue,
            team: self.team.clone(),
            timestamp: self.timestamp,
            layout: self.layout,
            locations,
        }
    }

    /// `(regions, everything else)`, both keeping this forecast's metadata.
    pub fn split(&self) -> (Forecast, Forecast) {
        let (regional, other): (Vec<_>, Vec<_>) =
            self.locations.iter().cloned().partition(|l| is_region(&l.location));
        (self.with_locations(regional), self.with_locations(other))
    }

    /// Combine two forecasts of the same run.
    ///
    /// # Errors
    /// [`ForecastError::IncompatibleForecasts`] when season, issue, team or
    /// layout differ, or when a location appears in both.
    pub fn join(&self, other: &Forecast) -> ForecastResult<Forecast> {
        if self.season != other.season || self.issue != other.issue {
            return Err(ForecastError::IncompatibleForecasts {
                reason: "season or issue differs",
            });
        }
        if self.team != other.team || self.layout != other.layout {
            return Err(ForecastError::IncompatibleForecasts {
                reason: "team or bin layout differs",
            });
        }
        if other.locations.iter().any(|l| self.get(&l.location).is_some()) {
            return Err(ForecastError::IncompatibleForecasts {
                reason: "a location appears in both forecasts",
            });
        }
        let mut locations = self.locations.clone();
        locations.extend(other.locations.iter().cloned());
        Ok(self.with_locations(locations))
    }
}

//! External data collaborators.
//!
//! Purpose
//! -------
//! Abstract the surveillance store the forecasting processes read from, so
//! the core never talks to a database directly. Production callers implement
//! [`SurveillanceSource`] over their own storage; [`MemorySource`] is an
//! in-memory implementation used by tests and offline replays.
//!
//! Conventions
//! -----------
//! - "Stable" values are fully revised; "lagged" values are what was
//!   published `lag` weeks after the epiweek itself.
//! - Sources return complete results or an error; there are no partial
//!   reads. Missing weeks are reported as
//!   [`ForecastError::InsufficientData`].
use crate::{
    calendar::Epiweek,
    forecast::errors::{ForecastError, ForecastResult},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One forecaster's predicted values for the rest of the season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSubmission {
    pub user_id: u64,
    /// Predictions for the weeks after the issue, in order.
    pub values: Vec<f64>,
}

/// Read-only access to observed series, user submissions and auxiliary
/// signals.
pub trait SurveillanceSource {
    /// Values for `first..=issue` as they were known at `issue`.
    fn history(
        &self, location: &str, first: Epiweek, issue: Epiweek,
    ) -> ForecastResult<Vec<f64>>;

    /// Fully revised values for every available epiweek.
    fn stable_history(&self, location: &str) -> ForecastResult<BTreeMap<Epiweek, f64>>;

    /// Values as first published `lag` weeks after each epiweek.
    fn lagged_history(
        &self, _location: &str, _lag: usize,
    ) -> ForecastResult<BTreeMap<Epiweek, f64>> {
        Ok(BTreeMap::new())
    }

    /// Submissions made for `issue`.
    fn user_submissions(
        &self, _location: &str, _issue: Epiweek,
    ) -> ForecastResult<Vec<UserSubmission>> {
        Ok(Vec::new())
    }

    /// Value of a named auxiliary signal (e.g. a nowcast) at `epiweek`.
    fn signal(
        &self, _name: &str, _location: &str, _epiweek: Epiweek,
    ) -> ForecastResult<Option<f64>> {
        Ok(None)
    }
}

/// In-memory [`SurveillanceSource`].
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    stable: BTreeMap<String, BTreeMap<Epiweek, f64>>,
    lagged: BTreeMap<(String, usize), BTreeMap<Epiweek, f64>>,
    submissions: BTreeMap<(String, Epiweek), Vec<UserSubmission>>,
    signals: BTreeMap<(String, String), BTreeMap<Epiweek, f64>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or overwrite) stable values for `location`.
    pub fn insert_stable<I>(&mut self, location: &str, values: I)
    where
        I: IntoIterator<Item = (Epiweek, f64)>,
    {
        self.stable.entry(location.to_string()).or_default().extend(values);
    }

    /// Add values published `lag` weeks after their epiweek.
    pub fn insert_lagged<I>(&mut self, location: &str, lag: usize, values: I)
    where
        I: IntoIterator<Item = (Epiweek, f64)>,
    {
        self.lagged.entry((location.to_string(), lag)).or_default().extend(values);
    }

    pub fn insert_submissions(
        &mut self, location: &str, issue: Epiweek, submissions: Vec<UserSubmission>,
    ) {
        self.submissions.insert((location.to_string(), issue), submissions);
    }

    pub fn insert_signal<I>(&mut self, name: &str, location: &str, values: I)
    where
        I: IntoIterator<Item = (Epiweek, f64)>,
    {
        self.signals.entry((name.to_string(), location.to_string())).or_default().extend(values);
    }
}

impl SurveillanceSource for MemorySource {
    /// Prefers the value published at the matching lag and falls back to
    /// the stable value.
    fn history(
        &self, location: &str, first: Epiweek, issue: Epiweek,
    ) -> ForecastResult<Vec<f64>> {
        let stable = self.stable.get(location);
        let mut values = Vec::new();
        for week in first.range(issue, true) {
            let lag = usize::try_from(week.delta(issue)).unwrap_or(0);
            let value = self
                .lagged
                .get(&(location.to_string(), lag))
                .and_then(|series| series.get(&week))
                .or_else(|| stable.and_then(|series| series.get(&week)));
            match value {
                Some(v) => values.push(*v),
                None => {
                    return Err(ForecastError::insufficient(
                        location,
                        format!("no value for {week} as of {issue}"),
                    ));
                }
            }
        }
        Ok(values)
    }

    fn stable_history(&self, location: &str) -> ForecastResult<BTreeMap<Epiweek, f64>> {
        self.stable
            .get(location)
            .cloned()
            .ok_or_else(|| ForecastError::insufficient(location, "no stable history"))
    }

    fn lagged_history(
        &self, location: &str, lag: usize,
    ) -> ForecastResult<BTreeMap<Epiweek, f64>> {
        Ok(self.lagged.get(&(location.to_string(), lag)).cloned().unwrap_or_default())
    }

    fn user_submissions(
        &self, location: &str, issue: Epiweek,
    ) -> ForecastResult<Vec<UserSubmission>> {
        Ok(self.submissions.get(&(location.to_string(), issue)).cloned().unwrap_or_default())
    }

    fn signal(
        &self, name: &str, location: &str, epiweek: Epiweek,
    ) -> ForecastResult<Option<f64>> {
        Ok(self
            .signals
            .get(&(name.to_string(), location.to_string()))
            .and_then(|series| series.get(&epiweek))
            .copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ew(code: u32) -> Epiweek {
        Epiweek::new(code).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // History reads the value published at the matching lag when present
    // and the stable value otherwise.
    //
    // Given
    // -----
    // - Stable values 1, 2, 3 for 201540..201542.
    // - A lag-0 value of 9 for 201542.
    //
    // Expect
    // ------
    // - History as of 201542 is [1, 2, 9].
    fn history_prefers_lagged_values() {
        let mut source = MemorySource::new();
        source.insert_stable("nat", [(ew(201540), 1.0), (ew(201541), 2.0), (ew(201542), 3.0)]);
        source.insert_lagged("nat", 0, [(ew(201542), 9.0)]);
        assert_eq!(source.history("nat", ew(201540), ew(201542)).unwrap(), vec![1.0, 2.0, 9.0]);
        assert_eq!(source.history("nat", ew(201540), ew(201541)).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    // Purpose
    // -------
    // Gaps and unknown locations are recoverable data errors.
    fn missing_data_is_insufficient() {
        let mut source = MemorySource::new();
        source.insert_stable("nat", [(ew(201540), 1.0)]);
        let err = source.history("nat", ew(201540), ew(201541)).unwrap_err();
        assert!(err.is_recoverable());
        assert!(source.stable_history("hhs1").unwrap_err().is_recoverable());
    }

    #[test]
    // Purpose
    // -------
    // Optional collections default to empty and signals to absent.
    fn optional_collections_default_empty() {
        let source = MemorySource::new();
        assert!(source.user_submissions("nat", ew(201545)).unwrap().is_empty());
        assert!(source.lagged_history("nat", 3).unwrap().is_empty());
        assert_eq!(source.signal("wiki", "nat", ew(201545)).unwrap(), None);
    }
}

//! Epiweek value type and MMWR calendar arithmetic.
//!
//! Purpose
//! -------
//! Represent CDC epidemiological weeks as validated `YYYYWW` codes and provide
//! the arithmetic every other module relies on: shifting by a number of weeks,
//! signed week deltas, lazy ranges, and flu-season boundaries.
//!
//! Key behaviors
//! -------------
//! - [`Epiweek::new`] / [`Epiweek::join`] validate the week against the real
//!   number of epiweeks in the year (52 or 53).
//! - Arithmetic is done on the Sunday that starts each week, so year
//!   boundaries and 53-week years roll over correctly.
//! - [`EpiweekRange`] is a cloneable iterator; cloning it restarts the range.
//!
//! Invariants & assumptions
//! ------------------------
//! - Epiweeks start on Sunday. Week 1 of a year is the first week with at least
//!   four days in January (MMWR definition).
//! - Years are restricted to `[1000, 9999]` so the `YYYYWW` encoding is
//!   unambiguous.
//! - Integer ordering of codes equals chronological ordering.
//!
//! Conventions
//! -----------
//! - `delta(a, b)` is `b - a` in weeks, so `a.add(a.delta(b)) == b`.
//! - A flu season runs from week 30 of its start year through week 29 of the
//!   following year; the contest forecast window is week 40 through week 20.
use crate::calendar::errors::{EpiweekError, EpiweekResult};
use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

/// First week of a flu season (surveillance year boundary).
pub const SEASON_START_WEEK: u32 = 30;

/// First week of the contest forecast window.
pub const FORECAST_FIRST_WEEK: u32 = 40;

/// Last week (in the following calendar year) of the contest forecast window.
pub const FORECAST_LAST_WEEK: u32 = 20;

const MIN_YEAR: i32 = 1000;
const MAX_YEAR: i32 = 9999;

/// A validated CDC epiweek, stored as `year * 100 + week`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Epiweek(u32);

impl Epiweek {
    /// Parse and validate a `YYYYWW` code.
    ///
    /// # Errors
    /// - [`EpiweekError::InvalidYear`] if the year is outside `[1000, 9999]`.
    /// - [`EpiweekError::InvalidWeek`] if the week does not exist in that year.
    pub fn new(code: u32) -> EpiweekResult<Self> {
        let year = (code / 100) as i32;
        let week = code % 100;
        Self::join(year, week)
    }

    /// Build an epiweek from its year and week components.
    pub fn join(year: i32, week: u32) -> EpiweekResult<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(EpiweekError::InvalidYear { year });
        }
        let max_week = weeks_in_year(year)?;
        if week < 1 || week > max_week {
            return Err(EpiweekError::InvalidWeek { year, week, max_week });
        }
        Ok(Epiweek(year as u32 * 100 + week))
    }

    /// The `YYYYWW` integer code.
    pub fn code(self) -> u32 {
        self.0
    }

    pub fn year(self) -> i32 {
        (self.0 / 100) as i32
    }

    pub fn week(self) -> u32 {
        self.0 % 100
    }

    /// Split into `(year, week)`.
    pub fn split(self) -> (i32, u32) {
        (self.year(), self.week())
    }

    /// The Sunday on which this epiweek begins.
    pub fn start_date(self) -> EpiweekResult<NaiveDate> {
        let start = year_start(self.year())?;
        start
            .checked_add_signed(TimeDelta::days(7 * (i64::from(self.week()) - 1)))
            .ok_or(EpiweekError::Overflow { code: self.0, weeks: 0 })
    }

    /// The epiweek containing `date`.
    pub fn from_date(date: NaiveDate) -> EpiweekResult<Self> {
        let year = date.year();
        for candidate in [year + 1, year, year - 1] {
            let start = year_start(candidate)?;
            if date >= start {
                let week = (date - start).num_days() / 7 + 1;
                return Self::join(candidate, week as u32);
            }
        }
        Err(EpiweekError::InvalidYear { year })
    }

    /// Shift by `weeks` (may be negative).
    ///
    /// # Errors
    /// [`EpiweekError::Overflow`] when the result leaves the supported range.
    pub fn add(self, weeks: i64) -> EpiweekResult<Self> {
        let overflow = EpiweekError::Overflow { code: self.0, weeks };
        let shift = TimeDelta::try_weeks(weeks).ok_or_else(|| overflow.clone())?;
        let date = self.start_date()?.checked_add_signed(shift).ok_or_else(|| overflow.clone())?;
        Self::from_date(date).map_err(|_| overflow)
    }

    /// Signed number of weeks from `self` to `other` (`other - self`).
    pub fn delta(self, other: Epiweek) -> i64 {
        match (self.start_date(), other.start_date()) {
            (Ok(a), Ok(b)) => (b - a).num_days() / 7,
            // Both codes were validated on construction, so their start dates exist.
            _ => 0,
        }
    }

    /// Lazy range from `self` to `end`; empty when `end` precedes `self`.
    pub fn range(self, end: Epiweek, inclusive: bool) -> EpiweekRange {
        EpiweekRange::new(self, end, inclusive)
    }

    /// Start year of the flu season containing this week.
    pub fn season_year(self) -> i32 {
        if self.week() >= SEASON_START_WEEK { self.year() } else { self.year() - 1 }
    }

    /// `(first, last)` epiweek of the flu season containing this week.
    pub fn season(self) -> EpiweekResult<(Epiweek, Epiweek)> {
        let year = self.season_year();
        let first = Epiweek::join(year, SEASON_START_WEEK)?;
        Ok((first, Epiweek::join(year + 1, SEASON_START_WEEK - 1)?))
    }

    /// Whether this week lies in the off-season gap (weeks 21–39) that the
    /// contest does not forecast.
    pub fn is_off_season(self) -> bool {
        self.week() > FORECAST_LAST_WEEK && self.week() < FORECAST_FIRST_WEEK
    }
}

impl TryFrom<u32> for Epiweek {
    type Error = EpiweekError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Epiweek::new(code)
    }
}

impl From<Epiweek> for u32 {
    fn from(ew: Epiweek) -> Self {
        ew.0
    }
}

impl std::fmt::Display for Epiweek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered, finite, restartable sequence of consecutive epiweeks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpiweekRange {
    next: Option<Epiweek>,
    last: Option<Epiweek>,
}

impl EpiweekRange {
    fn new(start: Epiweek, end: Epiweek, inclusive: bool) -> Self {
        let last = if inclusive { Some(end) } else { end.add(-1).ok() };
        match last {
            Some(last) if start <= last => EpiweekRange { next: Some(start), last: Some(last) },
            _ => EpiweekRange { next: None, last: None },
        }
    }
}

impl Iterator for EpiweekRange {
    type Item = Epiweek;

    fn next(&mut self) -> Option<Epiweek> {
        let current = self.next?;
        self.next = match self.last {
            Some(last) if current < last => current.add(1).ok(),
            _ => None,
        };
        Some(current)
    }
}

/// Number of epiweeks (52 or 53) in `year`.
pub fn weeks_in_year(year: i32) -> EpiweekResult<u32> {
    let this = year_start(year)?;
    let next = year_start(year + 1)?;
    Ok(((next - this).num_days() / 7) as u32)
}

/// Sunday starting week 1 of `year`.
fn year_start(year: i32) -> EpiweekResult<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(EpiweekError::InvalidYear { year })?;
    let offset = i64::from(jan1.weekday().num_days_from_sunday());
    let shift = if offset <= 3 { -offset } else { 7 - offset };
    jan1.checked_add_signed(TimeDelta::days(shift)).ok_or(EpiweekError::InvalidYear { year })
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation in `Epiweek::new` / `Epiweek::join`.
    // - 52- vs 53-week years and rollover in `add` / `delta`.
    // - `range` semantics (inclusive/exclusive, empty, restartable).
    // - Season boundaries.
    // -------------------------------------------------------------------------

    fn ew(code: u32) -> Epiweek {
        Epiweek::new(code).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Known MMWR calendars: 2014 and 2020 have 53 weeks, 2015 and 2019 have 52.
    fn weeks_in_year_matches_mmwr_calendar() {
        assert_eq!(weeks_in_year(2014).unwrap(), 53);
        assert_eq!(weeks_in_year(2015).unwrap(), 52);
        assert_eq!(weeks_in_year(2019).unwrap(), 52);
        assert_eq!(weeks_in_year(2020).unwrap(), 53);
    }

    #[test]
    // Purpose
    // -------
    // Week 53 only exists in 53-week years; week 0 never exists.
    fn new_rejects_weeks_outside_year() {
        assert!(Epiweek::new(201453).is_ok());
        assert_eq!(
            Epiweek::new(201553).unwrap_err(),
            EpiweekError::InvalidWeek { year: 2015, week: 53, max_week: 52 }
        );
        assert!(matches!(Epiweek::new(201500), Err(EpiweekError::InvalidWeek { .. })));
        assert!(matches!(Epiweek::new(99901), Err(EpiweekError::InvalidYear { .. })));
    }

    #[test]
    // Purpose
    // -------
    // `add` rolls over year boundaries and respects week 53.
    fn add_rolls_over_year_boundaries() {
        assert_eq!(ew(201452).add(1).unwrap(), ew(201453));
        assert_eq!(ew(201453).add(1).unwrap(), ew(201501));
        assert_eq!(ew(201552).add(1).unwrap(), ew(201601));
        assert_eq!(ew(201601).add(-1).unwrap(), ew(201552));
        assert_eq!(ew(201540).add(33).unwrap(), ew(201621));
    }

    #[test]
    // Purpose
    // -------
    // `add(add(ew, n), -n) == ew` and `delta(ew, add(ew, n)) == n` over a
    // spread of starting weeks and offsets, including multi-year jumps.
    fn add_and_delta_round_trip() {
        for start in [200901, 201440, 201453, 201552, 202001, 202053] {
            let start = ew(start);
            for n in [-300_i64, -53, -1, 0, 1, 13, 52, 53, 260] {
                let shifted = start.add(n).unwrap();
                assert_eq!(shifted.add(-n).unwrap(), start);
                assert_eq!(start.delta(shifted), n);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Ranges are ordered, honor `inclusive`, are empty when reversed, and can
    // be restarted by cloning.
    fn range_is_ordered_and_restartable() {
        let range = ew(201451).range(ew(201502), false);
        let weeks: Vec<u32> = range.clone().map(Epiweek::code).collect();
        assert_eq!(weeks, vec![201451, 201452, 201453, 201501]);
        assert_eq!(range.count(), 4);

        let inclusive: Vec<u32> = ew(201451).range(ew(201502), true).map(Epiweek::code).collect();
        assert_eq!(inclusive.last(), Some(&201502));

        assert_eq!(ew(201502).range(ew(201451), true).count(), 0);
        assert_eq!(ew(201502).range(ew(201502), false).count(), 0);
        assert_eq!(ew(201502).range(ew(201502), true).count(), 1);
    }

    #[test]
    // Purpose
    // -------
    // Seasons start at week 30 and end at week 29 of the following year.
    fn season_boundaries() {
        assert_eq!(ew(201545).season().unwrap(), (ew(201530), ew(201629)));
        assert_eq!(ew(201610).season().unwrap(), (ew(201530), ew(201629)));
        assert_eq!(ew(201530).season_year(), 2015);
        assert_eq!(ew(201529).season_year(), 2014);
        assert!(ew(201530).is_off_season());
        assert!(!ew(201540).is_off_season());
        assert!(!ew(201620).is_off_season());
    }

    #[test]
    // Purpose
    // -------
    // Start dates are Sundays and `from_date` inverts `start_date` for any
    // day of the week.
    fn start_date_and_from_date_agree() {
        let start = ew(201501).start_date().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2015, 1, 4).unwrap());
        for day in 0..7 {
            let date = start + TimeDelta::days(day);
            assert_eq!(Epiweek::from_date(date).unwrap(), ew(201501));
        }
        // 2014-12-31 (Wednesday) still belongs to 2014w53.
        assert_eq!(
            Epiweek::from_date(NaiveDate::from_ymd_opt(2014, 12, 31).unwrap()).unwrap(),
            ew(201453)
        );
    }
}

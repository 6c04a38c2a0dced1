//! Errors for epiweek parsing and arithmetic.
//!
//! [`EpiweekError`] is raised whenever a `YYYYWW` code is malformed, names a
//! week that does not exist in its year, or arithmetic leaves the supported
//! calendar range. Calendar errors are never retried; callers surface them
//! unchanged (see `forecast::errors::ForecastError::InvalidEpiweek`).

/// Result alias for calendar operations that may produce [`EpiweekError`].
pub type EpiweekResult<T> = Result<T, EpiweekError>;

#[derive(Debug, Clone, PartialEq)]
pub enum EpiweekError {
    /// Week is outside `[1, max_week]` for the given year.
    InvalidWeek { year: i32, week: u32, max_week: u32 },

    /// Year is outside the supported `YYYY` range.
    InvalidYear { year: i32 },

    /// Adding `weeks` to `code` left the supported calendar range.
    Overflow { code: u32, weeks: i64 },
}

impl std::error::Error for EpiweekError {}

impl std::fmt::Display for EpiweekError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EpiweekError::InvalidWeek { year, week, max_week } => {
                write!(f, "Invalid epiweek {year}w{week:02}: week must be in [1, {max_week}]")
            }
            EpiweekError::InvalidYear { year } => {
                write!(f, "Invalid epiweek year {year}: must be a four-digit year")
            }
            EpiweekError::Overflow { code, weeks } => {
                write!(f, "Epiweek arithmetic overflow: {code} + {weeks} weeks")
            }
        }
    }
}

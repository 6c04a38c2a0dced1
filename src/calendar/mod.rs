//! calendar — CDC epiweek arithmetic.
//!
//! Purpose
//! -------
//! Provide the pure date/epiweek functions that every other module uses to
//! translate between `YYYYWW` codes, season indices and week offsets.
//!
//! Key behaviors
//! -------------
//! - [`Epiweek`] is the validated value type; [`EpiweekRange`] its lazy range.
//! - The free functions below mirror the value-type methods for callers that
//!   hold raw `YYYYWW` integers (e.g. data arriving from an external store);
//!   they validate their inputs and fail with [`EpiweekError`] on malformed
//!   codes.
//!
//! Invariants & assumptions
//! ------------------------
//! - No state; every function is pure.
//! - `add(add(ew, n), -n) == ew` and `delta(ew, add(ew, n)) == n`.
pub mod epiweek;
pub mod errors;

pub use self::epiweek::{
    Epiweek, EpiweekRange, FORECAST_FIRST_WEEK, FORECAST_LAST_WEEK, SEASON_START_WEEK,
    weeks_in_year,
};
pub use self::errors::{EpiweekError, EpiweekResult};

/// Shift a raw epiweek code by `n` weeks.
pub fn add(epiweek: u32, n: i64) -> EpiweekResult<u32> {
    Ok(Epiweek::new(epiweek)?.add(n)?.code())
}

/// Signed number of weeks from `ew1` to `ew2`.
pub fn delta(ew1: u32, ew2: u32) -> EpiweekResult<i64> {
    Ok(Epiweek::new(ew1)?.delta(Epiweek::new(ew2)?))
}

/// Lazy range of epiweeks between two raw codes.
pub fn range(ew1: u32, ew2: u32, inclusive: bool) -> EpiweekResult<EpiweekRange> {
    Ok(Epiweek::new(ew1)?.range(Epiweek::new(ew2)?, inclusive))
}

/// `(start, end)` of the flu season containing `epiweek`.
pub fn season_of(epiweek: u32) -> EpiweekResult<(u32, u32)> {
    let (start, end) = Epiweek::new(epiweek)?.season()?;
    Ok((start.code(), end.code()))
}

/// Split a raw code into `(year, week)`.
pub fn split(epiweek: u32) -> EpiweekResult<(i32, u32)> {
    Ok(Epiweek::new(epiweek)?.split())
}

/// Join `(year, week)` into a raw code.
pub fn join(year: i32, week: u32) -> EpiweekResult<u32> {
    Ok(Epiweek::join(year, week)?.code())
}

/// First epiweek of the contest forecast window for `season` (week 40).
pub fn forecast_start(season: i32) -> EpiweekResult<Epiweek> {
    Epiweek::join(season, FORECAST_FIRST_WEEK)
}

/// Last epiweek of the contest forecast window for `season` (week 20 of the
/// following year).
pub fn forecast_end(season: i32) -> EpiweekResult<Epiweek> {
    Epiweek::join(season + 1, FORECAST_LAST_WEEK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Raw-code helpers validate inputs and agree with the value type.
    fn raw_code_helpers_validate_and_delegate() {
        assert_eq!(add(201552, 1).unwrap(), 201601);
        assert_eq!(delta(201540, 201620).unwrap(), 32);
        assert_eq!(range(201540, 201543, false).unwrap().count(), 3);
        assert_eq!(season_of(201605).unwrap(), (201530, 201629));
        assert_eq!(split(201605).unwrap(), (2016, 5));
        assert_eq!(join(2016, 5).unwrap(), 201605);
        assert!(add(201554, 1).is_err());
        assert!(delta(201540, 201699).is_err());
        assert!(join(2016, 0).is_err());
    }

    #[test]
    // Purpose
    // -------
    // The contest window spans 33 weeks in a 52-week year and 34 in a
    // 53-week year.
    fn forecast_window_length_depends_on_year() {
        let s15 = forecast_start(2015).unwrap().delta(forecast_end(2015).unwrap()) + 1;
        let s14 = forecast_start(2014).unwrap().delta(forecast_end(2014).unwrap()) + 1;
        assert_eq!(s15, 33);
        assert_eq!(s14, 34);
    }
}

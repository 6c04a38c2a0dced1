//! Archetype curve model.
//!
//! Purpose
//! -------
//! Summarise the historical seasons of one location as a single reference
//! curve that can be shifted in time and scaled in height, together with the
//! unaligned weekly mean/variance and a multiplicative holiday adjustment.
//!
//! Key behaviors
//! -------------
//! - Curves span [`ARCHETYPE_WEEKS`] weeks starting at week 30.
//! - Holiday factors compare each holiday-window week with the straight line
//!   between the weeks bracketing the window; multiplying observed values by
//!   the factor removes the holiday bump, dividing adds it back.
//! - The reference shape is the mean of holiday-free, lightly smoothed
//!   curves aligned on their peaks at the earliest historical peak, so
//!   positive shifts move the peak later.
//!
//! Invariants & assumptions
//! ------------------------
//! - At least two training curves of exactly [`ARCHETYPE_WEEKS`] values.
//! - Variances are floored at [`MIN_VARIANCE`]; holiday factors are
//!   strictly positive.
use crate::{
    distribution::stats::{mean, sample_variance},
    forecast::errors::{ForecastError, ForecastResult},
};
use serde::{Deserialize, Serialize};

/// Weeks in an archetype curve (week 30 through week 29 of the next year).
pub const ARCHETYPE_WEEKS: usize = 52;

/// Floor applied to per-week variances.
pub const MIN_VARIANCE: f64 = 1e-3;

/// Curve indices affected by the winter holidays (about weeks 49 to 3).
pub const HOLIDAY_WINDOW: std::ops::RangeInclusive<usize> = 19..=25;

const SMOOTHING_HALF_WIDTH: usize = 1;

/// Trained archetype of one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    /// Per-week mean of the raw training curves.
    pub mean: Vec<f64>,
    /// Per-week sample variance of the raw training curves.
    pub var: Vec<f64>,
    /// Factor that removes the holiday effect from a week's value.
    pub holiday: Vec<f64>,
    /// Peak-aligned reference shape.
    pub shape: Vec<f64>,
    /// Level the scale parameter stretches away from.
    pub baseline: f64,
}

impl Archetype {
    /// Build an archetype from complete historical curves.
    ///
    /// # Errors
    /// [`ForecastError::Training`] with fewer than two curves or curves of
    /// the wrong length.
    pub fn train(location: &str, curves: &[Vec<f64>], baseline: f64) -> ForecastResult<Self> {
        if curves.len() < 2 {
            return Err(ForecastError::training(
                location,
                format!("{} training seasons, need at least 2", curves.len()),
            ));
        }
        if let Some(c) = curves.iter().find(|c| c.len() != ARCHETYPE_WEEKS) {
            return Err(ForecastError::training(
                location,
                format!("training curve has {} weeks, expected {ARCHETYPE_WEEKS}", c.len()),
            ));
        }

        let (week_mean, week_var) = column_stats(curves);
        let holiday = holiday_factors(curves);
        let adjusted: Vec<Vec<f64>> = curves
            .iter()
            .map(|c| {
                let free: Vec<f64> = c.iter().zip(&holiday).map(|(v, h)| v * h).collect();
                moving_average(&free)
            })
            .collect();
        let shape = aligned_mean(&adjusted);

        Ok(Self { mean: week_mean, var: week_var, holiday, shape, baseline })
    }

    pub fn len(&self) -> usize {
        self.shape.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Reference curve shifted later by `shift` weeks and stretched by
    /// `scale` around the baseline, optionally with the holiday effect.
    pub fn instance(&self, scale: f64, shift: f64, add_holiday: bool) -> Vec<f64> {
        (0..self.len())
            .map(|i| {
                let base = interpolate(&self.shape, i as f64 - shift);
                let value = (self.baseline + scale * (base - self.baseline)).max(0.0);
                if add_holiday { self.add_holiday_week(value, i) } else { value }
            })
            .collect()
    }

    /// Put the holiday effect of curve index `week` back into `value`.
    pub fn add_holiday_week(&self, value: f64, week: usize) -> f64 {
        match self.holiday.get(week) {
            Some(h) => value / h,
            None => value,
        }
    }

    /// Remove the holiday effect from values observed from week 30 on.
    pub fn remove_holiday(&self, values: &[f64]) -> Vec<f64> {
        values.iter().enumerate().map(|(i, v)| v * self.holiday.get(i).unwrap_or(&1.0)).collect()
    }
}

fn column_stats(curves: &[Vec<f64>]) -> (Vec<f64>, Vec<f64>) {
    (0..ARCHETYPE_WEEKS)
        .map(|i| {
            let column: Vec<f64> = curves.iter().map(|c| c[i]).collect();
            let m = mean(&column).unwrap_or(0.0);
            let v = sample_variance(&column).unwrap_or(0.0).max(MIN_VARIANCE);
            (m, v)
        })
        .unzip()
}

fn holiday_factors(curves: &[Vec<f64>]) -> Vec<f64> {
    let before = *HOLIDAY_WINDOW.start() - 1;
    let after = *HOLIDAY_WINDOW.end() + 1;
    let span = (after - before) as f64;
    let mut factors = vec![1.0; ARCHETYPE_WEEKS];
    for i in HOLIDAY_WINDOW {
        let t = (i - before) as f64 / span;
        let ratios: Vec<f64> = curves
            .iter()
            .filter_map(|c| {
                let trend = c[before] + t * (c[after] - c[before]);
                (trend > 0.0 && c[i] > 0.0).then(|| trend / c[i])
            })
            .collect();
        if let Some(m) = mean(&ratios) {
            factors[i] = m;
        }
    }
    factors
}

fn moving_average(curve: &[f64]) -> Vec<f64> {
    (0..curve.len())
        .map(|i| {
            let lo = i.saturating_sub(SMOOTHING_HALF_WIDTH);
            let hi = (i + SMOOTHING_HALF_WIDTH).min(curve.len() - 1);
            curve[lo..=hi].iter().sum::<f64>() / (hi - lo + 1) as f64
        })
        .collect()
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
        .0
}

/// Mean of curves shifted so every peak lands on the earliest peak.
fn aligned_mean(curves: &[Vec<f64>]) -> Vec<f64> {
    let peaks: Vec<usize> = curves.iter().map(|c| argmax(c)).collect();
    let anchor = peaks.iter().copied().min().unwrap_or(0);
    let mut shape = vec![0.0; ARCHETYPE_WEEKS];
    for (curve, peak) in curves.iter().zip(&peaks) {
        let lead = peak - anchor;
        for (i, s) in shape.iter_mut().enumerate() {
            *s += curve[(i + lead).min(ARCHETYPE_WEEKS - 1)];
        }
    }
    shape.iter().map(|s| s / curves.len() as f64).collect()
}

/// Linear interpolation of `values` at fractional index `x`, clamped to the
/// ends.
fn interpolate(values: &[f64], x: f64) -> f64 {
    let Some(last) = values.len().checked_sub(1) else {
        return 0.0;
    };
    if x.is_nan() || x <= 0.0 {
        return values[0];
    }
    if x >= last as f64 {
        return values[last];
    }
    let lo = x.floor() as usize;
    let frac = x - lo as f64;
    values[lo] * (1.0 - frac) + values[lo + 1] * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Training statistics, holiday factors, peak alignment and curve
    // instantiation on small synthetic seasons.
    // -------------------------------------------------------------------------

    /// Triangular season peaking at `peak` with height `height` above 1.
    fn season(peak: usize, height: f64) -> Vec<f64> {
        (0..ARCHETYPE_WEEKS)
            .map(|i| 1.0 + (height - 0.5 * (i as f64 - peak as f64).abs()).max(0.0))
            .collect()
    }

    #[test]
    // Purpose
    // -------
    // Fewer than two seasons, or curves of the wrong length, cannot train.
    fn training_requires_two_full_seasons() {
        assert!(Archetype::train("nat", &[season(20, 4.0)], 0.0).is_err());
        assert!(Archetype::train("nat", &[vec![1.0; 10], vec![1.0; 10]], 0.0).is_err());
        assert!(Archetype::train("nat", &[season(20, 4.0), season(22, 4.0)], 0.0).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Weekly statistics are unaligned and variances are floored.
    //
    // Given
    // -----
    // - Two flat seasons at 1.0 and 3.0.
    //
    // Expect
    // ------
    // - Mean 2 and variance 2 at every week.
    // - Identical seasons give the variance floor.
    fn weekly_statistics() {
        let a = Archetype::train("nat", &[vec![1.0; 52], vec![3.0; 52]], 0.0).unwrap();
        assert_abs_diff_eq!(a.mean[7], 2.0);
        assert_abs_diff_eq!(a.var[7], 2.0);
        let b = Archetype::train("nat", &[vec![1.0; 52], vec![1.0; 52]], 0.0).unwrap();
        assert_eq!(b.var[7], MIN_VARIANCE);
    }

    #[test]
    // Purpose
    // -------
    // A bump inside the holiday window yields a factor that removes it, and
    // weeks outside the window are untouched.
    //
    // Given
    // -----
    // - Flat seasons at 2.0 with week index 22 doubled to 4.0.
    //
    // Expect
    // ------
    // - holiday[22] = 0.5, holiday elsewhere 1; removing then adding the
    //   effect restores the value.
    fn holiday_factors_remove_bumps() {
        let mut curve = vec![2.0; 52];
        curve[22] = 4.0;
        let a = Archetype::train("nat", &[curve.clone(), curve], 0.0).unwrap();
        assert_abs_diff_eq!(a.holiday[22], 0.5);
        assert_abs_diff_eq!(a.holiday[5], 1.0);
        assert_abs_diff_eq!(a.holiday[20], 1.0);
        assert_abs_diff_eq!(a.remove_holiday(&[2.0; 23])[22], 1.0);
        assert_abs_diff_eq!(a.add_holiday_week(1.0, 22), 2.0);
    }

    #[test]
    // Purpose
    // -------
    // Shapes align on the earliest peak; shifting moves the peak later and
    // scaling stretches it.
    //
    // Given
    // -----
    // - Seasons peaking at indices 12 and 14 (outside the holiday window).
    //
    // Expect
    // ------
    // - The unshifted instance peaks at 12; shifting by 3 peaks at 15.
    // - Doubling the scale doubles the peak height with a zero baseline.
    fn instance_shifts_and_scales() {
        let a = Archetype::train("nat", &[season(12, 4.0), season(14, 4.0)], 0.0).unwrap();
        let base = a.instance(1.0, 0.0, false);
        assert_eq!(argmax(&base), 12);
        assert_eq!(argmax(&a.instance(1.0, 3.0, false)), 15);
        let tall = a.instance(2.0, 0.0, false);
        assert_abs_diff_eq!(tall[12], 2.0 * base[12], epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Fractional shifts interpolate linearly between neighbouring weeks.
    fn interpolation_is_linear_and_clamped() {
        let values = [0.0, 2.0, 4.0];
        assert_abs_diff_eq!(interpolate(&values, 0.5), 1.0);
        assert_abs_diff_eq!(interpolate(&values, -3.0), 0.0);
        assert_abs_diff_eq!(interpolate(&values, 7.0), 4.0);
    }
}

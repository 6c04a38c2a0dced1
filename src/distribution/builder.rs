//! Empirical distribution builders for week- and ILI-valued targets.
//!
//! Purpose
//! -------
//! Turn a list of scalar target samples into a binned, smoothed and
//! uniform-blended probability distribution plus a point estimate.
//!
//! Key behaviors
//! -------------
//! - [`build_week_distribution`]: counts indices `0..num_bins` and an
//!   optional none bucket, normalizes, smooths and blends the whole vector
//!   (none included, as the entry after the last week), and reports the
//!   median-low sampled week as an epiweek.
//! - [`build_ili_distribution`]: counts values into `[i·b, (i+1)·b)` bins
//!   with the last bin unbounded above, normalizes, smooths, blends, and
//!   reports the plain median.
//!
//! Invariants & assumptions
//! ------------------------
//! - Outputs sum to one (dist + none) up to rounding, and every entry is at
//!   least `uniform_weight / entries`.
//! - Samples that fall in no bin (week indices past the season, negative or
//!   NaN ILI values) are not counted. When nothing is counted, a single
//!   placeholder sample of 0 stands in so the builder never divides by zero.
use crate::{
    calendar::Epiweek,
    distribution::{
        errors::{DistributionError, DistributionResult},
        smoothing::{blend_uniform, check_weight, normalize, smooth},
        stats::{median, median_low},
    },
};
use serde::{Deserialize, Serialize};

/// Distribution and point for a week-valued target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekForecast {
    /// Probability per season week, index 0 being the first forecast week.
    pub dist: Vec<f64>,
    /// Probability that the event never happens, when the target allows it.
    pub none: Option<f64>,
    pub point: Epiweek,
}

/// Distribution and point for an ILI-valued target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IliForecast {
    /// Probability per ILI bin; the last bin is unbounded above.
    pub dist: Vec<f64>,
    pub point: f64,
}

/// Build the distribution of a week-valued target.
///
/// # Errors
/// - [`DistributionError::NoBins`] when `num_bins == 0`.
/// - [`DistributionError::ImpossibleFloor`] unless `0 < uniform_weight <= 1`.
/// - [`DistributionError::NoneNotAllowed`] when `samples` contains `None`
///   and `allow_none` is false.
/// - [`DistributionError::InvalidBandwidth`] for a negative bandwidth.
pub fn build_week_distribution(
    first_epiweek: Epiweek, num_bins: usize, samples: &[Option<usize>], uniform_weight: f64,
    smoothing_bandwidth: f64, allow_none: bool,
) -> DistributionResult<WeekForecast> {
    if num_bins == 0 {
        return Err(DistributionError::NoBins);
    }
    check_weight(uniform_weight)?;
    let none_count = samples.iter().filter(|s| s.is_none()).count();
    if none_count > 0 && !allow_none {
        return Err(DistributionError::NoneNotAllowed { count: none_count });
    }

    let mut counts = vec![0.0; num_bins];
    for index in samples.iter().flatten() {
        if let Some(slot) = counts.get_mut(*index) {
            *slot += 1.0;
        }
    }
    let none_mass = if allow_none { none_count as f64 } else { 0.0 };
    if counts.iter().sum::<f64>() + none_mass == 0.0 {
        counts[0] = 1.0;
    }

    let weeks = placeholder_indices(samples);
    let point_index = median_low(&weeks).unwrap_or(0);
    let point = first_epiweek.add(point_index as i64)?;

    let blended = finish_week(counts, allow_none.then_some(none_mass), uniform_weight, |d| {
        smooth(d, smoothing_bandwidth)
    })?;
    Ok(WeekForecast { dist: blended.0, none: blended.1, point })
}

/// Build the distribution of an ILI-valued target.
///
/// # Errors
/// - [`DistributionError::NoBins`] when `num_bins == 0`.
/// - [`DistributionError::InvalidBinSize`] for a non-positive bin width.
/// - [`DistributionError::ImpossibleFloor`] unless `0 < uniform_weight <= 1`.
/// - [`DistributionError::InvalidBandwidth`] for a negative bandwidth.
pub fn build_ili_distribution(
    bin_size: f64, num_bins: usize, samples: &[f64], uniform_weight: f64,
    smoothing_bandwidth: f64,
) -> DistributionResult<IliForecast> {
    if num_bins == 0 {
        return Err(DistributionError::NoBins);
    }
    if !bin_size.is_finite() || bin_size <= 0.0 {
        return Err(DistributionError::InvalidBinSize { bin_size });
    }
    check_weight(uniform_weight)?;

    let mut counts = vec![0.0; num_bins];
    for &value in samples {
        if let Some(bin) = ili_bin(value, bin_size, num_bins) {
            counts[bin] += 1.0;
        }
    }
    if counts.iter().sum::<f64>() == 0.0 {
        counts[0] = 1.0;
    }

    let dist = smooth(&normalize(&counts), smoothing_bandwidth)?;
    let dist = blend_uniform(&dist, uniform_weight);
    let point = median(samples).unwrap_or(0.0);
    Ok(IliForecast { dist, point })
}

/// Bin index for an ILI value, or `None` if it falls below zero or is NaN.
///
/// Bins are `[i·b, (i+1)·b)`; everything at or above `(n-1)·b` lands in the
/// last bin.
pub fn ili_bin(value: f64, bin_size: f64, num_bins: usize) -> Option<usize> {
    if value.is_nan() || value < 0.0 {
        return None;
    }
    let last = num_bins - 1;
    if value >= bin_size * last as f64 {
        return Some(last);
    }
    // Division can round across a bin edge; settle on the edges as computed
    // by multiplication.
    let mut bin = (value / bin_size).floor() as usize;
    if bin > 0 && value < bin_size * bin as f64 {
        bin -= 1;
    } else if value >= bin_size * (bin + 1) as f64 {
        bin += 1;
    }
    Some(bin.min(last))
}

/// Non-none week indices, or `[0]` when there are none.
pub(crate) fn placeholder_indices(samples: &[Option<usize>]) -> Vec<usize> {
    let weeks: Vec<usize> = samples.iter().flatten().copied().collect();
    if weeks.is_empty() { vec![0] } else { weeks }
}

/// Shared tail of the week builders: normalize `[dist.., none]`, transform
/// and blend the whole vector, then split it back.
///
/// The none bucket sits after the last week, so smoothing exchanges mass
/// between it and the final weeks.
pub(crate) fn finish_week<F>(
    dist: Vec<f64>, none: Option<f64>, uniform_weight: f64, transform: F,
) -> DistributionResult<(Vec<f64>, Option<f64>)>
where
    F: FnOnce(&[f64]) -> DistributionResult<Vec<f64>>,
{
    let mut full = dist;
    full.extend(none);
    let full = transform(&normalize(&full))?;
    let mut blended = blend_uniform(&full, uniform_weight);
    let none = if none.is_some() { blended.pop() } else { None };
    Ok((blended, none))
}

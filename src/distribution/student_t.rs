//! Student-t distribution fitting for crowd-sourced ensembles.
//!
//! When trajectories come from a small number of human forecasters, binning
//! their values directly gives a spiky histogram. Instead a location-scale
//! Student-t is fitted and integrated over the bins: location is the median,
//! scale the sample standard deviation floored at [`MIN_SCALE`], and the
//! degrees of freedom `max(1, users - 1)`. The fewer the users, the fatter
//! the tails.
//!
//! Bins are integrated with the CDF and then renormalized, so mass outside
//! the covered range is spread proportionally over the bins. No smoothing is
//! applied on top of the fit.
use crate::{
    calendar::Epiweek,
    distribution::{
        builder::{IliForecast, WeekForecast, finish_week, placeholder_indices},
        errors::{DistributionError, DistributionResult},
        smoothing::{blend_uniform, check_weight, normalize},
        stats::{median, median_low, sample_std},
    },
};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Lower bound on the fitted scale.
pub const MIN_SCALE: f64 = 1e-3;

/// Location, scale and degrees of freedom of a fitted Student-t.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentTFit {
    pub location: f64,
    pub scale: f64,
    pub freedom: f64,
}

impl StudentTFit {
    /// Fit to `values` for an ensemble of `num_users` forecasters.
    ///
    /// NaNs are ignored; an empty input fits a single placeholder of 0.
    pub fn fit(values: &[f64], num_users: usize) -> Self {
        let mut finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if finite.is_empty() {
            finite.push(0.0);
        }
        let location = median(&finite).unwrap_or(0.0);
        let scale = sample_std(&finite).unwrap_or(0.0).max(MIN_SCALE);
        let freedom = num_users.saturating_sub(1).max(1) as f64;
        Self { location, scale, freedom }
    }

    /// Integrated, renormalized mass over `num_bins` bins of width
    /// `bin_size` starting at `first_value`. With `unbounded`, the last bin
    /// extends to `+∞`.
    pub fn bin_masses(
        &self, num_bins: usize, bin_size: f64, first_value: f64, unbounded: bool,
    ) -> DistributionResult<Vec<f64>> {
        let dist = StudentsT::new(self.location, self.scale, self.freedom).map_err(|_| {
            DistributionError::InvalidStudentT {
                location: self.location,
                scale: self.scale,
                freedom: self.freedom,
            }
        })?;
        let masses: Vec<f64> = (0..num_bins)
            .map(|i| {
                let a = first_value + i as f64 * bin_size;
                if unbounded && i + 1 == num_bins {
                    1.0 - dist.cdf(a)
                } else {
                    dist.cdf(a + bin_size) - dist.cdf(a)
                }
            })
            .map(|m| m.max(0.0))
            .collect();
        Ok(normalize(&masses))
    }
}

/// Week-target distribution from a Student-t fit to the sampled indices.
///
/// Bins are centred on week indices (`[i − ½, i + ½)`). The fitted mass is
/// scaled by the number of non-none samples before the none count is
/// appended, so the none probability stays empirical.
///
/// # Errors
/// Same as [`crate::distribution::build_week_distribution`], plus
/// [`DistributionError::InvalidStudentT`] if the fit is degenerate.
pub fn build_week_distribution_t(
    first_epiweek: Epiweek, num_bins: usize, samples: &[Option<usize>], uniform_weight: f64,
    allow_none: bool, num_users: usize,
) -> DistributionResult<WeekForecast> {
    if num_bins == 0 {
        return Err(DistributionError::NoBins);
    }
    check_weight(uniform_weight)?;
    let none_count = samples.iter().filter(|s| s.is_none()).count();
    if none_count > 0 && !allow_none {
        return Err(DistributionError::NoneNotAllowed { count: none_count });
    }

    let indices: Vec<f64> = samples.iter().flatten().map(|&i| i as f64).collect();
    let fit = StudentTFit::fit(&indices, num_users);
    let mut mass = indices.len() as f64;
    if mass == 0.0 && none_count == 0 {
        mass = 1.0;
    }
    let dist: Vec<f64> =
        fit.bin_masses(num_bins, 1.0, -0.5, false)?.into_iter().map(|p| p * mass).collect();

    let weeks = placeholder_indices(samples);
    let point = first_epiweek.add(median_low(&weeks).unwrap_or(0) as i64)?;

    let none = allow_none.then_some(none_count as f64);
    let (dist, none) = finish_week(dist, none, uniform_weight, |d| Ok(d.to_vec()))?;
    Ok(WeekForecast { dist, none, point })
}

/// ILI-target distribution from a Student-t fit; the first bin starts at 0
/// and the last is unbounded.
///
/// # Errors
/// Same as [`crate::distribution::build_ili_distribution`], plus
/// [`DistributionError::InvalidStudentT`] if the fit is degenerate.
pub fn build_ili_distribution_t(
    bin_size: f64, num_bins: usize, samples: &[f64], uniform_weight: f64, num_users: usize,
) -> DistributionResult<IliForecast> {
    if num_bins == 0 {
        return Err(DistributionError::NoBins);
    }
    if !bin_size.is_finite() || bin_size <= 0.0 {
        return Err(DistributionError::InvalidBinSize { bin_size });
    }
    check_weight(uniform_weight)?;
    let fit = StudentTFit::fit(samples, num_users);
    let dist = fit.bin_masses(num_bins, bin_size, 0.0, true)?;
    let dist = blend_uniform(&dist, uniform_weight);
    let point = median(samples).unwrap_or(0.0);
    Ok(IliForecast { dist, point })
}

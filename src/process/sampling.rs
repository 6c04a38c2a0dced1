//! Random draws shared by the sampling processes.
//!
//! All draws take an explicit `&mut dyn RngCore`, so a seeded
//! `rand::rngs::StdRng` reproduces a run exactly.
use crate::forecast::errors::{ForecastError, ForecastResult};
use rand::RngCore;
use rand_distr::{Distribution, Normal};

/// `num` curves whose entries are independent `N(mean[i], var[i])` draws
/// floored at zero.
///
/// # Errors
/// [`ForecastError::InvalidConfig`] when a mean or variance is not finite
/// or a variance is negative.
pub fn sample_normal_var(
    mean: &[f64], var: &[f64], num: usize, rng: &mut dyn RngCore,
) -> ForecastResult<Vec<Vec<f64>>> {
    let normals = mean
        .iter()
        .zip(var)
        .map(|(&m, &v)| {
            if !m.is_finite() || !v.is_finite() || v < 0.0 {
                return Err(ForecastError::InvalidConfig {
                    field: "variance",
                    reason: "means and variances must be finite with variance >= 0",
                });
            }
            Normal::new(m, v.sqrt()).map_err(|_| ForecastError::InvalidConfig {
                field: "variance",
                reason: "normal distribution rejected the parameters",
            })
        })
        .collect::<ForecastResult<Vec<_>>>()?;

    Ok((0..num)
        .map(|_| normals.iter().map(|n| n.sample(rng).max(0.0)).collect())
        .collect())
}

/// One `N(0, std)` draw; a zero standard deviation yields zero.
pub fn normal_noise(std: f64, rng: &mut dyn RngCore) -> ForecastResult<f64> {
    let normal = Normal::new(0.0, std).map_err(|_| ForecastError::InvalidConfig {
        field: "noise_std",
        reason: "must be finite and >= 0",
    })?;
    Ok(normal.sample(rng))
}

//! Gaussian-kernel smoothing, normalization and uniform blending.
//!
//! Purpose
//! -------
//! Provide the mass-preserving transforms applied to an empirical histogram
//! before it becomes a submitted distribution.
//!
//! Key behaviors
//! -------------
//! - [`gaussian_kernel`] discretizes `N(0, bw)` onto integer offsets, each
//!   offset `o` getting `Φ(o + ½) − Φ(o − ½)`. The half-width grows in steps
//!   of two until the next offset carries ≤ 1e-5 mass.
//! - [`smooth`] convolves with that kernel. Mass that would land outside
//!   the array is folded into the nearest boundary bin, so the total is
//!   preserved exactly.
//! - [`blend_uniform`] mixes with the uniform distribution over the same
//!   number of entries: `w·(1/n) + (1 − w)·p`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are non-negative; outputs of [`smooth`] and [`blend_uniform`]
//!   keep the input's total mass.
use crate::distribution::errors::{DistributionError, DistributionResult};
use statrs::distribution::{ContinuousCDF, Normal};

/// Offset mass below which the kernel is truncated.
pub const KERNEL_TAIL: f64 = 1e-5;

/// Discrete Gaussian kernel for `bandwidth` (in bins), centred at index
/// `len / 2`.
///
/// # Errors
/// [`DistributionError::InvalidBandwidth`] for non-finite or non-positive
/// bandwidths.
pub fn gaussian_kernel(bandwidth: f64) -> DistributionResult<Vec<f64>> {
    if !bandwidth.is_finite() || bandwidth <= 0.0 {
        return Err(DistributionError::InvalidBandwidth { bandwidth });
    }
    let normal = Normal::new(0.0, bandwidth)
        .map_err(|_| DistributionError::InvalidBandwidth { bandwidth })?;
    let prob = |offset: f64| normal.cdf(offset + 0.5) - normal.cdf(offset - 0.5);

    let mut half = 1_i64;
    while prob(half as f64) > KERNEL_TAIL {
        half += 2;
    }
    Ok((-half..=half).map(|o| prob(o as f64)).collect())
}

/// Smooth `curve` with a Gaussian kernel, folding overflow into the edges.
///
/// A zero bandwidth returns the input unchanged.
pub fn smooth(curve: &[f64], bandwidth: f64) -> DistributionResult<Vec<f64>> {
    if bandwidth == 0.0 {
        return Ok(curve.to_vec());
    }
    let kernel = gaussian_kernel(bandwidth)?;
    let half = (kernel.len() / 2) as i64;
    let last = curve.len() as i64 - 1;

    let mut out = vec![0.0; curve.len()];
    for (i, &mass) in curve.iter().enumerate() {
        if mass == 0.0 {
            continue;
        }
        for (k, &weight) in kernel.iter().enumerate() {
            let target = (i as i64 + k as i64 - half).clamp(0, last) as usize;
            out[target] += mass * weight;
        }
    }
    Ok(out)
}

/// Scale `values` to sum to one; an all-zero input is returned unchanged.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total > 0.0 { values.iter().map(|v| v / total).collect() } else { values.to_vec() }
}

/// Blend with the uniform distribution over `dist.len()` entries.
pub fn blend_uniform(dist: &[f64], weight: f64) -> Vec<f64> {
    let uniform = 1.0 / dist.len() as f64;
    dist.iter().map(|p| uniform * weight + p * (1.0 - weight)).collect()
}

/// Validate a blending weight: the floor must be positive and reachable.
///
/// # Errors
/// [`DistributionError::ImpossibleFloor`] unless `0 < weight <= 1`.
pub fn check_weight(weight: f64) -> DistributionResult<()> {
    if !weight.is_finite() {
        return Err(DistributionError::ImpossibleFloor {
            weight,
            reason: "Uniform weight must be finite.",
        });
    }
    if weight <= 0.0 {
        return Err(DistributionError::ImpossibleFloor {
            weight,
            reason: "Uniform weight must be positive; a zero floor is not allowed.",
        });
    }
    if weight > 1.0 {
        return Err(DistributionError::ImpossibleFloor {
            weight,
            reason: "Floor probability is impossibly high for the number of bins.",
        });
    }
    Ok(())
}

/// Blending weight that gives every one of `num_entries` entries at least
/// `min_prob`.
///
/// # Errors
/// [`DistributionError::ImpossibleFloor`] when the implied weight is not in
/// `(0, 1]`.
pub fn weight_for_floor(min_prob: f64, num_entries: usize) -> DistributionResult<f64> {
    let weight = min_prob * num_entries as f64;
    check_weight(weight)?;
    Ok(weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Kernel construction, mass-preserving smoothing and blending. Histogram
    // counting lives in `builder`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // The unit-bandwidth kernel is symmetric, odd-length, sums to ~1 and
    // stops once the next offset drops below the tail threshold.
    fn unit_kernel_is_symmetric_and_truncated() {
        let kernel = gaussian_kernel(1.0).unwrap();
        assert_eq!(kernel.len() % 2, 1);
        let half = kernel.len() / 2;
        for o in 0..half {
            assert_relative_eq!(kernel[half - o], kernel[half + o], epsilon = 1e-15);
        }
        assert!(kernel[0] <= KERNEL_TAIL);
        assert_relative_eq!(kernel.iter().sum::<f64>(), 1.0, epsilon = 1e-4);
    }

    #[test]
    // Purpose
    // -------
    // Mass placed on an edge bin stays in the array.
    //
    // Given
    // -----
    // - A point mass on bin 0 of a 5-bin array, bandwidth 1.
    //
    // Expect
    // ------
    // - Output sums to the kernel total and bin 0 holds more than half of it.
    fn smoothing_folds_overflow_into_edges() {
        let kernel_total: f64 = gaussian_kernel(1.0).unwrap().iter().sum();
        let out = smooth(&[1.0, 0.0, 0.0, 0.0, 0.0], 1.0).unwrap();
        assert_relative_eq!(out.iter().sum::<f64>(), kernel_total, epsilon = 1e-12);
        assert!(out[0] > 0.5);
        assert!(out.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    // Purpose
    // -------
    // Zero bandwidth is the identity; negative bandwidth is rejected.
    fn zero_bandwidth_is_identity() {
        let curve = [0.2, 0.3, 0.5];
        assert_eq!(smooth(&curve, 0.0).unwrap(), curve.to_vec());
        assert!(smooth(&curve, -1.0).is_err());
    }

    #[test]
    // Purpose
    // -------
    // Blending enforces the floor `w / n` and keeps the total at one.
    fn blending_enforces_floor() {
        let dist = [1.0, 0.0, 0.0, 0.0];
        let out = blend_uniform(&dist, 0.2);
        assert_relative_eq!(out.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(out.iter().all(|&p| p >= 0.2 / 4.0 - 1e-15));
    }

    #[test]
    // Purpose
    // -------
    // Floors requiring a weight above one, or a zero floor, are impossible.
    fn impossible_floors_are_rejected() {
        assert_relative_eq!(weight_for_floor(0.002, 34).unwrap(), 0.068, epsilon = 1e-12);
        assert!(matches!(
            weight_for_floor(0.05, 34),
            Err(DistributionError::ImpossibleFloor { .. })
        ));
        assert!(matches!(check_weight(0.0), Err(DistributionError::ImpossibleFloor { .. })));
    }
}

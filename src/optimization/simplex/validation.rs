//! Validation helpers for simplex minimization.
//!
//! - **Option checks**: [`verify_sd_tolerance`], [`verify_max_iter`],
//!   [`verify_step`].
//! - **Inputs**: [`validate_theta`] rejects non-finite starting points.
//! - **Outcomes**: [`validate_theta_hat`] and [`validate_value`] guard the
//!   solver's reported optimum.
use crate::optimization::{
    errors::{OptError, OptResult},
    simplex::types::Theta,
};

/// The simplex standard-deviation tolerance must be finite and `>= 0`.
///
/// # Errors
/// Returns [`OptError::InvalidSdTolerance`] otherwise.
pub fn verify_sd_tolerance(tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidSdTolerance { tol, reason: "Tolerance must be finite." });
    }
    if tol < 0.0 {
        return Err(OptError::InvalidSdTolerance { tol, reason: "Tolerance must be non-negative." });
    }
    Ok(())
}

/// # Errors
/// Returns [`OptError::InvalidMaxIter`] if `max_iter == 0`.
pub fn verify_max_iter(max_iter: usize) -> OptResult<()> {
    if max_iter == 0 {
        return Err(OptError::InvalidMaxIter {
            max_iter,
            reason: "Maximum iterations must be greater than zero.",
        });
    }
    Ok(())
}

/// The initial simplex edge must be finite and non-zero, otherwise the
/// simplex is degenerate.
///
/// # Errors
/// Returns [`OptError::InvalidStep`] otherwise.
pub fn verify_step(step: f64) -> OptResult<()> {
    if !step.is_finite() {
        return Err(OptError::InvalidStep { step, reason: "Step must be finite." });
    }
    if step == 0.0 {
        return Err(OptError::InvalidStep { step, reason: "Step must be non-zero." });
    }
    Ok(())
}

/// Every coordinate of a starting point must be finite.
///
/// # Errors
/// Returns [`OptError::InvalidThetaInput`] for the first offending index.
pub fn validate_theta(theta: &Theta) -> OptResult<()> {
    for (index, &value) in theta.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaInput { index, value });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(OptError::MissingThetaHat),
    }
}

/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

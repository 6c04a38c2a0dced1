//! simplex::builders — Nelder–Mead solver construction.
//!
//! Purpose
//! -------
//! Build the initial simplex around a starting point and wire the crate's
//! stopping rules into Argmin's Nelder–Mead, so callers never touch
//! Argmin-specific constructors.
//!
//! Conventions
//! -----------
//! - The simplex has `n + 1` vertices for `n` parameters: `θ₀` plus one
//!   vertex per axis offset by `step`.
//! - The iteration cap is not set here; it is a runtime concern applied by
//!   [`run_simplex`](crate::optimization::simplex::run::run_simplex).
use crate::optimization::{
    errors::OptResult,
    simplex::{
        traits::SimplexOptions,
        types::{NelderMeadSolver, Theta},
        validation::{validate_theta, verify_step},
    },
};

/// Axis-aligned initial simplex around `theta0` with edge `step`.
///
/// # Errors
/// - [`crate::optimization::errors::OptError::InvalidStep`] for a zero or
///   non-finite step.
/// - [`crate::optimization::errors::OptError::InvalidThetaInput`] for a
///   non-finite starting point.
pub fn initial_simplex(theta0: &Theta, step: f64) -> OptResult<Vec<Theta>> {
    verify_step(step)?;
    validate_theta(theta0)?;
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for i in 0..theta0.len() {
        let mut vertex = theta0.clone();
        vertex[i] += step;
        vertices.push(vertex);
    }
    Ok(vertices)
}

/// Nelder–Mead over [`initial_simplex`] with the configured tolerance.
///
/// # Errors
/// Propagates simplex construction errors and any rejection of the
/// tolerance by Argmin (via `From<argmin::core::Error>`).
pub fn build_nelder_mead(
    theta0: &Theta, step: f64, opts: &SimplexOptions,
) -> OptResult<NelderMeadSolver> {
    let vertices = initial_simplex(theta0, step)?;
    Ok(NelderMeadSolver::new(vertices).with_sd_tolerance(opts.sd_tolerance)?)
}

//! Public API surface for derivative-free minimization.
//!
//! - [`Objective`]: trait users implement for the function being minimized.
//! - [`SimplexOptions`]: stopping rules for the Nelder–Mead solver.
//! - [`OptimOutcome`]: normalized result returned by [`minimize`].
//!
//! [`minimize`]: crate::optimization::simplex::minimize
use crate::optimization::{
    errors::OptResult,
    simplex::{
        types::{Cost, DEFAULT_MAX_ITER, FnEvalMap, Theta},
        validation::{validate_theta_hat, validate_value, verify_max_iter, verify_sd_tolerance},
    },
};
use argmin::core::TerminationStatus;

/// User-implemented objective for simplex minimization.
///
/// - `type Data`: per-problem data carried into `value`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate the cost.
///
/// Optional:
/// - `check(&Theta, &Data) -> OptResult<()>`: reject an unusable starting
///   point before the solver runs. Defaults to accepting everything.
pub trait Objective {
    type Data;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;

    fn check(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<()> {
        Ok(())
    }
}

/// Stopping rules for Nelder–Mead.
///
/// - `sd_tolerance`: stop once the standard deviation of the cost over the
///   simplex vertices falls below this value (`0` disables the rule).
/// - `max_iter`: hard cap on iterations.
///
/// Default: `sd_tolerance = 1e-10`, `max_iter = 100`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplexOptions {
    pub sd_tolerance: f64,
    pub max_iter: usize,
}

impl SimplexOptions {
    /// # Errors
    /// - [`crate::optimization::errors::OptError::InvalidSdTolerance`] for a
    ///   negative or non-finite tolerance.
    /// - [`crate::optimization::errors::OptError::InvalidMaxIter`] if
    ///   `max_iter == 0`.
    pub fn new(sd_tolerance: f64, max_iter: usize) -> OptResult<Self> {
        verify_sd_tolerance(sd_tolerance)?;
        verify_max_iter(max_iter)?;
        Ok(Self { sd_tolerance, max_iter })
    }
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self { sd_tolerance: 1e-10, max_iter: DEFAULT_MAX_ITER }
    }
}

/// Canonical result returned by `minimize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: objective at `theta_hat`.
/// - `converged`: `true` if the solver stopped on a rule other than the
///   iteration cap.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => {
                let converged =
                    !matches!(reason, argmin::core::TerminationReason::MaxItersReached);
                (converged, format!("{reason:?}"))
            }
        };
        Ok(Self { theta_hat, value, converged, status, iterations: iterations as usize, fn_evals })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptError;
    use argmin::core::TerminationReason;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Options validate their fields and default to the archetype fitting
    // budget.
    fn options_validate_and_default() {
        assert!(SimplexOptions::new(1e-8, 50).is_ok());
        assert!(SimplexOptions::new(-1.0, 50).is_err());
        assert!(matches!(SimplexOptions::new(1e-8, 0), Err(OptError::InvalidMaxIter { .. })));
        assert_eq!(SimplexOptions::default().max_iter, 100);
    }

    #[test]
    // Purpose
    // -------
    // Hitting the iteration cap is reported as not converged; a tolerance
    // stop is converged.
    fn outcome_maps_termination_reasons() {
        let capped = OptimOutcome::new(
            Some(array![1.0]),
            0.5,
            TerminationStatus::Terminated(TerminationReason::MaxItersReached),
            100,
            FnEvalMap::new(),
        )
        .unwrap();
        assert!(!capped.converged);

        let solved = OptimOutcome::new(
            Some(array![1.0]),
            0.5,
            TerminationStatus::Terminated(TerminationReason::SolverConverged),
            12,
            FnEvalMap::new(),
        )
        .unwrap();
        assert!(solved.converged);
        assert_eq!(solved.iterations, 12);

        let missing =
            OptimOutcome::new(None, 0.5, TerminationStatus::NotTerminated, 0, FnEvalMap::new());
        assert_eq!(missing, Err(OptError::MissingThetaHat));
    }
}

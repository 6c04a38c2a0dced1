//! High-level entry point for minimizing a user-provided [`Objective`].
use crate::optimization::{
    errors::OptResult,
    simplex::{
        adapter::ArgMinAdapter,
        builders::build_nelder_mead,
        run::run_simplex,
        traits::{Objective, OptimOutcome, SimplexOptions},
        types::Theta,
    },
};

/// Minimize `f` with Nelder–Mead starting from `theta0`.
///
/// # Behavior
/// - Validates the starting point via `f.check(theta0, data)`.
/// - Builds an axis-aligned simplex of edge `step` around `theta0`.
/// - Runs at most `opts.max_iter` iterations and returns the best vertex.
///
/// # Errors
/// - Propagates any error from `f.check` or `f.value`.
/// - Propagates builder errors (degenerate step, non-finite start).
/// - Propagates outcome validation errors.
///
/// # Example
/// ```
/// use ndarray::array;
/// use flucast::optimization::{
///     errors::OptResult,
///     simplex::{Objective, SimplexOptions, Theta, minimize},
/// };
///
/// struct Bowl;
/// impl Objective for Bowl {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok((theta[0] - 1.0).powi(2) + (theta[1] + 2.0).powi(2))
///     }
/// }
///
/// let opts = SimplexOptions::new(1e-12, 500)?;
/// let out = minimize(&Bowl, array![0.0, 0.0], 0.5, &(), &opts)?;
/// assert!((out.theta_hat[0] - 1.0).abs() < 1e-3);
/// # Ok::<(), flucast::optimization::errors::OptError>(())
/// ```
pub fn minimize<F: Objective>(
    f: &F, theta0: Theta, step: f64, data: &F::Data, opts: &SimplexOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let solver = build_nelder_mead(&theta0, step, opts)?;
    let problem = ArgMinAdapter::new(f, data);
    run_simplex(opts, problem, solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptError;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // End-to-end minimization on small smooth objectives and propagation of
    // objective errors. Solver internals belong to Argmin.
    // -------------------------------------------------------------------------

    struct Rosenbrock;

    impl Objective for Rosenbrock {
        type Data = f64;

        fn value(&self, theta: &Theta, b: &f64) -> OptResult<f64> {
            let (x, y) = (theta[0], theta[1]);
            Ok((1.0 - x).powi(2) + b * (y - x * x).powi(2))
        }
    }

    struct Positive;

    impl Objective for Positive {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
            Ok(theta[0] * theta[0])
        }

        fn check(&self, theta: &Theta, _: &()) -> OptResult<()> {
            if theta[0] <= 0.0 {
                return Err(OptError::InvalidThetaInput { index: 0, value: theta[0] });
            }
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // Nelder–Mead finds the Rosenbrock minimum from a nearby start.
    //
    // Given
    // -----
    // - b = 10, θ₀ = (0.5, 0.5), step 0.1, 1000 iterations.
    //
    // Expect
    // ------
    // - θ̂ within 1e-2 of (1, 1) and a near-zero cost.
    fn minimize_solves_rosenbrock() {
        let opts = SimplexOptions::new(1e-14, 1000).unwrap();
        let out = minimize(&Rosenbrock, array![0.5, 0.5], 0.1, &10.0, &opts).unwrap();
        assert_abs_diff_eq!(out.theta_hat[0], 1.0, epsilon = 1e-2);
        assert_abs_diff_eq!(out.theta_hat[1], 1.0, epsilon = 1e-2);
        assert!(out.value < 1e-4);
        assert!(out.iterations <= 1000);
    }

    #[test]
    // Purpose
    // -------
    // A rejected starting point short-circuits before the solver runs.
    fn check_failure_is_propagated() {
        let opts = SimplexOptions::default();
        let err = minimize(&Positive, array![-1.0], 0.1, &(), &opts).unwrap_err();
        assert_eq!(err, OptError::InvalidThetaInput { index: 0, value: -1.0 });
    }
}

//! Execution helper that runs Nelder–Mead on an [`Objective`] and returns a
//! crate-friendly [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    simplex::{
        adapter::ArgMinAdapter,
        traits::{Objective, OptimOutcome, SimplexOptions},
        types::NelderMeadSolver,
    },
};
use argmin::core::{Executor, State};

/// Run a configured Nelder–Mead solver to completion.
///
/// Wires the problem and solver into an `Executor`, applies
/// `opts.max_iter`, runs, and converts the final state into an
/// [`OptimOutcome`]. The starting point lives in the solver's simplex, so
/// no initial parameter is set on the state.
///
/// # Errors
/// - Propagates any `argmin` runtime error, including objective errors,
///   via `From<argmin::core::Error>`.
/// - Propagates validation errors from [`OptimOutcome::new`].
pub fn run_simplex<'a, F>(
    opts: &SimplexOptions, problem: ArgMinAdapter<'a, F>, solver: NelderMeadSolver,
) -> OptResult<OptimOutcome>
where
    F: Objective,
{
    let max_iter = opts.max_iter as u64;
    let optimizer =
        Executor::new(problem, solver).configure(|state| state.max_iters(max_iter));

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    OptimOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
    )
}

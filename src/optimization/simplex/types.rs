//! simplex::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the parameter, cost and counter types used by the simplex
//! minimizer so the rest of the optimization code stays agnostic to
//! `ndarray` and Argmin generics.
//!
//! Conventions
//! -----------
//! - `Theta` is a column vector with one entry per free parameter.
//! - `Cost` is the scalar objective being minimized.
//!
//! Testing notes
//! -------------
//! - Type aliases only; exercised through the surrounding modules.
use argmin::{
    core::IterState,
    solver::neldermead::NelderMead,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
///
/// Maps human-readable counter names (e.g., `"cost_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Nelder–Mead specialized to this crate's numeric types.
pub type NelderMeadSolver = NelderMead<Theta, Cost>;

/// Executor state carried by [`NelderMeadSolver`].
pub type SimplexState = IterState<Theta, (), (), (), (), Cost>;

/// Default iteration cap for simplex refinements.
pub const DEFAULT_MAX_ITER: usize = 100;

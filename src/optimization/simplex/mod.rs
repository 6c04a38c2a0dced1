//! simplex — argmin-powered Nelder–Mead minimizer.
//!
//! Purpose
//! -------
//! Provide a derivative-free local minimizer for small, cheap objectives
//! such as the two-parameter archetype curve fit. Callers implement
//! [`Objective`] and invoke [`minimize`] with a starting point and an
//! initial simplex edge.
//!
//! Key behaviors
//! -------------
//! - Adapt user objectives to Argmin via [`adapter::ArgMinAdapter`].
//! - Build an axis-aligned starting simplex ([`builders`]) and run it under
//!   an iteration cap ([`run::run_simplex`]).
//! - Normalize results into an [`OptimOutcome`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Objectives return finite costs for every point the simplex visits;
//!   a non-finite cost aborts the run with `OptError::NonFiniteCost`.
//! - Runs are bounded: every call stops after at most `max_iter`
//!   iterations.
//!
//! Conventions
//! -----------
//! - Parameters are [`Theta`] (`Array1<f64>`); the cost is minimized as-is.
//! - Errors bubble up as `OptResult<T>`; this module never panics.
//!
//! Testing notes
//! -------------
//! - Unit tests cover option validation, simplex construction, adapter
//!   error mapping and end-to-end minimization of smooth test functions.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::minimize;
pub use self::traits::{Objective, OptimOutcome, SimplexOptions};
pub use self::types::{Cost, DEFAULT_MAX_ITER, FnEvalMap, Theta};

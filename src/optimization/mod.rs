//! optimization — derivative-free minimization and its error surface.
//!
//! Purpose
//! -------
//! Provide the local refinement step used after coarse grid searches:
//! an Argmin-backed Nelder–Mead minimizer behind a small trait, with one
//! error enum for configuration, objective and backend failures.
//!
//! Key behaviors
//! -------------
//! - [`simplex`] exposes [`simplex::minimize`], [`simplex::Objective`],
//!   [`simplex::SimplexOptions`] and [`simplex::OptimOutcome`].
//! - [`errors::OptError`] normalizes Argmin errors (including objective
//!   errors that travelled through Argmin boxed) into crate variants.
//!
//! Conventions
//! -----------
//! - Public entry points that can fail return `OptResult<T>`; callers never
//!   see raw Argmin errors.
//! - No logging or I/O; callers report fitted parameters themselves.
//!
//! Downstream usage
//! ----------------
//! - The archetype curve fit implements `Objective` for its score function
//!   and refines the best grid cell with `minimize`.

pub mod errors;
pub mod simplex;

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::simplex::{Objective, OptimOutcome, SimplexOptions, Theta, minimize};
}

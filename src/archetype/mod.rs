//! archetype — archetype-curve forecasting with a Kalman nowcast.
//!
//! Purpose
//! -------
//! Model a location's season as one reference curve that can be shifted in
//! time and stretched in height, fit that family to the observed part of the
//! current season, and sample plausible completions from the best-fitting
//! region of parameter space.
//!
//! Key behaviors
//! -------------
//! - [`curve`] trains the [`Archetype`] (weekly statistics, holiday factors,
//!   peak-aligned shape).
//! - [`fit`] scores parameter grids, refines the best cell with the simplex
//!   optimizer in [`crate::optimization`] and draws curves.
//! - [`ukf`] is a general unscented Kalman filter on `nalgebra` matrices.
//! - [`filter`] ties them together as the [`ArchetypeFilter`]
//!   [`crate::process::ForecastProcess`].
//!
//! Downstream usage
//! ----------------
//! - Train regional archetypes into a [`crate::process::TrainedModels`],
//!   call [`ArchetypeFilter::nowcast`] for the issue, attach the result with
//!   [`ArchetypeFilter::with_nowcast`], then hand the filter to the
//!   assembler like any other process.
pub mod curve;
pub mod filter;
pub mod fit;
pub mod ukf;

pub use self::curve::Archetype;
pub use self::filter::{ArchetypeConfig, ArchetypeFilter, Nowcast, SignalSpec};
pub use self::fit::{CurveFit, FitTarget, GridSpec};
pub use self::ukf::{MerweSigmaPoints, UnscentedKalmanFilter};

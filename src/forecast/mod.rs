//! forecast — run configuration, forecast bundles and their assembly.
//!
//! Purpose
//! -------
//! Turn the ensembles produced by a [`crate::process::ForecastProcess`]
//! into a submission-ready [`Forecast`]: per-location, per-target blended
//! distributions with point estimates, checked against every submission
//! invariant before they are handed to an external I/O layer.
//!
//! Key behaviors
//! -------------
//! - [`ForecastConfig`] fixes the bin layout, floors, bandwidths and target
//!   rules of a run.
//! - [`ForecastAssembler::run`] drives one process over many locations,
//!   skipping locations whose failure is recoverable and failing closed on
//!   everything else.
//! - [`Forecast::sanity_check`] reports every violated invariant across all
//!   locations in one [`ForecastError::DistributionInvariant`].
//! - [`errors`] defines the crate-wide [`ForecastError`] taxonomy used by
//!   processes, composition and assembly.
//!
//! Conventions
//! -----------
//! - Forecasts serialize through `serde`; files, uploads and databases are
//!   the caller's concern.
pub mod assembler;
pub mod bundle;
pub mod config;
pub mod errors;
pub mod location;

pub use self::assembler::ForecastAssembler;
pub use self::bundle::Forecast;
pub use self::config::ForecastConfig;
pub use self::errors::{ForecastError, ForecastResult};
pub use self::location::{LocationForecast, TargetForecast};

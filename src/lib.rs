//! flucast — ensemble sampling and blended distributions for seasonal wILI
//! forecasts.
//!
//! Purpose
//! -------
//! Produce probabilistic forecasts of weighted influenza-like illness for a
//! flu-forecasting contest: draw full-season trajectories from one or more
//! forecasting processes, reduce every trajectory to the contest targets,
//! and turn the resulting samples into uniform-blended distributions that
//! never assign zero probability to any outcome.
//!
//! Key behaviors
//! -------------
//! - [`calendar`] does CDC epiweek arithmetic and season windows.
//! - [`targets`] defines the targets (onset, peak week, peak height,
//!   k-week-ahead), extracts them from trajectories and holds the location
//!   registry with onset baselines.
//! - [`distribution`] bins, smooths and blends target samples, either
//!   empirically or through a Student-t fit for small crowd ensembles.
//! - [`optimization`] wraps `argmin`'s Nelder–Mead solver behind a small
//!   objective trait.
//! - [`process`] defines the [`process::ForecastProcess`] contract with the
//!   empirical baseline, crowd-sourced Epicast and hybrid composition.
//! - [`archetype`] implements the archetype-curve process and its unscented
//!   Kalman nowcast.
//! - [`forecast`] holds run configuration, forecast bundles with their
//!   sanity check, and the assembler that ties everything together.
//!
//! Invariants & assumptions
//! ------------------------
//! - Observed data reaches the crate only through
//!   [`process::SurveillanceSource`]; file formats, databases and uploads are
//!   the caller's concern.
//! - A [`forecast::Forecast`] returned by the assembler has passed its sanity
//!   check: every bin is strictly inside `(0, 1)` and every distribution sums
//!   to one.
//!
//! Conventions
//! -----------
//! - Fallible operations return module-level `Result` aliases; nothing on a
//!   non-test path panics.
//! - Randomness is always injected (`&mut dyn RngCore`), so seeded runs are
//!   reproducible.
//! - The process and assembly layers log through the `log` facade; the
//!   library never installs a logger.
//!
//! Downstream usage
//! ----------------
//! ```ignore
//! let process = Baseline::new(BaselineConfig::new(2016))?;
//! let mut models = TrainedModels::new(2016);
//! let assembler = ForecastAssembler::new(ForecastConfig::new("team"))?;
//! let locations = ["nat", "hhs1"];
//! let forecast = assembler.run(&process, &mut models, &locations, issue, &source, &mut rng)?;
//! ```
pub mod archetype;
pub mod calendar;
pub mod distribution;
pub mod forecast;
pub mod optimization;
pub mod process;
pub mod targets;

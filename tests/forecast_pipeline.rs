//! Integration tests — full forecasting runs, from surveillance data to a
//! checked forecast.
//!
//! Purpose
//! -------
//! Exercise the public API the way a forecasting job uses it: fill a
//! [`MemorySource`], build a process, run the [`ForecastAssembler`] over a
//! set of locations and inspect the resulting [`Forecast`]. These tests
//! catch wiring regressions between the calendar, processes, target
//! extraction, distribution building and sanity checking that unit tests of
//! the individual modules cannot see.
//!
//! Coverage
//! --------
//! - Baseline runs on flat seasons: point estimates and the peak mass track
//!   the level, and an untrainable location is skipped rather than failing
//!   the run.
//! - Baseline runs with a backfill model: observed weeks carry the revision
//!   spread of their age.
//! - Hybrid runs splicing baseline history with Epicast submissions: the
//!   future half drives the short-horizon targets and the Student-t
//!   estimator.
//! - The bundle sanity check rejects a forecast with a zero bin.
//! - An archetype-filter run on synthetic regional seasons.
//!
//! Exclusions
//! ----------
//! - Exact probabilities and smoothing numerics (unit-tested in
//!   `distribution`).
//! - Nowcast fusion details (unit-tested in `archetype::filter`).
use flucast::{
    archetype::{ArchetypeConfig, ArchetypeFilter},
    calendar::{Epiweek, forecast_start},
    forecast::{Forecast, ForecastAssembler, ForecastConfig, ForecastError},
    process::{
        Baseline, BaselineConfig, Epicast, EpicastConfig, ForecastProcess, Hybrid, MemorySource,
        TrainedModels, UserSubmission,
    },
    targets::Target,
};
use rand::{SeedableRng, rngs::StdRng};

const SEASON: i32 = 2015;
const ISSUE: u32 = 201550;

fn ew(code: u32) -> Epiweek {
    Epiweek::new(code).expect("valid epiweek")
}

/// Build a source with three flat training seasons and the current season
/// observed up to the issue.
///
/// Parameters
/// ----------
/// - `location`: location code the series are stored under.
///
/// Returns
/// -------
/// `MemorySource`
///   Seasons 2012, 2013 and 2014 hold 40 weeks each at levels 1.9, 2.0 and
///   2.1 from week 40; season 2015 holds 2.0 for 201540..=201550.
///
/// Invariants
/// ----------
/// - Every week from `forecast_start(2015)` through the issue is present,
///   so processes see exactly `offset + 1` observations.
///
/// Usage
/// -----
/// Shared by the baseline and hybrid runs; submissions are added on top.
fn flat_source(location: &str) -> MemorySource {
    let mut source = MemorySource::new();
    for (season, level) in [(2012, 1.9), (2013, 2.0), (2014, 2.1)] {
        let first = forecast_start(season).expect("season start");
        let end = first.add(40).expect("season end");
        source.insert_stable(location, first.range(end, false).map(|w| (w, level)));
    }
    let first = forecast_start(SEASON).expect("season start");
    source.insert_stable(location, first.range(ew(ISSUE), true).map(|w| (w, 2.0)));
    source
}

/// Baseline configured for the flat source: 1000 samples, no backfill
/// model, training from 2012.
fn baseline() -> Baseline {
    let mut config = BaselineConfig::new(SEASON);
    config.first_training_season = 2012;
    config.backfill_weeks = None;
    config.num_samples = 1000;
    Baseline::new(config).expect("valid baseline config")
}

/// Three forecasters predicting a flat 3.0, 3.2 and 3.4 for the 22 weeks
/// after the issue.
fn submissions() -> Vec<UserSubmission> {
    [3.0, 3.2, 3.4]
        .into_iter()
        .enumerate()
        .map(|(i, level)| UserSubmission { user_id: i as u64 + 1, values: vec![level; 22] })
        .collect()
}

fn assembler() -> ForecastAssembler {
    ForecastAssembler::new(ForecastConfig::new("pipeline")).expect("valid forecast config")
}

#[test]
// Purpose
// -------
// A baseline run on flat seasons produces a valid forecast whose point
// estimates sit at the observed level, and a location without data is
// skipped.
//
// Given
// -----
// - nat trained on 2012..=2014 at levels around 2.0.
// - "tx" falls back to hhs4, which has no data.
//
// Expect
// ------
// - Only nat is forecast; it carries onset and every configured target.
// - The 1-week-ahead point is close to 2.0 and the peak point is at or
//   slightly above it.
fn baseline_run_tracks_flat_level() {
    let source = flat_source("nat");
    let process = baseline();
    let mut models = TrainedModels::new(SEASON);
    let mut rng = StdRng::seed_from_u64(11);

    let forecast = assembler()
        .run(&process, &mut models, &["nat", "tx"], ew(ISSUE), &source, &mut rng)
        .expect("baseline run succeeds");

    assert_eq!(forecast.len(), 1);
    assert!(forecast.get("tx").is_none());
    assert!(models.contains("nat"));
    let nat = forecast.get("nat").expect("nat forecast");
    assert!(nat.has_onset());
    for k in 1..=4 {
        assert!(nat.ili(Target::Ahead(k)).is_some(), "x{k} missing");
    }

    let x1 = nat.ili(Target::Ahead(1)).expect("x1 forecast");
    assert!((x1.point - 2.0).abs() < 0.15, "x1 point {}", x1.point);
    let peak = nat.ili(Target::Peak).expect("peak forecast");
    assert!(peak.point >= 1.95 && peak.point < 2.6, "peak point {}", peak.point);
    let near_level: f64 = peak.dist[19..=25].iter().sum();
    assert!(near_level > 0.6, "mass in 1.9..2.6 is {near_level}");
    let mode = (0..peak.dist.len())
        .max_by(|&a, &b| peak.dist[a].total_cmp(&peak.dist[b]))
        .expect("non-empty distribution");
    assert!((20..=23).contains(&mode), "peak mode at bin {mode}");
    assert!(forecast.sanity_check().is_ok());
}

/// Add first-release values to the training seasons of `flat_source`.
///
/// Parameters
/// ----------
/// - `source`: source built by [`flat_source`].
/// - `location`: location code the series are stored under.
///
/// Returns
/// -------
/// `()`
///   Every training week gets a lag-0 value off by ±0.2 and a lag-1 value
///   off by ±0.1 from its stable value, alternating by week.
///
/// Invariants
/// ----------
/// - Revisions exist only for 2012..=2014, so the current season is still
///   read from stable values.
///
/// Usage
/// -----
/// Gives the baseline a backfill model with standard deviations of about
/// 0.2 at lag 0 and 0.1 at lag 1.
fn add_revisions(source: &mut MemorySource, location: &str) {
    for (season, level) in [(2012, 1.9), (2013, 2.0), (2014, 2.1)] {
        let first = forecast_start(season).expect("season start");
        let end = first.add(40).expect("season end");
        for (lag, size) in [(0, 0.2), (1, 0.1)] {
            let published = first.range(end, false).enumerate().map(|(k, w)| {
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                (w, level + sign * size)
            });
            source.insert_lagged(location, lag, published);
        }
    }
}

/// Sample standard deviation of one week across an ensemble.
fn week_std(trajectories: &[Vec<f64>], week: usize) -> f64 {
    let values: Vec<f64> = trajectories.iter().map(|t| t[week]).collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

#[test]
// Purpose
// -------
// With a backfill model, observed weeks are resampled with the revision
// spread of their age, and the run still yields a valid forecast.
//
// Given
// -----
// - The flat source plus ±0.2 lag-0 and ±0.1 lag-1 revisions in the
//   training seasons; a baseline with a two-lag backfill model.
//
// Expect
// ------
// - The issue week (lag 0) spreads with std ≈ 0.2; older weeks, which use
//   the last modelled lag, with std ≈ 0.1.
// - The assembled forecast passes its sanity check and its 1-week-ahead
//   point stays near 2.0.
fn baseline_run_with_backfill_model() {
    let mut source = flat_source("nat");
    add_revisions(&mut source, "nat");
    let mut config = BaselineConfig::new(SEASON);
    config.first_training_season = 2012;
    config.first_backfill_season = 2012;
    config.backfill_weeks = Some(2);
    config.num_samples = 1000;
    let process = Baseline::new(config).expect("valid baseline config");
    let mut models = TrainedModels::new(SEASON);
    let mut rng = StdRng::seed_from_u64(16);

    let model = models.train(&process, "nat", &source).expect("baseline training");
    assert_eq!(model.backfill_var.len(), 2);
    let ensemble =
        process.sample(model, "nat", ew(ISSUE), &source, &mut rng).expect("baseline sample");
    let issue_std = week_std(&ensemble.trajectories, 10);
    let old_std = week_std(&ensemble.trajectories, 0);
    assert!((issue_std - 0.2).abs() < 0.03, "issue week std {issue_std}");
    assert!((old_std - 0.1).abs() < 0.02, "oldest week std {old_std}");

    let forecast = assembler()
        .run(&process, &mut models, &["nat"], ew(ISSUE), &source, &mut rng)
        .expect("baseline run succeeds");
    let x1 = forecast.get("nat").and_then(|l| l.ili(Target::Ahead(1))).expect("x1 forecast");
    assert!((x1.point - 2.0).abs() < 0.15, "x1 point {}", x1.point);
}

#[test]
// Purpose
// -------
// A hybrid run keeps the baseline's history and takes the future from the
// Epicast submissions, summarised with the Student-t estimator.
//
// Given
// -----
// - The flat source plus three submissions for nat at the issue.
//
// Expect
// ------
// - The composition holds one curve per baseline sample, 33 weeks long,
//   with weeks up to the issue at the observed 2.0 and the week after it
//   equal to one of the submitted levels.
// - The assembled 1-week-ahead point is the middle submission (3.2).
fn hybrid_run_splices_submissions() {
    let mut source = flat_source("nat");
    source.insert_submissions("nat", ew(ISSUE), submissions());
    let epicast = Epicast::new(EpicastConfig::new(SEASON)).expect("valid epicast config");
    let process = Hybrid::new("fc-hybrid", baseline(), epicast).expect("same season");
    let mut models = TrainedModels::new(SEASON);
    let mut rng = StdRng::seed_from_u64(12);

    models.train(&process, "nat", &source).expect("hybrid training");
    let model = models.get("nat").expect("trained model");
    let composition =
        process.compose(model, "nat", ew(ISSUE), &source, &mut rng).expect("composition");
    assert_eq!(composition.past_count, 1000);
    assert_eq!(composition.future_count, 3);
    assert_eq!(composition.trajectories.len(), 1000);
    for curve in &composition.trajectories {
        assert_eq!(curve.len(), 33);
        assert!(curve[..=10].iter().all(|v| (*v - 2.0).abs() < 1e-12));
        assert!([3.0, 3.2, 3.4].contains(&curve[11]));
    }

    let forecast = assembler()
        .run(&process, &mut models, &["nat"], ew(ISSUE), &source, &mut rng)
        .expect("hybrid run succeeds");
    let x1 = forecast.get("nat").and_then(|l| l.ili(Target::Ahead(1))).expect("x1 forecast");
    assert!((x1.point - 3.2).abs() < 1e-9, "x1 point {}", x1.point);
}

#[test]
// Purpose
// -------
// Epicast alone needs no training history, and without submissions the run
// has nothing to forecast.
//
// Given
// -----
// - Only the current season's observations for hhs2.
//
// Expect
// ------
// - With submissions: a valid forecast for hhs2 whose peak week is inside
//   the season window.
// - Without submissions: a recoverable InsufficientData error.
fn epicast_run_needs_submissions() {
    let mut source = MemorySource::new();
    let first = forecast_start(SEASON).expect("season start");
    source.insert_stable("hhs2", first.range(ew(ISSUE), true).map(|w| (w, 1.5)));
    let process = Epicast::new(EpicastConfig::new(SEASON)).expect("valid epicast config");
    let mut models = TrainedModels::new(SEASON);
    let mut rng = StdRng::seed_from_u64(13);

    let err = assembler()
        .run(&process, &mut models, &["hhs2"], ew(ISSUE), &source, &mut rng)
        .expect_err("no submissions");
    assert!(err.is_recoverable());

    source.insert_submissions("hhs2", ew(ISSUE), submissions());
    let forecast = assembler()
        .run(&process, &mut models, &["hhs2"], ew(ISSUE), &source, &mut rng)
        .expect("epicast run succeeds");
    let peak_week =
        forecast.get("hhs2").and_then(|l| l.week(Target::PeakWeek)).expect("peak week");
    assert!(peak_week.point >= first && peak_week.point <= ew(201620));
}

#[test]
// Purpose
// -------
// The bundle sanity check fails closed on a single zero bin and names the
// offending location and target.
//
// Given
// -----
// - A valid baseline forecast for nat.
// - A copy whose 1-week-ahead distribution moves bin 0's mass to bin 1.
//
// Expect
// ------
// - The original passes; the copy fails with a DistributionInvariant that
//   mentions "nat/x1: bin 0".
fn sanity_check_rejects_zero_bin() {
    let source = flat_source("nat");
    let mut models = TrainedModels::new(SEASON);
    let mut rng = StdRng::seed_from_u64(14);
    let forecast: Forecast = assembler()
        .run(&baseline(), &mut models, &["nat"], ew(ISSUE), &source, &mut rng)
        .expect("baseline run succeeds");
    assert!(forecast.sanity_check().is_ok());

    let mut nat = forecast.get("nat").expect("nat forecast").clone();
    let mut x1 = nat.ili(Target::Ahead(1)).expect("x1 forecast").clone();
    x1.dist[1] += x1.dist[0];
    x1.dist[0] = 0.0;
    nat.set_ili(Target::Ahead(1), x1);
    let mut broken = forecast.clone();
    broken.add(nat);

    match broken.sanity_check() {
        Err(ForecastError::DistributionInvariant { violations }) => {
            assert!(violations.iter().any(|v| v.starts_with("nat/x1: bin 0")), "{violations:?}");
        }
        other => panic!("expected invariant failure, got {other:?}"),
    }
}

#[test]
// Purpose
// -------
// The archetype filter trains on synthetic peaked seasons and produces a
// valid forecast through the assembler.
//
// Given
// -----
// - hhs1 seasons 2010..=2015 stored from week 30 with a triangular peak.
// - A small sampling configuration.
//
// Expect
// ------
// - A forecast for hhs1 that passes the sanity check, with the peak point
//   inside the range of the training peaks' heights (up to 4.5).
fn archetype_run_produces_valid_forecast() {
    let mut source = MemorySource::new();
    for season in 2010..=SEASON {
        let first = Epiweek::join(season, 30).expect("week 30");
        let peak = 18.0 + (season % 3) as f64;
        source.insert_stable(
            "hhs1",
            (0..52).map(|i| {
                let value = 0.5 + (4.0 - 0.4 * (i as f64 - peak).abs()).max(0.0);
                (first.add(i).expect("in range"), value)
            }),
        );
    }

    let mut config = ArchetypeConfig::new(SEASON);
    config.first_training_season = 2010;
    config.num_samples = 60;
    config.sample_grid = 24;
    config.fit_grid = 12;
    config.fit_iterations = 30;
    let process = ArchetypeFilter::new(config).expect("valid archetype config");
    let mut models = TrainedModels::new(SEASON);
    let mut rng = StdRng::seed_from_u64(15);

    let forecast = assembler()
        .run(&process, &mut models, &["hhs1"], ew(ISSUE), &source, &mut rng)
        .expect("archetype run succeeds");
    let hhs1 = forecast.get("hhs1").expect("hhs1 forecast");
    assert!(hhs1.has_onset());
    let peak = hhs1.ili(Target::Peak).expect("peak forecast");
    assert!(peak.point.is_finite() && peak.point >= 0.0);
    assert!(forecast.sanity_check().is_ok());
}

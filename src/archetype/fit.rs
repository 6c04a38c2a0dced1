//! Fitting archetype curves to a partially observed season.
//!
//! Purpose
//! -------
//! Score `(shift, scale)` instances of an [`Archetype`] against a target
//! mean/std curve, turn a grid of scores into a probability mass, refine the
//! best cell with Nelder–Mead, and draw curves from the high-probability
//! part of the grid.
//!
//! Key behaviors
//! -------------
//! - [`FitTarget::inform`] builds the target from observed (holiday-free)
//!   values followed by the archetype's weekly mean for the unobserved
//!   weeks. The five most recent observed weeks weigh 1, every other week
//!   0.2.
//! - The score is half the summed squared weighted z-scores, so
//!   `exp(-score)` is proportional to a Gaussian likelihood; grid masses are
//!   normalized after subtracting the minimum score.
//! - [`best_fit`] scans a 32×32 grid over shift `[0, 10]` and scale
//!   `[1/3, 3]`, then runs at most 100 simplex iterations from the best cell
//!   with an initial edge of the smaller grid step.
//! - [`sample_fits`] scans a 128×128 grid, keeps the most probable cells up
//!   to 99% of the mass, picks cells by mass and jitters each draw uniformly
//!   within half a step of the cell centre.
//!
//! Conventions
//! -----------
//! - Parameters are ordered `[shift, scale]` in optimizer space.
//! - A per-location height multiplier scales candidate curves before
//!   scoring; 1.0 leaves them unchanged.
use crate::{
    archetype::curve::{Archetype, MIN_VARIANCE},
    forecast::errors::ForecastResult,
    optimization::{
        errors::OptResult,
        simplex::{Objective, SimplexOptions, Theta, minimize},
    },
};
use log::debug;
use ndarray::array;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Weight of the most recent observed weeks in the score.
pub const RECENT_WEIGHT: f64 = 1.0;
/// Weight of every other week.
pub const BACKGROUND_WEIGHT: f64 = 0.2;
/// Number of most recent observed weeks given [`RECENT_WEIGHT`].
pub const RECENT_WEEKS: usize = 5;
/// Share of grid mass kept when sampling.
pub const SAMPLE_MASS: f64 = 0.99;

/// Target curve a fit is scored against.
#[derive(Debug, Clone, PartialEq)]
pub struct FitTarget {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    pub weights: Vec<f64>,
    /// Number of leading weeks taken from observations.
    pub week: usize,
}

impl FitTarget {
    /// Observed values (and their variances) followed by the archetype's
    /// weekly statistics.
    pub fn inform(archetype: &Archetype, observed: &[f64], variance: &[f64]) -> Self {
        let len = archetype.mean.len();
        let week = observed.len().min(len);
        let mut mean = observed[..week].to_vec();
        mean.extend_from_slice(&archetype.mean[week..]);
        let mut var: Vec<f64> =
            (0..week).map(|i| variance.get(i).copied().unwrap_or(MIN_VARIANCE)).collect();
        var.extend_from_slice(&archetype.var[week..]);
        let std = var.iter().map(|v| v.max(MIN_VARIANCE).sqrt()).collect();
        let mut weights = vec![BACKGROUND_WEIGHT; len];
        for w in &mut weights[week.saturating_sub(RECENT_WEEKS)..week] {
            *w = RECENT_WEIGHT;
        }
        Self { mean, std, weights, week }
    }

    /// Copy whose most recent observed week is replaced by `value` with a
    /// tight variance.
    pub fn pinned(&self, value: f64, variance: f64) -> Self {
        let mut target = self.clone();
        if let Some(i) = self.week.checked_sub(1) {
            target.mean[i] = value;
            target.std[i] = variance.sqrt();
        }
        target
    }

    /// Half the summed squared weighted z-scores of `curve`.
    pub fn score(&self, curve: &[f64], multiplier: f64) -> f64 {
        let sum: f64 = curve
            .iter()
            .zip(&self.mean)
            .zip(&self.std)
            .zip(&self.weights)
            .map(|(((c, m), s), w)| {
                let z = w * (c * multiplier - m) / s;
                z * z
            })
            .sum();
        sum / 2.0
    }
}

/// Parameter box and resolution of a grid scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub min_shift: f64,
    pub max_shift: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Points per axis (at least 2).
    pub size: usize,
}

impl GridSpec {
    pub fn new(size: usize) -> Self {
        Self { min_shift: 0.0, max_shift: 10.0, min_scale: 1.0 / 3.0, max_scale: 3.0, size }
    }
}

/// Probability mass over a `(shift, scale)` grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub shifts: Vec<f64>,
    pub scales: Vec<f64>,
    /// Row-major masses, `probs[t * scales.len() + s]`.
    pub probs: Vec<f64>,
    pub d_shift: f64,
    pub d_scale: f64,
}

impl Grid {
    /// `(shift, scale)` of cell `index`.
    pub fn cell(&self, index: usize) -> (f64, f64) {
        let n = self.scales.len();
        (self.shifts[index / n], self.scales[index % n])
    }

    /// Index of the most probable cell (first on ties).
    pub fn best(&self) -> usize {
        self.probs
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(bi, bp), (i, &p)| {
                if p > bp { (i, p) } else { (bi, bp) }
            })
            .0
    }
}

/// `n` evenly spaced points from `lo` to `hi` inclusive.
fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![lo];
    }
    let step = (hi - lo) / (n - 1) as f64;
    (0..n).map(|i| lo + step * i as f64).collect()
}

/// Score every grid cell and convert scores to a normalized mass.
pub fn scan_grid(
    archetype: &Archetype, target: &FitTarget, multiplier: f64, spec: &GridSpec,
) -> Grid {
    let size = spec.size.max(2);
    let shifts = linspace(spec.min_shift, spec.max_shift, size);
    let scales = linspace(spec.min_scale, spec.max_scale, size);
    let scores: Vec<f64> = shifts
        .iter()
        .flat_map(|&t| scales.iter().map(move |&s| (t, s)))
        .map(|(t, s)| target.score(&archetype.instance(s, t, false), multiplier))
        .collect();
    let floor = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let weights: Vec<f64> = scores.iter().map(|s| (floor - s).exp()).collect();
    let total: f64 = weights.iter().sum();
    let probs = if total > 0.0 && total.is_finite() {
        weights.iter().map(|w| w / total).collect()
    } else {
        vec![1.0 / scores.len() as f64; scores.len()]
    };
    Grid {
        d_shift: shifts[1] - shifts[0],
        d_scale: scales[1] - scales[0],
        shifts,
        scales,
        probs,
    }
}

/// Score of an archetype instance as a simplex objective over
/// `[shift, scale]`.
pub struct CurveObjective<'a> {
    pub archetype: &'a Archetype,
    pub target: &'a FitTarget,
    pub multiplier: f64,
}

impl Objective for CurveObjective<'_> {
    type Data = ();

    fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
        let curve = self.archetype.instance(theta[1], theta[0], false);
        Ok(self.target.score(&curve, self.multiplier))
    }
}

/// Best-fitting parameters and curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveFit {
    pub shift: f64,
    pub scale: f64,
    pub score: f64,
    /// Holiday-free fitted curve.
    pub curve: Vec<f64>,
}

/// Coarse grid scan followed by simplex refinement.
///
/// # Errors
/// [`crate::forecast::errors::ForecastError::Optimization`] when the
/// simplex run fails.
pub fn best_fit(
    archetype: &Archetype, target: &FitTarget, multiplier: f64, spec: &GridSpec, max_iter: usize,
) -> ForecastResult<CurveFit> {
    let grid = scan_grid(archetype, target, multiplier, spec);
    let (shift0, scale0) = grid.cell(grid.best());
    let objective = CurveObjective { archetype, target, multiplier };
    let opts = SimplexOptions::new(1e-10, max_iter)?;
    let step = grid.d_shift.min(grid.d_scale);
    let outcome = minimize(&objective, array![shift0, scale0], step, &(), &opts)?;
    let (shift, scale) = (outcome.theta_hat[0], outcome.theta_hat[1]);
    debug!(
        "archetype fit: shift {shift:.3} scale {scale:.3} score {:.4} after {} iterations",
        outcome.value, outcome.iterations
    );
    let curve = archetype.instance(scale, shift, false);
    Ok(CurveFit { shift, scale, score: outcome.value, curve })
}

/// Draw `num` curves from the grid cells holding [`SAMPLE_MASS`] of the
/// probability.
pub fn sample_fits(
    archetype: &Archetype, target: &FitTarget, multiplier: f64, spec: &GridSpec, num: usize,
    add_holiday: bool, rng: &mut dyn RngCore,
) -> Vec<Vec<f64>> {
    let grid = scan_grid(archetype, target, multiplier, spec);
    let mut order: Vec<usize> = (0..grid.probs.len()).collect();
    order.sort_by(|a, b| grid.probs[*b].total_cmp(&grid.probs[*a]));

    let mut running = 0.0;
    let cumulative: Vec<f64> = order
        .iter()
        .map(|&i| {
            running += grid.probs[i];
            running
        })
        .collect();
    let limit = cumulative.partition_point(|c| *c < SAMPLE_MASS).max(1).min(order.len());
    let kept = &order[..limit];
    let kept_total: f64 = kept.iter().map(|&i| grid.probs[i]).sum();

    let mut running = 0.0;
    let cprob: Vec<f64> = kept
        .iter()
        .map(|&i| {
            running += grid.probs[i] / kept_total;
            running
        })
        .collect();

    (0..num)
        .map(|_| {
            let u: f64 = rng.random();
            let index = cprob.partition_point(|c| *c < u).min(limit - 1);
            let (shift, scale) = grid.cell(kept[index]);
            let shift = shift + rng.random_range(-grid.d_shift..=grid.d_shift) / 2.0;
            let scale = scale + rng.random_range(-grid.d_scale..=grid.d_scale) / 2.0;
            archetype.instance(scale, shift, add_holiday)
        })
        .collect()
}

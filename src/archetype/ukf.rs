//! Unscented Kalman filter with Van der Merwe scaled sigma points.
//!
//! Purpose
//! -------
//! Propagate a Gaussian state through nonlinear transition and measurement
//! functions without linearizing them. The archetype filter uses it to fuse
//! regional surveillance signals into a one-week-ahead nowcast.
//!
//! Key behaviors
//! -------------
//! - [`MerweSigmaPoints`] places `2n + 1` points at `x` and
//!   `x ± column_i(chol((n + λ)·P))` with `λ = α²(n + κ) − n`.
//! - [`UnscentedKalmanFilter::predict`] maps the points through `fx` and
//!   recovers mean and covariance (plus `Q`); [`UnscentedKalmanFilter::update`]
//!   maps the predicted points through `hx` and applies the Kalman gain.
//!
//! Invariants & assumptions
//! ------------------------
//! - `P`, `Q` and `R` are symmetric positive (semi-)definite; covariances
//!   are re-symmetrized after every step.
//! - `update` must follow `predict`; it reuses the predicted sigma points.
//!
//! Conventions
//! -----------
//! - Transition and measurement closures return `ForecastResult`, so
//!   failures inside them (e.g. a curve fit) abort the step.
//! - Numerical failures (no Cholesky factor, singular innovation
//!   covariance) surface as [`ForecastError::Training`] for the `nowcast`
//!   pseudo-location.
use crate::forecast::errors::{ForecastError, ForecastResult};
use nalgebra::{DMatrix, DVector};

const NOWCAST: &str = "nowcast";

/// Van der Merwe scaled sigma points and their weights.
#[derive(Debug, Clone, PartialEq)]
pub struct MerweSigmaPoints {
    pub n: usize,
    pub alpha: f64,
    pub beta: f64,
    pub kappa: f64,
    /// Mean weights.
    pub wm: Vec<f64>,
    /// Covariance weights.
    pub wc: Vec<f64>,
}

impl MerweSigmaPoints {
    pub fn new(n: usize, alpha: f64, beta: f64, kappa: f64) -> Self {
        let lambda = alpha * alpha * (n as f64 + kappa) - n as f64;
        let c = 0.5 / (n as f64 + lambda);
        let mut wm = vec![c; 2 * n + 1];
        let mut wc = vec![c; 2 * n + 1];
        wm[0] = lambda / (n as f64 + lambda);
        wc[0] = wm[0] + (1.0 - alpha * alpha + beta);
        Self { n, alpha, beta, kappa, wm, wc }
    }

    fn lambda(&self) -> f64 {
        self.alpha * self.alpha * (self.n as f64 + self.kappa) - self.n as f64
    }

    pub fn num_points(&self) -> usize {
        2 * self.n + 1
    }

    /// Sigma points around `x` for covariance `p`.
    ///
    /// # Errors
    /// [`ForecastError::Training`] when `(n + λ)·p` has no Cholesky factor.
    pub fn sigma_points(
        &self, x: &DVector<f64>, p: &DMatrix<f64>,
    ) -> ForecastResult<Vec<DVector<f64>>> {
        let scaled = p * (self.n as f64 + self.lambda());
        let root = scaled
            .cholesky()
            .ok_or_else(|| ForecastError::training(NOWCAST, "covariance is not positive definite"))?
            .l();
        let mut points = Vec::with_capacity(self.num_points());
        points.push(x.clone());
        for i in 0..self.n {
            points.push(x + root.column(i));
        }
        for i in 0..self.n {
            points.push(x - root.column(i));
        }
        Ok(points)
    }
}

/// Unscented Kalman filter state.
#[derive(Debug, Clone)]
pub struct UnscentedKalmanFilter {
    pub x: DVector<f64>,
    pub p: DMatrix<f64>,
    pub q: DMatrix<f64>,
    pub r: DMatrix<f64>,
    points: MerweSigmaPoints,
    sigmas_f: Vec<DVector<f64>>,
}

impl UnscentedKalmanFilter {
    pub fn new(
        x: DVector<f64>, p: DMatrix<f64>, q: DMatrix<f64>, r: DMatrix<f64>,
        points: MerweSigmaPoints,
    ) -> Self {
        Self { x, p, q, r, points, sigmas_f: Vec::new() }
    }

    /// Propagate the state through `fx`.
    ///
    /// # Errors
    /// Propagates sigma-point and `fx` failures.
    pub fn predict<F>(&mut self, mut fx: F) -> ForecastResult<()>
    where
        F: FnMut(&DVector<f64>) -> ForecastResult<DVector<f64>>,
    {
        let sigmas = self.points.sigma_points(&self.x, &self.p)?;
        self.sigmas_f = sigmas.iter().map(&mut fx).collect::<ForecastResult<Vec<_>>>()?;
        let (x, p) = unscented_transform(&self.sigmas_f, &self.points, &self.q);
        self.x = x;
        self.p = p;
        Ok(())
    }

    /// Correct the predicted state with measurement `z` through `hx`.
    ///
    /// # Errors
    /// - [`ForecastError::Training`] when called before `predict` or when
    ///   the innovation covariance is singular.
    /// - Propagates `hx` failures.
    pub fn update<H>(&mut self, z: &DVector<f64>, mut hx: H) -> ForecastResult<()>
    where
        H: FnMut(&DVector<f64>) -> ForecastResult<DVector<f64>>,
    {
        if self.sigmas_f.is_empty() {
            return Err(ForecastError::training(NOWCAST, "update called before predict"));
        }
        let sigmas_h = self.sigmas_f.iter().map(&mut hx).collect::<ForecastResult<Vec<_>>>()?;
        let (zp, s) = unscented_transform(&sigmas_h, &self.points, &self.r);

        let mut pxz = DMatrix::zeros(self.x.len(), zp.len());
        for ((sf, sh), wc) in self.sigmas_f.iter().zip(&sigmas_h).zip(&self.points.wc) {
            pxz += (sf - &self.x) * (sh - &zp).transpose() * *wc;
        }
        let s_inv = s
            .clone()
            .try_inverse()
            .ok_or_else(|| ForecastError::training(NOWCAST, "innovation covariance is singular"))?;
        let gain = &pxz * s_inv;
        self.x += &gain * (z - zp);
        self.p -= &gain * s * gain.transpose();
        self.p = symmetrize(&self.p);
        Ok(())
    }
}

/// Weighted mean and covariance of transformed points, plus `noise`.
fn unscented_transform(
    sigmas: &[DVector<f64>], points: &MerweSigmaPoints, noise: &DMatrix<f64>,
) -> (DVector<f64>, DMatrix<f64>) {
    let dim = sigmas.first().map_or(0, |s| s.len());
    let mut mean = DVector::zeros(dim);
    for (s, w) in sigmas.iter().zip(&points.wm) {
        mean += s * *w;
    }
    let mut cov = noise.clone();
    for (s, w) in sigmas.iter().zip(&points.wc) {
        let d = s - &mean;
        cov += &d * d.transpose() * *w;
    }
    (mean, symmetrize(&cov))
}

fn symmetrize(m: &DMatrix<f64>) -> DMatrix<f64> {
    (m + m.transpose()) * 0.5
}

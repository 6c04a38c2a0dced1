//! Hybrid composition of two processes.
//!
//! Purpose
//! -------
//! Join curves produced by two forecasting processes: one supplies the past
//! (weeks before the issue), the other the issue week and the future.
//!
//! Key behaviors
//! -------------
//! - [`Hybrid::new`] refuses processes trained on different seasons.
//! - [`Hybrid::compose`] draws both ensembles and pairs them round-robin
//!   into `max(|P|, |F|)` spliced curves, returning a [`Composition`] that
//!   also reports both ensemble sizes and the future half's estimator.
//! - The estimator travels with the composition, so distribution building
//!   for an Epicast future uses the number of forecasters actually seen at
//!   this issue.
use crate::{
    calendar::Epiweek,
    distribution::Estimator,
    forecast::errors::{ForecastError, ForecastResult},
    process::{Ensemble, ForecastProcess, issue_offset, source::SurveillanceSource},
};
use log::info;
use rand::RngCore;

/// Result of composing a hybrid ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub trajectories: Vec<Vec<f64>>,
    /// Number of curves the past process produced.
    pub past_count: usize,
    /// Number of curves the future process produced.
    pub future_count: usize,
    /// Estimator of the future ensemble.
    pub estimator: Estimator,
}

impl Composition {
    pub fn into_ensemble(self) -> Ensemble {
        Ensemble::new(self.trajectories).with_estimator(self.estimator)
    }
}

/// Past/future process pair.
#[derive(Debug, Clone)]
pub struct Hybrid<P, F> {
    name: String,
    past: P,
    future: F,
}

impl<P, F> Hybrid<P, F>
where
    P: ForecastProcess,
    F: ForecastProcess,
{
    /// # Errors
    /// [`ForecastError::SeasonMismatch`] when the two processes forecast
    /// different seasons.
    pub fn new(name: impl Into<String>, past: P, future: F) -> ForecastResult<Self> {
        if past.season() != future.season() {
            return Err(ForecastError::SeasonMismatch {
                past: past.season(),
                future: future.season(),
            });
        }
        Ok(Self { name: name.into(), past, future })
    }

    pub fn past(&self) -> &P {
        &self.past
    }

    pub fn future(&self) -> &F {
        &self.future
    }

    /// Draw both ensembles and splice them at the issue week.
    ///
    /// # Errors
    /// Propagates issue validation and sampling errors from either half.
    pub fn compose(
        &self, models: &(P::Model, F::Model), location: &str, issue: Epiweek,
        source: &dyn SurveillanceSource, rng: &mut dyn RngCore,
    ) -> ForecastResult<Composition> {
        let boundary = issue_offset(self.season(), issue)?;
        let past = self.past.sample(&models.0, location, issue, source, rng)?;
        let future = self.future.sample(&models.1, location, issue, source, rng)?;
        let trajectories = splice(&past.trajectories, &future.trajectories, boundary);
        info!(
            "{}: {location} spliced {} past and {} future curves at index {boundary}",
            self.name,
            past.len(),
            future.len()
        );
        Ok(Composition {
            trajectories,
            past_count: past.len(),
            future_count: future.len(),
            estimator: future.estimator,
        })
    }
}

impl<P, F> ForecastProcess for Hybrid<P, F>
where
    P: ForecastProcess,
    F: ForecastProcess,
{
    type Model = (P::Model, F::Model);

    fn name(&self) -> &str {
        &self.name
    }

    fn season(&self) -> i32 {
        self.past.season()
    }

    fn train(
        &self, location: &str, source: &dyn SurveillanceSource,
    ) -> ForecastResult<Self::Model> {
        Ok((self.past.train(location, source)?, self.future.train(location, source)?))
    }

    fn sample(
        &self, model: &Self::Model, location: &str, issue: Epiweek,
        source: &dyn SurveillanceSource, rng: &mut dyn RngCore,
    ) -> ForecastResult<Ensemble> {
        Ok(self.compose(model, location, issue, source, rng)?.into_ensemble())
    }
}

/// Pair `past[j % |past|]` with `future[j % |future|]` for
/// `j < max(|past|, |future|)`, taking weeks before `boundary` from the past
/// curve and the rest from the future curve.
///
/// Returns no curves when either side is empty.
pub fn splice(past: &[Vec<f64>], future: &[Vec<f64>], boundary: usize) -> Vec<Vec<f64>> {
    if past.is_empty() || future.is_empty() {
        return Vec::new();
    }
    (0..past.len().max(future.len()))
        .map(|j| {
            let p = &past[j % past.len()];
            let f = &future[j % future.len()];
            let mut curve = p[..boundary.min(p.len())].to_vec();
            curve.extend_from_slice(&f[boundary.min(f.len())..]);
            curve
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Epicast, EpicastConfig, source::MemorySource};
    use rand::{SeedableRng, rngs::StdRng};

    /// Process returning fixed curves.
    struct Fixed {
        season: i32,
        curves: Vec<Vec<f64>>,
        estimator: Estimator,
    }

    impl ForecastProcess for Fixed {
        type Model = ();

        fn name(&self) -> &str {
            "fixed"
        }

        fn season(&self) -> i32 {
            self.season
        }

        fn train(&self, _: &str, _: &dyn SurveillanceSource) -> ForecastResult<()> {
            Ok(())
        }

        fn sample(
            &self, _: &(), _: &str, _: Epiweek, _: &dyn SurveillanceSource,
            _: &mut dyn RngCore,
        ) -> ForecastResult<Ensemble> {
            Ok(Ensemble::new(self.curves.clone()).with_estimator(self.estimator))
        }
    }

    #[test]
    // Purpose
    // -------
    // Weeks before the boundary come from the past curve, the rest from the
    // future curve.
    //
    // Given
    // -----
    // - Past [1, 1, 1], future [9; 6], boundary 3.
    //
    // Expect
    // ------
    // - [1, 1, 1, 9, 9, 9].
    fn splice_at_boundary() {
        let out = splice(&[vec![1.0; 3]], &[vec![9.0; 6]], 3);
        assert_eq!(out, vec![vec![1.0, 1.0, 1.0, 9.0, 9.0, 9.0]]);
    }

    #[test]
    // Purpose
    // -------
    // The larger side sets the count and the smaller side is reused
    // round-robin.
    fn splice_round_robin() {
        let past = vec![vec![1.0; 4], vec![2.0; 4]];
        let future = vec![vec![7.0; 4], vec![8.0; 4], vec![9.0; 4]];
        let out = splice(&past, &future, 2);
        assert_eq!(out.len(), 3);
        assert_eq!(out[2], vec![1.0, 1.0, 9.0, 9.0]);
        assert!(splice(&[], &future, 2).is_empty());
    }

    #[test]
    // Purpose
    // -------
    // Halves must forecast the same season.
    fn seasons_must_match() {
        let past = Fixed { season: 2015, curves: vec![], estimator: Estimator::Empirical };
        let future = Epicast::new(EpicastConfig::new(2016)).unwrap();
        assert!(matches!(
            Hybrid::new("hybrid", past, future),
            Err(ForecastError::SeasonMismatch { past: 2015, future: 2016 })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Composition reports both ensemble sizes and the future estimator.
    //
    // Given
    // -----
    // - Issue 201542 (boundary 2), one past curve of 1s, two future curves
    //   of 9s with a Student-t estimator for 2 users.
    //
    // Expect
    // ------
    // - Two curves starting [1, 1, 9]; counts 1 and 2; Student-t estimator.
    fn composition_reports_metadata() {
        let past =
            Fixed { season: 2015, curves: vec![vec![1.0; 33]], estimator: Estimator::Empirical };
        let future = Fixed {
            season: 2015,
            curves: vec![vec![9.0; 33]; 2],
            estimator: Estimator::StudentT { num_users: 2 },
        };
        let hybrid = Hybrid::new("hybrid", past, future).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let issue = Epiweek::new(201542).unwrap();
        let composition =
            hybrid.compose(&((), ()), "nat", issue, &MemorySource::new(), &mut rng).unwrap();
        assert_eq!(composition.past_count, 1);
        assert_eq!(composition.future_count, 2);
        assert_eq!(composition.estimator, Estimator::StudentT { num_users: 2 });
        assert_eq!(&composition.trajectories[1][..3], &[1.0, 1.0, 9.0]);
        let ensemble =
            hybrid.sample(&((), ()), "nat", issue, &MemorySource::new(), &mut rng).unwrap();
        assert_eq!(ensemble.len(), 2);
    }
}

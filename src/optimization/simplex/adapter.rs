//! Adapter that exposes a user [`Objective`] as an `argmin` problem.
//!
//! The cost is passed through unchanged; non-finite values are turned into
//! [`OptError::NonFiniteCost`] so a diverging objective aborts the run
//! instead of poisoning the simplex.
use crate::optimization::{
    errors::OptError,
    simplex::{
        traits::Objective,
        types::{Cost, Theta},
    },
};
use argmin::core::{CostFunction, Error};

/// Bridges a user [`Objective`] to `argmin`'s `CostFunction`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: Objective> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: Objective> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost and check that it is finite.
    ///
    /// # Errors
    /// Propagates any `OptError` from the user's `value` via `?`.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<'a, F: Objective> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a user `Objective` and its data.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use ndarray::array;

    struct Reciprocal;

    impl Objective for Reciprocal {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<Cost> {
            Ok(1.0 / theta[0])
        }
    }

    #[test]
    // Purpose
    // -------
    // Finite costs pass through; an infinite cost becomes `NonFiniteCost`.
    fn non_finite_costs_are_errors() {
        let adapter = ArgMinAdapter::new(&Reciprocal, &());
        assert_eq!(adapter.cost(&array![2.0]).unwrap(), 0.5);
        let err = adapter.cost(&array![0.0]).unwrap_err();
        assert_eq!(OptError::from(err), OptError::NonFiniteCost { value: f64::INFINITY });
    }
}

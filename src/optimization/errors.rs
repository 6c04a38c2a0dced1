use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- SimplexOptions ----
    /// Simplex standard-deviation tolerance must be finite and non-negative.
    InvalidSdTolerance {
        tol: f64,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    /// Initial simplex step must be finite and non-zero.
    InvalidStep {
        step: f64,
        reason: &'static str,
    },

    // ---- Objective ----
    /// Objective returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },
    /// Starting point has a non-finite coordinate.
    InvalidThetaInput {
        index: usize,
        value: f64,
    },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },
    /// Theta hat is missing
    MissingThetaHat,

    // ---- Argmin ----
    /// Error raised by the argmin backend itself; `kind` names the argmin
    /// variant, or is "other" for errors argmin did not classify.
    Backend {
        kind: &'static str,
        text: String,
    },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- SimplexOptions ----
            OptError::InvalidSdTolerance { tol, reason } => {
                write!(f, "Invalid simplex sd tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::InvalidStep { step, reason } => {
                write!(f, "Invalid initial simplex step {step}: {reason}")
            }

            // ---- Objective ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }
            OptError::InvalidThetaInput { index, value } => {
                write!(f, "Invalid theta input at index {index}: {value}, must be finite")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }

            // ---- Argmin ----
            OptError::Backend { kind, text } => write!(f, "Argmin {kind} error: {text}"),
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // Objective errors travel through argmin boxed; recover them first.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        let kind = match original_err.downcast_ref::<ArgminError>() {
            Some(ArgminError::InvalidParameter { .. }) => "invalid parameter",
            Some(ArgminError::NotImplemented { .. }) => "not implemented",
            Some(ArgminError::NotInitialized { .. }) => "not initialized",
            Some(ArgminError::ConditionViolated { .. }) => "condition violated",
            Some(ArgminError::CheckpointNotFound { .. }) => "checkpoint",
            Some(ArgminError::PotentialBug { .. }) => "potential bug",
            Some(ArgminError::ImpossibleError { .. }) => "impossible",
            _ => "other",
        };
        OptError::Backend { kind, text: original_err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Objective errors boxed by argmin come back unchanged; argmin's own
    // errors are tagged with their kind.
    fn argmin_errors_are_normalized() {
        let boxed: Error = OptError::NonFiniteCost { value: f64::INFINITY }.into();
        assert_eq!(OptError::from(boxed), OptError::NonFiniteCost { value: f64::INFINITY });

        let argmin_err: Error = ArgminError::InvalidParameter { text: "sd".to_string() }.into();
        let OptError::Backend { kind, text } = OptError::from(argmin_err) else {
            panic!("expected a backend error");
        };
        assert_eq!(kind, "invalid parameter");
        assert!(text.contains("sd"));
    }
}

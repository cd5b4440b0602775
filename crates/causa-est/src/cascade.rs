use std::fmt;

use causa_core::errors::{CausalError, ErrorInfo};
use causa_core::Table;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::estimand::Estimand;
use crate::estimators::strategy;
use crate::method::{method_order, EstimatorMethod};
use crate::regression::PropensityOpts;

/// Numeric effect produced by one estimation method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalEstimate {
    /// Method that produced the value.
    pub method: EstimatorMethod,
    /// Estimated average treatment effect.
    pub value: f64,
    /// Estimand the value refers to.
    pub estimand: Estimand,
}

impl fmt::Display for CausalEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*** Causal Estimate ***")?;
        writeln!(f)?;
        writeln!(f, "## Identified estimand")?;
        writeln!(f, "{}", self.estimand)?;
        writeln!(f)?;
        writeln!(f, "## Realized estimand")?;
        writeln!(f, "Method: {}", self.method.qualified_name())?;
        writeln!(f, "b: {}", self.estimand.formula())?;
        writeln!(f, "Target units: ate")?;
        writeln!(f)?;
        writeln!(f, "## Estimate")?;
        write!(f, "Mean value: {}", self.value)
    }
}

/// Record of one method the cascade tried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Method tried.
    pub method: EstimatorMethod,
    /// Failure, when the method did not produce a value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CausalError>,
}

/// Result of running methods in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeOutcome {
    /// First successful estimate, if any method succeeded.
    pub estimate: Option<CausalEstimate>,
    /// Every method tried, in order.
    pub attempts: Vec<Attempt>,
}

impl CascadeOutcome {
    /// Error raised by the last failed method.
    pub fn last_error(&self) -> Option<&CausalError> {
        self.attempts.iter().rev().find_map(|a| a.error.as_ref())
    }

    /// Estimate rendering, or `Estimation failed: <last error>` when every method failed.
    pub fn summary(&self) -> Option<String> {
        match (&self.estimate, self.last_error()) {
            (Some(estimate), _) => Some(estimate.to_string()),
            (None, Some(err)) => Some(format!("Estimation failed: {}", err.info())),
            (None, None) => None,
        }
    }
}

/// Tries each method once, in order, and stops at the first success.
///
/// A method failure is recorded and the next method is tried; a non-finite
/// value counts as a failure.
pub fn run_cascade(
    data: &Table,
    estimand: &Estimand,
    order: &[EstimatorMethod],
    opts: &PropensityOpts,
) -> CascadeOutcome {
    let mut attempts = Vec::with_capacity(order.len());
    for &method in order {
        let result = strategy(method, opts)
            .estimate(data, estimand)
            .and_then(|value| {
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(CausalError::Estimation(
                        ErrorInfo::new("non-finite-estimate", "estimator returned a non-finite value")
                            .with_context("method", method),
                    ))
                }
            });
        match result {
            Ok(value) => {
                debug!(%method, value, "estimator succeeded");
                attempts.push(Attempt {
                    method,
                    error: None,
                });
                return CascadeOutcome {
                    estimate: Some(CausalEstimate {
                        method,
                        value,
                        estimand: estimand.clone(),
                    }),
                    attempts,
                };
            }
            Err(error) => {
                debug!(%method, %error, "estimator failed; trying next method");
                attempts.push(Attempt {
                    method,
                    error: Some(error),
                });
            }
        }
    }
    CascadeOutcome {
        estimate: None,
        attempts,
    }
}

/// Runs the cascade with the caller preference resolved through [`method_order`].
pub fn estimate_effect(
    data: &Table,
    estimand: &Estimand,
    preferred: Option<&str>,
    opts: &PropensityOpts,
) -> CascadeOutcome {
    run_cascade(data, estimand, &method_order(preferred), opts)
}

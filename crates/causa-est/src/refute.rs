use std::fmt;

use causa_core::errors::{CausalError, ErrorInfo};
use causa_core::stats::{mean, normal_cdf, sample_std};
use causa_core::{Column, RngHandle, Table};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cascade::CausalEstimate;
use crate::estimators::strategy;
use crate::regression::PropensityOpts;

fn default_num_simulations() -> usize {
    100
}

fn default_enabled() -> bool {
    true
}

/// Refuter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefuterOpts {
    /// Whether the refutation runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Number of independent fake common causes to inject.
    #[serde(default = "default_num_simulations")]
    pub num_simulations: usize,
}

impl Default for RefuterOpts {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            num_simulations: default_num_simulations(),
        }
    }
}

/// Sensitivity of an estimate to a randomly injected common cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refutation {
    /// Effect reported by the cascade.
    pub estimated_effect: f64,
    /// Mean effect across the perturbed datasets.
    pub new_effect: f64,
    /// Two-sided normal p-value of the original effect against the simulated ones.
    pub p_value: Option<f64>,
    /// Number of perturbed datasets.
    pub simulations: usize,
}

impl fmt::Display for Refutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Refute: Add a random common cause")?;
        writeln!(f, "Estimated effect:{}", self.estimated_effect)?;
        writeln!(f, "New effect:{}", self.new_effect)?;
        match self.p_value {
            Some(p) => writeln!(f, "p value:{p}"),
            None => writeln!(f, "p value:n/a"),
        }
    }
}

fn refute_error(code: &str, message: impl Into<String>) -> CausalError {
    CausalError::Refutation(ErrorInfo::new(code, message.into()))
}

fn fresh_column_name(data: &Table) -> String {
    let mut name = "w_random".to_string();
    let mut suffix = 0usize;
    while data.contains(&name) {
        suffix += 1;
        name = format!("w_random_{suffix}");
    }
    name
}

/// Two-sided normal p-value of `estimated` against the simulated effects.
///
/// `None` when the spread is undefined or zero.
fn simulated_p_value(estimated: f64, new_effect: f64, effects: &[f64]) -> Option<f64> {
    sample_std(effects).filter(|sd| *sd > 0.0).map(|sd| {
        let z = (estimated - new_effect).abs() / sd;
        (2.0 * (1.0 - normal_cdf(z))).min(1.0)
    })
}

/// Re-estimates the effect after adding an independent standard-normal
/// covariate to the data and to the adjustment set.
///
/// Each simulation draws from its own substream of `rng`, so a seeded handle
/// reproduces the same refutation.
pub fn refute_random_common_cause(
    data: &Table,
    estimate: &CausalEstimate,
    opts: &RefuterOpts,
    propensity: &PropensityOpts,
    rng: &RngHandle,
) -> Result<Refutation, CausalError> {
    if opts.num_simulations == 0 {
        return Err(refute_error("no-simulations", "num_simulations must be positive"));
    }
    let name = fresh_column_name(data);
    let perturbed_estimand = estimate.estimand.with_extra_covariate(name.clone());
    let estimator = strategy(estimate.method, propensity);

    let mut effects = Vec::with_capacity(opts.num_simulations);
    for sim in 0..opts.num_simulations {
        let mut stream = rng.substream(sim as u64);
        let noise: Vec<f64> = (0..data.n_rows())
            .map(|_| stream.sample::<f64, _>(StandardNormal))
            .collect();
        let perturbed = data.with_column(Column::new(name.clone(), noise))?;
        let effect = estimator
            .estimate(&perturbed, &perturbed_estimand)
            .map_err(|err| {
                CausalError::Refutation(
                    ErrorInfo::new("re-estimation-failed", err.info().message.clone())
                        .with_context("simulation", sim)
                        .with_context("method", estimate.method),
                )
            })?;
        effects.push(effect);
    }

    let new_effect = mean(&effects).unwrap_or(f64::NAN);
    let p_value = simulated_p_value(estimate.value, new_effect, &effects);
    debug!(simulations = effects.len(), new_effect, ?p_value, "random common cause refutation");
    Ok(Refutation {
        estimated_effect: estimate.value,
        new_effect,
        p_value,
        simulations: effects.len(),
    })
}

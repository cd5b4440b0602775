use causa_core::errors::{CausalError, ErrorInfo};
use causa_core::stats::{distinct_sorted, mean, sample_std};
use causa_core::Table;
use serde::{Deserialize, Serialize};

fn effect_error(code: &str, message: impl Into<String>) -> CausalError {
    CausalError::EffectSize(ErrorInfo::new(code, message.into()))
}

/// Interpretable metrics derived from a raw estimate.
///
/// Undefined metrics are `None` and serialise as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSizeSummary {
    /// Raw estimate the metrics were derived from.
    pub estimate_value: f64,
    /// Mean of the outcome column.
    pub outcome_mean: f64,
    /// Sample standard deviation of the outcome (undefined for one row).
    pub outcome_std: Option<f64>,
    /// Mean of the treatment column.
    pub treatment_mean: f64,
    /// Outcome mean of the higher treatment group minus the lower one, for binary treatments.
    pub group_mean_diff: Option<f64>,
    /// Estimate as a percentage of the outcome mean.
    pub percent_of_outcome_mean: Option<f64>,
    /// Estimate in outcome standard deviations.
    pub standardized_effect: Option<f64>,
    /// Standardized effect, else percent of mean, else the raw value.
    pub effect_score: f64,
}

/// Effect-size block of the result bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectSize {
    /// Metrics were derived.
    Summary(EffectSizeSummary),
    /// Metrics could not be derived.
    Failed {
        /// Reason the metrics are missing.
        error: String,
    },
}

impl EffectSize {
    /// Folds a summariser result into the serialisable block.
    pub fn from_result(result: Result<EffectSizeSummary, CausalError>) -> Self {
        match result {
            Ok(summary) => EffectSize::Summary(summary),
            Err(err) => EffectSize::Failed {
                error: format!("Effect size computation failed: {}", err.info()),
            },
        }
    }

    /// Summary when the metrics were derived.
    pub fn summary(&self) -> Option<&EffectSizeSummary> {
        match self {
            EffectSize::Summary(summary) => Some(summary),
            EffectSize::Failed { .. } => None,
        }
    }
}

/// Outcome mean of the upper treatment group minus the lower one.
///
/// Defined only when the treatment takes exactly two values and each group
/// holds at least two rows.
fn group_mean_difference(treatment: &[f64], outcome: &[f64]) -> Option<f64> {
    let levels = distinct_sorted(treatment);
    let [low, high] = levels.as_slice() else {
        return None;
    };
    let pick = |level: f64| -> Vec<f64> {
        treatment
            .iter()
            .zip(outcome)
            .filter(|(t, _)| **t == level)
            .map(|(_, y)| *y)
            .collect()
    };
    let (g0, g1) = (pick(*low), pick(*high));
    if g0.len() < 2 || g1.len() < 2 {
        return None;
    }
    Some(mean(&g1)? - mean(&g0)?)
}

/// Derives effect-size heuristics for `value` from the treatment and outcome columns.
pub fn summarize_effect(
    value: f64,
    data: &Table,
    treatment: &str,
    outcome: &str,
) -> Result<EffectSizeSummary, CausalError> {
    if !value.is_finite() {
        return Err(effect_error("non-finite-estimate", "estimate value is not finite"));
    }
    let t = data.column(treatment).ok_or_else(|| {
        CausalError::EffectSize(
            ErrorInfo::new("missing-column", "treatment column not found").with_context("column", treatment),
        )
    })?;
    let y = data.column(outcome).ok_or_else(|| {
        CausalError::EffectSize(
            ErrorInfo::new("missing-column", "outcome column not found").with_context("column", outcome),
        )
    })?;
    let outcome_mean = mean(y).ok_or_else(|| effect_error("empty-table", "no rows to summarise"))?;
    let treatment_mean = mean(t).ok_or_else(|| effect_error("empty-table", "no rows to summarise"))?;
    let outcome_std = sample_std(y).filter(|sd| sd.is_finite());

    let percent_of_outcome_mean = (outcome_mean != 0.0).then(|| value / outcome_mean * 100.0);
    let standardized_effect = outcome_std
        .filter(|sd| *sd != 0.0)
        .map(|sd| value / sd);
    let effect_score = standardized_effect
        .or(percent_of_outcome_mean)
        .unwrap_or(value);

    Ok(EffectSizeSummary {
        estimate_value: value,
        outcome_mean,
        outcome_std,
        treatment_mean,
        group_mean_diff: group_mean_difference(t, y),
        percent_of_outcome_mean,
        standardized_effect,
        effect_score,
    })
}

use causa_core::errors::{CausalError, ErrorInfo};
use causa_core::stats::distinct_sorted;
use causa_core::Table;
use nalgebra::DVector;

use crate::estimand::Estimand;
use crate::method::EstimatorMethod;
use crate::regression::{design_matrix, ols, propensity_scores, PropensityOpts};

fn estimation_error(code: &str, message: impl Into<String>) -> CausalError {
    CausalError::Estimation(ErrorInfo::new(code, message.into()))
}

/// Strategy computing an average treatment effect for a backdoor estimand.
pub trait Estimator {
    /// Method implemented by the strategy.
    fn method(&self) -> EstimatorMethod;

    /// Estimates the effect of a unit change in treatment on the outcome.
    fn estimate(&self, data: &Table, estimand: &Estimand) -> Result<f64, CausalError>;
}

/// Outcome regressed on treatment plus adjustment set; the effect is the
/// treatment coefficient.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearRegression;

impl Estimator for LinearRegression {
    fn method(&self) -> EstimatorMethod {
        EstimatorMethod::LinearRegression
    }

    fn estimate(&self, data: &Table, estimand: &Estimand) -> Result<f64, CausalError> {
        let mut regressors = vec![estimand.treatment.as_str()];
        regressors.extend(estimand.backdoor.iter().map(String::as_str));
        let x = design_matrix(data, regressors.as_slice())?;
        let y = DVector::from_column_slice(data.require(&estimand.outcome)?);
        let beta = ols(&x, &y)?;
        Ok(beta[1])
    }
}

/// Treatment labels and propensity scores shared by the propensity methods.
struct PropensityFit {
    treated: Vec<bool>,
    outcome: Vec<f64>,
    scores: Vec<f64>,
}

fn fit_propensity(
    data: &Table,
    estimand: &Estimand,
    opts: &PropensityOpts,
) -> Result<PropensityFit, CausalError> {
    let treatment = data.require(&estimand.treatment)?;
    if distinct_sorted(treatment) != [0.0, 1.0] {
        return Err(CausalError::Estimation(
            ErrorInfo::new("non-binary-treatment", "propensity score methods require a binary 0/1 treatment")
                .with_context("treatment", &estimand.treatment),
        ));
    }
    let x = design_matrix(data, estimand.backdoor.as_slice())?;
    let labels = DVector::from_column_slice(treatment);
    let scores = propensity_scores(&x, &labels, opts)?;
    Ok(PropensityFit {
        treated: treatment.iter().map(|&v| v == 1.0).collect(),
        outcome: data.require(&estimand.outcome)?.to_vec(),
        scores,
    })
}

/// Normalised inverse propensity weighting.
#[derive(Debug, Clone, Default)]
pub struct PropensityScoreWeighting {
    opts: PropensityOpts,
}

impl PropensityScoreWeighting {
    /// Creates the estimator with the given propensity model settings.
    pub fn new(opts: PropensityOpts) -> Self {
        Self { opts }
    }
}

impl Estimator for PropensityScoreWeighting {
    fn method(&self) -> EstimatorMethod {
        EstimatorMethod::PropensityScoreWeighting
    }

    fn estimate(&self, data: &Table, estimand: &Estimand) -> Result<f64, CausalError> {
        let fit = fit_propensity(data, estimand, &self.opts)?;
        let (mut wy1, mut w1, mut wy0, mut w0) = (0.0, 0.0, 0.0, 0.0);
        for ((&treated, &y), &ps) in fit.treated.iter().zip(&fit.outcome).zip(&fit.scores) {
            if treated {
                let w = 1.0 / ps;
                wy1 += w * y;
                w1 += w;
            } else {
                let w = 1.0 / (1.0 - ps);
                wy0 += w * y;
                w0 += w;
            }
        }
        if w1 <= 0.0 || w0 <= 0.0 {
            return Err(estimation_error("empty-group", "both treatment groups need positive weight"));
        }
        Ok(wy1 / w1 - wy0 / w0)
    }
}

/// Nearest-neighbour matching on the propensity score, with replacement.
#[derive(Debug, Clone, Default)]
pub struct PropensityScoreMatching {
    opts: PropensityOpts,
}

impl PropensityScoreMatching {
    /// Creates the estimator with the given propensity model settings.
    pub fn new(opts: PropensityOpts) -> Self {
        Self { opts }
    }
}

/// Outcome of the unit in `pool` (sorted by score) whose score is closest to `score`.
fn nearest_outcome(pool: &[(f64, f64)], score: f64) -> f64 {
    let idx = pool.partition_point(|&(s, _)| s < score);
    let candidates = [idx.checked_sub(1), (idx < pool.len()).then_some(idx)];
    candidates
        .into_iter()
        .flatten()
        .map(|i| pool[i])
        .min_by(|a, b| (a.0 - score).abs().total_cmp(&(b.0 - score).abs()))
        .map(|(_, y)| y)
        .unwrap_or(f64::NAN)
}

impl Estimator for PropensityScoreMatching {
    fn method(&self) -> EstimatorMethod {
        EstimatorMethod::PropensityScoreMatching
    }

    fn estimate(&self, data: &Table, estimand: &Estimand) -> Result<f64, CausalError> {
        let fit = fit_propensity(data, estimand, &self.opts)?;
        let mut treated: Vec<(f64, f64)> = Vec::new();
        let mut control: Vec<(f64, f64)> = Vec::new();
        for ((&is_treated, &y), &ps) in fit.treated.iter().zip(&fit.outcome).zip(&fit.scores) {
            if is_treated {
                treated.push((ps, y));
            } else {
                control.push((ps, y));
            }
        }
        if treated.is_empty() || control.is_empty() {
            return Err(estimation_error("empty-group", "matching needs treated and control units"));
        }
        treated.sort_by(|a, b| a.0.total_cmp(&b.0));
        control.sort_by(|a, b| a.0.total_cmp(&b.0));

        let att = treated
            .iter()
            .map(|&(ps, y)| y - nearest_outcome(&control, ps))
            .sum::<f64>()
            / treated.len() as f64;
        let atc = control
            .iter()
            .map(|&(ps, y)| nearest_outcome(&treated, ps) - y)
            .sum::<f64>()
            / control.len() as f64;
        let (nt, nc) = (treated.len() as f64, control.len() as f64);
        Ok((att * nt + atc * nc) / (nt + nc))
    }
}

/// Strategy implementing `method`.
pub fn strategy(method: EstimatorMethod, opts: &PropensityOpts) -> Box<dyn Estimator> {
    match method {
        EstimatorMethod::LinearRegression => Box::new(LinearRegression),
        EstimatorMethod::PropensityScoreWeighting => {
            Box::new(PropensityScoreWeighting::new(opts.clone()))
        }
        EstimatorMethod::PropensityScoreMatching => {
            Box::new(PropensityScoreMatching::new(opts.clone()))
        }
    }
}

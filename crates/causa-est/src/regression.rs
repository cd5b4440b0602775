use causa_core::errors::{CausalError, ErrorInfo};
use causa_core::Table;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

fn estimation_error(code: &str, message: impl Into<String>) -> CausalError {
    CausalError::Estimation(ErrorInfo::new(code, message.into()))
}

fn default_clip_min() -> f64 {
    0.05
}

fn default_clip_max() -> f64 {
    0.95
}

fn default_l2_penalty() -> f64 {
    1.0
}

fn default_max_iters() -> usize {
    100
}

fn default_tolerance() -> f64 {
    1e-8
}

/// Propensity model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropensityOpts {
    /// Lower clip applied to fitted propensities.
    #[serde(default = "default_clip_min")]
    pub clip_min: f64,
    /// Upper clip applied to fitted propensities.
    #[serde(default = "default_clip_max")]
    pub clip_max: f64,
    /// Ridge penalty on the non-intercept logistic weights.
    #[serde(default = "default_l2_penalty")]
    pub l2_penalty: f64,
    /// Maximum Newton iterations.
    #[serde(default = "default_max_iters")]
    pub max_iters: usize,
    /// Convergence threshold on the largest coefficient update.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for PropensityOpts {
    fn default() -> Self {
        Self {
            clip_min: default_clip_min(),
            clip_max: default_clip_max(),
            l2_penalty: default_l2_penalty(),
            max_iters: default_max_iters(),
            tolerance: default_tolerance(),
        }
    }
}

/// Design matrix with a leading intercept column followed by `columns`.
pub fn design_matrix<S: AsRef<str>>(data: &Table, columns: &[S]) -> Result<DMatrix<f64>, CausalError> {
    let n = data.n_rows();
    let values = columns
        .iter()
        .map(|name| data.require(name.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DMatrix::from_fn(n, columns.len() + 1, |row, col| {
        if col == 0 {
            1.0
        } else {
            values[col - 1][row]
        }
    }))
}

/// Least-squares coefficients of `y` on `x`, failing on rank deficiency.
pub fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>, CausalError> {
    let (n, p) = x.shape();
    if n <= p {
        return Err(CausalError::Estimation(
            ErrorInfo::new("too-few-rows", "regression needs more rows than coefficients")
                .with_context("rows", n)
                .with_context("coefficients", p),
        ));
    }
    let svd = x.clone().svd(true, true);
    let largest = svd.singular_values.max();
    let eps = largest * (n.max(p) as f64) * f64::EPSILON;
    let rank = svd.rank(eps);
    if rank < p {
        return Err(CausalError::Estimation(
            ErrorInfo::new("rank-deficient", "design matrix is rank deficient")
                .with_context("rank", rank)
                .with_context("coefficients", p),
        ));
    }
    let beta = svd
        .solve(y, eps)
        .map_err(|msg| estimation_error("solve-failed", msg))?;
    if beta.iter().any(|b| !b.is_finite()) {
        return Err(estimation_error("non-finite-coefficients", "regression produced non-finite coefficients"));
    }
    Ok(beta)
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Fits an L2-regularised logistic regression by Newton iterations.
///
/// The intercept (column 0) is not penalised. Returns the coefficient vector.
pub fn logistic_fit(
    x: &DMatrix<f64>,
    t: &DVector<f64>,
    opts: &PropensityOpts,
) -> Result<DVector<f64>, CausalError> {
    let (n, p) = x.shape();
    if t.len() != n {
        return Err(estimation_error("shape-mismatch", "labels and design rows differ"));
    }
    let mut beta = DVector::<f64>::zeros(p);
    let mut penalty = DMatrix::<f64>::identity(p, p) * opts.l2_penalty;
    penalty[(0, 0)] = 0.0;

    for iter in 0..opts.max_iters {
        let probs = (x * &beta).map(sigmoid);
        let weights = probs.map(|q| (q * (1.0 - q)).max(1e-12));
        let gradient = x.transpose() * (t - &probs) - &penalty * &beta;
        let weighted = DMatrix::from_fn(n, p, |row, col| x[(row, col)] * weights[row]);
        let hessian = x.transpose() * weighted + &penalty;
        let step = hessian
            .cholesky()
            .ok_or_else(|| estimation_error("singular-hessian", "propensity model Hessian is not positive definite"))?
            .solve(&gradient);
        beta += &step;
        if beta.iter().any(|b| !b.is_finite()) {
            return Err(estimation_error("propensity-diverged", "propensity model coefficients diverged"));
        }
        if step.amax() < opts.tolerance {
            debug!(iterations = iter + 1, "propensity model converged");
            return Ok(beta);
        }
    }
    debug!(max_iters = opts.max_iters, "propensity model hit the iteration cap");
    Ok(beta)
}

/// Clipped propensity scores for every row.
pub fn propensity_scores(
    x: &DMatrix<f64>,
    t: &DVector<f64>,
    opts: &PropensityOpts,
) -> Result<Vec<f64>, CausalError> {
    let beta = logistic_fit(x, t, opts)?;
    Ok((x * beta)
        .iter()
        .map(|&z| sigmoid(z).clamp(opts.clip_min, opts.clip_max))
        .collect())
}

use causa_core::errors::{CausalError, ErrorInfo};
use causa_core::stats::{normal_cdf, pearson};
use causa_core::Table;
use nalgebra::DMatrix;

fn test_error(code: &str, message: impl Into<String>) -> CausalError {
    CausalError::Structure(ErrorInfo::new(code, message.into()))
}

/// Conditional independence test over the columns of a table, addressed by index.
pub trait IndependenceTest {
    /// Number of variables the test knows about.
    fn num_vars(&self) -> usize;

    /// p-value for the hypothesis `x ⟂ y | cond`.
    fn p_value(&self, x: usize, y: usize, cond: &[usize]) -> Result<f64, CausalError>;
}

/// Fisher-z partial correlation test for approximately Gaussian data.
#[derive(Debug, Clone)]
pub struct FisherZ {
    corr: DMatrix<f64>,
    n: usize,
}

impl FisherZ {
    /// Precomputes the correlation matrix of every column in `table`.
    ///
    /// Fails when any pairwise correlation is undefined, which happens as soon
    /// as a column has zero variance.
    pub fn new(table: &Table) -> Result<Self, CausalError> {
        let columns = table.columns();
        let p = columns.len();
        let mut corr = DMatrix::<f64>::identity(p, p);
        for i in 0..p {
            for j in (i + 1)..p {
                let r = pearson(&columns[i].values, &columns[j].values).ok_or_else(|| {
                    CausalError::Structure(
                        ErrorInfo::new("undefined-correlation", "correlation is undefined for a column pair")
                            .with_context("left", &columns[i].name)
                            .with_context("right", &columns[j].name),
                    )
                })?;
                corr[(i, j)] = r;
                corr[(j, i)] = r;
            }
        }
        Ok(Self {
            corr,
            n: table.n_rows(),
        })
    }

    /// Builds the test from a precomputed correlation matrix and sample size.
    pub fn from_correlation(corr: DMatrix<f64>, n: usize) -> Result<Self, CausalError> {
        if !corr.is_square() {
            return Err(test_error("non-square-correlation", "correlation matrix must be square"));
        }
        Ok(Self { corr, n })
    }

    fn partial_correlation(&self, x: usize, y: usize, cond: &[usize]) -> Result<f64, CausalError> {
        let mut vars = Vec::with_capacity(cond.len() + 2);
        vars.push(x);
        vars.push(y);
        vars.extend_from_slice(cond);
        let k = vars.len();
        let sub = DMatrix::from_fn(k, k, |i, j| self.corr[(vars[i], vars[j])]);
        let inv = sub.try_inverse().ok_or_else(|| {
            test_error("singular-correlation", "data correlation matrix is singular")
        })?;
        let scale = inv[(0, 0)] * inv[(1, 1)];
        if !(scale > 0.0) {
            return Err(test_error("singular-correlation", "inverse correlation matrix is not positive definite"));
        }
        let r = -inv[(0, 1)] / scale.sqrt();
        if !r.is_finite() {
            return Err(test_error("singular-correlation", "partial correlation is not finite"));
        }
        if r.abs() >= 1.0 {
            return Ok((1.0 - f64::EPSILON) * r.signum());
        }
        Ok(r)
    }
}

impl IndependenceTest for FisherZ {
    fn num_vars(&self) -> usize {
        self.corr.nrows()
    }

    fn p_value(&self, x: usize, y: usize, cond: &[usize]) -> Result<f64, CausalError> {
        let p = self.num_vars();
        if x >= p || y >= p || cond.iter().any(|&c| c >= p) {
            return Err(test_error("unknown-variable", "variable index out of range"));
        }
        let dof = self.n as f64 - cond.len() as f64 - 3.0;
        if dof < 0.0 {
            return Err(CausalError::Structure(
                ErrorInfo::new("insufficient-samples", "too few rows for the conditioning set size")
                    .with_context("rows", self.n)
                    .with_context("conditioning", cond.len())
                    .with_hint("reduce the number of variables or supply more rows"),
            ));
        }
        let r = self.partial_correlation(x, y, cond)?;
        let z = 0.5 * ((1.0 + r) / (1.0 - r)).ln();
        let stat = dof.sqrt() * z.abs();
        Ok(2.0 * (1.0 - normal_cdf(stat)))
    }
}

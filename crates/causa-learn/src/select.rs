use std::cmp::Ordering;

use causa_core::errors::CausalError;
use causa_core::stats::{is_constant, pearson, sample_std};
use causa_core::Table;
use serde::{Deserialize, Serialize};

fn default_min_vars() -> usize {
    3
}

fn default_max_vars() -> usize {
    20
}

/// Bounds on the number of variables handed to structure learning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorOpts {
    /// Lower bound on the variable budget regardless of sample size.
    #[serde(default = "default_min_vars")]
    pub min_vars: usize,
    /// Upper bound on the variable budget regardless of sample size.
    #[serde(default = "default_max_vars")]
    pub max_vars: usize,
}

impl Default for SelectorOpts {
    fn default() -> Self {
        Self {
            min_vars: default_min_vars(),
            max_vars: default_max_vars(),
        }
    }
}

impl SelectorOpts {
    /// Variable budget for a table with `n_rows` rows: `max(min, min(n - 2, max))`.
    pub fn bound(&self, n_rows: usize) -> usize {
        self.min_vars
            .max(n_rows.saturating_sub(2).min(self.max_vars))
    }
}

/// Columns chosen for structure learning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected columns; treatment and outcome are always present.
    pub columns: Vec<String>,
    /// Budget that applied to this table.
    pub bound: usize,
    /// Whether the budget forced correlation ranking.
    pub ranked: bool,
}

/// Names of the columns with more than one distinct value, in table order.
pub fn non_constant_columns(table: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|c| !is_constant(&c.values))
        .map(|c| c.name.clone())
        .collect()
}

fn ranking_score(values: &[f64], outcome: &[f64]) -> f64 {
    match pearson(values, outcome) {
        Some(r) => r.abs(),
        None => sample_std(values).unwrap_or(0.0),
    }
}

/// Chooses the variables structure learning may examine.
///
/// Zero-variance columns never compete for a slot. When the remaining columns
/// plus treatment and outcome fit the budget they are all kept in table order;
/// otherwise the others are ranked by absolute correlation with the outcome
/// (standard deviation when the correlation is undefined) and the best ones
/// fill the slots left after treatment and outcome.
pub fn select_columns(
    table: &Table,
    treatment: &str,
    outcome: &str,
    opts: &SelectorOpts,
) -> Result<Selection, CausalError> {
    let outcome_values = table.require(outcome)?;
    table.require(treatment)?;
    let bound = opts.bound(table.n_rows());

    let non_constant = non_constant_columns(table);
    let pool: Vec<String> = table
        .names()
        .into_iter()
        .filter(|name| name == treatment || name == outcome || non_constant.contains(name))
        .collect();

    if pool.len() <= bound {
        return Ok(Selection {
            columns: pool,
            bound,
            ranked: false,
        });
    }

    let mut scored: Vec<(String, f64)> = pool
        .into_iter()
        .filter(|name| name != treatment && name != outcome)
        .map(|name| {
            let score = table
                .column(&name)
                .map(|values| ranking_score(values, outcome_values))
                .unwrap_or(0.0);
            (name, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut columns = vec![treatment.to_string(), outcome.to_string()];
    let take = bound.saturating_sub(columns.len());
    columns.extend(scored.into_iter().take(take).map(|(name, _)| name));
    Ok(Selection {
        columns,
        bound,
        ranked: true,
    })
}

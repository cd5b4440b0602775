use causa_core::errors::{CausalError, ErrorInfo};
use causa_core::Table;
use causa_graph::{classify, FallbackReason, LearnedStructure, RawAdjacency};
use tracing::{debug, warn};

use crate::citest::FisherZ;
use crate::pc::pc_search;
use crate::select::{non_constant_columns, select_columns, SelectorOpts, Selection};

/// Default significance level for independence tests.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Constraint-based structure learner contract.
///
/// Implementations receive a table that already holds only the selected
/// columns and report an ordered adjacency over those columns. Any error is
/// treated as a learning failure by the caller; implementations must not retry.
pub trait StructureLearner {
    /// Short algorithm label reported in results.
    fn algorithm(&self) -> &'static str;

    /// Significance level applied by the learner.
    fn alpha(&self) -> f64;

    /// Learns an adjacency over every column of `table`.
    fn learn(&self, table: &Table) -> Result<RawAdjacency, CausalError>;
}

/// PC search driven by the Fisher-z test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcLearner {
    alpha: f64,
}

impl PcLearner {
    /// Creates a learner with the given significance level.
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }
}

impl Default for PcLearner {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl StructureLearner for PcLearner {
    fn algorithm(&self) -> &'static str {
        "PC"
    }

    fn alpha(&self) -> f64 {
        self.alpha
    }

    fn learn(&self, table: &Table) -> Result<RawAdjacency, CausalError> {
        let test = FisherZ::new(table)?;
        pc_search(&table.names(), &test, self.alpha)
    }
}

/// Rejects learner output that mentions a column outside the learned subset.
fn check_endpoints(raw: &RawAdjacency, columns: &[String]) -> Result<(), CausalError> {
    for edge in &raw.edges {
        for node in [&edge.source, &edge.target] {
            if !columns.contains(node) {
                return Err(CausalError::Structure(
                    ErrorInfo::new("unknown-node", "learner reported an edge on an unselected column")
                        .with_context("node", node),
                ));
            }
        }
    }
    Ok(())
}

/// Discovery stage outcome.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Columns handed to the learner, absent when learning was skipped.
    pub selection: Option<Selection>,
    /// Classified edges or the reason for the minimal-graph fallback.
    pub structure: LearnedStructure,
}

/// Selects columns, runs the learner once and classifies its output.
///
/// Never fails: too little signal or a learner error both become a
/// [`LearnedStructure::Fallback`]. Only missing treatment or outcome columns
/// are reported as errors.
pub fn discover<L: StructureLearner + ?Sized>(
    table: &Table,
    treatment: &str,
    outcome: &str,
    selector: &SelectorOpts,
    learner: &L,
) -> Result<Discovery, CausalError> {
    table.require(treatment)?;
    table.require(outcome)?;

    let non_constant = non_constant_columns(table).len();
    if non_constant < 2 {
        warn!(non_constant, "not enough varying columns for structure learning; using minimal graph");
        return Ok(Discovery {
            selection: None,
            structure: LearnedStructure::Fallback(FallbackReason::InsufficientSignal {
                non_constant,
            }),
        });
    }

    let selection = select_columns(table, treatment, outcome, selector)?;
    debug!(
        columns = ?selection.columns,
        bound = selection.bound,
        ranked = selection.ranked,
        "selected columns for structure learning"
    );
    let subset = table.select(&selection.columns)?;

    let learned = learner
        .learn(&subset)
        .and_then(|raw| check_endpoints(&raw, &selection.columns).map(|()| raw));
    let structure = match learned {
        Ok(raw) => LearnedStructure::Learned(classify(&raw)),
        Err(error) => {
            warn!(
                algorithm = learner.algorithm(),
                %error,
                "structure learning failed; falling back to minimal graph"
            );
            LearnedStructure::Fallback(FallbackReason::LearningFailed { error })
        }
    };
    Ok(Discovery {
        selection: Some(selection),
        structure,
    })
}

use causa_est::EffectSize;
use causa_graph::{Edge, FallbackReason};
use serde::Serialize;

/// Graph section of the result bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnedGraph {
    /// Every input column, in table order.
    pub nodes: Vec<String>,
    /// Arcs plus one representative edge per undirected pair.
    pub edges: Vec<Edge>,
    /// Arcs that entered the adjustment model.
    pub edges_directed: Vec<Edge>,
    /// DOT rendering of the adjustment model.
    pub dot: String,
    /// Structure learning algorithm label.
    pub algorithm: String,
    /// Significance level used by the independence tests.
    pub alpha: f64,
    /// Why the minimal treatment -> outcome graph was used, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
}

/// Everything one pipeline run reports.
///
/// Failures after input validation surface as strings or `null` fields here
/// rather than as errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultBundle {
    /// Input column names.
    pub columns: Vec<String>,
    /// Learned structure and the adjustment graph derived from it.
    pub learned_graph: LearnedGraph,
    /// Human readable estimand.
    pub estimand: String,
    /// Effect value, `null` when every estimator failed.
    pub estimate_value: Option<f64>,
    /// Estimate rendering, or `Estimation failed: ...`.
    pub estimate: Option<String>,
    /// Refutation rendering, `Refutation failed: ...`, or `null` when skipped.
    pub refutation: Option<String>,
    /// Effect-size heuristics or the reason they are missing.
    pub effect_size: EffectSize,
}

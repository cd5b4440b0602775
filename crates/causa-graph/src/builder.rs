use causa_core::errors::CausalError;
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::EdgeSets;
use crate::dag::AdjustmentModel;
use crate::edge::Edge;

/// Why the minimal treatment -> outcome graph replaced the learned structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    /// Fewer than two non-constant columns were available for learning.
    InsufficientSignal {
        /// Number of non-constant columns found.
        non_constant: usize,
    },
    /// The structure learner reported a failure.
    LearningFailed {
        /// Failure reported by the learner.
        error: CausalError,
    },
}

/// Outcome of the discovery stage as seen by the model builder.
#[derive(Debug, Clone, PartialEq)]
pub enum LearnedStructure {
    /// Structure learning produced classified edges.
    Learned(EdgeSets),
    /// Structure learning was skipped or failed.
    Fallback(FallbackReason),
}

/// Adjustment DAG together with the edge lists reported to the caller.
#[derive(Debug, Clone)]
pub struct BuiltModel {
    /// DAG over every table column.
    pub model: AdjustmentModel,
    /// Arcs used to build the DAG.
    pub directed: Vec<Edge>,
    /// Arcs plus one representative per undirected pair.
    pub visualization: Vec<Edge>,
    /// Set when the minimal graph was forced.
    pub fallback: Option<FallbackReason>,
    /// Learned arcs the DAG rejected: cycles, self loops or unknown nodes.
    pub skipped: Vec<Edge>,
}

/// Builds the adjustment DAG over `columns` from the learned structure.
///
/// Only strictly-directed arcs enter the DAG; undirected pairs survive only in
/// the visualisation list. Nodes outside the learned subset are still present
/// so identification can see them. When `structure` is a fallback the graph is
/// exactly `treatment -> outcome`.
pub fn build_model<S: AsRef<str>>(
    structure: &LearnedStructure,
    columns: &[S],
    treatment: &str,
    outcome: &str,
) -> Result<BuiltModel, CausalError> {
    let mut model = AdjustmentModel::new(columns)?;
    match structure {
        LearnedStructure::Learned(sets) => {
            let mut directed = Vec::with_capacity(sets.directed.len());
            let mut skipped = Vec::new();
            for edge in &sets.directed {
                match model.add_arc(&edge.source, &edge.target) {
                    Ok(()) => directed.push(edge.clone()),
                    Err(err) => {
                        warn!(
                            source = %edge.source,
                            target = %edge.target,
                            code = err.code(),
                            "dropping learned arc rejected by the adjustment model"
                        );
                        skipped.push(edge.clone());
                    }
                }
            }
            let visualization = sets
                .visualization
                .iter()
                .filter(|edge| !skipped.contains(edge))
                .cloned()
                .collect();
            debug!(arcs = directed.len(), undirected = sets.undirected.len(), "built adjustment model");
            Ok(BuiltModel {
                model,
                directed,
                visualization,
                fallback: None,
                skipped,
            })
        }
        LearnedStructure::Fallback(reason) => {
            model.add_arc(treatment, outcome)?;
            let edge = Edge::new(treatment, outcome);
            debug!(?reason, "forced minimal treatment -> outcome model");
            Ok(BuiltModel {
                model,
                directed: vec![edge.clone()],
                visualization: vec![edge],
                fallback: Some(reason.clone()),
                skipped: Vec::new(),
            })
        }
    }
}

#![deny(missing_docs)]

//! Edge classification and adjustment-graph construction for the causa pipeline.
//!
//! Structure learning reports ordered adjacency pairs. [`classify`] separates
//! pairs that are safe to treat as causal arcs from pairs reported in both
//! directions, and [`build_model`] turns the safe arcs into an
//! [`AdjustmentModel`] spanning every column of the input table.

mod builder;
mod classify;
mod dag;
mod dot;
mod edge;

pub use builder::{build_model, BuiltModel, FallbackReason, LearnedStructure};
pub use classify::{classify, EdgeSets};
pub use dag::AdjustmentModel;
pub use dot::render_dot;
pub use edge::{Edge, RawAdjacency, UndirectedPair};

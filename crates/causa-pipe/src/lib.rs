#![deny(missing_docs)]

//! Causal discovery and effect estimation over an in-memory numeric table.
//!
//! [`run`] drives one pass through column selection, PC structure learning,
//! edge classification, adjustment-model construction, backdoor
//! identification, the estimator cascade, the random common cause refuter and
//! the effect-size summariser. Only [`causa_core::CausalError::Input`] escapes;
//! every later failure is folded into the returned [`ResultBundle`].

mod bundle;
/// Pipeline options and their loaders.
pub mod config;
mod run;

pub use bundle::{LearnedGraph, ResultBundle};
pub use config::PipelineOpts;
pub use run::{run, run_with_learner};

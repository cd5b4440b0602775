#![deny(missing_docs)]
#![doc = "Sample-size aware column selection and PC structure learning for the causa pipeline."]

mod adapter;
/// Conditional independence tests.
pub mod citest;
/// PC search over an independence test.
pub mod pc;
mod select;

pub use adapter::{discover, Discovery, PcLearner, StructureLearner, DEFAULT_ALPHA};
pub use citest::{FisherZ, IndependenceTest};
pub use pc::pc_search;
pub use select::{non_constant_columns, select_columns, Selection, SelectorOpts};

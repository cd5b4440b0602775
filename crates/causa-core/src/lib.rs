#![deny(missing_docs)]
#![doc = "Core table, statistics, error and randomness types shared by the causa pipeline crates."]

pub mod errors;
pub mod rng;
/// Canonical JSON and YAML helpers.
pub mod serde;
pub mod stats;
mod table;

pub use errors::{CausalError, ErrorInfo};
pub use rng::{derive_substream_seed, RngHandle};
pub use table::{Column, Table};

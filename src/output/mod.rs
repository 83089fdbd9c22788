//! Output module
//!
//! Handles appending harvested cases to the shared corpus file.

mod corpus;

pub use corpus::CorpusWriter;

//! Core redistribution pipeline.
//!
//! Raw rows flow through normalization, duplicate merging, per-group
//! redistribution, the totals pass, and output composition.

pub mod composer;
pub mod merger;
pub mod normalizer;
pub mod pipeline;
pub mod redistributor;
pub mod totals;

pub use merger::merge_duplicates;
pub use normalizer::normalize_rows;
pub use redistributor::redistribute_group;

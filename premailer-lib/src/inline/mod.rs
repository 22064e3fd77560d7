//! The inlining pipeline: classify, rank, match, merge, emit leftovers.

pub mod classifier;
pub mod element_matcher;
pub mod leftover;
pub mod merger;
pub mod specificity;

//! Similarity scoring of test profiles against a reference library.

pub mod cosine;

pub use cosine::{cosine_similarity, score, BestMatch, SimilarityResult};

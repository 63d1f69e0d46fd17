//! Purity classification from similarity and adulterant screening.

pub mod purity;

pub use purity::{classify, PurityClassifier, PurityLabel, DEFAULT_SIMILARITY_THRESHOLD};

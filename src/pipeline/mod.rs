//! Pipeline composition and execution for purity screening.

mod runner;

pub use runner::{screen_samples, Pipeline, PipelineConfig, RowErrorPolicy};

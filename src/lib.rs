//! Essential-Oil Purity Screening Library
//!
//! This library screens compound-abundance profiles (e.g. GC-MS peak areas)
//! of essential-oil samples against a library of pure references and a
//! library of known adulterants.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (ProfileTable, verdicts, reports)
//! - **normalize**: Total-sum normalization of profiles
//! - **similarity**: Cosine similarity against the reference library
//! - **detect**: Element-wise adulterant screening
//! - **classify**: Two-valued purity verdicts
//! - **project**: PCA projection for visualization
//! - **plot**: Visualization sinks (SVG scatter, coordinate tables)
//! - **pipeline**: Pipeline composition and execution
//!
//! # Example
//!
//! ```no_run
//! use oil_purity::prelude::*;
//!
//! // Load data
//! let options = CsvOptions::default();
//! let test = ProfileTable::from_csv("samples.csv", &options).unwrap();
//! let reference = ProfileTable::from_csv("pure.csv", &options).unwrap();
//! let adulterants = ProfileTable::from_csv("adulterants.csv", &options).unwrap();
//!
//! // Screen samples
//! let report = Pipeline::new()
//!     .similarity_threshold(0.9)
//!     .run(&test, &reference, &adulterants)
//!     .unwrap();
//!
//! for verdict in report.iter() {
//!     println!("{}", verdict);
//! }
//! report.render(&ScatterPlot::new("pca.svg")).unwrap();
//! ```

pub mod classify;
pub mod data;
pub mod detect;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod plot;
pub mod project;
pub mod similarity;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::classify::{classify, PurityClassifier, PurityLabel, DEFAULT_SIMILARITY_THRESHOLD};
    pub use crate::data::{
        CsvOptions, PipelineReport, Profile, ProfileTable, ReportSummary, SampleVerdict, SkippedRow,
        REFERENCE_LABEL,
    };
    pub use crate::detect::{detect, detect_with_rule, AdulterantFinding, DetectionRule};
    pub use crate::error::{PurityError, Result};
    pub use crate::normalize::{normalize, normalize_skipping, NormalizedProfileTable};
    pub use crate::pipeline::{screen_samples, Pipeline, PipelineConfig, RowErrorPolicy};
    pub use crate::plot::{CoordinatesCsv, ScatterPlot, VisualizationSink};
    pub use crate::project::{pca, Projection};
    pub use crate::similarity::{cosine_similarity, score, BestMatch, SimilarityResult};
}

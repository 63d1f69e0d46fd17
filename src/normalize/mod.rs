//! Normalization of compound-abundance profiles.
//!
//! - **TSS**: Total sum scaling, each profile rescaled to sum to 1

pub mod tss;

pub use tss::{normalize, normalize_skipping, DegenerateRow, NormalizedProfileTable};

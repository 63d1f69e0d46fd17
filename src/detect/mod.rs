//! Screening of test profiles against known adulterants.

pub mod adulterant;

pub use adulterant::{detect, detect_with_rule, is_present, AdulterantFinding, DetectionRule};

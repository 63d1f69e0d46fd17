//! Two-valued purity verdicts.

use crate::detect::AdulterantFinding;
use crate::error::{PurityError, Result};
use serde::{Deserialize, Serialize};

/// Minimum best-match similarity for a sample to be considered pure.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.9;

/// Purity verdict for a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurityLabel {
    /// Matches a pure reference and no adulterant was flagged.
    Pure,
    /// Too dissimilar from every reference, or an adulterant was flagged.
    Adulterated,
}

impl PurityLabel {
    /// Get the short name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pure => "pure",
            Self::Adulterated => "adulterated",
        }
    }

    /// Check if pure.
    pub fn is_pure(&self) -> bool {
        matches!(self, Self::Pure)
    }
}

impl std::fmt::Display for PurityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pure => write!(f, "High purity potential"),
            Self::Adulterated => write!(f, "Alert: product possibly adulterated"),
        }
    }
}

/// Decision rule combining a similarity threshold with adulterant findings.
///
/// | similarity >= threshold | findings empty | label       |
/// |-------------------------|----------------|-------------|
/// | yes                     | yes            | Pure        |
/// | yes                     | no             | Adulterated |
/// | no                      | any            | Adulterated |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurityClassifier {
    /// Minimum best-match similarity for a pure verdict.
    pub threshold: f64,
}

impl Default for PurityClassifier {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl PurityClassifier {
    /// Create a classifier with a custom threshold in [-1, 1].
    pub fn new(threshold: f64) -> Result<Self> {
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(PurityError::InvalidParameter(format!(
                "Similarity threshold must be in [-1, 1], got {}",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    /// Classify a sample from its best similarity and adulterant findings.
    pub fn classify(&self, best_similarity: f64, findings: &AdulterantFinding) -> PurityLabel {
        if best_similarity >= self.threshold && findings.is_empty() {
            PurityLabel::Pure
        } else {
            PurityLabel::Adulterated
        }
    }
}

/// Classify with the default threshold of 0.9.
pub fn classify(best_similarity: f64, findings: &AdulterantFinding) -> PurityLabel {
    PurityClassifier::default().classify(best_similarity, findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(ids: &[&str]) -> AdulterantFinding {
        AdulterantFinding {
            adulterant_ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(classify(0.9, &finding(&[])), PurityLabel::Pure);
        assert_eq!(classify(0.8999, &finding(&[])), PurityLabel::Adulterated);
    }

    #[test]
    fn test_finding_overrides_similarity() {
        assert_eq!(classify(0.95, &finding(&["ethanol"])), PurityLabel::Adulterated);
        assert_eq!(classify(1.0, &finding(&["a", "b"])), PurityLabel::Adulterated);
    }

    #[test]
    fn test_low_similarity_with_findings() {
        assert_eq!(classify(0.2, &finding(&["a"])), PurityLabel::Adulterated);
    }

    #[test]
    fn test_custom_threshold() {
        let classifier = PurityClassifier::new(0.99).unwrap();
        assert_eq!(classifier.classify(0.95, &finding(&[])), PurityLabel::Adulterated);
        assert_eq!(classifier.classify(0.995, &finding(&[])), PurityLabel::Pure);
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(PurityClassifier::new(1.5).is_err());
        assert!(PurityClassifier::new(-2.0).is_err());
        assert!(PurityClassifier::new(f64::NAN).is_err());
    }

    #[test]
    fn test_label_names() {
        assert_eq!(PurityLabel::Pure.name(), "pure");
        assert_eq!(PurityLabel::Adulterated.name(), "adulterated");
        assert!(PurityLabel::Pure.is_pure());
        assert!(PurityLabel::Adulterated.to_string().contains("adulterated"));
    }
}

//! Adulterant presence screening.
//!
//! An adulterant profile is flagged when the test profile reaches the
//! adulterant's relative abundance in at least one tracked compound. This is
//! a coarse, high-sensitivity screen: a single compound is enough.

use crate::data::{ensure_same_schema, Profile};
use crate::error::Result;
use crate::normalize::NormalizedProfileTable;
use serde::{Deserialize, Serialize};

/// Element-wise comparison used to decide presence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionRule {
    /// Flag when test >= adulterant in any compound.
    #[default]
    MeetsOrExceeds,
    /// Flag when test > adulterant in any compound.
    Exceeds,
}

impl DetectionRule {
    /// Compare one test value against one adulterant value.
    #[inline]
    pub fn triggers(&self, test: f64, adulterant: f64) -> bool {
        match self {
            DetectionRule::MeetsOrExceeds => test >= adulterant,
            DetectionRule::Exceeds => test > adulterant,
        }
    }
}

/// Adulterants judged present in one test profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdulterantFinding {
    /// Adulterant row ids, in adulterant-table order.
    pub adulterant_ids: Vec<String>,
}

impl AdulterantFinding {
    /// Number of adulterants detected.
    pub fn len(&self) -> usize {
        self.adulterant_ids.len()
    }

    /// True when no adulterant was detected.
    pub fn is_empty(&self) -> bool {
        self.adulterant_ids.is_empty()
    }

    /// Check whether a given adulterant was detected.
    pub fn contains(&self, id: &str) -> bool {
        self.adulterant_ids.iter().any(|a| a == id)
    }

    /// Comma-joined ids for display.
    pub fn joined(&self) -> String {
        self.adulterant_ids.join(", ")
    }
}

/// Whether any compound of `test` triggers `rule` against `adulterant`.
///
/// Both slices must have the same length; extra elements of the longer
/// slice are ignored.
pub fn is_present(test: &[f64], adulterant: &[f64], rule: DetectionRule) -> bool {
    test.iter()
        .zip(adulterant)
        .any(|(&t, &a)| rule.triggers(t, a))
}

/// Screen a test profile with the default rule ([`DetectionRule::MeetsOrExceeds`]).
pub fn detect(test: &Profile<'_>, adulterants: &NormalizedProfileTable) -> Result<AdulterantFinding> {
    detect_with_rule(test, adulterants, DetectionRule::default())
}

/// Screen a test profile against every adulterant profile.
///
/// # Errors
/// [`crate::error::PurityError::SchemaMismatch`] unless the test profile has
/// exactly the adulterant table's compounds in the same order.
pub fn detect_with_rule(
    test: &Profile<'_>,
    adulterants: &NormalizedProfileTable,
    rule: DetectionRule,
) -> Result<AdulterantFinding> {
    ensure_same_schema(
        adulterants.compound_ids(),
        test.compound_ids,
        &format!("profile '{}' vs adulterant table", test.id),
    )?;

    let adulterant_ids = adulterants
        .profiles()
        .filter(|a| is_present(test.values, a.values, rule))
        .map(|a| a.id.to_string())
        .collect();

    Ok(AdulterantFinding { adulterant_ids })
}

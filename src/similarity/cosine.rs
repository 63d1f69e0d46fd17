//! Cosine similarity between compound profiles.
//!
//! cos(θ) = (a·b) / (‖a‖ × ‖b‖). On total-sum normalized profiles this
//! compares compositional shape: 1 means the same relative composition,
//! 0 means no compound in common.

use crate::data::{ensure_same_schema, Profile};
use crate::error::{PurityError, Result};
use crate::normalize::NormalizedProfileTable;
use serde::{Deserialize, Serialize};

/// Similarity of one test profile to every reference profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Test profile identifier.
    pub profile_id: String,
    /// (reference row id, similarity) pairs in reference-table order.
    pub scores: Vec<(String, f64)>,
}

/// The highest-scoring reference for a test profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestMatch {
    /// Reference row id.
    pub reference_id: String,
    /// Position of the reference in the scored table.
    pub index: usize,
    /// Cosine similarity.
    pub similarity: f64,
}

impl SimilarityResult {
    /// Number of scored references.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Similarity values in reference order.
    pub fn values(&self) -> Vec<f64> {
        self.scores.iter().map(|(_, s)| *s).collect()
    }

    /// The maximum similarity. Ties keep the first reference seen.
    pub fn best(&self) -> Option<BestMatch> {
        let mut best: Option<BestMatch> = None;
        for (index, (reference_id, similarity)) in self.scores.iter().enumerate() {
            let better = match &best {
                Some(b) => *similarity > b.similarity,
                None => true,
            };
            if better {
                best = Some(BestMatch {
                    reference_id: reference_id.clone(),
                    index,
                    similarity: *similarity,
                });
            }
        }
        best
    }
}

/// Cosine similarity of two equal-length vectors.
///
/// The result is clamped to [-1, 1] to absorb rounding.
///
/// # Errors
/// [`PurityError::SchemaMismatch`] if the lengths differ,
/// [`PurityError::ZeroNorm`] if either vector has zero (or non-finite) norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    labeled_cosine(a, "left operand", b, "right operand")
}

/// Cosine similarity; `ZeroNorm` errors carry the label of the offending vector.
fn labeled_cosine(a: &[f64], a_label: &str, b: &[f64], b_label: &str) -> Result<f64> {
    if a.len() != b.len() {
        return Err(PurityError::SchemaMismatch(format!(
            "cannot compare vectors of length {} and {}",
            a.len(),
            b.len()
        )));
    }

    // Scale by the largest magnitude so squared norms cannot overflow or underflow.
    let scale_a = max_abs(a);
    let scale_b = max_abs(b);

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let x = x / scale_a;
        let y = y / scale_b;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if scale_a == 0.0 || !norm_a.is_finite() {
        return Err(PurityError::ZeroNorm(a_label.to_string()));
    }
    if scale_b == 0.0 || !norm_b.is_finite() {
        return Err(PurityError::ZeroNorm(b_label.to_string()));
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0_f64, |m, x| m.max(x.abs()))
}

/// Score a test profile against every row of a reference table.
///
/// # Errors
/// [`PurityError::SchemaMismatch`] unless the test profile has exactly the
/// reference compounds in the same order; [`PurityError::ZeroNorm`] naming
/// the profile whose norm is zero.
pub fn score(test: &Profile<'_>, reference: &NormalizedProfileTable) -> Result<SimilarityResult> {
    ensure_same_schema(
        reference.compound_ids(),
        test.compound_ids,
        &format!("profile '{}' vs reference table", test.id),
    )?;

    let scores = reference
        .profiles()
        .map(|r| {
            labeled_cosine(test.values, test.id, r.values, r.id).map(|s| (r.id.to_string(), s))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SimilarityResult {
        profile_id: test.id.to_string(),
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ProfileTable;
    use crate::normalize::normalize;
    use approx::assert_relative_eq;

    fn compounds(n: usize) -> Vec<String> {
        ["A", "B", "C", "D"][..n].iter().map(|s| s.to_string()).collect()
    }

    fn normalized(rows: Vec<Vec<f64>>) -> NormalizedProfileTable {
        let n = rows[0].len();
        normalize(&ProfileTable::from_rows("reference", compounds(n), rows).unwrap()).unwrap()
    }

    #[test]
    fn test_identical_vectors_score_one() {
        let a = [0.2, 0.3, 0.5];
        assert_relative_eq!(cosine_similarity(&a, &a).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_orthogonal_vectors_score_zero() {
        assert_relative_eq!(
            cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_opposite_vectors_score_minus_one() {
        assert_relative_eq!(
            cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap(),
            -1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_scale_invariant() {
        let a = [1.0, 2.0, 3.0];
        let b = [10.0, 20.0, 30.0];
        assert_relative_eq!(cosine_similarity(&a, &b).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(PurityError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_zero_norm() {
        assert!(matches!(
            cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]),
            Err(PurityError::ZeroNorm(_))
        ));
        assert!(matches!(
            cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]),
            Err(PurityError::ZeroNorm(_))
        ));
    }

    #[test]
    fn test_extreme_magnitudes() {
        let huge = [1e200, 1e200];
        assert_relative_eq!(cosine_similarity(&huge, &huge).unwrap(), 1.0, epsilon = 1e-12);

        let tiny = [1e-200, 3e-200];
        assert_relative_eq!(cosine_similarity(&tiny, &[1.0, 3.0]).unwrap(), 1.0, epsilon = 1e-12);

        assert!(matches!(
            cosine_similarity(&[f64::INFINITY, 1.0], &[1.0, 1.0]),
            Err(PurityError::ZeroNorm(_))
        ));
    }

    #[test]
    fn test_score_order_and_best() {
        let reference = normalized(vec![
            vec![10.0, 90.0],
            vec![50.0, 50.0],
            vec![90.0, 10.0],
        ]);
        let samples = normalized(vec![vec![45.0, 55.0]]);
        let result = score(&samples.profile(0), &reference).unwrap();

        assert_eq!(result.len(), 3);
        let ids: Vec<_> = result.scores.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);

        let best = result.best().unwrap();
        assert_eq!(best.reference_id, "1");
        assert_relative_eq!(best.similarity, 0.995_037, epsilon = 1e-6);
    }

    #[test]
    fn test_best_keeps_first_on_tie() {
        let reference = normalized(vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![1.0, 0.0]]);
        let samples = normalized(vec![vec![3.0, 3.0]]);
        let best = score(&samples.profile(0), &reference).unwrap().best().unwrap();
        assert_eq!(best.index, 0);
        assert_eq!(best.reference_id, "0");
    }

    #[test]
    fn test_best_of_empty_is_none() {
        let result = SimilarityResult {
            profile_id: "x".into(),
            scores: vec![],
        };
        assert!(result.best().is_none());
    }

    #[test]
    fn test_score_schema_mismatch() {
        let reference = normalized(vec![vec![1.0, 1.0, 1.0, 1.0]]);
        let samples = normalized(vec![vec![1.0, 2.0, 3.0]]);
        assert!(matches!(
            score(&samples.profile(0), &reference),
            Err(PurityError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_score_zero_norm_names_profile() {
        let reference = normalized(vec![vec![1.0, 1.0]]);
        let raw = ProfileTable::new(
            "samples",
            compounds(2),
            vec!["blank".into()],
            vec![vec![0.0, 0.0]],
        )
        .unwrap();
        match score(&raw.profile(0), &reference) {
            Err(PurityError::ZeroNorm(id)) => assert_eq!(id, "blank"),
            other => panic!("expected ZeroNorm, got {other:?}"),
        }
    }
}

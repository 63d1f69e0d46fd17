//! Total Sum Scaling (TSS) normalization for compound profiles.
//!
//! TSS converts raw abundances to relative abundances by dividing each value
//! by the total abundance of its profile. Every normalized row sums to 1, so
//! later comparisons see the compositional shape of a profile rather than its
//! concentration.

use crate::data::{Profile, ProfileTable};
use crate::error::{PurityError, Result};
use serde::{Deserialize, Serialize};

/// A profile table whose rows each sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProfileTable {
    /// The normalized data.
    table: ProfileTable,
    /// Row totals before normalization.
    row_sums: Vec<f64>,
}

impl NormalizedProfileTable {
    /// Get reference to the underlying table.
    pub fn table(&self) -> &ProfileTable {
        &self.table
    }

    /// Consume and return the underlying table.
    pub fn into_table(self) -> ProfileTable {
        self.table
    }

    /// Row totals before normalization.
    pub fn row_sums(&self) -> &[f64] {
        &self.row_sums
    }

    /// Number of profiles.
    pub fn n_rows(&self) -> usize {
        self.table.n_rows()
    }

    /// Number of compounds.
    pub fn n_compounds(&self) -> usize {
        self.table.n_compounds()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Compound identifiers.
    pub fn compound_ids(&self) -> &[String] {
        self.table.compound_ids()
    }

    /// Row identifiers.
    pub fn row_ids(&self) -> &[String] {
        self.table.row_ids()
    }

    /// View one row as a profile.
    pub fn profile(&self, row: usize) -> Profile<'_> {
        self.table.profile(row)
    }

    /// Iterate over all rows as profiles.
    pub fn profiles(&self) -> impl Iterator<Item = Profile<'_>> + '_ {
        self.table.profiles()
    }

    /// Keep only the rows at the given indices.
    pub fn subset_rows(&self, indices: &[usize]) -> Result<Self> {
        let table = self.table.subset_rows(indices)?;
        let row_sums = indices.iter().map(|&i| self.row_sums[i]).collect();
        Ok(Self { table, row_sums })
    }

    /// Prefix every row id with `prefix:`.
    pub fn with_row_id_prefix(self, prefix: &str) -> Self {
        Self {
            table: self.table.with_row_id_prefix(prefix),
            row_sums: self.row_sums,
        }
    }

    /// Stack two normalized tables. Schemas must match.
    pub fn concat(&self, other: &NormalizedProfileTable, name: &str) -> Result<Self> {
        let table = self.table.concat(&other.table, name)?;
        let mut row_sums = self.row_sums.clone();
        row_sums.extend_from_slice(&other.row_sums);
        Ok(Self { table, row_sums })
    }
}

/// A row excluded from normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegenerateRow {
    /// Row identifier.
    pub row_id: String,
    /// 0-based source position.
    pub position: usize,
    /// The offending total (zero or non-finite).
    pub sum: f64,
}

fn is_degenerate(sum: f64) -> bool {
    sum == 0.0 || !sum.is_finite()
}

fn scale_rows(table: &ProfileTable, keep: &[usize], sums: &[f64]) -> NormalizedProfileTable {
    let n_compounds = table.n_compounds();
    let mut values = Vec::with_capacity(keep.len() * n_compounds);
    let mut row_ids = Vec::with_capacity(keep.len());
    let mut positions = Vec::with_capacity(keep.len());
    let mut row_sums = Vec::with_capacity(keep.len());

    for &i in keep {
        let total = sums[i];
        values.extend(table.row(i).iter().map(|&v| v / total));
        row_ids.push(table.row_ids()[i].clone());
        positions.push(table.positions()[i]);
        row_sums.push(total);
    }

    NormalizedProfileTable {
        table: ProfileTable::from_parts(
            table.name().to_string(),
            table.compound_ids().to_vec(),
            row_ids,
            positions,
            values,
        ),
        row_sums,
    }
}

/// Apply Total Sum Scaling to every row of a table.
///
/// # Formula
/// For row i: TSS(x_ij) = x_ij / sum_j(x_ij)
///
/// # Errors
/// Returns [`PurityError::DegenerateRow`] for the first row whose total is
/// zero or non-finite, and [`PurityError::EmptyData`] for a table without
/// compound columns. A table with no rows normalizes to an empty table.
///
/// # Example
/// ```ignore
/// let normalized = normalize(&table)?;
/// assert!((normalized.table().row(0).iter().sum::<f64>() - 1.0).abs() < 1e-12);
/// ```
pub fn normalize(table: &ProfileTable) -> Result<NormalizedProfileTable> {
    if table.n_compounds() == 0 {
        return Err(PurityError::EmptyData(format!(
            "Cannot normalize table '{}' without compounds",
            table.name()
        )));
    }

    let sums = table.row_sums();
    if let Some(i) = sums.iter().position(|&s| is_degenerate(s)) {
        return Err(PurityError::DegenerateRow {
            table: table.name().to_string(),
            row_id: table.row_ids()[i].clone(),
            sum: sums[i],
        });
    }

    let keep: Vec<usize> = (0..table.n_rows()).collect();
    Ok(scale_rows(table, &keep, &sums))
}

/// Apply Total Sum Scaling, excluding rows that cannot be normalized.
///
/// Returns the normalized table (possibly empty) and the excluded rows in
/// table order.
pub fn normalize_skipping(table: &ProfileTable) -> (NormalizedProfileTable, Vec<DegenerateRow>) {
    let sums = table.row_sums();
    let mut keep = Vec::with_capacity(table.n_rows());
    let mut skipped = Vec::new();

    for (i, &sum) in sums.iter().enumerate() {
        if is_degenerate(sum) {
            log::warn!(
                "excluding row '{}' of '{}': total abundance {}",
                table.row_ids()[i],
                table.name(),
                sum
            );
            skipped.push(DegenerateRow {
                row_id: table.row_ids()[i].clone(),
                position: table.positions()[i],
                sum,
            });
        } else {
            keep.push(i);
        }
    }

    (scale_rows(table, &keep, &sums), skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_table() -> ProfileTable {
        // 4 profiles with the same 50/30/20 composition at different scales
        ProfileTable::from_rows(
            "reference",
            vec!["A".into(), "B".into(), "C".into()],
            vec![
                vec![50.0, 30.0, 20.0],
                vec![100.0, 60.0, 40.0],
                vec![25.0, 15.0, 10.0],
                vec![500.0, 300.0, 200.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_tss_proportions() {
        let normalized = normalize(&create_test_table()).unwrap();

        assert_eq!(normalized.n_rows(), 4);
        assert_eq!(normalized.n_compounds(), 3);
        for i in 0..4 {
            let row = normalized.table().row(i);
            assert_relative_eq!(row[0], 0.50, epsilon = 1e-12);
            assert_relative_eq!(row[1], 0.30, epsilon = 1e-12);
            assert_relative_eq!(row[2], 0.20, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tss_row_sums() {
        let normalized = normalize(&create_test_table()).unwrap();
        for i in 0..normalized.n_rows() {
            let sum: f64 = normalized.table().row(i).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
        assert_eq!(normalized.row_sums(), &[100.0, 200.0, 50.0, 1000.0]);
    }

    #[test]
    fn test_tss_idempotent() {
        let once = normalize(&create_test_table()).unwrap();
        let twice = normalize(once.table()).unwrap();
        for i in 0..once.n_rows() {
            for (a, b) in once.table().row(i).iter().zip(twice.table().row(i)) {
                assert_relative_eq!(*a, *b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_tss_preserves_ids() {
        let table = ProfileTable::new(
            "samples",
            vec!["A".into(), "B".into()],
            vec!["oil_a".into(), "oil_b".into()],
            vec![vec![1.0, 3.0], vec![2.0, 2.0]],
        )
        .unwrap();
        let normalized = normalize(&table).unwrap();
        assert_eq!(normalized.row_ids(), &["oil_a", "oil_b"]);
        assert_eq!(normalized.table().name(), "samples");
    }

    #[test]
    fn test_tss_zero_row() {
        let table = ProfileTable::from_rows(
            "samples",
            vec!["A".into(), "B".into()],
            vec![vec![10.0, 10.0], vec![0.0, 0.0]],
        )
        .unwrap();

        match normalize(&table) {
            Err(PurityError::DegenerateRow { table, row_id, sum }) => {
                assert_eq!(table, "samples");
                assert_eq!(row_id, "1");
                assert_eq!(sum, 0.0);
            }
            other => panic!("expected DegenerateRow, got {other:?}"),
        }
    }

    #[test]
    fn test_tss_skipping() {
        let table = ProfileTable::from_rows(
            "samples",
            vec!["A".into(), "B".into()],
            vec![vec![0.0, 0.0], vec![1.0, 3.0], vec![0.0, 0.0]],
        )
        .unwrap();

        let (normalized, skipped) = normalize_skipping(&table);
        assert_eq!(normalized.n_rows(), 1);
        assert_eq!(normalized.row_ids(), &["1"]);
        assert_eq!(normalized.table().positions(), &[1]);
        assert_relative_eq!(normalized.table().get(0, 1), 0.75, epsilon = 1e-12);

        let skipped_ids: Vec<_> = skipped.iter().map(|s| s.row_id.as_str()).collect();
        assert_eq!(skipped_ids, vec!["0", "2"]);
        assert_eq!(skipped[1].position, 2);
    }

    #[test]
    fn test_tss_empty_table_normalizes_to_empty() {
        let table = ProfileTable::from_rows("adulterants", vec!["A".into(), "B".into()], vec![])
            .unwrap();
        let normalized = normalize(&table).unwrap();
        assert!(normalized.is_empty());
        assert_eq!(normalized.compound_ids(), &["A", "B"]);

        let (skipped_normalized, skipped) = normalize_skipping(&table);
        assert_eq!(normalized, skipped_normalized);
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_tss_concat() {
        let a = normalize(&create_test_table()).unwrap();
        let pooled = a.concat(&a, "pooled").unwrap();
        assert_eq!(pooled.n_rows(), 8);
        assert_eq!(pooled.row_sums().len(), 8);
        assert_eq!(pooled.table().name(), "pooled");
    }
}

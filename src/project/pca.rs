//! Principal Component Analysis (PCA) of profile tables.
//!
//! # Algorithm
//!
//! 1. Center every compound column on its mean
//! 2. Thin SVD of the centered matrix X = U Σ Vᵀ
//! 3. Order components by descending singular value
//! 4. Scores: T\[i,c\] = U\[i,c\] × σ\[c\]
//!
//! Component signs are fixed so that the largest-magnitude entry of each
//! column of U is positive, which keeps plots stable across runs.

use crate::data::ProfileTable;
use crate::error::{PurityError, Result};
use serde::{Deserialize, Serialize};

/// PCA scores for every row of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Row ids, aligned with `coordinates`.
    pub row_ids: Vec<String>,
    /// Scores \[n_rows\]\[n_components\].
    pub coordinates: Vec<Vec<f64>>,
    /// Fraction of total variance captured by each component.
    pub explained_variance_ratio: Vec<f64>,
}

impl Projection {
    /// Number of projected rows.
    pub fn n_rows(&self) -> usize {
        self.coordinates.len()
    }

    /// Number of components.
    pub fn n_components(&self) -> usize {
        self.explained_variance_ratio.len()
    }

    /// Scores of one component across all rows.
    pub fn component(&self, c: usize) -> Vec<f64> {
        self.coordinates.iter().map(|row| row[c]).collect()
    }
}

/// Project a table onto its leading principal components.
///
/// When the data has fewer informative dimensions than requested
/// (e.g. a single compound), the missing components are zero.
///
/// # Errors
/// [`PurityError::Visualization`] with fewer than 2 rows,
/// [`PurityError::InvalidParameter`] when `n_components` is 0.
pub fn pca(table: &ProfileTable, n_components: usize) -> Result<Projection> {
    if n_components == 0 {
        return Err(PurityError::InvalidParameter(
            "PCA needs at least one component".to_string(),
        ));
    }
    let n = table.n_rows();
    let p = table.n_compounds();
    if n < 2 {
        return Err(PurityError::Visualization(format!(
            "PCA requires at least 2 profiles, got {}",
            n
        )));
    }

    let mut x = table.to_matrix();
    for j in 0..p {
        let mean = x.column(j).mean();
        for i in 0..n {
            x[(i, j)] -= mean;
        }
    }

    let svd = x.svd(true, false);
    let u = svd
        .u
        .ok_or_else(|| PurityError::Visualization("SVD did not produce U".to_string()))?;
    let sigma = svd.singular_values;
    let rank = sigma.len();

    let mut order: Vec<usize> = (0..rank).collect();
    order.sort_by(|&a, &b| {
        sigma[b]
            .partial_cmp(&sigma[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let total_variance: f64 = sigma.iter().map(|s| s * s).sum();
    let mut coordinates = vec![vec![0.0; n_components]; n];
    let mut explained_variance_ratio = vec![0.0; n_components];

    for (c, &k) in order.iter().take(n_components).enumerate() {
        let column = u.column(k);
        let pivot = column
            .iter()
            .copied()
            .fold(0.0_f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
        let sign = if pivot < 0.0 { -1.0 } else { 1.0 };

        for i in 0..n {
            coordinates[i][c] = sign * column[i] * sigma[k];
        }
        if total_variance > 0.0 {
            explained_variance_ratio[c] = sigma[k] * sigma[k] / total_variance;
        }
    }

    log::debug!(
        "PCA of '{}': {} rows x {} compounds, explained variance {:?}",
        table.name(),
        n,
        p,
        explained_variance_ratio
    );

    Ok(Projection {
        row_ids: table.row_ids().to_vec(),
        coordinates,
        explained_variance_ratio,
    })
}

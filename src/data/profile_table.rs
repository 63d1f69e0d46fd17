//! Compound-abundance tables for GC-MS profiles.

use crate::error::{PurityError, Result};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Options controlling delimited-file ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// Field delimiter (`b','` for CSV, `b'\t'` for TSV).
    pub delimiter: u8,
    /// Column holding row identifiers. When absent, rows are identified by
    /// their 0-based position in the file.
    pub id_column: Option<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            id_column: None,
        }
    }
}

impl CsvOptions {
    /// Options for tab-separated files.
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::default()
        }
    }

    /// Pick the delimiter from the file extension (`.tsv`/`.tab` → tab).
    pub fn for_path<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase());
        match ext.as_deref() {
            Some("tsv") | Some("tab") => Self::tsv(),
            _ => Self::default(),
        }
    }

    /// Read row identifiers from the named column.
    pub fn with_id_column(mut self, column: &str) -> Self {
        self.id_column = Some(column.to_string());
        self
    }
}

/// A borrowed view of one row of a [`ProfileTable`].
#[derive(Debug, Clone, Copy)]
pub struct Profile<'a> {
    /// Row identifier.
    pub id: &'a str,
    /// 0-based position of the row in its source file.
    pub position: usize,
    /// Compound identifiers, in column order.
    pub compound_ids: &'a [String],
    /// Abundances, aligned with `compound_ids`.
    pub values: &'a [f64],
}

impl<'a> Profile<'a> {
    /// Number of compounds.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the profile has no compounds.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all abundances.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Abundance of a compound by name.
    pub fn value_of(&self, compound: &str) -> Option<f64> {
        self.compound_ids
            .iter()
            .position(|c| c == compound)
            .map(|i| self.values[i])
    }
}

/// Check that two column schemas are identical (same names, same order).
pub fn ensure_same_schema(expected: &[String], actual: &[String], context: &str) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(PurityError::SchemaMismatch(format!(
            "{}: expected {} compounds, got {}",
            context,
            expected.len(),
            actual.len()
        )));
    }
    if let Some(i) = expected.iter().zip(actual).position(|(a, b)| a != b) {
        return Err(PurityError::SchemaMismatch(format!(
            "{}: column {} is '{}', expected '{}'",
            context, i, actual[i], expected[i]
        )));
    }
    Ok(())
}

/// A dense table of compound abundances.
///
/// Rows are profiles (samples, references or adulterants), columns are
/// compounds. Values are stored row-major so that each profile is a
/// contiguous slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileTable {
    /// Table name, used to identify the table in errors.
    name: String,
    /// Compound identifiers (column names).
    compound_ids: Vec<String>,
    /// Row identifiers.
    row_ids: Vec<String>,
    /// 0-based source position of each row.
    positions: Vec<usize>,
    /// Row-major abundances (n_rows × n_compounds).
    values: Vec<f64>,
}

impl ProfileTable {
    /// Create a table from rows of values.
    ///
    /// Row positions are taken to be `0..rows.len()`. Every abundance must be
    /// finite and non-negative.
    pub fn new(
        name: &str,
        compound_ids: Vec<String>,
        row_ids: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if row_ids.len() != rows.len() {
            return Err(PurityError::InvalidParameter(format!(
                "{} row ids for {} rows",
                row_ids.len(),
                rows.len()
            )));
        }
        let n_compounds = compound_ids.len();
        let mut values = Vec::with_capacity(rows.len() * n_compounds);
        for (row_idx, (row_id, row)) in row_ids.iter().zip(&rows).enumerate() {
            if row.len() != n_compounds {
                return Err(PurityError::SchemaMismatch(format!(
                    "row '{}' of table '{}' has {} values for {} compounds",
                    row_id,
                    name,
                    row.len(),
                    n_compounds
                )));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite() || *v < 0.0) {
                return Err(PurityError::InvalidAbundance {
                    value: row[j].to_string(),
                    row: row_idx,
                    column: compound_ids[j].clone(),
                });
            }
            values.extend_from_slice(row);
        }
        let positions = (0..rows.len()).collect();
        Ok(Self {
            name: name.to_string(),
            compound_ids,
            row_ids,
            positions,
            values,
        })
    }

    /// Create a table whose row ids are the row indices ("0", "1", ...).
    pub fn from_rows(name: &str, compound_ids: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let row_ids = (0..rows.len()).map(|i| i.to_string()).collect();
        Self::new(name, compound_ids, row_ids, rows)
    }

    /// Assemble a table from already-validated parts.
    pub(crate) fn from_parts(
        name: String,
        compound_ids: Vec<String>,
        row_ids: Vec<String>,
        positions: Vec<usize>,
        values: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(row_ids.len(), positions.len());
        debug_assert_eq!(values.len(), row_ids.len() * compound_ids.len());
        Self {
            name,
            compound_ids,
            row_ids,
            positions,
            values,
        }
    }

    /// Load a table from a delimited file.
    ///
    /// The table is named after the file. Any failure (missing file,
    /// malformed row, invalid abundance) is reported as
    /// [`PurityError::Ingestion`] naming the path.
    pub fn from_csv<P: AsRef<Path>>(path: P, options: &CsvOptions) -> Result<Self> {
        let path = path.as_ref();
        let ingestion_error = |reason: String| PurityError::Ingestion {
            path: path.display().to_string(),
            reason,
        };
        let file = std::fs::File::open(path).map_err(|e| ingestion_error(e.to_string()))?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("table")
            .to_string();
        Self::from_reader(&name, file, options).map_err(|e| ingestion_error(e.to_string()))
    }

    /// Parse a table from any reader.
    ///
    /// Expected format:
    /// - First row: header naming the compounds (and the id column, if any)
    /// - Subsequent rows: one profile per row, finite non-negative abundances
    pub fn from_reader<R: Read>(name: &str, reader: R, options: &CsvOptions) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let header: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
        let id_col = match &options.id_column {
            Some(col) => Some(header.iter().position(|h| h == col).ok_or_else(|| {
                PurityError::EmptyData(format!("id column '{}' not found in header", col))
            })?),
            None => None,
        };
        let compound_cols: Vec<usize> = (0..header.len()).filter(|&i| Some(i) != id_col).collect();
        if compound_cols.is_empty() {
            return Err(PurityError::EmptyData(
                "table must have at least one compound column".to_string(),
            ));
        }
        let compound_ids: Vec<String> = compound_cols.iter().map(|&i| header[i].clone()).collect();

        let mut row_ids = Vec::new();
        let mut values = Vec::new();
        for (row_idx, record) in rdr.records().enumerate() {
            let record = record?;
            let row_id = match id_col {
                Some(i) => record.get(i).unwrap_or_default().to_string(),
                None => row_idx.to_string(),
            };
            for &col in &compound_cols {
                let raw = record.get(col).unwrap_or_default();
                let value: f64 = raw.parse().map_err(|_| PurityError::InvalidAbundance {
                    value: raw.to_string(),
                    row: row_idx,
                    column: header[col].clone(),
                })?;
                if !value.is_finite() || value < 0.0 {
                    return Err(PurityError::InvalidAbundance {
                        value: raw.to_string(),
                        row: row_idx,
                        column: header[col].clone(),
                    });
                }
                values.push(value);
            }
            row_ids.push(row_id);
        }

        if row_ids.is_empty() {
            return Err(PurityError::EmptyData("table has no rows".to_string()));
        }

        let positions = (0..row_ids.len()).collect();
        Ok(Self::from_parts(
            name.to_string(),
            compound_ids,
            row_ids,
            positions,
            values,
        ))
    }

    /// Write the table to a delimited file, ids in the first column.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P, delimiter: u8) -> Result<()> {
        let mut wtr = WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(path)?;

        let mut header = vec!["id".to_string()];
        header.extend(self.compound_ids.iter().cloned());
        wtr.write_record(&header)?;

        for i in 0..self.n_rows() {
            let mut record = vec![self.row_ids[i].clone()];
            record.extend(self.row(i).iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the table.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Number of profiles (rows).
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.row_ids.len()
    }

    /// Number of compounds (columns).
    #[inline]
    pub fn n_compounds(&self) -> usize {
        self.compound_ids.len()
    }

    /// Check if the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.row_ids.is_empty()
    }

    /// Compound identifiers.
    #[inline]
    pub fn compound_ids(&self) -> &[String] {
        &self.compound_ids
    }

    /// Row identifiers.
    #[inline]
    pub fn row_ids(&self) -> &[String] {
        &self.row_ids
    }

    /// Source positions of the rows.
    #[inline]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Abundances of one row.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let n = self.n_compounds();
        &self.values[row * n..(row + 1) * n]
    }

    /// Value at (row, compound).
    #[inline]
    pub fn get(&self, row: usize, compound: usize) -> f64 {
        self.values[row * self.n_compounds() + compound]
    }

    /// View one row as a [`Profile`].
    pub fn profile(&self, row: usize) -> Profile<'_> {
        Profile {
            id: &self.row_ids[row],
            position: self.positions[row],
            compound_ids: &self.compound_ids,
            values: self.row(row),
        }
    }

    /// Iterate over all rows as profiles.
    pub fn profiles(&self) -> impl Iterator<Item = Profile<'_>> + '_ {
        (0..self.n_rows()).map(move |i| self.profile(i))
    }

    /// Sum of each row.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.n_rows()).map(|i| self.row(i).iter().sum()).collect()
    }

    /// Fail unless `other` has exactly this table's compound columns.
    pub fn ensure_same_schema(&self, other: &ProfileTable) -> Result<()> {
        ensure_same_schema(
            &self.compound_ids,
            &other.compound_ids,
            &format!("table '{}' vs table '{}'", self.name, other.name),
        )
    }

    /// Prefix every row id with `prefix:`.
    pub fn with_row_id_prefix(mut self, prefix: &str) -> Self {
        for id in &mut self.row_ids {
            *id = format!("{}:{}", prefix, id);
        }
        self
    }

    /// Keep only the rows at the given indices (in the given order).
    pub fn subset_rows(&self, indices: &[usize]) -> Result<Self> {
        let mut row_ids = Vec::with_capacity(indices.len());
        let mut positions = Vec::with_capacity(indices.len());
        let mut values = Vec::with_capacity(indices.len() * self.n_compounds());
        for &i in indices {
            if i >= self.n_rows() {
                return Err(PurityError::InvalidParameter(format!(
                    "Row index {} out of bounds",
                    i
                )));
            }
            row_ids.push(self.row_ids[i].clone());
            positions.push(self.positions[i]);
            values.extend_from_slice(self.row(i));
        }
        Ok(Self::from_parts(
            self.name.clone(),
            self.compound_ids.clone(),
            row_ids,
            positions,
            values,
        ))
    }

    /// Stack `other` below this table. Schemas must match.
    pub fn concat(&self, other: &ProfileTable, name: &str) -> Result<Self> {
        self.ensure_same_schema(other)?;
        let mut row_ids = self.row_ids.clone();
        row_ids.extend(other.row_ids.iter().cloned());
        let mut positions = self.positions.clone();
        positions.extend(other.positions.iter().copied());
        let mut values = self.values.clone();
        values.extend_from_slice(&other.values);
        Ok(Self::from_parts(
            name.to_string(),
            self.compound_ids.clone(),
            row_ids,
            positions,
            values,
        ))
    }

    /// Convert to a dense matrix (rows × compounds).
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.n_rows(), self.n_compounds(), &self.values)
    }
}

//! PCA coordinates written as a delimited table.

use super::{check_labels, VisualizationSink};
use crate::data::ProfileTable;
use crate::error::{PurityError, Result};
use crate::project::{pca, Projection};
use csv::WriterBuilder;
use std::path::{Path, PathBuf};

/// Writes `row_id, label, PC1, PC2` for every pooled row.
///
/// Useful for plotting with external tools.
#[derive(Debug, Clone)]
pub struct CoordinatesCsv {
    /// Output file.
    pub output: PathBuf,
    /// Field delimiter.
    pub delimiter: u8,
}

impl CoordinatesCsv {
    /// Comma-separated output to `output`.
    pub fn new<P: AsRef<Path>>(output: P) -> Self {
        Self {
            output: output.as_ref().to_path_buf(),
            delimiter: b',',
        }
    }

    /// Use a different delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl VisualizationSink for CoordinatesCsv {
    fn render(&self, table: &ProfileTable, labels: &[String]) -> Result<()> {
        check_labels(table, labels)?;
        let projection = pca(table, 2)?;
        write_coordinates(self, &projection, labels)
            .map_err(|e| PurityError::Visualization(format!("{:?}: {}", self.output, e)))
    }
}

fn write_coordinates(
    sink: &CoordinatesCsv,
    projection: &Projection,
    labels: &[String],
) -> std::result::Result<(), csv::Error> {
    let mut wtr = WriterBuilder::new()
        .delimiter(sink.delimiter)
        .from_path(&sink.output)?;
    wtr.write_record(["row_id", "label", "PC1", "PC2"])?;
    for (i, coords) in projection.coordinates.iter().enumerate() {
        wtr.write_record([
            projection.row_ids[i].clone(),
            labels[i].clone(),
            format!("{:.6}", coords[0]),
            format!("{:.6}", coords[1]),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_writes_one_line_per_row() {
        let table = ProfileTable::from_rows(
            "pooled",
            vec!["A".into(), "B".into()],
            vec![vec![0.5, 0.5], vec![0.2, 0.8], vec![0.9, 0.1]],
        )
        .unwrap();
        let labels: Vec<String> = vec!["Reference".into(), "Pure".into(), "Adulterated".into()];
        let file = NamedTempFile::new().unwrap();

        CoordinatesCsv::new(file.path()).render(&table, &labels).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "row_id,label,PC1,PC2");
        assert!(lines[1].starts_with("0,Reference,"));
        assert!(lines[3].starts_with("2,Adulterated,"));
    }

    #[test]
    fn test_single_row_fails() {
        let table = ProfileTable::from_rows("pooled", vec!["A".into()], vec![vec![1.0]]).unwrap();
        let file = NamedTempFile::new().unwrap();
        let result = CoordinatesCsv::new(file.path()).render(&table, &["x".to_string()]);
        assert!(matches!(result, Err(PurityError::Visualization(_))));
    }

    #[test]
    fn test_unwritable_path_is_visualization_error() {
        let table = ProfileTable::from_rows(
            "pooled",
            vec!["A".into(), "B".into()],
            vec![vec![0.5, 0.5], vec![0.2, 0.8]],
        )
        .unwrap();
        let labels: Vec<String> = vec!["Reference".into(), "Pure".into()];
        let dir = tempfile::TempDir::new().unwrap();
        let result = CoordinatesCsv::new(dir.path().join("missing").join("pca.csv"))
            .render(&table, &labels);
        assert!(matches!(result, Err(PurityError::Visualization(_))));
    }
}

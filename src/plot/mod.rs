//! Visualization sinks for pooled profile tables.
//!
//! A sink receives the pooled normalized table and one label per row.
//! Rendering is a presentation step: a failing sink never changes the
//! computed report.

pub mod coordinates;
pub mod scatter;

pub use coordinates::CoordinatesCsv;
pub use scatter::{ScatterPlot, PCA_TITLE};

use crate::data::ProfileTable;
use crate::error::{PurityError, Result};

/// Destination for a labelled table.
pub trait VisualizationSink {
    /// Render `table`, grouping rows by `labels` (one per row).
    fn render(&self, table: &ProfileTable, labels: &[String]) -> Result<()>;
}

/// Fail unless there is exactly one label per row.
pub(crate) fn check_labels(table: &ProfileTable, labels: &[String]) -> Result<()> {
    if labels.len() != table.n_rows() {
        return Err(PurityError::Visualization(format!(
            "{} labels for {} rows",
            labels.len(),
            table.n_rows()
        )));
    }
    Ok(())
}

/// Distinct labels in order of first appearance.
pub(crate) fn label_groups(labels: &[String]) -> Vec<&str> {
    let mut groups: Vec<&str> = Vec::new();
    for label in labels {
        if !groups.contains(&label.as_str()) {
            groups.push(label);
        }
    }
    groups
}

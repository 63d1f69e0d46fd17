//! Result types for purity screening.

use crate::classify::PurityLabel;
use crate::detect::AdulterantFinding;
use crate::error::Result;
use crate::normalize::NormalizedProfileTable;
use crate::plot::VisualizationSink;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Label given to reference rows in the pooled visualization table.
pub const REFERENCE_LABEL: &str = "Reference";

/// Verdict for one test sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleVerdict {
    /// 1-based position of the sample in the test table.
    pub ordinal: usize,
    /// Sample row id.
    pub sample_id: String,
    /// Highest cosine similarity against the reference library.
    pub best_similarity: f64,
    /// Row id of the best-matching reference.
    pub best_reference: String,
    /// Adulterants flagged in this sample.
    pub adulterants: AdulterantFinding,
    /// Purity verdict.
    pub label: PurityLabel,
}

impl SampleVerdict {
    /// Check if the sample was judged pure.
    pub fn is_pure(&self) -> bool {
        self.label.is_pure()
    }
}

impl std::fmt::Display for SampleVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sample {}: Similarity={:.2}, Status={}",
            self.ordinal, self.best_similarity, self.label
        )?;
        if !self.adulterants.is_empty() {
            write!(f, "\n - Adulterants detected: {}", self.adulterants.joined())?;
        }
        Ok(())
    }
}

/// A row excluded from a run under the skip policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// Table the row belongs to.
    pub table: String,
    /// Row id.
    pub row_id: String,
    /// Why the row was excluded.
    pub reason: String,
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Pipeline name.
    pub name: String,
    /// Similarity threshold used for classification.
    pub threshold: f64,
    /// One verdict per processed test sample, in test-table order.
    pub verdicts: Vec<SampleVerdict>,
    /// Rows excluded under the skip policy.
    pub skipped: Vec<SkippedRow>,
    /// Normalized reference rows followed by normalized test rows.
    #[serde(skip_serializing)]
    pub pooled: NormalizedProfileTable,
    /// One label per pooled row.
    #[serde(skip_serializing)]
    pub pooled_labels: Vec<String>,
}

impl PipelineReport {
    /// Number of verdicts.
    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    /// Iterate over verdicts.
    pub fn iter(&self) -> impl Iterator<Item = &SampleVerdict> {
        self.verdicts.iter()
    }

    /// Verdicts judged pure.
    pub fn pure(&self) -> Vec<&SampleVerdict> {
        self.verdicts.iter().filter(|v| v.is_pure()).collect()
    }

    /// Verdicts judged adulterated.
    pub fn adulterated(&self) -> Vec<&SampleVerdict> {
        self.verdicts.iter().filter(|v| !v.is_pure()).collect()
    }

    /// Count verdicts by outcome.
    pub fn summary(&self) -> ReportSummary {
        let n_pure = self.verdicts.iter().filter(|v| v.is_pure()).count();
        ReportSummary {
            total: self.len(),
            pure: n_pure,
            adulterated: self.len() - n_pure,
            with_adulterants: self
                .verdicts
                .iter()
                .filter(|v| !v.adulterants.is_empty())
                .count(),
            skipped: self.skipped.len(),
        }
    }

    /// Hand the pooled table and its labels to a visualization sink.
    pub fn render(&self, sink: &dyn VisualizationSink) -> Result<()> {
        sink.render(self.pooled.table(), &self.pooled_labels)
    }

    /// Write verdicts to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "ordinal\tsample_id\tbest_similarity\tbest_reference\tstatus\tadulterants"
        )?;

        for v in &self.verdicts {
            writeln!(
                writer,
                "{}\t{}\t{:.6}\t{}\t{}\t{}",
                v.ordinal,
                v.sample_id,
                v.best_similarity,
                v.best_reference,
                v.label.name(),
                v.adulterants.adulterant_ids.join(",")
            )?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Serialize verdicts and skipped rows to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for v in &self.verdicts {
            writeln!(f, "{}", v)?;
        }
        Ok(())
    }
}

/// Summary statistics for a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub pure: usize,
    pub adulterated: usize,
    pub with_adulterants: usize,
    pub skipped: usize,
}

impl std::fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Samples screened:       {}", self.total)?;
        writeln!(f, "High purity potential:  {}", self.pure)?;
        writeln!(f, "Possibly adulterated:   {}", self.adulterated)?;
        writeln!(f, "  with adulterant flags: {}", self.with_adulterants)?;
        if self.skipped > 0 {
            writeln!(f, "Rows skipped:           {}", self.skipped)?;
        }
        Ok(())
    }
}

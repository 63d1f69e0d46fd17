//! Data structures for purity screening.

mod profile_table;
mod result;

pub use profile_table::{ensure_same_schema, CsvOptions, Profile, ProfileTable};
pub use result::{PipelineReport, ReportSummary, SampleVerdict, SkippedRow, REFERENCE_LABEL};

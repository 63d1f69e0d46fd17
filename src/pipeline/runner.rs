//! Pipeline runner: normalization, scoring, screening and classification.

use crate::classify::PurityClassifier;
use crate::classify::DEFAULT_SIMILARITY_THRESHOLD;
use crate::data::{PipelineReport, Profile, ProfileTable, SampleVerdict, SkippedRow, REFERENCE_LABEL};
use crate::detect::{detect_with_rule, DetectionRule};
use crate::error::{PurityError, Result};
use crate::normalize::{normalize, normalize_skipping, NormalizedProfileTable};
use crate::similarity::score;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do when a single row cannot be processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorPolicy {
    /// Abort the whole run on the first failing row.
    #[default]
    FailFast,
    /// Exclude the failing row, record it in the report, and continue.
    SkipRow,
}

fn default_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_name() -> String {
    "unnamed".to_string()
}

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    #[serde(default = "default_name")]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Minimum best-match similarity for a pure verdict.
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f64,
    /// Element-wise rule for adulterant presence.
    #[serde(default)]
    pub detection_rule: DetectionRule,
    /// Handling of degenerate or failing rows.
    #[serde(default)]
    pub on_row_error: RowErrorPolicy,
    /// Screen samples on the rayon thread pool.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: None,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            detection_rule: DetectionRule::default(),
            on_row_error: RowErrorPolicy::default(),
            parallel: false,
        }
    }
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(PurityError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(PurityError::from)
    }

    /// Load from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }
}

/// Builder for configuring and running purity screens.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    /// Set the similarity threshold for a pure verdict.
    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the adulterant detection rule.
    pub fn detection_rule(mut self, rule: DetectionRule) -> Self {
        self.config.detection_rule = rule;
        self
    }

    /// Set the row failure policy.
    pub fn on_row_error(mut self, policy: RowErrorPolicy) -> Self {
        self.config.on_row_error = policy;
        self
    }

    /// Screen samples in parallel. Verdict order is unaffected.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            description: description.map(String::from),
            ..self.config.clone()
        }
    }

    /// Screen every test sample against the reference and adulterant libraries.
    ///
    /// All three tables must share one compound schema. The returned report
    /// holds one verdict per processed sample, in test-table order, and the
    /// pooled reference + test table for visualization.
    pub fn run(
        &self,
        test: &ProfileTable,
        reference: &ProfileTable,
        adulterants: &ProfileTable,
    ) -> Result<PipelineReport> {
        let classifier = PurityClassifier::new(self.config.similarity_threshold)?;

        reference.ensure_same_schema(test)?;
        reference.ensure_same_schema(adulterants)?;
        log::info!(
            "pipeline '{}': {} samples, {} references, {} adulterants, {} compounds",
            self.config.name,
            test.n_rows(),
            reference.n_rows(),
            adulterants.n_rows(),
            reference.n_compounds()
        );

        let mut skipped = Vec::new();
        let test_n = self.normalize_table(test, &mut skipped)?;
        let reference_n = self.normalize_table(reference, &mut skipped)?;
        let adulterants_n = self.normalize_table(adulterants, &mut skipped)?;
        log::debug!("normalized all tables, {} rows skipped", skipped.len());

        if reference_n.is_empty() {
            return Err(PurityError::EmptyData(format!(
                "no usable reference profiles in '{}'",
                reference.name()
            )));
        }

        let screen = |i: usize| {
            self.screen_sample(&classifier, &test_n.profile(i), &reference_n, &adulterants_n)
        };
        let outcomes: Vec<Result<SampleVerdict>> = if self.config.parallel {
            (0..test_n.n_rows()).into_par_iter().map(screen).collect()
        } else {
            (0..test_n.n_rows()).map(screen).collect()
        };

        let mut verdicts = Vec::with_capacity(outcomes.len());
        let mut kept = Vec::with_capacity(outcomes.len());
        for (i, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(verdict) => {
                    verdicts.push(verdict);
                    kept.push(i);
                }
                Err(e) => match self.config.on_row_error {
                    RowErrorPolicy::FailFast => return Err(e),
                    RowErrorPolicy::SkipRow => {
                        log::warn!("skipping sample '{}': {}", test_n.row_ids()[i], e);
                        skipped.push(SkippedRow {
                            table: test.name().to_string(),
                            row_id: test_n.row_ids()[i].clone(),
                            reason: e.to_string(),
                        });
                    }
                },
            }
        }

        let screened = test_n.subset_rows(&kept)?.with_row_id_prefix("test");
        let pooled = reference_n
            .clone()
            .with_row_id_prefix("reference")
            .concat(&screened, "pooled")?;
        let mut pooled_labels = vec![REFERENCE_LABEL.to_string(); reference_n.n_rows()];
        pooled_labels.extend(verdicts.iter().map(|v| v.label.to_string()));

        log::info!(
            "pipeline '{}': {} of {} samples pure",
            self.config.name,
            verdicts.iter().filter(|v| v.is_pure()).count(),
            verdicts.len()
        );

        Ok(PipelineReport {
            name: self.config.name.clone(),
            threshold: classifier.threshold,
            verdicts,
            skipped,
            pooled,
            pooled_labels,
        })
    }

    fn normalize_table(
        &self,
        table: &ProfileTable,
        skipped: &mut Vec<SkippedRow>,
    ) -> Result<NormalizedProfileTable> {
        match self.config.on_row_error {
            RowErrorPolicy::FailFast => normalize(table),
            RowErrorPolicy::SkipRow => {
                let (normalized, degenerate) = normalize_skipping(table);
                skipped.extend(degenerate.into_iter().map(|d| SkippedRow {
                    table: table.name().to_string(),
                    row_id: d.row_id,
                    reason: format!("total abundance {} cannot be normalized", d.sum),
                }));
                Ok(normalized)
            }
        }
    }

    fn screen_sample(
        &self,
        classifier: &PurityClassifier,
        sample: &Profile<'_>,
        reference: &NormalizedProfileTable,
        adulterants: &NormalizedProfileTable,
    ) -> Result<SampleVerdict> {
        let similarity = score(sample, reference)?;
        let best = similarity.best().ok_or_else(|| {
            PurityError::EmptyData("reference library has no profiles".to_string())
        })?;
        let findings = detect_with_rule(sample, adulterants, self.config.detection_rule)?;
        let label = classifier.classify(best.similarity, &findings);

        log::debug!(
            "sample '{}': best match '{}' ({:.4}), {} adulterant(s), {}",
            sample.id,
            best.reference_id,
            best.similarity,
            findings.len(),
            label.name()
        );

        Ok(SampleVerdict {
            ordinal: sample.position + 1,
            sample_id: sample.id.to_string(),
            best_similarity: best.similarity,
            best_reference: best.reference_id,
            adulterants: findings,
            label,
        })
    }
}

/// Convenience function to screen samples with the default settings.
pub fn screen_samples(
    test: &ProfileTable,
    reference: &ProfileTable,
    adulterants: &ProfileTable,
) -> Result<PipelineReport> {
    Pipeline::new().name("default").run(test, reference, adulterants)
}

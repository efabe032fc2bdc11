//! Training report export functionality

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{
    FeatureKind, FeatureScore, ForestConfig, InferencePipeline, PipelineConfig, PreparationStats,
};

/// Metadata about the training run
#[derive(Serialize)]
pub struct TrainingMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub dietrec_version: String,
    pub input_file: String,
    /// Fraction of labels resampled before training
    pub label_noise: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_seed: Option<u64>,
    pub num_features: usize,
    pub forest: ForestConfig,
}

/// A ranked candidate with its selection status
#[derive(Serialize)]
pub struct RankedFeatureEntry {
    #[serde(flatten)]
    pub score: FeatureScore,
    pub selected: bool,
}

/// Model shape after training
#[derive(Serialize)]
pub struct ModelSummary {
    pub classes: Vec<String>,
    pub n_trees: usize,
    pub training_accuracy: f64,
    /// Selected features in classifier column order
    pub feature_subset: Vec<String>,
    pub numeric_features: usize,
    pub categorical_features: usize,
}

/// Complete training report
#[derive(Serialize)]
pub struct TrainingReport {
    pub metadata: TrainingMetadata,
    pub corpus: PreparationStats,
    pub model: ModelSummary,
    pub ranking: Vec<RankedFeatureEntry>,
    /// Known labels per categorical attribute, in code order
    pub encoder_domains: BTreeMap<String, Vec<String>>,
}

impl TrainingReport {
    pub fn new(pipeline: &InferencePipeline, input_file: &str, config: &PipelineConfig) -> Self {
        let stats = pipeline.stats();
        let subset = pipeline.feature_subset();

        let ranking: Vec<RankedFeatureEntry> = stats
            .ranking
            .iter()
            .map(|score| RankedFeatureEntry {
                score: score.clone(),
                selected: subset.contains(&score.feature),
            })
            .collect();

        let selected_kind = |kind: FeatureKind| {
            ranking
                .iter()
                .filter(|e| e.selected && e.score.kind == kind)
                .count()
        };
        let numeric_features = selected_kind(FeatureKind::Numeric);
        let categorical_features = selected_kind(FeatureKind::Categorical);

        let encoders = pipeline.encoders();
        let encoder_domains = encoders
            .attributes()
            .filter_map(|name| encoders.classes(name).map(|c| (name.to_string(), c)))
            .collect();

        Self {
            metadata: TrainingMetadata {
                timestamp: Utc::now().to_rfc3339(),
                dietrec_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: input_file.to_string(),
                label_noise: config.label_noise,
                noise_seed: config.noise_seed,
                num_features: config.num_features,
                forest: config.forest.clone(),
            },
            corpus: stats.preparation.clone(),
            model: ModelSummary {
                classes: stats.classes.clone(),
                n_trees: pipeline.classifier().n_trees(),
                training_accuracy: stats.training_accuracy,
                feature_subset: subset.names().to_vec(),
                numeric_features,
                categorical_features,
            },
            ranking,
            encoder_domains,
        }
    }
}

/// Export the training report of a fitted pipeline to a JSON file
///
/// # Arguments
/// * `pipeline` - The fitted pipeline
/// * `input_file` - Dataset path, recorded in the metadata
/// * `config` - Settings the pipeline was fitted with
/// * `output_path` - Path to write the JSON file
pub fn export_training_report(
    pipeline: &InferencePipeline,
    input_file: &str,
    config: &PipelineConfig,
    output_path: &Path,
) -> Result<()> {
    let report = TrainingReport::new(pipeline, input_file, config);

    let json = serde_json::to_string_pretty(&report)
        .context("Failed to serialize training report to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write training report to {}", output_path.display()))?;

    Ok(())
}

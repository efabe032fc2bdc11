//! One-shot training and per-request inference
//!
//! `prepare` turns the raw corpus into encoded candidate columns and picks
//! the feature subset, `train` fits the forest on that subset, and
//! `InferencePipeline::predict` aligns a request onto the same subset.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::cleaning::{drop_incomplete_rows, inject_label_noise, normalize_disease_labels};
use super::columns::{column_names, column_to_f64_vec, column_to_string_vec};
use super::config::{DatasetSchema, PipelineConfig};
use super::encoder::EncoderRegistry;
use super::features::{FeatureColumn, FeatureKind, FeatureSubset};
use super::forest::{ForestConfig, RandomForest};
use super::mutual_info::{rank_features, select_feature_subset, FeatureScore};
use crate::error::{DataPreparationError, InferenceError};

/// A single request value: a number or a label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Value as a category label; whole numbers render without a fraction
    pub fn as_label(&self) -> String {
        match self {
            AttributeValue::Text(s) => s.clone(),
            AttributeValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            AttributeValue::Number(n) => n.to_string(),
        }
    }

    /// Value as a number; text must parse as a float
    pub fn as_number(&self, attribute: &str) -> Result<f64, InferenceError> {
        match self {
            AttributeValue::Number(n) => Ok(*n),
            AttributeValue::Text(s) => {
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| InferenceError::NonNumericValue {
                        attribute: attribute.to_string(),
                        value: s.clone(),
                    })
            }
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Number(value as f64)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

/// Named attributes supplied with one prediction request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawAttributes(BTreeMap<String, AttributeValue>);

impl RawAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Row counts gathered while preparing the corpus
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreparationStats {
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub rows_used: usize,
    pub diseases_normalized: usize,
    /// Label cells redrawn by noise injection
    pub labels_resampled: usize,
    /// Redrawn cells whose label actually differs afterwards
    pub labels_changed: usize,
}

/// Encoded corpus ready for training
#[derive(Debug, Clone)]
pub struct PreparedCorpus {
    /// Every candidate column, encoded, in dataset order
    pub features: Vec<FeatureColumn>,
    /// Class index per row
    pub labels: Vec<usize>,
    /// Sorted class labels
    pub classes: Vec<String>,
    /// Candidates by descending information gain
    pub ranking: Vec<FeatureScore>,
    pub feature_subset: FeatureSubset,
    pub stats: PreparationStats,
}

impl PreparedCorpus {
    /// Candidate columns restricted to `subset`, in subset order
    pub fn subset_columns(
        &self,
        subset: &FeatureSubset,
    ) -> Result<Vec<FeatureColumn>, DataPreparationError> {
        subset
            .iter()
            .map(|name| {
                self.features
                    .iter()
                    .find(|f| f.name == name)
                    .cloned()
                    .ok_or_else(|| DataPreparationError::MissingColumn {
                        column: name.to_string(),
                    })
            })
            .collect()
    }
}

/// Clean, encode and rank the training corpus.
///
/// # Arguments
/// * `corpus` - Raw dataset, one row per patient record
/// * `schema` - Label, categorical and excluded column names
/// * `config` - Noise and feature-subset settings
/// * `registry` - Encoder registry to fit; one encoder per categorical attribute
///
/// # Returns
/// The encoded corpus with its ranking and the selected feature subset
pub fn prepare(
    mut corpus: DataFrame,
    schema: &DatasetSchema,
    config: &PipelineConfig,
    registry: &mut EncoderRegistry,
) -> Result<PreparedCorpus, DataPreparationError> {
    let columns = column_names(&corpus);
    for required in std::iter::once(&schema.label).chain(schema.categorical.iter()) {
        if !columns.contains(required) {
            return Err(DataPreparationError::MissingColumn {
                column: required.clone(),
            });
        }
    }

    let mut stats = PreparationStats {
        rows_loaded: corpus.height(),
        ..Default::default()
    };

    if columns.contains(&schema.disease_column) {
        stats.diseases_normalized = normalize_disease_labels(&mut corpus, &schema.disease_column)?;
    }

    let candidates: Vec<String> = columns
        .iter()
        .filter(|c| !schema.is_excluded(c))
        .cloned()
        .collect();

    let mut used: Vec<String> = vec![schema.label.clone()];
    for column in schema.categorical.iter().chain(candidates.iter()) {
        if !used.contains(column) {
            used.push(column.clone());
        }
    }

    let mut corpus = drop_incomplete_rows(&corpus, &used)?;
    stats.rows_used = corpus.height();
    stats.rows_dropped = stats.rows_loaded - stats.rows_used;
    if stats.rows_used == 0 {
        return Err(DataPreparationError::EmptyCorpus);
    }

    if config.label_noise > 0.0 {
        let mut rng = match config.noise_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let noise = inject_label_noise(&mut corpus, &schema.label, config.label_noise, &mut rng)?;
        stats.labels_resampled = noise.resampled;
        stats.labels_changed = noise.changed;
        tracing::info!(
            resampled = noise.resampled,
            changed = noise.changed,
            fraction = config.label_noise,
            "injected label noise"
        );
    }

    let raw_labels: Vec<String> = column_to_string_vec(corpus.column(&schema.label)?)?
        .into_iter()
        .flatten()
        .collect();
    let classes: Vec<String> = raw_labels
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if classes.len() < 2 {
        return Err(DataPreparationError::SingleClass {
            column: schema.label.clone(),
        });
    }
    let labels: Vec<usize> = raw_labels
        .iter()
        .filter_map(|l| classes.binary_search(l).ok())
        .collect();

    let mut encoded: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for attribute in &schema.categorical {
        let values: Vec<String> = column_to_string_vec(corpus.column(attribute)?)?
            .into_iter()
            .flatten()
            .collect();
        let codes = registry.fit(attribute, &values);
        tracing::debug!(
            attribute = attribute.as_str(),
            domain = registry.domain_len(attribute).unwrap_or(0),
            "fitted encoder"
        );
        encoded.insert(attribute, codes.into_iter().map(|c| c as f64).collect());
    }

    let mut features = Vec::with_capacity(candidates.len());
    for name in &candidates {
        let feature = match encoded.remove(name.as_str()) {
            Some(codes) => FeatureColumn::new(name, FeatureKind::Categorical, codes),
            None => {
                let column = corpus.column(name)?;
                if !column.dtype().is_primitive_numeric() {
                    return Err(DataPreparationError::NonNumericColumn {
                        column: name.clone(),
                        dtype: column.dtype().to_string(),
                    });
                }
                let values = column_to_f64_vec(column)?
                    .into_iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect();
                FeatureColumn::new(name, FeatureKind::Numeric, values)
            }
        };
        features.push(feature);
    }

    let ranking = rank_features(&features, &labels);
    let feature_subset = select_feature_subset(&ranking, config.num_features)?;
    tracing::info!(features = ?feature_subset.names(), "selected feature subset");

    Ok(PreparedCorpus {
        features,
        labels,
        classes,
        ranking,
        feature_subset,
        stats,
    })
}

/// Fit the forest on the `feature_subset` columns of a prepared corpus
pub fn train(
    corpus: &PreparedCorpus,
    feature_subset: &FeatureSubset,
    config: &ForestConfig,
) -> Result<RandomForest, DataPreparationError> {
    let columns = corpus.subset_columns(feature_subset)?;
    Ok(RandomForest::fit(
        &columns,
        &corpus.labels,
        &corpus.classes,
        config,
    ))
}

/// Outcome of training, kept for reporting
#[derive(Debug, Clone, Serialize)]
pub struct TrainingStats {
    pub preparation: PreparationStats,
    pub ranking: Vec<FeatureScore>,
    pub classes: Vec<String>,
    pub training_accuracy: f64,
}

/// Trained model plus the state needed to encode and align requests
#[derive(Debug)]
pub struct InferencePipeline {
    encoders: EncoderRegistry,
    feature_subset: FeatureSubset,
    classifier: RandomForest,
    stats: TrainingStats,
}

impl InferencePipeline {
    /// Prepare the corpus, select features and fit the classifier
    pub fn fit(
        corpus: DataFrame,
        schema: &DatasetSchema,
        config: &PipelineConfig,
    ) -> Result<Self, DataPreparationError> {
        let mut encoders = EncoderRegistry::new();
        let prepared = prepare(corpus, schema, config, &mut encoders)?;
        let classifier = train(&prepared, &prepared.feature_subset, &config.forest)?;

        let training_accuracy = classifier.accuracy(
            &prepared.subset_columns(&prepared.feature_subset)?,
            &prepared.labels,
        );
        tracing::info!(
            trees = classifier.n_trees(),
            classes = prepared.classes.len(),
            accuracy = training_accuracy,
            "classifier trained"
        );

        Ok(Self {
            encoders,
            feature_subset: prepared.feature_subset,
            classifier,
            stats: TrainingStats {
                preparation: prepared.stats,
                ranking: prepared.ranking,
                classes: prepared.classes,
                training_accuracy,
            },
        })
    }

    /// Predict the diet label for one request.
    ///
    /// Every categorical field is encoded first, including fields outside the
    /// feature subset, so unseen labels extend their domain even when they do
    /// not reach the classifier. The row is then built in subset order;
    /// absent columns are 0 and fields outside the subset are ignored.
    pub fn predict(&self, raw: &RawAttributes) -> Result<String, InferenceError> {
        let row = self.feature_vector(raw)?;
        let label = self.classifier.predict(&row)?;
        Ok(label.to_string())
    }

    /// Feature row a request maps to, encoding its categorical fields on the way
    pub fn feature_vector(&self, raw: &RawAttributes) -> Result<Vec<f64>, InferenceError> {
        let mut codes: BTreeMap<&str, f64> = BTreeMap::new();
        for (name, value) in raw.iter() {
            if self.encoders.is_categorical(name) {
                let code = self.encoders.encode(name, &value.as_label())?;
                codes.insert(name, code as f64);
            }
        }

        self.feature_subset
            .iter()
            .map(|name| match (codes.get(name), raw.get(name)) {
                (Some(code), _) => Ok(*code),
                (None, Some(value)) => value.as_number(name),
                (None, None) => Ok(0.0),
            })
            .collect()
    }

    pub fn encoders(&self) -> &EncoderRegistry {
        &self.encoders
    }

    pub fn feature_subset(&self) -> &FeatureSubset {
        &self.feature_subset
    }

    pub fn classifier(&self) -> &RandomForest {
        &self.classifier
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }
}

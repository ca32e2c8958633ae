// src/model.rs
//! Serialized classifier and the adapter the service predicts through.

use crate::app_log;
use crate::error::MatchError;
use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES, SCHEMA_VERSION};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use linfa::prelude::*;
use linfa_logistic::FittedLogisticRegression;
use ndarray::Array2;
use rmp_serde::{decode::from_read, encode::write_named};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use uuid::Uuid;

/// Per-feature standardization learned on the training split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    pub fn fit(rows: &[FeatureVector]) -> Self {
        let n = rows.len().max(1) as f64;
        let mut mean = vec![0.0; FEATURE_COUNT];
        for row in rows {
            for (acc, value) in mean.iter_mut().zip(row.to_row()) {
                *acc += value / n;
            }
        }

        let mut variance = vec![0.0; FEATURE_COUNT];
        for row in rows {
            for ((acc, value), m) in variance.iter_mut().zip(row.to_row()).zip(&mean) {
                *acc += (value - m).powi(2) / n;
            }
        }

        // Constant columns keep their raw offset instead of dividing by zero.
        let scale = variance
            .into_iter()
            .map(|v| if v > f64::EPSILON { v.sqrt() } else { 1.0 })
            .collect();

        Self { mean, scale }
    }

    pub fn transform(&self, vector: &FeatureVector) -> [f64; FEATURE_COUNT] {
        let mut row = vector.to_row();
        for (i, value) in row.iter_mut().enumerate() {
            *value = (*value - self.mean[i]) / self.scale[i];
        }
        row
    }

    pub fn transform_all(&self, vectors: &[FeatureVector]) -> Result<Array2<f64>> {
        let flat: Vec<f64> = vectors.iter().flat_map(|v| self.transform(v)).collect();
        Array2::from_shape_vec((vectors.len(), FEATURE_COUNT), flat)
            .context("Failed to build feature matrix")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub samples: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
    pub train_accuracy: f64,
    pub test_metrics: EvaluationMetrics,
}

/// On-disk artifact: the classifier plus the encoding it was trained with.
#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    schema_version: u32,
    feature_names: Vec<String>,
    scaler: FeatureScaler,
    classifier: FittedLogisticRegression<f64, usize>,
    metadata: ModelMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub label: u8,
    pub probability: f64,
}

/// Loaded, read-only selection classifier.
pub struct SelectionModel {
    artifact: ModelArtifact,
}

impl SelectionModel {
    pub fn new(
        scaler: FeatureScaler,
        classifier: FittedLogisticRegression<f64, usize>,
        metadata: ModelMetadata,
    ) -> Self {
        Self {
            artifact: ModelArtifact {
                schema_version: SCHEMA_VERSION,
                feature_names: FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
                scaler,
                classifier,
                metadata,
            },
        }
    }

    /// Load an artifact, refusing one encoded with a different feature schema.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Model artifact not found: {}", path.display()))?;
        let artifact: ModelArtifact = from_read(BufReader::new(file))
            .with_context(|| format!("Failed to decode model artifact: {}", path.display()))?;

        if artifact.schema_version != SCHEMA_VERSION {
            anyhow::bail!(
                "Model artifact uses feature schema v{}, this build encodes v{}",
                artifact.schema_version,
                SCHEMA_VERSION
            );
        }
        if artifact.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            anyhow::bail!(
                "Model artifact feature order {:?} does not match {:?}",
                artifact.feature_names,
                FEATURE_NAMES
            );
        }
        if artifact.scaler.mean.len() != FEATURE_COUNT
            || artifact.scaler.scale.len() != FEATURE_COUNT
        {
            anyhow::bail!("Model artifact scaler has the wrong number of features");
        }

        app_log!(
            info,
            "Loaded model {} trained at {} on {} rows",
            artifact.metadata.model_id,
            artifact.metadata.trained_at,
            artifact.metadata.training_rows
        );
        Ok(Self { artifact })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create model file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        write_named(&mut writer, &self.artifact).context("Failed to serialize model artifact")?;
        writer.flush().context("Failed to flush model artifact")?;
        Ok(())
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.artifact.metadata
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut ModelMetadata {
        &mut self.artifact.metadata
    }

    /// Decision and positive-class probability for one vector.
    pub fn predict(&self, vector: &FeatureVector) -> Result<Prediction, MatchError> {
        let records = self
            .artifact
            .scaler
            .transform_all(std::slice::from_ref(vector))
            .map_err(|e| MatchError::ModelUnavailable(e.to_string()))?;

        let classifier = &self.artifact.classifier;
        let labels = classifier.predict(&records);
        let probabilities = classifier.predict_probabilities(&records);
        // linfa's positive class is the majority training label, not always 1.
        let positive_is_selected = classifier.labels().pos.class == 1;

        match (labels.get(0), probabilities.get(0)) {
            (Some(&label), Some(&positive)) => Ok(Prediction {
                label: u8::from(label == 1),
                probability: if positive_is_selected {
                    positive
                } else {
                    1.0 - positive
                },
            }),
            _ => Err(MatchError::ModelUnavailable(
                "Classifier returned no output".to_string(),
            )),
        }
    }

    /// Decisions for many vectors, used by evaluation.
    pub fn predict_labels(&self, vectors: &[FeatureVector]) -> Result<Vec<usize>> {
        let records = self.artifact.scaler.transform_all(vectors)?;
        Ok(self.artifact.classifier.predict(&records).to_vec())
    }
}

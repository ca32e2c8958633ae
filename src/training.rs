// src/training.rs
//! Offline training: CSV dataset -> encoded rows -> fitted artifact.

use crate::app_log;
use crate::features::{DatasetRow, FeatureVector};
use crate::model::{EvaluationMetrics, FeatureScaler, ModelMetadata, SelectionModel};
use anyhow::{Context, Result};
use chrono::Utc;
use linfa::prelude::*;
use linfa_bayes::GaussianNb;
use linfa_logistic::LogisticRegression;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub test_ratio: f64,
    pub seed: u64,
    pub max_iterations: u64,
    /// Only used when comparing algorithms.
    pub tree_max_depth: usize,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            max_iterations: 150,
            tree_max_depth: 8,
        }
    }
}

/// Encoded rows with their 0/1 selection labels.
#[derive(Debug, Clone, Default)]
pub struct EncodedDataset {
    pub features: Vec<FeatureVector>,
    pub labels: Vec<usize>,
    pub skipped: usize,
}

impl EncodedDataset {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i]).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            skipped: 0,
        }
    }
}

pub struct TrainingReport {
    pub model: SelectionModel,
    pub train_rows: usize,
    pub test_rows: usize,
    pub skipped_rows: usize,
}

/// Read and encode a dataset. Rows with unmapped categories or a label other
/// than 0/1 are skipped and counted.
pub fn load_dataset(path: &Path) -> Result<EncodedDataset> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open dataset: {}", path.display()))?;

    let mut dataset = EncodedDataset::default();
    for (index, result) in reader.deserialize::<DatasetRow>().enumerate() {
        let row = result.with_context(|| format!("Invalid CSV row {}", index + 1))?;

        let Some(label) = row.label() else {
            app_log!(warn, "Row {}: selection_status is not 0 or 1, skipping", index + 1);
            dataset.skipped += 1;
            continue;
        };

        match FeatureVector::from_dataset_row(&row) {
            Ok(vector) => {
                dataset.features.push(vector);
                dataset.labels.push(label);
            }
            Err(missing) => {
                app_log!(warn, "Row {}: missing {:?}, skipping", index + 1, missing);
                dataset.skipped += 1;
            }
        }
    }

    app_log!(
        info,
        "Loaded {} rows from {} ({} skipped)",
        dataset.len(),
        path.display(),
        dataset.skipped
    );
    Ok(dataset)
}

/// Seeded shuffle split into (train, test).
pub fn train_test_split(
    dataset: &EncodedDataset,
    test_ratio: f64,
    seed: u64,
) -> (EncodedDataset, EncodedDataset) {
    let mut indices: Vec<usize> = (0..dataset.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_size = ((dataset.len() as f64) * test_ratio.clamp(0.0, 1.0)).round() as usize;
    let (test, train) = indices.split_at(test_size);
    (dataset.subset(train), dataset.subset(test))
}

/// Fit the scaler and the logistic regression on `train`.
pub fn train_model(train: &EncodedDataset, options: &TrainingOptions) -> Result<SelectionModel> {
    if train.is_empty() {
        anyhow::bail!("Training set is empty");
    }

    let scaler = FeatureScaler::fit(&train.features);
    let records = scaler.transform_all(&train.features)?;
    let targets = Array1::from_vec(train.labels.clone());
    let dataset = Dataset::new(records, targets);

    let classifier = LogisticRegression::default()
        .max_iterations(options.max_iterations)
        .fit(&dataset)
        .map_err(|e| anyhow::anyhow!("Logistic regression fit failed: {}", e))?;

    let mut model = SelectionModel::new(
        scaler,
        classifier,
        ModelMetadata {
            model_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            training_rows: train.len(),
            train_accuracy: 0.0,
            test_metrics: EvaluationMetrics::default(),
        },
    );

    let train_metrics = evaluate(&model, train)?;
    model.metadata_mut().train_accuracy = train_metrics.accuracy;
    Ok(model)
}

/// Binary metrics with class 1 as the positive class.
pub fn evaluate(model: &SelectionModel, dataset: &EncodedDataset) -> Result<EvaluationMetrics> {
    if dataset.is_empty() {
        return Ok(EvaluationMetrics::default());
    }

    let predicted = model.predict_labels(&dataset.features)?;
    Ok(binary_metrics(&predicted, &dataset.labels))
}

fn binary_metrics(predicted: &[usize], actual: &[usize]) -> EvaluationMetrics {
    if actual.is_empty() {
        return EvaluationMetrics::default();
    }

    let (mut tp, mut fp, mut fn_, mut correct) = (0usize, 0usize, 0usize, 0usize);
    for (&p, &actual) in predicted.iter().zip(actual) {
        if p == actual {
            correct += 1;
        }
        match (p, actual) {
            (1, 1) => tp += 1,
            (1, _) => fp += 1,
            (_, 1) => fn_ += 1,
            _ => {}
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1_score = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    EvaluationMetrics {
        samples: actual.len(),
        accuracy: ratio(correct, actual.len()),
        precision,
        recall,
        f1_score,
    }
}

/// Full pipeline: load, split, fit, evaluate on the held-out split.
pub fn run_training(dataset_path: &Path, options: &TrainingOptions) -> Result<TrainingReport> {
    let dataset = load_dataset(dataset_path)?;
    let (train, test) = train_test_split(&dataset, options.test_ratio, options.seed);
    app_log!(info, "Training on {} rows, testing on {}", train.len(), test.len());

    let mut model = train_model(&train, options)?;
    let test_metrics = evaluate(&model, &test)?;
    model.metadata_mut().test_metrics = test_metrics;

    Ok(TrainingReport {
        model,
        train_rows: train.len(),
        test_rows: test.len(),
        skipped_rows: dataset.skipped,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    LogisticRegression,
    DecisionTree,
    GaussianNaiveBayes,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::LogisticRegression,
        Algorithm::DecisionTree,
        Algorithm::GaussianNaiveBayes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::LogisticRegression => "Logistic Regression",
            Algorithm::DecisionTree => "Decision Tree",
            Algorithm::GaussianNaiveBayes => "Gaussian Naive Bayes",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlgorithmScore {
    pub algorithm: Algorithm,
    pub metrics: EvaluationMetrics,
}

fn fit_failed(algorithm: Algorithm, err: impl std::fmt::Display) -> anyhow::Error {
    anyhow::anyhow!("{} fit failed: {}", algorithm.name(), err)
}

fn fit_and_predict(
    algorithm: Algorithm,
    train: &Dataset<f64, usize, ndarray::Ix1>,
    test_records: &Array2<f64>,
    options: &TrainingOptions,
) -> Result<Array1<usize>> {
    let predicted = match algorithm {
        Algorithm::LogisticRegression => LogisticRegression::default()
            .max_iterations(options.max_iterations)
            .fit(train)
            .map_err(|e| fit_failed(algorithm, e))?
            .predict(test_records),
        Algorithm::DecisionTree => DecisionTree::params()
            .max_depth(Some(options.tree_max_depth))
            .fit(train)
            .map_err(|e| fit_failed(algorithm, e))?
            .predict(test_records),
        Algorithm::GaussianNaiveBayes => GaussianNb::params()
            .fit(train)
            .map_err(|e| fit_failed(algorithm, e))?
            .predict(test_records),
    };
    Ok(predicted)
}

/// Fit every algorithm on the same seeded split and standardization, then
/// score each on the held-out rows. Nothing is saved.
pub fn compare_algorithms(
    dataset: &EncodedDataset,
    options: &TrainingOptions,
) -> Result<Vec<AlgorithmScore>> {
    let (train, test) = train_test_split(dataset, options.test_ratio, options.seed);
    if train.is_empty() || test.is_empty() {
        anyhow::bail!(
            "Comparison needs rows on both sides of the split ({} train, {} test)",
            train.len(),
            test.len()
        );
    }

    let scaler = FeatureScaler::fit(&train.features);
    let train_set = Dataset::new(
        scaler.transform_all(&train.features)?,
        Array1::from_vec(train.labels.clone()),
    );
    let test_records = scaler.transform_all(&test.features)?;

    let mut scores = Vec::with_capacity(Algorithm::ALL.len());
    for algorithm in Algorithm::ALL {
        app_log!(info, "Training: {}", algorithm.name());
        let predicted = fit_and_predict(algorithm, &train_set, &test_records, options)?;
        let metrics = binary_metrics(&predicted.to_vec(), &test.labels);
        app_log!(
            info,
            "{}: accuracy {:.4}, f1 {:.4}",
            algorithm.name(),
            metrics.accuracy,
            metrics.f1_score
        );
        scores.push(AlgorithmScore { algorithm, metrics });
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "name,skills_rating,experience_years,profile_completeness,project_required_skills,project_optional_skills,project_difficulty,project_duration,applicant_type,education,selection_status";

    fn write_dataset(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("dataset.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        let skills = ["Python", "SQL", "Rust", "Go", "Java", "C", "Docker", "React"];
        for i in 0..60usize {
            let count = i % 8 + 1;
            let rating: Vec<String> = skills[..count]
                .iter()
                .map(|s| format!("\"\"{}\"\": 3", s))
                .collect();
            let mut selected = usize::from(count >= 5);
            if i % 11 == 0 {
                selected = 1 - selected;
            }
            writeln!(
                file,
                "cand{},\"{{{}}}\",{},{},\"python,sql\",docker,Medium,{} months,fresher,B.Tech,{}",
                i,
                rating.join(", "),
                i % 5,
                50 + (i % 40),
                i % 6 + 1,
                selected
            )
            .unwrap();
        }
        // unmapped education and a bad label
        writeln!(file, "odd,\"{{}}\",1,50,a,b,Easy,2 months,student,PhD,1").unwrap();
        writeln!(file, "odd2,\"{{}}\",1,50,a,b,Easy,2 months,student,BSc,maybe").unwrap();
        path
    }

    #[test]
    fn test_load_dataset_skips_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = load_dataset(&write_dataset(dir.path())).unwrap();
        assert_eq!(dataset.len(), 60);
        assert_eq!(dataset.skipped, 2);
        assert_eq!(dataset.features[0].skill_count, 1);
        assert_eq!(dataset.features[4].skill_count, 5);
        assert_eq!(dataset.features[0].required_skill_count, 2);
        assert_eq!(dataset.features[0].education_num, 3);
    }

    #[test]
    fn test_split_is_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = load_dataset(&write_dataset(dir.path())).unwrap();
        let (train_a, test_a) = train_test_split(&dataset, 0.2, 42);
        let (train_b, test_b) = train_test_split(&dataset, 0.2, 42);
        assert_eq!(test_a.len(), 12);
        assert_eq!(train_a.len(), 48);
        assert_eq!(train_a.labels, train_b.labels);
        assert_eq!(test_a.features, test_b.features);
    }

    #[test]
    fn test_run_training_reports_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let report = run_training(&write_dataset(dir.path()), &TrainingOptions::default()).unwrap();
        assert_eq!(report.train_rows, 48);
        assert_eq!(report.test_rows, 12);
        assert_eq!(report.skipped_rows, 2);

        let metadata = report.model.metadata();
        assert_eq!(metadata.training_rows, 48);
        assert_eq!(metadata.test_metrics.samples, 12);
        assert!(metadata.train_accuracy > 0.5);
        assert!((0.0..=1.0).contains(&metadata.test_metrics.f1_score));
    }

    #[test]
    fn test_compare_scores_every_algorithm_on_the_same_split() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_dataset(dir.path());
        let options = TrainingOptions::default();
        let scores = compare_algorithms(&load_dataset(&path).unwrap(), &options).unwrap();

        let algorithms: Vec<Algorithm> = scores.iter().map(|s| s.algorithm).collect();
        assert_eq!(algorithms, Algorithm::ALL.to_vec());
        for score in &scores {
            assert_eq!(score.metrics.samples, 12);
            assert!((0.0..=1.0).contains(&score.metrics.accuracy));
            assert!((0.0..=1.0).contains(&score.metrics.f1_score));
        }

        // Logistic regression in the comparison is the model `train` saves.
        let report = run_training(&path, &options).unwrap();
        assert_eq!(scores[0].metrics, report.model.metadata().test_metrics);
    }

    #[test]
    fn test_compare_needs_a_test_split() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = load_dataset(&write_dataset(dir.path())).unwrap();
        let options = TrainingOptions {
            test_ratio: 0.0,
            ..TrainingOptions::default()
        };
        assert!(compare_algorithms(&dataset, &options).is_err());
    }

    #[test]
    fn test_binary_metrics() {
        let metrics = binary_metrics(&[1, 1, 0, 0], &[1, 0, 1, 0]);
        assert_eq!(metrics.samples, 4);
        assert_eq!(metrics.accuracy, 0.5);
        assert_eq!(metrics.precision, 0.5);
        assert_eq!(metrics.recall, 0.5);
        assert_eq!(metrics.f1_score, 0.5);
    }

    #[test]
    fn test_empty_training_set_is_an_error() {
        assert!(train_model(&EncodedDataset::default(), &TrainingOptions::default()).is_err());
    }
}

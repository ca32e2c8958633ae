// src/trainer_cli.rs
use crate::app_log;
use crate::features::{FeatureVector, RawRecord};
use crate::model::{EvaluationMetrics, SelectionModel};
use crate::training::{compare_algorithms, load_dataset, run_training, TrainingOptions};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skilllens-trainer")]
#[command(about = "Train and query the SkillLens selection model")]
pub struct TrainerCli {
    #[command(subcommand)]
    pub command: TrainerCommand,

    #[arg(long, global = true, default_value = "/tmp/skilllens-trainer.log")]
    pub log_file: PathBuf,
}

#[derive(Subcommand)]
pub enum TrainerCommand {
    /// Train a model from a CSV dataset and save the artifact
    Train {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long, default_value = "model.msgpack")]
        model: PathBuf,
        #[arg(long, default_value_t = 0.2)]
        test_ratio: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 150)]
        max_iterations: u64,
    },
    /// Compare classifiers on the same split without saving a model
    Compare {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long, default_value_t = 0.2)]
        test_ratio: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 150)]
        max_iterations: u64,
        #[arg(long, default_value_t = 8)]
        tree_max_depth: usize,
    },
    /// Predict selection for one candidate
    Predict {
        #[arg(long, default_value = "model.msgpack")]
        model: PathBuf,
        #[command(flatten)]
        candidate: CandidateArgs,
    },
    /// Show metadata stored in a model artifact
    Inspect {
        #[arg(long, default_value = "model.msgpack")]
        model: PathBuf,
    },
}

/// Candidate and project fields; categorical ones accept text or level numbers.
#[derive(Args, Debug, Clone)]
pub struct CandidateArgs {
    /// Number of skills the candidate knows
    #[arg(long, default_value_t = 0)]
    pub skill_count: u32,
    #[arg(long, default_value_t = 0.0)]
    pub experience_years: f64,
    /// 0-100
    #[arg(long, default_value_t = 0.0)]
    pub profile_completeness: f64,
    /// Comma separated, e.g. "python,sql,flask"
    #[arg(long, default_value = "")]
    pub required_skills: String,
    /// Comma separated, e.g. "docker,react"
    #[arg(long, default_value = "")]
    pub optional_skills: String,
    /// Easy, Medium, Hard (or 1-3)
    #[arg(long)]
    pub difficulty: Option<String>,
    /// e.g. "3 months"
    #[arg(long)]
    pub duration: Option<String>,
    /// student, fresher, experienced (or 1-3)
    #[arg(long)]
    pub applicant_type: Option<String>,
    /// Diploma, BSc, B.Tech, MSc, M.Tech (or 1-5)
    #[arg(long)]
    pub education: Option<String>,
}

impl CandidateArgs {
    /// Same raw shape the HTTP endpoints receive, so encoding is shared.
    pub fn to_record(&self) -> RawRecord {
        let mut record = RawRecord::new();
        record.insert("skill_count".into(), Value::from(self.skill_count));
        record.insert("experience_years".into(), Value::from(self.experience_years));
        record.insert(
            "profile_completeness".into(),
            Value::from(self.profile_completeness),
        );
        record.insert(
            "project_required_skills".into(),
            Value::from(self.required_skills.clone()),
        );
        record.insert(
            "project_optional_skills".into(),
            Value::from(self.optional_skills.clone()),
        );
        let optional = [
            ("project_difficulty", &self.difficulty),
            ("project_duration", &self.duration),
            ("applicant_type", &self.applicant_type),
            ("education", &self.education),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                record.insert(key.into(), Value::from(value.clone()));
            }
        }
        record
    }
}

fn print_metrics(label: &str, metrics: &EvaluationMetrics) {
    println!("{} ({} rows):", label, metrics.samples);
    println!("  Accuracy:  {:.4}", metrics.accuracy);
    println!("  Precision: {:.4}", metrics.precision);
    println!("  Recall:    {:.4}", metrics.recall);
    println!("  F1 Score:  {:.4}", metrics.f1_score);
}

pub fn handle_trainer_command(cli: TrainerCli) -> Result<()> {
    match cli.command {
        TrainerCommand::Train {
            dataset,
            model,
            test_ratio,
            seed,
            max_iterations,
        } => {
            let options = TrainingOptions {
                test_ratio,
                seed,
                max_iterations,
                ..TrainingOptions::default()
            };
            let report = run_training(&dataset, &options)?;
            report.model.save(&model)?;

            let metadata = report.model.metadata();
            println!("Model trained successfully!");
            println!(
                "Rows: {} train, {} test, {} skipped",
                report.train_rows, report.test_rows, report.skipped_rows
            );
            println!("Training Accuracy: {:.4}", metadata.train_accuracy);
            print_metrics("Testing", &metadata.test_metrics);
            println!("Saved {} to {}", metadata.model_id, model.display());
            app_log!(info, "Saved model {} to {}", metadata.model_id, model.display());
        }

        TrainerCommand::Compare {
            dataset,
            test_ratio,
            seed,
            max_iterations,
            tree_max_depth,
        } => {
            let options = TrainingOptions {
                test_ratio,
                seed,
                max_iterations,
                tree_max_depth,
            };
            let dataset = load_dataset(&dataset)?;
            let scores = compare_algorithms(&dataset, &options)?;

            println!("================ FINAL RESULTS ================");
            for score in &scores {
                print_metrics(score.algorithm.name(), &score.metrics);
            }
        }

        TrainerCommand::Predict { model, candidate } => {
            let model = SelectionModel::load(&model)?;
            let vector = FeatureVector::from_record(&candidate.to_record())?;
            let prediction = model.predict(&vector)?;

            if prediction.label == 1 {
                println!("SUITABLE: selected (1)");
            } else {
                println!("NOT SUITABLE: not selected (0)");
            }
            println!("Match probability: {:.2}%", prediction.probability * 100.0);
        }

        TrainerCommand::Inspect { model } => {
            let model = SelectionModel::load(&model)?;
            let metadata = model.metadata();
            println!("Model ID:   {}", metadata.model_id);
            println!("Trained at: {}", metadata.trained_at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("Train rows: {}", metadata.training_rows);
            println!("Training Accuracy: {:.4}", metadata.train_accuracy);
            print_metrics("Testing", &metadata.test_metrics);
        }
    }

    Ok(())
}

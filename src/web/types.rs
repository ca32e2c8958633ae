// src/web/types.rs

use crate::error::MatchError;
use crate::github::{GithubAnalysis, GithubScorer};
use crate::model::SelectionModel;
use rocket::serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a handler needs, built once at startup and managed by rocket.
pub struct AppContext {
    pub model: Option<SelectionModel>,
    pub github: GithubScorer,
    pub templates_dir: PathBuf,
}

impl AppContext {
    pub fn model(&self) -> Result<&SelectionModel, MatchError> {
        self.model
            .as_ref()
            .ok_or_else(|| MatchError::ModelUnavailable("Model not loaded".to_string()))
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
}

impl From<&MatchError> for ErrorResponse {
    fn from(err: &MatchError) -> Self {
        Self {
            error: err.message().to_string(),
            error_code: err.code().to_string(),
        }
    }
}

/// `POST /api/predict` body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct PredictResponse {
    pub prediction: u8,
    pub probability: f64,
}

/// `POST /predict` body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct MatchPredictResponse {
    pub prediction: u8,
    pub match_probability: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct GithubRequest {
    #[serde(default, alias = "github_link")]
    pub github_url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(crate = "rocket::serde")]
pub struct GithubError {
    pub error: String,
}

/// Analysis or a flat `{"error": ...}` object.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(crate = "rocket::serde", untagged)]
pub enum GithubResult {
    Analysis(GithubAnalysis),
    Error(GithubError),
}

impl GithubResult {
    pub fn complexity_score(&self) -> u64 {
        match self {
            Self::Analysis(analysis) => analysis.complexity_score,
            Self::Error(_) => 0,
        }
    }
}

impl From<Result<GithubAnalysis, MatchError>> for GithubResult {
    fn from(result: Result<GithubAnalysis, MatchError>) -> Self {
        match result {
            Ok(analysis) => Self::Analysis(analysis),
            Err(err) => Self::Error(GithubError {
                error: err.message().to_string(),
            }),
        }
    }
}

/// `POST /match_project` body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct MatchProjectResponse {
    pub prediction: u8,
    pub match_probability: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubResult>,
    pub overall_fit_score: f64,
}

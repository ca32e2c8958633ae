// src/github.rs
//! GitHub repository complexity scoring over the public REST API.

use crate::app_log;
use crate::error::MatchError;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("skilllens/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubAnalysis {
    pub languages: BTreeMap<String, u64>,
    pub stars: u64,
    pub complexity_score: u64,
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    #[serde(default)]
    size: u64,
    #[serde(default)]
    stargazers_count: u64,
}

/// `10 * distinct languages + repository size in KB`.
pub fn complexity_score(languages: &BTreeMap<String, u64>, size_kb: u64) -> u64 {
    languages.len() as u64 * 10 + size_kb
}

fn repo_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"github\.com/(.+?)/(.+?)(?:$|/)").expect("repository pattern is valid")
    })
}

/// Extract `(owner, repo)` from a GitHub URL.
pub fn parse_repo_url(url: &str) -> Result<(String, String), MatchError> {
    let invalid = || MatchError::InvalidInput("Invalid GitHub URL".to_string());
    let captures = repo_pattern().captures(url.trim()).ok_or_else(invalid)?;

    let owner = captures.get(1).map(|m| m.as_str()).ok_or_else(invalid)?;
    let repo = captures.get(2).map(|m| m.as_str()).ok_or_else(invalid)?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        return Err(invalid());
    }
    Ok((owner.to_string(), repo.to_string()))
}

pub struct GithubScorer {
    client: reqwest::Client,
    base_url: String,
}

impl GithubScorer {
    pub fn new(base_url: &str, timeout_seconds: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch repository metadata and languages, then score them.
    pub async fn analyze(&self, repo_url: &str) -> Result<GithubAnalysis, MatchError> {
        let (owner, repo) = parse_repo_url(repo_url)?;
        let repo_endpoint = format!("{}/repos/{}/{}", self.base_url, owner, repo);

        let info: RepoInfo = self.get_json(&repo_endpoint).await?;
        let languages: BTreeMap<String, u64> =
            self.get_json(&format!("{}/languages", repo_endpoint)).await?;

        let score = complexity_score(&languages, info.size);
        app_log!(
            info,
            "Scored {}/{}: {} languages, {} KB, complexity {}",
            owner,
            repo,
            languages.len(),
            info.size,
            score
        );

        Ok(GithubAnalysis {
            languages,
            stars: info.stargazers_count,
            complexity_score: score,
        })
    }

    async fn get_json<R: DeserializeOwned>(&self, url: &str) -> Result<R, MatchError> {
        app_log!(trace, "GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            app_log!(error, "GitHub request failed: {}", e);
            MatchError::UpstreamUnavailable(format!("GitHub request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            app_log!(warn, "GitHub returned {} for {}: {}", status, url, body);
            return Err(MatchError::UpstreamUnavailable(format!(
                "GitHub API returned status {}",
                status
            )));
        }

        response.json::<R>().await.map_err(|e| {
            MatchError::UpstreamUnavailable(format!("Failed to parse GitHub response: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_score() {
        let mut languages = BTreeMap::new();
        languages.insert("Python".to_string(), 100);
        languages.insert("JS".to_string(), 50);
        assert_eq!(complexity_score(&languages, 42), 62);
        assert_eq!(complexity_score(&BTreeMap::new(), 0), 0);
    }

    #[test]
    fn test_parse_repo_url() {
        assert_eq!(
            parse_repo_url("https://github.com/rust-lang/cargo").unwrap(),
            ("rust-lang".to_string(), "cargo".to_string())
        );
        assert_eq!(
            parse_repo_url("https://github.com/rust-lang/cargo/tree/master/src").unwrap(),
            ("rust-lang".to_string(), "cargo".to_string())
        );
        assert_eq!(
            parse_repo_url("github.com/owner/repo.git").unwrap(),
            ("owner".to_string(), "repo".to_string())
        );
    }

    #[test]
    fn test_parse_repo_url_rejects_other_urls() {
        for url in ["", "https://gitlab.com/owner/repo", "https://github.com/owner", "not a url"] {
            let err = parse_repo_url(url).unwrap_err();
            assert_eq!(err, MatchError::InvalidInput("Invalid GitHub URL".to_string()));
        }
    }

    #[tokio::test]
    async fn test_invalid_url_makes_no_request() {
        // Nothing listens on port 9; a request would surface as UpstreamUnavailable.
        let scorer = GithubScorer::new("http://127.0.0.1:9", 1).unwrap();
        let err = scorer.analyze("https://example.com/owner/repo").await.unwrap_err();
        assert_eq!(err.message(), "Invalid GitHub URL");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_reported() {
        let scorer = GithubScorer::new("http://127.0.0.1:9", 1).unwrap();
        let err = scorer
            .analyze("https://github.com/owner/repo")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_UNAVAILABLE");
    }
}

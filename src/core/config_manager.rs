// src/core/config_manager.rs
//! Configuration: built-in defaults, then `config.yaml`, then environment variables.

use crate::app_log;
use crate::github::DEFAULT_API_URL;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: EnvironmentConfig,
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    pub name: String,
    pub model_path: PathBuf,
    pub templates_path: PathBuf,
    pub log_file: PathBuf,
    pub require_model: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub github_api_url: String,
    pub timeout_seconds: u64,
}

/// One environment section of `config.yaml`; every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigSection {
    model_path: Option<PathBuf>,
    templates_path: Option<PathBuf>,
    log_file: Option<PathBuf>,
    require_model: Option<bool>,
    github_api_url: Option<String>,
    github_timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: ConfigSection,
    #[serde(default)]
    production: ConfigSection,
}

impl ConfigManager {
    /// Load configuration for the current environment from the working directory.
    pub fn load() -> Result<Self> {
        let environment = Self::environment_name();
        app_log!(info, "Loading configuration for environment: {}", environment);

        let base_dir = std::env::current_dir().context("Failed to get current directory")?;
        let config_path = base_dir.join("config.yaml");
        let section = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .context("Failed to read config.yaml")?;
            Self::section_from_yaml(&content, &environment)?
        } else {
            ConfigSection::default()
        };

        let mut config = Self::from_section(&environment, section, &base_dir);
        config.apply_env_overrides(&base_dir)?;
        Ok(config)
    }

    fn environment_name() -> String {
        std::env::var("SKILLLENS_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn section_from_yaml(content: &str, environment: &str) -> Result<ConfigSection> {
        let file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse config.yaml")?;
        Ok(match environment {
            "production" => file.production,
            _ => file.local,
        })
    }

    fn from_section(environment: &str, section: ConfigSection, base_dir: &Path) -> Self {
        let default_root = if environment == "production" {
            PathBuf::from("/app")
        } else {
            base_dir.to_path_buf()
        };

        Self {
            environment: EnvironmentConfig {
                name: environment.to_string(),
                model_path: resolve_path(
                    base_dir,
                    section
                        .model_path
                        .unwrap_or_else(|| default_root.join("model.msgpack")),
                ),
                templates_path: resolve_path(
                    base_dir,
                    section
                        .templates_path
                        .unwrap_or_else(|| default_root.join("templates")),
                ),
                log_file: resolve_path(
                    base_dir,
                    section
                        .log_file
                        .unwrap_or_else(|| PathBuf::from("/tmp/skilllens.log")),
                ),
                require_model: section.require_model.unwrap_or(true),
            },
            service: ServiceConfig {
                github_api_url: section
                    .github_api_url
                    .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                timeout_seconds: section.github_timeout_seconds.unwrap_or(10),
            },
        }
    }

    fn apply_env_overrides(&mut self, base_dir: &Path) -> Result<()> {
        if let Ok(path) = std::env::var("SKILLLENS_MODEL_PATH") {
            self.environment.model_path = resolve_path(base_dir, PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("SKILLLENS_TEMPLATES_DIR") {
            self.environment.templates_path = resolve_path(base_dir, PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("SKILLLENS_LOG_FILE") {
            self.environment.log_file = resolve_path(base_dir, PathBuf::from(path));
        }
        if let Ok(value) = std::env::var("SKILLLENS_REQUIRE_MODEL") {
            self.environment.require_model = value
                .parse()
                .map_err(|_| anyhow::anyhow!("SKILLLENS_REQUIRE_MODEL must be true or false"))?;
        }
        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            self.service.github_api_url = url;
        }
        if let Ok(value) = std::env::var("GITHUB_TIMEOUT_SECS") {
            self.service.timeout_seconds = value
                .parse()
                .map_err(|_| anyhow::anyhow!("GITHUB_TIMEOUT_SECS must be a number of seconds"))?;
        }
        Ok(())
    }
}

fn resolve_path(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

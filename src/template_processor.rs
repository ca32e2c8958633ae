// src/template_processor.rs
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct TemplateProcessor {
    templates_dir: PathBuf,
}

impl TemplateProcessor {
    pub fn new(templates_dir: PathBuf) -> Self {
        Self { templates_dir }
    }

    /// Replace every `{{key}}` with its value.
    pub fn process_variables(content: &str, vars: &HashMap<String, String>) -> String {
        vars.iter().fold(content.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{{{}}}}}", key), value)
        })
    }

    pub fn page_path(&self, name: &str) -> PathBuf {
        self.templates_dir.join(name)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.page_path(name).is_file()
    }

    pub async fn render(&self, name: &str, vars: &HashMap<String, String>) -> Result<String> {
        let path = self.page_path(name);
        let content = read_template(&path).await?;
        Ok(Self::process_variables(&content, vars))
    }
}

async fn read_template(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read template: {}", path.display()))
}

use anyhow::Result;
use skill_matcher::app_log;
use skill_matcher::core::{init_logging, ConfigManager};
use skill_matcher::start_web_server;

#[rocket::main]
async fn main() -> Result<()> {
    let config = ConfigManager::load()?;

    // Initialize logging first
    init_logging(&config.environment.log_file)?;

    app_log!(info, "Environment: {}", config.environment.name);
    app_log!(info, "Model: {}", config.environment.model_path.display());
    app_log!(info, "Log file: {}", config.environment.log_file.display());

    start_web_server(config).await
}

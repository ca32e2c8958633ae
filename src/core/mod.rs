// src/core/mod.rs
//! Process-wide services shared by the server and the trainer

pub mod config_manager;
pub mod logging;

pub use config_manager::ConfigManager;
pub use logging::init_logging;

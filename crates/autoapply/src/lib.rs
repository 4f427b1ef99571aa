pub mod api;
pub mod bots;
pub mod config;
pub mod driver;
pub mod metrics;
pub mod overlay;
pub mod workflow;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Workflow config not found at {}: {source}", .path.display())]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse workflow config {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },
    #[error("Step '{0}' not found in configuration")]
    UnknownState(String),
    #[error("Function '{function}' for step '{state}' is not registered")]
    UnregisteredFunction { state: String, function: String },
    #[error("Step '{state}' failed: {source}")]
    Step {
        state: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Bot '{name}' not found. Available bots: {available}")]
    BotNotFound { name: String, available: String },
    #[error("Bot '{name}' setup failed: {source}")]
    BotSetup {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("API error: {0}")]
    Api(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

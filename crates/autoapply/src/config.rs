use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::workflow::{EngineSettings, DEFAULT_MAX_STEPS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bots: BotsConfig,
    pub engine: EngineConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotsConfig {
    /// Directory holding one sub-directory per bot
    pub dir: PathBuf,
    /// Leave the browser running once the workflow stops
    pub keep_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub max_steps: u32,
    pub step_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub session_token: Option<String>,
}

impl EngineConfig {
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            max_steps: self.max_steps,
            step_delay: Duration::from_millis(self.step_delay_ms),
        }
    }
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Config {
            bots: BotsConfig {
                dir: std::env::var("AUTOAPPLY_BOTS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("bots")),
                keep_open: parse_env("AUTOAPPLY_KEEP_OPEN", true)?,
            },
            engine: EngineConfig {
                max_steps: parse_env("AUTOAPPLY_MAX_STEPS", DEFAULT_MAX_STEPS)?,
                step_delay_ms: parse_env("AUTOAPPLY_STEP_DELAY_MS", 100)?,
            },
            api: ApiConfig {
                base_url: std::env::var("API_BASE")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                session_token: std::env::var("SESSION_TOKEN")
                    .ok()
                    .filter(|token| !token.trim().is_empty()),
            },
        };

        if config.engine.max_steps == 0 {
            return Err(crate::Error::Config(
                "AUTOAPPLY_MAX_STEPS must be greater than zero".to_string(),
            ));
        }

        if config.api.session_token.is_none() {
            tracing::debug!("SESSION_TOKEN is not set. API calls will proceed without authentication.");
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> crate::Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| crate::Error::Config(format!("{} has an invalid value: '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bots: BotsConfig {
                dir: PathBuf::from("bots"),
                keep_open: true,
            },
            engine: EngineConfig {
                max_steps: DEFAULT_MAX_STEPS,
                step_delay_ms: 100,
            },
            api: ApiConfig {
                base_url: "http://localhost:3000".to_string(),
                session_token: None,
            },
        }
    }
}

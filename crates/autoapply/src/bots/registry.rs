use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::{Error, Result};

/// Files a bot directory must hold, relative to `<bots_dir>/<name>/`.
#[derive(Debug, Clone, PartialEq)]
pub struct BotInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub workflow_path: PathBuf,
    pub selectors_path: PathBuf,
    pub config_path: PathBuf,
}

impl BotInfo {
    fn new(name: &str, bot_path: &Path) -> Self {
        let display_name = display_name(name);
        Self {
            name: name.to_string(),
            description: format!("Automation bot for {}", display_name),
            display_name,
            workflow_path: bot_path.join(format!("{}_steps.yaml", name)),
            selectors_path: bot_path.join(format!("{}_selectors.json", name)),
            config_path: bot_path.join(format!("{}_config.json", name)),
        }
    }
}

fn display_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Discovers bots laid out on disk.
#[derive(Debug, Clone)]
pub struct BotRegistry {
    bots_dir: PathBuf,
    discovered: BTreeMap<String, BotInfo>,
}

impl BotRegistry {
    pub fn new(bots_dir: impl Into<PathBuf>) -> Self {
        Self {
            bots_dir: bots_dir.into(),
            discovered: BTreeMap::new(),
        }
    }

    pub fn bots_dir(&self) -> &Path {
        &self.bots_dir
    }

    /// Scan the bots directory. Hidden directories and `core` are skipped, as are
    /// directories missing a workflow or selectors file.
    pub fn discover(&mut self) -> Vec<String> {
        self.discovered.clear();

        let entries = match std::fs::read_dir(&self.bots_dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Error discovering bots in {}: {}", self.bots_dir.display(), e);
                return Vec::new();
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
                continue;
            };
            if name.starts_with('.') || name == "core" {
                continue;
            }

            let info = BotInfo::new(&name, &path);
            if validate_structure(&info) {
                self.discovered.insert(name, info);
            }
        }

        let names = self.bot_names();
        info!("Discovered bots: {}", names.join(", "));
        names
    }

    pub fn bot_exists(&self, name: &str) -> bool {
        self.discovered.contains_key(name)
    }

    pub fn bot_info(&self, name: &str) -> Option<&BotInfo> {
        self.discovered.get(name)
    }

    pub fn bots(&self) -> impl Iterator<Item = &BotInfo> {
        self.discovered.values()
    }

    pub fn bot_names(&self) -> Vec<String> {
        self.discovered.keys().cloned().collect()
    }

    fn require(&self, name: &str) -> Result<&BotInfo> {
        self.discovered.get(name).ok_or_else(|| Error::BotNotFound {
            name: name.to_string(),
            available: self.bot_names().join(", "),
        })
    }

    /// Bot defaults. A bot without a config file gets an empty object.
    pub fn load_config(&self, name: &str) -> Result<Value> {
        let info = self.require(name)?;
        if !info.config_path.exists() {
            warn!("Configuration file not found for '{}', using defaults", name);
            return Ok(Value::Object(Default::default()));
        }
        let content = std::fs::read_to_string(&info.config_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_selectors(&self, name: &str) -> Result<Value> {
        let info = self.require(name)?;
        let content = std::fs::read_to_string(&info.selectors_path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn validate_structure(info: &BotInfo) -> bool {
    for required in [&info.workflow_path, &info.selectors_path] {
        if !required.exists() {
            warn!(
                "Bot '{}' missing required file: {}",
                info.name,
                required.display()
            );
            return false;
        }
    }
    true
}

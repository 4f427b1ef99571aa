use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    bots::BotRegistry,
    workflow::{EngineSettings, ExecutionContext, HaltReason, WorkflowEngine},
    Error, Result,
};

/// Site implementation of a bot: the step functions its workflow refers to.
#[async_trait]
pub trait BotPlugin: Send + Sync {
    /// Directory name of the bot this plugin implements
    fn name(&self) -> &str;

    fn register(&self, engine: &mut WorkflowEngine);

    /// Runs after the context is seeded and before the workflow starts.
    async fn prepare(&self, _ctx: &mut ExecutionContext) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct BotRunOptions {
    pub bot_name: String,
    /// User overrides, shallow-merged over the bot's own config
    pub config: Value,
    pub keep_open: bool,
}

impl BotRunOptions {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            config: Value::Null,
            keep_open: true,
        }
    }
}

pub struct BotStarter {
    registry: BotRegistry,
    plugins: HashMap<String, Arc<dyn BotPlugin>>,
    settings: EngineSettings,
}

impl BotStarter {
    pub fn new(registry: BotRegistry) -> Self {
        Self {
            registry,
            plugins: HashMap::new(),
            settings: EngineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn add_plugin(&mut self, plugin: impl BotPlugin + 'static) {
        self.plugins.insert(plugin.name().to_string(), Arc::new(plugin));
    }

    pub fn available_bots(&mut self) -> Vec<String> {
        self.registry.discover()
    }

    pub fn validate_bot(&mut self, bot_name: &str) -> bool {
        self.registry.discover();
        self.registry.bot_exists(bot_name)
    }

    /// Discover the bot, build its engine, run the workflow and clean up the browser.
    pub async fn run_bot(&mut self, options: BotRunOptions) -> Result<HaltReason> {
        let bot_name = options.bot_name.as_str();
        info!("Starting bot runner for: {}", bot_name);

        self.registry.discover();
        let info = self
            .registry
            .bot_info(bot_name)
            .cloned()
            .ok_or_else(|| Error::BotNotFound {
                name: bot_name.to_string(),
                available: self.registry.bot_names().join(", "),
            })?;
        let plugin = self.plugins.get(bot_name).cloned().ok_or_else(|| {
            Error::Config(format!("No step functions registered for bot '{}'", bot_name))
        })?;
        info!("Bot validated: {}", info.display_name);

        let bot_config = self.registry.load_config(bot_name)?;
        let selectors = self.registry.load_selectors(bot_name)?;

        let mut engine = WorkflowEngine::from_path(&info.workflow_path)?.with_settings(self.settings);
        plugin.register(&mut engine);

        engine.set_context("config", merge_config(bot_config, options.config.clone()));
        engine.set_context("selectors", selectors);
        engine.set_context("bot_name", bot_name);

        plugin
            .prepare(engine.context_mut())
            .await
            .map_err(|source| Error::BotSetup {
                name: bot_name.to_string(),
                source,
            })?;

        info!("Executing workflow for {}...", bot_name);
        let result = engine.run().await;

        finish(engine.context(), options.keep_open).await;

        match &result {
            Ok(halt) => info!("Bot '{}' stopped: {}", bot_name, halt),
            Err(e) => warn!("Bot '{}' execution failed: {}", bot_name, e),
        }
        result
    }
}

/// User values win over bot defaults, key by key.
fn merge_config(defaults: Value, overrides: Value) -> Value {
    match (defaults, overrides) {
        (Value::Object(mut base), Value::Object(overrides)) => {
            base.extend(overrides);
            Value::Object(base)
        }
        (base, Value::Null) => base,
        (_, overrides) => overrides,
    }
}

async fn finish(ctx: &ExecutionContext, keep_open: bool) {
    let Some(driver) = &ctx.driver else {
        return;
    };

    if keep_open {
        info!("Workflow finished, browser will remain open");
        if let Some(dir) = ctx.get_str("sessions_dir") {
            info!("Session saved to: {}", dir);
        }
    } else {
        info!("Closing browser...");
        if let Err(e) = driver.quit().await {
            warn!("Failed to close browser: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overrides_win_key_by_key() {
        let merged = merge_config(
            json!({ "keywords": "developer", "max_applications": 10 }),
            json!({ "keywords": "rust engineer" }),
        );
        assert_eq!(
            merged,
            json!({ "keywords": "rust engineer", "max_applications": 10 })
        );
    }

    #[test]
    fn null_overrides_keep_defaults() {
        let merged = merge_config(json!({ "location": "Sydney" }), Value::Null);
        assert_eq!(merged, json!({ "location": "Sydney" }));
    }
}

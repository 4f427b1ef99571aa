use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{driver::Driver, overlay::StatusOverlay};

/// Shared state handed to every step function of one workflow run.
///
/// The driver and overlay handles are typed fields the engine knows about. Everything
/// site-specific (selectors, bot config, scraped jobs) lives in the open `values` map.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    /// Browser driver handle, set by whichever step launches the browser
    pub driver: Option<Arc<dyn Driver>>,

    /// Optional status overlay
    pub overlay: Option<Arc<dyn StatusOverlay>>,

    /// Named counters (applications submitted, pages visited, ...)
    pub counters: HashMap<String, i64>,

    values: HashMap<String, Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.values.get_mut(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Deserialize a stored value into a concrete type. Returns `None` when the key is
    /// absent or the value has a different shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn increment(&mut self, counter: &str) -> i64 {
        let entry = self.counters.entry(counter.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn counter(&self, counter: &str) -> i64 {
        self.counters.get(counter).copied().unwrap_or(0)
    }

    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// Snapshot of the open values and counters, logged when a run halts.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "values": self.values,
            "counters": self.counters,
            "has_driver": self.driver.is_some(),
            "has_overlay": self.overlay.is_some(),
        })
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("driver", &self.driver.is_some())
            .field("overlay", &self.overlay.is_some())
            .field("counters", &self.counters)
            .field("values", &self.values)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct SearchConfig {
        keywords: String,
        location: String,
    }

    #[test]
    fn set_and_get_values() {
        let mut ctx = ExecutionContext::new();
        ctx.set("keywords", "engineer");
        ctx.set("max_pages", 3);

        assert_eq!(ctx.get_str("keywords"), Some("engineer"));
        assert_eq!(ctx.get("max_pages"), Some(&json!(3)));
        assert!(ctx.contains("keywords"));
        assert!(!ctx.contains("missing"));

        assert_eq!(ctx.remove("keywords"), Some(json!("engineer")));
        assert!(ctx.get("keywords").is_none());
    }

    #[test]
    fn get_as_deserializes_structured_values() {
        let mut ctx = ExecutionContext::new();
        ctx.set("config", json!({ "keywords": "rust", "location": "Sydney" }));

        let config: SearchConfig = ctx.get_as("config").unwrap();
        assert_eq!(config.keywords, "rust");
        assert!(ctx.get_as::<SearchConfig>("missing").is_none());
        assert!(ctx.get_as::<u32>("config").is_none());
    }

    #[test]
    fn counters_start_at_zero() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(ctx.counter("applied"), 0);
        assert_eq!(ctx.increment("applied"), 1);
        assert_eq!(ctx.increment("applied"), 2);
        assert_eq!(ctx.counter("applied"), 2);
    }

    #[test]
    fn to_json_snapshot() {
        let mut ctx = ExecutionContext::new();
        ctx.set("bot_name", "seek");
        ctx.increment("pages");

        let snapshot = ctx.to_json();
        assert_eq!(snapshot["values"]["bot_name"], "seek");
        assert_eq!(snapshot["counters"]["pages"], 1);
        assert_eq!(snapshot["has_driver"], false);
    }
}

//! Browser driver capability set.
//!
//! The engine never drives the browser itself; it only stores the handle in the execution
//! context and hands it to the overlay. Site plugins supply the implementation (WebDriver,
//! CDP, ...).

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigate the current tab to `url`
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Run a script in the page and return its JSON result
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value>;

    async fn click(&self, selector: &str) -> Result<()>;

    async fn type_text(&self, selector: &str, text: &str) -> Result<()>;

    /// Handles of every open window/tab
    async fn window_handles(&self) -> Result<Vec<String>>;

    async fn quit(&self) -> Result<()>;

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

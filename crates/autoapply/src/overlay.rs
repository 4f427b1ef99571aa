//! Status overlay shown inside the automated browser.
//!
//! Overlay calls are best effort: the engine logs failures and carries on.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tera::{Context, Tera};

use crate::driver::Driver;

const PANEL_TEMPLATE: &str = r#"<div style="line-height: 1.6;">
  <p style="font-size: 20px; margin: 10px 0;"><strong>{{ heading }}</strong></p>
  {% for line in lines %}<p style="color: #00ff00; font-size: 16px;">{{ line }}</p>
  {% endfor %}
</div>"#;

const SHOW_SCRIPT: &str = r#"
return (function(title, html, draggable, collapsible) {
  var existing = document.getElementById('autoapply-status-overlay');
  if (existing) { existing.remove(); }
  var panel = document.createElement('div');
  panel.id = 'autoapply-status-overlay';
  panel.style.cssText = 'position:fixed;top:20px;right:20px;width:350px;z-index:999999;' +
    'background:rgba(0,0,0,0.85);color:#fff;padding:16px;border-radius:12px;' +
    'font-family:-apple-system,BlinkMacSystemFont,Segoe UI,Roboto,sans-serif;';
  panel.dataset.draggable = draggable;
  panel.dataset.collapsible = collapsible;
  panel.innerHTML = '<h3 id="autoapply-status-title"></h3><div id="autoapply-status-body"></div>';
  document.body.appendChild(panel);
  panel.querySelector('#autoapply-status-title').textContent = title;
  panel.querySelector('#autoapply-status-body').innerHTML = html;
  return true;
})(arguments[0], arguments[1], arguments[2], arguments[3]);
"#;

const UPDATE_SCRIPT: &str = r#"
return (function(title, html) {
  var panel = document.getElementById('autoapply-status-overlay');
  if (!panel) { return false; }
  panel.querySelector('#autoapply-status-title').textContent = title;
  panel.querySelector('#autoapply-status-body').innerHTML = html;
  return true;
})(arguments[0], arguments[1]);
"#;

const HIDE_SCRIPT: &str = r#"
var panel = document.getElementById('autoapply-status-overlay');
if (panel) { panel.remove(); }
return true;
"#;

/// Content of one overlay refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayUpdate {
    pub title: String,
    pub heading: String,
    pub lines: Vec<String>,
    pub draggable: bool,
    pub collapsible: bool,
}

impl OverlayUpdate {
    pub fn new(title: impl Into<String>, heading: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            heading: heading.into(),
            lines: Vec::new(),
            draggable: true,
            collapsible: true,
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn starting(description: &str) -> Self {
        Self::new("Bot Status: Starting", "Starting Workflow").line(description)
    }

    pub fn running(sequence_index: f64, function: &str, event: &str) -> Self {
        Self::new(
            "Bot Status: Running",
            format!("Step {}: {}", sequence_index, function),
        )
        .line(format!("→ {}", event))
    }

    pub fn finished(outcome: &str, steps: u32) -> Self {
        Self::new("Bot Status: Finished", "Workflow Finished")
            .line(outcome)
            .line(format!("Total steps: {}", steps))
    }
}

#[async_trait]
pub trait StatusOverlay: Send + Sync {
    async fn show(&self, update: &OverlayUpdate) -> Result<()>;

    async fn update(&self, update: &OverlayUpdate) -> Result<()>;

    async fn hide(&self) -> Result<()>;
}

/// Overlay injected into the page through the driver's script execution.
pub struct BrowserOverlay {
    driver: Arc<dyn Driver>,
    tera: Tera,
}

impl BrowserOverlay {
    pub fn new(driver: Arc<dyn Driver>) -> crate::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("panel.html", PANEL_TEMPLATE)?;
        Ok(Self { driver, tera })
    }

    /// Render the HTML body of the panel. Heading and lines are HTML-escaped.
    pub fn render_panel(&self, update: &OverlayUpdate) -> crate::Result<String> {
        let mut context = Context::new();
        context.insert("heading", &update.heading);
        context.insert("lines", &update.lines);
        Ok(self.tera.render("panel.html", &context)?)
    }
}

#[async_trait]
impl StatusOverlay for BrowserOverlay {
    async fn show(&self, update: &OverlayUpdate) -> Result<()> {
        let html = self.render_panel(update)?;
        self.driver
            .execute_script(
                SHOW_SCRIPT,
                vec![
                    json!(update.title),
                    json!(html),
                    json!(update.draggable),
                    json!(update.collapsible),
                ],
            )
            .await?;
        Ok(())
    }

    async fn update(&self, update: &OverlayUpdate) -> Result<()> {
        let html = self.render_panel(update)?;
        let updated = self
            .driver
            .execute_script(UPDATE_SCRIPT, vec![json!(update.title), json!(html)])
            .await?;

        // Page navigations wipe the panel, so recreate it
        if updated == json!(false) {
            self.show(update).await?;
        }
        Ok(())
    }

    async fn hide(&self) -> Result<()> {
        self.driver.execute_script(HIDE_SCRIPT, Vec::new()).await?;
        Ok(())
    }
}

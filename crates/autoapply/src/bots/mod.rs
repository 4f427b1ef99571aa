//! Bot discovery and orchestration.
//!
//! A bot is a directory holding a workflow (`<name>_steps.yaml`), page selectors
//! (`<name>_selectors.json`) and optional defaults (`<name>_config.json`), paired with a
//! [`BotPlugin`] that supplies the step functions.

pub mod registry;
pub mod starter;

pub use registry::{BotInfo, BotRegistry};
pub use starter::{BotPlugin, BotRunOptions, BotStarter};

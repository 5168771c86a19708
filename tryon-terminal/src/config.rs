//! TOML configuration for the terminal viewer

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tryon_core::ViewerConfig;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Frame rate target
    pub fps: u32,
    /// Dragged pixels per arrow-key press
    pub key_step: f32,
    /// Slider increment per key press
    pub offset_step: f32,
    pub viewer: ViewerConfig,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            key_step: 10.0,
            offset_step: 0.05,
            viewer: ViewerConfig::default(),
        }
    }
}

impl TerminalConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("parse terminal config")
    }

    /// Defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("load config: {}", path.display()))
    }
}

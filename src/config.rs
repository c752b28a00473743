// Render options, optionally loaded from a JSON config file

use crate::template::Viewport;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Colors handed out by `useColor`; empty means the built-in palette.
    #[serde(default)]
    pub palette: Vec<String>,
    /// Extra names visible at the top level of every template.
    #[serde(default)]
    pub variables: IndexMap<String, serde_json::Value>,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            palette: Vec::new(),
            variables: IndexMap::new(),
        }
    }
}

impl RenderOptions {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn viewport(&self) -> Viewport {
        Viewport { width: f64::from(self.width), height: f64::from(self.height) }
    }
}

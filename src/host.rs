//! Services the embedding host provides to templates.

use crate::data::Row;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Callables the host exposes to the color and selection helpers.
pub trait HostServices: Send + Sync {
    /// Color assigned to `key`. Repeated keys must get the same color.
    fn color(&self, key: &str) -> String;

    /// Marker attribute that lets a rendered element select `row`.
    fn selection_attribute(&self, index: usize, _row: &Row) -> String {
        format!(r#"data-selection=true data-index="{}""#, index)
    }

    /// Marker attribute for an element that clears the selection.
    fn selection_clear_attribute(&self) -> String {
        r#"data-selection-clear="true""#.to_string()
    }
}

pub const DEFAULT_COLORS: [&str; 8] = [
    "#118DFF", "#12239E", "#E66C37", "#6B007B", "#E044A7", "#744EC2", "#D9B300", "#D64550",
];

/// Assigns palette colors to keys in first-seen order, cycling when exhausted.
#[derive(Debug)]
pub struct DefaultPalette {
    colors: Vec<String>,
    assigned: Mutex<HashMap<String, usize>>,
}

impl DefaultPalette {
    pub fn new(colors: Vec<String>) -> Self {
        let colors = if colors.is_empty() {
            DEFAULT_COLORS.iter().map(|c| c.to_string()).collect()
        } else {
            colors
        };
        Self { colors, assigned: Mutex::new(HashMap::new()) }
    }
}

impl Default for DefaultPalette {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl HostServices for DefaultPalette {
    fn color(&self, key: &str) -> String {
        let mut assigned = self.assigned.lock().unwrap_or_else(PoisonError::into_inner);
        let next = assigned.len();
        let slot = *assigned.entry(key.to_string()).or_insert(next);
        self.colors[slot % self.colors.len()].clone()
    }
}

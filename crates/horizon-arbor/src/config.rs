//! Tree configuration.
//!
//! [`TreeConfig`] can be built in code with the builder methods or loaded
//! from TOML. Missing keys take their default values:
//!
//! ```
//! use horizon_arbor::TreeConfig;
//!
//! let config = TreeConfig::from_toml_str("row_height = 32.0\nexpand_delay_ms = 500").unwrap();
//! assert_eq!(config.row_height, 32.0);
//! assert_eq!(config.highlight_delay_ms, 1000);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::MAX_LEVEL;

/// Behavior and metrics of a tree view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Height of every visible row.
    pub row_height: f32,
    /// Deepest level a node may occupy.
    pub max_level: i32,
    /// Hover time before a row becomes the drop-into target.
    pub highlight_delay_ms: u64,
    /// Time a collapsed folder stays highlighted before it auto-expands.
    pub expand_delay_ms: u64,
    /// Border drawn around the focused row.
    pub focused_border_width: f32,
    /// Title given to nodes created with `add()`.
    pub default_node_title: String,
    /// Icon given to nodes created with `add()`.
    pub default_node_icon: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            row_height: 48.0,
            max_level: MAX_LEVEL,
            highlight_delay_ms: 1000,
            expand_delay_ms: 2000,
            focused_border_width: 2.0,
            default_node_title: "New folder".to_string(),
            default_node_icon: "folder".to_string(),
        }
    }
}

impl TreeConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from TOML.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Set the row height.
    pub fn row_height(mut self, height: f32) -> Self {
        self.row_height = height;
        self
    }

    /// Set the nesting limit.
    pub fn max_level(mut self, level: i32) -> Self {
        self.max_level = level;
        self
    }

    /// Set the highlight delay.
    pub fn highlight_delay(mut self, delay: Duration) -> Self {
        self.highlight_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the auto-expand delay.
    pub fn expand_delay(mut self, delay: Duration) -> Self {
        self.expand_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the focused border width.
    pub fn focused_border_width(mut self, width: f32) -> Self {
        self.focused_border_width = width;
        self
    }

    /// Set the title and icon of nodes created with `add()`.
    pub fn default_node(mut self, title: impl Into<String>, icon: impl Into<String>) -> Self {
        self.default_node_title = title.into();
        self.default_node_icon = icon.into();
        self
    }

    pub fn highlight_delay_duration(&self) -> Duration {
        Duration::from_millis(self.highlight_delay_ms)
    }

    pub fn expand_delay_duration(&self) -> Duration {
        Duration::from_millis(self.expand_delay_ms)
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Home-level preferences (`$XDG_CONFIG_HOME/hangar/config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default workspace root when no flag or env var is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_check: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Quiet period before a debounced refresh runs
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// How long a refresh may run before the loading marker shows
    #[serde(default = "default_load_indicator_ms")]
    pub load_indicator_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Color overrides by theme slot, as "#RRGGBB"
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            debounce_ms: default_debounce_ms(),
            load_indicator_ms: default_load_indicator_ms(),
            log_level: default_log_level(),
            colors: BTreeMap::new(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    150
}

fn default_load_indicator_ms() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which TUI pane has focus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pane {
    #[default]
    Topics,
    Workspaces,
}

/// Per-root preferences (`<root>/.hangar/config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_topic: Option<String>,
    #[serde(default)]
    pub last_pane: Pane,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ui_table_uses_defaults() {
        let config: GlobalConfig = toml::from_str("root = \"/srv/work\"\n").unwrap();
        assert_eq!(config.root.as_deref(), Some("/srv/work"));
        assert_eq!(config.ui.debounce_ms, 150);
        assert_eq!(config.ui.load_indicator_ms, 300);
        assert_eq!(config.ui.log_level, "info");
    }

    #[test]
    fn partial_ui_table() {
        let config: GlobalConfig = toml::from_str("[ui]\ndebounce_ms = 40\n").unwrap();
        assert_eq!(config.ui.debounce_ms, 40);
        assert_eq!(config.ui.load_indicator_ms, 300);
    }

    #[test]
    fn local_config_pane() {
        let config: LocalConfig =
            toml::from_str("last_topic = \"alpha\"\nlast_pane = \"workspaces\"\n").unwrap();
        assert_eq!(config.last_topic.as_deref(), Some("alpha"));
        assert_eq!(config.last_pane, Pane::Workspaces);
    }
}

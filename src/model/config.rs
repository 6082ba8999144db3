use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from `.ai/taskmagic.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Default: on
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Quiet period after the last file event before reloading
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            enabled: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    300
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// One of `priority`, `id`, `status`, `title`
    #[serde(default = "default_sort")]
    pub default_sort: String,
    /// `all` or a task status
    #[serde(default = "default_filter")]
    pub default_filter: String,
    /// Theme slot overrides, e.g. `highlight = "#FB4196"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            default_sort: default_sort(),
            default_filter: default_filter(),
            colors: HashMap::new(),
        }
    }
}

fn default_sort() -> String {
    "priority".to_string()
}

fn default_filter() -> String {
    "all".to_string()
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Which backend implementation serves auth and todos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// JSON file in the app home; no network
    #[default]
    Local,
    /// Hosted Supabase project
    Supabase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Project URL, e.g. `https://abcd.supabase.co`
    #[serde(default)]
    pub url: Option<String>,
    /// Public anon key sent as the `apikey` header
    #[serde(default)]
    pub anon_key: Option<String>,
    /// Data file for the local backend, relative to the app home.
    /// Default: see src/templates/config.toml
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            backend: Backend::default(),
            url: None,
            anon_key: None,
            data_file: default_data_file(),
        }
    }
}

fn default_data_file() -> String {
    "local-db.json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Points per terminal column when converting mouse motion to drag distance
    #[serde(default = "default_cell_width")]
    pub cell_width: f32,
    /// Points per terminal row
    #[serde(default = "default_cell_height")]
    pub cell_height: f32,
    /// Color overrides, e.g. `highlight = "#FB4196"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
            colors: HashMap::new(),
        }
    }
}

/// Default: see src/templates/config.toml
fn default_cell_width() -> f32 {
    8.0
}

/// Default: see src/templates/config.toml
fn default_cell_height() -> f32 {
    16.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive, overridden by `TDB_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

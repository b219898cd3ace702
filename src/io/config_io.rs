use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::AppConfig;

/// File name of the configuration inside the app home
pub const CONFIG_FILE: &str = "config.toml";
/// Commented template written by `tdb init`
pub const CONFIG_TEMPLATE: &str = include_str!("../templates/config.toml");

/// Error type for configuration I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("invalid config key '{0}'")]
    InvalidKey(String),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Resolve the app home: explicit override, then `$TDB_HOME`, then
/// `$HOME/.todo-board`, then `./.todo-board`.
pub fn resolve_home(override_dir: Option<&str>) -> PathBuf {
    if let Some(dir) = override_dir {
        return PathBuf::from(dir);
    }
    if let Some(dir) = std::env::var_os("TDB_HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    match std::env::var_os("HOME").filter(|d| !d.is_empty()) {
        Some(home) => PathBuf::from(home).join(".todo-board"),
        None => PathBuf::from(".todo-board"),
    }
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing. A missing file yields
/// the defaults and an empty document.
pub fn read_config(home: &Path) -> Result<(AppConfig, toml_edit::DocumentMut), ConfigError> {
    let config_path = home.join(CONFIG_FILE);
    let config_text = match fs::read_to_string(&config_path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: config_path,
                source: e,
            });
        }
    };
    let config: AppConfig = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Load just the parsed config
pub fn load_config(home: &Path) -> Result<AppConfig, ConfigError> {
    read_config(home).map(|(config, _)| config)
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(home: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    fs::create_dir_all(home)?;
    let config_path = home.join(CONFIG_FILE);
    fs::write(&config_path, doc.to_string()).map_err(|e| ConfigError::ReadError {
        path: config_path,
        source: e,
    })?;
    Ok(())
}

/// Set a dotted key such as `service.url` or `ui.cell_width`.
///
/// `raw` is taken as a TOML literal when it parses as one (`8.0`, `true`,
/// `"quoted"`), otherwise as a plain string. The edited document must
/// still deserialize into [`AppConfig`].
pub fn set_config_value(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    raw: &str,
) -> Result<(), ConfigError> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::InvalidKey(key.to_string()));
    }
    let value = raw
        .parse::<toml_edit::Value>()
        .unwrap_or_else(|_| toml_edit::Value::from(raw));

    let (leaf, tables) = parts.split_last().ok_or_else(|| ConfigError::InvalidKey(key.to_string()))?;
    let mut table = doc.as_table_mut();
    for name in tables {
        if !table.contains_key(name) {
            let mut t = toml_edit::Table::new();
            t.set_implicit(false);
            table.insert(name, toml_edit::Item::Table(t));
        }
        table = table[*name]
            .as_table_mut()
            .ok_or_else(|| ConfigError::InvalidKey(key.to_string()))?;
    }
    table[*leaf] = toml_edit::Item::Value(value);

    toml::from_str::<AppConfig>(&doc.to_string())?;
    Ok(())
}

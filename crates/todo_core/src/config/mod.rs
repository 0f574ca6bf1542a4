use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TODOAPP_CONFIG_PATH";

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_API_ROOT: &str = "/api/todos";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1_000_000;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub api_root: Option<String>,
    #[serde(default)]
    pub max_body_bytes: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

/// Values that take precedence over the config file, e.g. from the command line.
pub type ConfigOverrides = Config;

/// Fully resolved settings for the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
    pub api_root: String,
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            api_root: DEFAULT_API_ROOT.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerSettings {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let defaults = Self::default();
        let api_root = match config.api_root.as_deref() {
            Some(root) => normalize_api_root(root)?,
            None => defaults.api_root,
        };
        let max_body_bytes = config.max_body_bytes.unwrap_or(defaults.max_body_bytes);
        if max_body_bytes == 0 {
            return Err(AppError::invalid_input("max_body_bytes must be positive"));
        }

        Ok(Self {
            bind: config
                .bind
                .as_deref()
                .map(str::trim)
                .filter(|bind| !bind.is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.bind),
            port: config.port.unwrap_or(defaults.port),
            api_root,
            max_body_bytes,
        })
    }

    pub fn socket_addr(&self) -> String {
        if self.bind.contains(':') && !self.bind.starts_with('[') {
            format!("[{}]:{}", self.bind, self.port)
        } else {
            format!("{}:{}", self.bind, self.port)
        }
    }
}

pub fn normalize_api_root(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !trimmed.starts_with('/') {
        return Err(AppError::invalid_input(format!(
            "api_root '{raw}' must start with '/' and name a path"
        )));
    }
    if trimmed.contains(':') || trimmed.contains('*') {
        return Err(AppError::invalid_input(format!(
            "api_root '{raw}' must not contain ':' or '*'"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("todoapp")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("todoapp")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    Config {
        store_path: overrides
            .store_path
            .clone()
            .or_else(|| base.store_path.clone()),
        bind: overrides.bind.clone().or_else(|| base.bind.clone()),
        port: overrides.port.or(base.port),
        api_root: overrides.api_root.clone().or_else(|| base.api_root.clone()),
        max_body_bytes: overrides.max_body_bytes.or(base.max_body_bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, ServerSettings, load_config_from_path,
        load_config_with_fallback_from_path, merge_overrides, normalize_api_root,
    };
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let temp = TempDir::new().unwrap();
        let result = load_config_with_fallback_from_path(&temp.path().join("missing.json"));

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.unwrap().code(), "invalid_data");
    }

    #[test]
    fn load_config_reads_valid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("valid-config.json");
        let content = serde_json::json!({
            "store_path": "/var/lib/todoapp/todos.json",
            "port": 3000,
            "api_root": "/todos"
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();

        assert_eq!(
            loaded.store_path,
            Some(PathBuf::from("/var/lib/todoapp/todos.json"))
        );
        assert_eq!(loaded.port, Some(3000));
        assert_eq!(loaded.api_root.as_deref(), Some("/todos"));
        assert_eq!(loaded.bind, None);
    }

    #[test]
    fn merge_overrides_prefers_override_values() {
        let base = Config {
            port: Some(3000),
            bind: Some("0.0.0.0".into()),
            ..Config::default()
        };
        let overrides = ConfigOverrides {
            port: Some(8080),
            max_body_bytes: Some(2048),
            ..ConfigOverrides::default()
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(merged.port, Some(8080));
        assert_eq!(merged.bind.as_deref(), Some("0.0.0.0"));
        assert_eq!(merged.max_body_bytes, Some(2048));
        assert_eq!(base.port, Some(3000));
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config {
            api_root: Some("/todos".into()),
            ..Config::default()
        };

        assert_eq!(merge_overrides(&base, &ConfigOverrides::default()), base);
    }

    #[test]
    fn server_settings_fill_defaults() {
        let settings = ServerSettings::from_config(&Config::default()).unwrap();

        assert_eq!(settings, ServerSettings::default());
        assert_eq!(settings.socket_addr(), "127.0.0.1:9000");
        assert_eq!(settings.api_root, "/api/todos");
        assert_eq!(settings.max_body_bytes, 1_000_000);
    }

    #[test]
    fn server_settings_bracket_ipv6_binds() {
        let config = Config {
            bind: Some("::1".into()),
            port: Some(8080),
            ..Config::default()
        };
        let settings = ServerSettings::from_config(&config).unwrap();
        assert_eq!(settings.socket_addr(), "[::1]:8080");
    }

    #[test]
    fn server_settings_reject_zero_body_limit() {
        let config = Config {
            max_body_bytes: Some(0),
            ..Config::default()
        };
        let err = ServerSettings::from_config(&config).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn api_root_is_normalized() {
        assert_eq!(normalize_api_root(" /todos/ ").unwrap(), "/todos");
        assert_eq!(normalize_api_root("/api/todos").unwrap(), "/api/todos");
        assert!(normalize_api_root("todos").is_err());
        assert!(normalize_api_root("/").is_err());
        assert!(normalize_api_root("/todos/:id").is_err());
    }
}

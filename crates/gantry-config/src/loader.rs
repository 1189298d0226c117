//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! defaults, files, `.env` and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{ConfigError, GantryConfig, LogFormat};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones key by key:
/// 1. Default values (or a preset)
/// 2. Configuration files and strings (TOML or JSON), in call order
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use gantry_config::ConfigLoader;
///
/// # fn main() -> Result<(), gantry_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("gantry.toml")?
///     .with_dotenv()?
///     .with_env_prefix("GANTRY")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: GantryConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GantryConfig::default(),
            env_prefix: None,
        }
    }

    /// Reset to default configuration values.
    ///
    /// This is what `new()` starts from, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = GantryConfig::default();
        self
    }

    /// Reset to the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use gantry_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = GantryConfig::development();
        self
    }

    /// Reset to the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = GantryConfig::production();
        self
    }

    /// Layer a configuration file on top.
    ///
    /// The format is taken from the extension (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.with_string(&content, format)
    }

    /// Layer a configuration file on top if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Layer configuration content on top.
    ///
    /// `format` is `"toml"` or `"json"`, case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the content has unknown
    /// fields.
    ///
    /// # Example
    ///
    /// ```
    /// use gantry_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [server]
    ///     http_port = 8081
    ///     rpc_port = 9001
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.http_port, 8081);
    /// assert_eq!(config.server.shutdown_timeout_secs, 10);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => serde_json::to_value(toml::from_str::<toml::Table>(content)?)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        let mut merged = serde_json::to_value(&self.config)?;
        merge(&mut merged, layer);
        self.config = serde_json::from_value(merged)?;

        Ok(self)
    }

    /// Load a `.env` file from the current directory or its parents into the
    /// process environment.
    ///
    /// A missing file is not an error. Variables already set are kept.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`.
    /// For example, with prefix "GANTRY":
    /// - `GANTRY__SERVER__HTTP_PORT=8081`
    /// - `GANTRY__LOGGING__LEVEL=debug`
    /// - `GANTRY__DATABASE__URL=postgres://localhost/app`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable cannot be parsed or
    /// validation fails.
    ///
    /// # Example
    ///
    /// ```
    /// use gantry_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().load().unwrap();
    /// assert_eq!(config.server.http_port, 8080);
    /// ```
    pub fn load(self) -> Result<GantryConfig, ConfigError> {
        let config = self.load_unvalidated_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Finalize without validation or environment overrides.
    #[must_use]
    pub fn load_unvalidated(self) -> GantryConfig {
        self.config
    }

    fn load_unvalidated_env(mut self) -> Result<GantryConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            for (key, value) in env::vars().filter(|(k, _)| k.starts_with(&marker)) {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }
        Ok(self.config)
    }

    // Apply a single environment variable
    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_PORT"] => config.server.http_port = parse_port(key, value)?,
            ["SERVER", "RPC_PORT"] => config.server.rpc_port = parse_port(key, value)?,
            ["SERVER", "BIND_HOST"] => config.server.bind_host = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["SERVER", "BOUNDED_RPC_DRAIN"] => {
                config.server.bounded_rpc_drain = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["SERVER", "DESCRIPTOR_PATH"] => config.server.descriptor_path = non_empty(value),
            ["SERVER", "DOCS_DIR"] => config.server.docs_dir = non_empty(value),

            ["LOGGING", "ENABLED"] => {
                config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI"] => {
                config.logging.ansi = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            ["DATABASE", "URL"] => config.database.url = non_empty(value),
            ["DATABASE", "MAX_CONNECTIONS"] => {
                config.database.max_connections = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["DATABASE", "MIN_CONNECTIONS"] => {
                config.database.min_connections = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["DATABASE", "ACQUIRE_TIMEOUT_SECS"] => {
                config.database.acquire_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }

            // Unknown keys are ignored so unrelated variables sharing the
            // prefix do not break startup.
            _ => {}
        }

        Ok(())
    }
}

/// Recursively overlays `layer` onto `base`.
fn merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected port number (0-65535)"))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

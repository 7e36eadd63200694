//! Configuration management
//!
//! Settings are resolved with the following precedence:
//! 1. Environment variables
//! 2. `tbm-gateway.toml` configuration file
//! 3. Built-in defaults
//!
//! Inside the config file, `${VAR_NAME}` expands to the value of the
//! corresponding environment variable.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the HTTP API server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins (e.g., ["http://localhost:3000"]).
    /// If unset or containing "*", CORS is permissive.
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,

    /// Debug mode (lowers the default log filter to debug)
    #[serde(default)]
    pub debug: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: None,
            debug: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Telegram Bot API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Base URL of the Bot API server.
    /// Override for tests or a self-hosted Bot API server.
    #[serde(default = "default_telegram_base_url")]
    pub base_url: String,

    /// Timeout applied to every outbound Bot API call, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            base_url: default_telegram_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Main configuration for tbm-gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,

    /// Telegram client configuration
    #[serde(default)]
    pub telegram: TelegramConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_telegram_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Expand `${VAR_NAME}` references with environment variable values.
    ///
    /// Unknown variables expand to the empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // consume '{'

                let mut var_name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '}' {
                        chars.next(); // consume '}'
                        break;
                    }
                    var_name.push(chars.next().unwrap());
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file.
    ///
    /// `${VAR_NAME}` references in the file are expanded before parsing,
    /// and environment variables override the parsed values.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let expanded_content = Self::expand_env_vars(&toml_content);

        let toml: TomlConfig = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        let mut cfg = Self::from_toml_config(toml);
        cfg.apply_env_overrides();

        Ok(cfg)
    }

    /// Load configuration from the default locations.
    ///
    /// Tries `./tbm-gateway.toml` first, otherwise falls back to
    /// environment variables only.
    pub fn load() -> crate::Result<Self> {
        if Path::new("tbm-gateway.toml").exists() {
            return Self::from_toml_file("tbm-gateway.toml");
        }

        Ok(Self::from_env())
    }

    /// Build a `Config` from the parsed TOML structure
    fn from_toml_config(toml: TomlConfig) -> Self {
        let api = toml.api.unwrap_or_default();
        let api_config = ApiConfig {
            host: api.host.unwrap_or_else(default_host),
            port: api.port.unwrap_or_else(default_port),
            allowed_origins: api.allowed_origins,
            debug: api.debug.unwrap_or(false),
        };

        let log = toml.log.unwrap_or_default();
        let log_config = LogConfig {
            level: log.level.unwrap_or_else(default_log_level),
        };

        let telegram = toml.telegram.unwrap_or_default();
        let telegram_config = TelegramConfig {
            base_url: telegram.base_url.unwrap_or_else(default_telegram_base_url),
            request_timeout_secs: telegram
                .request_timeout_secs
                .unwrap_or_else(default_request_timeout_secs),
        };

        Config {
            api: api_config,
            log: log_config,
            telegram: telegram_config,
        }
    }

    /// Override settings with environment variables
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("HOST") {
            if !host.is_empty() {
                self.api.host = host;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.api.allowed_origins =
                Some(origins.split(',').map(|s| s.trim().to_string()).collect());
        }
        if let Ok(debug) = std::env::var("DEBUG") {
            self.api.debug = debug.to_lowercase() == "true";
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            if !level.is_empty() {
                self.log.level = level.to_lowercase();
            }
        }

        if let Ok(url) = std::env::var("TELEGRAM_API_URL") {
            if !url.is_empty() {
                self.telegram.base_url = url;
            }
        }
        if let Ok(timeout) = std::env::var("TELEGRAM_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.telegram.request_timeout_secs = t;
            }
        }
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut cfg = Config::default();
        cfg.apply_env_overrides();
        cfg
    }
}

// ============================================================================
// TOML structures (file parsing)
// ============================================================================

/// Top-level structure of `tbm-gateway.toml`
#[derive(Debug, Deserialize)]
struct TomlConfig {
    api: Option<TomlApiConfig>,
    log: Option<TomlLogConfig>,
    telegram: Option<TomlTelegramConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlApiConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    allowed_origins: Option<Vec<String>>,
    #[serde(default)]
    debug: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlLogConfig {
    #[serde(default)]
    level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlTelegramConfig {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

//! Client configuration.
//!
//! Configuration can be loaded from:
//! - A TOML file (default: ~/.config/cerdas/client.toml) with a `[client]` table
//! - Environment variables (CERDAS_* prefixed)
//!
//! # Example
//!
//! ```rust,no_run
//! use cerdas_client::ClientConfig;
//!
//! // Load from default path or fall back to env vars
//! let config = ClientConfig::load().expect("Failed to load config");
//!
//! // Or explicitly from a file
//! let config = ClientConfig::from_file(std::path::Path::new("client.toml")).expect("Failed to load");
//!
//! // Or from environment variables
//! let config = ClientConfig::from_env();
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use cerdas_core::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for cerdas_core::Error {
    fn from(e: ConfigError) -> Self {
        cerdas_core::Error::Config(e.to_string())
    }
}

/// Settings for talking to the document backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the backend, e.g. `http://127.0.0.1:5000`.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Send the tunnel interstitial bypass header on every request.
    pub skip_tunnel_warning: bool,
    /// Where remembered preferences are kept. `None` uses the default path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::API_URL.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECS,
            skip_tunnel_warning: true,
            state_path: None,
        }
    }
}

impl ClientConfig {
    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        path.push(defaults::CONFIG_DIR_NAME);
        path.push(defaults::CONFIG_FILE_NAME);
        path
    }

    /// Default location of the preference file.
    pub fn default_state_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        path.push(defaults::CONFIG_DIR_NAME);
        path.push(defaults::STATE_FILE_NAME);
        path
    }

    /// The configured preference file, or the default one.
    pub fn resolved_state_path(&self) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(Self::default_state_path)
    }

    /// Load configuration from the default path, falling back to environment variables.
    pub fn load() -> ConfigResult<Self> {
        let path = Self::default_config_path();

        let config = if path.exists() {
            info!("Loading client config from: {}", path.display());
            Self::from_file(&path)?
        } else {
            debug!(
                "Config file not found at {}, using environment variables",
                path.display()
            );
            Self::from_env()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// `${VAR}` placeholders are replaced with environment values before parsing.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let content = Self::substitute_env_vars(&content);

        #[derive(Deserialize)]
        struct TomlRoot {
            #[serde(default)]
            client: ClientConfig,
        }

        let root: TomlRoot = toml::from_str(&content)?;
        Ok(root.client)
    }

    /// Load configuration from environment variables.
    ///
    /// - `CERDAS_API_URL`: backend base URL
    /// - `CERDAS_TIMEOUT`: request timeout in seconds
    /// - `CERDAS_SKIP_TUNNEL_WARNING`: `true`/`1` to send the bypass header
    /// - `CERDAS_STATE_PATH`: preference file location
    pub fn from_env() -> Self {
        let fallback = Self::default();
        Self {
            base_url: env::var("CERDAS_API_URL").unwrap_or(fallback.base_url),
            timeout_seconds: env::var("CERDAS_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(fallback.timeout_seconds),
            skip_tunnel_warning: env::var("CERDAS_SKIP_TUNNEL_WARNING")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(fallback.skip_tunnel_warning),
            state_path: env::var("CERDAS_STATE_PATH").ok().map(PathBuf::from),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "base_url cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "timeout_seconds must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    fn substitute_env_vars(content: &str) -> String {
        let Ok(re) = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") else {
            return content.to_string();
        };
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }
}

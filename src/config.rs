//! Configuration management for NYC 311 Fetcher
//!
//! Configuration comes from four sources, lowest precedence first:
//! built-in defaults, an optional TOML file, the process environment
//! (after `.env` has been loaded), and command-line flags. Everything that
//! touches the process environment lives here so the rest of the crate only
//! ever sees plain values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::ClientConfig;
use crate::constants::{download, env as env_constants, files, http};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Download loop settings
    pub download: DownloadConfigToml,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfigToml {
    /// User agent sent with every request
    pub user_agent: String,
    /// Connection establishment timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Timeout for the whole metadata request
    #[serde(with = "humantime_serde")]
    pub metadata_timeout: Duration,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            user_agent: http::USER_AGENT.to_string(),
            connect_timeout: http::CONNECT_TIMEOUT,
            metadata_timeout: http::METADATA_TIMEOUT,
        }
    }
}

/// TOML-friendly download configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadConfigToml {
    /// Bytes requested from the response body per read
    pub chunk_size: usize,
}

impl Default for DownloadConfigToml {
    fn default() -> Self {
        Self {
            chunk_size: download::DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime client configuration
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            user_agent: self.user_agent.clone(),
            connect_timeout: self.connect_timeout,
            metadata_timeout: self.metadata_timeout,
        }
    }
}

impl AppConfig {
    /// Load configuration from an explicit file or the default location
    ///
    /// An explicit path must exist. The default location is optional and
    /// silently skipped when absent.
    pub fn load(config_file_override: Option<&Path>) -> ConfigResult<Self> {
        match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                Self::load_from_file(path)
            }
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::load_from_file(&path),
                _ => {
                    debug!("No configuration file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Parse a TOML configuration file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        debug!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Default configuration file path in the platform config directory
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(files::CONFIG_DIR_NAME).join(files::CONFIG_FILE_NAME))
    }
}

/// Settings taken from the process environment
///
/// Empty values count as unset, matching how shells commonly clear a
/// variable with `VAR=`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnvSettings {
    /// Socrata application token
    pub app_token: Option<String>,
    /// Proxy for plain HTTP requests
    pub http_proxy: Option<String>,
    /// Proxy for HTTPS requests
    pub https_proxy: Option<String>,
}

impl std::fmt::Debug for EnvSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvSettings")
            .field("app_token", &self.app_token.as_ref().map(|_| "<redacted>"))
            .field("http_proxy", &self.http_proxy)
            .field("https_proxy", &self.https_proxy)
            .finish()
    }
}

impl EnvSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup function
    ///
    /// Proxy variables are looked up upper case first, then lower case.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let proxy = |key: &str| non_empty(key).or_else(|| non_empty(&key.to_ascii_lowercase()));

        Self {
            app_token: non_empty(env_constants::APP_TOKEN),
            http_proxy: proxy(env_constants::HTTP_PROXY),
            https_proxy: proxy(env_constants::HTTPS_PROXY),
        }
    }
}

/// Load variables from a `.env` file in the working directory, if present
///
/// Variables already set in the environment are left untouched.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_settings_reads_token_and_proxies() {
        let settings = EnvSettings::from_lookup(lookup_from(&[
            ("APP_TOKEN", "abc123"),
            ("HTTP_PROXY", "http://proxy.local:3128"),
            ("HTTPS_PROXY", "http://secure-proxy.local:3128"),
        ]));

        assert_eq!(settings.app_token.as_deref(), Some("abc123"));
        assert_eq!(settings.http_proxy.as_deref(), Some("http://proxy.local:3128"));
        assert_eq!(
            settings.https_proxy.as_deref(),
            Some("http://secure-proxy.local:3128")
        );
    }

    #[test]
    fn test_env_settings_empty_values_are_unset() {
        let settings =
            EnvSettings::from_lookup(lookup_from(&[("APP_TOKEN", ""), ("HTTP_PROXY", "  ")]));

        assert_eq!(settings, EnvSettings::default());
    }

    #[test]
    fn test_env_settings_lowercase_proxy_fallback() {
        let settings = EnvSettings::from_lookup(lookup_from(&[(
            "https_proxy",
            "http://lower.local:8080",
        )]));

        assert_eq!(settings.https_proxy.as_deref(), Some("http://lower.local:8080"));
        assert!(settings.http_proxy.is_none());
    }

    #[test]
    fn test_env_settings_debug_redacts_token() {
        let settings = EnvSettings::from_lookup(lookup_from(&[("APP_TOKEN", "s3cr3t")]));
        let rendered = format!("{:?}", settings);

        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.download.chunk_size, download::DEFAULT_CHUNK_SIZE);
        assert_eq!(config.client.connect_timeout, http::CONNECT_TIMEOUT);
        assert_eq!(config.client.metadata_timeout, http::METADATA_TIMEOUT);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [client]
            metadata_timeout = "5s"

            [download]
            chunk_size = 65536
            "#,
        )
        .unwrap();

        assert_eq!(config.download.chunk_size, 65_536);
        assert_eq!(config.client.metadata_timeout, Duration::from_secs(5));
        assert_eq!(config.client.connect_timeout, http::CONNECT_TIMEOUT);
        assert_eq!(config.client.user_agent, http::USER_AGENT);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let result = AppConfig::from_toml_str("[download]\nchunk_size = \"big\"");
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.toml");

        match AppConfig::load(Some(&missing)) {
            Err(ConfigError::NotFound { path }) => assert_eq!(path, missing),
            other => panic!("Expected ConfigError::NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[client]\nuser_agent = \"custom-agent/1.0\"\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.client.user_agent, "custom-agent/1.0");

        let runtime = config.client.to_runtime_config();
        assert_eq!(runtime.user_agent, "custom-agent/1.0");
        assert_eq!(runtime.connect_timeout, http::CONNECT_TIMEOUT);
    }

    #[test]
    fn test_serialized_defaults_round_trip() {
        let rendered = toml::to_string(&AppConfig::default()).unwrap();
        assert!(rendered.contains("chunk_size"));
        assert_eq!(AppConfig::from_toml_str(&rendered).unwrap(), AppConfig::default());
    }
}

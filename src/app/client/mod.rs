//! HTTP session for the Socrata open data API
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `metadata`: best-effort lookup of the dataset's last update time
//! - `download`: streaming of the bulk CSV export to disk

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::config::EnvSettings;
use crate::constants::http;
use crate::errors::{ConfigError, ConfigResult};

// Module declarations
pub mod config;
pub mod download;
pub mod metadata;

pub use config::{ClientConfig, ProxySettings};
pub use download::BulkDownloader;
pub use metadata::MetadataFetcher;

/// Authenticated HTTP session shared by every request of a run
///
/// Immutable once built. Cloning is cheap; the underlying connection pool
/// is shared.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    headers: HeaderMap,
    proxies: ProxySettings,
    config: ClientConfig,
}

impl Session {
    /// Start building a session with the given client configuration
    pub fn builder(config: ClientConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    /// Build a session from environment settings
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingToken` if no token is present
    pub fn from_settings(settings: &EnvSettings, config: ClientConfig) -> ConfigResult<Self> {
        let mut builder = Self::builder(config).proxies(ProxySettings {
            http: settings.http_proxy.clone(),
            https: settings.https_proxy.clone(),
        });
        if let Some(token) = &settings.app_token {
            builder = builder.app_token(token.as_str());
        }
        builder.build()
    }

    /// The value sent in the application token header
    pub fn auth_header(&self) -> Option<&HeaderValue> {
        self.headers.get(http::APP_TOKEN_HEADER)
    }

    /// Default headers attached to every request
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Proxies attached to the session
    pub fn proxies(&self) -> &ProxySettings {
        &self.proxies
    }

    /// Client configuration the session was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Builder for [`Session`]
#[derive(Debug)]
pub struct SessionBuilder {
    config: ClientConfig,
    app_token: Option<String>,
    proxies: ProxySettings,
}

impl SessionBuilder {
    /// Creates a builder with no token and no proxies
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            app_token: None,
            proxies: ProxySettings::default(),
        }
    }

    /// Set the application token
    pub fn app_token(mut self, token: impl Into<String>) -> Self {
        self.app_token = Some(token.into());
        self
    }

    /// Set the proxies
    pub fn proxies(mut self, proxies: ProxySettings) -> Self {
        self.proxies = proxies;
        self
    }

    /// Validate the token and build the session
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The token is missing or blank
    /// - The token is not a valid header value
    /// - A proxy URL cannot be parsed
    pub fn build(self) -> ConfigResult<Session> {
        let token = self
            .app_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let mut value = HeaderValue::from_str(token).map_err(|e| ConfigError::InvalidToken {
            reason: e.to_string(),
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-app-token"), value);

        let client = self.config.build_http_client(headers.clone(), &self.proxies)?;

        if self.proxies.is_empty() {
            tracing::debug!("Created HTTP session without proxies");
        } else {
            tracing::debug!(
                "Created HTTP session with proxies (http: {}, https: {})",
                self.proxies.http.as_deref().unwrap_or("none"),
                self.proxies.https.as_deref().unwrap_or("none")
            );
        }

        Ok(Session {
            client,
            headers,
            proxies: self.proxies,
            config: self.config,
        })
    }
}

//! HTTP client configuration and building logic
//!
//! This module handles the construction of the `reqwest` client used for
//! every request of a run: fixed default headers, explicit proxies and
//! timeouts.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Proxy};

use crate::constants::http;
use crate::errors::{ConfigError, ConfigResult};

/// Configuration for the HTTP client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// User agent sent with every request
    pub user_agent: String,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Timeout for the whole metadata request
    pub metadata_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: http::USER_AGENT.to_string(),
            connect_timeout: http::CONNECT_TIMEOUT,
            metadata_timeout: http::METADATA_TIMEOUT,
        }
    }
}

/// Proxy URLs attached to a session, per scheme
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    /// Proxy for plain HTTP requests
    pub http: Option<String>,
    /// Proxy for HTTPS requests
    pub https: Option<String>,
}

impl ProxySettings {
    /// Whether any proxy is configured
    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.https.is_none()
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the given default headers and proxies
    ///
    /// System proxy discovery is disabled; only the proxies passed in are
    /// used. The bulk download has no overall timeout because a full export
    /// can take hours; only connection setup is bounded.
    pub fn build_http_client(
        &self,
        default_headers: HeaderMap,
        proxies: &ProxySettings,
    ) -> ConfigResult<Client> {
        let mut client_builder = Client::builder()
            .no_proxy()
            .default_headers(default_headers)
            .user_agent(self.user_agent.as_str())
            .connect_timeout(self.connect_timeout);

        if let Some(url) = &proxies.http {
            let proxy = Proxy::http(url.as_str()).map_err(|e| ConfigError::InvalidProxy {
                scheme: "HTTP",
                url: url.clone(),
                reason: e.to_string(),
            })?;
            client_builder = client_builder.proxy(proxy);
        }

        if let Some(url) = &proxies.https {
            let proxy = Proxy::https(url.as_str()).map_err(|e| ConfigError::InvalidProxy {
                scheme: "HTTPS",
                url: url.clone(),
                reason: e.to_string(),
            })?;
            client_builder = client_builder.proxy(proxy);
        }

        client_builder.build().map_err(ConfigError::Client)
    }
}

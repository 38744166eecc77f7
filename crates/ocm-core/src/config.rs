//! Configuration structures for OCM clients.
//!
//! This module provides the serializable configuration for connecting to the OCM API
//! and its identity provider, including validation of URLs and numeric limits.

use crate::client::{DEFAULT_MAX_ATTEMPTS, DEFAULT_TOKEN_MAX_ATTEMPTS, OCM_DEFAULT_TIMEOUT};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default OCM API base URL.
pub const DEFAULT_API_URL: &str = "https://api.stage.openshift.com";

/// Default OAuth token endpoint used to exchange the offline token.
pub const DEFAULT_TOKEN_URL: &str =
    "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token";

/// Default OAuth client id for the refresh-token grant.
pub const DEFAULT_CLIENT_ID: &str = "cloud-services";

/// Default upper bound on pages fetched by a single list operation.
pub const DEFAULT_MAX_PAGES: u32 = 1000;

/// Lifetime of an access token before it is refreshed (minutes).
pub const TOKEN_EXPIRATION_MINUTES: u64 = 15;

/// Configuration for an OCM client instance.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OcmClientConfig {
    /// OCM API base URL
    #[validate(url)]
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Skip TLS certificate verification for API requests
    #[serde(default)]
    pub api_insecure: bool,

    /// OAuth token endpoint
    #[validate(url)]
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// OAuth client id
    #[validate(length(min = 1))]
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attempts per API request
    #[validate(range(min = 1, max = 20))]
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Attempts per access token request
    #[validate(range(min = 1, max = 20))]
    #[serde(default = "default_token_max_attempts")]
    pub token_max_attempts: u32,

    /// Maximum pages fetched by one list operation
    #[validate(range(min = 1, max = 100_000))]
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    OCM_DEFAULT_TIMEOUT
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_token_max_attempts() -> u32 {
    DEFAULT_TOKEN_MAX_ATTEMPTS
}

const fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

impl OcmClientConfig {
    /// Create a new client configuration for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(api_url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            api_url: api_url.into(),
            ..Self::default()
        };
        config.ensure_valid()?;
        Ok(config)
    }

    /// Validate URLs and numeric limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first invalid field.
    pub fn ensure_valid(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Set whether to skip TLS certificate verification.
    #[must_use]
    pub const fn with_insecure(mut self, insecure: bool) -> Self {
        self.api_insecure = insecure;
        self
    }

    /// Set the OAuth token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Set the OAuth client id.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set attempts per API request.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set attempts per access token request.
    #[must_use]
    pub const fn with_token_max_attempts(mut self, attempts: u32) -> Self {
        self.token_max_attempts = attempts;
        self
    }

    /// Set the page bound for list operations.
    #[must_use]
    pub const fn with_max_pages(mut self, pages: u32) -> Self {
        self.max_pages = pages;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the access token lifetime.
    #[must_use]
    pub const fn token_ttl() -> Duration {
        Duration::from_secs(TOKEN_EXPIRATION_MINUTES * 60)
    }

    /// Parse the API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_api_url(&self) -> Result<Url, Error> {
        Url::parse(&self.api_url).map_err(|e| Error::ConfigError(format!("Invalid API URL: {e}")))
    }

    /// Parse the OAuth token endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_token_url(&self) -> Result<Url, Error> {
        Url::parse(&self.token_url)
            .map_err(|e| Error::ConfigError(format!("Invalid token URL: {e}")))
    }
}

impl Default for OcmClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_insecure: false,
            token_url: default_token_url(),
            client_id: default_client_id(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            token_max_attempts: default_token_max_attempts(),
            max_pages: default_max_pages(),
        }
    }
}

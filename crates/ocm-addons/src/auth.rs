//! Access token management.
//!
//! OCM requests carry a short-lived bearer token obtained by exchanging the caller's
//! offline token through an OAuth `refresh_token` grant. Tokens are cached per client
//! and reused for [`TOKEN_EXPIRATION_MINUTES`](ocm_core::config::TOKEN_EXPIRATION_MINUTES)
//! after they were issued.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ocm_core::client::RetryPolicy;
use ocm_core::config::OcmClientConfig;
use ocm_core::{ApiError, Error};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::Result;

/// Source of bearer tokens for OCM requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a currently valid access token.
    async fn access_token(&self) -> Result<String>;
}

/// An issued access token.
#[derive(Debug)]
pub struct AccessToken {
    value: SecretString,
    issued_at: DateTime<Utc>,
}

impl AccessToken {
    /// Wrap a token issued at `issued_at`.
    #[must_use]
    pub fn new(value: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            value: SecretString::from(value.into()),
            issued_at,
        }
    }

    /// When the token was issued.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// The bearer value.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.value.expose_secret()
    }

    /// Whether the token may still be used at `now` given its lifetime.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.issued_at).to_std() {
            Ok(elapsed) => elapsed < ttl,
            // Clock moved backwards since issuance.
            Err(_) => true,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// [`TokenSource`] that exchanges an offline token at the SSO token endpoint.
pub struct RefreshTokenAuth {
    http: Client,
    token_url: Url,
    client_id: String,
    offline_token: SecretString,
    retry_policy: RetryPolicy,
    ttl: Duration,
    cached: Mutex<Option<AccessToken>>,
}

impl RefreshTokenAuth {
    /// Create an authenticator for the given token endpoint and client id.
    #[must_use]
    pub fn new(
        http: Client,
        token_url: Url,
        client_id: impl Into<String>,
        offline_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url,
            client_id: client_id.into(),
            offline_token: SecretString::from(offline_token.into()),
            retry_policy: RetryPolicy::for_token(),
            ttl: OcmClientConfig::token_ttl(),
            cached: Mutex::new(None),
        }
    }

    /// Override the retry policy for token requests.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Override the token lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Drop the cached token so the next request fetches a new one.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn fetch(&self) -> Result<String> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", self.offline_token.expose_secret()),
        ];
        let form = &form;

        self.retry_policy
            .run("access token request", |attempt| async move {
                debug!(attempt, url = %self.token_url, "Requesting OCM access token");

                let response = self
                    .http
                    .post(self.token_url.clone())
                    .form(form)
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let response_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(Error::from(ApiError {
                        method: "POST".to_string(),
                        url: self.token_url.to_string(),
                        status: status.as_u16(),
                        params: Vec::new(),
                        body: None,
                        response_text,
                    }));
                }

                let token = response.json::<TokenResponse>().await.map_err(|err| {
                    Error::ParseError(format!("Failed to parse token response: {err}"))
                })?;
                Ok(token.access_token)
            })
            .await
    }
}

#[async_trait]
impl TokenSource for RefreshTokenAuth {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref() {
            if token.is_fresh_at(now, self.ttl) {
                return Ok(token.secret().to_string());
            }
            debug!(issued_at = %token.issued_at(), "OCM access token expired");
        }

        let value = self.fetch().await?;
        info!("Obtained new OCM access token");

        let token = AccessToken::new(value, now);
        let secret = token.secret().to_string();
        *cached = Some(token);
        Ok(secret)
    }
}

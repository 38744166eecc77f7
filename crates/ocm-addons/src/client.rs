//! Asynchronous OCM addon client implementation.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use ocm_core::client::{ClientConfig, RetryPolicy};
use ocm_core::config::OcmClientConfig;
use ocm_core::query::QueryParams;
use ocm_core::{ApiError, Error};

use crate::auth::{RefreshTokenAuth, TokenSource};
use crate::models::{
    Addon, AddonMetadata, AddonMigration, AddonMigrationPatch, AddonVersion, ImageSet, ItemList,
    NewAddonMigration, SkuRule,
};
use crate::translate::{addon_from_imageset, addon_from_metadata};
use crate::Result;

const USER_AGENT: &str = concat!("ocm-addons/", env!("CARGO_PKG_VERSION"));

const ADDONS_PATH: &str = "/api/clusters_mgmt/v1/addons";
const ADDON_MIGRATIONS_PATH: &str = "/api/clusters_mgmt/v1/addon_migrations";
const SKU_RULES_PATH: &str = "/api/accounts_mgmt/v1/sku_rules";

/// A request to an OCM endpoint, relative to the client's base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    params: Vec<(&'static str, String)>,
    body: Option<Value>,
    headers: HeaderMap,
}

impl ApiRequest {
    /// Create a request for `path`, which must start with `/`.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PATCH` request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Set the query parameters.
    #[must_use]
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params.into_pairs();
        self
    }

    /// Serialize `body` as the JSON request body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as JSON.
    pub fn with_json<B>(mut self, body: &B) -> Result<Self>
    where
        B: Serialize + ?Sized,
    {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Add a header. A header named like one the client sets (`Authorization`,
    /// `Accept`) replaces the client's value.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }
}

/// Builder for [`OcmClient`].
pub struct OcmClientBuilder {
    config: OcmClientConfig,
    http_config: ClientConfig,
    offline_token: Option<String>,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl OcmClientBuilder {
    /// Create a new builder from an [`OcmClientConfig`].
    #[must_use]
    pub fn new(config: OcmClientConfig) -> Self {
        Self {
            config,
            http_config: ClientConfig::new(),
            offline_token: None,
            token_source: None,
        }
    }

    /// Offline token exchanged for access tokens.
    #[must_use]
    pub fn with_offline_token(mut self, offline_token: impl Into<String>) -> Self {
        self.offline_token = Some(offline_token.into());
        self
    }

    /// Use a custom token source instead of the offline-token exchange.
    #[must_use]
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Override the HTTP client configuration used when building the client.
    ///
    /// Timeout and attempt counts from the [`OcmClientConfig`] still take precedence.
    #[must_use]
    pub fn with_http_config(mut self, http_config: ClientConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Finalise the builder and create the [`OcmClient`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, no credentials were supplied,
    /// or the HTTP client cannot be built.
    pub fn build(self) -> Result<OcmClient> {
        self.config.ensure_valid()?;
        let base_url = self.config.parse_api_url()?;

        let mut http_config = self.http_config;
        http_config.timeout = self.config.timeout();
        http_config.retry_policy = http_config
            .retry_policy
            .with_max_attempts(self.config.max_attempts);
        http_config.token_retry_policy = http_config
            .token_retry_policy
            .with_max_attempts(self.config.token_max_attempts);

        let mut builder = base_http_builder(&http_config);
        if self.config.api_insecure {
            warn!("TLS verification disabled for OCM API client");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build OCM HTTP client: {err}")))?;

        let token_source = match (self.token_source, self.offline_token) {
            (Some(source), _) => source,
            (None, Some(offline_token)) => {
                let token_http = base_http_builder(&http_config).build().map_err(|err| {
                    Error::ConfigError(format!("Failed to build SSO HTTP client: {err}"))
                })?;
                let auth = RefreshTokenAuth::new(
                    token_http,
                    self.config.parse_token_url()?,
                    self.config.client_id.clone(),
                    offline_token,
                )
                .with_retry_policy(http_config.token_retry_policy);
                Arc::new(auth)
            }
            (None, None) => {
                return Err(Error::ConfigError(
                    "An offline token or token source is required".to_string(),
                ))
            }
        };

        Ok(OcmClient {
            http,
            base_url,
            token_source,
            retry_policy: http_config.retry_policy,
            max_pages: self.config.max_pages,
        })
    }
}

fn base_http_builder(http_config: &ClientConfig) -> ClientBuilder {
    ClientBuilder::new()
        .user_agent(USER_AGENT)
        .timeout(http_config.timeout)
        .connect_timeout(http_config.connect_timeout)
        .pool_idle_timeout(http_config.pool_idle_timeout)
        .pool_max_idle_per_host(http_config.pool_max_idle_per_host)
        .gzip(http_config.enable_compression)
}

/// Asynchronous client for the OCM addon endpoints.
#[derive(Clone)]
pub struct OcmClient {
    http: Client,
    base_url: Url,
    token_source: Arc<dyn TokenSource>,
    retry_policy: RetryPolicy,
    max_pages: u32,
}

impl OcmClient {
    /// Construct a client for the default API using an offline token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(offline_token: impl Into<String>) -> Result<Self> {
        Self::from_config(&OcmClientConfig::default(), offline_token)
    }

    /// Construct a client from the configuration and an offline token.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client cannot be
    /// built.
    pub fn from_config(
        config: &OcmClientConfig,
        offline_token: impl Into<String>,
    ) -> Result<Self> {
        OcmClientBuilder::new(config.clone())
            .with_offline_token(offline_token)
            .build()
    }

    /// Start a builder pre-populated with the provided configuration.
    #[must_use]
    pub fn builder(config: OcmClientConfig) -> OcmClientBuilder {
        OcmClientBuilder::new(config)
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List all addons, following pagination.
    pub async fn list_addons(&self) -> Result<Vec<Addon>> {
        self.list_all(ADDONS_PATH).await
    }

    /// List all SKU rules, following pagination.
    pub async fn list_sku_rules(&self) -> Result<Vec<SkuRule>> {
        self.list_all(SKU_RULES_PATH).await
    }

    /// Create an addon from its metadata.
    pub async fn add_addon(&self, metadata: &AddonMetadata) -> Result<Addon> {
        let payload = addon_from_metadata(metadata);
        info!(addon = %metadata.id, "Creating addon");
        self.send_json(&ApiRequest::post(ADDONS_PATH).with_json(&payload)?)
            .await
    }

    /// Update an addon from its metadata.
    pub async fn update_addon(&self, metadata: &AddonMetadata) -> Result<Addon> {
        let mut payload = addon_from_metadata(metadata);
        let addon_id = payload.id.take().unwrap_or_else(|| metadata.id.clone());
        info!(addon = %addon_id, "Updating addon");
        let path = format!("{ADDONS_PATH}/{addon_id}");
        self.send_json(&ApiRequest::patch(path).with_json(&payload)?)
            .await
    }

    /// Create the addon, or update it if it already exists.
    pub async fn upsert_addon(&self, metadata: &AddonMetadata) -> Result<Addon> {
        match self.add_addon(metadata).await {
            Err(err) if err.is_conflict() => {
                debug!(addon = %metadata.id, "Addon already exists, updating instead");
                self.update_addon(metadata).await
            }
            result => result,
        }
    }

    /// Whether an addon exists.
    pub async fn addon_exists(&self, addon_id: &str) -> Result<bool> {
        let path = format!("{ADDONS_PATH}/{addon_id}");
        self.exists(&path).await
    }

    /// Create an addon version from an imageset, creating the addon first when it does
    /// not exist yet.
    pub async fn add_addon_version(
        &self,
        imageset: &ImageSet,
        metadata: &AddonMetadata,
    ) -> Result<AddonVersion> {
        let payload = addon_from_imageset(imageset, metadata)?;

        if !self.addon_exists(&metadata.id).await? {
            info!(addon = %metadata.id, "Addon does not exist yet, creating it first");
            self.add_addon(metadata).await?;
        }

        info!(addon = %metadata.id, imageset = %imageset.name, "Creating addon version");
        let path = format!("{ADDONS_PATH}/{}/versions", metadata.id);
        self.send_json(&ApiRequest::post(path).with_json(&payload)?)
            .await
    }

    /// Update an addon version from an imageset.
    pub async fn update_addon_version(
        &self,
        imageset: &ImageSet,
        metadata: &AddonMetadata,
    ) -> Result<AddonVersion> {
        let mut payload = addon_from_imageset(imageset, metadata)?;
        let version_id = payload.id.take().ok_or_else(|| {
            Error::InvalidImageSet(format!("No version id for `{}`", imageset.name))
        })?;

        info!(addon = %metadata.id, version = %version_id, "Updating addon version");
        let path = format!("{ADDONS_PATH}/{}/versions/{version_id}", metadata.id);
        self.send_json(&ApiRequest::patch(path).with_json(&payload)?)
            .await
    }

    /// Create the addon version, or update it if it already exists.
    pub async fn upsert_addon_version(
        &self,
        imageset: &ImageSet,
        metadata: &AddonMetadata,
    ) -> Result<AddonVersion> {
        match self.add_addon_version(imageset, metadata).await {
            Err(err) if err.is_conflict() => {
                debug!(imageset = %imageset.name, "Addon version already exists, updating instead");
                self.update_addon_version(imageset, metadata).await
            }
            result => result,
        }
    }

    /// Fetch a single addon.
    pub async fn get_addon(&self, addon_id: &str) -> Result<Addon> {
        self.send_json(&ApiRequest::get(format!("{ADDONS_PATH}/{addon_id}")))
            .await
    }

    /// Delete an addon.
    pub async fn delete_addon(&self, addon_id: &str) -> Result<()> {
        info!(addon = %addon_id, "Deleting addon");
        self.execute(&ApiRequest::delete(format!("{ADDONS_PATH}/{addon_id}")))
            .await
            .map(|_| ())
    }

    /// Enable an addon.
    pub async fn enable_addon(&self, addon_id: &str) -> Result<Addon> {
        self.set_addon_enabled(addon_id, true).await
    }

    /// Disable an addon.
    pub async fn disable_addon(&self, addon_id: &str) -> Result<Addon> {
        self.set_addon_enabled(addon_id, false).await
    }

    async fn set_addon_enabled(&self, addon_id: &str, enabled: bool) -> Result<Addon> {
        info!(addon = %addon_id, enabled, "Setting addon enabled flag");
        let path = format!("{ADDONS_PATH}/{addon_id}");
        self.send_json(&ApiRequest::patch(path).with_json(&json!({ "enabled": enabled }))?)
            .await
    }

    /// Fetch the addon migrations (first page, as returned by the API).
    pub async fn get_addon_migrations(&self) -> Result<ItemList<AddonMigration>> {
        self.send_json(&ApiRequest::get(ADDON_MIGRATIONS_PATH)).await
    }

    /// Whether a migration exists for the addon.
    pub async fn check_addon_migration_exists(&self, addon_id: &str) -> Result<bool> {
        let path = format!("{ADDON_MIGRATIONS_PATH}/{addon_id}");
        self.exists(&path).await
    }

    /// Fetch the migration of an addon.
    pub async fn get_addon_migration(&self, addon_id: &str) -> Result<AddonMigration> {
        self.send_json(&ApiRequest::get(format!(
            "{ADDON_MIGRATIONS_PATH}/{addon_id}"
        )))
        .await
    }

    /// Create a migration for an addon in its initial state.
    pub async fn create_addon_migration(&self, addon_id: &str) -> Result<AddonMigration> {
        info!(addon = %addon_id, "Creating addon migration");
        let body = NewAddonMigration::new(addon_id);
        self.send_json(&ApiRequest::post(ADDON_MIGRATIONS_PATH).with_json(&body)?)
            .await
    }

    /// Patch arbitrary fields of an addon migration.
    pub async fn patch_addon_migration<B>(&self, addon_id: &str, patch: &B) -> Result<AddonMigration>
    where
        B: Serialize + ?Sized,
    {
        let path = format!("{ADDON_MIGRATIONS_PATH}/{addon_id}");
        self.send_json(&ApiRequest::patch(path).with_json(patch)?)
            .await
    }

    /// Delete the migration of an addon.
    pub async fn delete_addon_migration(&self, addon_id: &str) -> Result<()> {
        info!(addon = %addon_id, "Deleting addon migration");
        self.execute(&ApiRequest::delete(format!(
            "{ADDON_MIGRATIONS_PATH}/{addon_id}"
        )))
        .await
        .map(|_| ())
    }

    /// Stop installations of an addon: create its migration, or reset an existing one
    /// to the initial state.
    pub async fn disable_addon_installation(&self, addon_id: &str) -> Result<AddonMigration> {
        match self.create_addon_migration(addon_id).await {
            Err(err) if err.is_conflict() => {
                debug!(addon = %addon_id, "Addon migration exists, resetting it");
                self.patch_addon_migration(addon_id, &AddonMigrationPatch::disabled())
                    .await
            }
            result => result,
        }
    }

    /// Enable the addon migration.
    pub async fn enable_addon_migration(&self, addon_id: &str) -> Result<AddonMigration> {
        self.patch_addon_migration(addon_id, &AddonMigrationPatch::enable())
            .await
    }

    /// Enable and allow-list the addon migration.
    pub async fn complete_addon_migration(&self, addon_id: &str) -> Result<AddonMigration> {
        self.patch_addon_migration(addon_id, &AddonMigrationPatch::complete())
            .await
    }

    /// Roll the addon migration back.
    pub async fn rollback_addon_migration(&self, addon_id: &str) -> Result<AddonMigration> {
        self.patch_addon_migration(addon_id, &AddonMigrationPatch::rollback())
            .await
    }

    /// Clear the rollback flag of the addon migration, leaving the other flags as they
    /// are.
    pub async fn unrollback_addon_migration(&self, addon_id: &str) -> Result<AddonMigration> {
        self.patch_addon_migration(addon_id, &AddonMigrationPatch::unrollback())
            .await
    }

    /// Send an arbitrary request and return the JSON response, or `Value::Null` for an
    /// empty body.
    pub async fn send(&self, request: &ApiRequest) -> Result<Value> {
        let response = self.execute(request).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(Error::from)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        match self.execute(&ApiRequest::get(path)).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn list_all<T>(&self, path: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();

        for page in 1..=self.max_pages {
            let request = ApiRequest::get(path).with_params(QueryParams::new().with("page", page));
            let list: ItemList<T> = self.send_json(&request).await?;
            let received = list.items.len();
            items.extend(list.items);

            debug!(
                path,
                page,
                received,
                accumulated = items.len(),
                total = list.total,
                "Fetched OCM page"
            );

            if items.len() >= list.total {
                return Ok(items);
            }
            if received == 0 {
                return Err(Error::Pagination(format!(
                    "page {page} of `{path}` was empty after {} of {} items",
                    items.len(),
                    list.total
                )));
            }
        }

        Err(Error::Pagination(format!(
            "`{path}` did not reach its reported total within {} pages",
            self.max_pages
        )))
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid OCM path `{path}`: {err}")))
    }

    async fn send_json<R>(&self, request: &ApiRequest) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self.execute(request).await?;
        response.json::<R>().await.map_err(|err| {
            Error::ParseError(format!(
                "Failed to parse OCM response for `{}`: {err}",
                request.path
            ))
        })
    }

    async fn execute(&self, request: &ApiRequest) -> Result<Response> {
        let url = self.build_url(&request.path)?;
        let label = format!("{} {}", request.method, request.path);

        self.retry_policy
            .run(&label, |attempt| {
                let url = url.clone();
                async move {
                    let token = self.token_source.access_token().await?;
                    let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
                        .map_err(|err| Error::ConfigError(format!("Invalid access token: {err}")))?;
                    auth.set_sensitive(true);

                    let mut headers = HeaderMap::new();
                    headers.insert(AUTHORIZATION, auth);
                    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
                    headers.extend(request.headers.clone());

                    info!(
                        method = %request.method,
                        path = %request.path,
                        params = ?request.params,
                        attempt,
                        "Sending OCM request"
                    );

                    let mut builder = self
                        .http
                        .request(request.method.clone(), url.clone())
                        .headers(headers);
                    if !request.params.is_empty() {
                        builder = builder.query(&request.params);
                    }
                    if let Some(body) = &request.body {
                        builder = builder.json(body);
                    }

                    let response = builder.send().await?;
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let response_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());

                    Err(Error::from(ApiError {
                        method: request.method.to_string(),
                        url: url.to_string(),
                        status: status.as_u16(),
                        params: request
                            .params
                            .iter()
                            .map(|(key, value)| ((*key).to_string(), value.clone()))
                            .collect(),
                        body: request.body.clone(),
                        response_text,
                    }))
                }
            })
            .await
    }
}

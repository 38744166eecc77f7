//! OCM addon client for the OpenShift Cluster Manager API.
//!
//! This crate provides an asynchronous client for the addon, addon-version, SKU-rule and
//! addon-migration endpoints, the local metadata/imageset models it consumes, and the
//! translation of those models into the API's wire schema.

#![deny(missing_docs)]

pub mod auth;
pub mod client;
pub mod models;
pub mod translate;
pub mod version;

pub use auth::{AccessToken, RefreshTokenAuth, TokenSource};
pub use client::{ApiRequest, OcmClient, OcmClientBuilder};
pub use models::{
    Addon, AddonMetadata, AddonMigration, AddonMigrationPatch, AddonPayload, AddonVersion,
    AddonVersionPayload, EnvironmentConfig, ImageSet, ItemList, NewAddonMigration, ParameterList,
    Record, SkuRule, SubscriptionConfig,
};
pub use translate::{addon_from_imageset, addon_from_metadata, camel_to_snake_case, index_dicts};
pub use version::parse_version_from_imageset_name;

/// Convenient result alias using the shared OCM error type.
pub type Result<T> = ocm_core::Result<T>;

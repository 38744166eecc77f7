//! Addon models: the local metadata/imageset records, the wire payloads sent to OCM,
//! and the resources OCM returns.
//!
//! Local records use the camelCase keys of the addon metadata files. Keys a record
//! does not declare are dropped when it is deserialized, so only recognized fields ever
//! reach the translation step.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A free-form JSON object, used for list items whose schema OCM owns (parameters,
/// catalog sources, environment variables).
pub type Record = serde_json::Map<String, Value>;

/// Addon metadata as read from an addon's metadata file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddonMetadata {
    /// Addon identifier.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Documentation link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Base64 encoded icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Label applied to clusters with the addon installed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Whether the addon is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Install mode in camelCase (`allNamespaces`, `ownNamespace`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_mode: Option<String>,
    /// Namespace the addon is installed into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    /// Quota resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocm_quota_name: Option<String>,
    /// Quota cost per installation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocm_quota_cost: Option<u64>,
    /// Operator name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_name: Option<String>,
    /// Whether the addon provisions resources outside the cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_external_resources: Option<bool>,
    /// Cloud credential requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_requests: Option<Vec<Value>>,
    /// Installation parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_on_parameters: Option<Vec<Record>>,
    /// Installation requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_on_requirements: Option<Vec<Value>>,
    /// Operators installed alongside the addon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_operators: Option<Vec<Value>>,
    /// Whether the addon is a managed service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_service: Option<bool>,
    /// Operator subscription configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_config: Option<SubscriptionConfig>,
    /// Imageset version the addon is pinned to. When set, per-version fields belong to
    /// the version object rather than the addon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addon_image_set_version: Option<String>,
    /// Default OLM channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_channel: Option<String>,
    /// Pull secret name, used as a default for versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_secret_name: Option<String>,
    /// Additional catalog sources, used as a default for versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_catalog_sources: Option<Vec<Record>>,
}

impl AddonMetadata {
    /// Create metadata with only the addon id set.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// One version of an addon, as described by an imageset file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageSet {
    /// Imageset name, `<addon>.v<semver>`.
    pub name: String,
    /// Catalog index image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_image: Option<String>,
    /// Installation parameters for this version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_on_parameters: Option<Vec<Record>>,
    /// Installation requirements for this version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_on_requirements: Option<Vec<Value>>,
    /// Sub-operators for this version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_operators: Option<Vec<Value>>,
    /// Pull secret name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_secret_name: Option<String>,
    /// Additional catalog sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_catalog_sources: Option<Vec<Record>>,
    /// Operator subscription configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_config: Option<SubscriptionConfig>,
}

/// Local subscription configuration. Only `env` is carried over to OCM.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionConfig {
    /// Environment variables for the operator subscription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<Record>>,
}

/// Addon parameters in wire format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParameterList {
    /// Parameters, each carrying its `order`.
    pub items: Vec<Record>,
}

/// Subscription configuration in wire format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentConfig {
    /// Indexed environment variables.
    pub add_on_environment_variables: Vec<Record>,
}

/// Addon body for `POST /addons` and `PATCH /addons/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AddonPayload {
    /// Addon id. Moved into the URL path for updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Documentation link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_link: Option<String>,
    /// Icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Enabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Install mode in snake_case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_mode: Option<String>,
    /// Target namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    /// Quota resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    /// Quota cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_cost: Option<u64>,
    /// Operator name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_name: Option<String>,
    /// External resources flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_external_resources: Option<bool>,
    /// Credential requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_requests: Option<Vec<Value>>,
    /// Parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ParameterList>,
    /// Requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<Value>>,
    /// Sub-operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_operators: Option<Vec<Value>>,
    /// Managed service flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_service: Option<bool>,
    /// Subscription configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EnvironmentConfig>,
}

/// Addon version body for `POST /addons/{id}/versions` and
/// `PATCH /addons/{id}/versions/{version}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AddonVersionPayload {
    /// Version id. Moved into the URL path for updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Enabled flag, always sent.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// OLM channel, always sent.
    #[serde(default)]
    pub channel: Option<String>,
    /// Catalog index image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    /// Parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ParameterList>,
    /// Requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<Value>>,
    /// Sub-operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_operators: Option<Vec<Value>>,
    /// Pull secret name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_secret_name: Option<String>,
    /// Indexed additional catalog sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_catalog_sources: Option<Vec<Record>>,
    /// Subscription configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EnvironmentConfig>,
}

/// Paged list envelope returned by OCM list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemList<T> {
    /// Resource kind of the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// 1-based page number.
    #[serde(default)]
    pub page: u32,
    /// Number of items in this page.
    #[serde(default)]
    pub size: usize,
    /// Total number of items across all pages.
    pub total: usize,
    /// Items in this page.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Addon resource as returned by OCM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Addon {
    /// Addon id.
    pub id: String,
    /// Resource kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Resource link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Enabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Currently published version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<AddonVersion>,
    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Record,
}

/// Addon version resource as returned by OCM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddonVersion {
    /// Version id.
    pub id: String,
    /// Resource kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Resource link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Enabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// OLM channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Catalog index image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Record,
}

/// SKU rule resource from the accounts management API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkuRule {
    /// Rule id.
    pub id: String,
    /// Resource kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Resource link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// SKU the rule applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Quota id granted by the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_id: Option<String>,
    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Record,
}

/// Addon migration resource as returned by OCM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddonMigration {
    /// Migration id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Addon the migration controls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addon_id: Option<String>,
    /// Whether the migration is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Whether the addon is allow-listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_listed: Option<bool>,
    /// Whether the migration is rolled back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_migration: Option<bool>,
    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Record,
}

/// Body for `POST /addon_migrations`. New migrations always start disabled, not
/// allow-listed and not rolled back.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewAddonMigration {
    /// Addon the migration controls.
    pub addon_id: String,
    /// Enabled flag.
    pub enabled: bool,
    /// Allow-listed flag.
    pub white_listed: bool,
    /// Rollback flag.
    pub rollback_migration: bool,
}

impl NewAddonMigration {
    /// Create the initial migration record for an addon.
    #[must_use]
    pub fn new(addon_id: impl Into<String>) -> Self {
        Self {
            addon_id: addon_id.into(),
            enabled: false,
            white_listed: false,
            rollback_migration: false,
        }
    }
}

/// Partial update of an addon migration's state flags. Unset flags are left unchanged
/// on the server.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddonMigrationPatch {
    /// Enabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Allow-listed flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_listed: Option<bool>,
    /// Rollback flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_migration: Option<bool>,
}

impl AddonMigrationPatch {
    /// Reset to the initial state: disabled, not allow-listed, not rolled back.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: Some(false),
            white_listed: Some(false),
            rollback_migration: Some(false),
        }
    }

    /// Enable the migration.
    #[must_use]
    pub const fn enable() -> Self {
        Self {
            enabled: Some(true),
            white_listed: None,
            rollback_migration: None,
        }
    }

    /// Enable and allow-list the migration.
    #[must_use]
    pub const fn complete() -> Self {
        Self {
            enabled: Some(true),
            white_listed: Some(true),
            rollback_migration: None,
        }
    }

    /// Roll the migration back.
    #[must_use]
    pub const fn rollback() -> Self {
        Self {
            enabled: Some(true),
            white_listed: Some(false),
            rollback_migration: Some(true),
        }
    }

    /// Clear the rollback flag only.
    #[must_use]
    pub const fn unrollback() -> Self {
        Self {
            enabled: None,
            white_listed: None,
            rollback_migration: Some(false),
        }
    }
}

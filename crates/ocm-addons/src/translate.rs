//! Translation of local addon records into OCM wire payloads.
//!
//! Field names are mapped by the local and wire types themselves (see [`crate::models`]);
//! the functions here apply the value-level rules: install modes become snake_case,
//! parameters get an explicit `order`, catalog sources and environment variables get a
//! positional `id`, and imageset values take precedence over metadata defaults.

use serde_json::Value;

use crate::models::{
    AddonMetadata, AddonPayload, AddonVersionPayload, EnvironmentConfig, ImageSet,
    ParameterList, Record, SubscriptionConfig,
};
use crate::version::parse_version_from_imageset_name;
use crate::Result;

/// Convert a camelCase value to snake_case by inserting `_` before every uppercase
/// letter that is not the first character.
///
/// ```
/// use ocm_addons::camel_to_snake_case;
///
/// assert_eq!(camel_to_snake_case("manualInstall"), "manual_install");
/// assert_eq!(camel_to_snake_case("automatic"), "automatic");
/// ```
#[must_use]
pub fn camel_to_snake_case(value: &str) -> String {
    let mut snake = String::with_capacity(value.len() + 4);
    for (index, ch) in value.chars().enumerate() {
        if index > 0 && ch.is_ascii_uppercase() {
            snake.push('_');
        }
        snake.extend(ch.to_lowercase());
    }
    snake
}

/// Copy each record and add its stringified list position as `id`.
#[must_use]
pub fn index_dicts(records: &[Record]) -> Vec<Record> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let mut indexed = record.clone();
            indexed.insert("id".to_string(), Value::String(index.to_string()));
            indexed
        })
        .collect()
}

/// Wrap parameters in an item list, overwriting each `order` with the list position so
/// OCM shows them in file order.
fn parameters_from_list(params: &[Record]) -> ParameterList {
    let items = params
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let mut ordered = param.clone();
            ordered.insert("order".to_string(), Value::from(index));
            ordered
        })
        .collect();

    ParameterList { items }
}

/// Only a subscription config with environment variables produces wire config.
fn environment_config(config: &SubscriptionConfig) -> Option<EnvironmentConfig> {
    config
        .env
        .as_deref()
        .filter(|env| !env.is_empty())
        .map(|env| EnvironmentConfig {
            add_on_environment_variables: index_dicts(env),
        })
}

/// Build the addon payload for the addons endpoint.
///
/// When the metadata pins an imageset version, parameters, requirements and
/// sub-operators are left to the version object. Otherwise parameters and requirements
/// are always sent, empty when the metadata has none.
#[must_use]
pub fn addon_from_metadata(metadata: &AddonMetadata) -> AddonPayload {
    let versioned = metadata
        .addon_image_set_version
        .as_deref()
        .is_some_and(|version| !version.is_empty());

    let (parameters, requirements, sub_operators) = if versioned {
        (None, None, None)
    } else {
        (
            Some(parameters_from_list(
                metadata.add_on_parameters.as_deref().unwrap_or_default(),
            )),
            Some(metadata.add_on_requirements.clone().unwrap_or_default()),
            metadata.sub_operators.clone(),
        )
    };

    AddonPayload {
        id: Some(metadata.id.clone()),
        name: metadata.name.clone(),
        description: metadata.description.clone(),
        docs_link: metadata.link.clone(),
        icon: metadata.icon.clone(),
        label: metadata.label.clone(),
        enabled: metadata.enabled,
        install_mode: metadata.install_mode.as_deref().map(camel_to_snake_case),
        target_namespace: metadata.target_namespace.clone(),
        resource_name: metadata.ocm_quota_name.clone(),
        resource_cost: metadata.ocm_quota_cost,
        operator_name: metadata.operator_name.clone(),
        has_external_resources: metadata.has_external_resources,
        credentials_requests: metadata.credentials_requests.clone(),
        parameters,
        requirements,
        sub_operators,
        managed_service: metadata.managed_service,
        config: metadata
            .subscription_config
            .as_ref()
            .and_then(environment_config),
    }
}

/// Build the versioned addon payload for an imageset.
///
/// Pull secret, catalog sources, subscription config and parameters from the metadata
/// are applied first; values present on the imageset replace them.
///
/// # Errors
///
/// Returns [`ocm_core::Error::InvalidImageSet`] if no version can be parsed from the
/// imageset name.
pub fn addon_from_imageset(
    imageset: &ImageSet,
    metadata: &AddonMetadata,
) -> Result<AddonVersionPayload> {
    let version = parse_version_from_imageset_name(&imageset.name)?;

    let mut payload = AddonVersionPayload {
        id: Some(version),
        enabled: metadata.enabled,
        channel: metadata.default_channel.clone(),
        ..AddonVersionPayload::default()
    };

    // Metadata defaults.
    if let Some(secret) = metadata.pull_secret_name.as_ref().filter(|s| !s.is_empty()) {
        payload.pull_secret_name = Some(secret.clone());
    }
    if let Some(sources) = metadata
        .additional_catalog_sources
        .as_deref()
        .filter(|sources| !sources.is_empty())
    {
        payload.additional_catalog_sources = Some(index_dicts(sources));
    }
    if let Some(config) = metadata
        .subscription_config
        .as_ref()
        .and_then(environment_config)
    {
        payload.config = Some(config);
    }
    if let Some(params) = metadata
        .add_on_parameters
        .as_deref()
        .filter(|params| !params.is_empty())
    {
        payload.parameters = Some(parameters_from_list(params));
    }

    // Imageset overrides.
    if let Some(image) = &imageset.index_image {
        payload.source_image = Some(image.clone());
    }
    if let Some(params) = &imageset.add_on_parameters {
        payload.parameters = Some(parameters_from_list(params));
    }
    if let Some(requirements) = &imageset.add_on_requirements {
        payload.requirements = Some(requirements.clone());
    }
    if let Some(sub_operators) = &imageset.sub_operators {
        payload.sub_operators = Some(sub_operators.clone());
    }
    if let Some(secret) = &imageset.pull_secret_name {
        payload.pull_secret_name = Some(secret.clone());
    }
    if let Some(sources) = &imageset.additional_catalog_sources {
        payload.additional_catalog_sources = Some(index_dicts(sources));
    }
    // A config without env leaves the metadata default in place.
    if let Some(config) = imageset
        .subscription_config
        .as_ref()
        .and_then(environment_config)
    {
        payload.config = Some(config);
    }

    Ok(payload)
}

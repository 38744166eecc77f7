//! Integration tests for translating addon metadata and imagesets.
//!
//! These tests load metadata and imageset files shaped like the ones kept in addon
//! repositories and check the payloads produced for the OCM API.

use std::fs;
use std::path::PathBuf;

use ocm_addons::{addon_from_imageset, addon_from_metadata, AddonMetadata, ImageSet};
use serde_json::{json, Value};

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn load_fixture(name: &str) -> String {
    let fixture_path = fixtures_dir().join(name);
    fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    })
}

fn load_metadata() -> AddonMetadata {
    serde_json::from_str(&load_fixture("addon_metadata.json"))
        .unwrap_or_else(|e| panic!("Failed to deserialize addon metadata: {e}"))
}

fn load_imageset() -> ImageSet {
    serde_json::from_str(&load_fixture("imageset.json"))
        .unwrap_or_else(|e| panic!("Failed to deserialize imageset: {e}"))
}

#[test]
fn test_metadata_fixture_parses() {
    let metadata = load_metadata();

    assert_eq!(metadata.id, "reference-addon");
    assert_eq!(metadata.install_mode.as_deref(), Some("ownNamespace"));
    assert_eq!(metadata.add_on_parameters.as_ref().map(Vec::len), Some(2));
    assert!(metadata.addon_image_set_version.is_none());
}

#[test]
fn test_addon_payload_from_metadata() {
    let payload = serde_json::to_value(addon_from_metadata(&load_metadata())).unwrap();

    assert_eq!(
        payload,
        json!({
            "id": "reference-addon",
            "name": "Reference Addon",
            "description": "Reference addon used to exercise the OCM addon flow.",
            "docs_link": "https://github.com/openshift/reference-addon",
            "icon": "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==",
            "label": "api.openshift.com/addon-reference-addon",
            "enabled": true,
            "install_mode": "own_namespace",
            "target_namespace": "reference-addon",
            "resource_name": "addon-reference-addon",
            "resource_cost": 0,
            "operator_name": "reference-addon",
            "has_external_resources": false,
            "managed_service": false,
            "parameters": {"items": [
                {
                    "id": "size",
                    "name": "Size",
                    "description": "Deployment size",
                    "value_type": "string",
                    "required": true,
                    "editable": false,
                    "enabled": true,
                    "order": 0
                },
                {
                    "id": "notification-email",
                    "name": "Notification email",
                    "description": "Where alerts are sent",
                    "value_type": "string",
                    "required": false,
                    "editable": true,
                    "enabled": true,
                    "order": 1
                }
            ]},
            "requirements": [{
                "id": "memory",
                "resource": "compute.node",
                "data": {"memory": 4096},
                "enabled": true
            }],
            "config": {"add_on_environment_variables": [
                {"name": "LOG_LEVEL", "value": "info", "id": "0"}
            ]}
        })
    );
}

#[test]
fn test_addon_payload_omits_unrecognized_metadata() {
    let payload = serde_json::to_value(addon_from_metadata(&load_metadata())).unwrap();
    let object = payload.as_object().unwrap();

    for key in ["testHarness", "pagerduty", "defaultChannel", "pullSecretName"] {
        assert!(!object.contains_key(key), "{key} must not be sent");
    }
}

#[test]
fn test_version_payload_from_imageset() {
    let payload =
        serde_json::to_value(addon_from_imageset(&load_imageset(), &load_metadata()).unwrap())
            .unwrap();

    assert_eq!(payload["id"], "0.2.1");
    assert_eq!(payload["enabled"], true);
    assert_eq!(payload["channel"], "alpha");
    assert_eq!(
        payload["source_image"],
        "quay.io/osd-addons/reference-addon-index@sha256:4c1b08cc2ab7a3cfdd0d0b2e4b4d7d5c4d3c1b0a9f8e7d6c5b4a3f2e1d0c9b8a"
    );
    assert!(payload.get("relatedImages").is_none());
}

#[test]
fn test_imageset_overrides_metadata_defaults() {
    let payload =
        serde_json::to_value(addon_from_imageset(&load_imageset(), &load_metadata()).unwrap())
            .unwrap();

    // Replaced by the imageset.
    assert_eq!(
        payload["parameters"],
        json!({"items": [{
            "id": "size",
            "name": "Size",
            "value_type": "string",
            "required": true,
            "editable": false,
            "enabled": true,
            "order": 0
        }]})
    );
    assert_eq!(payload["requirements"], json!([]));
    assert_eq!(
        payload["sub_operators"],
        json!([{
            "operator_name": "reference-addon-dep",
            "operator_namespace": "reference-addon",
            "enabled": true
        }])
    );

    // Inherited from the metadata.
    assert_eq!(payload["pull_secret_name"], "reference-addon-pull-secret");
    assert_eq!(
        payload["additional_catalog_sources"],
        json!([{
            "name": "reference-addon-deps",
            "image": "quay.io/osd-addons/reference-addon-deps:1.0.0",
            "id": "0"
        }])
    );
    assert_eq!(
        payload["config"],
        json!({"add_on_environment_variables": [
            {"name": "LOG_LEVEL", "value": "info", "id": "0"}
        ]})
    );
}

#[test]
fn test_pinned_metadata_leaves_version_fields_to_imageset() {
    let mut metadata = load_metadata();
    metadata.addon_image_set_version = Some("0.2.1".to_string());

    let payload = serde_json::to_value(addon_from_metadata(&metadata)).unwrap();
    for key in ["parameters", "requirements", "sub_operators"] {
        assert_eq!(payload.get(key), None::<&Value>, "{key} belongs to the version");
    }
    assert_eq!(payload["install_mode"], "own_namespace");
}

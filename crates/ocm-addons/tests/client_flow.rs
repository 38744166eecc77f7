//! End-to-end tests for the OCM client against a mock SSO and API server.

use std::fs;
use std::path::PathBuf;

use ocm_addons::{AddonMetadata, ImageSet, OcmClient};
use ocm_core::config::OcmClientConfig;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(name: &str) -> String {
    let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&fixture_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", fixture_path.display(), e))
}

async fn mount_token_endpoint(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("client_id=cloud-services"))
        .and(body_string_contains("refresh_token=offline-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "sso-access-token",
            "expires_in": 900,
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn client_for(server: &MockServer) -> OcmClient {
    let config = OcmClientConfig::new(server.uri())
        .unwrap()
        .with_token_url(format!("{}/auth/token", server.uri()));
    OcmClient::from_config(&config, "offline-token").unwrap()
}

#[tokio::test]
async fn test_list_addons_with_exchanged_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    let body: serde_json::Value = serde_json::from_str(&fixture("addon_list.json")).unwrap();
    Mock::given(method("GET"))
        .and(path("/api/clusters_mgmt/v1/addons"))
        .and(query_param("page", "1"))
        .and(header("authorization", "Bearer sso-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let addons = client.list_addons().await.unwrap();
    assert_eq!(addons.len(), 2);
    assert_eq!(addons[0].id, "reference-addon");
    assert_eq!(
        addons[0].version.as_ref().and_then(|v| v.channel.as_deref()),
        Some("alpha")
    );
    assert_eq!(addons[1].enabled, Some(false));

    // Second call reuses the cached token.
    client.list_addons().await.unwrap();
}

#[tokio::test]
async fn test_publish_new_addon_version() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    let metadata: AddonMetadata = serde_json::from_str(&fixture("addon_metadata.json")).unwrap();
    let imageset: ImageSet = serde_json::from_str(&fixture("imageset.json")).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/clusters_mgmt/v1/addons/reference-addon"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "kind": "Error",
            "id": "404",
            "reason": "Addon 'reference-addon' not found"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/clusters_mgmt/v1/addons"))
        .and(body_string_contains("\"install_mode\":\"own_namespace\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "kind": "AddOn",
            "id": "reference-addon"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/clusters_mgmt/v1/addons/reference-addon/versions"))
        .and(body_string_contains("\"id\":\"0.2.1\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "kind": "AddOnVersion",
            "id": "0.2.1",
            "enabled": true,
            "channel": "alpha"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let version = client_for(&server)
        .upsert_addon_version(&imageset, &metadata)
        .await
        .unwrap();
    assert_eq!(version.id, "0.2.1");
    assert_eq!(version.channel.as_deref(), Some("alpha"));
}

#[tokio::test]
async fn test_rejected_offline_token_surfaces_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Offline user session not found"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server).list_sku_rules().await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("invalid_grant"));
}

//! Integration tests for the HTTP control plane client.
//!
//! A wiremock server stands in for the control plane API.

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tptctl::api::{ApiError, ApiTarget, HttpTopologyClient, RemoteTopologyClient};
use tptctl::core::config::{ConfigStore, ControlPlaneConfigEntry, ThreeportConfigDocument};
use tptctl::engine::{ResolutionOutcome, ResolveError, ResolveRequest, TopologyResolver};

fn envelope(data: serde_json::Value) -> serde_json::Value {
    json!({ "Meta": { "TotalCount": 1 }, "Data": [data] })
}

fn instance_json(name: &str, id: u64, children: serde_json::Value) -> serde_json::Value {
    json!({
        "ID": id,
        "Name": name,
        "ControlPlaneDefinitionID": id,
        "KubernetesRuntimeInstanceID": id,
        "ApiServerEndpoint": format!("http://{}.local:1323", name),
        "Genesis": false,
        "Children": children,
    })
}

async fn mount_metadata(server: &MockServer, id: u64, provider: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v0/control-plane-definitions/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "ID": id,
            "Name": format!("def-{}", id),
            "AuthEnabled": false,
        }))))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v0/kubernetes-runtime-instances/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "ID": id,
            "Name": format!("kri-{}", id),
            "KubernetesRuntimeDefinitionID": id,
        }))))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v0/kubernetes-runtime-definitions/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "ID": id,
            "Name": format!("krd-{}", id),
            "InfraProvider": provider,
        }))))
        .mount(server)
        .await;
}

fn local_entry(name: &str, api_server: &str) -> ControlPlaneConfigEntry {
    ControlPlaneConfigEntry {
        name: name.to_string(),
        api_server: api_server.to_string(),
        auth_enabled: false,
        ca_cert: None,
        infra_provider: "kind".to_string(),
        genesis: false,
        credentials: None,
    }
}

fn store_with(dir: &TempDir, entries: Vec<ControlPlaneConfigEntry>, current: &str) -> ConfigStore {
    let doc = ThreeportConfigDocument {
        current_control_plane: Some(current.to_string()),
        control_planes: entries,
    };
    let store = ConfigStore::new(dir.path().join("config.toml"), doc);
    store.persist().unwrap();
    store
}

// =============================================================================
// Wire contract
// =============================================================================

mod wire {
    use super::*;

    #[tokio::test]
    async fn instance_by_name_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/control-plane-instances"))
            .and(query_param("name", "prod"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(envelope(instance_json(
                    "prod",
                    1,
                    json!([instance_json("staging", 2, json!([]))]),
                ))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpTopologyClient::new();
        let prod = api
            .get_instance_by_name(&ApiTarget::insecure(server.uri()), "prod")
            .await
            .unwrap();

        assert_eq!(prod.name, "prod");
        assert_eq!(prod.id, Some(1));
        assert_eq!(prod.children.len(), 1);
        assert_eq!(prod.children[0].name, "staging");
        assert_eq!(prod.children[0].control_plane_definition_id, 2);
    }

    #[tokio::test]
    async fn genesis_query() {
        let server = MockServer::start().await;
        let mut genesis = instance_json("root", 9, json!([]));
        genesis["Genesis"] = json!(true);
        Mock::given(method("GET"))
            .and(path("/v0/control-plane-instances"))
            .and(query_param("genesis", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(genesis)))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpTopologyClient::new();
        let root = api
            .get_genesis_instance(&ApiTarget::insecure(server.uri()))
            .await
            .unwrap();

        assert_eq!(root.name, "root");
        assert_eq!(root.genesis, Some(true));
    }

    #[tokio::test]
    async fn metadata_by_id() {
        let server = MockServer::start().await;
        mount_metadata(&server, 4, "eks").await;

        let api = HttpTopologyClient::new();
        let target = ApiTarget::insecure(server.uri());

        let def = api.get_definition_by_id(&target, 4).await.unwrap();
        assert_eq!(def.id, Some(4));
        assert!(!def.auth_enabled);

        let kri = api.get_runtime_instance_by_id(&target, 4).await.unwrap();
        assert_eq!(kri.kubernetes_runtime_definition_id, 4);

        let krd = api.get_runtime_definition_by_id(&target, 4).await.unwrap();
        assert_eq!(krd.infra_provider, "eks");
    }

    #[tokio::test]
    async fn empty_data_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/control-plane-instances"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "Meta": {}, "Data": [] })),
            )
            .mount(&server)
            .await;

        let api = HttpTopologyClient::new();
        let err = api
            .get_instance_by_name(&ApiTarget::insecure(server.uri()), "ghost")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
    }
}

// =============================================================================
// Status mapping
// =============================================================================

mod status {
    use super::*;

    async fn definition_error(status: u16, body: &str) -> ApiError {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/control-plane-definitions/1"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;

        HttpTopologyClient::new()
            .get_definition_by_id(&ApiTarget::insecure(server.uri()), 1)
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn unauthorized() {
        let err = definition_error(401, "").await;
        assert!(matches!(err, ApiError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn forbidden() {
        let err = definition_error(403, "").await;
        assert!(matches!(err, ApiError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn not_found() {
        let err = definition_error(404, "").await;
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn server_error_keeps_message() {
        let err = definition_error(500, r#"{"Error":"database unavailable"}"#).await;
        assert_eq!(
            err,
            ApiError::Api {
                status: 500,
                message: "database unavailable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn bad_body_is_decode_error() {
        let err = definition_error(200, "not json").await;
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_is_network_error() {
        let err = HttpTopologyClient::new()
            .get_definition_by_id(&ApiTarget::insecure("http://127.0.0.1:1"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}

// =============================================================================
// Resolution over HTTP
// =============================================================================

mod resolve {
    use super::*;

    #[tokio::test]
    async fn child_is_discovered_and_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/control-plane-instances"))
            .and(query_param("name", "prod"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(envelope(instance_json(
                    "prod",
                    1,
                    json!([instance_json("staging", 2, json!([]))]),
                ))),
            )
            .mount(&server)
            .await;
        mount_metadata(&server, 2, "eks").await;

        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, vec![local_entry("prod", &server.uri())], "prod");

        let api = HttpTopologyClient::new();
        let resolution = TopologyResolver::new(&api)
            .resolve(&mut store, &ResolveRequest::new("staging"))
            .await
            .unwrap();

        assert_eq!(
            resolution.outcome,
            ResolutionOutcome::FoundAsChild {
                parent: "prod".to_string()
            }
        );

        let reloaded = ConfigStore::load(store.path()).unwrap();
        let doc = reloaded.document();
        assert_eq!(doc.current_control_plane.as_deref(), Some("staging"));
        let staging = doc.entry("staging").unwrap();
        assert_eq!(staging.api_server, "http://staging.local:1323");
        assert_eq!(staging.infra_provider, "eks");
        assert!(!staging.auth_enabled);
    }

    #[tokio::test]
    async fn failed_metadata_leaves_config_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/control-plane-instances"))
            .and(query_param("name", "prod"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(envelope(instance_json(
                    "prod",
                    1,
                    json!([instance_json("staging", 2, json!([]))]),
                ))),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v0/control-plane-definitions/2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, vec![local_entry("prod", &server.uri())], "prod");
        let before = std::fs::read_to_string(store.path()).unwrap();

        let api = HttpTopologyClient::new();
        let err = TopologyResolver::new(&api)
            .resolve(&mut store, &ResolveRequest::new("staging"))
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::PartialMetadata { .. }));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }
}

//! Integration tests for the ICD client against a mocked WHO API.

use serde_json::json;
use setu_icd::{IcdClient, IcdConfig, IcdError, entity_title};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server_uri: &str) -> IcdConfig {
    IcdConfig {
        enabled: true,
        base_url: format!("{server_uri}/icd"),
        token_url: format!("{server_uri}/connect/token"),
        client_id: "test-client".to_string(),
        client_secret: "test-secret".to_string(),
        ..Default::default()
    }
}

async fn mount_token_endpoint(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=icdapi_access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn search_parses_results_and_caches_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/icd/release/11/2023-01/mms/search"))
        .and(query_param("q", "fever"))
        .and(query_param("useFlexisearch", "true"))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("API-Version", "v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "destinationEntities": [
                {"id": "http://id.who.int/icd/entity/1435254666", "theCode": "MG26", "title": "Fever, unspecified"},
                {"theCode": "1D44", "title": {"@language": "en", "@value": "Dengue fever"}}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/icd/release/11/2023-01/mms/search"))
        .and(query_param("q", "cough"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "destinationEntities": []
        })))
        .mount(&server)
        .await;

    let client = IcdClient::new(config_for(&server.uri()));

    let hits = client.search("fever").await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].code, "MG26");
    assert_eq!(hits[0].title, "Fever, unspecified");
    assert_eq!(hits[1].title, "Dengue fever");

    // Second call over a different query reuses the cached token.
    let empty = client.search("cough").await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn search_results_are_cached() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/icd/release/11/2023-01/mms/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "destinationEntities": [
                {"theCode": "MG26", "title": "Fever, unspecified"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = IcdClient::new(config_for(&server.uri()));
    let first = client.search("fever").await.unwrap();
    let second = client.search("fever").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn resolve_entity_returns_payload() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/icd/entity/1435254666"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": {"@language": "en", "@value": "Fever, unspecified"},
            "definition": {"@language": "en", "@value": "Elevated body temperature"}
        })))
        .mount(&server)
        .await;

    let client = IcdClient::new(config_for(&server.uri()));
    let entity = client.resolve_entity("1435254666").await.unwrap().unwrap();
    assert_eq!(entity_title(&entity), Some("Fever, unspecified".to_string()));
}

#[tokio::test]
async fn resolve_entity_miss_is_none_and_cached() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/icd/entity/unknown"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = IcdClient::new(config_for(&server.uri()));
    assert!(client.resolve_entity("unknown").await.unwrap().is_none());
    // Second call is served from the negative cache.
    assert!(client.resolve_entity("unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn bad_credentials_surface_token_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = IcdClient::new(config_for(&server.uri()));
    let err = client.search("fever").await.unwrap_err();
    assert!(matches!(err, IcdError::TokenEndpoint { status: 401 }));
}

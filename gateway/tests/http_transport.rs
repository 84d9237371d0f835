//! The reqwest transport and the client end to end against a mock gateway.

use serde_json::json;
use std::time::Duration;

use phillet_gateway::{
    ClientConfig, GatewayClient, GatewayError, GatewayRequest, ReqwestTransport, Transport,
};
use phillet_session::{FileSessionStore, SessionStore};
use phillet_types::{AuthRequest, WalletBalanceRequest};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer) -> ReqwestTransport {
    ReqwestTransport::new(server.uri(), Duration::from_secs(5), Duration::from_secs(5)).unwrap()
}

fn balance_json() -> serde_json::Value {
    json!({
        "balance": "500000000000000000",
        "symbol": "ETH",
        "decimals": 18,
        "address": "0x1111111111111111111111111111111111111111",
        "blockchain": "ethereum",
        "network": "goerli"
    })
}

#[tokio::test]
async fn sends_query_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/wallet/balance"))
        .and(query_param("blockchain", "ethereum"))
        .and(query_param("network", "goerli"))
        .and(header("authorization", "Bearer a0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(balance_json()))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = GatewayRequest::get("/v1/wallet/balance")
        .with_query("blockchain", "ethereum")
        .with_query("network", "goerli");
    request.bearer = Some("a0".into());

    let response = transport(&server).send(&request).await.unwrap();
    assert_eq!(response.status, 200);
    assert!(response.body.contains("500000000000000000"));
}

#[tokio::test]
async fn posts_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "r0" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let request = GatewayRequest::post("/v1/auth/refresh")
        .with_json(&json!({ "refreshToken": "r0" }))
        .unwrap();
    let response = transport(&server).send(&request).await.unwrap();
    assert!(response.is_success());
}

#[tokio::test]
async fn error_statuses_are_responses_not_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/health"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let response = transport(&server)
        .send(&GatewayRequest::get("/v1/health"))
        .await
        .unwrap();
    assert_eq!(response.status, 500);
    assert_eq!(response.status_text, "Internal Server Error");
    assert_eq!(response.body, "boom");
}

#[tokio::test]
async fn unreachable_gateway_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let transport =
        ReqwestTransport::new(uri, Duration::from_secs(2), Duration::from_secs(2)).unwrap();
    let result = transport.send(&GatewayRequest::get("/v1/health")).await;
    assert!(matches!(result, Err(GatewayError::Network(_))));
}

#[tokio::test]
async fn login_then_refresh_against_mock_gateway() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        base_url: server.uri(),
        session_file: dir.path().join("session.json"),
        ..ClientConfig::default()
    };

    Mock::given(method("POST"))
        .and(path("/v1/auth/authenticate"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "a0",
            "refreshToken": "r0",
            "expiresAt": 4_102_444_800_000u64,
            "user": { "id": "u1", "email": "ada@example.com", "firstName": "Ada", "lastName": "Lovelace" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/wallet/balance"))
        .and(header("authorization", "Bearer a0"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "token expired" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "r0" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "a1",
            "refreshToken": "r1",
            "expiresAt": 4_102_444_800_000u64
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/wallet/balance"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(balance_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = GatewayClient::from_config(&config).unwrap();
    client
        .authenticate(&AuthRequest::new("ada@example.com", "pw"))
        .await
        .unwrap();
    let balance = client
        .get_balance(&WalletBalanceRequest::native("ethereum", "goerli"))
        .await
        .unwrap();

    assert_eq!(balance.display().unwrap().to_string(), "0.500000 ETH");

    let on_disk = FileSessionStore::new(dir.path().join("session.json"));
    let stored = on_disk.load().unwrap().unwrap();
    assert_eq!(stored.access_token, "a1");
    assert_eq!(stored.refresh_token, "r1");

    // A fresh client picks the refreshed session up from disk.
    let restarted = GatewayClient::from_config(&config).unwrap();
    assert_eq!(restarted.access_token().as_deref(), Some("a1"));
}

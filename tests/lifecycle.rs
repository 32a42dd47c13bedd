//! Startup and shutdown behaviour of the full server.

use std::time::Duration;

use greeter_gateway::config::ServerConfig;

mod common;

#[tokio::test]
async fn stops_cleanly_with_idle_connections() {
    let server = common::start_server().await;

    let mut client = server.grpc_client().await;
    client
        .logout(greeter_gateway::rpc::proto::Empty {})
        .await
        .unwrap();

    let http = reqwest::Client::new();
    let res = http
        .get(format!("{}/v1/user/42", server.url()))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn explicit_upstream_is_used() {
    // Point the gateway at a port nothing listens on.
    let mut config = ServerConfig::default();
    config.gateway.upstream = Some("http://127.0.0.1:1".into());
    config.gateway.connect_timeout_secs = 1;
    let server = common::start_with(config).await;

    let res = reqwest::Client::new()
        .post(format!("{}/v1/hello", server.url()))
        .json(&serde_json::json!({"name": "Ada"}))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 503);

    server.stop().await.unwrap();
}

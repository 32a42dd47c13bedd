//! HTTP/JSON clients against the multiplexed port.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Version};
use serde_json::{json, Value};

use greeter_gateway::config::ServerConfig;
use greeter_gateway::observability::{FinishedSpanExt, SpanKind, SpanStatus};
use greeter_gateway::rpc::methods;
use greeter_gateway::users::{StoreError, User, UserStore};

mod common;

fn http1() -> Client {
    Client::builder().http1_only().build().unwrap()
}

fn h2c() -> Client {
    Client::builder().http2_prior_knowledge().build().unwrap()
}

/// A store that never answers within any reasonable deadline.
#[derive(Debug)]
struct StalledStore;

#[async_trait]
impl UserStore for StalledStore {
    async fn get_user(&self, _id: u64) -> Result<User, StoreError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(StoreError::NotFound(0))
    }
}

async fn start_stalled() -> common::TestServer {
    common::start_with_store(ServerConfig::default(), Arc::new(StalledStore)).await
}

#[tokio::test]
async fn say_hello_over_http1() {
    let server = common::start_server().await;

    let res = http1()
        .post(format!("{}/v1/hello", server.url()))
        .json(&json!({"name": "Ada"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.version(), Version::HTTP_11);

    let trace_id = res.headers().get("x-trace-id").unwrap().to_str().unwrap().to_string();
    assert_eq!(trace_id.len(), 32);
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"message": "Ada world", "data": null, "obj": null}));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn json_over_h2c_goes_to_gateway() {
    let server = common::start_server().await;

    let res = h2c()
        .post(format!("{}/v1/hello", server.url()))
        .json(&json!({"name": "Ada"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.version(), Version::HTTP_2);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Ada world");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn logout_accepts_empty_body() {
    let server = common::start_server().await;

    let res = http1()
        .post(format!("{}/v1/logout", server.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({}));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn get_user_renders_id_as_string() {
    let server = common::start_server().await;

    let res = http1()
        .get(format!("{}/v1/user/42", server.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"id": "42", "name": "Ada", "email": "ada@example.com", "phone": "555-0142"})
    );

    server.stop().await.unwrap();
}

#[tokio::test]
async fn errors_map_to_http_status() {
    let server = common::start_server().await;
    let client = http1();

    let cases = [
        (client.get(format!("{}/v1/user/7", server.url())), 404, 5),
        (client.get(format!("{}/v1/user/abc", server.url())), 400, 3),
        (client.get(format!("{}/v1/user/0", server.url())), 404, 5),
        (
            client
                .post(format!("{}/v1/hello", server.url()))
                .json(&json!({"name": ""})),
            400,
            3,
        ),
        (
            client
                .post(format!("{}/v1/hello", server.url()))
                .json(&json!({"name": "Ada; DROP"})),
            400,
            3,
        ),
        (
            client
                .post(format!("{}/v1/hello", server.url()))
                .header("content-type", "application/json")
                .body("{not json"),
            400,
            3,
        ),
        (client.get(format!("{}/v1/nowhere", server.url())), 404, 5),
    ];

    for (request, status, code) in cases {
        let res = request.send().await.unwrap();
        assert_eq!(res.status().as_u16(), status);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["code"], code, "{body}");
        assert!(body["message"].is_string());
        assert_eq!(body["details"], json!([]));
    }

    server.stop().await.unwrap();
}

#[tokio::test]
async fn trace_spans_link_across_both_hops() {
    let server = common::start_server().await;

    let res = http1()
        .post(format!("{}/v1/hello", server.url()))
        .header("traceparent", common::PARENT_TRACEPARENT)
        .json(&json!({"name": "Ada"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-trace-id"], common::PARENT_TRACE_ID);

    let spans = server.wait_for_spans(3).await;
    assert_eq!(spans.len(), 3);
    for span in &spans {
        assert_eq!(span.span_context.trace_id().to_string(), common::PARENT_TRACE_ID);
        assert!(!span.outcome().is_failed());
    }

    let ingress = common::span(&spans, "ServeHTTP");
    assert_eq!(ingress.tag("component").as_deref(), Some("grpc-gateway"));
    assert_eq!(
        ingress.parent_id().map(|p| p.to_string()),
        Some("00f067aa0ba902b7".to_string())
    );

    let client = spans
        .iter()
        .find(|s| s.span_kind == SpanKind::Client)
        .unwrap();
    let rpc_server = spans
        .iter()
        .find(|s| s.span_kind == SpanKind::Server && s.name == methods::SAY_HELLO)
        .unwrap();
    assert_eq!(client.name, methods::SAY_HELLO);
    assert_eq!(client.parent_id(), Some(ingress.span_context.span_id()));
    assert_eq!(rpc_server.parent_id(), Some(client.span_context.span_id()));
    assert_eq!(rpc_server.tag("caller.component").as_deref(), Some("grpc-gateway"));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn failed_lookup_fails_every_span() {
    let server = common::start_server().await;

    let res = http1()
        .get(format!("{}/v1/user/7", server.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let spans = server.wait_for_spans(3).await;
    assert_eq!(spans.len(), 3);
    assert!(spans.iter().all(|s| s.outcome().is_failed()), "{spans:?}");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn validation_failure_still_traced_on_server() {
    let server = common::start_server().await;

    let res = http1()
        .post(format!("{}/v1/hello", server.url()))
        .json(&json!({"name": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let spans = server.wait_for_spans(3).await;
    let rpc_server = spans
        .iter()
        .find(|s| s.span_kind == SpanKind::Server && s.name == methods::SAY_HELLO)
        .unwrap();
    assert!(rpc_server.outcome().is_failed());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn grpc_timeout_header_bounds_gateway_call() {
    let server = start_stalled().await;

    let started = Instant::now();
    let res = http1()
        .get(format!("{}/v1/user/42", server.url()))
        .header("grpc-timeout", "200m")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(started.elapsed() < Duration::from_secs(5));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], 4, "{body}");

    let spans = server.wait_for_spans(3).await;
    let ingress = common::span(&spans, "ServeHTTP");
    assert!(ingress.outcome().is_failed());
    assert_eq!(ingress.tag("http.status_code").as_deref(), Some("504"));

    let rpc = |kind: SpanKind| {
        spans
            .iter()
            .find(|s| s.span_kind == kind && s.name == methods::GET_USER)
            .unwrap()
    };
    // Either the call's own deadline or the channel's timer ends the client span.
    assert_ne!(rpc(SpanKind::Client).outcome(), SpanStatus::Ok);
    assert_eq!(rpc(SpanKind::Server).outcome(), SpanStatus::Cancelled);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn client_disconnect_cancels_every_span() {
    let server = start_stalled().await;

    let err = h2c()
        .get(format!("{}/v1/user/42", server.url()))
        .timeout(Duration::from_millis(200))
        .send()
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    let spans = server.wait_for_spans(3).await;
    assert_eq!(spans.len(), 3);
    for span in &spans {
        assert_eq!(span.outcome(), SpanStatus::Cancelled, "{}", span.name);
    }

    server.stop().await.unwrap();
}

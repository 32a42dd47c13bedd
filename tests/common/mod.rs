//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tonic::transport::Channel;

use greeter_gateway::config::ServerConfig;
use greeter_gateway::http::ServerError;
use greeter_gateway::lifecycle::Shutdown;
use greeter_gateway::net::Listener;
use opentelemetry_sdk::trace::{
    InMemorySpanExporter, InMemorySpanExporterBuilder, SdkTracerProvider,
};

use greeter_gateway::observability::{FinishedSpan, Tracer};
use greeter_gateway::rpc::proto::greeter_client::GreeterClient;
use greeter_gateway::users::{User, UserStore};
use greeter_gateway::HttpServer;

pub const PARENT_TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";
pub const PARENT_TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";

/// A server running on an ephemeral port with an in-memory tracer.
pub struct TestServer {
    pub addr: SocketAddr,
    pub spans: InMemorySpanExporter,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), ServerError>>,
}

pub fn seeded_users() -> Vec<User> {
    vec![User {
        id: 42,
        name: "Ada".into(),
        email: "ada@example.com".into(),
        phone: "555-0142".into(),
    }]
}

pub async fn start_server() -> TestServer {
    start_with(ServerConfig::default()).await
}

pub async fn start_with(config: ServerConfig) -> TestServer {
    start_inner(config, None).await
}

/// Start with a caller-supplied user store instead of the configured users.
pub async fn start_with_store(config: ServerConfig, users: Arc<dyn UserStore>) -> TestServer {
    start_inner(config, Some(users)).await
}

async fn start_inner(mut config: ServerConfig, users: Option<Arc<dyn UserStore>>) -> TestServer {
    config.listener.bind_address = "127.0.0.1:0".into();
    if config.users.is_empty() {
        config.users = seeded_users();
    }

    let spans = InMemorySpanExporterBuilder::new()
        .build();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(spans.clone())
        .build();
    let tracer = Tracer::new(provider, "greeter-test");
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut server = HttpServer::new(config, tracer);
    if let Some(users) = users {
        server = server.with_user_store(users);
    }
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        spans,
        shutdown,
        handle,
    }
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn grpc_client(&self) -> GreeterClient<Channel> {
        GreeterClient::connect(self.url()).await.unwrap()
    }

    /// Wait until at least `count` spans have been reported.
    pub async fn wait_for_spans(&self, count: usize) -> Vec<FinishedSpan> {
        for _ in 0..100 {
            let spans = self.finished_spans();
            if spans.len() >= count {
                return spans;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let spans = self.finished_spans();
        panic!("expected {count} spans, got {}: {spans:?}", spans.len());
    }

    pub fn finished_spans(&self) -> Vec<FinishedSpan> {
        self.spans.get_finished_spans().unwrap_or_default()
    }

    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(15), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
    }
}

pub fn span<'a>(spans: &'a [FinishedSpan], name: &str) -> &'a FinishedSpan {
    spans
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no span named {name} in {spans:?}"))
}

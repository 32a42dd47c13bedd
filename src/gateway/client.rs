//! The gateway's gRPC client back into its own server.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use axum::http::{HeaderMap, HeaderName};
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};

use crate::rpc::proto::greeter_client::GreeterClient;

/// HTTP headers with this prefix are forwarded as gRPC metadata, minus the
/// prefix.
pub const METADATA_PREFIX: &str = "grpc-metadata-";

/// Upstream URI for a server bound to `local`. Wildcard binds are reached
/// through the loopback address of the same family.
pub fn loopback_uri(local: SocketAddr) -> String {
    let ip = match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    format!("http://{}", SocketAddr::new(ip, local.port()))
}

/// A client that connects on first use, so the server need not be accepting
/// yet when the gateway is built.
pub fn connect_lazy(
    upstream: &str,
    connect_timeout: Duration,
) -> Result<GreeterClient<Channel>, tonic::transport::Error> {
    let channel = Endpoint::from_shared(upstream.to_string())?
        .connect_timeout(connect_timeout)
        .tcp_nodelay(true)
        .connect_lazy();
    Ok(GreeterClient::new(channel))
}

/// Finest resolution lost when a deadline is encoded as `grpc-timeout`.
const TIMEOUT_RESOLUTION: Duration = Duration::from_millis(1);

/// The channel enforces the forwarded `grpc-timeout` on its own and reports
/// expiry as `Cancelled`. A cancellation at the call's deadline is the
/// deadline, whichever timer fired first.
pub fn deadline_status(status: Status, remaining: Option<Duration>) -> Status {
    match remaining {
        Some(left) if status.code() == Code::Cancelled && left <= TIMEOUT_RESOLUTION => {
            Status::deadline_exceeded("deadline exceeded")
        }
        _ => status,
    }
}

/// Collect `Grpc-Metadata-*` headers into outbound metadata.
pub fn forwarded_metadata(headers: &HeaderMap) -> HeaderMap {
    let mut metadata = HeaderMap::new();
    for (name, value) in headers {
        let Some(key) = name.as_str().strip_prefix(METADATA_PREFIX) else {
            continue;
        };
        match HeaderName::from_bytes(key.as_bytes()) {
            Ok(key) => {
                metadata.append(key, value.clone());
            }
            Err(e) => tracing::debug!(header = %name, error = %e, "dropping metadata header"),
        }
    }
    metadata
}

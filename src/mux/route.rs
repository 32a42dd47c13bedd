use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Version};

const GRPC_MEDIA_TYPE: &str = "application/grpc";

/// Where the multiplexer sends a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Native gRPC server.
    Native,
    /// HTTP/JSON gateway.
    Gateway,
}

impl RouteDecision {
    /// Native only for HTTP/2 requests whose media type is `application/grpc`
    /// or one of its `+suffix` variants. Everything else, including
    /// `application/grpc-web`, is gateway traffic.
    pub fn classify(version: Version, headers: &HeaderMap) -> Self {
        let grpc = version == Version::HTTP_2
            && headers
                .get(CONTENT_TYPE)
                .is_some_and(is_grpc_content_type);
        if grpc {
            RouteDecision::Native
        } else {
            RouteDecision::Gateway
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::Native => "grpc",
            RouteDecision::Gateway => "gateway",
        }
    }
}

/// Case-insensitive match on the media type, ignoring parameters.
pub fn is_grpc_content_type(value: &HeaderValue) -> bool {
    let Ok(value) = value.to_str() else {
        return false;
    };
    let media_type = value.split(';').next().unwrap_or_default().trim();
    let Some(prefix) = media_type.get(..GRPC_MEDIA_TYPE.len()) else {
        return false;
    };
    if !prefix.eq_ignore_ascii_case(GRPC_MEDIA_TYPE) {
        return false;
    }
    matches!(media_type.as_bytes().get(GRPC_MEDIA_TYPE.len()), None | Some(b'+'))
}

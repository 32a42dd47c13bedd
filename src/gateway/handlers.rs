//! Route handlers: HTTP request → RPC → JSON response.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use tonic::Status;

use super::body::JsonBody;
use super::error::GatewayError;
use super::{GatewayState, IngressSpan};
use crate::rpc::methods;
use crate::rpc::proto::{Empty, HelloReply, HelloRequest, UserReq, UserRes};

pub async fn say_hello(
    State(state): State<GatewayState>,
    Extension(ingress): Extension<IngressSpan>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<HelloRequest>,
) -> Result<Json<HelloReply>, GatewayError> {
    let ctx = state.call_context(&headers, ingress);
    let reply = state
        .invoke(methods::SAY_HELLO, ctx, request, |mut client, request| async move {
            client.say_hello(request).await
        })
        .await?;
    Ok(Json(reply))
}

pub async fn logout(
    State(state): State<GatewayState>,
    Extension(ingress): Extension<IngressSpan>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<Empty>,
) -> Result<Json<Empty>, GatewayError> {
    let ctx = state.call_context(&headers, ingress);
    let reply = state
        .invoke(methods::LOGOUT, ctx, request, |mut client, request| async move {
            client.logout(request).await
        })
        .await?;
    Ok(Json(reply))
}

pub async fn get_user(
    State(state): State<GatewayState>,
    Extension(ingress): Extension<IngressSpan>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<UserRes>, GatewayError> {
    let id = id.parse::<u64>().map_err(|e| {
        Status::invalid_argument(format!("type mismatch, parameter: id, error: {e}"))
    })?;

    let ctx = state.call_context(&headers, ingress);
    let reply = state
        .invoke(methods::GET_USER, ctx, UserReq { id }, |mut client, request| async move {
            client.get_user(request).await
        })
        .await?;
    Ok(Json(reply))
}

pub async fn not_found() -> GatewayError {
    GatewayError(Status::not_found("Not Found"))
}

use async_trait::async_trait;
use tonic::Status;

use super::{Interceptor, Next, RpcResult, UnaryCall};
use crate::observability::metrics;

/// Rejects requests that fail their own field checks.
///
/// Messages without the validation capability pass untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValidationInterceptor;

#[async_trait]
impl Interceptor for ValidationInterceptor {
    fn name(&self) -> &'static str {
        "validate"
    }

    async fn intercept(&self, call: UnaryCall, next: Next<'_>) -> RpcResult {
        tracing::debug!(method = call.method, request = ?call.message, "received request");

        let verdict = call.message.as_validatable().map(|v| v.validate_all());
        if let Some(Err(violation)) = verdict {
            tracing::warn!(method = call.method, error = %violation, "request failed validation");
            metrics::record_validation_failure(call.method);
            return Err(Status::invalid_argument(violation.to_string()));
        }

        next.run(call).await
    }
}

//! Type-erased request messages and the optional validation capability.

use std::any::Any;
use std::fmt;

/// A field constraint a request message failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {message}.{field}: {reason}")]
pub struct FieldViolation {
    pub message: &'static str,
    pub field: &'static str,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(message: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            message,
            field,
            reason: reason.into(),
        }
    }
}

/// Self-check implemented by request messages that carry field constraints.
pub trait Validatable {
    /// Check every field, returning the first violation found.
    fn validate_all(&self) -> Result<(), FieldViolation>;
}

/// A decoded request message travelling through the interceptor chain.
///
/// Interceptors see requests only through this trait. Validation is looked up
/// with [`RpcMessage::as_validatable`]; types without constraints keep the
/// default and are always let through.
pub trait RpcMessage: Any + Send + fmt::Debug {
    fn as_validatable(&self) -> Option<&dyn Validatable> {
        None
    }

    /// Recover the concrete message at the end of the chain.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

/// Implement [`RpcMessage`] for a message type, optionally wiring in its
/// [`Validatable`] implementation.
#[macro_export]
macro_rules! rpc_message {
    ($ty:ty) => {
        impl $crate::rpc::RpcMessage for $ty {
            fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any + Send> {
                self
            }
        }
    };
    ($ty:ty, validated) => {
        impl $crate::rpc::RpcMessage for $ty {
            fn as_validatable(&self) -> Option<&dyn $crate::rpc::Validatable> {
                Some(self)
            }

            fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any + Send> {
                self
            }
        }
    };
}

//! Messages of the `grpc.greeter.helloworld` package and the generated
//! service stubs.
//!
//! Messages carry both the protobuf encoding (via `prost`) and the JSON
//! encoding the gateway speaks (via `serde`). Field tags and the
//! `HelloRequest.name` constraints match the published `helloworld` schema.

use serde::{Deserialize, Serialize};

use super::message::{FieldViolation, Validatable};
use super::wkt;

include!(concat!(env!("OUT_DIR"), "/grpc.greeter.helloworld.Greeter.rs"));

/// Shortest accepted greeting name, in characters.
pub const MIN_NAME_LEN: usize = 1;

/// Longest accepted greeting name, in characters.
pub const MAX_NAME_LEN: usize = 16;

/// Pattern every greeting name must match.
pub const NAME_PATTERN: &str = "^[a-zA-Z0-9_]*$";

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct HelloRequest {
    #[prost(string, tag = "1")]
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct HelloReply {
    #[prost(string, tag = "1")]
    #[serde(default)]
    pub message: String,
    #[prost(message, optional, tag = "2")]
    #[serde(default, with = "wkt::opt_list_value")]
    pub data: Option<prost_types::ListValue>,
    #[prost(message, optional, tag = "3")]
    #[serde(default, with = "wkt::opt_struct")]
    pub obj: Option<prost_types::Struct>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Clone, Copy, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct UserReq {
    #[prost(uint64, tag = "1")]
    #[serde(default, with = "wkt::u64_string")]
    pub id: u64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct UserRes {
    #[prost(uint64, tag = "1")]
    #[serde(default, with = "wkt::u64_string")]
    pub id: u64,
    #[prost(string, tag = "2")]
    #[serde(default)]
    pub name: String,
    #[prost(string, tag = "3")]
    #[serde(default)]
    pub email: String,
    #[prost(string, tag = "4")]
    #[serde(default)]
    pub phone: String,
}

impl Validatable for HelloRequest {
    fn validate_all(&self) -> Result<(), FieldViolation> {
        let len = self.name.chars().count();
        if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
            return Err(FieldViolation::new(
                "HelloRequest",
                "name",
                format!("value length must be between {MIN_NAME_LEN} and {MAX_NAME_LEN} runes, inclusive"),
            ));
        }
        if !self.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FieldViolation::new(
                "HelloRequest",
                "name",
                format!("value does not match regex pattern {NAME_PATTERN:?}"),
            ));
        }
        Ok(())
    }
}

crate::rpc_message!(HelloRequest, validated);
crate::rpc_message!(UserReq);
crate::rpc_message!(Empty);

//! JSON mapping for protobuf well-known types and 64-bit integers.
//!
//! `Struct`, `ListValue` and `Value` render as plain JSON objects, arrays and
//! scalars. 64-bit integers render as decimal strings and accept either form
//! on input.

use prost_types::{value::Kind, ListValue, NullValue, Struct, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value as Json};

pub fn value_to_json(value: &Value) -> Json {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => Json::Null,
        // NaN and infinities have no JSON form.
        Some(Kind::NumberValue(n)) => Number::from_f64(*n).map_or(Json::Null, Json::Number),
        Some(Kind::StringValue(s)) => Json::String(s.clone()),
        Some(Kind::BoolValue(b)) => Json::Bool(*b),
        Some(Kind::StructValue(s)) => struct_to_json(s),
        Some(Kind::ListValue(l)) => list_to_json(l),
    }
}

pub fn struct_to_json(value: &Struct) -> Json {
    Json::Object(
        value
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), value_to_json(value)))
            .collect(),
    )
}

pub fn list_to_json(value: &ListValue) -> Json {
    Json::Array(value.values.iter().map(value_to_json).collect())
}

pub fn json_to_value(json: &Json) -> Value {
    let kind = match json {
        Json::Null => Kind::NullValue(NullValue::NullValue as i32),
        Json::Bool(b) => Kind::BoolValue(*b),
        Json::Number(n) => Kind::NumberValue(n.as_f64().unwrap_or_default()),
        Json::String(s) => Kind::StringValue(s.clone()),
        Json::Array(items) => Kind::ListValue(json_to_list(items)),
        Json::Object(map) => Kind::StructValue(json_to_struct(map)),
    };
    Value { kind: Some(kind) }
}

pub fn json_to_struct(map: &Map<String, Json>) -> Struct {
    Struct {
        fields: map
            .iter()
            .map(|(key, value)| (key.clone(), json_to_value(value)))
            .collect(),
    }
}

pub fn json_to_list(items: &[Json]) -> ListValue {
    ListValue {
        values: items.iter().map(json_to_value).collect(),
    }
}

/// `serde(with)` adapter for an optional `google.protobuf.Struct` field.
pub mod opt_struct {
    use super::*;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(value: &Option<Struct>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => struct_to_json(value).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Struct>, D::Error> {
        match Option::<Json>::deserialize(deserializer)? {
            None | Some(Json::Null) => Ok(None),
            Some(Json::Object(map)) => Ok(Some(json_to_struct(&map))),
            Some(other) => Err(D::Error::custom(format!(
                "expected object for google.protobuf.Struct, found {other}"
            ))),
        }
    }
}

/// `serde(with)` adapter for an optional `google.protobuf.ListValue` field.
pub mod opt_list_value {
    use super::*;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(
        value: &Option<ListValue>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => list_to_json(value).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ListValue>, D::Error> {
        match Option::<Json>::deserialize(deserializer)? {
            None | Some(Json::Null) => Ok(None),
            Some(Json::Array(items)) => Ok(Some(json_to_list(&items))),
            Some(other) => Err(D::Error::custom(format!(
                "expected array for google.protobuf.ListValue, found {other}"
            ))),
        }
    }
}

/// `serde(with)` adapter for `uint64` fields.
pub mod u64_string {
    use super::*;
    use serde::de::Error as _;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        String(String),
    }

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::String(s) => s.trim().parse().map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn struct_to_and_from_json() {
        let json = json!({"a": 1.5, "b": [true, null, "x"], "c": {"d": "e"}});
        let Json::Object(map) = &json else { unreachable!() };
        let value = json_to_struct(map);
        assert_eq!(value.fields.len(), 3);
        assert_eq!(struct_to_json(&value), json);
    }

    #[test]
    fn non_finite_numbers_become_null() {
        let value = Value {
            kind: Some(Kind::NumberValue(f64::NAN)),
        };
        assert_eq!(value_to_json(&value), Json::Null);
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Id {
        #[serde(with = "u64_string")]
        id: u64,
    }

    #[test]
    fn u64_as_string() {
        assert_eq!(serde_json::to_value(Id { id: 42 }).unwrap(), json!({"id": "42"}));
        assert_eq!(serde_json::from_value::<Id>(json!({"id": "7"})).unwrap(), Id { id: 7 });
        assert_eq!(serde_json::from_value::<Id>(json!({"id": 7})).unwrap(), Id { id: 7 });
        assert!(serde_json::from_value::<Id>(json!({"id": "seven"})).is_err());
        assert!(serde_json::from_value::<Id>(json!({"id": -1})).is_err());
    }
}

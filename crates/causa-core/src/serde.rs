use std::collections::BTreeMap;
use std::iter::FromIterator;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::errors::{CausalError, ErrorInfo};

fn serde_error(code: &str, err: impl ToString) -> CausalError {
    CausalError::Serde(ErrorInfo::new(code, err.to_string()))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered = map
                .into_iter()
                .map(|(key, value)| (key, canonicalize(value)))
                .collect::<BTreeMap<_, _>>();
            Value::Object(Map::from_iter(ordered))
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Serializes a value into a JSON value with keys in sorted order.
pub fn to_canonical_value<T: Serialize>(value: &T) -> Result<Value, CausalError> {
    let value = serde_json::to_value(value).map_err(|err| serde_error("json_serialize", err))?;
    Ok(canonicalize(value))
}

/// Serializes a value into a JSON string, optionally pretty printed.
pub fn to_json_string<T: Serialize>(value: &T, pretty: bool) -> Result<String, CausalError> {
    let canonical = to_canonical_value(value)?;
    let rendered = if pretty {
        serde_json::to_string_pretty(&canonical)
    } else {
        serde_json::to_string(&canonical)
    };
    rendered.map_err(|err| serde_error("json_write", err))
}

/// Deserializes a value from JSON bytes.
pub fn from_json_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, CausalError> {
    serde_json::from_slice(data).map_err(|err| serde_error("json_deserialize", err))
}

/// Deserializes a YAML payload into the requested type.
pub fn from_yaml_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, CausalError> {
    serde_yaml::from_slice(data).map_err(|err| serde_error("yaml_deserialize", err))
}

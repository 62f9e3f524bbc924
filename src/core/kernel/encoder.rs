use crate::core::errors::ExchangeError;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Encode a request into a sorted, form-urlencoded parameter string.
///
/// Absent values (`None`, `""`) are dropped so `key=` never reaches the wire.
/// Sequences become repeated `key=value` pairs unless the field opts into
/// [`json_array`]. Keys are sorted with a stable sort, which keeps repeated
/// values in their original order and makes the output independent of field
/// declaration order.
pub fn encode<P>(params: &P) -> Result<String, ExchangeError>
where
    P: Serialize + ?Sized,
{
    let value = serde_json::to_value(params)
        .map_err(|e| ExchangeError::EncodingError(format!("Failed to serialize request: {}", e)))?;

    let fields = match value {
        Value::Null => return Ok(String::new()),
        Value::Object(fields) => fields,
        other => {
            return Err(ExchangeError::EncodingError(format!(
                "Request must serialize to an object, got {}",
                kind(&other)
            )))
        }
    };

    let mut pairs: Vec<(String, String)> = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar(&key, item)? {
                        pairs.push((key.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = scalar(&key, other)? {
                    pairs.push((key, text));
                }
            }
        }
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    serde_urlencoded::to_string(&pairs)
        .map_err(|e| ExchangeError::EncodingError(format!("Failed to encode parameters: {}", e)))
}

fn scalar(key: &str, value: Value) -> Result<Option<String>, ExchangeError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(ExchangeError::EncodingError(format!(
            "Field '{}' cannot be encoded as a parameter ({})",
            key,
            kind(&other)
        ))),
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serialize a list as a single JSON array value, e.g.
/// `symbols=["BTCUSDT","ETHUSDT"]`.
///
/// Use as `#[serde(serialize_with = "json_array", skip_serializing_if = "Vec::is_empty")]`.
pub fn json_array<S>(items: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let encoded = serde_json::to_string(items).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&encoded)
}

//! Decoding of upstream bodies that may or may not be wrapped in `{ "value": ... }`.
//!
//! The upstream is inconsistent about both the wrapper and key casing
//! (`CustomerId` vs `customerId`, `OTPCode` vs `otpCode`). Bodies are first
//! parsed into a `serde_json::Value`, every object key is lowercased, and the
//! payload inside a non-null `value` key is decoded on its own. Anything else
//! is decoded as it stands. Models read by this module name their fields in
//! lowercase for deserialization.

use crate::errors::GatewayError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// The two shapes an upstream payload can arrive in.
#[derive(Debug)]
pub enum Envelope<T> {
    Wrapped { value: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { value } => value,
            Envelope::Bare(inner) => inner,
        }
    }

    pub fn was_wrapped(&self) -> bool {
        matches!(self, Envelope::Wrapped { .. })
    }
}

/// Free-form maps whose keys are display text and must survive as sent.
const VERBATIM_MAPS: &[&str] = &["additionalinfo"];

/// Recursively lowercases every object key, except inside [`VERBATIM_MAPS`].
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut normalized = Map::with_capacity(map.len());
            for (key, inner) in map {
                let key = key.to_lowercase();
                let inner = if VERBATIM_MAPS.contains(&key.as_str()) {
                    inner
                } else {
                    normalize_keys(inner)
                };
                normalized.insert(key, inner);
            }
            Value::Object(normalized)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Parses a body and normalizes its keys without committing to a target type.
pub fn parse_normalized(body: &str) -> Result<Value, GatewayError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::Unexpected(format!("response is not JSON: {}", e)))?;
    Ok(normalize_keys(value))
}

/// Splits a normalized payload into its envelope shape without decoding it.
///
/// An object with a non-null `value` key is wrapped; anything else is bare.
pub fn unwrap_value(value: Value) -> Envelope<Value> {
    match value {
        Value::Object(mut map) if map.get("value").is_some_and(|v| !v.is_null()) => {
            match map.remove("value") {
                Some(inner) => Envelope::Wrapped { value: inner },
                None => Envelope::Bare(Value::Object(map)),
            }
        }
        other => Envelope::Bare(other),
    }
}

/// Decodes a payload that may be enveloped or bare.
///
/// A wrapped payload is decoded from its `value` alone; when that fails the
/// error is returned as is, never retried against the outer object.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    let envelope = unwrap_value(parse_normalized(body)?);
    let wrapped = envelope.was_wrapped();
    serde_json::from_value(envelope.into_inner()).map_err(|e| {
        let shape = if wrapped { "enveloped" } else { "bare" };
        GatewayError::Unexpected(format!("unreadable {} response: {}", shape, e))
    })
}

/// Pulls the upstream `message` field out of an error body, if any.
pub fn error_message(body: &str) -> Option<String> {
    let value = parse_normalized(body).ok()?;
    match value.get("message")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Null => None,
        Value::String(_) => None,
        other => Some(other.to_string()),
    }
}

/// Result of a profile save as reported by the `{ success, message }` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SaveBody {
    success: Option<bool>,
    message: Option<String>,
}

/// Interprets the body of a 2xx save response.
///
/// An unreadable body, or one without a `success` flag, counts as success:
/// the HTTP status already said so.
pub fn save_outcome(body: &str) -> SaveOutcome {
    let parsed = parse_normalized(body)
        .ok()
        .and_then(|value| serde_json::from_value::<SaveBody>(value).ok());

    match parsed {
        Some(SaveBody {
            success: Some(false),
            message,
        }) => SaveOutcome {
            success: false,
            message,
        },
        Some(SaveBody { message, .. }) => SaveOutcome {
            success: true,
            message,
        },
        None => {
            tracing::warn!("Save response body could not be parsed; trusting 2xx status");
            SaveOutcome {
                success: true,
                message: None,
            }
        }
    }
}

//! Errors raised while decoding raw host payloads.
//!
//! Reconcilers never surface these to callers as failures; they map them onto
//! their outcome enums and log the cause.

use serde_json::Value;
use thiserror::Error;

use crate::readers::Object;

pub type Result<T> = std::result::Result<T, ReconcileError>;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("payload is not valid JSON")]
    Parse(#[from] serde_json::Error),

    #[error("payload is a JSON {found}, expected an object")]
    NotAnObject { found: &'static str },
}

/// Parses a host JSON string.
pub fn parse_payload(json: &str) -> Result<Value> {
    Ok(serde_json::from_str(json)?)
}

/// Requires `value` to be a JSON object.
pub fn require_object(value: &Value) -> Result<&Object> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Err(ReconcileError::NotAnObject { found: "null" }),
        Value::Bool(_) => Err(ReconcileError::NotAnObject { found: "boolean" }),
        Value::Number(_) => Err(ReconcileError::NotAnObject { found: "number" }),
        Value::String(_) => Err(ReconcileError::NotAnObject { found: "string" }),
        Value::Array(_) => Err(ReconcileError::NotAnObject { found: "array" }),
    }
}

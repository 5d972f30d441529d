//! HTTP handlers, one module per resource.

pub mod catalog;
pub mod orders;
pub mod payments;
pub mod users;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;

/// Request bodies are untyped JSON documents; anything but an object is a
/// validation failure at the boundary.
pub(crate) fn require_object(body: Value) -> Result<Map<String, Value>, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::validation("request body must be a JSON object")),
    }
}

/// Malformed ids behave like missing documents: a clear 404, never an
/// unhandled fault.
pub(crate) fn parse_document_id(id: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::not_found(format!("{what} {id} not found")))
}

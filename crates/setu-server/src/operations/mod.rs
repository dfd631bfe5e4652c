//! Terminology operations.
//!
//! `$expand`, `$lookup`, and `$translate` over the locally stored NAMASTE
//! code system and curated concept maps, augmented with live WHO ICD-11
//! results where configured. ICD outages degrade these operations to
//! local-only answers; they never turn into 5xx responses.

pub mod expand;
pub mod lookup;
pub mod translate;

use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use setu_api::{ApiError, FHIR_JSON};
use setu_storage::StorageError;

/// Errors raised while executing a terminology operation.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<OperationError> for ApiError {
    fn from(err: OperationError) -> Self {
        match err {
            OperationError::InvalidParameters(msg) => ApiError::bad_request(msg),
            OperationError::NotFound(msg) => ApiError::not_found(msg),
            OperationError::Internal(msg) => ApiError::internal(msg),
        }
    }
}

impl From<StorageError> for OperationError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { resource_type, id } => {
                OperationError::NotFound(format!("{resource_type}/{id}"))
            }
            other => OperationError::Internal(other.to_string()),
        }
    }
}

/// Renders a resource body with the FHIR JSON content type.
pub(crate) fn fhir_json(value: Value) -> Response {
    let mut response = axum::Json(value).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON));
    response
}

/// Reads a named parameter from a FHIR Parameters resource, accepting any of
/// the given value keys (`valueCode`, `valueUri`, ...).
pub(crate) fn parameters_value(params: &Value, name: &str, value_keys: &[&str]) -> Option<String> {
    let parameters = params.get("parameter")?.as_array()?;
    parameters
        .iter()
        .find(|p| p.get("name").and_then(Value::as_str) == Some(name))
        .and_then(|p| {
            value_keys
                .iter()
                .find_map(|key| p.get(*key).and_then(Value::as_str))
        })
        .map(String::from)
}

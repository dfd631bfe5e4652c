//! HTTP API types shared by the Setu server.
//!
//! Errors are rendered as FHIR `OperationOutcome` resources with the
//! `application/fhir+json` content type, including for the non-FHIR auth and
//! admin surfaces, so clients deal with a single error shape.

mod parameters;

pub use parameters::{ParametersBuilder, PartBuilder};

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use setu_storage::StorageError;
use thiserror::Error;

/// FHIR JSON media type used on every response body the server produces.
pub const FHIR_JSON: &str = "application/fhir+json";

/// Minimal FHIR OperationOutcome representation for API error responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationOutcome {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str, // always "OperationOutcome"
    pub issue: Vec<OperationOutcomeIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationOutcomeIssue {
    /// FHIR issue severity: fatal | error | warning | information
    pub severity: &'static str,
    /// FHIR issue type code (subset used): invalid | login | forbidden | not-found | conflict | not-supported | exception
    pub code: &'static str,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

impl OperationOutcome {
    pub fn single(
        severity: &'static str,
        code: &'static str,
        diagnostics: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: "OperationOutcome",
            issue: vec![OperationOutcomeIssue {
                severity,
                code,
                diagnostics: Some(diagnostics.into()),
            }],
        }
    }
}

/// High-level API errors mapped to HTTP responses and FHIR OperationOutcome
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
    pub fn unsupported_media_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedMediaType(msg.into())
    }
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::NotImplemented(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_operation_outcome(&self) -> OperationOutcome {
        match self {
            ApiError::BadRequest(msg) => OperationOutcome::single("error", "invalid", msg),
            ApiError::Unauthorized(msg) => OperationOutcome::single("error", "login", msg),
            ApiError::Forbidden(msg) => OperationOutcome::single("error", "forbidden", msg),
            ApiError::NotFound(msg) => OperationOutcome::single("error", "not-found", msg),
            ApiError::Conflict(msg) => OperationOutcome::single("error", "conflict", msg),
            ApiError::UnsupportedMediaType(msg) => {
                OperationOutcome::single("error", "not-supported", msg)
            }
            ApiError::NotImplemented(msg) => {
                OperationOutcome::single("error", "not-supported", msg)
            }
            ApiError::Internal(msg) => OperationOutcome::single("fatal", "exception", msg),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { resource_type, id } => {
                ApiError::not_found(format!("{resource_type}/{id}"))
            }
            StorageError::AlreadyExists { resource_type, id } => {
                ApiError::conflict(format!("{resource_type}/{id} already exists"))
            }
            StorageError::InvalidResource { message } => ApiError::bad_request(message),
            StorageError::Serialization(e) => ApiError::internal(e.to_string()),
            StorageError::Internal { message } => ApiError::internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let outcome = self.to_operation_outcome();
        let body = serde_json::to_vec(&outcome).unwrap_or_else(|_| {
            let fallback = OperationOutcome::single("fatal", "exception", "Serialization failure");
            serde_json::to_vec(&fallback).unwrap_or_else(|_| b"{}".to_vec())
        });

        let mut builder = axum::http::Response::builder().status(status);
        builder = builder.header(header::CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON));

        builder
            .body(axum::body::Body::from(body))
            .unwrap_or_else(|_| {
                axum::http::Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .header(header::CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON))
                    .body(axum::body::Body::from("{}"))
                    .expect("build fallback response")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_into_response_sets_status_and_content_type() {
        let resp = ApiError::bad_request("Invalid parameter").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap();
        assert_eq!(content_type, &HeaderValue::from_static(FHIR_JSON));
    }

    #[test]
    fn test_unauthorized_uses_login_issue_code() {
        let outcome = ApiError::unauthorized("Missing bearer token").to_operation_outcome();
        assert_eq!(outcome.issue[0].code, "login");
        assert_eq!(outcome.issue[0].severity, "error");
    }

    #[test]
    fn test_internal_is_fatal_exception() {
        let outcome = ApiError::internal("boom").to_operation_outcome();
        assert_eq!(outcome.issue[0].severity, "fatal");
        assert_eq!(outcome.issue[0].code, "exception");
    }

    #[test]
    fn test_storage_error_mapping() {
        let err: ApiError = StorageError::not_found("Condition", "42").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ApiError = StorageError::already_exists("User", "alice").into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: ApiError = StorageError::invalid_resource("missing code").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = StorageError::internal("index corrupt").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_outcome_serializes_resource_type() {
        let outcome = OperationOutcome::single("error", "not-found", "Condition/42");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["resourceType"], "OperationOutcome");
        assert_eq!(json["issue"][0]["diagnostics"], "Condition/42");
    }
}

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::json;

use crate::operations::fhir_json;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Setu Terminology Server",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz() -> impl IntoResponse {
    // The in-memory backend is always ready once the process is up.
    (StatusCode::OK, Json(HealthResponse { status: "ready" }))
}

pub async fn metadata() -> impl IntoResponse {
    let body = json!({
        "resourceType": "CapabilityStatement",
        "status": "active",
        "kind": "instance",
        "software": { "name": "Setu Terminology Server", "version": env!("CARGO_PKG_VERSION") },
        "fhirVersion": "4.0.1",
        "format": ["application/fhir+json"],
        "rest": [{
            "mode": "server",
            "resource": [
                {
                    "type": "ValueSet",
                    "operation": [{"name": "expand", "definition": "http://hl7.org/fhir/OperationDefinition/ValueSet-expand"}]
                },
                {
                    "type": "CodeSystem",
                    "operation": [{"name": "lookup", "definition": "http://hl7.org/fhir/OperationDefinition/CodeSystem-lookup"}]
                },
                {
                    "type": "ConceptMap",
                    "operation": [{"name": "translate", "definition": "http://hl7.org/fhir/OperationDefinition/ConceptMap-translate"}]
                },
                {
                    "type": "Condition",
                    "interaction": [{"code": "create"}, {"code": "read"}, {"code": "search-type"}]
                }
            ]
        }]
    });
    fhir_json(body)
}

pub async fn favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn test_healthz_is_ok() {
        let res = healthz().await.into_response();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_favicon_is_no_content() {
        let res = favicon().await.into_response();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }
}

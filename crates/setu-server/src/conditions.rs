//! Dual-coded Condition resources.
//!
//! Conditions carry a `CodeableConcept` holding the NAMASTE coding alongside
//! its ICD-11 counterpart. Storage is record-based; the handlers render FHIR
//! Condition JSON at the edge.

use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use serde_json::{Value, json};
use setu_api::ApiError;
use setu_auth::AuthContext;
use setu_core::fhir::CodeableConcept;
use setu_core::time::now_utc;
use setu_storage::{ConditionRecord, ConditionStore, PageRequest};

use crate::operations::fhir_json;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ConditionSearchQuery {
    /// Patient reference filter, e.g. `Patient/123`.
    pub patient: Option<String>,
    pub count: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    axum::Json(body): axum::Json<Value>,
) -> Result<Response, ApiError> {
    let record = parse_condition(&body, &auth.username)?;
    let created = state.conditions.create(record).await?;

    tracing::info!(
        id = created.id,
        patient = %created.patient_id,
        created_by = %created.created_by,
        "Condition created"
    );
    let mut response = fhir_json(render_condition(&created));
    *response.status_mut() = StatusCode::CREATED;
    Ok(response)
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<ConditionSearchQuery>,
) -> Result<Response, ApiError> {
    let defaults = &state.config.search;
    let count = query
        .count
        .unwrap_or(defaults.default_count)
        .min(defaults.max_count);
    let offset = query.offset.unwrap_or(0);

    let page = state
        .conditions
        .list(query.patient.as_deref(), &PageRequest::new(offset, count))
        .await?;

    let entries: Vec<Value> = page
        .items
        .iter()
        .map(|record| json!({"resource": render_condition(record)}))
        .collect();

    Ok(fhir_json(json!({
        "resourceType": "Bundle",
        "type": "searchset",
        "total": page.total,
        "entry": entries,
    })))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let parsed: u64 = id
        .parse()
        .map_err(|_| ApiError::not_found(format!("Condition/{id}")))?;

    match state.conditions.get(parsed).await? {
        Some(record) => Ok(fhir_json(render_condition(&record))),
        None => Err(ApiError::not_found(format!("Condition/{id}"))),
    }
}

fn parse_condition(body: &Value, created_by: &str) -> Result<ConditionRecord, ApiError> {
    if let Some(resource_type) = body.get("resourceType").and_then(Value::as_str)
        && resource_type != "Condition"
    {
        return Err(ApiError::bad_request(format!(
            "Expected resourceType 'Condition', got '{resource_type}'"
        )));
    }

    let patient_id = body
        .get("subject")
        .and_then(|s| s.get("reference"))
        .and_then(Value::as_str)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::bad_request("subject.reference is required"))?
        .to_string();

    let code: CodeableConcept = body
        .get("code")
        .cloned()
        .ok_or_else(|| ApiError::bad_request("code is required"))
        .and_then(|v| {
            serde_json::from_value(v).map_err(|e| ApiError::bad_request(format!("invalid code: {e}")))
        })?;
    if !code.is_coded() {
        return Err(ApiError::bad_request("code must carry at least one coding"));
    }

    let clinical_status = body
        .get("clinicalStatus")
        .and_then(|status| {
            status
                .get("coding")
                .and_then(Value::as_array)
                .and_then(|codings| codings.first())
                .and_then(|coding| coding.get("code"))
                .or_else(|| status.get("text"))
        })
        .and_then(Value::as_str)
        .map(String::from);

    Ok(ConditionRecord {
        id: 0,
        patient_id,
        code,
        clinical_status,
        created_by: created_by.to_string(),
        created_at: now_utc(),
    })
}

fn render_condition(record: &ConditionRecord) -> Value {
    let mut condition = json!({
        "resourceType": "Condition",
        "id": record.id.to_string(),
        "subject": {"reference": record.patient_id},
        "code": record.code,
        "recordedDate": record.created_at.to_string(),
        "recorder": {"display": record.created_by},
    });
    if let Some(status) = &record.clinical_status {
        condition["clinicalStatus"] = json!({
            "coding": [{
                "system": "http://terminology.hl7.org/CodeSystem/condition-clinical",
                "code": status,
            }]
        });
    }
    condition
}

#[cfg(test)]
mod tests {
    use super::*;
    use setu_core::fhir::{ICD11_MMS_URI, NAMASTE_SYSTEM_URI};

    fn dual_coded_body() -> Value {
        json!({
            "resourceType": "Condition",
            "subject": {"reference": "Patient/123"},
            "clinicalStatus": {"coding": [{"code": "active"}]},
            "code": {
                "coding": [
                    {"system": NAMASTE_SYSTEM_URI, "code": "NAM-0042", "display": "Jvara"},
                    {"system": ICD11_MMS_URI, "code": "MG26", "display": "Fever, unspecified"}
                ],
                "text": "Fever"
            }
        })
    }

    #[test]
    fn test_parse_dual_coded_condition() {
        let record = parse_condition(&dual_coded_body(), "dr.rao").unwrap();
        assert_eq!(record.patient_id, "Patient/123");
        assert_eq!(record.code.coding.len(), 2);
        assert_eq!(record.clinical_status.as_deref(), Some("active"));
        assert_eq!(record.created_by, "dr.rao");
    }

    #[test]
    fn test_parse_rejects_missing_subject() {
        let mut body = dual_coded_body();
        body.as_object_mut().unwrap().remove("subject");
        assert!(parse_condition(&body, "dr.rao").is_err());
    }

    #[test]
    fn test_parse_rejects_uncoded_concept() {
        let mut body = dual_coded_body();
        body["code"] = json!({"text": "free text only"});
        assert!(parse_condition(&body, "dr.rao").is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_resource_type() {
        let mut body = dual_coded_body();
        body["resourceType"] = json!("Observation");
        assert!(parse_condition(&body, "dr.rao").is_err());
    }

    #[test]
    fn test_render_round_trips_code() {
        let record = parse_condition(&dual_coded_body(), "dr.rao").unwrap();
        let rendered = render_condition(&record);
        assert_eq!(rendered["resourceType"], "Condition");
        assert_eq!(rendered["code"]["coding"][1]["code"], "MG26");
        assert_eq!(rendered["clinicalStatus"]["coding"][0]["code"], "active");
        assert!(rendered["recordedDate"].is_string());
    }
}

//! ConceptMap $translate Operation
//!
//! Translates a source code through the curated concept maps. When no curated
//! mapping exists and the requested target is ICD-11 (or unspecified), the
//! response instead carries up to five `relatedto` candidates found via ICD
//! search, each flagged for human review. `result` is true only when a
//! curated mapping matched.

use axum::Extension;
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use serde_json::Value;
use setu_api::{ApiError, ParametersBuilder, PartBuilder};
use setu_auth::AuthContext;
use setu_core::fhir::{Coding, ICD11_MMS_URI, is_icd11_system};
use setu_core::time::now_utc;
use setu_icd::IcdError;
use setu_storage::{AuditStore, ConceptStore, MappingStore, TranslationRecord};

use crate::operations::{OperationError, fhir_json, parameters_value};
use crate::server::AppState;

/// Ceiling on advisory candidates pulled from ICD search.
const MAX_ICD_CANDIDATES: usize = 5;

const CANDIDATE_COMMENT: &str = "Candidate match from ICD search - requires review";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub system: Option<String>,
    pub code: Option<String>,
    pub target_system: Option<String>,
}

impl TranslateRequest {
    /// Accepts either a FHIR Parameters resource or a flat request body.
    fn from_body(body: &Value) -> Result<Self, OperationError> {
        if body.get("resourceType").and_then(Value::as_str) == Some("Parameters") {
            return Ok(Self {
                system: parameters_value(body, "system", &["valueUri", "valueString"]),
                code: parameters_value(body, "code", &["valueCode", "valueString"]),
                target_system: parameters_value(body, "targetSystem", &["valueUri", "valueString"])
                    .or_else(|| parameters_value(body, "target", &["valueUri", "valueString"])),
            });
        }
        serde_json::from_value(body.clone())
            .map_err(|e| OperationError::InvalidParameters(format!("invalid request body: {e}")))
    }

    fn validated(self) -> Result<(String, String, Option<String>), OperationError> {
        let system = self
            .system
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OperationError::InvalidParameters("system is required".into()))?;
        let code = self
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| OperationError::InvalidParameters("code is required".into()))?;
        Ok((system, code, self.target_system.filter(|t| !t.is_empty())))
    }
}

struct TranslationMatch {
    equivalence: &'static str,
    concept: Coding,
    comment: Option<String>,
}

pub async fn handle_get(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    Query(request): Query<TranslateRequest>,
) -> Result<Response, ApiError> {
    execute(state, request, auth.map(|Extension(ctx)| ctx)).await
}

pub async fn handle_post(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    axum::Json(body): axum::Json<Value>,
) -> Result<Response, ApiError> {
    let request = TranslateRequest::from_body(&body)?;
    execute(state, request, auth.map(|Extension(ctx)| ctx)).await
}

async fn execute(
    state: AppState,
    request: TranslateRequest,
    auth: Option<AuthContext>,
) -> Result<Response, ApiError> {
    let (system, code, target_system) = request.validated()?;

    let mappings = state
        .mappings
        .find(&system, &code)
        .await
        .map_err(OperationError::from)?;

    let mut matches: Vec<TranslationMatch> = mappings
        .into_iter()
        .filter(|m| {
            target_system
                .as_deref()
                .is_none_or(|target| m.target_system == target)
        })
        .map(|m| TranslationMatch {
            equivalence: m.equivalence.as_str(),
            concept: Coding::new(&m.target_system, &m.target_code),
            comment: m.comment,
        })
        .collect();
    let found = !matches.is_empty();

    // Decorate curated matches with locally known displays.
    for m in &mut matches {
        if let (Some(target), Some(target_code)) = (m.concept.system.clone(), m.concept.code.clone())
            && let Ok(Some(concept)) = state.concepts.find(&target, &target_code).await
        {
            m.concept.display = Some(concept.display);
        }
    }

    if !found
        && target_system
            .as_deref()
            .is_none_or(is_icd11_system)
    {
        matches.extend(icd_candidates(&state, &code).await);
    }

    let mut builder = ParametersBuilder::new().value_boolean("result", found);
    for m in &matches {
        let mut part = PartBuilder::new()
            .value_code("equivalence", m.equivalence)
            .value_coding("concept", &m.concept);
        if let Some(comment) = &m.comment {
            part = part.value_string("comment", comment);
        }
        builder = builder.part("match", part);
    }
    let parameters = builder.build();

    tracing::info!(
        system,
        code,
        found,
        matches = matches.len(),
        "Translation request processed"
    );

    record_audit(&state, &system, &code, &parameters, auth).await;

    Ok(fhir_json(parameters))
}

async fn icd_candidates(state: &AppState, code: &str) -> Vec<TranslationMatch> {
    match state.icd.search(code).await {
        Ok(hits) => {
            let candidates: Vec<TranslationMatch> = hits
                .into_iter()
                .take(MAX_ICD_CANDIDATES)
                .map(|hit| TranslationMatch {
                    equivalence: "relatedto",
                    concept: Coding::new(ICD11_MMS_URI, hit.code).with_display(hit.title),
                    comment: Some(CANDIDATE_COMMENT.to_string()),
                })
                .collect();
            if !candidates.is_empty() {
                tracing::info!(code, candidates = candidates.len(), "Found ICD candidate matches");
            }
            candidates
        }
        Err(IcdError::Disabled) => Vec::new(),
        Err(err) => {
            tracing::warn!(error = %err, code, "ICD candidate search failed");
            Vec::new()
        }
    }
}

/// Best-effort audit trail; a write failure never fails the translation.
async fn record_audit(
    state: &AppState,
    system: &str,
    code: &str,
    parameters: &Value,
    auth: Option<AuthContext>,
) {
    let entry = TranslationRecord {
        id: 0,
        source_system: system.to_string(),
        source_code: code.to_string(),
        result: parameters.clone(),
        username: auth.map(|ctx| ctx.username),
        created_at: now_utc(),
    };
    if let Err(err) = state.audit.record(entry).await {
        tracing::warn!(error = %err, "Failed to record translation audit entry");
    }
}

//! CodeSystem $lookup Operation
//!
//! Resolves a single code to its display, definition, and version. Local
//! concepts answer first; a miss against an ICD-11 system URI falls through
//! to live entity resolution. The `version` parameter is accepted but the
//! store holds one version per system, so it does not narrow the lookup.

use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use setu_api::{ApiError, ParametersBuilder};
use setu_core::{NAMASTE_SYSTEM_URI, is_icd11_system};
use setu_icd::{IcdError, entity_definition, entity_title};
use setu_storage::ConceptStore;

use crate::operations::fhir_json;
use crate::server::AppState;

/// Display name of the code system, the `name` parameter of the response.
fn system_label(system: &str) -> &str {
    if system == NAMASTE_SYSTEM_URI {
        "NAMASTE"
    } else if is_icd11_system(system) {
        "ICD-11"
    } else {
        system
    }
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub system: Option<String>,
    pub code: Option<String>,
    #[allow(dead_code)]
    pub version: Option<String>,
}

pub async fn handle(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Result<Response, ApiError> {
    let Some(system) = query.system.as_deref().filter(|s| !s.is_empty()) else {
        return Err(ApiError::bad_request("system parameter is required"));
    };
    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return Err(ApiError::bad_request("code parameter is required"));
    };

    if let Some(concept) = state
        .concepts
        .find(system, code)
        .await
        .map_err(crate::operations::OperationError::from)?
    {
        let mut builder = ParametersBuilder::new()
            .value_string("name", system_label(system))
            .value_string("display", &concept.display);
        if let Some(definition) = &concept.definition {
            builder = builder.value_string("definition", definition);
        }
        builder = builder.value_string("version", &concept.version);
        tracing::info!(system, code, "Looked up code locally");
        return Ok(fhir_json(builder.build()));
    }

    // Fall through to the ICD API for its own code space.
    if is_icd11_system(system) {
        return lookup_icd(&state, system, code).await;
    }

    tracing::debug!(system, code, "Code not found");
    Err(ApiError::not_found(format!(
        "Code '{code}' not found in system '{system}'"
    )))
}

async fn lookup_icd(state: &AppState, system: &str, code: &str) -> Result<Response, ApiError> {
    match state.icd.resolve_entity(code).await {
        Ok(Some(entity)) => {
            let display = entity_title(&entity).unwrap_or_default();
            let mut builder = ParametersBuilder::new()
                .value_string("name", system_label(system))
                .value_string("display", display);
            if let Some(definition) = entity_definition(&entity) {
                builder = builder.value_string("definition", definition);
            }
            tracing::info!(code, "Resolved code via ICD API");
            Ok(fhir_json(builder.build()))
        }
        Ok(None) => Err(ApiError::not_found(format!(
            "Code '{code}' not found in system '{system}'"
        ))),
        Err(IcdError::Disabled) => Err(ApiError::not_found(format!(
            "Code '{code}' not found in system '{system}'"
        ))),
        Err(err) => {
            // A WHO outage reads as a miss, not a server failure.
            tracing::warn!(error = %err, code, "ICD lookup failed");
            Err(ApiError::not_found(format!(
                "Code '{code}' not found in system '{system}'"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setu_core::ICD11_MMS_URI;

    #[test]
    fn test_system_label() {
        assert_eq!(system_label(NAMASTE_SYSTEM_URI), "NAMASTE");
        assert_eq!(system_label(ICD11_MMS_URI), "ICD-11");
        assert_eq!(system_label("http://snomed.info/sct"), "http://snomed.info/sct");
    }
}

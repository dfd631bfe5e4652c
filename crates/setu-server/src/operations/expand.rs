//! ValueSet $expand Operation
//!
//! Pages through the requested code system, narrowed by an optional filter.
//! When a filter is present and the local page comes back underfilled, the
//! remainder is topped up with live ICD-11 flexisearch hits. `expansion.total`
//! counts local matches only; augmented entries are advisory extras.

use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use serde_json::{Value, json};
use setu_api::ApiError;
use setu_core::ICD11_MMS_URI;
use setu_core::time::now_utc;
use setu_icd::IcdError;
use setu_storage::{ConceptStore, PageRequest};

use crate::operations::fhir_json;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ExpandQuery {
    /// Code system URI to expand. Defaults to the NAMASTE system.
    pub url: Option<String>,
    /// Case-insensitive substring filter over code and display.
    pub filter: Option<String>,
    pub count: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn handle(
    State(state): State<AppState>,
    Query(query): Query<ExpandQuery>,
) -> Result<Response, ApiError> {
    let defaults = &state.config.search;
    let count = query
        .count
        .unwrap_or(defaults.default_count)
        .min(defaults.max_count);
    if count == 0 {
        return Err(ApiError::bad_request("count must be > 0"));
    }
    let offset = query.offset.unwrap_or(0);
    let url = query
        .url
        .clone()
        .unwrap_or_else(|| state.config.namaste.system_uri.clone());
    let filter = query.filter.as_deref().map(str::trim).filter(|f| !f.is_empty());

    let page = state
        .concepts
        .search(&url, filter, &PageRequest::new(offset, count))
        .await
        .map_err(crate::operations::OperationError::from)?;

    let mut contains: Vec<Value> = page
        .items
        .iter()
        .map(|concept| {
            json!({
                "system": concept.system_uri,
                "code": concept.code,
                "display": concept.display,
            })
        })
        .collect();

    if let Some(filter) = filter
        && contains.len() < count
    {
        augment_with_icd(&state, filter, count - contains.len(), &mut contains).await;
    }

    let body = json!({
        "resourceType": "ValueSet",
        "url": url,
        "expansion": {
            "timestamp": now_utc().to_string(),
            "total": page.total,
            "offset": offset,
            "contains": contains,
        }
    });
    Ok(fhir_json(body))
}

/// Tops up an underfilled expansion page with ICD-11 search hits.
///
/// ICD failures are logged and otherwise ignored; the local page stands.
async fn augment_with_icd(
    state: &AppState,
    filter: &str,
    remaining: usize,
    contains: &mut Vec<Value>,
) {
    match state.icd.search(filter).await {
        Ok(hits) => {
            let added = hits.len().min(remaining);
            for hit in hits.into_iter().take(remaining) {
                contains.push(json!({
                    "system": ICD11_MMS_URI,
                    "code": hit.code,
                    "display": hit.title,
                }));
            }
            if added > 0 {
                tracing::info!(filter, added, "Augmented expansion with ICD results");
            }
        }
        Err(IcdError::Disabled) => {
            tracing::debug!("ICD augmentation skipped, integration disabled");
        }
        Err(err) => {
            tracing::warn!(error = %err, filter, "Failed to augment expansion with ICD results");
        }
    }
}

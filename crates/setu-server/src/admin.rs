//! Administrative endpoints.
//!
//! CSV ingestion for code systems and concept maps, the translation audit
//! trail, and counters. Everything here requires `ROLE_ADMIN`; malformed CSV
//! rows are skipped and logged rather than failing the whole upload.

use axum::Extension;
use axum::extract::{Multipart, Query, State};
use serde::{Deserialize, Serialize};
use setu_api::ApiError;
use setu_auth::{AuthContext, Role, require_role};
use setu_core::Concept;
use setu_core::mapping::{ConceptMapping, Equivalence};
use setu_storage::{
    AuditStore, ConceptStore, MappingStore, Page, PageRequest, TranslationRecord,
};

use crate::server::AppState;

#[derive(Debug, Deserialize)]
struct CodeCsvRow {
    system: String,
    code: String,
    display: String,
    definition: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConceptMapCsvRow {
    source_system: String,
    source_code: String,
    target_system: String,
    target_code: String,
    equivalence: String,
    comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadSummary {
    pub imported: usize,
    pub filename: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_codes: usize,
    pub total_concept_maps: usize,
    pub total_translations: usize,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub count: Option<usize>,
    pub offset: Option<usize>,
}

/// Pulls the `file` part out of a multipart upload.
async fn read_upload(mut multipart: Multipart) -> Result<(Vec<u8>, String), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("invalid multipart body: {err}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload.csv").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ApiError::bad_request(format!("failed to read upload: {err}")))?;
            return Ok((bytes.to_vec(), filename));
        }
    }
    Err(ApiError::bad_request("multipart field 'file' is required"))
}

fn csv_reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes)
}

/// Imports a code-system CSV with columns system,code,display,definition.
pub async fn upload_codes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> Result<axum::Json<UploadSummary>, ApiError> {
    require_role(&auth, Role::Admin)?;
    let (bytes, filename) = read_upload(multipart).await?;

    let version = state.config.namaste.version.clone();
    let mut imported = 0usize;
    let mut skipped = 0usize;
    for (line, result) in csv_reader(&bytes).deserialize::<CodeCsvRow>().enumerate() {
        let row = match result {
            Ok(row) if !row.system.is_empty() && !row.code.is_empty() => row,
            Ok(_) => {
                skipped += 1;
                tracing::warn!(line = line + 2, "Skipping code row with empty system or code");
                continue;
            }
            Err(err) => {
                skipped += 1;
                tracing::warn!(line = line + 2, error = %err, "Skipping malformed code row");
                continue;
            }
        };

        let mut concept = Concept::new(&row.system, &row.code, &row.display, &version);
        if let Some(definition) = row.definition.filter(|d| !d.is_empty()) {
            concept = concept.with_definition(definition);
        }
        state.concepts.upsert(concept).await?;
        imported += 1;
    }

    tracing::info!(%filename, imported, skipped, "Code system upload processed");
    Ok(axum::Json(UploadSummary { imported, filename }))
}

/// Imports a concept-map CSV with columns
/// sourceSystem,sourceCode,targetSystem,targetCode,equivalence,comment.
pub async fn upload_concept_maps(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> Result<axum::Json<UploadSummary>, ApiError> {
    require_role(&auth, Role::Admin)?;
    let (bytes, filename) = read_upload(multipart).await?;

    let version = state.config.namaste.version.clone();
    let mut imported = 0usize;
    let mut skipped = 0usize;
    for (line, result) in csv_reader(&bytes)
        .deserialize::<ConceptMapCsvRow>()
        .enumerate()
    {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                skipped += 1;
                tracing::warn!(line = line + 2, error = %err, "Skipping malformed mapping row");
                continue;
            }
        };
        let equivalence = match row.equivalence.parse::<Equivalence>() {
            Ok(eq) => eq,
            Err(err) => {
                skipped += 1;
                tracing::warn!(line = line + 2, error = %err, "Skipping mapping row");
                continue;
            }
        };
        if row.source_system.is_empty() || row.source_code.is_empty() || row.target_code.is_empty()
        {
            skipped += 1;
            tracing::warn!(line = line + 2, "Skipping incomplete mapping row");
            continue;
        }

        let mut mapping = ConceptMapping::new(
            &row.source_system,
            &row.source_code,
            &row.target_system,
            &row.target_code,
            equivalence,
            &version,
        )
        .with_provenance(filename.clone());
        if let Some(comment) = row.comment.filter(|c| !c.is_empty()) {
            mapping = mapping.with_comment(comment);
        }
        state.mappings.upsert(mapping).await?;
        imported += 1;
    }

    tracing::info!(%filename, imported, skipped, "Concept map upload processed");
    Ok(axum::Json(UploadSummary { imported, filename }))
}

/// Translation audit trail, newest first.
pub async fn translation_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<HistoryQuery>,
) -> Result<axum::Json<Page<TranslationRecord>>, ApiError> {
    require_role(&auth, Role::Admin)?;

    let defaults = &state.config.search;
    let count = query
        .count
        .unwrap_or(defaults.default_count)
        .min(defaults.max_count);
    let page = state
        .audit
        .list(&PageRequest::new(query.offset.unwrap_or(0), count))
        .await?;
    Ok(axum::Json(page))
}

pub async fn stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<axum::Json<StatsResponse>, ApiError> {
    require_role(&auth, Role::Admin)?;

    Ok(axum::Json(StatsResponse {
        total_codes: state.concepts.count().await?,
        total_concept_maps: state.mappings.count().await?,
        total_translations: state.audit.count().await?,
    }))
}

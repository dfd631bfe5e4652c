use crate::time::{FhirDateTime, now_utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One code-system entry: a single code with its display and definition.
///
/// The pair (`system_uri`, `code`) is the identity; uploads upsert on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub system_uri: String,
    pub code: String,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Language designations, stored opaque (synonyms per language etc.).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designations: Option<Value>,
    pub version: String,
    pub created_at: FhirDateTime,
    pub updated_at: FhirDateTime,
}

impl Concept {
    pub fn new(
        system_uri: impl Into<String>,
        code: impl Into<String>,
        display: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let now = now_utc();
        Self {
            system_uri: system_uri.into(),
            code: code.into(),
            display: display.into(),
            definition: None,
            designations: None,
            version: version.into(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    /// Case-insensitive substring match over code and display, the filter
    /// semantics of `$expand`.
    pub fn matches_filter(&self, filter: &str) -> bool {
        let needle = filter.to_lowercase();
        self.code.to_lowercase().contains(&needle)
            || self.display.to_lowercase().contains(&needle)
    }
}

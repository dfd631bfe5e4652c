//! Common types used across storage backends.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use setu_core::fhir::CodeableConcept;
use setu_core::time::FhirDateTime;
use uuid::Uuid;

/// Largest page a single request may ask for.
pub const MAX_PAGE_SIZE: usize = 200;

/// Default page size when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Offset/count paging window for list and search operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based offset into the result set.
    pub offset: usize,
    /// Number of items to return, clamped to [`MAX_PAGE_SIZE`].
    pub count: usize,
}

impl PageRequest {
    #[must_use]
    pub fn new(offset: usize, count: usize) -> Self {
        Self {
            offset,
            count: count.min(MAX_PAGE_SIZE),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            count: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the total size of the unpaged result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching items before paging was applied.
    pub total: usize,
    /// Offset this page starts at.
    pub offset: usize,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: usize, offset: usize) -> Self {
        Self {
            items,
            total,
            offset,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            offset: 0,
        }
    }
}

/// A stored Condition resource, dual-coded via its [`CodeableConcept`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionRecord {
    pub id: u64,
    /// Patient reference the condition belongs to, e.g. `Patient/123`.
    pub patient_id: String,
    pub code: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<String>,
    /// Username of the authenticated creator.
    pub created_by: String,
    pub created_at: FhirDateTime,
}

/// One audit-trail entry for a `$translate` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub id: u64,
    pub source_system: String,
    pub source_code: String,
    /// The Parameters resource returned to the caller, stored verbatim.
    pub result: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub created_at: FhirDateTime,
}

/// A user account for login and role checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    /// Argon2 hash of the password, never the plaintext.
    pub password_hash: String,
    pub roles: Vec<String>,
    pub created_at: FhirDateTime,
}

impl UserRecord {
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

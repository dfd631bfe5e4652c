//! Storage traits that backends must implement.
//!
//! All traits are object-safe so handlers can hold `Arc<dyn Trait>` and stay
//! independent of the concrete backend.

use async_trait::async_trait;
use setu_core::Concept;
use setu_core::mapping::ConceptMapping;

use crate::error::StorageError;
use crate::types::{ConditionRecord, Page, PageRequest, TranslationRecord, UserRecord};

/// Code-system concepts keyed by (system URI, code).
#[async_trait]
pub trait ConceptStore: Send + Sync {
    /// Inserts or updates a concept. Returns `true` when the concept was
    /// newly created, `false` when an existing one was replaced.
    async fn upsert(&self, concept: Concept) -> Result<bool, StorageError>;

    /// Looks up a single concept by system and code.
    async fn find(&self, system: &str, code: &str) -> Result<Option<Concept>, StorageError>;

    /// Pages through concepts of one system, optionally narrowed by a
    /// case-insensitive filter over code and display.
    async fn search(
        &self,
        system: &str,
        filter: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<Concept>, StorageError>;

    /// Number of stored concepts across all systems.
    async fn count(&self) -> Result<usize, StorageError>;
}

/// Curated concept-map rows keyed by (source system, source code, target system).
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Inserts or updates a mapping. Returns `true` when newly created.
    async fn upsert(&self, mapping: ConceptMapping) -> Result<bool, StorageError>;

    /// All mappings whose source matches, across target systems.
    async fn find(
        &self,
        source_system: &str,
        source_code: &str,
    ) -> Result<Vec<ConceptMapping>, StorageError>;

    /// Number of stored mappings.
    async fn count(&self) -> Result<usize, StorageError>;
}

/// Dual-coded Condition records.
#[async_trait]
pub trait ConditionStore: Send + Sync {
    /// Persists a new condition, assigning its id.
    async fn create(&self, condition: ConditionRecord) -> Result<ConditionRecord, StorageError>;

    /// Looks up a condition by id.
    async fn get(&self, id: u64) -> Result<Option<ConditionRecord>, StorageError>;

    /// Lists conditions newest-first, optionally restricted to one patient.
    async fn list(
        &self,
        patient_id: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<ConditionRecord>, StorageError>;
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new user. Fails with [`StorageError::AlreadyExists`] when
    /// the username is taken.
    async fn create(&self, user: UserRecord) -> Result<UserRecord, StorageError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError>;
}

/// Translation audit trail.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Records one translation invocation.
    async fn record(&self, entry: TranslationRecord) -> Result<TranslationRecord, StorageError>;

    /// Lists recorded translations newest-first.
    async fn list(&self, page: &PageRequest) -> Result<Page<TranslationRecord>, StorageError>;

    /// Number of recorded translations.
    async fn count(&self) -> Result<usize, StorageError>;
}

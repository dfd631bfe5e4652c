//! # setu-storage
//!
//! Storage abstraction layer for the Setu terminology server.
//!
//! This crate defines the traits and types that all storage backends must
//! implement. It does not contain any implementations; those are provided by
//! separate crates such as `setu-db-memory`.
//!
//! ## Overview
//!
//! The store is split by concern:
//! - [`ConceptStore`]: code-system concepts keyed by (system, code)
//! - [`MappingStore`]: curated concept-map rows keyed by
//!   (source system, source code, target system)
//! - [`ConditionStore`]: dual-coded Condition records
//! - [`UserStore`]: account records for login and role checks
//! - [`AuditStore`]: translation audit trail
//!
//! ```ignore
//! use setu_storage::{ConceptStore, PageRequest, StorageError};
//!
//! async fn first_page(
//!     store: &dyn ConceptStore,
//!     system: &str,
//! ) -> Result<usize, StorageError> {
//!     let page = store.search(system, None, &PageRequest::default()).await?;
//!     Ok(page.items.len())
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::StorageError;
pub use traits::{AuditStore, ConceptStore, ConditionStore, MappingStore, UserStore};
pub use types::{ConditionRecord, Page, PageRequest, TranslationRecord, UserRecord};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

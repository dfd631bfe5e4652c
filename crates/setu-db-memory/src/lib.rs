//! In-memory storage backend for the Setu terminology server.
//!
//! Implements every storage trait from `setu-storage` on top of `dashmap`
//! for lock-free concurrent access. The backend is the default for
//! development and testing; data does not survive a restart.
//!
//! ```ignore
//! use setu_db_memory::MemoryStore;
//! use setu_storage::ConceptStore;
//!
//! let store = MemoryStore::new();
//! store.upsert(concept).await?;
//! ```

mod store;

pub use store::MemoryStore;

use std::sync::Arc;

/// Creates a shared in-memory store.
pub fn create_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

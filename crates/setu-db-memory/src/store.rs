use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use setu_core::Concept;
use setu_core::mapping::ConceptMapping;
use setu_core::time::now_utc;
use setu_storage::{
    AuditStore, ConceptStore, ConditionRecord, ConditionStore, MappingStore, Page, PageRequest,
    StorageError, TranslationRecord, UserRecord, UserStore,
};
use std::sync::atomic::{AtomicU64, Ordering};

/// Key for a concept: (system URI, code).
type ConceptKey = (String, String);

/// Key for a mapping: (source system, source code, target system).
type MappingKey = (String, String, String);

/// In-memory backend holding all terminology state in concurrent maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    concepts: DashMap<ConceptKey, Concept>,
    mappings: DashMap<MappingKey, ConceptMapping>,
    conditions: DashMap<u64, ConditionRecord>,
    users: DashMap<String, UserRecord>,
    audits: DashMap<u64, TranslationRecord>,
    condition_ids: AtomicU64,
    audit_ids: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_condition_id(&self) -> u64 {
        self.condition_ids.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn next_audit_id(&self) -> u64 {
        self.audit_ids.fetch_add(1, Ordering::SeqCst) + 1
    }
}

fn paginate<T>(mut items: Vec<T>, page: &PageRequest) -> Page<T> {
    let total = items.len();
    let tail = if page.offset >= total {
        Vec::new()
    } else {
        items.split_off(page.offset)
    };
    let window = tail.into_iter().take(page.count).collect();
    Page::new(window, total, page.offset)
}

#[async_trait]
impl ConceptStore for MemoryStore {
    async fn upsert(&self, mut concept: Concept) -> Result<bool, StorageError> {
        let key = (concept.system_uri.clone(), concept.code.clone());
        match self.concepts.entry(key) {
            Entry::Occupied(mut occupied) => {
                // Replacing keeps the original creation instant.
                concept.created_at = occupied.get().created_at.clone();
                concept.updated_at = now_utc();
                occupied.insert(concept);
                Ok(false)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(concept);
                Ok(true)
            }
        }
    }

    async fn find(&self, system: &str, code: &str) -> Result<Option<Concept>, StorageError> {
        let key = (system.to_string(), code.to_string());
        Ok(self.concepts.get(&key).map(|entry| entry.value().clone()))
    }

    async fn search(
        &self,
        system: &str,
        filter: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<Concept>, StorageError> {
        let mut matched: Vec<Concept> = self
            .concepts
            .iter()
            .filter(|entry| entry.key().0 == system)
            .filter(|entry| match filter {
                Some(f) if !f.is_empty() => entry.value().matches_filter(f),
                _ => true,
            })
            .map(|entry| entry.value().clone())
            .collect();
        // Stable order for paging.
        matched.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(paginate(matched, page))
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.concepts.len())
    }
}

#[async_trait]
impl MappingStore for MemoryStore {
    async fn upsert(&self, mut mapping: ConceptMapping) -> Result<bool, StorageError> {
        let key = (
            mapping.source_system.clone(),
            mapping.source_code.clone(),
            mapping.target_system.clone(),
        );
        match self.mappings.entry(key) {
            Entry::Occupied(mut occupied) => {
                mapping.created_at = occupied.get().created_at.clone();
                mapping.updated_at = now_utc();
                occupied.insert(mapping);
                Ok(false)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(mapping);
                Ok(true)
            }
        }
    }

    async fn find(
        &self,
        source_system: &str,
        source_code: &str,
    ) -> Result<Vec<ConceptMapping>, StorageError> {
        let mut matched: Vec<ConceptMapping> = self
            .mappings
            .iter()
            .filter(|entry| {
                let (system, code, _) = entry.key();
                system == source_system && code == source_code
            })
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by(|a, b| {
            a.target_system
                .cmp(&b.target_system)
                .then_with(|| a.target_code.cmp(&b.target_code))
        });
        Ok(matched)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.mappings.len())
    }
}

#[async_trait]
impl ConditionStore for MemoryStore {
    async fn create(
        &self,
        mut condition: ConditionRecord,
    ) -> Result<ConditionRecord, StorageError> {
        condition.id = self.next_condition_id();
        self.conditions.insert(condition.id, condition.clone());
        Ok(condition)
    }

    async fn get(&self, id: u64) -> Result<Option<ConditionRecord>, StorageError> {
        Ok(self.conditions.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list(
        &self,
        patient_id: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<ConditionRecord>, StorageError> {
        let mut matched: Vec<ConditionRecord> = self
            .conditions
            .iter()
            .filter(|entry| match patient_id {
                Some(patient) => entry.value().patient_id == patient,
                None => true,
            })
            .map(|entry| entry.value().clone())
            .collect();
        // Newest first; ids are monotonic.
        matched.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(paginate(matched, page))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: UserRecord) -> Result<UserRecord, StorageError> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(StorageError::already_exists("User", &user.username)),
            Entry::Vacant(vacant) => {
                vacant.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.users.get(username).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn record(
        &self,
        mut entry: TranslationRecord,
    ) -> Result<TranslationRecord, StorageError> {
        entry.id = self.next_audit_id();
        self.audits.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn list(&self, page: &PageRequest) -> Result<Page<TranslationRecord>, StorageError> {
        let mut entries: Vec<TranslationRecord> =
            self.audits.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(paginate(entries, page))
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.audits.len())
    }
}

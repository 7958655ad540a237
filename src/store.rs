// 🗃️ Store - persistence keyed by the raw registry id string
//
// The resolver only needs lookup, insert-if-absent, and a full listing.
// Keys are compared exactly as submitted: "11.222.333/0001-81" and
// "112223330001-81" are different keys.

use crate::error::StoreError;
use crate::record::CompanyRecord;
use async_trait::async_trait;
use std::sync::RwLock;

/// Result of an insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored under this surrogate key
    Inserted(i64),

    /// A record with the same registry id already exists; nothing written
    Conflict,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_by_registry_id(&self, raw: &str) -> Result<Option<CompanyRecord>, StoreError>;

    /// Insert unless a record with the same `registry_id` exists.
    /// The record's own `id` is ignored; the store assigns one.
    async fn insert(&self, record: &CompanyRecord) -> Result<InsertOutcome, StoreError>;

    async fn list_all(&self) -> Result<Vec<CompanyRecord>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Store backed by a vector, for tests and ephemeral runs.
///
/// Surrogate keys come from a monotonic sequence starting at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: Vec<CompanyRecord>,
    last_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_by_registry_id(&self, raw: &str) -> Result<Option<CompanyRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .records
            .iter()
            .find(|r| r.registry_id == raw)
            .cloned())
    }

    async fn insert(&self, record: &CompanyRecord) -> Result<InsertOutcome, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;

        // check and insert under one write lock
        if inner
            .records
            .iter()
            .any(|r| r.registry_id == record.registry_id)
        {
            return Ok(InsertOutcome::Conflict);
        }

        inner.last_id += 1;
        let id = inner.last_id;

        let mut stored = record.clone();
        stored.id = Some(id);
        inner.records.push(stored);

        Ok(InsertOutcome::Inserted(id))
    }

    async fn list_all(&self) -> Result<Vec<CompanyRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.records.clone())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.records.len())
    }
}

// 🔎 Resolver - cache-aside lookup of company data
//
// validate -> store hit? -> provider -> store insert -> return
//
// The store is keyed on the raw string as submitted, while the provider is
// queried with the normalized digits. Stored records never expire and are
// never refreshed.

use crate::error::{ResolveError, StoreError};
use crate::provider::LookupProvider;
use crate::record::CompanyRecord;
use crate::registry_id::{self, RegistryId};
use crate::store::{InsertOutcome, Store};
use std::sync::Arc;

#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn Store>,
    provider: Arc<dyn LookupProvider>,
}

impl Resolver {
    pub fn new(store: Arc<dyn Store>, provider: Arc<dyn LookupProvider>) -> Self {
        Resolver { store, provider }
    }

    /// Resolve a raw registry id to a company record.
    ///
    /// Invalid ids fail before touching the store or the provider. A provider
    /// failure leaves the store untouched. At most one store read, one
    /// provider call, and one store write happen per call (plus a re-read
    /// when another caller won the insert race).
    pub async fn resolve(&self, raw: &str) -> Result<CompanyRecord, ResolveError> {
        let id = RegistryId::parse(raw).map_err(|reason| {
            tracing::debug!(raw, %reason, "rejected registry id");
            ResolveError::RejectedInput {
                raw: raw.to_string(),
                reason,
            }
        })?;

        if let Some(existing) = self.store.find_by_registry_id(id.as_raw()).await? {
            tracing::debug!(registry_id = %id, "served from store");
            return Ok(existing);
        }

        let digits = registry_id::normalize(id.as_raw());
        let mut record = self.provider.lookup(&digits).await.map_err(|e| {
            tracing::warn!(registry_id = %id, error = %e, "lookup provider failed");
            ResolveError::ProviderFailure(e)
        })?;

        // Always carry the caller's spelling, never the provider's
        record.registry_id = id.as_raw().to_string();
        record.id = None;

        match self.store.insert(&record).await? {
            InsertOutcome::Inserted(key) => {
                tracing::info!(registry_id = %id, id = key, "fetched and stored company");
                record.id = Some(key);
                Ok(record)
            }
            InsertOutcome::Conflict => {
                // Someone else stored it between our read and write
                tracing::info!(registry_id = %id, "company stored concurrently; re-reading");
                self.store
                    .find_by_registry_id(id.as_raw())
                    .await?
                    .ok_or_else(|| {
                        StoreError::Inconsistent {
                            registry_id: id.as_raw().to_string(),
                        }
                        .into()
                    })
            }
        }
    }

    /// Every stored record, unfiltered
    pub async fn list(&self) -> Result<Vec<CompanyRecord>, ResolveError> {
        Ok(self.store.list_all().await?)
    }
}

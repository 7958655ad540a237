//! Error types for resolving registry ids.

use crate::registry_id::InvalidRegistryId;

/// Failures of the lookup provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Connection, TLS, timeout, or body read failure.
    #[error("lookup provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("lookup provider returned HTTP {status}")]
    Status { status: u16, body: String },

    /// 2xx response whose body is not a company payload.
    #[error("could not decode lookup provider response: {0}")]
    Decode(#[from] serde_json::Error),

    /// 2xx response carrying the provider's in-band error marker.
    #[error("lookup provider rejected the request: {message}")]
    Rejected { message: String },
}

/// Failures of the local store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("corrupt stored record: {detail}")]
    Corrupt { detail: String },

    /// Insert reported a conflict but the winning record could not be read back.
    #[error("insert conflicted for '{registry_id}' but no stored record was found")]
    Inconsistent { registry_id: String },
}

/// Outcome of [`crate::Resolver::resolve`] when no record can be returned.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Malformed or checksum-failing id. Client error, never retried.
    #[error("invalid registry id '{raw}': {reason}")]
    RejectedInput {
        raw: String,
        reason: InvalidRegistryId,
    },

    /// Upstream unreachable or unsuccessful. Nothing was stored.
    #[error(transparent)]
    ProviderFailure(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolveError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, ResolveError::RejectedInput { .. })
    }
}

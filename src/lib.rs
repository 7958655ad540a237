// CNPJ Registry - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod registry_id;    // Check-digit validation
pub mod record;         // CompanyRecord
pub mod error;
pub mod store;          // Store trait + in-memory store
pub mod db;             // SQLite store
pub mod provider;       // External lookup provider
pub mod resolver;       // Cache-aside orchestration
pub mod config;
pub mod logging;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use registry_id::{
    validate, normalize, check_digits, format_digits,
    RegistryId, InvalidRegistryId,
};
pub use record::CompanyRecord;
pub use error::{ResolveError, ProviderError, StoreError};
pub use store::{Store, InsertOutcome, MemoryStore};
pub use db::{SqliteStore, setup_database};
pub use provider::{LookupProvider, HttpLookupProvider, ProviderPayload};
pub use resolver::Resolver;
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

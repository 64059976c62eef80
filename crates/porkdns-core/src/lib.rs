// # porkdns-core
//
// Core library for reconciling registrar-hosted DNS records.
//
// ## Architecture Overview
//
// - **RecordStore**: Trait for the remote API that hosts records
// - **Reconciler**: Create/Read/Update/Delete/Import lifecycle over a store
// - **retry**: Bounded, doubling-delay executor used for every remote call
// - **StateStore**: Trait for persisted record snapshots between runs
// - **StoreRegistry**: Plugin-based registry for record stores
//
// ## Design Principles
//
// 1. Stores are single-shot; retry policy belongs to the reconciler
// 2. Lifecycle operations report failures as diagnostics, never panics
// 3. Validation happens before any remote call

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod reconciler;
pub mod record;
pub mod registry;
pub mod retry;
pub mod state;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{PorkdnsConfig, RetryConfig, StoreConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Response, Severity};
pub use error::{Error, Result};
pub use reconciler::{ReadOutcome, Reconciler};
pub use record::{Record, RecordPayload, RemoteRecord, normalize_name};
pub use registry::StoreRegistry;
pub use retry::{RetryPolicy, retry};
pub use state::{FileStateStore, MemoryStateStore};
pub use store::MemoryRecordStore;
pub use traits::{RecordStore, RecordStoreFactory, StateEntry, StateStore};

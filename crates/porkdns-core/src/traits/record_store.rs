// # Record Store Trait
//
// Defines the interface to the remote store that hosts DNS records.
//
// ## Implementations
//
// - Porkbun: `porkdns-provider-porkbun` crate
// - In-process: `porkdns_core::store::MemoryRecordStore`
//
// ## Usage
//
// ```rust,ignore
// use porkdns_core::traits::RecordStore;
// use porkdns_core::Record;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* RecordStore implementation */;
//
//     let payload = Record::new("example.com", "www", "A")
//         .with_content("192.0.2.1")
//         .to_payload();
//     let id = store.create_record("example.com", &payload).await?;
//
//     store.delete_record("example.com", id).await?;
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::record::{RecordPayload, RemoteRecord};

/// Trait for remote record store implementations
///
/// Records are addressed by zone (`domain`) and the numeric identifier the
/// store assigned on creation. There is no fetch-by-id; callers list the zone
/// and scan.
///
/// # Single-shot
///
/// Each method performs exactly one remote request. Retry, backoff and
/// cancellation are owned by the [`Reconciler`](crate::Reconciler). An
/// implementation reports failures through [`crate::Error`] and must pick
/// variants that classify correctly under [`crate::Error::is_transient`]:
///
/// - no response at all → `Error::Transport`
/// - HTTP 429 → `Error::RateLimited`
/// - other non-success statuses → `Error::Status`
/// - a well-formed refusal from the API → `Error::Api`
///
/// # Thread Safety
///
/// Implementations must be usable from several tasks at once; the reconciler
/// shares one store across every record it manages.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a record under `domain`
    ///
    /// # Returns
    ///
    /// - `Ok(u64)`: the identifier assigned by the store
    /// - `Err(Error)`: the request failed
    async fn create_record(
        &self,
        domain: &str,
        record: &RecordPayload,
    ) -> Result<u64, crate::Error>;

    /// List every record under `domain`
    ///
    /// Names in the result are fully qualified.
    async fn retrieve_records(&self, domain: &str) -> Result<Vec<RemoteRecord>, crate::Error>;

    /// Replace the record `id` under `domain` with `record`
    async fn edit_record(
        &self,
        domain: &str,
        id: u64,
        record: &RecordPayload,
    ) -> Result<(), crate::Error>;

    /// Delete the record `id` under `domain`
    async fn delete_record(&self, domain: &str, id: u64) -> Result<(), crate::Error>;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}

/// Helper trait for constructing record stores from configuration
pub trait RecordStoreFactory: Send + Sync {
    /// Create a RecordStore instance from configuration
    fn create(
        &self,
        config: &crate::config::StoreConfig,
    ) -> Result<Box<dyn RecordStore>, crate::Error>;
}

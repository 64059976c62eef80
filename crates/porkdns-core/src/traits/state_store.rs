// # State Store Trait
//
// Persists the last known snapshot of every managed record between driver
// runs. The snapshot carries the store-assigned id, which is the only thing
// Read/Update/Delete need to find the record again.
//
// ## Implementations
//
// - `MemoryStateStore`: tests and one-shot runs
// - `FileStateStore`: JSON file with atomic writes and backup recovery

use async_trait::async_trait;

use crate::record::Record;

/// Snapshot of one managed record
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StateEntry {
    /// Record as last observed
    pub record: Record,
    /// Timestamp of the last successful lifecycle operation
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl StateEntry {
    /// Create an entry stamped with the current time
    pub fn new(record: Record) -> Self {
        Self {
            record,
            last_updated: chrono::Utc::now(),
        }
    }
}

/// Trait for state store implementations
///
/// Keys are resource addresses chosen by the driver. All methods must be
/// safe to call concurrently.
///
/// Stores must not decide anything about records; they only remember what
/// the reconciler last reported.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the entry stored under `address`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(StateEntry))`: the stored entry
    /// - `Ok(None)`: nothing stored
    /// - `Err(Error)`: storage error
    async fn get(&self, address: &str) -> Result<Option<StateEntry>, crate::Error>;

    /// Store `record` under `address`, replacing any previous entry
    async fn put(&self, address: &str, record: &Record) -> Result<(), crate::Error>;

    /// Remove the entry under `address` (no error if absent)
    async fn remove(&self, address: &str) -> Result<(), crate::Error>;

    /// List every stored address
    async fn list(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

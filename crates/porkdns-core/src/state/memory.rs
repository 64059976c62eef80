// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Crash Behavior
//
// - All snapshots are lost on exit
// - The next run sees no prior state and creates every desired record again
//
// ## When to Use
//
// - Tests
// - One-shot runs against the memory record store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::record::Record;
use crate::traits::state_store::{StateEntry, StateStore};

/// In-memory state store implementation
///
/// # Example
///
/// ```rust,no_run
/// use porkdns_core::state::MemoryStateStore;
/// use porkdns_core::traits::StateStore;
/// use porkdns_core::Record;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///     let record = Record::new("example.com", "www", "A").with_id("42");
///
///     store.put("www", &record).await?;
///
///     let entry = store.get("www").await?;
///     assert_eq!(entry.map(|e| e.record), Some(record));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<HashMap<String, StateEntry>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the number of entries in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, address: &str) -> Result<Option<StateEntry>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(address).cloned())
    }

    async fn put(&self, address: &str, record: &Record) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(address.to_string(), StateEntry::new(record.clone()));
        Ok(())
    }

    async fn remove(&self, address: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(address);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        let mut addresses: Vec<String> = guard.keys().cloned().collect();
        addresses.sort();
        Ok(addresses)
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStateStore::new();
        assert!(store.is_empty().await);

        let record = Record::new("example.com", "www", "A").with_id("7");
        store.put("www", &record).await.unwrap();
        assert_eq!(store.len().await, 1);

        let entry = store.get("www").await.unwrap().unwrap();
        assert_eq!(entry.record, record);

        store.remove("www").await.unwrap();
        store.remove("www").await.unwrap();
        assert!(store.get("www").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_list_is_sorted() {
        let store = MemoryStateStore::new();
        store
            .put("zeta", &Record::new("example.com", "z", "A"))
            .await
            .unwrap();
        store
            .put("alpha", &Record::new("example.com", "a", "A"))
            .await
            .unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["alpha", "zeta"]);
    }
}

// # Memory Record Store
//
// In-process implementation of RecordStore.
//
// ## Purpose
//
// Behaves like a registrar's record API without any network: ids are
// assigned from a counter and names are stored fully qualified, exactly as a
// real store would list them back. Useful for tests, dry runs and local
// experiments with the driver.
//
// ## Crash Behavior
//
// All records are lost when the process exits.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::StoreConfig;
use crate::record::{RecordPayload, RemoteRecord};
use crate::traits::{RecordStore, RecordStoreFactory};

/// First identifier handed out by a fresh store
const FIRST_ID: u64 = 1;

/// In-memory record store
///
/// Records are grouped by zone. Clones share the same underlying data.
///
/// # Example
///
/// ```rust,no_run
/// use porkdns_core::store::MemoryRecordStore;
/// use porkdns_core::traits::RecordStore;
/// use porkdns_core::Record;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new();
///     let payload = Record::new("example.com", "www", "A").to_payload();
///
///     let id = store.create_record("example.com", &payload).await?;
///     let records = store.retrieve_records("example.com").await?;
///     assert_eq!(records[0].id, id.to_string());
///     assert_eq!(records[0].name, "www.example.com");
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryRecordStore {
    zones: Arc<RwLock<HashMap<String, Vec<RemoteRecord>>>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryRecordStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::starting_at(FIRST_ID)
    }

    /// Create a new empty store whose first assigned id is `first_id`
    pub fn starting_at(first_id: u64) -> Self {
        Self {
            zones: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(first_id)),
        }
    }

    /// Seed a zone with records as the remote store would list them
    pub async fn insert_remote(&self, domain: &str, record: RemoteRecord) {
        let mut zones = self.zones.write().await;
        zones.entry(domain.to_string()).or_default().push(record);
    }

    /// Number of records held under `domain`
    pub async fn len(&self, domain: &str) -> usize {
        let zones = self.zones.read().await;
        zones.get(domain).map_or(0, Vec::len)
    }

    /// Whether `domain` holds no records
    pub async fn is_empty(&self, domain: &str) -> bool {
        self.len(domain).await == 0
    }

    fn qualify(name: &str, domain: &str) -> String {
        if name.is_empty() {
            domain.to_string()
        } else {
            format!("{}.{}", name, domain)
        }
    }

    fn to_remote(id: u64, domain: &str, payload: &RecordPayload) -> RemoteRecord {
        RemoteRecord {
            id: id.to_string(),
            name: Self::qualify(&payload.name, domain),
            record_type: payload.record_type.clone(),
            content: payload.content.clone(),
            ttl: payload.ttl.clone(),
            prio: payload.prio.clone(),
            notes: payload.notes.clone(),
        }
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create_record(&self, domain: &str, record: &RecordPayload) -> Result<u64, Error> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut zones = self.zones.write().await;
        zones
            .entry(domain.to_string())
            .or_default()
            .push(Self::to_remote(id, domain, record));
        Ok(id)
    }

    async fn retrieve_records(&self, domain: &str) -> Result<Vec<RemoteRecord>, Error> {
        let zones = self.zones.read().await;
        Ok(zones.get(domain).cloned().unwrap_or_default())
    }

    async fn edit_record(
        &self,
        domain: &str,
        id: u64,
        record: &RecordPayload,
    ) -> Result<(), Error> {
        let mut zones = self.zones.write().await;
        let key = id.to_string();
        let existing = zones
            .get_mut(domain)
            .and_then(|records| records.iter_mut().find(|r| r.id == key))
            .ok_or_else(|| Error::not_found(format!("record {} under {}", id, domain)))?;

        *existing = Self::to_remote(id, domain, record);
        Ok(())
    }

    async fn delete_record(&self, domain: &str, id: u64) -> Result<(), Error> {
        let mut zones = self.zones.write().await;
        let key = id.to_string();
        let records = zones
            .get_mut(domain)
            .ok_or_else(|| Error::not_found(format!("record {} under {}", id, domain)))?;

        let before = records.len();
        records.retain(|r| r.id != key);
        if records.len() == before {
            return Err(Error::not_found(format!("record {} under {}", id, domain)));
        }
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating memory record stores
pub struct MemoryRecordStoreFactory;

impl RecordStoreFactory for MemoryRecordStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>, Error> {
        match config {
            StoreConfig::Memory => Ok(Box::new(MemoryRecordStore::new())),
            _ => Err(Error::config("Invalid config for memory record store")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MemoryRecordStore::starting_at(987);
        let payload = Record::new("foobar.dev", "test", "A").to_payload();

        assert_eq!(store.create_record("foobar.dev", &payload).await.unwrap(), 987);
        assert_eq!(store.create_record("foobar.dev", &payload).await.unwrap(), 988);
        assert_eq!(store.len("foobar.dev").await, 2);
    }

    #[tokio::test]
    async fn test_names_are_listed_fully_qualified() {
        let store = MemoryRecordStore::new();
        store
            .create_record("example.com", &Record::new("example.com", "", "A").to_payload())
            .await
            .unwrap();
        store
            .create_record("example.com", &Record::new("example.com", "foo", "A").to_payload())
            .await
            .unwrap();

        let names: Vec<String> = store
            .retrieve_records("example.com")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["example.com", "foo.example.com"]);
    }

    #[tokio::test]
    async fn test_edit_and_delete_unknown_id() {
        let store = MemoryRecordStore::new();
        let payload = Record::new("example.com", "www", "A").to_payload();

        assert!(matches!(
            store.edit_record("example.com", 42, &payload).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.delete_record("example.com", 42).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_edit_replaces_in_place() {
        let store = MemoryRecordStore::new();
        let id = store
            .create_record(
                "example.com",
                &Record::new("example.com", "www", "A")
                    .with_content("192.0.2.1")
                    .to_payload(),
            )
            .await
            .unwrap();

        store
            .edit_record(
                "example.com",
                id,
                &Record::new("example.com", "www", "A")
                    .with_content("192.0.2.2")
                    .to_payload(),
            )
            .await
            .unwrap();

        let records = store.retrieve_records("example.com").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "192.0.2.2");
        assert_eq!(records[0].id, id.to_string());
    }

    #[test]
    fn test_factory_rejects_foreign_config() {
        let config = StoreConfig::Porkbun {
            api_key: "pk1".to_string(),
            secret_key: "sk1".to_string(),
            base_url: None,
        };
        assert!(MemoryRecordStoreFactory.create(&config).is_err());
        assert!(MemoryRecordStoreFactory.create(&StoreConfig::Memory).is_ok());
    }
}

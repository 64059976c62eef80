// # File State Store
//
// File-based implementation of StateStore with crash recovery.
//
// ## Purpose
//
// Keeps the snapshot of every managed record across driver runs, so the next
// run can Read, Update or Delete by the stored id instead of creating
// duplicates.
//
// ## Crash Recovery
//
// - Atomic writes: write to a `.tmp` file, then rename over the state file
// - Backup: the previous state file is copied to `.backup` before each rename
// - Recovery: if the state file does not parse, the backup is loaded and
//   copied back into place
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "records": {
//     "www": {
//       "record": {
//         "id": "987",
//         "domain": "example.com",
//         "name": "www",
//         "type": "A",
//         "content": "192.0.2.1",
//         "ttl": "600",
//         "prio": "0",
//         "notes": null
//       },
//       "last_updated": "2026-01-09T12:00:00Z"
//     }
//   }
// }
// ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::record::Record;
use crate::traits::state_store::{StateEntry, StateStore};

/// State file format version
const STATE_FILE_VERSION: &str = "1.0";

/// File-based state store with crash recovery
///
/// Every mutation is written through to disk immediately.
///
/// # Example
///
/// ```rust,no_run
/// use porkdns_core::state::FileStateStore;
/// use porkdns_core::traits::StateStore;
/// use porkdns_core::Record;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/porkdns/state.json").await?;
///
///     let record = Record::new("example.com", "www", "A").with_id("987");
///     store.put("www", &record).await?;
///
///     let entry = store.get("www").await?;
///     assert_eq!(entry.map(|e| e.record), Some(record));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

#[derive(Debug)]
struct FileState {
    records: BTreeMap<String, StateEntry>,
    dirty: bool,
}

/// Serializable state file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StateFileFormat {
    version: String,
    records: BTreeMap<String, StateEntry>,
}

impl FileStateStore {
    /// Create or load a file state store
    ///
    /// Creates missing parent directories. A corrupted state file falls back
    /// to the backup, and to empty state if the backup is unusable too.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let records = Self::load_state_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                records,
                dirty: false,
            })),
        })
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_state_with_recovery(
        path: &Path,
    ) -> Result<BTreeMap<String, StateEntry>, Error> {
        let err = match Self::load_state(path).await {
            Ok(records) => {
                tracing::debug!(count = records.len(), "loaded state file");
                return Ok(records);
            }
            Err(err) => err,
        };

        if !matches!(err, Error::Json(_)) {
            return Err(err);
        }

        tracing::warn!(error = %err, path = %path.display(), "state file corrupted, trying backup");

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("no backup file found, starting with empty state");
            return Ok(BTreeMap::new());
        }

        match Self::load_state(&backup_path).await {
            Ok(records) => {
                tracing::info!(count = records.len(), "recovered state from backup");
                if let Err(restore_err) = fs::copy(&backup_path, path).await {
                    tracing::error!(error = %restore_err, "failed to restore state file from backup");
                }
                Ok(records)
            }
            Err(backup_err) => {
                tracing::error!(error = %backup_err, "backup also corrupted, starting with empty state");
                Ok(BTreeMap::new())
            }
        }
    }

    async fn load_state(path: &Path) -> Result<BTreeMap<String, StateEntry>, Error> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "state file does not exist");
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to read state file {}: {}",
                path.display(),
                e
            ))
        })?;

        let state_file: StateFileFormat = serde_json::from_str(&content)?;

        if state_file.version != STATE_FILE_VERSION {
            tracing::warn!(
                expected = STATE_FILE_VERSION,
                found = %state_file.version,
                "state file version mismatch, loading anyway"
            );
        }

        Ok(state_file.records)
    }

    /// Write state to file atomically
    async fn write_state(&self) -> Result<(), Error> {
        let mut state_guard = self.state.write().await;

        let state_file = StateFileFormat {
            version: STATE_FILE_VERSION.to_string(),
            records: state_guard.records.clone(),
        };
        let json = serde_json::to_string_pretty(&state_file)?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
        }

        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await
        {
            tracing::warn!(error = %e, "failed to create state backup");
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        state_guard.dirty = false;
        tracing::trace!(path = %self.path.display(), "state written");
        Ok(())
    }

    async fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, StateEntry>)) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            f(&mut state_guard.records);
            state_guard.dirty = true;
        }

        self.write_state().await
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, address: &str) -> Result<Option<StateEntry>, Error> {
        let state_guard = self.state.read().await;
        Ok(state_guard.records.get(address).cloned())
    }

    async fn put(&self, address: &str, record: &Record) -> Result<(), Error> {
        let entry = StateEntry::new(record.clone());
        self.mutate(|records| {
            records.insert(address.to_string(), entry);
        })
        .await
    }

    async fn remove(&self, address: &str) -> Result<(), Error> {
        self.mutate(|records| {
            records.remove(address);
        })
        .await
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        let state_guard = self.state.read().await;
        Ok(state_guard.records.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty { self.write_state().await } else { Ok(()) }
    }
}

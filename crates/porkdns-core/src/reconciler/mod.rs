//! Record lifecycle reconciler
//!
//! The Reconciler drives one DNS record through its lifecycle against a
//! [`RecordStore`]:
//! - Create the record and capture the store-assigned id
//! - Read the remote copy back and detect out-of-band deletion
//! - Update the record in place
//! - Delete the record
//! - Import an existing record by id
//!
//! ## Architecture
//!
//! ```text
//!   desired / prior state
//!            │
//!            ▼
//!   ┌──────────────────┐   retry(policy, cancel)   ┌──────────────┐
//!   │    Reconciler    │──────────────────────────▶│ RecordStore  │
//!   └──────────────────┘                           └──────────────┘
//!            │
//!            ▼
//!   Response { state, diagnostics }
//! ```
//!
//! Every remote call goes through [`retry`] with the reconciler's
//! [`RetryPolicy`]. Validation happens first, so a malformed record or id
//! never reaches the store.
//!
//! ## Two surfaces
//!
//! - `try_*` methods return `Result` for library callers.
//! - The plain methods fold failures into a [`Response`] and never return an
//!   error; this is what drivers use.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Response};
use crate::error::{Error, Result};
use crate::record::{Record, parse_record_id};
use crate::retry::{RetryPolicy, retry};
use crate::traits::RecordStore;

/// What a Read found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The record exists; fields refreshed from the remote copy
    Present(Record),
    /// No remote record carries the held id; the input record, unchanged
    Absent(Record),
}

impl ReadOutcome {
    /// The carried record
    pub fn record(&self) -> &Record {
        match self {
            Self::Present(record) | Self::Absent(record) => record,
        }
    }

    /// Take the carried record
    pub fn into_record(self) -> Record {
        match self {
            Self::Present(record) | Self::Absent(record) => record,
        }
    }

    /// Whether the remote record is gone
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent(_))
    }
}

/// Drives record lifecycle operations against a store
///
/// Cheap to clone; clones share the store and the cancellation token.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn RecordStore>,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl Reconciler {
    /// Create a reconciler over `store`
    pub fn new(store: Arc<dyn RecordStore>, policy: RetryPolicy) -> Self {
        Self {
            store,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight retries when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The retry policy in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Name of the underlying store
    pub fn store_name(&self) -> &'static str {
        self.store.store_name()
    }

    /// Create `desired` and return it with the assigned id
    pub async fn try_create(&self, desired: &Record) -> Result<Record> {
        desired.validate()?;

        let store = &*self.store;
        let domain = desired.domain.as_str();
        let payload = desired.to_payload();
        let payload = &payload;

        let id = retry(&self.policy, &self.cancel, move || {
            store.create_record(domain, payload)
        })
        .await?;

        info!(
            domain,
            name = %desired.name,
            record_type = %desired.record_type,
            id,
            "created record"
        );

        Ok(desired.clone().with_id(id.to_string()))
    }

    /// Look up `current` by its id
    ///
    /// Lists the whole zone and scans for the id; the store offers nothing
    /// narrower.
    pub async fn try_read(&self, current: &Record) -> Result<ReadOutcome> {
        let id = current
            .id
            .as_deref()
            .ok_or_else(|| Error::invalid_input("record has no id"))?;
        if current.domain.is_empty() {
            return Err(Error::invalid_input("domain cannot be empty"));
        }

        let store = &*self.store;
        let domain = current.domain.as_str();

        let records = retry(&self.policy, &self.cancel, move || {
            store.retrieve_records(domain)
        })
        .await?;

        debug!(domain, count = records.len(), "retrieved records");

        match records.iter().find(|remote| remote.id == id) {
            Some(remote) => {
                let mut refreshed = current.clone();
                refreshed.refresh_from(remote);
                Ok(ReadOutcome::Present(refreshed))
            }
            None => {
                warn!(domain, id, "record no longer exists");
                Ok(ReadOutcome::Absent(current.clone()))
            }
        }
    }

    /// Replace the record `existing_id` with `desired`
    pub async fn try_update(&self, desired: &Record, existing_id: &str) -> Result<Record> {
        let id = parse_record_id(existing_id)?;
        desired.validate()?;

        let store = &*self.store;
        let domain = desired.domain.as_str();
        let payload = desired.to_payload();
        let payload = &payload;

        retry(&self.policy, &self.cancel, move || {
            store.edit_record(domain, id, payload)
        })
        .await?;

        info!(domain, name = %desired.name, id, "updated record");

        Ok(desired.clone().with_id(existing_id))
    }

    /// Delete `current` from the store
    pub async fn try_delete(&self, current: &Record) -> Result<()> {
        let id = current.numeric_id()?;

        let store = &*self.store;
        let domain = current.domain.as_str();

        retry(&self.policy, &self.cancel, move || {
            store.delete_record(domain, id)
        })
        .await?;

        info!(domain, id, "deleted record");
        Ok(())
    }

    /// Adopt the existing record `id` under `domain`
    pub async fn try_import(&self, domain: &str, id: &str) -> Result<ReadOutcome> {
        self.try_read(&Self::skeleton(domain, id)).await
    }

    /// Create `desired`
    ///
    /// On failure the state is `desired` without an id, so the caller can
    /// tell nothing was recorded remotely.
    pub async fn create(&self, desired: &Record) -> Response<Record> {
        match self.try_create(desired).await {
            Ok(created) => Response::ok(created),
            Err(err) => {
                warn!(domain = %desired.domain, error = %err, "create failed");
                let mut failed = desired.clone();
                failed.id = None;
                Response::error(Some(failed), "Error creating DNS record", &err)
            }
        }
    }

    /// Read `current`
    ///
    /// An absent record is reported as a warning, with the input record as
    /// state. On failure the state is `None` and the caller keeps its prior
    /// state.
    pub async fn read(&self, current: &Record) -> Response<ReadOutcome> {
        match self.try_read(current).await {
            Ok(ReadOutcome::Absent(record)) => Self::absent(record),
            Ok(present) => Response::ok(present),
            Err(err) => Response::error(
                None,
                format!("Could not retrieve records for {}.", current.domain),
                &err,
            ),
        }
    }

    /// Update the record `existing_id` to match `desired`
    ///
    /// On failure the state is `None`; the remote record is unchanged as far
    /// as the caller can tell.
    pub async fn update(&self, desired: &Record, existing_id: &str) -> Response<Record> {
        match self.try_update(desired, existing_id).await {
            Ok(updated) => Response::ok(updated),
            Err(err) => {
                warn!(domain = %desired.domain, id = existing_id, error = %err, "update failed");
                Response::error(None, "Error updating the record", &err)
            }
        }
    }

    /// Delete `current`
    ///
    /// `state` is `Some(())` only when the record was deleted.
    pub async fn delete(&self, current: &Record) -> Response<()> {
        match self.try_delete(current).await {
            Ok(()) => Response::ok(()),
            Err(err) => {
                warn!(domain = %current.domain, error = %err, "delete failed");
                Response::error(None, "Error deleting record", &err)
            }
        }
    }

    /// Import the record `id` under `domain`
    pub async fn import(&self, domain: &str, id: &str) -> Response<ReadOutcome> {
        self.read(&Self::skeleton(domain, id)).await
    }

    fn skeleton(domain: &str, id: &str) -> Record {
        Record {
            id: Some(id.to_string()),
            domain: domain.to_string(),
            ..Record::default()
        }
    }

    fn absent(record: Record) -> Response<ReadOutcome> {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning(
            DiagnosticKind::Absent,
            "Record not found",
            format!(
                "no record with id {} exists under {}",
                record.id.as_deref().unwrap_or_default(),
                record.domain
            ),
        ));
        Response {
            state: Some(ReadOutcome::Absent(record)),
            diagnostics,
        }
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("store", &self.store.store_name())
            .field("policy", &self.policy)
            .finish()
    }
}

//! Lifecycle driver
//!
//! Walks a desired-state document against the persisted state, calling the
//! Reconciler for each resource address and writing back whatever state it
//! returns. Diagnostics are collected per address; only state store failures
//! abort a run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use porkdns_core::{
    Diagnostic, Diagnostics, Error, ReadOutcome, Reconciler, Record, StateStore,
};
use tracing::{debug, info};

/// Desired records keyed by resource address
pub type DesiredState = BTreeMap<String, Record>;

/// Parse a desired-state document
///
/// Ids in the document are ignored; identity comes from persisted state.
pub fn parse_desired(json: &str) -> Result<DesiredState> {
    let mut desired: DesiredState =
        serde_json::from_str(json).context("desired state is not a JSON object of records")?;
    for record in desired.values_mut() {
        record.id = None;
    }
    Ok(desired)
}

/// What happened to one resource address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Created remotely
    Created,
    /// Updated in place
    Updated,
    /// Deleted and created again under a new domain
    Replaced,
    /// Remote already matched
    Unchanged,
    /// Deleted remotely and dropped from state
    Deleted,
    /// State refreshed from the remote copy
    Refreshed,
    /// Dropped from state because the remote record is gone
    Dropped,
    /// Adopted into state
    Imported,
    /// Left as it was because an operation failed
    Failed,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Change::Created => "created",
            Change::Updated => "updated",
            Change::Replaced => "replaced",
            Change::Unchanged => "unchanged",
            Change::Deleted => "deleted",
            Change::Refreshed => "refreshed",
            Change::Dropped => "dropped",
            Change::Imported => "imported",
            Change::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Outcome of a driver run
#[derive(Debug, Default)]
pub struct Report {
    /// Change per resource address
    pub changes: BTreeMap<String, Change>,
    /// Diagnostics per resource address, in the order they were produced
    pub diagnostics: Vec<(String, Diagnostic)>,
}

impl Report {
    /// Whether any error diagnostic was produced
    pub fn has_error(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|(_, d)| d.severity == porkdns_core::Severity::Error)
    }

    /// Number of addresses with the given change
    pub fn count(&self, change: Change) -> usize {
        self.changes.values().filter(|c| **c == change).count()
    }

    fn record(&mut self, address: &str, change: Change, diagnostics: Diagnostics) {
        for diagnostic in &diagnostics {
            self.diagnostics
                .push((address.to_string(), diagnostic.clone()));
        }
        self.changes.insert(address.to_string(), change);
    }
}

/// Whether the remote copy differs from what is wanted
///
/// Names and types are compared ignoring ASCII case.
fn drifted(current: &Record, desired: &Record) -> bool {
    let current = current.to_payload();
    let desired = desired.to_payload();

    !current.name.eq_ignore_ascii_case(&desired.name)
        || !current.record_type.eq_ignore_ascii_case(&desired.record_type)
        || current.content != desired.content
        || current.ttl != desired.ttl
        || current.prio != desired.prio
        || current.notes != desired.notes
}

/// Applies desired state through a Reconciler and persists the results
pub struct Driver {
    reconciler: Reconciler,
    state: Arc<dyn StateStore>,
}

impl Driver {
    /// Create a driver
    pub fn new(reconciler: Reconciler, state: Arc<dyn StateStore>) -> Self {
        Self { reconciler, state }
    }

    /// Converge remote records onto `desired`
    ///
    /// Addresses in state but missing from `desired` are deleted.
    pub async fn apply(&self, desired: &DesiredState) -> Result<Report> {
        let mut report = Report::default();

        for (address, record) in desired {
            self.apply_one(address, record, &mut report).await?;
        }

        let stale: Vec<String> = self
            .state
            .list()
            .await?
            .into_iter()
            .filter(|address| !desired.contains_key(address))
            .collect();
        for address in stale {
            self.destroy_one(&address, &mut report).await?;
        }

        self.state.flush().await?;
        Ok(report)
    }

    /// Read every stored record; drop the ones that no longer exist
    pub async fn refresh(&self) -> Result<Report> {
        let mut report = Report::default();

        for address in self.state.list().await? {
            let Some(entry) = self.state.get(&address).await? else {
                continue;
            };

            let response = self.reconciler.read(&entry.record).await;
            let change = match response.state {
                Some(ReadOutcome::Present(record)) => {
                    self.state.put(&address, &record).await?;
                    Change::Refreshed
                }
                Some(ReadOutcome::Absent(_)) => {
                    self.state.remove(&address).await?;
                    Change::Dropped
                }
                None => Change::Failed,
            };
            report.record(&address, change, response.diagnostics);
        }

        self.state.flush().await?;
        Ok(report)
    }

    /// Delete every stored record
    pub async fn destroy(&self) -> Result<Report> {
        let mut report = Report::default();

        for address in self.state.list().await? {
            self.destroy_one(&address, &mut report).await?;
        }

        self.state.flush().await?;
        Ok(report)
    }

    /// Adopt the remote record `id` under `domain` as `address`
    pub async fn import(&self, address: &str, domain: &str, id: &str) -> Result<Report> {
        let mut report = Report::default();

        let response = self.reconciler.import(domain, id).await;
        let mut diagnostics = response.diagnostics;
        let change = match response.state {
            Some(ReadOutcome::Present(record)) => {
                self.state.put(address, &record).await?;
                Change::Imported
            }
            Some(ReadOutcome::Absent(_)) => {
                diagnostics.add_error(
                    "Cannot import non-existent record",
                    &Error::not_found(format!("record {} under {}", id, domain)),
                );
                Change::Failed
            }
            None => Change::Failed,
        };
        report.record(address, change, diagnostics);

        self.state.flush().await?;
        Ok(report)
    }

    async fn apply_one(&self, address: &str, desired: &Record, report: &mut Report) -> Result<()> {
        let Some(entry) = self
            .state
            .get(address)
            .await
            .with_context(|| format!("reading state for {}", address))?
        else {
            let (change, diagnostics) = self.create(address, desired).await?;
            report.record(address, change, diagnostics);
            return Ok(());
        };

        let read = self.reconciler.read(&entry.record).await;
        let mut diagnostics = read.diagnostics;

        let current = match read.state {
            None => {
                report.record(address, Change::Failed, diagnostics);
                return Ok(());
            }
            Some(ReadOutcome::Absent(_)) => {
                info!(address, "record missing remotely, creating again");
                let (change, created) = self.create(address, desired).await?;
                diagnostics.extend(created);
                report.record(address, change, diagnostics);
                return Ok(());
            }
            Some(ReadOutcome::Present(current)) => current,
        };

        let change = if !current.domain.eq_ignore_ascii_case(&desired.domain) {
            self.replace(address, &current, desired, &mut diagnostics)
                .await?
        } else if drifted(&current, desired) {
            self.update(address, &current, desired, &mut diagnostics)
                .await?
        } else {
            debug!(address, "record up to date");
            self.state.put(address, &current).await?;
            Change::Unchanged
        };

        report.record(address, change, diagnostics);
        Ok(())
    }

    async fn create(&self, address: &str, desired: &Record) -> Result<(Change, Diagnostics)> {
        let response = self.reconciler.create(desired).await;

        let change = match response.state {
            Some(created) if created.id.is_some() => {
                self.state.put(address, &created).await?;
                Change::Created
            }
            _ => {
                self.state.remove(address).await?;
                Change::Failed
            }
        };

        Ok((change, response.diagnostics))
    }

    async fn update(
        &self,
        address: &str,
        current: &Record,
        desired: &Record,
        diagnostics: &mut Diagnostics,
    ) -> Result<Change> {
        let Some(id) = current.id.as_deref() else {
            return Ok(Change::Failed);
        };

        let response = self.reconciler.update(desired, id).await;
        diagnostics.extend(response.diagnostics);

        match response.state {
            Some(updated) => {
                self.state.put(address, &updated).await?;
                Ok(Change::Updated)
            }
            None => Ok(Change::Failed),
        }
    }

    async fn replace(
        &self,
        address: &str,
        current: &Record,
        desired: &Record,
        diagnostics: &mut Diagnostics,
    ) -> Result<Change> {
        info!(
            address,
            from = %current.domain,
            to = %desired.domain,
            "domain changed, replacing record"
        );

        let deleted = self.reconciler.delete(current).await;
        let gone = deleted.state.is_some();
        diagnostics.extend(deleted.diagnostics);
        if !gone {
            return Ok(Change::Failed);
        }

        let (change, created) = self.create(address, desired).await?;
        diagnostics.extend(created);
        Ok(match change {
            Change::Created => Change::Replaced,
            other => other,
        })
    }

    async fn destroy_one(&self, address: &str, report: &mut Report) -> Result<()> {
        let Some(entry) = self.state.get(address).await? else {
            return Ok(());
        };

        let response = self.reconciler.delete(&entry.record).await;
        let change = if response.state.is_some() {
            self.state.remove(address).await?;
            Change::Deleted
        } else {
            Change::Failed
        };
        report.record(address, change, response.diagnostics);
        Ok(())
    }
}

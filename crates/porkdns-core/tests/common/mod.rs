//! Test doubles and common utilities for reconciler contract tests
//!
//! `CountingStore` wraps the in-memory record store, counts every call per
//! operation and can be scripted to fail the next N calls.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use porkdns_core::error::{Error, Result};
use porkdns_core::record::{RecordPayload, RemoteRecord};
use porkdns_core::traits::RecordStore;
use porkdns_core::{MemoryRecordStore, Reconciler, Record, RetryPolicy};

/// Kind of failure to inject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Connection dropped
    Transport,
    /// HTTP 503
    Unavailable,
    /// HTTP 429
    RateLimited,
    /// HTTP 400 with an API message
    BadRequest,
    /// HTTP 403
    Forbidden,
}

impl Failure {
    fn to_error(self) -> Error {
        match self {
            Failure::Transport => Error::transport("connection reset by peer"),
            Failure::Unavailable => Error::status(503, "Service Unavailable"),
            Failure::RateLimited => Error::rate_limited("slow down"),
            Failure::BadRequest => Error::status(400, "Invalid type."),
            Failure::Forbidden => Error::auth("Invalid API key."),
        }
    }
}

#[derive(Default)]
struct Counters {
    create: AtomicUsize,
    retrieve: AtomicUsize,
    edit: AtomicUsize,
    delete: AtomicUsize,
}

/// A RecordStore that counts calls and fails on demand
pub struct CountingStore {
    inner: MemoryRecordStore,
    counters: Arc<Counters>,
    failures: Arc<Mutex<VecDeque<Failure>>>,
    latency: Duration,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryRecordStore::starting_at(987),
            counters: Arc::new(Counters::default()),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            latency: Duration::ZERO,
        }
    }

    /// Create a store that shares data, counters and scripted failures
    /// with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            inner: other.inner.clone(),
            counters: Arc::clone(&other.counters),
            failures: Arc::clone(&other.failures),
            latency: other.latency,
        }
    }

    /// Sleep this long inside every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail the next `n` calls, whatever they are, with `failure`
    pub fn fail_next(&self, n: usize, failure: Failure) {
        let mut failures = self.failures.lock().unwrap();
        failures.extend(std::iter::repeat_n(failure, n));
    }

    /// The wrapped store, for out-of-band changes
    pub fn remote(&self) -> &MemoryRecordStore {
        &self.inner
    }

    pub fn create_calls(&self) -> usize {
        self.counters.create.load(Ordering::SeqCst)
    }

    pub fn retrieve_calls(&self) -> usize {
        self.counters.retrieve.load(Ordering::SeqCst)
    }

    pub fn edit_calls(&self) -> usize {
        self.counters.edit.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.counters.delete.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.create_calls() + self.retrieve_calls() + self.edit_calls() + self.delete_calls()
    }

    async fn enter(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.failures.lock().unwrap().pop_front();
        match next {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for CountingStore {
    async fn create_record(&self, domain: &str, record: &RecordPayload) -> Result<u64> {
        self.enter(&self.counters.create).await?;
        self.inner.create_record(domain, record).await
    }

    async fn retrieve_records(&self, domain: &str) -> Result<Vec<RemoteRecord>> {
        self.enter(&self.counters.retrieve).await?;
        self.inner.retrieve_records(domain).await
    }

    async fn edit_record(&self, domain: &str, id: u64, record: &RecordPayload) -> Result<()> {
        self.enter(&self.counters.edit).await?;
        self.inner.edit_record(domain, id, record).await
    }

    async fn delete_record(&self, domain: &str, id: u64) -> Result<()> {
        self.enter(&self.counters.delete).await?;
        self.inner.delete_record(domain, id).await
    }

    fn store_name(&self) -> &'static str {
        "counting"
    }
}

/// A policy with `attempts` attempts and a 1 second initial delay
pub fn policy(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::from_secs(1))
}

/// A reconciler over a store sharing counters with `store`
pub fn reconciler(store: &CountingStore, attempts: u32) -> Reconciler {
    Reconciler::new(
        Arc::new(CountingStore::sharing_counters_with(store)),
        policy(attempts),
    )
}

/// The record used throughout the contract tests
pub fn sample_record() -> Record {
    Record::new("foobar.dev", "test", "A")
        .with_content("0.0.0.1")
        .with_ttl("600")
}

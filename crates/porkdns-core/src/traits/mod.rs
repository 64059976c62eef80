//! Core traits for porkdns
//!
//! - [`RecordStore`]: the remote API that hosts DNS records
//! - [`StateStore`]: persisted record snapshots between driver runs

pub mod record_store;
pub mod state_store;

pub use record_store::{RecordStore, RecordStoreFactory};
pub use state_store::{StateEntry, StateStore};

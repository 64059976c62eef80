// # Record Store Implementations
//
// In-process implementations of the RecordStore trait. Network-backed stores
// live in their own crates.

pub mod memory;

pub use memory::{MemoryRecordStore, MemoryRecordStoreFactory};

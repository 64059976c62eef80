// # State Store Implementations
//
// Implementations of the StateStore trait, which remembers the last reported
// snapshot of each managed record between driver runs.

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

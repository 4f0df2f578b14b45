//! Link store abstraction.
//!
//! Provides a pluggable persistence layer that can be backed by:
//! - Process memory (tests, throwaway runs)
//! - SQLite through sea-orm (default)

mod backend;
mod memory;
mod sqlite;
#[cfg(test)]
pub mod testing;

pub use backend::{MediaStore, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

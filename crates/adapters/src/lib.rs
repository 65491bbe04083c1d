//! feedrank adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `store`: in-memory and SQLite implementations of the store ports
//! - `snapshot`: JSON snapshot file the in-memory store is loaded from

mod snapshot_fs;
mod store_memory;
mod store_sqlite;

/// Re-exports for store adapters
pub mod store {
    pub use crate::store_memory::InMemoryStore;
    pub use crate::store_sqlite::SqliteStore;
}

/// Re-exports for snapshot files
pub mod snapshot {
    pub use crate::snapshot_fs::{Snapshot, SnapshotFile};
}

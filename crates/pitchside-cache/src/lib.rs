//! Redis snapshot cache for live video state.
//!
//! Snapshots are ephemeral: TTL-evicted, rebuilt on demand from the
//! durable store, and never treated as a source of truth.

pub mod error;
pub mod snapshot_cache;

pub use error::{CacheError, CacheResult};
pub use snapshot_cache::{
    labels_key, snapshot_key, CacheConfig, SnapshotCache, DEFAULT_COMMAND_TIMEOUT_MS,
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_SNAPSHOT_TTL_SECS,
};

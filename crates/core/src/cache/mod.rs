//! Time-bounded cache for raw spreadsheet payloads.
//!
//! This module provides a persistent cache keyed by a fingerprint of the
//! document reference. It supports:
//!
//! - SHA-256 cache keys over (namespace, key, query, sheet)
//! - An explicit payload codec so bodies round-trip byte-for-byte
//! - Lazy TTL expiry checked at read time against an injectable clock
//! - SQLite storage with automatic schema migrations and WAL mode

pub mod clock;
pub mod codec;
pub mod connection;
pub mod hash;
pub mod migrations;
pub mod payloads;

use std::time::Duration;

use async_trait::async_trait;

pub use crate::Error;
use crate::RawPayload;

pub use clock::{Clock, ManualClock, SystemClock};
pub use connection::CacheDb;
pub use hash::CacheKey;

/// Storage contract used by the pipeline.
///
/// Implementations must be safe to share across concurrent requests and must
/// return payloads exactly as they were stored.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a payload. Absent and expired entries both yield `None`.
    async fn get(&self, key: &CacheKey) -> Result<Option<RawPayload>, Error>;

    /// Store a payload, replacing any existing entry for the key.
    async fn put(&self, key: &CacheKey, payload: &RawPayload, ttl: Duration) -> Result<(), Error>;

    /// Remove the entry for the key, if any.
    async fn invalidate(&self, key: &CacheKey) -> Result<(), Error>;
}

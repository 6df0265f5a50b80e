//! Payload storage operations.
//!
//! Implements [`CacheStore`] for [`CacheDb`]. Expiry is lazy: entries are
//! never evicted in the background, a read simply ignores an entry whose TTL
//! has elapsed according to the database's clock.

use std::time::Duration;

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::{CacheKey, CacheStore, codec};
use crate::{Error, RawPayload};

/// Stored row: (encoded payload, stored_at millis, ttl millis).
type StoredRow = (String, i64, i64);

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn get(&self, key: &CacheKey) -> Result<Option<RawPayload>, Error> {
        let cache_key = key.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<StoredRow>, Error> {
                let result = conn.query_row(
                    "SELECT payload, stored_at_ms, ttl_ms FROM payloads WHERE cache_key = ?1",
                    params![cache_key],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some((encoded, stored_at_ms, ttl_ms)) = row else {
            tracing::debug!(key = %key, "cache miss");
            return Ok(None);
        };

        let age_ms = self.clock.now().timestamp_millis().saturating_sub(stored_at_ms);
        if age_ms > ttl_ms {
            tracing::debug!(key = %key, age_ms, ttl_ms, "cache entry expired");
            return Ok(None);
        }

        codec::decode(&encoded).map(Some)
    }

    async fn put(&self, key: &CacheKey, payload: &RawPayload, ttl: Duration) -> Result<(), Error> {
        let cache_key = key.to_string();
        let encoded = codec::encode(payload);
        let stored_at_ms = self.clock.now().timestamp_millis();
        let ttl_ms = ttl_millis(ttl);

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO payloads (cache_key, payload, stored_at_ms, ttl_ms)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(cache_key) DO UPDATE SET
                        payload = excluded.payload,
                        stored_at_ms = excluded.stored_at_ms,
                        ttl_ms = excluded.ttl_ms",
                    params![cache_key, encoded, stored_at_ms, ttl_ms],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<(), Error> {
        let cache_key = key.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM payloads WHERE cache_key = ?1", params![cache_key])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

impl CacheDb {
    /// Delete every entry whose TTL has elapsed.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now_ms = self.clock.now().timestamp_millis();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM payloads WHERE stored_at_ms + ttl_ms < ?1", params![now_ms])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a single entry, reporting whether it existed.
    pub async fn remove(&self, key: &CacheKey) -> Result<u64, Error> {
        let cache_key = key.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM payloads WHERE cache_key = ?1", params![cache_key])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored entries, expired or not.
    pub async fn len(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM payloads", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContentType, DocumentReference, ManualClock};
    use std::sync::Arc;

    fn key(doc: &str) -> CacheKey {
        CacheKey::for_reference(&DocumentReference::from_key(doc))
    }

    async fn db_with_clock() -> (CacheDb, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let db = CacheDb::open_in_memory().await.unwrap().with_clock(clock.clone());
        (db, clock)
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips_bytes() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let body: Vec<u8> = vec![0, 159, 146, 150, b'a', b',', b'b', b'\n', 0xff];
        let payload = RawPayload::new(ContentType::Csv, body.clone());

        db.put(&key("doc"), &payload, Duration::from_secs(600)).await.unwrap();

        let retrieved = db.get(&key("doc")).await.unwrap().unwrap();
        assert_eq!(retrieved, payload);
        assert_eq!(retrieved.body.as_ref(), body.as_slice());
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get(&key("nonexistent")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let (db, clock) = db_with_clock().await;
        db.put(&key("doc"), &RawPayload::csv("a,b\n"), Duration::from_secs(600))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(600));
        assert!(db.get(&key("doc")).await.unwrap().is_some());

        clock.advance(Duration::from_secs(1));
        assert!(db.get(&key("doc")).await.unwrap().is_none());
        assert_eq!(db.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put(&key("doc"), &RawPayload::csv("old"), Duration::from_secs(60))
            .await
            .unwrap();
        db.put(&key("doc"), &RawPayload::html("<table></table>"), Duration::from_secs(60))
            .await
            .unwrap();

        let retrieved = db.get(&key("doc")).await.unwrap().unwrap();
        assert_eq!(retrieved, RawPayload::html("<table></table>"));
        assert_eq!(db.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put(&key("doc"), &RawPayload::csv("a"), Duration::from_secs(60))
            .await
            .unwrap();
        db.invalidate(&key("doc")).await.unwrap();
        db.invalidate(&key("never-stored")).await.unwrap();

        assert!(db.get(&key("doc")).await.unwrap().is_none());
        assert!(db.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (db, clock) = db_with_clock().await;
        db.put(&key("short"), &RawPayload::csv("a"), Duration::from_secs(10))
            .await
            .unwrap();
        db.put(&key("long"), &RawPayload::csv("b"), Duration::from_secs(1000))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(30));
        assert_eq!(db.purge_expired().await.unwrap(), 1);
        assert!(db.get(&key("long")).await.unwrap().is_some());
        assert_eq!(db.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_reports_count() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put(&key("doc"), &RawPayload::csv("a"), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(db.remove(&key("doc")).await.unwrap(), 1);
        assert_eq!(db.remove(&key("doc")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_row_surfaces_as_backend_error() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let cache_key = key("doc").to_string();
        let now = chrono::Utc::now().timestamp_millis();
        db.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO payloads (cache_key, payload, stored_at_ms, ttl_ms) VALUES (?1, 'csv:***', ?2, 60000)",
                    params![cache_key, now],
                )
            })
            .await
            .unwrap();

        let err = db.get(&key("doc")).await.unwrap_err();
        assert!(err.is_cache_backend());
    }

    #[tokio::test]
    async fn test_concurrent_put_and_get_same_key() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let ttl = Duration::from_secs(60);
        let first = RawPayload::csv(vec![b'a'; 256 * 1024]);
        let second = RawPayload::html(vec![b'b'; 256 * 1024]);

        let writer_a = tokio::spawn({
            let (db, payload) = (db.clone(), first.clone());
            async move { db.put(&key("shared"), &payload, ttl).await }
        });
        let writer_b = tokio::spawn({
            let (db, payload) = (db.clone(), second.clone());
            async move { db.put(&key("shared"), &payload, ttl).await }
        });
        let reader = tokio::spawn({
            let db = db.clone();
            async move { db.get(&key("shared")).await }
        });

        let (a, b, read) = tokio::join!(writer_a, writer_b, reader);
        a.unwrap().unwrap();
        b.unwrap().unwrap();
        if let Some(seen) = read.unwrap().unwrap() {
            assert!(seen == first || seen == second);
        }

        let stored = db.get(&key("shared")).await.unwrap().unwrap();
        assert!(stored == first || stored == second);
        assert_eq!(db.len().await.unwrap(), 1);
    }
}

//! cache_purge tool implementation.
//!
//! Drops one document's cached payload, or every expired payload.

use std::collections::BTreeMap;
use std::time::Duration;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sheetview_client::SheetRequest;
use sheetview_core::{CacheDb, CacheKey};

use super::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Attributes identifying the document (`key`, `gid`, `query`). When
    /// absent, all expired entries are purged.
    #[serde(default)]
    pub attributes: Option<BTreeMap<String, String>>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: u64,
    /// Number of entries remaining.
    pub remaining: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(
    cache: &CacheDb, default_expire: Duration, params: CachePurgeParams,
) -> Result<CallToolResult, McpError> {
    let deleted = match params.attributes {
        Some(attributes) => {
            let request = SheetRequest::from_attributes_with_expiry(&attributes, None, default_expire)?;
            let key = CacheKey::for_reference(&request.reference);
            tracing::info!(%key, document = %request.reference.key, "purging cached document");
            cache.remove(&key).await?
        }
        None => cache.purge_expired().await?,
    };

    let output = CachePurgeOutput { deleted, remaining: cache.len().await? };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sheetview_core::{CacheStore, DocumentReference, ManualClock, RawPayload};

    use super::*;
    use crate::tools::output_text;

    const DOC: &str = "https://docs.google.com/spreadsheets/d/ABC/edit";

    fn output(result: &CallToolResult) -> CachePurgeOutput {
        serde_json::from_str(&output_text(result)).unwrap()
    }

    #[tokio::test]
    async fn test_purge_document() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let ttl = Duration::from_secs(600);
        cache
            .put(&CacheKey::for_reference(&DocumentReference::from_key(DOC)), &RawPayload::csv("A\n"), ttl)
            .await
            .unwrap();
        cache
            .put(&CacheKey::for_reference(&DocumentReference::from_key("other")), &RawPayload::csv("B\n"), ttl)
            .await
            .unwrap();

        let params = CachePurgeParams { attributes: Some([("key".to_string(), DOC.to_string())].into()) };
        let result = purge_impl(&cache, ttl, params).await.unwrap();
        let out = output(&result);
        assert_eq!(out.deleted, 1);
        assert_eq!(out.remaining, 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let clock = Arc::new(ManualClock::default());
        let cache = CacheDb::open_in_memory().await.unwrap().with_clock(clock.clone());
        let short = CacheKey::for_reference(&DocumentReference::from_key("short"));
        let long = CacheKey::for_reference(&DocumentReference::from_key("long"));
        cache.put(&short, &RawPayload::csv("A\n"), Duration::from_secs(10)).await.unwrap();
        cache.put(&long, &RawPayload::csv("B\n"), Duration::from_secs(1000)).await.unwrap();

        clock.advance(Duration::from_secs(60));
        let result = purge_impl(&cache, Duration::from_secs(600), CachePurgeParams::default())
            .await
            .unwrap();
        let out = output(&result);
        assert_eq!(out.deleted, 1);
        assert_eq!(out.remaining, 1);
    }

    #[tokio::test]
    async fn test_purge_without_key_rejected() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let params = CachePurgeParams { attributes: Some(BTreeMap::new()) };
        let result = purge_impl(&cache, Duration::from_secs(600), params).await;
        assert!(result.is_err());
    }
}

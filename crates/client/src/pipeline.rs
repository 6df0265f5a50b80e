//! Request orchestration: resolve, cache check, fetch on miss, parse, render.
//!
//! ### Failure handling
//! - Cache backend errors are logged and treated as a miss.
//! - Every other error aborts the request. [`Pipeline::render`] turns it into
//!   an inline error element so one bad document never breaks a whole page.
//!
//! ### Shared state
//! - The cache store, shared by all requests.
//! - The invocation counter, used only to keep chart element ids unique.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use sheetview_core::{CacheKey, CacheStore, Error, FetchTarget, RawPayload};

use crate::fetch::Fetcher;
use crate::options::{CachePolicy, DEFAULT_EXPIRE, SheetRequest};
use crate::parse::parse;
use crate::render::escape::escape_text;
use crate::render::{ChartDescriptor, render_chart_descriptor, render_table};
use crate::resolve::resolve;

/// Class of the inline element produced for a failed request.
pub const ERROR_CLASS: &str = "igsv-error";

/// Output of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    /// Table markup, chart container markup, or an inline error element.
    pub markup: String,
    /// Present in chart mode.
    pub chart: Option<ChartDescriptor>,
    /// Cache key of the document; absent when the request failed before resolution.
    pub cache_key: Option<String>,
    /// Whether the payload was served from the cache.
    pub from_cache: bool,
    /// Sequence number of this invocation, starting at 1.
    pub invocation: u64,
}

/// The acquisition-cache-parse-render pipeline.
///
/// Collaborators are injected at construction; the pipeline holds no other
/// process-wide state.
pub struct Pipeline {
    cache: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    default_expire: Duration,
    invocations: AtomicU64,
}

impl Pipeline {
    pub fn new(cache: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { cache, fetcher, default_expire: DEFAULT_EXPIRE, invocations: AtomicU64::new(0) }
    }

    /// Cache lifetime for attribute requests that do not set `expire_in`.
    pub fn with_default_expire(mut self, expire: Duration) -> Self {
        self.default_expire = expire;
        self
    }

    pub fn default_expire(&self) -> Duration {
        self.default_expire
    }

    /// Number of invocations so far.
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    fn next_invocation(&self) -> u64 {
        self.invocations.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Render a request, converting any failure into an inline error element.
    pub async fn render(&self, request: &SheetRequest) -> Rendered {
        let invocation = self.next_invocation();
        match self.run(request, invocation).await {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::warn!(key = %request.reference.key, error = %err, "sheet render failed");
                failed(&err, Some(CacheKey::for_reference(&request.reference)), invocation)
            }
        }
    }

    /// Interpret shortcode attributes and render, never failing.
    pub async fn render_attributes(&self, attributes: &BTreeMap<String, String>, caption: Option<String>) -> Rendered {
        match SheetRequest::from_attributes_with_expiry(attributes, caption, self.default_expire) {
            Ok(request) => self.render(&request).await,
            Err(err) => {
                tracing::warn!(error = %err, "invalid sheet attributes");
                failed(&err, None, self.next_invocation())
            }
        }
    }

    /// Render a request, returning the error instead of error markup.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidReference` if the document reference does not resolve.
    /// - `Error::FetchFailed` on transport failure.
    /// - `Error::NoTableFound`, `Error::SheetNotFound` or `Error::ParseFailed`
    ///   if the payload is not a usable table.
    pub async fn try_render(&self, request: &SheetRequest) -> Result<Rendered, Error> {
        let invocation = self.next_invocation();
        self.run(request, invocation).await
    }

    async fn run(&self, request: &SheetRequest, invocation: u64) -> Result<Rendered, Error> {
        let start = Instant::now();
        let target = resolve(&request.reference)?;
        let key = CacheKey::for_reference(&request.reference);

        if request.render.chart_type.is_some() {
            let descriptor = render_chart_descriptor(&target, &request.render, invocation);
            tracing::debug!(element_id = %descriptor.element_id, data_url = %descriptor.data_url, "chart descriptor");
            return Ok(Rendered {
                markup: descriptor.to_markup(&request.render),
                chart: Some(descriptor),
                cache_key: Some(key.to_string()),
                from_cache: false,
                invocation,
            });
        }

        let (payload, from_cache) = self.acquire(&key, &target, &request.cache).await?;
        let table = parse(&payload, &request.reference)?;
        let markup = render_table(&table, &target.document_key, &request.render);

        tracing::info!(
            document = %target.document_key,
            rows = table.len(),
            from_cache,
            render_ms = start.elapsed().as_millis() as u64,
            "rendered sheet"
        );

        Ok(Rendered { markup, chart: None, cache_key: Some(key.to_string()), from_cache, invocation })
    }

    /// Cached payload for `key`, or a live fetch of `target`.
    async fn acquire(
        &self, key: &CacheKey, target: &FetchTarget, policy: &CachePolicy,
    ) -> Result<(RawPayload, bool), Error> {
        if policy.use_cache {
            match self.cache.get(key).await {
                Ok(Some(payload)) => {
                    tracing::debug!(%key, "cache hit");
                    return Ok((payload, true));
                }
                Ok(None) => tracing::debug!(%key, "cache miss"),
                Err(err) => tracing::warn!(%key, error = %err, "cache read failed, fetching live"),
            }
        } else if let Err(err) = self.cache.invalidate(key).await {
            tracing::warn!(%key, error = %err, "cache invalidation failed");
        }

        let payload = self.fetcher.fetch(&target.url).await?;

        if policy.use_cache
            && let Err(err) = self.cache.put(key, &payload, policy.expire_in).await
        {
            tracing::warn!(%key, error = %err, "cache write failed");
        }

        Ok((payload, false))
    }
}

fn failed(err: &Error, key: Option<CacheKey>, invocation: u64) -> Rendered {
    Rendered {
        markup: error_markup(err),
        chart: None,
        cache_key: key.map(|k| k.to_string()),
        from_cache: false,
        invocation,
    }
}

/// Inline element describing a failed request.
pub fn error_markup(err: &Error) -> String {
    format!("<div class=\"{ERROR_CLASS}\">{}</div>", escape_text(&err.user_message()))
}

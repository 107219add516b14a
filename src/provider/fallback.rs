//! Priority fallback over an ordered provider chain
//!
//! Upstream market-data sources are individually unreliable (rate limits,
//! auth requirements, intermittent outages). The chain tries each provider
//! in static priority order and, when everything fails, serves the
//! last-known-good cache entry marked stale so the pipeline keeps
//! answering during partial outages.

use std::time::Duration;

use tracing::{debug, warn};

use super::source::{CacheKeyed, FetchSource};
use crate::common::cache::TtlCache;
use crate::common::errors::{EngineError, Result};
use crate::common::types::ProviderResult;

/// Fallback resolver for one data category
#[derive(Clone)]
pub struct FallbackProvider<S: FetchSource> {
    /// Label used in logs and exhaustion errors, e.g. "quotes"
    category: &'static str,
    /// Ordered chain, highest priority first. Static configuration — no
    /// provider is promoted based on past success.
    sources: Vec<S>,
    cache: TtlCache<String, ProviderResult<S::Payload>>,
    ttl: Duration,
}

impl<S: FetchSource> FallbackProvider<S> {
    pub fn new(category: &'static str, sources: Vec<S>, ttl: Duration) -> Self {
        Self {
            category,
            sources,
            cache: TtlCache::new(),
            ttl,
        }
    }

    /// Resolve a query through the chain.
    ///
    /// 1. A fresh cache entry is returned as-is.
    /// 2. Providers are tried in priority order; the first success is
    ///    tagged with its source, cached and returned. Failures are logged
    ///    by kind and the next provider is tried.
    /// 3. If every provider fails, an expired cache entry is returned with
    ///    `stale: true`.
    /// 4. With nothing cached at all, the call fails with
    ///    `AllSourcesExhausted`.
    pub async fn resolve(&self, query: &S::Query) -> Result<ProviderResult<S::Payload>> {
        let key = query.cache_key();

        if let Some(hit) = self.cache.get(&key).await {
            debug!(category = self.category, key = %key, source = %hit.source, "cache hit");
            return Ok(hit);
        }

        for source in &self.sources {
            match source.fetch(query).await {
                Ok(payload) => {
                    let result = ProviderResult::fresh(payload, source.name());
                    self.cache.set(key, result.clone(), self.ttl).await;
                    return Ok(result);
                }
                Err(err) => {
                    warn!(
                        category = self.category,
                        provider = source.name(),
                        kind = err.kind(),
                        key = %key,
                        "provider failed, falling through: {err}"
                    );
                }
            }
        }

        // Last resort: serve the expired entry rather than failing the
        // whole pipeline
        if let Some((mut last_known, expired)) = self.cache.get_ignore_ttl(&key).await {
            warn!(
                category = self.category,
                key = %key,
                expired,
                "all providers failed, serving last-known-good as stale"
            );
            last_known.stale = true;
            return Ok(last_known);
        }

        Err(EngineError::AllSourcesExhausted {
            query: format!("{}/{key}", self.category),
        })
    }

    /// Drop any cached value for this query, forcing a refetch
    pub async fn invalidate(&self, query: &S::Query) {
        self.cache.invalidate(&query.cache_key()).await;
    }
}

//! Per-instrument quote lookup seam
//!
//! The engine talks to quotes through [`QuoteFeed`] so batch behavior can
//! be tested against scripted feeds without any HTTP in the loop.

use async_trait::async_trait;

use crate::common::errors::Result;
use crate::common::types::{ProviderResult, Quote};
use crate::provider::{FallbackProvider, QuoteSource};

/// Quote lookup by symbol
#[async_trait]
pub trait QuoteFeed: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<ProviderResult<Quote>>;
}

/// Production feed backed by the provider fallback chain
pub struct QuoteService {
    provider: FallbackProvider<QuoteSource>,
}

impl QuoteService {
    pub fn new(provider: FallbackProvider<QuoteSource>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl QuoteFeed for QuoteService {
    async fn quote(&self, symbol: &str) -> Result<ProviderResult<Quote>> {
        self.provider.resolve(&symbol.to_string()).await
    }
}

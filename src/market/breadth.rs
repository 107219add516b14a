//! Market-breadth fetch through the fallback chain

use crate::common::errors::Result;
use crate::common::types::{BreadthSnapshot, ProviderResult};
use crate::provider::{BreadthQuery, BreadthSource, FallbackProvider};

/// Fetches advance/decline counts through the fallback chain
pub struct BreadthService {
    provider: FallbackProvider<BreadthSource>,
}

impl BreadthService {
    pub fn new(provider: FallbackProvider<BreadthSource>) -> Self {
        Self { provider }
    }

    pub async fn snapshot(&self) -> Result<ProviderResult<BreadthSnapshot>> {
        self.provider.resolve(&BreadthQuery).await
    }
}

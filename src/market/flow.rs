//! Capital-flow aggregation
//!
//! Providers return per-day net-flow records in whatever order and with
//! whatever duplicates their upstream produces. Summarization normalizes
//! that into a fixed lookback window: newest first, one record per date,
//! flagged partial when upstream had fewer days than requested.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::errors::Result;
use crate::common::types::{CapitalFlowRecord, ProviderResult};
use crate::provider::{FallbackProvider, FlowQuery, FlowSource};

/// Aggregate over the flow lookback window, in 亿元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    /// Sum of daily net inflows over the window
    pub total: Decimal,
    /// Mean daily net inflow over the window
    pub average: Decimal,
    /// Days actually covered
    pub window_days: usize,
    /// Days asked for
    pub requested_days: usize,
    /// True when upstream returned fewer days than requested
    pub partial: bool,
}

/// Collapse raw flow records into a window summary.
///
/// Records are deduplicated by date (first occurrence wins) and ordered
/// newest first before the window is cut.
pub fn summarize_flows(records: &[CapitalFlowRecord], requested_days: usize) -> FlowSummary {
    let mut deduped: Vec<&CapitalFlowRecord> = Vec::with_capacity(records.len());
    for record in records {
        if !deduped.iter().any(|r| r.date == record.date) {
            deduped.push(record);
        }
    }
    deduped.sort_by(|a, b| b.date.cmp(&a.date));
    deduped.truncate(requested_days);

    let window_days = deduped.len();
    let total: Decimal = deduped.iter().map(|r| r.net_inflow).sum();
    let average = if window_days == 0 {
        Decimal::ZERO
    } else {
        (total / Decimal::from(window_days)).round_dp(2)
    };

    FlowSummary {
        total: total.round_dp(2),
        average,
        window_days,
        requested_days,
        partial: window_days < requested_days,
    }
}

/// Fetches and summarizes capital flow through the fallback chain
pub struct CapitalFlowService {
    provider: FallbackProvider<FlowSource>,
    lookback_days: usize,
}

impl CapitalFlowService {
    pub fn new(provider: FallbackProvider<FlowSource>, lookback_days: usize) -> Self {
        Self {
            provider,
            lookback_days,
        }
    }

    /// Current window summary, tagged with source and staleness
    pub async fn summary(&self) -> Result<ProviderResult<FlowSummary>> {
        let query = FlowQuery {
            days: self.lookback_days,
        };
        let result = self.provider.resolve(&query).await?;
        let summary = summarize_flows(&result.payload, self.lookback_days);
        if summary.partial {
            debug!(
                window_days = summary.window_days,
                requested_days = summary.requested_days,
                "flow window shorter than requested"
            );
        }
        Ok(ProviderResult {
            payload: summary,
            source: result.source,
            fetched_at: result.fetched_at,
            stale: result.stale,
        })
    }
}

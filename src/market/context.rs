//! Market-wide context assembled once per batch run
//!
//! One breadth snapshot plus one flow summary, folded into a mood score.
//! Every instrument in a run is scored against the same context, so this
//! is fetched exactly once per run rather than per instrument.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::breadth::BreadthService;
use super::flow::{CapitalFlowService, FlowSummary};
use super::mood::{score_mood, MoodScore};
use crate::common::errors::Result;
use crate::common::types::BreadthSnapshot;

/// Market-wide inputs shared by every scoring task of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub mood: MoodScore,
    pub breadth: BreadthSnapshot,
    pub flow: FlowSummary,
    /// True when any input came from an expired cache entry
    pub stale: bool,
    pub as_of: DateTime<Utc>,
}

/// Context assembly seam; the engine never fetches market data directly
#[async_trait]
pub trait ContextFeed: Send + Sync {
    async fn current(&self) -> Result<MarketContext>;
}

/// Production feed combining the breadth and flow services
pub struct MarketContextService {
    breadth: BreadthService,
    flow: CapitalFlowService,
}

impl MarketContextService {
    pub fn new(breadth: BreadthService, flow: CapitalFlowService) -> Self {
        Self { breadth, flow }
    }
}

#[async_trait]
impl ContextFeed for MarketContextService {
    async fn current(&self) -> Result<MarketContext> {
        let breadth = self.breadth.snapshot().await?;
        let flow = self.flow.summary().await?;

        let mood = score_mood(&breadth.payload, flow.payload.average);
        let stale = breadth.stale || flow.stale;

        info!(
            mood = mood.value,
            label = %mood.label,
            advancers = breadth.payload.advancers,
            decliners = breadth.payload.decliners,
            avg_flow = %flow.payload.average,
            stale,
            "assembled market context"
        );

        Ok(MarketContext {
            mood,
            breadth: breadth.payload,
            flow: flow.payload,
            stale,
            as_of: Utc::now(),
        })
    }
}

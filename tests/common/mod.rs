//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use marketpulse::common::errors::{EngineError, Result};
use marketpulse::common::types::{
    BreadthSnapshot, Instrument, ProviderResult, Quote, RunStatus,
};
use marketpulse::config::types::EngineConfig;
use marketpulse::engine::{BatchEngine, Scorer, SnapshotStore, SnapshotWriter, UniverseSource};
use marketpulse::market::{score_mood, ContextFeed, FlowSummary, MarketContext, QuoteFeed};

/// Quote feed answering from a fixed symbol → percent-change table.
/// Symbols missing from the table fail as exhausted.
pub struct ScriptedQuotes {
    changes: HashMap<String, Decimal>,
}

impl ScriptedQuotes {
    pub fn new(changes: &[(&str, Decimal)]) -> Self {
        Self {
            changes: changes
                .iter()
                .map(|(s, c)| (s.to_string(), *c))
                .collect(),
        }
    }
}

#[async_trait]
impl QuoteFeed for ScriptedQuotes {
    async fn quote(&self, symbol: &str) -> Result<ProviderResult<Quote>> {
        let change_pct = self.changes.get(symbol).copied().ok_or_else(|| {
            EngineError::AllSourcesExhausted {
                query: symbol.to_string(),
            }
        })?;
        Ok(ProviderResult::fresh(
            Quote {
                symbol: symbol.to_string(),
                price: dec!(25.00),
                change_pct,
                volume: Some(1_000),
                timestamp: Utc::now(),
            },
            "scripted",
        ))
    }
}

/// Always serves the same pre-built context
pub struct FixedContext(pub MarketContext);

#[async_trait]
impl ContextFeed for FixedContext {
    async fn current(&self) -> Result<MarketContext> {
        Ok(self.0.clone())
    }
}

pub fn neutral_context() -> MarketContext {
    let breadth = BreadthSnapshot {
        advancers: 2300,
        decliners: 2300,
        unchanged: 400,
    };
    MarketContext {
        mood: score_mood(&breadth, Decimal::ZERO),
        breadth,
        flow: FlowSummary {
            total: Decimal::ZERO,
            average: Decimal::ZERO,
            window_days: 28,
            requested_days: 28,
            partial: false,
        },
        stale: false,
        as_of: Utc::now(),
    }
}

/// In-memory universe
pub struct MemoryUniverse(pub Vec<Instrument>);

#[async_trait]
impl UniverseSource for MemoryUniverse {
    async fn load(&self) -> Result<Vec<Instrument>> {
        Ok(self.0.clone())
    }
}

pub fn build_engine(
    universe: Vec<Instrument>,
    quotes: impl QuoteFeed + 'static,
    scorer: Arc<dyn Scorer>,
    cfg: EngineConfig,
    snapshot_dir: &Path,
) -> (Arc<BatchEngine>, Arc<SnapshotStore>) {
    let store = Arc::new(SnapshotStore::new());
    let engine = BatchEngine::new(
        Arc::new(quotes),
        Arc::new(FixedContext(neutral_context())),
        scorer,
        Arc::new(MemoryUniverse(universe)),
        Arc::clone(&store),
        SnapshotWriter::new(snapshot_dir),
        cfg,
    );
    (engine, store)
}

/// Wait for the in-flight run to reach a terminal state
pub async fn wait_terminal(engine: &Arc<BatchEngine>) -> RunStatus {
    let mut rx = engine.status_rx();
    loop {
        let terminal = rx
            .borrow_and_update()
            .clone()
            .filter(|s| s.state.is_terminal());
        if let Some(status) = terminal {
            return status;
        }
        rx.changed().await.expect("engine dropped");
    }
}

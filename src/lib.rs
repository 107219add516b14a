//! MarketPulse Library
//!
//! Market-data aggregation with provider fallback, plus a scheduled batch
//! pipeline producing per-instrument trade decisions.

pub mod api;
pub mod common;
pub mod config;
pub mod engine;
pub mod market;
pub mod provider;
pub mod scheduler;

// Re-export commonly used types
pub use common::cache::TtlCache;
pub use common::errors::{EngineError, ProviderError, Result};
pub use common::types::{
    Action, BreadthSnapshot, CapitalFlowRecord, Decision, Exchange, Instrument, ProviderResult,
    Quote, RunState, RunStatus, Strength, TriggerKind,
};
pub use config::loader::load_config;
pub use config::types::AppConfig;
pub use engine::{
    BatchEngine, DecisionSnapshot, MomentumScorer, ScoreOutcome, Scorer, SnapshotStore,
    SnapshotWriter,
};
pub use market::{
    BreadthService, CapitalFlowService, ContextFeed, FlowSummary, MarketContext,
    MarketContextService, MoodLabel, MoodScore, QuoteFeed, QuoteService,
};
pub use provider::{
    EastmoneyClient, FallbackProvider, FetchSource, SinaClient, SourceBuilder, TushareClient,
};
pub use scheduler::{Scheduler, TradingCalendar, WeekdayCalendar};

//! Market-wide data services: quotes, breadth, capital flow and mood

pub mod breadth;
pub mod context;
pub mod flow;
pub mod mood;
pub mod quotes;

pub use breadth::BreadthService;
pub use context::{ContextFeed, MarketContext, MarketContextService};
pub use flow::{summarize_flows, CapitalFlowService, FlowSummary};
pub use mood::{score_mood, MoodLabel, MoodScore};
pub use quotes::{QuoteFeed, QuoteService};

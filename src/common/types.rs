//! Unified domain types used across providers, services and the engine

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Exchange/market class an instrument trades on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Shanghai,
    Shenzhen,
}

impl Exchange {
    /// Infer the exchange from a six-digit A-share code.
    ///
    /// Codes starting with 6 trade in Shanghai, everything else (00x, 30x)
    /// in Shenzhen.
    pub fn from_symbol(symbol: &str) -> Self {
        if symbol.starts_with('6') {
            Exchange::Shanghai
        } else {
            Exchange::Shenzhen
        }
    }
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exchange::Shanghai => write!(f, "shanghai"),
            Exchange::Shenzhen => write!(f, "shenzhen"),
        }
    }
}

/// A single tradable instrument. Immutable reference data, loaded once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Exchange code, e.g. "600519"
    pub symbol: String,
    /// Display name, e.g. "贵州茅台"
    pub name: String,
    /// Exchange the instrument trades on
    #[serde(default = "default_exchange")]
    pub exchange: Exchange,
}

fn default_exchange() -> Exchange {
    Exchange::Shenzhen
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        let symbol = symbol.into();
        let exchange = Exchange::from_symbol(&symbol);
        Self {
            symbol,
            name: name.into(),
            exchange,
        }
    }
}

/// A point-in-time quote for one instrument. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Instrument symbol
    pub symbol: String,
    /// Last price
    pub price: Decimal,
    /// Percent change vs. previous close, e.g. 1.25 for +1.25%
    pub change_pct: Decimal,
    /// Traded volume, when the source reports it
    #[serde(default)]
    pub volume: Option<u64>,
    /// When the quote was produced
    pub timestamp: DateTime<Utc>,
}

/// A successful fetch outcome, tagged with which provider answered.
///
/// Failures are `ProviderError`; this wrapper only exists on the success
/// path so callers always know the source and freshness of what they got.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult<T> {
    pub payload: T,
    /// Name of the provider that answered
    pub source: String,
    /// When the payload was fetched from upstream
    pub fetched_at: DateTime<Utc>,
    /// True when this is an expired cache entry served because every
    /// provider in the chain failed
    #[serde(default)]
    pub stale: bool,
}

impl<T> ProviderResult<T> {
    pub fn fresh(payload: T, source: impl Into<String>) -> Self {
        Self {
            payload,
            source: source.into(),
            fetched_at: Utc::now(),
            stale: false,
        }
    }
}

/// One day of net capital flow (e.g. north-bound institutional money).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalFlowRecord {
    pub date: NaiveDate,
    /// Net inflow in 亿元 (hundreds of millions CNY); negative = outflow
    pub net_inflow: Decimal,
}

/// Advance/decline counts across the instrument universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadthSnapshot {
    pub advancers: u32,
    pub decliners: u32,
    pub unchanged: u32,
}

impl BreadthSnapshot {
    /// Fraction of movers that advanced, 0.5 when nothing moved.
    pub fn advance_ratio(&self) -> f64 {
        let movers = self.advancers + self.decliners;
        if movers == 0 {
            0.5
        } else {
            f64::from(self.advancers) / f64::from(movers)
        }
    }
}

/// Trade action for a single instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

/// Strength qualifier attached to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

impl Strength {
    /// Baseline confidence per strength tier
    pub fn base_confidence(&self) -> f64 {
        match self {
            Strength::Strong => 0.8,
            Strength::Moderate => 0.6,
            Strength::Weak => 0.4,
        }
    }
}

/// The engine's per-instrument output. Immutable once created; exactly one
/// per instrument per batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub symbol: String,
    pub name: String,
    pub action: Action,
    pub strength: Strength,
    /// Natural-language rationale
    pub rationale: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// The quote the decision was based on
    pub quote: Quote,
    /// Provider that supplied the quote
    pub quote_source: String,
    /// True when the quote was an expired cache entry served after every
    /// provider in the chain failed
    #[serde(default)]
    pub quote_stale: bool,
}

/// How a run was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Scheduled,
    Manual,
}

/// Run lifecycle state: `Pending → Running → {Completed, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/// Status of one scheduled or manual run.
///
/// Created at trigger time, mutated only by the engine coordinator that
/// owns the run, terminal once COMPLETED or FAILED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    pub trigger: TriggerKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Instruments that produced a committed decision
    pub processed: usize,
    /// Instruments omitted due to per-task failure
    pub failed: usize,
    /// Failure reason when state == Failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RunStatus {
    pub fn pending(trigger: TriggerKind) -> Self {
        Self {
            state: RunState::Pending,
            trigger,
            started_at: Utc::now(),
            finished_at: None,
            processed: 0,
            failed: 0,
            message: None,
        }
    }
}

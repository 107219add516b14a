//! Configuration types
//!
//! Everything the engine needs to run is supplied here: provider priority
//! lists per data category, cache TTLs, worker-pool and batch sizing, the
//! run deadline, the scheduled trigger time and the degraded-run threshold.
//! Nothing is hard-coded in the engine itself.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider priority lists, highest priority first
    #[serde(default)]
    pub providers: ProviderChains,
    /// Cache TTLs per data category
    #[serde(default)]
    pub cache: CacheConfig,
    /// Batch engine knobs
    #[serde(default)]
    pub engine: EngineConfig,
    /// Daily trigger settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Read API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Instrument universe location
    #[serde(default)]
    pub universe: UniverseConfig,
    /// Eastmoney endpoints
    #[serde(default)]
    pub eastmoney: EastmoneyConfig,
    /// Sina endpoints
    #[serde(default)]
    pub sina: SinaConfig,
    /// Tushare Pro endpoint and token
    #[serde(default)]
    pub tushare: TushareConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: ProviderChains::default(),
            cache: CacheConfig::default(),
            engine: EngineConfig::default(),
            scheduler: SchedulerConfig::default(),
            api: ApiConfig::default(),
            universe: UniverseConfig::default(),
            eastmoney: EastmoneyConfig::default(),
            sina: SinaConfig::default(),
            tushare: TushareConfig::default(),
            settings: AppSettings::default(),
        }
    }
}

/// Ordered provider names per data category (priority high → low).
///
/// Order is static configuration — no provider is promoted at runtime based
/// on past success, keeping fallback behavior predictable and testable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderChains {
    #[serde(default = "default_quote_chain")]
    pub quotes: Vec<String>,
    #[serde(default = "default_flow_chain")]
    pub capital_flow: Vec<String>,
    #[serde(default = "default_breadth_chain")]
    pub breadth: Vec<String>,
}

impl Default for ProviderChains {
    fn default() -> Self {
        Self {
            quotes: default_quote_chain(),
            capital_flow: default_flow_chain(),
            breadth: default_breadth_chain(),
        }
    }
}

fn default_quote_chain() -> Vec<String> {
    vec!["eastmoney".to_string(), "sina".to_string()]
}

fn default_flow_chain() -> Vec<String> {
    vec!["tushare".to_string(), "eastmoney".to_string()]
}

fn default_breadth_chain() -> Vec<String> {
    vec!["eastmoney".to_string(), "sina".to_string()]
}

/// Per-category cache TTLs in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_quote_ttl")]
    pub quote_ttl_seconds: u64,
    #[serde(default = "default_flow_ttl")]
    pub flow_ttl_seconds: u64,
    #[serde(default = "default_breadth_ttl")]
    pub breadth_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            quote_ttl_seconds: default_quote_ttl(),
            flow_ttl_seconds: default_flow_ttl(),
            breadth_ttl_seconds: default_breadth_ttl(),
        }
    }
}

fn default_quote_ttl() -> u64 {
    60
}

fn default_flow_ttl() -> u64 {
    300
}

fn default_breadth_ttl() -> u64 {
    120
}

/// Batch engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bounded worker pool size — the primary throttle against upstream
    /// rate limits and scoring-backend load
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
    /// Instruments per dispatch batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Whole-run deadline in seconds; outstanding tasks past it are aborted
    #[serde(default = "default_run_deadline")]
    pub run_deadline_seconds: u64,
    /// Per-instrument scoring timeout in seconds
    #[serde(default = "default_scoring_timeout")]
    pub scoring_timeout_seconds: u64,
    /// Rolling lookback for the capital-flow aggregate, in trading days
    #[serde(default = "default_flow_lookback")]
    pub flow_lookback_days: usize,
    /// Failure fraction above which a completed run is flagged degraded
    #[serde(default = "default_degraded_threshold")]
    pub degraded_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: default_worker_pool_size(),
            batch_size: default_batch_size(),
            run_deadline_seconds: default_run_deadline(),
            scoring_timeout_seconds: default_scoring_timeout(),
            flow_lookback_days: default_flow_lookback(),
            degraded_threshold: default_degraded_threshold(),
        }
    }
}

fn default_worker_pool_size() -> usize {
    16
}

fn default_batch_size() -> usize {
    50
}

fn default_run_deadline() -> u64 {
    900
}

fn default_scoring_timeout() -> u64 {
    15
}

fn default_flow_lookback() -> usize {
    28
}

fn default_degraded_threshold() -> f64 {
    0.5
}

/// Daily trigger settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
    /// Local fire time, "HH:MM"
    #[serde(default = "default_fire_at")]
    pub fire_at: String,
    /// Non-trading weekdays, "YYYY-MM-DD"
    #[serde(default)]
    pub holidays: Vec<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            fire_at: default_fire_at(),
            holidays: Vec::new(),
        }
    }
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_fire_at() -> String {
    "08:00".to_string()
}

/// Read API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_bind")]
    pub bind: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_api_bind(),
        }
    }
}

fn default_api_bind() -> String {
    "127.0.0.1:8526".to_string()
}

/// Instrument universe location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseConfig {
    #[serde(default = "default_universe_file")]
    pub file: String,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            file: default_universe_file(),
        }
    }
}

fn default_universe_file() -> String {
    "data/universe.json".to_string()
}

/// Eastmoney endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EastmoneyConfig {
    #[serde(default = "default_eastmoney_data_url")]
    pub data_url: String,
    #[serde(default = "default_eastmoney_push_url")]
    pub push_url: String,
}

impl Default for EastmoneyConfig {
    fn default() -> Self {
        Self {
            data_url: default_eastmoney_data_url(),
            push_url: default_eastmoney_push_url(),
        }
    }
}

fn default_eastmoney_data_url() -> String {
    "https://datacenter-web.eastmoney.com".to_string()
}

fn default_eastmoney_push_url() -> String {
    "https://push2.eastmoney.com".to_string()
}

/// Sina endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinaConfig {
    #[serde(default = "default_sina_quote_url")]
    pub quote_url: String,
    #[serde(default = "default_sina_service_url")]
    pub service_url: String,
}

impl Default for SinaConfig {
    fn default() -> Self {
        Self {
            quote_url: default_sina_quote_url(),
            service_url: default_sina_service_url(),
        }
    }
}

fn default_sina_quote_url() -> String {
    "https://hq.sinajs.cn".to_string()
}

fn default_sina_service_url() -> String {
    "https://vip.stock.finance.sina.com.cn".to_string()
}

/// Tushare Pro endpoint and token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TushareConfig {
    #[serde(default = "default_tushare_url")]
    pub api_url: String,
    /// Without a token, Tushare entries are dropped from provider chains
    /// with a warning
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for TushareConfig {
    fn default() -> Self {
        Self {
            api_url: default_tushare_url(),
            token: None,
        }
    }
}

fn default_tushare_url() -> String {
    "https://api.tushare.pro".to_string()
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// HTTP request timeout in seconds for provider clients
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Directory snapshot artifacts are written to
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout_seconds: default_request_timeout(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_snapshot_dir() -> String {
    "decision_data".to_string()
}

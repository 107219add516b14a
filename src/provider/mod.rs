//! Upstream market-data providers and the fallback chain over them

pub mod eastmoney;
pub mod fallback;
pub mod sina;
pub mod source;
pub mod tushare;

pub use eastmoney::EastmoneyClient;
pub use fallback::FallbackProvider;
pub use sina::SinaClient;
pub use source::{
    BreadthQuery, BreadthSource, CacheKeyed, FetchSource, FlowQuery, FlowSource, QuoteSource,
    SourceBuilder,
};
pub use tushare::TushareClient;

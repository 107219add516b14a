//! Closed provider sets per data category
//!
//! Each category (quotes, capital flow, breadth) has a fixed enum of
//! provider variants behind one uniform `fetch` capability. The fallback
//! chain is an ordered `Vec` of these variants built from configuration —
//! no open-ended runtime plugin dispatch, per-provider logic stays
//! isolated in the client modules.

use async_trait::async_trait;
use tracing::warn;

use super::eastmoney::EastmoneyClient;
use super::sina::SinaClient;
use super::tushare::TushareClient;
use crate::common::errors::{EngineError, ProviderError, Result};
use crate::common::types::{BreadthSnapshot, CapitalFlowRecord, Quote};
use crate::config::loader::request_timeout;
use crate::config::types::AppConfig;

/// Queries that can serve as cache keys
pub trait CacheKeyed {
    fn cache_key(&self) -> String;
}

impl CacheKeyed for String {
    fn cache_key(&self) -> String {
        self.clone()
    }
}

/// Uniform fetch capability implemented by each per-category source enum
#[async_trait]
pub trait FetchSource: Send + Sync {
    type Query: CacheKeyed + Send + Sync;
    type Payload: Clone + Send + Sync;

    /// Name of the provider, used for source tagging and logs
    fn name(&self) -> &'static str;

    /// Single fetch attempt. Never retries internally; failure is always a
    /// typed error kind, never a silent empty success.
    async fn fetch(&self, query: &Self::Query) -> std::result::Result<Self::Payload, ProviderError>;
}

/// Quote providers
#[derive(Debug, Clone)]
pub enum QuoteSource {
    Eastmoney(EastmoneyClient),
    Sina(SinaClient),
    Tushare(TushareClient),
}

#[async_trait]
impl FetchSource for QuoteSource {
    type Query = String;
    type Payload = Quote;

    fn name(&self) -> &'static str {
        match self {
            QuoteSource::Eastmoney(_) => "eastmoney",
            QuoteSource::Sina(_) => "sina",
            QuoteSource::Tushare(_) => "tushare",
        }
    }

    async fn fetch(&self, symbol: &String) -> std::result::Result<Quote, ProviderError> {
        match self {
            QuoteSource::Eastmoney(c) => c.get_quote(symbol).await,
            QuoteSource::Sina(c) => c.get_quote(symbol).await,
            QuoteSource::Tushare(c) => c.get_quote(symbol).await,
        }
    }
}

/// Capital-flow history query: lookback in trading days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowQuery {
    pub days: usize,
}

impl CacheKeyed for FlowQuery {
    fn cache_key(&self) -> String {
        format!("flow:{}", self.days)
    }
}

/// Capital-flow providers
#[derive(Debug, Clone)]
pub enum FlowSource {
    Tushare(TushareClient),
    Eastmoney(EastmoneyClient),
}

#[async_trait]
impl FetchSource for FlowSource {
    type Query = FlowQuery;
    type Payload = Vec<CapitalFlowRecord>;

    fn name(&self) -> &'static str {
        match self {
            FlowSource::Tushare(_) => "tushare",
            FlowSource::Eastmoney(_) => "eastmoney",
        }
    }

    async fn fetch(
        &self,
        query: &FlowQuery,
    ) -> std::result::Result<Vec<CapitalFlowRecord>, ProviderError> {
        match self {
            FlowSource::Tushare(c) => c.get_capital_flow(query.days).await,
            FlowSource::Eastmoney(c) => c.get_capital_flow(query.days).await,
        }
    }
}

/// Market-wide breadth query; there is only one market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BreadthQuery;

impl CacheKeyed for BreadthQuery {
    fn cache_key(&self) -> String {
        "breadth".to_string()
    }
}

/// Breadth providers
#[derive(Debug, Clone)]
pub enum BreadthSource {
    Eastmoney(EastmoneyClient),
    Sina(SinaClient),
}

#[async_trait]
impl FetchSource for BreadthSource {
    type Query = BreadthQuery;
    type Payload = BreadthSnapshot;

    fn name(&self) -> &'static str {
        match self {
            BreadthSource::Eastmoney(_) => "eastmoney",
            BreadthSource::Sina(_) => "sina",
        }
    }

    async fn fetch(
        &self,
        _query: &BreadthQuery,
    ) -> std::result::Result<BreadthSnapshot, ProviderError> {
        match self {
            BreadthSource::Eastmoney(c) => c.get_breadth().await,
            BreadthSource::Sina(c) => c.get_breadth().await,
        }
    }
}

/// Shared clients used to build the per-category chains
pub struct SourceBuilder {
    eastmoney: EastmoneyClient,
    sina: SinaClient,
    tushare: Option<TushareClient>,
}

impl SourceBuilder {
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let timeout = request_timeout(cfg);
        let eastmoney =
            EastmoneyClient::with_timeout(&cfg.eastmoney.data_url, &cfg.eastmoney.push_url, timeout)
                .map_err(|e| EngineError::Configuration(e.to_string()))?;
        let sina = SinaClient::with_timeout(&cfg.sina.quote_url, &cfg.sina.service_url, timeout)
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        let tushare = match &cfg.tushare.token {
            Some(token) if !token.is_empty() => Some(
                TushareClient::with_timeout(&cfg.tushare.api_url, token, timeout)
                    .map_err(|e| EngineError::Configuration(e.to_string()))?,
            ),
            _ => None,
        };
        Ok(Self {
            eastmoney,
            sina,
            tushare,
        })
    }

    /// Build the ordered quote chain from configured provider names.
    ///
    /// Tushare entries without a configured token are skipped with a
    /// warning; unknown names are a configuration error.
    pub fn quote_chain(&self, names: &[String]) -> Result<Vec<QuoteSource>> {
        let mut chain = Vec::with_capacity(names.len());
        for name in names {
            match name.as_str() {
                "eastmoney" => chain.push(QuoteSource::Eastmoney(self.eastmoney.clone())),
                "sina" => chain.push(QuoteSource::Sina(self.sina.clone())),
                "tushare" => match &self.tushare {
                    Some(c) => chain.push(QuoteSource::Tushare(c.clone())),
                    None => warn!("tushare listed in providers.quotes but no token configured, skipping"),
                },
                other => {
                    return Err(EngineError::Configuration(format!(
                        "unknown quote provider {other:?}"
                    )))
                }
            }
        }
        if chain.is_empty() {
            return Err(EngineError::Configuration(
                "providers.quotes resolved to an empty chain".to_string(),
            ));
        }
        Ok(chain)
    }

    pub fn flow_chain(&self, names: &[String]) -> Result<Vec<FlowSource>> {
        let mut chain = Vec::with_capacity(names.len());
        for name in names {
            match name.as_str() {
                "eastmoney" => chain.push(FlowSource::Eastmoney(self.eastmoney.clone())),
                "tushare" => match &self.tushare {
                    Some(c) => chain.push(FlowSource::Tushare(c.clone())),
                    None => warn!("tushare listed in providers.capital_flow but no token configured, skipping"),
                },
                other => {
                    return Err(EngineError::Configuration(format!(
                        "unknown capital-flow provider {other:?}"
                    )))
                }
            }
        }
        if chain.is_empty() {
            return Err(EngineError::Configuration(
                "providers.capital_flow resolved to an empty chain".to_string(),
            ));
        }
        Ok(chain)
    }

    pub fn breadth_chain(&self, names: &[String]) -> Result<Vec<BreadthSource>> {
        let mut chain = Vec::with_capacity(names.len());
        for name in names {
            match name.as_str() {
                "eastmoney" => chain.push(BreadthSource::Eastmoney(self.eastmoney.clone())),
                "sina" => chain.push(BreadthSource::Sina(self.sina.clone())),
                other => {
                    return Err(EngineError::Configuration(format!(
                        "unknown breadth provider {other:?}"
                    )))
                }
            }
        }
        if chain.is_empty() {
            return Err(EngineError::Configuration(
                "providers.breadth resolved to an empty chain".to_string(),
            ));
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::AppConfig;

    #[test]
    fn builds_chains_from_default_config() {
        let cfg = AppConfig::default();
        let builder = SourceBuilder::from_config(&cfg).unwrap();

        let quotes = builder.quote_chain(&cfg.providers.quotes).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].name(), "eastmoney");
        assert_eq!(quotes[1].name(), "sina");

        // tushare has no token in the default config, so the flow chain
        // degrades to eastmoney only
        let flows = builder.flow_chain(&cfg.providers.capital_flow).unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].name(), "eastmoney");
    }

    #[test]
    fn unknown_provider_is_a_config_error() {
        let cfg = AppConfig::default();
        let builder = SourceBuilder::from_config(&cfg).unwrap();
        let err = builder.quote_chain(&["bloomberg".to_string()]).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn all_skipped_chain_is_rejected() {
        let cfg = AppConfig::default();
        let builder = SourceBuilder::from_config(&cfg).unwrap();
        let err = builder.flow_chain(&["tushare".to_string()]).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }
}

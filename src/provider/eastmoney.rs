//! Eastmoney data-center and push2 API client
//!
//! Primary free source for quotes, market breadth and north-bound capital
//! flow. Quote prices arrive as integers scaled by 100; flow amounts arrive
//! in yuan and are normalized to 亿元 (1e8 CNY).

use chrono::{NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::common::errors::{status_to_provider_error, ProviderError};
use crate::common::types::{BreadthSnapshot, CapitalFlowRecord, Exchange, Quote};

/// REST client for Eastmoney public market data
#[derive(Debug, Clone)]
pub struct EastmoneyClient {
    client: Client,
    /// Data-center base URL (reports: breadth, north-bound flow)
    data_url: String,
    /// push2 base URL (real-time quotes)
    push_url: String,
}

impl EastmoneyClient {
    pub fn new(data_url: &str, push_url: &str) -> Result<Self, ProviderError> {
        Self::with_timeout(data_url, push_url, Duration::from_secs(30))
    }

    pub fn with_timeout(
        data_url: &str,
        push_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            data_url: data_url.trim_end_matches('/').to_string(),
            push_url: push_url.trim_end_matches('/').to_string(),
        })
    }

    /// push2 market prefix: 1 = Shanghai, 0 = Shenzhen
    fn secid(symbol: &str) -> String {
        match Exchange::from_symbol(symbol) {
            Exchange::Shanghai => format!("1.{symbol}"),
            Exchange::Shenzhen => format!("0.{symbol}"),
        }
    }

    /// Fetch a real-time quote for one instrument
    #[instrument(skip(self))]
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let url = format!(
            "{}/api/qt/stock/get?secid={}&fields=f43,f47,f57,f58,f170",
            self.push_url,
            Self::secid(symbol)
        );
        debug!("Fetching quote from: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_provider_error(status, body));
        }

        let quote_response: PushQuoteResponse = response.json().await?;
        let data = quote_response
            .data
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))?;

        // f43/f170 are scaled by 100 on the wire
        Ok(Quote {
            symbol: symbol.to_string(),
            price: Decimal::new(data.f43, 2),
            change_pct: Decimal::new(data.f170, 2),
            volume: data.f47,
            timestamp: Utc::now(),
        })
    }

    /// Fetch advance/decline counts across the whole market
    #[instrument(skip(self))]
    pub async fn get_breadth(&self) -> Result<BreadthSnapshot, ProviderError> {
        let url = format!(
            "{}/api/data/v1/get?reportName=RPT_MARKET_UPDOWN_COUNT&columns=ALL&pageSize=1&sortColumns=TRADE_DATE&sortTypes=-1&source=WEB&client=WEB",
            self.data_url
        );
        debug!("Fetching market breadth from: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_provider_error(status, body));
        }

        let report: DataCenterResponse<BreadthRow> = response.json().await?;
        let row = report
            .into_rows()?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed("empty breadth report".to_string()))?;

        Ok(BreadthSnapshot {
            advancers: row.up_count,
            decliners: row.down_count,
            unchanged: row.flat_count,
        })
    }

    /// Fetch north-bound capital flow history, returned ascending by date
    #[instrument(skip(self))]
    pub async fn get_capital_flow(&self, days: usize) -> Result<Vec<CapitalFlowRecord>, ProviderError> {
        let url = format!(
            "{}/api/data/v1/get?reportName=RPT_MUTUAL_STOCK_NORTHSTA&columns=ALL&pageSize={}&sortColumns=TRADE_DATE&sortTypes=-1&source=WEB&client=WEB",
            self.data_url, days
        );
        debug!("Fetching north-bound flow from: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_provider_error(status, body));
        }

        let report: DataCenterResponse<FlowRow> = response.json().await?;
        let rows = report.into_rows()?;
        if rows.is_empty() {
            return Err(ProviderError::NotFound(
                "north-bound flow report is empty".to_string(),
            ));
        }

        let yuan_per_yi = Decimal::new(100_000_000, 0);
        let mut records: Vec<CapitalFlowRecord> = rows
            .into_iter()
            .take(days)
            .map(|row| {
                let date = NaiveDate::parse_from_str(&row.trade_date[..10.min(row.trade_date.len())], "%Y-%m-%d")
                    .map_err(|e| {
                        ProviderError::Malformed(format!(
                            "bad TRADE_DATE {:?}: {e}",
                            row.trade_date
                        ))
                    })?;
                let north_money = Decimal::try_from(row.north_money).map_err(|e| {
                    ProviderError::Malformed(format!("bad NORTH_MONEY {}: {e}", row.north_money))
                })?;
                Ok(CapitalFlowRecord {
                    date,
                    net_inflow: (north_money / yuan_per_yi).round_dp(2),
                })
            })
            .collect::<Result<_, ProviderError>>()?;

        // Upstream sorts newest first; callers expect ascending dates
        records.reverse();
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct PushQuoteResponse {
    data: Option<PushQuoteData>,
}

#[derive(Debug, Deserialize)]
struct PushQuoteData {
    /// Last price, scaled by 100
    f43: i64,
    /// Volume in lots
    #[serde(default)]
    f47: Option<u64>,
    /// Percent change, scaled by 100
    f170: i64,
}

/// Shared envelope of data-center v1 reports
#[derive(Debug, Deserialize)]
struct DataCenterResponse<T> {
    result: Option<DataCenterResult<T>>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataCenterResult<T> {
    data: Vec<T>,
}

impl<T> DataCenterResponse<T> {
    fn into_rows(self) -> Result<Vec<T>, ProviderError> {
        match self.result {
            Some(result) => Ok(result.data),
            None => Err(ProviderError::Malformed(format!(
                "data-center report missing result: {}",
                self.message.unwrap_or_default()
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BreadthRow {
    #[serde(rename = "UP_COUNT")]
    up_count: u32,
    #[serde(rename = "DOWN_COUNT")]
    down_count: u32,
    #[serde(rename = "FLAT_COUNT")]
    flat_count: u32,
}

#[derive(Debug, Deserialize)]
struct FlowRow {
    #[serde(rename = "TRADE_DATE")]
    trade_date: String,
    #[serde(rename = "NORTH_MONEY")]
    north_money: f64,
}

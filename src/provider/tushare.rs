//! Tushare Pro client
//!
//! Paid/authenticated source with the highest data quality. All calls go
//! through one JSON POST endpoint carrying `api_name`, the token, params
//! and a field list; results come back columnar (`fields` + `items`).

use chrono::{NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::common::errors::{status_to_provider_error, ProviderError};
use crate::common::types::{CapitalFlowRecord, Exchange, Quote};

/// Client for the Tushare Pro API
#[derive(Debug, Clone)]
pub struct TushareClient {
    client: Client,
    api_url: String,
    token: String,
}

impl TushareClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self, ProviderError> {
        Self::with_timeout(api_url, token, Duration::from_secs(30))
    }

    pub fn with_timeout(
        api_url: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Tushare instrument code: symbol plus exchange suffix
    fn ts_code(symbol: &str) -> String {
        match Exchange::from_symbol(symbol) {
            Exchange::Shanghai => format!("{symbol}.SH"),
            Exchange::Shenzhen => format!("{symbol}.SZ"),
        }
    }

    async fn call(
        &self,
        api_name: &str,
        params: serde_json::Value,
        fields: &str,
    ) -> Result<TushareData, ProviderError> {
        debug!("Calling Tushare api_name={}", api_name);
        let body = json!({
            "api_name": api_name,
            "token": self.token,
            "params": params,
            "fields": fields,
        });

        let response = self.client.post(&self.api_url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_provider_error(status, body));
        }

        let envelope: TushareResponse = response.json().await?;
        if envelope.code != 0 {
            let msg = envelope.msg.unwrap_or_default();
            // Per-minute quota errors come back as an application-level code
            if msg.contains("每分钟") || msg.to_lowercase().contains("limit") {
                return Err(ProviderError::RateLimited {
                    retry_after_seconds: Some(60),
                });
            }
            return Err(ProviderError::Malformed(format!(
                "tushare code {}: {msg}",
                envelope.code
            )));
        }

        envelope
            .data
            .ok_or_else(|| ProviderError::Malformed("tushare response missing data".to_string()))
    }

    /// Fetch the latest daily bar as a quote
    #[instrument(skip(self))]
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let data = self
            .call(
                "daily",
                json!({ "ts_code": Self::ts_code(symbol) }),
                "trade_date,close,pct_chg,vol",
            )
            .await?;

        let row = data
            .items
            .first()
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))?;

        let close = data.decimal_at(row, "close")?;
        let pct_chg = data.decimal_at(row, "pct_chg")?;
        let volume = data
            .decimal_at(row, "vol")
            .ok()
            .and_then(|v| v.trunc().to_u64());

        Ok(Quote {
            symbol: symbol.to_string(),
            price: close,
            change_pct: pct_chg.round_dp(2),
            volume,
            timestamp: Utc::now(),
        })
    }

    /// Fetch north-bound flow history; upstream reports in 百万元, which is
    /// normalized here to 亿元 to match the rest of the pipeline
    #[instrument(skip(self))]
    pub async fn get_capital_flow(&self, days: usize) -> Result<Vec<CapitalFlowRecord>, ProviderError> {
        let data = self
            .call("moneyflow_hsgt", json!({}), "trade_date,north_money")
            .await?;

        if data.items.is_empty() {
            return Err(ProviderError::NotFound(
                "moneyflow_hsgt returned no rows".to_string(),
            ));
        }

        let millions_per_yi = Decimal::new(100, 0);
        let mut records: Vec<CapitalFlowRecord> = data
            .items
            .iter()
            .take(days)
            .map(|row| {
                let date_str = data.string_at(row, "trade_date")?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y%m%d").map_err(|e| {
                    ProviderError::Malformed(format!("bad trade_date {date_str:?}: {e}"))
                })?;
                let north_money = data.decimal_at(row, "north_money")?;
                Ok(CapitalFlowRecord {
                    date,
                    net_inflow: (north_money / millions_per_yi).round_dp(2),
                })
            })
            .collect::<Result<_, ProviderError>>()?;

        // Upstream sorts newest first; callers expect ascending dates
        records.reverse();
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct TushareResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<TushareData>,
}

/// Columnar result: field names plus rows of heterogeneous values
#[derive(Debug, Deserialize)]
struct TushareData {
    fields: Vec<String>,
    items: Vec<Vec<serde_json::Value>>,
}

impl TushareData {
    fn index_of(&self, field: &str) -> Result<usize, ProviderError> {
        self.fields
            .iter()
            .position(|f| f == field)
            .ok_or_else(|| ProviderError::Malformed(format!("missing field {field:?}")))
    }

    fn decimal_at(&self, row: &[serde_json::Value], field: &str) -> Result<Decimal, ProviderError> {
        let idx = self.index_of(field)?;
        let value = row
            .get(idx)
            .ok_or_else(|| ProviderError::Malformed(format!("short row for {field:?}")))?;
        match value {
            serde_json::Value::Number(n) => {
                let f = n
                    .as_f64()
                    .ok_or_else(|| ProviderError::Malformed(format!("non-finite {field:?}")))?;
                Decimal::try_from(f)
                    .map_err(|e| ProviderError::Malformed(format!("bad {field:?}: {e}")))
            }
            serde_json::Value::String(s) => s
                .parse()
                .map_err(|e| ProviderError::Malformed(format!("bad {field:?}: {e}"))),
            other => Err(ProviderError::Malformed(format!(
                "unexpected {field:?} value: {other}"
            ))),
        }
    }

    fn string_at(&self, row: &[serde_json::Value], field: &str) -> Result<String, ProviderError> {
        let idx = self.index_of(field)?;
        match row.get(idx) {
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(ProviderError::Malformed(format!("short row for {field:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ts_code_suffixes() {
        assert_eq!(TushareClient::ts_code("600519"), "600519.SH");
        assert_eq!(TushareClient::ts_code("000001"), "000001.SZ");
    }

    #[test]
    fn columnar_lookup() {
        let data = TushareData {
            fields: vec!["trade_date".to_string(), "north_money".to_string()],
            items: vec![vec![
                serde_json::Value::String("20260828".to_string()),
                serde_json::json!(1862.0),
            ]],
        };
        let row = &data.items[0];
        assert_eq!(data.string_at(row, "trade_date").unwrap(), "20260828");
        assert_eq!(
            data.decimal_at(row, "north_money").unwrap(),
            Decimal::new(1862, 0)
        );
        assert!(data.decimal_at(row, "missing").is_err());
    }
}

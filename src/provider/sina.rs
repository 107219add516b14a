//! Sina Finance client
//!
//! Secondary free source. Quotes use the legacy `hq_str` text protocol
//! (`var hq_str_sh600519="name,open,prev_close,price,...";`); percent
//! change is derived from price vs. previous close. Breadth comes from the
//! market-center node-count JSON endpoint.

use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::common::errors::{status_to_provider_error, ProviderError};
use crate::common::types::{BreadthSnapshot, Exchange, Quote};

/// Client for Sina Finance public endpoints
#[derive(Debug, Clone)]
pub struct SinaClient {
    client: Client,
    /// hq quote host
    quote_url: String,
    /// quotes_service JSON host
    service_url: String,
}

impl SinaClient {
    pub fn new(quote_url: &str, service_url: &str) -> Result<Self, ProviderError> {
        Self::with_timeout(quote_url, service_url, Duration::from_secs(30))
    }

    pub fn with_timeout(
        quote_url: &str,
        service_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            quote_url: quote_url.trim_end_matches('/').to_string(),
            service_url: service_url.trim_end_matches('/').to_string(),
        })
    }

    fn hq_symbol(symbol: &str) -> String {
        match Exchange::from_symbol(symbol) {
            Exchange::Shanghai => format!("sh{symbol}"),
            Exchange::Shenzhen => format!("sz{symbol}"),
        }
    }

    /// Fetch a real-time quote via the hq text protocol
    #[instrument(skip(self))]
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let url = format!("{}/list={}", self.quote_url, Self::hq_symbol(symbol));
        debug!("Fetching quote from: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Referer", "https://finance.sina.com.cn/")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_provider_error(status, body));
        }

        let body = response.text().await?;
        parse_hq_quote(symbol, &body)
    }

    /// Fetch advance/decline counts from the market-center node counts
    #[instrument(skip(self))]
    pub async fn get_breadth(&self) -> Result<BreadthSnapshot, ProviderError> {
        let url = format!(
            "{}/quotes_service/api/json_v2.php/Market_Center.getNodeUpDownCount",
            self.service_url
        );
        debug!("Fetching breadth from: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_provider_error(status, body));
        }

        let counts: NodeCountResponse = response.json().await?;
        Ok(BreadthSnapshot {
            advancers: counts.up,
            decliners: counts.down,
            unchanged: counts.flat,
        })
    }
}

/// Parse one `hq_str` line into a quote.
///
/// Field layout (comma separated): 0 name, 1 open, 2 previous close,
/// 3 last price, ... 8 volume. An empty payload means the symbol is
/// unknown upstream.
fn parse_hq_quote(symbol: &str, body: &str) -> Result<Quote, ProviderError> {
    let start = body
        .find('"')
        .ok_or_else(|| ProviderError::Malformed("missing hq_str payload".to_string()))?;
    let end = body[start + 1..]
        .find('"')
        .ok_or_else(|| ProviderError::Malformed("unterminated hq_str payload".to_string()))?;
    let payload = &body[start + 1..start + 1 + end];

    if payload.is_empty() {
        return Err(ProviderError::NotFound(symbol.to_string()));
    }

    let fields: Vec<&str> = payload.split(',').collect();
    if fields.len() < 9 {
        return Err(ProviderError::Malformed(format!(
            "hq_str has {} fields, expected at least 9",
            fields.len()
        )));
    }

    let prev_close: Decimal = fields[2]
        .parse()
        .map_err(|e| ProviderError::Malformed(format!("bad previous close: {e}")))?;
    let price: Decimal = fields[3]
        .parse()
        .map_err(|e| ProviderError::Malformed(format!("bad price: {e}")))?;
    let volume: Option<u64> = fields[8].parse().ok();

    if price.is_zero() && prev_close.is_zero() {
        return Err(ProviderError::NotFound(symbol.to_string()));
    }

    let change_pct = if prev_close.is_zero() {
        Decimal::ZERO
    } else {
        ((price - prev_close) / prev_close * Decimal::new(100, 0)).round_dp(2)
    };

    Ok(Quote {
        symbol: symbol.to_string(),
        price,
        change_pct,
        volume,
        timestamp: Utc::now(),
    })
}

#[derive(Debug, Deserialize)]
struct NodeCountResponse {
    up: u32,
    down: u32,
    flat: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HQ_LINE: &str = "var hq_str_sh600519=\"贵州茅台,1688.00,1680.00,1701.00,1705.00,1685.00,1700.99,1701.00,32000,54400000,100,1700.99,200,1700.50,2026-08-28,15:00:03,00\";";

    #[test]
    fn parses_hq_quote_line() {
        let quote = parse_hq_quote("600519", HQ_LINE).unwrap();
        assert_eq!(quote.price, dec!(1701.00));
        assert_eq!(quote.change_pct, dec!(1.25));
        assert_eq!(quote.volume, Some(32000));
    }

    #[test]
    fn empty_payload_is_not_found() {
        let err = parse_hq_quote("999999", "var hq_str_sz999999=\"\";").unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[test]
    fn short_payload_is_malformed() {
        let err = parse_hq_quote("600519", "var hq_str_sh600519=\"a,b,c\";").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn hq_symbol_prefixes() {
        assert_eq!(SinaClient::hq_symbol("600519"), "sh600519");
        assert_eq!(SinaClient::hq_symbol("000001"), "sz000001");
    }
}

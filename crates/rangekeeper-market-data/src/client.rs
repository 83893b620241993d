//! Failover candle client: tries each configured provider in order,
//! advancing on any transport error or geo-block.

use std::time::Duration;

use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use tracing::warn;

use crate::candles::{Candles, Provider};
use crate::error::{MarketDataError, Result};
use crate::indicators::{atr, rsi};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MarketDataClient {
    http: HttpClient,
    symbol: String,
}

impl MarketDataClient {
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            http: HttpClient::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            symbol: symbol.into(),
        }
    }

    /// Fetches `limit` closed candles at `interval` (e.g. `"15m"`), failing
    /// over across the provider chain on transport error or geo-block.
    pub async fn candles(&self, interval: &str, limit: usize) -> Result<Candles> {
        let mut last_err = None;
        for provider in Provider::chain() {
            match self.fetch_from(*provider, interval, limit).await {
                Ok(candles) if !candles.is_empty() => return Ok(candles),
                Ok(_) => {
                    warn!(provider = provider.name(), "provider returned no candles");
                    last_err = Some(MarketDataError::EmptyCandles);
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "provider failed, trying next");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(MarketDataError::AllProvidersExhausted))
    }

    async fn fetch_from(&self, provider: Provider, interval: &str, limit: usize) -> Result<Candles> {
        let url = match provider {
            Provider::Coinbase => format!(
                "https://api.exchange.coinbase.com/products/{}/candles?granularity={}",
                self.symbol,
                interval_to_seconds(interval)
            ),
            Provider::Kraken => format!(
                "https://api.kraken.com/0/public/OHLC?pair={}&interval={}",
                self.symbol,
                interval_to_minutes(interval)
            ),
            Provider::Binance => format!(
                "https://api.binance.com/api/v3/klines?symbol={}&interval={}&limit={}",
                self.symbol, interval, limit
            ),
        };

        let resp = self.http.get(&url).send().await?;
        if resp.status().as_u16() == 451 {
            return Err(MarketDataError::GeoBlocked);
        }
        let body: serde_json::Value = resp.error_for_status()?.json().await?;
        parse_candles(provider, &body, limit)
    }

    /// Last value of the Average True Range over `period` closed candles.
    pub async fn atr(&self, interval: &str, period: usize) -> Result<Decimal> {
        let candles = self.candles(interval, period + 1).await?;
        atr(&candles, period).ok_or(MarketDataError::EmptyCandles)
    }

    /// Last value of the Relative Strength Index over `period` closed candles.
    pub async fn rsi(&self, interval: &str, period: usize) -> Result<Decimal> {
        let candles = self.candles(interval, period + 1).await?;
        rsi(&candles, period).ok_or(MarketDataError::EmptyCandles)
    }
}

fn interval_to_seconds(interval: &str) -> u32 {
    interval_to_minutes(interval) * 60
}

fn interval_to_minutes(interval: &str) -> u32 {
    let digits: String = interval.chars().take_while(|c| c.is_ascii_digit()).collect();
    let value: u32 = digits.parse().unwrap_or(15);
    match interval.chars().last() {
        Some('h') => value * 60,
        Some('d') => value * 60 * 24,
        _ => value,
    }
}

fn parse_candles(provider: Provider, body: &serde_json::Value, limit: usize) -> Result<Candles> {
    let rows = body
        .as_array()
        .cloned()
        .or_else(|| {
            body.get("result")
                .and_then(|r| r.as_object())
                .and_then(|o| o.values().next())
                .and_then(|v| v.as_array().cloned())
        })
        .ok_or_else(|| MarketDataError::Parse(format!("unrecognized response shape from {}", provider.name())))?;

    let mut high = Vec::new();
    let mut low = Vec::new();
    let mut close = Vec::new();

    for row in rows.iter().rev().take(limit).rev() {
        let arr = row
            .as_array()
            .ok_or_else(|| MarketDataError::Parse("candle row is not an array".to_string()))?;
        let (h_idx, l_idx, c_idx) = match provider {
            Provider::Coinbase => (2, 1, 4),
            Provider::Kraken => (3, 4, 5),
            Provider::Binance => (2, 3, 4),
        };
        high.push(parse_decimal(arr.get(h_idx))?);
        low.push(parse_decimal(arr.get(l_idx))?);
        close.push(parse_decimal(arr.get(c_idx))?);
    }

    Ok(Candles { high, low, close })
}

fn parse_decimal(value: Option<&serde_json::Value>) -> Result<Decimal> {
    let value = value.ok_or_else(|| MarketDataError::Parse("missing field".to_string()))?;
    let s = if let Some(s) = value.as_str() {
        s.to_string()
    } else if let Some(f) = value.as_f64() {
        f.to_string()
    } else {
        return Err(MarketDataError::Parse("unexpected field type".to_string()));
    };
    s.parse::<Decimal>()
        .map_err(|e| MarketDataError::Parse(format!("invalid decimal {s}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_to_minutes_parses_suffix() {
        assert_eq!(interval_to_minutes("15m"), 15);
        assert_eq!(interval_to_minutes("1h"), 60);
        assert_eq!(interval_to_minutes("1d"), 1440);
    }

    #[test]
    fn parse_candles_binance_shape() {
        let body = serde_json::json!([
            [0, "100", "110", "90", "105"],
            [0, "105", "115", "95", "110"],
        ]);
        let candles = parse_candles(Provider::Binance, &body, 10).unwrap();
        assert_eq!(candles.close.len(), 2);
        assert_eq!(candles.close[0].to_string(), "105");
    }
}

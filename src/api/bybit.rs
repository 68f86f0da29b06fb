//! Bybit exchange API client
//!
//! Fetches daily spot klines and collapses them to calendar-dated bars, the
//! only granularity this pipeline consumes.
//!
//! # Example
//!
//! ```rust,no_run
//! use btc_forecast::api::BybitClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = BybitClient::new();
//!     let bars = client.get_daily_bars("BTCUSDT", 365).await.unwrap();
//!     println!("Got {} daily bars", bars.len());
//! }
//! ```

use super::error::{ApiError, ApiResult};
use crate::data::types::{validate_series, DailyBar};
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

/// Bybit API base URL
const BASE_URL: &str = "https://api.bybit.com";

/// Bybit API client for fetching daily market data
#[derive(Debug, Clone)]
pub struct BybitClient {
    client: Client,
    base_url: String,
}

/// Response wrapper from Bybit API
#[derive(Debug, Deserialize)]
struct BybitResponse<T> {
    #[serde(rename = "retCode")]
    ret_code: i32,
    #[serde(rename = "retMsg")]
    ret_msg: String,
    result: T,
}

/// Kline result from Bybit API
#[derive(Debug, Deserialize)]
struct KlineResult {
    #[allow(dead_code)]
    symbol: String,
    #[allow(dead_code)]
    category: String,
    list: Vec<Vec<String>>,
}

/// Parse one kline row `[startTimeMs, open, high, low, close, volume, turnover]`
/// into a calendar-dated bar. Malformed rows are skipped.
fn bar_from_kline(item: &[String]) -> Option<DailyBar> {
    if item.len() < 6 {
        return None;
    }
    let ts_ms: i64 = item[0].parse().ok()?;
    let date = Utc.timestamp_millis_opt(ts_ms).single()?.date_naive();

    Some(DailyBar {
        date,
        open: item[1].parse().ok()?,
        high: item[2].parse().ok()?,
        low: item[3].parse().ok()?,
        close: item[4].parse().ok()?,
        volume: item[5].parse().ok()?,
    })
}

impl Default for BybitClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BybitClient {
    /// Create a new Bybit client against mainnet
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Create a client with a custom base URL
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Create a testnet client
    pub fn testnet() -> Self {
        Self::with_base_url("https://api-testnet.bybit.com")
    }

    /// Fetch daily bars for a spot symbol
    ///
    /// # Arguments
    ///
    /// * `symbol` - Trading pair symbol (e.g., "BTCUSDT")
    /// * `limit` - Number of days to fetch (max 1000)
    ///
    /// # Returns
    ///
    /// Bars sorted by date (oldest first), one per calendar day, validated.
    pub async fn get_daily_bars(&self, symbol: &str, limit: usize) -> ApiResult<Vec<DailyBar>> {
        let url = format!(
            "{}/v5/market/kline?category=spot&symbol={}&interval=D&limit={}",
            self.base_url,
            symbol.to_uppercase(),
            limit.min(1000)
        );

        let response: BybitResponse<KlineResult> =
            self.client.get(&url).send().await?.json().await?;

        if response.ret_code != 0 {
            return Err(ApiError::ApiResponseError {
                code: response.ret_code,
                message: response.ret_msg,
            });
        }

        let mut bars: Vec<DailyBar> = response
            .result
            .list
            .iter()
            .filter_map(|item| bar_from_kline(item))
            .collect();

        // API returns newest first
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        if bars.is_empty() {
            return Err(ApiError::NoData(symbol.to_string()));
        }

        validate_series(&bars).map_err(|e| ApiError::InvalidData {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?;

        Ok(bars)
    }
}

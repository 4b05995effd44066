//! USD/JPY cross-rate from Bitfinex's public ticker.
//!
//! An independent provider from the exchange itself; no API key is required.

use reqwest::Client;
use tracing::debug;

use crate::error::{Error, Result};
use crate::exchange::decode_response;

pub const BITFINEX_API_BASE: &str = "https://api-pub.bitfinex.com";

const USD_JPY_TICKER_PATH: &str = "/v2/ticker/tUSDJPY";

/// USD/JPY rate source backed by Bitfinex's public v2 ticker endpoint.
#[derive(Debug, Clone)]
pub struct BitfinexRateSource {
    client: Client,
    base_url: String,
}

impl BitfinexRateSource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: BITFINEX_API_BASE.to_string(),
        }
    }

    /// Replaces the HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Points the source at a different base URL (mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetches the current USD/JPY rate. Invoked once per valuation run; no
    /// caching.
    pub async fn usd_jpy(&self) -> Result<f64> {
        let url = format!("{}{USD_JPY_TICKER_PATH}", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let ticker: Vec<f64> = decode_response("usd/jpy ticker", status, &body)?;

        // TODO: the v2 ticker array carries the last trade price at index 6;
        // index 0 is the bid. Confirm which the rate should use before
        // changing this.
        let rate = ticker
            .first()
            .copied()
            .ok_or(Error::EmptyTicker("usd/jpy ticker"))?;
        debug!(rate, "fetched usd/jpy rate");
        Ok(rate)
    }
}

impl Default for BitfinexRateSource {
    fn default() -> Self {
        Self::new()
    }
}

//! Spot ticker lookups used to price assets in USD.

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::Result;
use crate::exchange::ExchangeClient;
use crate::symbols::normalize_symbol;

pub const TICKER_PATH: &str = "/api/v3/ticker";

/// Quote asset used as the USD proxy when pricing.
pub const QUOTE_ASSET: &str = "USDT";

/// Rolling-window ticker response. Only the last trade price matters here;
/// pairs the exchange does not trade come back without one.
#[derive(Debug, Default, Deserialize)]
pub struct TickerResponse {
    #[serde(rename = "lastPrice", default, deserialize_with = "de_opt_f64_flexible")]
    pub last_price: Option<f64>,
}

impl TickerResponse {
    /// A missing last price means the pair is unknown to the exchange
    /// (stablecoins, delisted assets). Such assets contribute zero value
    /// instead of aborting the valuation.
    pub fn last_price_or_zero(&self) -> f64 {
        self.last_price.unwrap_or(0.0)
    }
}

impl ExchangeClient {
    /// Last traded USD price for an asset, via its USDT pair.
    ///
    /// The symbol is normalized first; unknown pairs price at zero.
    pub async fn last_price_usd(&self, symbol: &str) -> Result<f64> {
        let symbol = normalize_symbol(symbol);
        let pair = format!("{symbol}{QUOTE_ASSET}");
        let params = vec![("symbol", pair.clone())];
        let ticker: TickerResponse = self.public_get(TICKER_PATH, "ticker", params).await?;
        if ticker.last_price.is_none() {
            debug!(%pair, "no last price for pair, valuing at zero");
        }
        Ok(ticker.last_price_or_zero())
    }
}

/// Prices arrive as decimal strings; tolerate plain numbers too.
fn de_opt_f64_flexible<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(value)) => Ok(Some(value)),
        Some(Raw::Str(value)) => value
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_last_price_string() {
        let ticker: TickerResponse = serde_json::from_str(r#"{"lastPrice": "123.45"}"#).unwrap();
        assert_eq!(ticker.last_price, Some(123.45));
        assert!((ticker.last_price_or_zero() - 123.45).abs() < 1e-9);
    }

    #[test]
    fn parses_last_price_number() {
        let ticker: TickerResponse = serde_json::from_str(r#"{"lastPrice": 50000}"#).unwrap();
        assert_eq!(ticker.last_price, Some(50000.0));
    }

    #[test]
    fn missing_last_price_values_at_zero() {
        let ticker: TickerResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(ticker.last_price, None);
        assert_eq!(ticker.last_price_or_zero(), 0.0);
    }

    #[test]
    fn extra_ticker_fields_are_ignored() {
        let ticker: TickerResponse = serde_json::from_str(
            r#"{"symbol":"BTCUSDT","lastPrice":"50000.00","volume":"12.3"}"#,
        )
        .unwrap();
        assert_eq!(ticker.last_price, Some(50000.0));
    }

    #[test]
    fn malformed_last_price_is_a_decode_error() {
        let result = serde_json::from_str::<TickerResponse>(r#"{"lastPrice": "not a number"}"#);
        assert!(result.is_err());
    }
}

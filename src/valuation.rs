//! Values the latest spot balances in JPY.

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::exchange::ExchangeClient;
use crate::fx::BitfinexRateSource;
use crate::symbols::normalize_symbol;

/// Result of a valuation run: either one asset's JPY value or the whole
/// portfolio mapping keyed by normalized symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Valuation {
    Asset(f64),
    Portfolio(HashMap<String, f64>),
}

pub struct ValuationService {
    exchange: ExchangeClient,
    fx: BitfinexRateSource,
}

impl ValuationService {
    pub fn new(exchange: ExchangeClient, fx: BitfinexRateSource) -> Self {
        Self { exchange, fx }
    }

    /// Values the latest deduplicated balances in JPY, one price lookup per
    /// record, sequentially.
    ///
    /// Records that normalize to the same symbol (earn wrappers and their
    /// underlying asset) sum into one entry. When `asset` names a key in the
    /// computed mapping only that value is returned; a miss returns the full
    /// mapping unchanged.
    pub async fn latest_assets_in_jpy(&self, asset: Option<&str>) -> Result<Valuation> {
        let balances = self.exchange.latest_balances().await?;
        let usd_jpy = self.fx.usd_jpy().await?;

        let mut totals: HashMap<String, f64> = HashMap::new();
        for record in &balances {
            let symbol = normalize_symbol(&record.asset);
            let free: f64 = record.free.parse().map_err(|_| Error::InvalidAmount {
                asset: record.asset.clone(),
                value: record.free.clone(),
            })?;
            let usd_price = self.exchange.last_price_usd(symbol).await?;
            *totals.entry(symbol.to_string()).or_insert(0.0) += usd_price * free * usd_jpy;
        }
        info!(assets = totals.len(), "valued latest balances");

        if let Some(filter) = asset {
            if let Some(value) = totals.get(filter).copied() {
                return Ok(Valuation::Asset(value));
            }
        }
        Ok(Valuation::Portfolio(totals))
    }
}

//! Account snapshot history: fetching, latest-snapshot selection, and
//! duplicate collapse.
//!
//! The exchange reports one snapshot per day over a trailing window, in no
//! guaranteed order, and sometimes repeats balance entries inside a snapshot.
//! Valuation only ever looks at the most recent snapshot with duplicates
//! collapsed.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::Result;
use crate::exchange::ExchangeClient;

pub const SNAPSHOT_PATH: &str = "/sapi/v1/accountSnapshot";

/// Trailing window the snapshot request covers.
pub const DEFAULT_WINDOW_DAYS: i64 = 29;

#[derive(Debug, Deserialize)]
pub struct SnapshotResponse {
    #[allow(dead_code)]
    code: i64,
    #[allow(dead_code)]
    msg: String,
    #[serde(rename = "snapshotVos")]
    pub snapshot_vos: Vec<Snapshot>,
}

/// A point-in-time record of all spot balances in the account.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "type")]
    pub snapshot_type: String,
    #[serde(rename = "updateTime", deserialize_with = "de_i64_flexible")]
    pub update_time: i64,
    pub data: SnapshotData,
    /// UTC calendar date derived from `update_time`, attached after fetch.
    #[serde(skip)]
    pub update_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotData {
    pub balances: Vec<BalanceRecord>,
    #[serde(rename = "totalAssetOfBtc")]
    pub total_asset_of_btc: Option<String>,
}

/// One asset's free/locked amounts within a snapshot.
///
/// Amounts stay as the strings the exchange sent; structural equality over
/// all four fields defines duplicate identity.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Hash)]
pub struct BalanceRecord {
    pub asset: String,
    pub free: String,
    pub locked: String,
    #[serde(
        rename = "updateTime",
        default,
        deserialize_with = "de_i64_flexible"
    )]
    pub update_time: i64,
}

impl ExchangeClient {
    /// Fetches account snapshots over a trailing window ending now.
    ///
    /// Snapshots come back in whatever order the exchange chose.
    pub async fn account_snapshots(&self, days: i64) -> Result<Vec<Snapshot>> {
        let end = self.clock().now();
        let start = end - Duration::days(days);
        let params = vec![
            ("type", "SPOT".to_string()),
            ("startTime", start.timestamp_millis().to_string()),
            ("endTime", end.timestamp_millis().to_string()),
        ];
        let response: SnapshotResponse = self
            .signed_get(SNAPSHOT_PATH, "account snapshot", params)
            .await?;

        let mut snapshots = response.snapshot_vos;
        for snapshot in &mut snapshots {
            snapshot.update_date = date_from_millis(snapshot.update_time);
        }
        debug!(count = snapshots.len(), "fetched account snapshots");
        Ok(snapshots)
    }

    /// Returns the deduplicated balances of the most recent snapshot.
    ///
    /// An empty snapshot history yields an empty list rather than an error,
    /// so a fresh account values to an empty mapping.
    pub async fn latest_balances(&self) -> Result<Vec<BalanceRecord>> {
        let snapshots = self.account_snapshots(DEFAULT_WINDOW_DAYS).await?;
        let Some(latest) = select_latest(snapshots) else {
            debug!("no snapshots in window");
            return Ok(Vec::new());
        };
        Ok(dedup_balances(latest.data.balances))
    }
}

/// Selects the snapshot with the maximum update time.
///
/// The sort is stable, so on ties the last occurrence wins.
pub fn select_latest(mut snapshots: Vec<Snapshot>) -> Option<Snapshot> {
    snapshots.sort_by_key(|snapshot| snapshot.update_time);
    snapshots.pop()
}

/// Collapses structurally identical balance records to one.
///
/// Output order is unspecified; consumers must not rely on it.
pub fn dedup_balances(balances: Vec<BalanceRecord>) -> Vec<BalanceRecord> {
    let unique: HashSet<BalanceRecord> = balances.into_iter().collect();
    unique.into_iter().collect()
}

fn date_from_millis(millis: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|datetime| datetime.date_naive())
}

/// The exchange is inconsistent about whether timestamps arrive as JSON
/// numbers or numeric strings; accept both.
fn de_i64_flexible<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(value) => Ok(value),
        Raw::Str(value) => value.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Trimmed-down snapshot endpoint response with one daily snapshot.
    const SAMPLE_RESPONSE: &str = r#"{
        "code": 200,
        "msg": "",
        "snapshotVos": [
            {
                "type": "spot",
                "updateTime": 1700000000000,
                "data": {
                    "totalAssetOfBtc": "0.09905021",
                    "balances": [
                        {"asset": "BTC", "free": "0.09905021", "locked": "0"},
                        {"asset": "USDT", "free": "1.89109409", "locked": "0"}
                    ]
                }
            }
        ]
    }"#;

    fn record(asset: &str, free: &str, locked: &str, update_time: i64) -> BalanceRecord {
        BalanceRecord {
            asset: asset.to_string(),
            free: free.to_string(),
            locked: locked.to_string(),
            update_time,
        }
    }

    fn snapshot(update_time: i64, balances: Vec<BalanceRecord>) -> Snapshot {
        Snapshot {
            snapshot_type: "spot".to_string(),
            update_time,
            data: SnapshotData {
                balances,
                total_asset_of_btc: None,
            },
            update_date: None,
        }
    }

    #[test]
    fn parses_snapshot_response() {
        let response: SnapshotResponse = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        assert_eq!(response.snapshot_vos.len(), 1);

        let snapshot = &response.snapshot_vos[0];
        assert_eq!(snapshot.update_time, 1_700_000_000_000);
        assert_eq!(snapshot.data.balances.len(), 2);
        assert_eq!(snapshot.data.balances[0].asset, "BTC");
        assert_eq!(snapshot.data.balances[0].free, "0.09905021");
        assert_eq!(
            snapshot.data.total_asset_of_btc.as_deref(),
            Some("0.09905021")
        );
    }

    #[test]
    fn parses_timestamps_sent_as_strings() {
        let record: BalanceRecord = serde_json::from_str(
            r#"{"asset":"BTC","free":"1.0","locked":"0","updateTime":"300"}"#,
        )
        .unwrap();
        assert_eq!(record.update_time, 300);
    }

    #[test]
    fn balance_update_time_defaults_to_zero_when_absent() {
        let record: BalanceRecord =
            serde_json::from_str(r#"{"asset":"BTC","free":"1.0","locked":"0"}"#).unwrap();
        assert_eq!(record.update_time, 0);
    }

    #[test]
    fn select_latest_picks_maximum_update_time() {
        let snapshots = vec![
            snapshot(100, vec![record("A", "1", "0", 100)]),
            snapshot(300, vec![record("B", "1", "0", 300)]),
            snapshot(200, vec![record("C", "1", "0", 200)]),
        ];
        let latest = select_latest(snapshots).unwrap();
        assert_eq!(latest.update_time, 300);
        assert_eq!(latest.data.balances[0].asset, "B");
    }

    #[test]
    fn select_latest_breaks_ties_with_last_occurrence() {
        let snapshots = vec![
            snapshot(300, vec![record("FIRST", "1", "0", 300)]),
            snapshot(300, vec![record("SECOND", "1", "0", 300)]),
        ];
        let latest = select_latest(snapshots).unwrap();
        assert_eq!(latest.data.balances[0].asset, "SECOND");
    }

    #[test]
    fn select_latest_of_empty_history_is_none() {
        assert!(select_latest(Vec::new()).is_none());
    }

    #[test]
    fn dedup_collapses_structurally_identical_records() {
        let balances = vec![
            record("BTC", "1.0", "0", 300),
            record("BTC", "1.0", "0", 300),
            record("ETH", "2.0", "0", 300),
        ];
        let deduped = dedup_balances(balances);
        assert_eq!(deduped.len(), 2);
        assert_eq!(
            deduped
                .iter()
                .filter(|balance| balance.asset == "BTC")
                .count(),
            1
        );
    }

    #[test]
    fn dedup_keeps_records_differing_in_any_field() {
        let balances = vec![
            record("BTC", "1.0", "0", 300),
            record("BTC", "1.0", "0.5", 300),
            record("BTC", "1.0", "0", 301),
        ];
        assert_eq!(dedup_balances(balances).len(), 3);
    }

    #[test]
    fn date_from_millis_truncates_to_utc_day() {
        // 2023-11-14T22:13:20Z
        let date = date_from_millis(1_700_000_000_000).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 11, 14).unwrap());
        assert_eq!(
            date_from_millis(0).unwrap(),
            NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
        );
    }
}

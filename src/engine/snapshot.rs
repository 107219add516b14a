//! Decision snapshots: in-memory latest pointer + on-disk artifacts
//!
//! A snapshot is immutable once committed. The store swaps a shared `Arc`
//! so API readers either see the previous complete snapshot or the new
//! complete one, never a partial state. On disk every run appends a
//! timestamped artifact and rewrites the `latest_decisions.json` pointer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::common::errors::{EngineError, Result};
use crate::common::types::{Action, Decision};
use crate::market::MarketContext;

/// The committed output of one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionSnapshot {
    pub run_at: DateTime<Utc>,
    pub buy_count: usize,
    pub sell_count: usize,
    pub hold_count: usize,
    /// True when the failure fraction exceeded the configured threshold
    pub degraded: bool,
    pub market: MarketContext,
    /// Sorted by confidence descending, then symbol ascending
    pub decisions: Vec<Decision>,
}

impl DecisionSnapshot {
    /// Build a snapshot from raw decisions: counts, deterministic order.
    pub fn commit(
        run_at: DateTime<Utc>,
        mut decisions: Vec<Decision>,
        market: MarketContext,
        degraded: bool,
    ) -> Self {
        decisions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        let buy_count = decisions.iter().filter(|d| d.action == Action::Buy).count();
        let sell_count = decisions
            .iter()
            .filter(|d| d.action == Action::Sell)
            .count();
        let hold_count = decisions.len() - buy_count - sell_count;

        Self {
            run_at,
            buy_count,
            sell_count,
            hold_count,
            degraded,
            market,
            decisions,
        }
    }
}

/// Shared latest-snapshot slot read by the API
#[derive(Default)]
pub struct SnapshotStore {
    latest: RwLock<Option<Arc<DecisionSnapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new snapshot. Readers holding the previous `Arc` keep a
    /// consistent view.
    pub async fn publish(&self, snapshot: DecisionSnapshot) -> Arc<DecisionSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.latest.write().await = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub async fn latest(&self) -> Option<Arc<DecisionSnapshot>> {
        self.latest.read().await.clone()
    }
}

/// Writes snapshot artifacts under the configured directory
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Persist one run: a timestamped artifact plus the latest pointer.
    pub async fn persist(&self, snapshot: &DecisionSnapshot) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| EngineError::Persistence(format!("create {}: {e}", self.dir.display())))?;

        let body = serde_json::to_vec_pretty(snapshot)?;

        let stamped = self.dir.join(format!(
            "decisions_{}.json",
            snapshot.run_at.format("%Y%m%d_%H%M%S")
        ));
        tokio::fs::write(&stamped, &body)
            .await
            .map_err(|e| EngineError::Persistence(format!("write {}: {e}", stamped.display())))?;

        let latest = self.dir.join("latest_decisions.json");
        tokio::fs::write(&latest, &body)
            .await
            .map_err(|e| EngineError::Persistence(format!("write {}: {e}", latest.display())))?;

        info!(path = %stamped.display(), decisions = snapshot.decisions.len(), "persisted snapshot");
        Ok(stamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{BreadthSnapshot, Quote, Strength};
    use crate::market::{score_mood, FlowSummary};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn market() -> MarketContext {
        let breadth = BreadthSnapshot {
            advancers: 2000,
            decliners: 2000,
            unchanged: 800,
        };
        MarketContext {
            mood: score_mood(&breadth, Decimal::ZERO),
            breadth,
            flow: FlowSummary {
                total: dec!(10),
                average: dec!(0.36),
                window_days: 28,
                requested_days: 28,
                partial: false,
            },
            stale: false,
            as_of: Utc::now(),
        }
    }

    fn decision(symbol: &str, action: Action, confidence: f64) -> Decision {
        Decision {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            action,
            strength: Strength::Moderate,
            rationale: "test".to_string(),
            confidence,
            quote: Quote {
                symbol: symbol.to_string(),
                price: dec!(10.00),
                change_pct: dec!(0.00),
                volume: None,
                timestamp: Utc::now(),
            },
            quote_source: "eastmoney".to_string(),
            quote_stale: false,
        }
    }

    #[test]
    fn commit_counts_and_sorts() {
        let decisions = vec![
            decision("000002", Action::Hold, 0.6),
            decision("600519", Action::Buy, 0.8),
            decision("000001", Action::Sell, 0.8),
            decision("300750", Action::Buy, 0.4),
        ];
        let snapshot = DecisionSnapshot::commit(Utc::now(), decisions, market(), false);

        assert_eq!(snapshot.buy_count, 2);
        assert_eq!(snapshot.sell_count, 1);
        assert_eq!(snapshot.hold_count, 1);

        // Confidence descending, symbol ascending for ties
        let symbols: Vec<&str> = snapshot.decisions.iter().map(|d| d.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["000001", "600519", "000002", "300750"]);
    }

    #[tokio::test]
    async fn store_swaps_atomically() {
        let store = SnapshotStore::new();
        assert!(store.latest().await.is_none());

        let first = store
            .publish(DecisionSnapshot::commit(Utc::now(), vec![], market(), false))
            .await;
        let held = store.latest().await.unwrap();
        assert_eq!(*held, *first);

        store
            .publish(DecisionSnapshot::commit(
                Utc::now(),
                vec![decision("600519", Action::Buy, 0.8)],
                market(),
                true,
            ))
            .await;

        // The old Arc is still a complete snapshot
        assert_eq!(held.decisions.len(), 0);
        let latest = store.latest().await.unwrap();
        assert_eq!(latest.decisions.len(), 1);
        assert!(latest.degraded);
    }

    #[tokio::test]
    async fn persist_writes_stamped_and_latest() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path());

        let snapshot = DecisionSnapshot::commit(
            Utc::now(),
            vec![decision("600519", Action::Buy, 0.8)],
            market(),
            false,
        );
        let stamped = writer.persist(&snapshot).await.unwrap();
        assert!(stamped.exists());

        let latest_raw = tokio::fs::read_to_string(dir.path().join("latest_decisions.json"))
            .await
            .unwrap();
        let restored: DecisionSnapshot = serde_json::from_str(&latest_raw).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[tokio::test]
    async fn persist_into_unwritable_dir_is_a_persistence_error() {
        let writer = SnapshotWriter::new("/proc/definitely/not/writable");
        let snapshot = DecisionSnapshot::commit(Utc::now(), vec![], market(), false);
        let err = writer.persist(&snapshot).await.unwrap_err();
        assert!(matches!(err, EngineError::Persistence(_)));
    }
}

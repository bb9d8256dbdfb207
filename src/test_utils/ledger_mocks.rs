//! In-memory mock implementations of the ledger and metrics repository traits.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        ledger::{SubscriptionRepo, TransactionRepo},
        metrics::MetricsSnapshotRepo,
    },
    domain::entities::{
        metrics_snapshot::DailyMetricsSnapshot, risk_state::RiskState,
        subscription::Subscription, transaction::Transaction,
    },
};

fn injected_failure() -> AppError {
    AppError::Database("Database operation failed".into())
}

// ============================================================================
// InMemoryTransactionRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryTransactionRepo {
    pub transactions: Mutex<Vec<Transaction>>,
    fail_reads: AtomicBool,
}

impl InMemoryTransactionRepo {
    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions: Mutex::new(transactions),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Make every subsequent read return a database error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionRepo for InMemoryTransactionRepo {
    async fn fetch_transactions(
        &self,
        app_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Transaction>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| {
                t.app_id == app_id && t.transaction_date >= from && t.transaction_date <= to
            })
            .cloned()
            .collect())
    }

    async fn list_app_ids(&self) -> AppResult<Vec<Uuid>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        let mut ids: Vec<Uuid> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.app_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

// ============================================================================
// InMemorySubscriptionRepo
// ============================================================================

/// Stores each app's subscriptions as one vector, swapped whole on replace.
#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    pub subscriptions: Mutex<HashMap<Uuid, Vec<Subscription>>>,
    fail_writes: AtomicBool,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write return a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn replace_for_app(
        &self,
        app_id: Uuid,
        subscriptions: &[Subscription],
    ) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        self.subscriptions
            .lock()
            .unwrap()
            .insert(app_id, subscriptions.to_vec());
        Ok(())
    }

    async fn find_by_app(&self, app_id: Uuid) -> AppResult<Vec<Subscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .get(&app_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_by_risk_state(
        &self,
        app_id: Uuid,
        risk_state: RiskState,
    ) -> AppResult<Vec<Subscription>> {
        Ok(self
            .find_by_app(app_id)
            .await?
            .into_iter()
            .filter(|s| s.risk_state == risk_state)
            .collect())
    }

    async fn find_by_domain(
        &self,
        app_id: Uuid,
        domain: &str,
    ) -> AppResult<Option<Subscription>> {
        Ok(self
            .find_by_app(app_id)
            .await?
            .into_iter()
            .find(|s| s.domain == domain))
    }
}

// ============================================================================
// InMemoryMetricsSnapshotRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryMetricsSnapshotRepo {
    pub snapshots: Mutex<BTreeMap<(Uuid, NaiveDate), DailyMetricsSnapshot>>,
}

impl InMemoryMetricsSnapshotRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshots(snapshots: Vec<DailyMetricsSnapshot>) -> Self {
        let map = snapshots
            .into_iter()
            .map(|s| ((s.app_id, s.snapshot_date), s))
            .collect();
        Self {
            snapshots: Mutex::new(map),
        }
    }
}

#[async_trait]
impl MetricsSnapshotRepo for InMemoryMetricsSnapshotRepo {
    async fn upsert_daily_snapshot(&self, snapshot: &DailyMetricsSnapshot) -> AppResult<()> {
        self.snapshots
            .lock()
            .unwrap()
            .insert((snapshot.app_id, snapshot.snapshot_date), snapshot.clone());
        Ok(())
    }

    async fn find_in_range(
        &self,
        app_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<DailyMetricsSnapshot>> {
        // BTreeMap keys order by (app_id, date), so the range is date ascending
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .range((app_id, from)..=(app_id, to))
            .map(|(_, s)| s.clone())
            .collect())
    }

    async fn find_latest(&self, app_id: Uuid) -> AppResult<Option<DailyMetricsSnapshot>> {
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.app_id == app_id)
            .max_by_key(|s| s.snapshot_date)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_snapshot, create_test_subscription, create_test_transaction};

    #[tokio::test]
    async fn test_snapshot_upsert_overwrites_same_day_only() {
        let repo = InMemoryMetricsSnapshotRepo::new();
        let app_id = Uuid::new_v4();
        let day1 = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();

        repo.upsert_daily_snapshot(&create_test_snapshot(app_id, day1, |s| {
            s.active_mrr_cents = 1;
        }))
        .await
        .unwrap();
        repo.upsert_daily_snapshot(&create_test_snapshot(app_id, day2, |s| {
            s.active_mrr_cents = 2;
        }))
        .await
        .unwrap();
        repo.upsert_daily_snapshot(&create_test_snapshot(app_id, day2, |s| {
            s.active_mrr_cents = 3;
        }))
        .await
        .unwrap();

        let all = repo.find_in_range(app_id, day1, day2).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].summary.active_mrr_cents, 1);
        assert_eq!(all[1].summary.active_mrr_cents, 3);
    }

    #[tokio::test]
    async fn test_subscription_replace_is_per_app() {
        let repo = InMemorySubscriptionRepo::new();
        let app_a = Uuid::new_v4();
        let app_b = Uuid::new_v4();

        repo.replace_for_app(app_a, &[create_test_subscription(app_a, "a.example.com", |_| {})])
            .await
            .unwrap();
        repo.replace_for_app(app_b, &[create_test_subscription(app_b, "b.example.com", |_| {})])
            .await
            .unwrap();
        repo.replace_for_app(app_a, &[]).await.unwrap();

        assert!(repo.find_by_app(app_a).await.unwrap().is_empty());
        assert_eq!(repo.find_by_app(app_b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_app_ids_dedups() {
        let app_id = Uuid::new_v4();
        let repo = InMemoryTransactionRepo::with_transactions(vec![
            create_test_transaction(app_id, "a.example.com", |_| {}),
            create_test_transaction(app_id, "b.example.com", |_| {}),
        ]);
        assert_eq!(repo.list_app_ids().await.unwrap(), vec![app_id]);
    }
}

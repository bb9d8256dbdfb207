use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        metrics_snapshot::{DailyMetricsSnapshot, RiskSummary},
        risk_state::RiskState,
        subscription::{BillingInterval, Subscription, SubscriptionStatus},
        transaction::Transaction,
    },
};

use super::{
    metrics::{MetricsSnapshotRepo, build_daily_snapshot},
    risk_classifier::{classify, classify_subscription},
};

/// Mean gap between recurring charges above which a domain bills annually.
/// Single hard cutoff, no hysteresis.
pub const ANNUAL_GAP_THRESHOLD_DAYS: f64 = 180.0;

/// Default trailing window of transactions considered by a rebuild.
pub const DEFAULT_LOOKBACK_MONTHS: u32 = 12;

const SECONDS_PER_DAY: f64 = 86_400.0;

// ============================================================================
// Result Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RebuildResult {
    pub subscriptions_updated: usize,
    pub total_mrr_cents: i64,
    pub total_usage_cents: i64,
    pub risk_summary: RiskSummary,
    pub snapshot: DailyMetricsSnapshot,
}

// ============================================================================
// Repository Traits
// ============================================================================

#[async_trait]
pub trait TransactionRepo: Send + Sync {
    /// Transactions of `app_id` with `from <= transaction_date <= to`.
    async fn fetch_transactions(
        &self,
        app_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Transaction>>;

    /// Every app that has at least one transaction on the ledger.
    async fn list_app_ids(&self) -> AppResult<Vec<Uuid>>;
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    /// Replace every subscription of `app_id` with `subscriptions`.
    async fn replace_for_app(&self, app_id: Uuid, subscriptions: &[Subscription])
    -> AppResult<()>;
    async fn find_by_app(&self, app_id: Uuid) -> AppResult<Vec<Subscription>>;
    async fn find_by_risk_state(
        &self,
        app_id: Uuid,
        risk_state: RiskState,
    ) -> AppResult<Vec<Subscription>>;
    async fn find_by_domain(&self, app_id: Uuid, domain: &str)
    -> AppResult<Option<Subscription>>;
}

// ============================================================================
// Ledger Reconstruction
// ============================================================================

/// Detect the billing cadence from chronologically sorted recurring charges.
///
/// Fewer than two charges default to monthly. Otherwise the mean gap in days
/// decides: strictly above [`ANNUAL_GAP_THRESHOLD_DAYS`] is annual.
pub fn detect_billing_interval(sorted_recurring: &[&Transaction]) -> BillingInterval {
    if sorted_recurring.len() < 2 {
        return BillingInterval::Monthly;
    }

    let total_gap_days: f64 = sorted_recurring
        .windows(2)
        .map(|pair| {
            (pair[1].transaction_date - pair[0].transaction_date).num_seconds() as f64
                / SECONDS_PER_DAY
        })
        .sum();
    let mean_gap_days = total_gap_days / (sorted_recurring.len() - 1) as f64;

    if mean_gap_days > ANNUAL_GAP_THRESHOLD_DAYS {
        BillingInterval::Annual
    } else {
        BillingInterval::Monthly
    }
}

/// Derive one subscription from a domain's transactions, or `None` when the
/// domain has no recurring charges.
fn reconstruct_domain(
    app_id: Uuid,
    domain: &str,
    transactions: &[&Transaction],
    now: DateTime<Utc>,
) -> Option<Subscription> {
    let mut recurring: Vec<&Transaction> = transactions
        .iter()
        .copied()
        .filter(|tx| tx.is_recurring())
        .collect();
    // Tie-break on id so equal timestamps never depend on fetch order
    recurring.sort_by(|a, b| {
        a.transaction_date
            .cmp(&b.transaction_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    let last = *recurring.last()?;
    let billing_interval = detect_billing_interval(&recurring);
    let expected_next_charge_date = billing_interval.advance(last.transaction_date);
    let status = SubscriptionStatus::Active;

    Some(Subscription {
        app_id,
        domain: domain.to_string(),
        plan_price_cents: last.price_cents(),
        currency: last.currency.clone(),
        billing_interval,
        status,
        last_charge_date: Some(last.transaction_date),
        expected_next_charge_date,
        risk_state: classify(status, expected_next_charge_date, now),
    })
}

/// Rebuild the full subscription set of an app from its transaction history.
///
/// Output is a pure function of `(transactions, now)` and is sorted by domain.
pub fn reconstruct_subscriptions(
    app_id: Uuid,
    transactions: &[Transaction],
    now: DateTime<Utc>,
) -> Vec<Subscription> {
    let mut by_domain: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        by_domain.entry(tx.domain.as_str()).or_default().push(tx);
    }

    // BTreeMap iteration already yields domains in sorted order
    by_domain
        .into_iter()
        .filter_map(|(domain, txs)| reconstruct_domain(app_id, domain, &txs, now))
        .collect()
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct LedgerUseCases {
    transaction_repo: Arc<dyn TransactionRepo>,
    subscription_repo: Arc<dyn SubscriptionRepo>,
    snapshot_repo: Arc<dyn MetricsSnapshotRepo>,
    lookback_months: u32,
}

impl LedgerUseCases {
    pub fn new(
        transaction_repo: Arc<dyn TransactionRepo>,
        subscription_repo: Arc<dyn SubscriptionRepo>,
        snapshot_repo: Arc<dyn MetricsSnapshotRepo>,
        lookback_months: u32,
    ) -> Self {
        Self {
            transaction_repo,
            subscription_repo,
            snapshot_repo,
            lookback_months,
        }
    }

    /// Apps with ledger activity, for scheduling rebuilds.
    pub async fn list_app_ids(&self) -> AppResult<Vec<Uuid>> {
        self.transaction_repo.list_app_ids().await
    }

    /// Rebuild subscriptions and today's snapshot for one app.
    ///
    /// Any storage failure aborts the whole rebuild; callers retry from scratch.
    /// The snapshot is only written after the subscription replace succeeded.
    #[instrument(skip(self), fields(app_id = %app_id))]
    pub async fn rebuild(&self, app_id: Uuid, now: DateTime<Utc>) -> AppResult<RebuildResult> {
        let from = now
            .checked_sub_months(Months::new(self.lookback_months))
            .ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Lookback of {} months is out of range",
                    self.lookback_months
                ))
            })?;

        let transactions = self
            .transaction_repo
            .fetch_transactions(app_id, from, now)
            .await?;

        let subscriptions = reconstruct_subscriptions(app_id, &transactions, now);

        self.subscription_repo
            .replace_for_app(app_id, &subscriptions)
            .await?;

        let snapshot =
            build_daily_snapshot(app_id, now.date_naive(), &subscriptions, &transactions);
        self.snapshot_repo.upsert_daily_snapshot(&snapshot).await?;

        let risk_summary = snapshot.summary.risk_summary();

        tracing::info!(
            transactions = transactions.len(),
            subscriptions = subscriptions.len(),
            mrr_cents = snapshot.summary.active_mrr_cents,
            at_risk_cents = snapshot.summary.revenue_at_risk_cents,
            churned = risk_summary.churned,
            "Rebuilt subscriptions from ledger"
        );

        Ok(RebuildResult {
            subscriptions_updated: subscriptions.len(),
            total_mrr_cents: snapshot.summary.active_mrr_cents,
            total_usage_cents: snapshot.summary.usage_revenue_cents,
            risk_summary,
            snapshot,
        })
    }

    /// Re-run the classifier over stored subscriptions without touching the ledger.
    ///
    /// Picks up status changes made outside the rebuild and the passage of time.
    /// Writes only when at least one risk state changed.
    #[instrument(skip(self), fields(app_id = %app_id))]
    pub async fn reclassify(&self, app_id: Uuid, now: DateTime<Utc>) -> AppResult<RiskSummary> {
        let mut subscriptions = self.subscription_repo.find_by_app(app_id).await?;

        let mut changed = 0usize;
        for sub in subscriptions.iter_mut() {
            let risk_state = classify_subscription(sub, now);
            if risk_state != sub.risk_state {
                tracing::debug!(
                    domain = %sub.domain,
                    from = %sub.risk_state,
                    to = %risk_state,
                    "Risk state changed"
                );
                sub.risk_state = risk_state;
                changed += 1;
            }
        }

        if changed > 0 {
            subscriptions.sort_by(|a, b| a.domain.cmp(&b.domain));
            self.subscription_repo
                .replace_for_app(app_id, &subscriptions)
                .await?;
        }

        tracing::info!(
            subscriptions = subscriptions.len(),
            changed,
            "Reclassified subscriptions"
        );

        Ok(RiskSummary::from_states(
            subscriptions.iter().map(|s| s.risk_state),
        ))
    }

    pub async fn list_subscriptions(&self, app_id: Uuid) -> AppResult<Vec<Subscription>> {
        self.subscription_repo.find_by_app(app_id).await
    }

    pub async fn list_by_risk_state(
        &self,
        app_id: Uuid,
        risk_state: RiskState,
    ) -> AppResult<Vec<Subscription>> {
        self.subscription_repo
            .find_by_risk_state(app_id, risk_state)
            .await
    }

    pub async fn get_subscription(&self, app_id: Uuid, domain: &str) -> AppResult<Subscription> {
        self.subscription_repo
            .find_by_domain(app_id, domain)
            .await?
            .ok_or(AppError::NotFound)
    }
}

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    domain::entities::{
        metrics_snapshot::{DailyMetricsSnapshot, MetricsSummary, RiskSummary},
        subscription::Subscription,
        transaction::{ChargeType, Transaction},
    },
};

// ============================================================================
// Repository Traits
// ============================================================================

#[async_trait]
pub trait MetricsSnapshotRepo: Send + Sync {
    /// Insert or overwrite the snapshot for `(app_id, snapshot_date)`.
    /// Never touches any other day.
    async fn upsert_daily_snapshot(&self, snapshot: &DailyMetricsSnapshot) -> AppResult<()>;

    /// Snapshots with `from <= snapshot_date <= to`, oldest first.
    async fn find_in_range(
        &self,
        app_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<DailyMetricsSnapshot>>;

    async fn find_latest(&self, app_id: Uuid) -> AppResult<Option<DailyMetricsSnapshot>>;
}

// ============================================================================
// Metrics Engine
// ============================================================================

/// Compute KPIs from reconstructed subscriptions and a slice of transactions.
///
/// Subscription-based figures (MRR, revenue at risk, counts, renewal rate)
/// come from risk states; revenue figures come from whatever transactions
/// are passed in.
pub fn compute_summary(
    subscriptions: &[Subscription],
    transactions: &[Transaction],
) -> MetricsSummary {
    let mut active_mrr_cents = 0;
    let mut revenue_at_risk_cents = 0;
    let mut risk = RiskSummary::default();

    for sub in subscriptions {
        risk.record(sub.risk_state);
        let monthly = sub.monthly_normalized_price_cents();
        if sub.risk_state.is_at_risk() {
            revenue_at_risk_cents += monthly;
        } else if !sub.risk_state.is_churned() {
            active_mrr_cents += monthly;
        }
    }

    let mut usage_revenue_cents = 0;
    let mut total_revenue_cents = 0;
    for tx in transactions {
        match tx.charge_type {
            ChargeType::Usage => {
                usage_revenue_cents += tx.net_amount_cents;
                total_revenue_cents += tx.net_amount_cents;
            }
            ChargeType::Recurring | ChargeType::OneTime => {
                total_revenue_cents += tx.net_amount_cents;
            }
            ChargeType::Refund => total_revenue_cents -= tx.net_amount_cents,
        }
    }

    MetricsSummary {
        active_mrr_cents,
        revenue_at_risk_cents,
        usage_revenue_cents,
        total_revenue_cents,
        renewal_success_rate: renewal_success_rate(&risk),
        safe_count: risk.safe,
        one_cycle_missed_count: risk.one_cycle,
        two_cycles_missed_count: risk.two_cycle,
        churned_count: risk.churned,
    }
}

/// Share of subscriptions in `Safe`; zero when there are none.
fn renewal_success_rate(risk: &RiskSummary) -> f64 {
    let total = risk.total();
    if total == 0 {
        return 0.0;
    }
    risk.safe as f64 / total as f64
}

/// Build the snapshot for `(app_id, day)` from the subscriptions and the
/// transactions of the rebuild window.
pub fn build_daily_snapshot(
    app_id: Uuid,
    day: NaiveDate,
    subscriptions: &[Subscription],
    transactions: &[Transaction],
) -> DailyMetricsSnapshot {
    DailyMetricsSnapshot {
        app_id,
        snapshot_date: day,
        summary: compute_summary(subscriptions, transactions),
    }
}

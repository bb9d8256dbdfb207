//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    metrics_snapshot::{DailyMetricsSnapshot, MetricsSummary},
    risk_state::RiskState,
    subscription::{BillingInterval, Subscription, SubscriptionStatus},
    transaction::{ChargeType, Transaction},
};

/// Create a test recurring transaction dated at [`test_datetime`].
pub fn create_test_transaction(
    app_id: Uuid,
    domain: &str,
    overrides: impl FnOnce(&mut Transaction),
) -> Transaction {
    let mut transaction = Transaction {
        id: Uuid::new_v4(),
        app_id,
        domain: domain.to_string(),
        charge_type: ChargeType::Recurring,
        gross_amount_cents: 2999,
        net_amount_cents: 2999,
        currency: "USD".to_string(),
        transaction_date: test_datetime(),
    };
    overrides(&mut transaction);
    transaction
}

/// Create a test active, safe, monthly subscription charged 5 days before [`test_datetime`].
pub fn create_test_subscription(
    app_id: Uuid,
    domain: &str,
    overrides: impl FnOnce(&mut Subscription),
) -> Subscription {
    let last_charge = test_datetime() - Duration::days(5);

    let mut subscription = Subscription {
        app_id,
        domain: domain.to_string(),
        plan_price_cents: 2999,
        currency: "USD".to_string(),
        billing_interval: BillingInterval::Monthly,
        status: SubscriptionStatus::Active,
        last_charge_date: Some(last_charge),
        expected_next_charge_date: BillingInterval::Monthly.advance(last_charge),
        risk_state: RiskState::Safe,
    };
    overrides(&mut subscription);
    subscription
}

/// Create a test snapshot; override the summary fields with the closure.
pub fn create_test_snapshot(
    app_id: Uuid,
    snapshot_date: NaiveDate,
    overrides: impl FnOnce(&mut MetricsSummary),
) -> DailyMetricsSnapshot {
    let mut summary = MetricsSummary {
        active_mrr_cents: 100_000,
        revenue_at_risk_cents: 5_000,
        usage_revenue_cents: 1_000,
        total_revenue_cents: 4_000,
        renewal_success_rate: 0.9,
        safe_count: 9,
        one_cycle_missed_count: 1,
        two_cycles_missed_count: 0,
        churned_count: 0,
    };
    overrides(&mut summary);
    DailyMetricsSnapshot {
        app_id,
        snapshot_date,
        summary,
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Returns a consistent test datetime (2024-01-15 12:00:00 UTC).
pub fn test_datetime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_transaction_with_defaults() {
        let app_id = Uuid::new_v4();
        let tx = create_test_transaction(app_id, "shop.example.com", |_| {});
        assert_eq!(tx.app_id, app_id);
        assert_eq!(tx.charge_type, ChargeType::Recurring);
        assert_eq!(tx.transaction_date, test_datetime());
    }

    #[test]
    fn test_create_subscription_is_not_yet_due() {
        let sub = create_test_subscription(Uuid::new_v4(), "shop.example.com", |_| {});
        assert!(sub.expected_next_charge_date.unwrap() > test_datetime());
        assert_eq!(sub.risk_state, RiskState::Safe);
    }

    #[test]
    fn test_create_snapshot_with_overrides() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let snapshot = create_test_snapshot(Uuid::new_v4(), date, |s| {
            s.active_mrr_cents = 42;
        });
        assert_eq!(snapshot.snapshot_date, date);
        assert_eq!(snapshot.summary.active_mrr_cents, 42);
    }
}

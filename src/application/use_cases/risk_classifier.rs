//! Delinquency classification of a single subscription.
//!
//! This is the only place the risk rules live. Reconstruction and the
//! re-classification sweep both call [`classify`].

use chrono::{DateTime, Utc};

use crate::domain::entities::{
    risk_state::RiskState,
    subscription::{Subscription, SubscriptionStatus},
};

/// Last days-past-due value still inside the grace period.
pub const GRACE_PERIOD_DAYS: i64 = 30;
/// Last days-past-due value classified as one missed cycle.
pub const ONE_CYCLE_MAX_DAYS: i64 = 60;
/// Last days-past-due value classified as two missed cycles.
pub const TWO_CYCLES_MAX_DAYS: i64 = 90;

/// Classify a subscription's payment risk at `now`.
///
/// Rules are evaluated in order and the first match wins:
/// 1. `Cancelled` / `Expired` → `Churned`
/// 2. `Frozen` → `OneCycleMissed`
/// 3. `Pending` → `Safe`
/// 4. no expected charge date, or `now` on/before it → `Safe`
/// 5. otherwise bucket the whole days past due (see [`risk_for_days_past_due`])
///
/// Unknown statuses follow the `Active` path.
pub fn classify(
    status: SubscriptionStatus,
    expected_next_charge_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> RiskState {
    match status {
        SubscriptionStatus::Cancelled | SubscriptionStatus::Expired => RiskState::Churned,
        SubscriptionStatus::Frozen => RiskState::OneCycleMissed,
        SubscriptionStatus::Pending => RiskState::Safe,
        SubscriptionStatus::Active | SubscriptionStatus::Unknown => {
            match expected_next_charge_date {
                // Missing data degrades to the optimistic default.
                None => RiskState::Safe,
                Some(expected) if now <= expected => RiskState::Safe,
                Some(expected) => risk_for_days_past_due(days_past_due(expected, now)),
            }
        }
    }
}

/// Convenience wrapper reading the inputs off a stored subscription.
pub fn classify_subscription(subscription: &Subscription, now: DateTime<Utc>) -> RiskState {
    classify(
        subscription.status,
        subscription.expected_next_charge_date,
        now,
    )
}

/// Whole days elapsed since `expected`, floored and never negative.
pub fn days_past_due(expected: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    // num_days truncates toward zero, which equals floor for non-negative spans
    (now - expected).num_days().max(0)
}

pub fn risk_for_days_past_due(days: i64) -> RiskState {
    match days {
        d if d <= GRACE_PERIOD_DAYS => RiskState::Safe,
        d if d <= ONE_CYCLE_MAX_DAYS => RiskState::OneCycleMissed,
        d if d <= TWO_CYCLES_MAX_DAYS => RiskState::TwoCyclesMissed,
        _ => RiskState::Churned,
    }
}

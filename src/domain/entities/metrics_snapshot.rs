use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::risk_state::RiskState;

/// Subscription counts per risk state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub safe: i64,
    pub one_cycle: i64,
    pub two_cycle: i64,
    pub churned: i64,
}

impl RiskSummary {
    pub fn from_states(states: impl IntoIterator<Item = RiskState>) -> Self {
        let mut summary = Self::default();
        for state in states {
            summary.record(state);
        }
        summary
    }

    pub fn record(&mut self, state: RiskState) {
        match state {
            RiskState::Safe => self.safe += 1,
            RiskState::OneCycleMissed => self.one_cycle += 1,
            RiskState::TwoCyclesMissed => self.two_cycle += 1,
            RiskState::Churned => self.churned += 1,
        }
    }

    pub fn total(&self) -> i64 {
        self.safe + self.one_cycle + self.two_cycle + self.churned
    }
}

/// KPIs for one app. Stored per day in snapshots and reused, re-aggregated,
/// as the period summary read model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub active_mrr_cents: i64,
    pub revenue_at_risk_cents: i64,
    pub usage_revenue_cents: i64,
    pub total_revenue_cents: i64,
    /// Share of subscriptions in `Safe`, in `[0, 1]`.
    pub renewal_success_rate: f64,
    pub safe_count: i64,
    pub one_cycle_missed_count: i64,
    pub two_cycles_missed_count: i64,
    pub churned_count: i64,
}

impl MetricsSummary {
    pub fn risk_summary(&self) -> RiskSummary {
        RiskSummary {
            safe: self.safe_count,
            one_cycle: self.one_cycle_missed_count,
            two_cycle: self.two_cycles_missed_count,
            churned: self.churned_count,
        }
    }
}

/// Immutable per-app, per-day audit record of computed KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricsSnapshot {
    pub app_id: Uuid,
    pub snapshot_date: NaiveDate,
    #[serde(flatten)]
    pub summary: MetricsSummary,
}

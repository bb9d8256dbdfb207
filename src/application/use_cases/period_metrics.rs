use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::metrics_snapshot::{DailyMetricsSnapshot, MetricsSummary},
};

use super::metrics::MetricsSnapshotRepo;

// ============================================================================
// Read Models
// ============================================================================

/// Inclusive calendar-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if end < start {
            return Err(AppError::InvalidInput(format!(
                "Period end {} is before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of calendar days covered, both ends included.
    pub fn length_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    /// The equal-length window ending the day before `start`.
    pub fn previous(&self) -> Option<Self> {
        let shift = Days::new(self.length_days());
        Some(Self {
            start: self.start.checked_sub_days(shift)?,
            end: self.end.checked_sub_days(shift)?,
        })
    }
}

/// Whether an increase of a metric is good news.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

/// Percent change of one metric between two periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeltaValue {
    /// `None` when the previous value was zero and the current one is not.
    pub percent: Option<f64>,
    pub polarity: Polarity,
    /// True when the change moves in the metric's good direction.
    pub is_good: bool,
}

impl DeltaValue {
    pub fn new(current: f64, previous: f64, polarity: Polarity) -> Self {
        let percent = percent_change(current, previous);
        let is_good = match (percent, polarity) {
            (Some(p), Polarity::HigherIsBetter) => p > 0.0,
            (Some(p), Polarity::LowerIsBetter) => p < 0.0,
            (None, _) => false,
        };
        Self {
            percent,
            polarity,
            is_good,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsDelta {
    pub active_mrr: DeltaValue,
    pub revenue_at_risk: DeltaValue,
    pub usage_revenue: DeltaValue,
    pub total_revenue: DeltaValue,
    pub renewal_success_rate: DeltaValue,
    pub churn_count: DeltaValue,
}

impl MetricsDelta {
    pub fn between(current: &MetricsSummary, previous: &MetricsSummary) -> Self {
        use Polarity::*;
        Self {
            active_mrr: DeltaValue::new(
                current.active_mrr_cents as f64,
                previous.active_mrr_cents as f64,
                HigherIsBetter,
            ),
            revenue_at_risk: DeltaValue::new(
                current.revenue_at_risk_cents as f64,
                previous.revenue_at_risk_cents as f64,
                LowerIsBetter,
            ),
            usage_revenue: DeltaValue::new(
                current.usage_revenue_cents as f64,
                previous.usage_revenue_cents as f64,
                HigherIsBetter,
            ),
            total_revenue: DeltaValue::new(
                current.total_revenue_cents as f64,
                previous.total_revenue_cents as f64,
                HigherIsBetter,
            ),
            renewal_success_rate: DeltaValue::new(
                current.renewal_success_rate,
                previous.renewal_success_rate,
                HigherIsBetter,
            ),
            churn_count: DeltaValue::new(
                current.churned_count as f64,
                previous.churned_count as f64,
                LowerIsBetter,
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodMetrics {
    pub period: DateRange,
    pub current: Option<MetricsSummary>,
    pub previous: Option<MetricsSummary>,
    pub delta: Option<MetricsDelta>,
}

// ============================================================================
// Aggregation
// ============================================================================

/// `((current - previous) / previous) * 100`.
///
/// Zero to zero is no change; zero to anything else has no meaningful ratio.
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return if current == 0.0 { Some(0.0) } else { None };
    }
    Some((current - previous) / previous * 100.0)
}

/// Fold a period's daily snapshots into one summary.
///
/// Point-in-time fields come from the latest-dated snapshot; revenue fields
/// are summed. `None` when there are no snapshots.
pub fn summarize_snapshots(snapshots: &[DailyMetricsSnapshot]) -> Option<MetricsSummary> {
    let latest = snapshots.iter().max_by_key(|s| s.snapshot_date)?;

    let (usage_revenue_cents, total_revenue_cents) =
        snapshots.iter().fold((0i64, 0i64), |(usage, total), s| {
            (
                usage + s.summary.usage_revenue_cents,
                total + s.summary.total_revenue_cents,
            )
        });

    Some(MetricsSummary {
        usage_revenue_cents,
        total_revenue_cents,
        ..latest.summary
    })
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct MetricsUseCases {
    snapshot_repo: Arc<dyn MetricsSnapshotRepo>,
}

impl MetricsUseCases {
    pub fn new(snapshot_repo: Arc<dyn MetricsSnapshotRepo>) -> Self {
        Self { snapshot_repo }
    }

    async fn summarize_range(
        &self,
        app_id: Uuid,
        range: DateRange,
    ) -> AppResult<Option<MetricsSummary>> {
        let snapshots = self
            .snapshot_repo
            .find_in_range(app_id, range.start, range.end)
            .await?;
        Ok(summarize_snapshots(&snapshots))
    }

    /// Summary of `[start, end]`, the preceding equal-length period and the
    /// percent change between them.
    #[instrument(skip(self))]
    pub async fn get_period_metrics(
        &self,
        app_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<PeriodMetrics> {
        let period = DateRange::new(start, end)?;

        let current = self.summarize_range(app_id, period).await?;
        let previous = match period.previous() {
            Some(previous_period) => self.summarize_range(app_id, previous_period).await?,
            None => None,
        };

        let delta = match (&current, &previous) {
            (Some(cur), Some(prev)) => Some(MetricsDelta::between(cur, prev)),
            _ => None,
        };

        tracing::debug!(
            has_current = current.is_some(),
            has_previous = previous.is_some(),
            "Computed period metrics"
        );

        Ok(PeriodMetrics {
            period,
            current,
            previous,
            delta,
        })
    }

    pub async fn get_latest_snapshot(
        &self,
        app_id: Uuid,
    ) -> AppResult<Option<DailyMetricsSnapshot>> {
        self.snapshot_repo.find_latest(app_id).await
    }

    pub async fn get_snapshot_history(
        &self,
        app_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<DailyMetricsSnapshot>> {
        let range = DateRange::new(start, end)?;
        self.snapshot_repo
            .find_in_range(app_id, range.start, range.end)
            .await
    }
}

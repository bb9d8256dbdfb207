use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::metrics::MetricsSnapshotRepo,
    domain::entities::metrics_snapshot::{DailyMetricsSnapshot, MetricsSummary},
};

fn row_to_snapshot(row: &sqlx::postgres::PgRow) -> DailyMetricsSnapshot {
    DailyMetricsSnapshot {
        app_id: row.get("app_id"),
        snapshot_date: row.get("snapshot_date"),
        summary: MetricsSummary {
            active_mrr_cents: row.get("active_mrr_cents"),
            revenue_at_risk_cents: row.get("revenue_at_risk_cents"),
            usage_revenue_cents: row.get("usage_revenue_cents"),
            total_revenue_cents: row.get("total_revenue_cents"),
            renewal_success_rate: row.get("renewal_success_rate"),
            safe_count: row.get("safe_count"),
            one_cycle_missed_count: row.get("one_cycle_missed_count"),
            two_cycles_missed_count: row.get("two_cycles_missed_count"),
            churned_count: row.get("churned_count"),
        },
    }
}

const SELECT_COLS: &str = r#"
    app_id, snapshot_date, active_mrr_cents, revenue_at_risk_cents,
    usage_revenue_cents, total_revenue_cents, renewal_success_rate,
    safe_count, one_cycle_missed_count, two_cycles_missed_count, churned_count
"#;

#[async_trait]
impl MetricsSnapshotRepo for PostgresPersistence {
    async fn upsert_daily_snapshot(&self, snapshot: &DailyMetricsSnapshot) -> AppResult<()> {
        let s = &snapshot.summary;
        sqlx::query(&format!(
            r#"
            INSERT INTO daily_metrics_snapshots ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (app_id, snapshot_date) DO UPDATE SET
                active_mrr_cents = EXCLUDED.active_mrr_cents,
                revenue_at_risk_cents = EXCLUDED.revenue_at_risk_cents,
                usage_revenue_cents = EXCLUDED.usage_revenue_cents,
                total_revenue_cents = EXCLUDED.total_revenue_cents,
                renewal_success_rate = EXCLUDED.renewal_success_rate,
                safe_count = EXCLUDED.safe_count,
                one_cycle_missed_count = EXCLUDED.one_cycle_missed_count,
                two_cycles_missed_count = EXCLUDED.two_cycles_missed_count,
                churned_count = EXCLUDED.churned_count,
                updated_at = CURRENT_TIMESTAMP
            "#,
            SELECT_COLS
        ))
        .bind(snapshot.app_id)
        .bind(snapshot.snapshot_date)
        .bind(s.active_mrr_cents)
        .bind(s.revenue_at_risk_cents)
        .bind(s.usage_revenue_cents)
        .bind(s.total_revenue_cents)
        .bind(s.renewal_success_rate)
        .bind(s.safe_count)
        .bind(s.one_cycle_missed_count)
        .bind(s.two_cycles_missed_count)
        .bind(s.churned_count)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn find_in_range(
        &self,
        app_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<DailyMetricsSnapshot>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM daily_metrics_snapshots
            WHERE app_id = $1 AND snapshot_date >= $2 AND snapshot_date <= $3
            ORDER BY snapshot_date
            "#,
            SELECT_COLS
        ))
        .bind(app_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_snapshot).collect())
    }

    async fn find_latest(&self, app_id: Uuid) -> AppResult<Option<DailyMetricsSnapshot>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM daily_metrics_snapshots
            WHERE app_id = $1
            ORDER BY snapshot_date DESC
            LIMIT 1
            "#,
            SELECT_COLS
        ))
        .bind(app_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_snapshot))
    }
}

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::ledger::SubscriptionRepo,
    domain::entities::{
        risk_state::RiskState,
        subscription::{BillingInterval, Subscription, SubscriptionStatus},
    },
};

/// Rows per multi-row INSERT, well under Postgres' bind parameter limit.
const INSERT_BATCH_SIZE: usize = 1000;

fn row_to_subscription(row: &sqlx::postgres::PgRow) -> Subscription {
    let status: String = row.get("status");
    Subscription {
        app_id: row.get("app_id"),
        domain: row.get("domain"),
        plan_price_cents: row.get("plan_price_cents"),
        currency: row.get("currency"),
        billing_interval: row.get::<BillingInterval, _>("billing_interval"),
        status: SubscriptionStatus::from(status.as_str()),
        last_charge_date: row.get("last_charge_date"),
        expected_next_charge_date: row.get("expected_next_charge_date"),
        risk_state: row.get::<RiskState, _>("risk_state"),
    }
}

const SELECT_COLS: &str = r#"
    app_id, domain, plan_price_cents, currency, billing_interval, status,
    last_charge_date, expected_next_charge_date, risk_state
"#;

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    /// Delete and re-insert inside one transaction so concurrent readers
    /// see either the old set or the new one, never an empty app.
    async fn replace_for_app(
        &self,
        app_id: Uuid,
        subscriptions: &[Subscription],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        sqlx::query("DELETE FROM ledger_subscriptions WHERE app_id = $1")
            .bind(app_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;

        for batch in subscriptions.chunks(INSERT_BATCH_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO ledger_subscriptions ({}) ",
                SELECT_COLS
            ));
            builder.push_values(batch, |mut row, sub| {
                row.push_bind(app_id)
                    .push_bind(&sub.domain)
                    .push_bind(sub.plan_price_cents)
                    .push_bind(&sub.currency)
                    .push_bind(sub.billing_interval)
                    .push_bind(sub.status.as_str())
                    .push_bind(sub.last_charge_date)
                    .push_bind(sub.expected_next_charge_date)
                    .push_bind(sub.risk_state);
            });
            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(AppError::from)?;
        }

        tx.commit().await.map_err(AppError::from)?;
        Ok(())
    }

    async fn find_by_app(&self, app_id: Uuid) -> AppResult<Vec<Subscription>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM ledger_subscriptions WHERE app_id = $1 ORDER BY domain",
            SELECT_COLS
        ))
        .bind(app_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_subscription).collect())
    }

    async fn find_by_risk_state(
        &self,
        app_id: Uuid,
        risk_state: RiskState,
    ) -> AppResult<Vec<Subscription>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM ledger_subscriptions WHERE app_id = $1 AND risk_state = $2 ORDER BY domain",
            SELECT_COLS
        ))
        .bind(app_id)
        .bind(risk_state)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_subscription).collect())
    }

    async fn find_by_domain(
        &self,
        app_id: Uuid,
        domain: &str,
    ) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM ledger_subscriptions WHERE app_id = $1 AND domain = $2",
            SELECT_COLS
        ))
        .bind(app_id)
        .bind(domain)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::ledger::TransactionRepo,
    domain::entities::transaction::{ChargeType, Transaction},
};

fn row_to_transaction(row: &sqlx::postgres::PgRow) -> Transaction {
    Transaction {
        id: row.get("id"),
        app_id: row.get("app_id"),
        domain: row.get("domain"),
        charge_type: row.get::<ChargeType, _>("charge_type"),
        gross_amount_cents: row.get("gross_amount_cents"),
        net_amount_cents: row.get("net_amount_cents"),
        currency: row.get("currency"),
        transaction_date: row.get("transaction_date"),
    }
}

const SELECT_COLS: &str = r#"
    id, app_id, domain, charge_type, gross_amount_cents, net_amount_cents,
    currency, transaction_date
"#;

#[async_trait]
impl TransactionRepo for PostgresPersistence {
    async fn fetch_transactions(
        &self,
        app_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM ledger_transactions
            WHERE app_id = $1 AND transaction_date >= $2 AND transaction_date <= $3
            ORDER BY domain, transaction_date, id
            "#,
            SELECT_COLS
        ))
        .bind(app_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_transaction).collect())
    }

    async fn list_app_ids(&self) -> AppResult<Vec<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT DISTINCT app_id FROM ledger_transactions ORDER BY app_id")
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::from)?;
        Ok(ids)
    }
}

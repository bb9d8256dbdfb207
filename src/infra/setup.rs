use crate::{
    infra::{
        config::{AppConfig, LogFormat},
        postgres_persistence,
    },
    use_cases::{
        ledger::{LedgerUseCases, SubscriptionRepo, TransactionRepo},
        metrics::MetricsSnapshotRepo,
        period_metrics::MetricsUseCases,
    },
};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
pub struct EngineState {
    pub config: Arc<AppConfig>,
    pub ledger_use_cases: Arc<LedgerUseCases>,
    pub metrics_use_cases: Arc<MetricsUseCases>,
}

pub async fn init_engine_state() -> anyhow::Result<EngineState> {
    let config = AppConfig::from_env();

    init_tracing(config.log_format);

    let postgres_arc = Arc::new(
        postgres_persistence(&config.database_url, config.database_max_connections).await?,
    );

    let transaction_repo_arc = postgres_arc.clone() as Arc<dyn TransactionRepo>;
    let subscription_repo_arc = postgres_arc.clone() as Arc<dyn SubscriptionRepo>;
    let snapshot_repo_arc = postgres_arc.clone() as Arc<dyn MetricsSnapshotRepo>;

    let ledger_use_cases = LedgerUseCases::new(
        transaction_repo_arc,
        subscription_repo_arc,
        snapshot_repo_arc.clone(),
        config.lookback_months,
    );

    let metrics_use_cases = MetricsUseCases::new(snapshot_repo_arc);

    Ok(EngineState {
        config: Arc::new(config),
        ledger_use_cases: Arc::new(ledger_use_cases),
        metrics_use_cases: Arc::new(metrics_use_cases),
    })
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "ledgerlens=info".into());

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        // Console (pretty logs)
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_level(true).pretty())
            .try_init()
            .ok(),
        // Structured JSON logs for log shippers
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
            .ok(),
    };
}

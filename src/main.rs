use dotenvy::dotenv;
use tracing::info;

use ledgerlens::infra::{rebuild_scheduler::run_rebuild_loop, setup::init_engine_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let state = init_engine_state().await?;

    let ledger_use_cases = state.ledger_use_cases.clone();
    let interval_secs = state.config.rebuild_interval_secs;
    let max_concurrent = state.config.max_concurrent_rebuilds;

    tokio::select! {
        _ = run_rebuild_loop(ledger_use_cases, interval_secs, max_concurrent) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown signal received, stopping rebuild scheduler");
        }
    }

    Ok(())
}

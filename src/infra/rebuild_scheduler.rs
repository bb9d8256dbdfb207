use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::time::interval;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::use_cases::ledger::LedgerUseCases;

/// Periodically rebuild every app's subscriptions and daily snapshot.
/// A failed rebuild is logged and retried on the next tick.
pub async fn run_rebuild_loop(
    ledger_use_cases: Arc<LedgerUseCases>,
    interval_secs: u64,
    max_concurrent: usize,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs));
    let semaphore = Arc::new(Semaphore::new(max_concurrent));

    info!(
        "Rebuild scheduler started (every {}s, max {} concurrent)",
        interval_secs, max_concurrent
    );

    loop {
        ticker.tick().await;
        rebuild_all(&ledger_use_cases, &semaphore).await;
    }
}

/// Run one rebuild sweep over all apps with ledger activity.
/// Returns the number of apps rebuilt successfully.
pub async fn rebuild_all(
    ledger_use_cases: &Arc<LedgerUseCases>,
    semaphore: &Arc<Semaphore>,
) -> usize {
    let app_ids = match ledger_use_cases.list_app_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = %e, "Failed to list apps for rebuild");
            return 0;
        }
    };

    if app_ids.is_empty() {
        return 0;
    }

    let started = Instant::now();
    let now = Utc::now();
    let mut handles = Vec::with_capacity(app_ids.len());

    for app_id in app_ids {
        let uc = Arc::clone(ledger_use_cases);
        let sem = Arc::clone(semaphore);

        handles.push(tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return false;
            };
            rebuild_one(&uc, app_id, now).await
        }));
    }

    let total = handles.len();
    let mut succeeded = 0;
    for handle in handles {
        match handle.await {
            Ok(true) => succeeded += 1,
            Ok(false) => {}
            Err(e) => error!(error = %e, "Rebuild task panicked"),
        }
    }

    info!(
        apps = total,
        succeeded,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Rebuild sweep finished"
    );
    succeeded
}

async fn rebuild_one(uc: &LedgerUseCases, app_id: Uuid, now: chrono::DateTime<Utc>) -> bool {
    match uc.rebuild(app_id, now).await {
        Ok(_) => true,
        Err(e) => {
            warn!(app_id = %app_id, error = %e, "Rebuild failed, will retry next sweep");
            false
        }
    }
}

//! Background task for expiring stored results.

use parley_correlation::prune_results_before;
use parley_db::DbPool;
use std::time::Duration;
use tokio::time::sleep;

/// Starts a background task that periodically deletes results older than
/// `max_age_secs`.
///
/// This task runs indefinitely.
///
/// # Arguments
///
/// * `pool` - Database connection pool.
/// * `max_age_secs` - Age in seconds after which a result is deleted.
/// * `interval_seconds` - Time in seconds to wait between sweeps.
pub async fn start_retention_task(pool: DbPool, max_age_secs: u64, interval_seconds: u64) {
    let interval = Duration::from_secs(interval_seconds);
    let max_age = i64::try_from(max_age_secs).unwrap_or(i64::MAX);
    tracing::info!(max_age_secs, interval_seconds, "starting result retention task");

    loop {
        sleep(interval).await;

        let cutoff = chrono::Utc::now().timestamp().saturating_sub(max_age);
        let pool_clone = pool.clone();
        let result = tokio::task::spawn_blocking(move || {
            let conn = pool_clone
                .get()
                .map_err(|e| format!("db connection failed: {}", e))?;
            prune_results_before(&conn, cutoff).map_err(|e| e.to_string())
        })
        .await;

        match result {
            Ok(Ok(count)) => {
                if count > 0 {
                    tracing::info!(count, cutoff, "deleted expired results");
                } else {
                    tracing::debug!("no expired results to delete");
                }
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "failed to delete expired results");
            }
            Err(e) => {
                tracing::error!(error = %e, "retention task panicked or was cancelled");
            }
        }
    }
}

//! Cleanup service for purging expired sessions and spent launch tokens.

use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info};

use crate::db::{DbPool, launch_tokens, sessions};
use crate::error::AppResult;

/// Start the cleanup background task.
///
/// Spawns a tokio task that deletes expired session rows and used or
/// expired launch tokens every `interval_secs`.
pub fn start_cleanup_task(pool: DbPool, interval_secs: u64) {
    tokio::spawn(async move {
        info!("Starting cleanup service (interval: {} seconds)", interval_secs);

        let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));

        loop {
            ticker.tick().await;

            if let Err(e) = run_cleanup(&pool).await {
                error!("Cleanup task error: {}", e);
            }
        }
    });
}

/// Run a single cleanup cycle. Returns `(sessions, launch_tokens)` removed.
pub async fn run_cleanup(pool: &DbPool) -> AppResult<(u64, u64)> {
    let expired_sessions = sessions::purge_expired(pool.connection()).await?;
    let spent_tokens = launch_tokens::purge_spent(pool.connection(), Utc::now()).await?;

    if expired_sessions > 0 || spent_tokens > 0 {
        info!(
            sessions = expired_sessions,
            launch_tokens = spent_tokens,
            "Cleanup removed expired rows"
        );
    }

    Ok((expired_sessions, spent_tokens))
}

use anyhow::Result;
use chrono::{Duration, Utc};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use std::sync::Arc;
use crate::config::Config;
use crate::db::Database;

/// Rows removed by one pruning run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PruneReport {
    pub sessions: u64,
    pub reset_tokens: u64,
}

/// Initialize and start the scheduler
pub async fn start_scheduler(config: Arc<Config>, db: Database) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    info!("Scheduling token pruning (cron: {})", config.prune_schedule);

    let config_clone = Arc::clone(&config);
    let job = Job::new_async(config.prune_schedule.as_str(), move |_uuid, _l| {
        let config = Arc::clone(&config_clone);
        let db = db.clone();

        Box::pin(async move {
            info!("⏰ Pruning job triggered");
            if let Err(e) = prune_expired(&config, &db).await {
                error!("Pruning job failed: {}", e);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("✓ Scheduler started");

    Ok(scheduler)
}

/// Delete expired sessions and reset tokens older than their lifetime
pub async fn prune_expired(config: &Config, db: &Database) -> Result<PruneReport> {
    let sessions = db.prune_expired_sessions().await?;

    let cutoff = Utc::now() - Duration::minutes(config.reset_token_ttl_minutes);
    let reset_tokens = db.prune_reset_tokens(cutoff).await?;

    let report = PruneReport {
        sessions,
        reset_tokens,
    };
    info!(
        sessions = report.sessions,
        reset_tokens = report.reset_tokens,
        "✓ Pruned expired credentials"
    );
    Ok(report)
}

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ConfigError, DriverError};
use crate::scheduler::ScoreScheduler;

/// Tick `scheduler` on the cron `cadence` until `shutdown` resolves.
///
/// Ticks never overlap: a firing that finds the previous tick still running
/// is dropped. On shutdown the running tick is cancelled at its next pacing
/// pause and awaited before the job scheduler stops.
pub async fn run_scheduled<F>(scheduler: Arc<ScoreScheduler>, cadence: &str, shutdown: F) -> Result<(), DriverError>
where
    F: Future<Output = ()>,
{
    let cancel = CancellationToken::new();
    let tick_lock = Arc::new(Mutex::new(()));

    let job = {
        let scheduler = Arc::clone(&scheduler);
        let cancel = cancel.clone();
        let tick_lock = Arc::clone(&tick_lock);
        Job::new_async(cadence, move |_id, _jobs| {
            let scheduler = Arc::clone(&scheduler);
            let cancel = cancel.clone();
            let tick_lock = Arc::clone(&tick_lock);
            Box::pin(async move {
                let Ok(_running) = tick_lock.try_lock() else {
                    warn!("Previous tick still running, skipping this one");
                    return;
                };
                scheduler.tick(Utc::now(), &cancel).await;
            })
        })
        .map_err(|e| ConfigError::Cadence { expr: cadence.to_string(), reason: e.to_string() })?
    };

    let mut jobs = JobScheduler::new().await?;
    jobs.add(job).await?;
    jobs.start().await?;
    info!(cadence, "Score scheduler started");

    shutdown.await;
    info!("Shutdown requested, waiting for the running tick to finish");
    cancel.cancel();
    let _idle = tick_lock.lock().await;
    jobs.shutdown().await?;
    info!("Score scheduler stopped");
    Ok(())
}

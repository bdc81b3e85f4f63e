//! Bounded worker pool over the job queue.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::models::ScanOutcome;
use crate::queue::{JobQueue, QueueEvent};
use crate::scan::pipeline::{self, ScanContext};

/// Run `concurrency` lease loops until the queue stops delivering.
///
/// Returns once every worker has exited: after `shutdown()`, or once a
/// drained queue reports no further deliveries.
pub async fn run_workers(ctx: ScanContext, queue: Arc<dyn JobQueue>, concurrency: usize) {
    let mut workers = JoinSet::new();
    for slot in 0..concurrency.max(1) {
        workers.spawn(worker_loop(slot, ctx.clone(), queue.clone()));
    }
    while let Some(result) = workers.join_next().await {
        if let Err(e) = result {
            error!(error = %e, "worker task panicked");
        }
    }
}

async fn worker_loop(slot: usize, ctx: ScanContext, queue: Arc<dyn JobQueue>) {
    loop {
        let lease = match queue.lease().await {
            Ok(Some(lease)) => lease,
            Ok(None) => break,
            Err(e) => {
                error!(slot, error = %e, "lease failed, stopping worker");
                break;
            }
        };

        info!(
            slot,
            template_id = lease.job.id,
            url = %lease.job.repo_url,
            attempt = lease.attempt,
            "scan started"
        );

        match pipeline::process_job(&ctx, &lease.job).await {
            Ok(ScanOutcome::Updated { template_id }) => {
                info!(slot, template_id, "scan completed");
                if let Err(e) = queue.ack(lease).await {
                    warn!(slot, error = %e, "failed to ack completed job");
                }
            }
            Ok(ScanOutcome::Skipped { template_id, reason }) => {
                info!(slot, template_id, reason = %reason, "scan skipped");
                if let Err(e) = queue.ack(lease).await {
                    warn!(slot, error = %e, "failed to ack skipped job");
                }
            }
            Err(e) => {
                warn!(
                    slot,
                    template_id = lease.job.id,
                    attempt = lease.attempt,
                    error = %e,
                    "scan failed"
                );
                let message = e.to_string();
                if let Err(e) = queue.fail(lease, message).await {
                    error!(slot, error = %e, "failed to settle failed job");
                }
            }
        }
    }
}

/// Log terminal failures published by the queue. Runs until the queue's
/// event channel closes.
pub async fn log_failure_events(mut events: broadcast::Receiver<QueueEvent>) {
    loop {
        match events.recv().await {
            Ok(QueueEvent::Failed {
                job,
                attempts,
                error,
            }) => {
                error!(
                    template_id = job.id,
                    url = %job.repo_url,
                    attempts,
                    error = %error,
                    "scan job terminally failed"
                );
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "failure event stream lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

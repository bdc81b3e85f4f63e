//! Scan sweep command — `stackscout scan`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use stackscout::config::Config;
use stackscout::db::{CatalogDb, DbHandle};
use stackscout::host::GitHubClient;
use stackscout::queue::{JobQueue, MemoryQueue};
use stackscout::scan::pipeline::ScanContext;
use stackscout::scan::{producer, worker};

/// One-shot sweep by default: enqueue every stale template, drain the
/// queue, exit. With `worker_mode` the process stays up and re-sweeps on an
/// interval until interrupted.
pub async fn cmd_scan(
    db_path: &Path,
    max_batch: usize,
    worker_mode: bool,
    interval: Duration,
) -> Result<()> {
    let config = Config::from_env()?;
    // A bare filename has an empty parent, which create_dir_all rejects.
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let db = DbHandle::new(CatalogDb::new(db_path)?);
    let queue = Arc::new(MemoryQueue::new());
    let host = Arc::new(GitHubClient::new(&config));
    let ctx = ScanContext {
        db: db.clone(),
        host,
    };
    let events_task = tokio::spawn(worker::log_failure_events(queue.events()));

    if worker_mode {
        run_daemon(ctx, db, queue.clone(), &config, max_batch, interval).await?;
    } else {
        let jobs = producer::enqueue_stale(&db, queue.as_ref(), max_batch).await?;
        println!("{} jobs added", jobs.len());
        queue.close_when_idle();
        worker::run_workers(ctx, queue.clone(), config.concurrency).await;
        println!("Scan complete.");
    }

    // Dropping the last queue handle closes the event channel, so the
    // logger drains any buffered terminal failures and exits.
    drop(queue);
    let _ = events_task.await;
    Ok(())
}

async fn run_daemon(
    ctx: ScanContext,
    db: DbHandle,
    queue: Arc<MemoryQueue>,
    config: &Config,
    max_batch: usize,
    interval: Duration,
) -> Result<()> {
    let workers = tokio::spawn(worker::run_workers(ctx, queue.clone(), config.concurrency));
    println!(
        "Worker started, waiting for jobs (producer tick every {}s).",
        interval.as_secs()
    );

    let mut tick = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(e) = producer::enqueue_stale(&db, queue.as_ref(), max_batch).await {
                    tracing::error!(error = %e, "stale sweep failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                break;
            }
        }
    }

    queue.shutdown();
    workers.await.context("Worker pool panicked")?;
    Ok(())
}

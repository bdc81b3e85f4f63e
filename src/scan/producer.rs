//! Stale-template sweep.

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::db::DbHandle;
use crate::models::ScanJob;
use crate::queue::{JobOptions, JobQueue};

/// Jobs enqueued per sweep unless the operator overrides it.
pub const DEFAULT_MAX_BATCH: usize = 10;

/// Hard ceiling on the sweep size; larger overrides are clamped.
pub const MAX_BATCH: usize = 20;

/// Sweep the catalog for stale templates and enqueue a scan job for each.
///
/// Returns the jobs that were actually enqueued. A row that fails to
/// enqueue is logged and skipped; it stays stale, so the next sweep picks
/// it up again.
pub async fn enqueue_stale(
    db: &DbHandle,
    queue: &dyn JobQueue,
    max_batch: usize,
) -> Result<Vec<ScanJob>> {
    let max_batch = max_batch.min(MAX_BATCH);
    let now = Utc::now();
    let stale = db.call(move |db| db.stale_templates(max_batch, now)).await?;

    let mut enqueued = Vec::with_capacity(stale.len());
    for job in stale {
        match queue.enqueue(job.clone(), JobOptions::default()).await {
            Ok(()) => enqueued.push(job),
            Err(e) => warn!(template_id = job.id, error = %e, "failed to enqueue scan job"),
        }
    }
    info!(count = enqueued.len(), "enqueued stale templates");
    Ok(enqueued)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::db::CatalogDb;
    use crate::queue::MemoryQueue;

    fn seeded_handle(urls: &[&str]) -> DbHandle {
        let db = CatalogDb::new_in_memory().unwrap();
        for url in urls {
            db.insert_template(url).unwrap();
        }
        DbHandle::new(db)
    }

    #[tokio::test]
    async fn enqueues_one_job_per_stale_template() {
        let db = seeded_handle(&[
            "https://github.com/acme/alpha",
            "https://github.com/acme/beta",
        ]);
        let queue = Arc::new(MemoryQueue::new());

        let jobs = enqueue_stale(&db, queue.as_ref(), DEFAULT_MAX_BATCH)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].repo_url, "https://github.com/acme/alpha");
        assert_eq!(jobs[1].repo_url, "https://github.com/acme/beta");

        let first = queue.lease().await.unwrap().expect("job should be queued");
        assert_eq!(first.job.id, jobs[0].id);
    }

    #[tokio::test]
    async fn respects_the_batch_bound() {
        let urls: Vec<String> = (0..5)
            .map(|i| format!("https://github.com/acme/repo-{i}"))
            .collect();
        let refs: Vec<&str> = urls.iter().map(|u| u.as_str()).collect();
        let db = seeded_handle(&refs);
        let queue = Arc::new(MemoryQueue::new());

        let jobs = enqueue_stale(&db, queue.as_ref(), 3).await.unwrap();
        assert_eq!(jobs.len(), 3);
    }

    #[tokio::test]
    async fn oversized_batch_is_clamped_to_the_ceiling() {
        let urls: Vec<String> = (0..25)
            .map(|i| format!("https://github.com/acme/repo-{i}"))
            .collect();
        let refs: Vec<&str> = urls.iter().map(|u| u.as_str()).collect();
        let db = seeded_handle(&refs);
        let queue = Arc::new(MemoryQueue::new());

        let jobs = enqueue_stale(&db, queue.as_ref(), 100).await.unwrap();
        assert_eq!(jobs.len(), MAX_BATCH);
    }

    #[tokio::test]
    async fn tolerates_enqueue_failures() {
        let db = seeded_handle(&["https://github.com/acme/alpha"]);
        let queue = Arc::new(MemoryQueue::new());
        queue.shutdown();

        let jobs = enqueue_stale(&db, queue.as_ref(), DEFAULT_MAX_BATCH)
            .await
            .unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn fresh_catalog_enqueues_nothing() {
        let db = seeded_handle(&[]);
        let queue = Arc::new(MemoryQueue::new());

        let jobs = enqueue_stale(&db, queue.as_ref(), DEFAULT_MAX_BATCH)
            .await
            .unwrap();
        assert!(jobs.is_empty());
        assert!(queue.is_idle().await);
    }
}

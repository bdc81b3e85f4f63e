//! Job queue for the scan pipeline.
//!
//! | Module   | Responsibility                                    |
//! |----------|---------------------------------------------------|
//! | `retry`  | Exponential backoff policy                        |
//! | `memory` | In-process `JobQueue` implementation              |
//!
//! Delivery is FIFO and at-least-once: a leased job that is neither acked
//! nor failed before the process exits is simply lost with the process,
//! which is acceptable because the producer re-discovers stale rows on the
//! next pass.

pub mod memory;
pub mod retry;

pub use memory::MemoryQueue;
pub use retry::RetryPolicy;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::errors::QueueError;
use crate::models::ScanJob;

/// Delivery options attached to a job at enqueue time.
#[derive(Debug, Clone, Copy)]
pub struct JobOptions {
    /// Total delivery attempts before the job is terminally failed.
    pub attempts: u32,
    pub retry: RetryPolicy,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry: RetryPolicy::default(),
        }
    }
}

/// A leased job. The holder must settle it with `ack` or `fail`.
#[derive(Debug)]
pub struct JobLease {
    pub job: ScanJob,
    /// 1-based delivery attempt.
    pub attempt: u32,
    pub(crate) token: u64,
}

/// Terminal queue notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    /// All delivery attempts exhausted.
    Failed {
        job: ScanJob,
        attempts: u32,
        error: String,
    },
}

/// FIFO, at-least-once job queue with retry and backoff.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Submit a job. Fails once the queue is shut down.
    async fn enqueue(&self, job: ScanJob, opts: JobOptions) -> Result<(), QueueError>;

    /// Take the next ready job, waiting if none is available. Returns
    /// `None` once the queue has shut down and drained.
    async fn lease(&self) -> Result<Option<JobLease>, QueueError>;

    /// Settle a lease as succeeded. The job will not be redelivered.
    async fn ack(&self, lease: JobLease) -> Result<(), QueueError>;

    /// Settle a lease as failed. The job is redelivered after backoff until
    /// its attempts run out, at which point a [`QueueEvent::Failed`] is
    /// published.
    async fn fail(&self, lease: JobLease, error: String) -> Result<(), QueueError>;

    /// Subscribe to terminal failure events.
    fn events(&self) -> broadcast::Receiver<QueueEvent>;

    /// True when nothing is ready, scheduled, or in flight.
    async fn is_idle(&self) -> bool;

    /// Stop delivery immediately; blocked `lease` calls return `None`.
    fn shutdown(&self);
}

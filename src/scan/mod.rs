//! Scan pipeline: from stale catalog rows to refreshed template facts.
//!
//! ## Overview
//!
//! The scan subsystem drives the refresh cycle. A producer sweep selects
//! templates whose last scan is older than [`crate::db::STALE_AFTER_DAYS`]
//! and enqueues one job per row. A bounded worker pool leases jobs off the
//! queue and runs each through the pipeline; failures are redelivered with
//! exponential backoff until their attempts run out.
//!
//! ## Module Map
//!
//! ```text
//! producer.rs ── enqueue_stale() ──> JobQueue ── lease() ──> worker.rs
//!                                                               │
//!                                                 process_job() │
//!                                                               v
//!                                                          pipeline.rs
//!                                     clone, analyze + stats, score, persist
//! ```
//!
//! ## Job Lifecycle
//!
//! 1. `producer::enqueue_stale()` selects up to `max_batch` stale rows and
//!    enqueues a [`crate::models::ScanJob`] for each.
//! 2. `worker::run_workers()` runs `concurrency` lease loops until the queue
//!    reports no more deliveries.
//! 3. `pipeline::process_job()` executes one job end to end. Workers ack
//!    completed scans and unsupported-host skips; errors are failed back to
//!    the queue for redelivery.
//! 4. Once a job's attempts are spent the queue publishes
//!    [`crate::queue::QueueEvent::Failed`] and `worker::log_failure_events()`
//!    records it. The row stays stale, so the next sweep tries again.

pub mod pipeline;
pub mod producer;
pub mod worker;

//! In-process job queue.
//!
//! Ready jobs live in a FIFO deque; failed jobs wait in a min-heap keyed by
//! their redelivery deadline and are promoted back to the deque once due.
//! A single `Notify` wakes blocked leasers on every state change.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{Notify, broadcast};
use tokio::time::Instant;

use super::{JobLease, JobOptions, JobQueue, QueueEvent};
use crate::errors::QueueError;
use crate::models::ScanJob;

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct MemoryQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    events_tx: broadcast::Sender<QueueEvent>,
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<PendingJob>,
    scheduled: BinaryHeap<Reverse<ScheduledJob>>,
    in_flight: HashMap<u64, PendingJob>,
    next_token: u64,
    next_seq: u64,
    closed: bool,
    close_when_idle: bool,
}

struct PendingJob {
    job: ScanJob,
    attempt: u32,
    opts: JobOptions,
}

struct ScheduledJob {
    due: Instant,
    seq: u64,
    pending: PendingJob,
}

// Heap order is (due, seq) only; the payload never participates.
impl PartialEq for ScheduledJob {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for ScheduledJob {}

impl PartialOrd for ScheduledJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledJob {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due.cmp(&other.due).then(self.seq.cmp(&other.seq))
    }
}

impl QueueState {
    fn promote_due(&mut self, now: Instant) {
        while self
            .scheduled
            .peek()
            .is_some_and(|Reverse(job)| job.due <= now)
        {
            if let Some(Reverse(job)) = self.scheduled.pop() {
                self.ready.push_back(job.pending);
            }
        }
    }

    fn next_due(&self) -> Option<Instant> {
        self.scheduled.peek().map(|Reverse(job)| job.due)
    }

    fn is_idle(&self) -> bool {
        self.ready.is_empty() && self.scheduled.is_empty() && self.in_flight.is_empty()
    }

    fn delivery_finished(&self) -> bool {
        self.closed || (self.close_when_idle && self.is_idle())
    }
}

impl MemoryQueue {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            events_tx,
        }
    }

    /// Arm drain mode: once every submitted job has settled (including
    /// redeliveries), blocked `lease` calls return `None`.
    pub fn close_when_idle(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.close_when_idle = true;
        }
        self.notify.notify_waiters();
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueState>, QueueError> {
        self.state.lock().map_err(|_| QueueError::LockPoisoned)
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(&self, job: ScanJob, opts: JobOptions) -> Result<(), QueueError> {
        {
            let mut state = self.lock()?;
            if state.closed {
                return Err(QueueError::Closed);
            }
            state.ready.push_back(PendingJob {
                job,
                attempt: 1,
                opts,
            });
        }
        self.notify.notify_waiters();
        Ok(())
    }

    async fn lease(&self) -> Result<Option<JobLease>, QueueError> {
        loop {
            // Register for wakeups before checking state so a notify that
            // lands between the unlock and the await is not lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next_due = {
                let mut state = self.lock()?;
                state.promote_due(Instant::now());

                if let Some(pending) = state.ready.pop_front() {
                    let token = state.next_token;
                    state.next_token += 1;
                    let lease = JobLease {
                        job: pending.job.clone(),
                        attempt: pending.attempt,
                        token,
                    };
                    state.in_flight.insert(token, pending);
                    return Ok(Some(lease));
                }

                if state.delivery_finished() {
                    return Ok(None);
                }

                state.next_due()
            };

            match next_due {
                Some(due) => {
                    tokio::select! {
                        _ = notified.as_mut() => {}
                        _ = tokio::time::sleep_until(due) => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    async fn ack(&self, lease: JobLease) -> Result<(), QueueError> {
        {
            let mut state = self.lock()?;
            state
                .in_flight
                .remove(&lease.token)
                .ok_or(QueueError::UnknownLease(lease.token))?;
        }
        self.notify.notify_waiters();
        Ok(())
    }

    async fn fail(&self, lease: JobLease, error: String) -> Result<(), QueueError> {
        let exhausted = {
            let mut state = self.lock()?;
            let pending = state
                .in_flight
                .remove(&lease.token)
                .ok_or(QueueError::UnknownLease(lease.token))?;

            if pending.attempt < pending.opts.attempts {
                let due = Instant::now() + pending.opts.retry.delay_after(pending.attempt);
                let seq = state.next_seq;
                state.next_seq += 1;
                state.scheduled.push(Reverse(ScheduledJob {
                    due,
                    seq,
                    pending: PendingJob {
                        attempt: pending.attempt + 1,
                        ..pending
                    },
                }));
                None
            } else {
                Some(QueueEvent::Failed {
                    job: pending.job,
                    attempts: pending.opts.attempts,
                    error,
                })
            }
        };

        if let Some(event) = exhausted {
            let _ = self.events_tx.send(event);
        }
        self.notify.notify_waiters();
        Ok(())
    }

    fn events(&self) -> broadcast::Receiver<QueueEvent> {
        self.events_tx.subscribe()
    }

    async fn is_idle(&self) -> bool {
        self.lock().map(|state| state.is_idle()).unwrap_or(true)
    }

    fn shutdown(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
        }
        self.notify.notify_waiters();
    }
}

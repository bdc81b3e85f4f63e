//! Typed error hierarchy for the scanner.
//!
//! Four top-level enums cover the four subsystems:
//! - `ConfigError` — environment configuration failures, fatal at startup
//! - `QueueError` — job queue contract violations
//! - `HostError` — repository host failures (clone and metadata API)
//! - `ScanError` — per-job pipeline failures reported back to the queue

use thiserror::Error;

/// Errors raised while loading runtime configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("REDIS_URL must be set in the environment")]
    MissingBrokerUrl,

    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Errors from the job queue.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue is shut down")]
    Closed,

    #[error("Unknown lease token {0}")]
    UnknownLease(u64),

    #[error("Queue lock poisoned")]
    LockPoisoned,
}

/// Errors from the repository host (shallow clone plus metadata API).
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Unrecognized repository URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to create clone workspace at {path}: {source}")]
    WorkspaceCreate {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn git: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("git clone of {url} timed out after {timeout_ms}ms")]
    CloneTimeout { url: String, timeout_ms: u64 },

    #[error("git clone failed: {stderr}")]
    CloneFailed { stderr: String },

    #[error("Host API returned status {status} for {url}")]
    ApiStatus { status: u16, url: String },

    #[error("Host API request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors from a single scan pipeline execution.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("Analysis failed in {stage}: {source}")]
    Analysis {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Store update failed: {0}")]
    Store(#[source] anyhow::Error),

    #[error("Workspace cleanup failed: {0}")]
    Cleanup(#[source] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

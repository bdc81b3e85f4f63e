//! Repository host integration: shallow clones plus the metadata API.
//!
//! | Module      | Responsibility                                        |
//! |-------------|-------------------------------------------------------|
//! | `workspace` | Scoped clone directories with drop-guaranteed cleanup |
//! | `github`    | `HostClient` implementation for github.com            |

pub mod github;
pub mod workspace;

pub use github::GitHubClient;
pub use workspace::CloneWorkspace;

use async_trait::async_trait;

use crate::errors::HostError;
use crate::models::RepoStats;

/// Capability interface over a source-hosting provider.
///
/// GitHub is the only implementation today; the pipeline talks to this
/// trait so another host can slot in without touching the workers.
#[async_trait]
pub trait HostClient: Send + Sync {
    /// Whether this client recognizes the repository URL. Unsupported URLs
    /// make a job a terminal skip, not an error.
    fn supports(&self, repo_url: &str) -> bool;

    /// Shallow-clone the repository into a fresh scoped workspace.
    async fn clone_repo(&self, repo_url: &str) -> Result<CloneWorkspace, HostError>;

    /// Repository metadata used for scoring.
    async fn fetch_repo_stats(&self, repo_url: &str) -> Result<RepoStats, HostError>;

    /// Number of listed contributors.
    async fn fetch_contributor_count(&self, repo_url: &str) -> Result<i64, HostError>;
}

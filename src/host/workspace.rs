//! Scoped clone workspaces.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tokio::process::Command;

use crate::errors::HostError;

/// An ephemeral clone directory owned by one in-flight job.
///
/// Dropping the workspace removes the directory, so cleanup happens on
/// every exit path, including error propagation mid-pipeline. Each
/// workspace gets a millisecond-timestamp directory name under the
/// configured temp root.
#[derive(Debug)]
pub struct CloneWorkspace {
    path: PathBuf,
    removed: bool,
}

impl CloneWorkspace {
    /// Reserve a fresh workspace directory under `temp_root`. The directory
    /// is created before the clone starts so a timed-out or failed clone
    /// still has a root to tear down. The final component is created
    /// non-recursively: two jobs racing on the same timestamp get an error
    /// instead of a shared directory.
    pub fn create(temp_root: &Path) -> Result<Self, HostError> {
        std::fs::create_dir_all(temp_root).map_err(|source| HostError::WorkspaceCreate {
            path: temp_root.to_path_buf(),
            source,
        })?;
        let path = temp_root.join(Utc::now().timestamp_millis().to_string());
        std::fs::create_dir(&path).map_err(|source| HostError::WorkspaceCreate {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now instead of waiting for drop. On failure the
    /// drop guard retries synchronously while the error propagates.
    pub async fn remove(mut self) -> std::io::Result<()> {
        tokio::fs::remove_dir_all(&self.path).await?;
        self.removed = true;
        Ok(())
    }
}

impl Drop for CloneWorkspace {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove clone workspace"
                );
            }
        }
    }
}

/// Run `git clone --depth 1` into `dest`. The child is killed when the
/// timeout elapses and the job fails with `CloneTimeout`.
pub async fn shallow_clone(
    repo_url: &str,
    dest: &Path,
    timeout: Duration,
) -> Result<(), HostError> {
    let clone = Command::new("git")
        .args(["clone", "--depth", "1", repo_url])
        .arg(dest)
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(timeout, clone).await {
        Ok(Ok(output)) if output.status.success() => Ok(()),
        Ok(Ok(output)) => Err(HostError::CloneFailed {
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
        Ok(Err(e)) => Err(HostError::SpawnFailed(e)),
        Err(_) => Err(HostError::CloneTimeout {
            url: repo_url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

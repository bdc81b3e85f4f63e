use serde::{Deserialize, Serialize};

use chrono::{DateTime, Utc};

/// Technology-stack facts extracted from a cloned repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechStack {
    pub framework: String,
    pub database: String,
    pub required_services: Vec<String>,
    pub dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
    pub potentially_outdated: Vec<String>,
}

/// Stack analysis output. The env-example flag rides alongside the
/// persisted tech-stack facts because it lands in its own column.
#[derive(Debug, Clone, PartialEq)]
pub struct StackReport {
    pub tech_stack: TechStack,
    pub has_env_example: bool,
}

/// Repository metadata fetched from the host API.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoStats {
    pub stars: i64,
    pub forks: i64,
    pub last_commit: DateTime<Utc>,
    pub license: Option<String>,
    pub open_issues: i64,
}

/// Queue payload: one stale template to re-scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: i64,
    pub repo_url: String,
}

/// A catalog row. Timestamps are RFC 3339 strings as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub repo_url: String,
    pub tech_stack: Option<TechStack>,
    pub stars: i64,
    pub forks: i64,
    pub last_commit: Option<String>,
    pub risk_score: f64,
    pub risk_factors: Vec<String>,
    pub has_env_example: bool,
    pub open_issues: i64,
    pub license: Option<String>,
    pub core_features: Vec<String>,
    pub required_services: Vec<String>,
    pub custom_score: f64,
    pub theme_colors: Vec<String>,
    pub loc: i64,
    pub contributors: i64,
    pub last_scanned: Option<String>,
    pub created_at: String,
}

/// Full set of fields a completed scan writes back to a template row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanUpdate {
    pub tech_stack: TechStack,
    pub stars: i64,
    pub forks: i64,
    pub last_commit: String,
    pub risk_score: f64,
    pub risk_factors: Vec<String>,
    pub has_env_example: bool,
    pub open_issues: i64,
    /// "None" when the host reports no license.
    pub license: String,
    pub core_features: Vec<String>,
    pub required_services: Vec<String>,
    pub custom_score: f64,
    pub theme_colors: Vec<String>,
    pub loc: i64,
    pub contributors: i64,
    pub last_scanned: String,
}

/// Terminal result of one pipeline execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Row updated with freshly computed values.
    Updated { template_id: i64 },
    /// Unsupported host. Nothing was written and nothing is retried.
    Skipped { template_id: i64, reason: String },
}

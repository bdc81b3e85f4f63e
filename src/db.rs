//! SQLite-backed template catalog.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, params};

use crate::models::{ScanJob, ScanUpdate, TechStack, Template};

/// A template is stale once its last scan is older than this many days.
/// Rows that have never been scanned are always stale.
pub const STALE_AFTER_DAYS: i64 = 7;

/// Shared async handle to the template catalog.
///
/// rusqlite connections are synchronous, so workers, the producer, and the
/// API all reach the catalog through [`DbHandle::call`], which ships each
/// operation to tokio's blocking pool as a closure over the locked
/// connection. Async tasks never hold the lock across an await.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<CatalogDb>>,
}

impl DbHandle {
    pub fn new(db: CatalogDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run `f` against the catalog on a blocking thread and return its
    /// result. The closure must own everything it captures (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&CatalogDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = inner
                .lock()
                .map_err(|e| anyhow::anyhow!("catalog lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("catalog task panicked")?
    }
}

pub struct CatalogDb {
    conn: Connection,
}

impl CatalogDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.run_migrations().context("Failed to run migrations")?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.run_migrations().context("Failed to run migrations")?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS templates (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    repo_url TEXT NOT NULL,
                    tech_stack TEXT,
                    stars INTEGER NOT NULL DEFAULT 0,
                    forks INTEGER NOT NULL DEFAULT 0,
                    last_commit TEXT,
                    risk_score REAL NOT NULL DEFAULT 0,
                    risk_factors TEXT NOT NULL DEFAULT '[]',
                    has_env_example INTEGER NOT NULL DEFAULT 0,
                    open_issues INTEGER NOT NULL DEFAULT 0,
                    license TEXT,
                    core_features TEXT NOT NULL DEFAULT '[]',
                    required_services TEXT NOT NULL DEFAULT '[]',
                    custom_score REAL NOT NULL DEFAULT 0,
                    theme_colors TEXT NOT NULL DEFAULT '[]',
                    loc INTEGER NOT NULL DEFAULT 0,
                    contributors INTEGER NOT NULL DEFAULT 0,
                    last_scanned TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE INDEX IF NOT EXISTS idx_templates_last_scanned
                    ON templates(last_scanned);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    // ── Template CRUD ─────────────────────────────────────────────────

    pub fn insert_template(&self, repo_url: &str) -> Result<Template> {
        self.conn
            .execute(
                "INSERT INTO templates (repo_url) VALUES (?1)",
                params![repo_url],
            )
            .context("Failed to insert template")?;
        let id = self.conn.last_insert_rowid();
        self.get_template(id)?
            .context("Template not found after insert")
    }

    pub fn get_template(&self, id: i64) -> Result<Option<Template>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, repo_url, tech_stack, stars, forks, last_commit, risk_score,
                        risk_factors, has_env_example, open_issues, license, core_features,
                        required_services, custom_score, theme_colors, loc, contributors,
                        last_scanned, created_at
                 FROM templates WHERE id = ?1",
            )
            .context("Failed to prepare get_template")?;
        let mut rows = stmt
            .query_map(params![id], TemplateRow::from_row)
            .context("Failed to query template")?;
        match rows.next() {
            Some(row) => {
                let r = row.context("Failed to read template row")?;
                Ok(Some(r.into_template()?))
            }
            None => Ok(None),
        }
    }

    pub fn list_templates(&self) -> Result<Vec<Template>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, repo_url, tech_stack, stars, forks, last_commit, risk_score,
                        risk_factors, has_env_example, open_issues, license, core_features,
                        required_services, custom_score, theme_colors, loc, contributors,
                        last_scanned, created_at
                 FROM templates ORDER BY id",
            )
            .context("Failed to prepare list_templates")?;
        let rows = stmt
            .query_map([], TemplateRow::from_row)
            .context("Failed to query templates")?;
        let mut templates = Vec::new();
        for row in rows {
            let r = row.context("Failed to read template row")?;
            templates.push(r.into_template()?);
        }
        Ok(templates)
    }

    // ── Scan scheduling ───────────────────────────────────────────────

    /// Templates due for a re-scan as of `now`: never scanned, or last
    /// scanned more than [`STALE_AFTER_DAYS`] ago. Ordered by id so repeated
    /// sweeps work through the catalog deterministically.
    pub fn stale_templates(&self, limit: usize, now: DateTime<Utc>) -> Result<Vec<ScanJob>> {
        let cutoff = (now - Duration::days(STALE_AFTER_DAYS)).to_rfc3339();
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, repo_url FROM templates
                 WHERE last_scanned IS NULL OR last_scanned < ?1
                 ORDER BY id LIMIT ?2",
            )
            .context("Failed to prepare stale_templates")?;
        let rows = stmt
            .query_map(params![cutoff, limit as i64], |row| {
                Ok(ScanJob {
                    id: row.get(0)?,
                    repo_url: row.get(1)?,
                })
            })
            .context("Failed to query stale templates")?;
        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row.context("Failed to read stale template row")?);
        }
        Ok(jobs)
    }

    /// Write back the full result of a completed scan.
    pub fn update_scan(&self, id: i64, update: &ScanUpdate) -> Result<()> {
        let tech_stack = serde_json::to_string(&update.tech_stack)
            .context("Failed to serialize tech_stack")?;
        let risk_factors = serde_json::to_string(&update.risk_factors)
            .context("Failed to serialize risk_factors")?;
        let core_features = serde_json::to_string(&update.core_features)
            .context("Failed to serialize core_features")?;
        let required_services = serde_json::to_string(&update.required_services)
            .context("Failed to serialize required_services")?;
        let theme_colors = serde_json::to_string(&update.theme_colors)
            .context("Failed to serialize theme_colors")?;

        let changed = self
            .conn
            .execute(
                "UPDATE templates SET
                    tech_stack = ?1, stars = ?2, forks = ?3, last_commit = ?4,
                    risk_score = ?5, risk_factors = ?6, has_env_example = ?7,
                    open_issues = ?8, license = ?9, core_features = ?10,
                    required_services = ?11, custom_score = ?12, theme_colors = ?13,
                    loc = ?14, contributors = ?15, last_scanned = ?16
                 WHERE id = ?17",
                params![
                    tech_stack,
                    update.stars,
                    update.forks,
                    update.last_commit,
                    update.risk_score,
                    risk_factors,
                    update.has_env_example,
                    update.open_issues,
                    update.license,
                    core_features,
                    required_services,
                    update.custom_score,
                    theme_colors,
                    update.loc,
                    update.contributors,
                    update.last_scanned,
                    id
                ],
            )
            .context("Failed to update template scan fields")?;
        anyhow::ensure!(changed == 1, "Template {} not found for scan update", id);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Internal row helpers ──────────────────────────────────────────────

/// Intermediate row struct for reading templates from SQLite before parsing
/// the JSON-encoded columns into typed values.
struct TemplateRow {
    id: i64,
    repo_url: String,
    tech_stack: Option<String>,
    stars: i64,
    forks: i64,
    last_commit: Option<String>,
    risk_score: f64,
    risk_factors: String,
    has_env_example: bool,
    open_issues: i64,
    license: Option<String>,
    core_features: String,
    required_services: String,
    custom_score: f64,
    theme_colors: String,
    loc: i64,
    contributors: i64,
    last_scanned: Option<String>,
    created_at: String,
}

impl TemplateRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            repo_url: row.get(1)?,
            tech_stack: row.get(2)?,
            stars: row.get(3)?,
            forks: row.get(4)?,
            last_commit: row.get(5)?,
            risk_score: row.get(6)?,
            risk_factors: row.get(7)?,
            has_env_example: row.get(8)?,
            open_issues: row.get(9)?,
            license: row.get(10)?,
            core_features: row.get(11)?,
            required_services: row.get(12)?,
            custom_score: row.get(13)?,
            theme_colors: row.get(14)?,
            loc: row.get(15)?,
            contributors: row.get(16)?,
            last_scanned: row.get(17)?,
            created_at: row.get(18)?,
        })
    }

    fn into_template(self) -> Result<Template> {
        let tech_stack: Option<TechStack> = match self.tech_stack {
            Some(json) => {
                Some(serde_json::from_str(&json).context("Failed to parse tech_stack JSON")?)
            }
            None => None,
        };
        let risk_factors: Vec<String> = serde_json::from_str(&self.risk_factors)
            .context("Failed to parse risk_factors JSON")?;
        let core_features: Vec<String> = serde_json::from_str(&self.core_features)
            .context("Failed to parse core_features JSON")?;
        let required_services: Vec<String> = serde_json::from_str(&self.required_services)
            .context("Failed to parse required_services JSON")?;
        let theme_colors: Vec<String> = serde_json::from_str(&self.theme_colors)
            .context("Failed to parse theme_colors JSON")?;

        Ok(Template {
            id: self.id,
            repo_url: self.repo_url,
            tech_stack,
            stars: self.stars,
            forks: self.forks,
            last_commit: self.last_commit,
            risk_score: self.risk_score,
            risk_factors,
            has_env_example: self.has_env_example,
            open_issues: self.open_issues,
            license: self.license,
            core_features,
            required_services,
            custom_score: self.custom_score,
            theme_colors,
            loc: self.loc,
            contributors: self.contributors,
            last_scanned: self.last_scanned,
            created_at: self.created_at,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_update(last_scanned: &str) -> ScanUpdate {
        ScanUpdate {
            tech_stack: TechStack {
                framework: "Next.js".to_string(),
                database: "PostgreSQL".to_string(),
                required_services: vec!["PostgreSQL".to_string()],
                dependencies: vec!["next".to_string(), "pg".to_string()],
                dev_dependencies: vec!["typescript".to_string()],
                potentially_outdated: vec![],
            },
            stars: 1200,
            forks: 80,
            last_commit: "2024-11-02T09:30:00+00:00".to_string(),
            risk_score: 1.5,
            risk_factors: vec!["Few contributors (< 3)".to_string()],
            has_env_example: true,
            open_issues: 12,
            license: "MIT".to_string(),
            core_features: vec!["Auth".to_string(), "Billing".to_string()],
            required_services: vec!["PostgreSQL".to_string(), "Redis".to_string()],
            custom_score: 3.4,
            theme_colors: vec!["#ff0000".to_string(), "#00ff00".to_string()],
            loc: 5400,
            contributors: 4,
            last_scanned: last_scanned.to_string(),
        }
    }

    #[test]
    fn test_create_database_and_run_migrations() -> Result<()> {
        let db = CatalogDb::new_in_memory()?;

        let table_count: i32 = db.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = 'templates'",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(table_count, 1, "Expected templates table to exist");

        let index_count: i32 = db.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name = 'idx_templates_last_scanned'",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(index_count, 1, "Expected last_scanned index to exist");

        Ok(())
    }

    #[test]
    fn test_insert_and_get_template() -> Result<()> {
        let db = CatalogDb::new_in_memory()?;

        let template = db.insert_template("https://github.com/acme/widgets")?;
        assert!(template.id > 0);
        assert_eq!(template.repo_url, "https://github.com/acme/widgets");
        assert_eq!(template.tech_stack, None);
        assert_eq!(template.stars, 0);
        assert_eq!(template.risk_score, 0.0);
        assert!(template.risk_factors.is_empty());
        assert!(!template.has_env_example);
        assert_eq!(template.license, None);
        assert_eq!(template.last_scanned, None);
        assert!(!template.created_at.is_empty());

        let fetched = db.get_template(template.id)?.expect("template should exist");
        assert_eq!(fetched.repo_url, "https://github.com/acme/widgets");

        Ok(())
    }

    #[test]
    fn test_get_template_missing_returns_none() -> Result<()> {
        let db = CatalogDb::new_in_memory()?;
        assert!(db.get_template(42)?.is_none());
        Ok(())
    }

    #[test]
    fn test_list_templates_ordered_by_id() -> Result<()> {
        let db = CatalogDb::new_in_memory()?;

        db.insert_template("https://github.com/acme/alpha")?;
        db.insert_template("https://github.com/acme/beta")?;
        db.insert_template("https://github.com/acme/gamma")?;

        let templates = db.list_templates()?;
        assert_eq!(templates.len(), 3);
        assert_eq!(templates[0].repo_url, "https://github.com/acme/alpha");
        assert_eq!(templates[1].repo_url, "https://github.com/acme/beta");
        assert_eq!(templates[2].repo_url, "https://github.com/acme/gamma");

        Ok(())
    }

    #[test]
    fn test_stale_templates_selects_never_scanned_and_old_rows() -> Result<()> {
        let db = CatalogDb::new_in_memory()?;
        let now = Utc::now();

        let never = db.insert_template("https://github.com/acme/never")?;
        let old = db.insert_template("https://github.com/acme/old")?;
        let fresh = db.insert_template("https://github.com/acme/fresh")?;

        let eight_days_ago = (now - Duration::days(8)).to_rfc3339();
        db.update_scan(old.id, &sample_update(&eight_days_ago))?;
        let two_days_ago = (now - Duration::days(2)).to_rfc3339();
        db.update_scan(fresh.id, &sample_update(&two_days_ago))?;

        let jobs = db.stale_templates(10, now)?;
        let ids: Vec<i64> = jobs.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![never.id, old.id]);
        assert_eq!(jobs[0].repo_url, "https://github.com/acme/never");

        Ok(())
    }

    #[test]
    fn test_stale_templates_respects_limit() -> Result<()> {
        let db = CatalogDb::new_in_memory()?;
        let now = Utc::now();

        for i in 0..5 {
            db.insert_template(&format!("https://github.com/acme/repo-{}", i))?;
        }

        let jobs = db.stale_templates(3, now)?;
        assert_eq!(jobs.len(), 3);
        let ids: Vec<i64> = jobs.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        Ok(())
    }

    #[test]
    fn test_update_scan_persists_all_fields() -> Result<()> {
        let db = CatalogDb::new_in_memory()?;
        let now = Utc::now().to_rfc3339();

        let template = db.insert_template("https://github.com/acme/widgets")?;
        db.update_scan(template.id, &sample_update(&now))?;

        let updated = db.get_template(template.id)?.expect("template should exist");
        let stack = updated.tech_stack.expect("tech_stack should be set");
        assert_eq!(stack.framework, "Next.js");
        assert_eq!(stack.database, "PostgreSQL");
        assert_eq!(stack.dependencies, vec!["next", "pg"]);
        assert_eq!(updated.stars, 1200);
        assert_eq!(updated.forks, 80);
        assert_eq!(updated.last_commit.as_deref(), Some("2024-11-02T09:30:00+00:00"));
        assert_eq!(updated.risk_score, 1.5);
        assert_eq!(updated.risk_factors, vec!["Few contributors (< 3)"]);
        assert!(updated.has_env_example);
        assert_eq!(updated.open_issues, 12);
        assert_eq!(updated.license.as_deref(), Some("MIT"));
        assert_eq!(updated.core_features, vec!["Auth", "Billing"]);
        assert_eq!(updated.required_services, vec!["PostgreSQL", "Redis"]);
        assert_eq!(updated.custom_score, 3.4);
        assert_eq!(updated.theme_colors, vec!["#ff0000", "#00ff00"]);
        assert_eq!(updated.loc, 5400);
        assert_eq!(updated.contributors, 4);
        assert_eq!(updated.last_scanned.as_deref(), Some(now.as_str()));

        Ok(())
    }

    #[test]
    fn test_update_scan_unknown_id_errors() {
        let db = CatalogDb::new_in_memory().unwrap();
        let err = db
            .update_scan(999, &sample_update("2025-01-01T00:00:00+00:00"))
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_db_handle_runs_closures_on_blocking_pool() -> Result<()> {
        let handle = DbHandle::new(CatalogDb::new_in_memory()?);

        let inserted = handle
            .call(|db| db.insert_template("https://github.com/acme/widgets"))
            .await?;
        let fetched = handle
            .call(move |db| db.get_template(inserted.id))
            .await?
            .expect("template should exist");
        assert_eq!(fetched.repo_url, "https://github.com/acme/widgets");

        Ok(())
    }
}

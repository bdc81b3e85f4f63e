//! Catalog management commands — `stackscout init|add|list`.

use std::path::Path;

use anyhow::Result;

use stackscout::db::{CatalogDb, DbHandle};

/// Create (or migrate) the catalog database.
pub fn cmd_init(db_path: &Path) -> Result<()> {
    open(db_path)?;
    println!("Catalog database initialized at {}", db_path.display());
    Ok(())
}

/// Register a repository in the catalog. It starts unscanned, so the next
/// sweep picks it up.
pub async fn cmd_add(db_path: &Path, repo_url: &str) -> Result<()> {
    let db = open(db_path)?;
    let repo_url = repo_url.to_string();
    let template = db.call(move |db| db.insert_template(&repo_url)).await?;
    println!("Added template {} ({})", template.id, template.repo_url);
    Ok(())
}

pub async fn cmd_list(db_path: &Path) -> Result<()> {
    let db = open(db_path)?;
    let templates = db.call(|db| db.list_templates()).await?;
    if templates.is_empty() {
        println!("No templates in catalog. Add one with 'stackscout add <repo-url>'.");
        return Ok(());
    }
    for t in templates {
        println!(
            "#{:<4} {}  risk={:.1} score={:.1} loc={} last_scanned={}",
            t.id,
            t.repo_url,
            t.risk_score,
            t.custom_score,
            t.loc,
            t.last_scanned.as_deref().unwrap_or("never"),
        );
    }
    Ok(())
}

fn open(db_path: &Path) -> Result<DbHandle> {
    // A bare filename has an empty parent, which create_dir_all rejects.
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(DbHandle::new(CatalogDb::new(db_path)?))
}

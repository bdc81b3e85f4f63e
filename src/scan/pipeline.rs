//! Per-job scan execution.

use std::sync::Arc;

use chrono::Utc;

use crate::analyzer::{self, loc, readme, services, theme};
use crate::db::DbHandle;
use crate::errors::ScanError;
use crate::host::HostClient;
use crate::models::{ScanJob, ScanOutcome, ScanUpdate};
use crate::scoring::{self, RiskSignals, ScoreSignals};

/// Everything a worker needs to execute jobs.
#[derive(Clone)]
pub struct ScanContext {
    pub db: DbHandle,
    pub host: Arc<dyn HostClient>,
}

/// Execute one scan job end to end.
///
/// A URL the host does not recognize is a terminal skip: nothing is cloned
/// and nothing is written, so the row simply stays stale. Otherwise the
/// repository is shallow-cloned into a scoped workspace, stack analysis and
/// the stats fetch run concurrently, the remaining extraction steps run in
/// order, and the full row is persisted in one write. The workspace is
/// removed on success and by its drop guard on every error path.
pub async fn process_job(ctx: &ScanContext, job: &ScanJob) -> Result<ScanOutcome, ScanError> {
    if !ctx.host.supports(&job.repo_url) {
        return Ok(ScanOutcome::Skipped {
            template_id: job.id,
            reason: "unsupported repository host".to_string(),
        });
    }

    let workspace = ctx.host.clone_repo(&job.repo_url).await?;
    let repo = workspace.path();

    let (report, stats) = tokio::try_join!(
        async {
            analyzer::analyze_stack(repo)
                .await
                .map_err(|source| ScanError::Analysis {
                    stage: "tech-stack",
                    source,
                })
        },
        async {
            ctx.host
                .fetch_repo_stats(&job.repo_url)
                .await
                .map_err(ScanError::from)
        },
    )?;

    let loc = loc::count_loc(repo).map_err(|source| ScanError::Analysis {
        stage: "loc",
        source,
    })?;
    let core_features = readme::extract_core_features(repo).await;
    // Same cascade that filled the tech-stack field, run over the same
    // unchanged tree, so the two lists always agree.
    let required_services = services::detect_required_services(repo)
        .await
        .map_err(|source| ScanError::Analysis {
            stage: "services",
            source,
        })?;
    let contributors = ctx.host.fetch_contributor_count(&job.repo_url).await?;

    let now = Utc::now();
    let risk = scoring::evaluate_risk(
        &RiskSignals {
            stars: stats.stars,
            last_commit: stats.last_commit,
            has_env_example: report.has_env_example,
            dependencies: report.tech_stack.dependencies.clone(),
            contributors,
            open_issues: stats.open_issues,
            loc,
            license: stats.license.clone(),
        },
        now,
    );
    let score = scoring::custom_score(
        &ScoreSignals {
            stars: stats.stars,
            contributors,
            core_features: core_features.clone(),
            has_env_example: report.has_env_example,
            last_commit: stats.last_commit,
            risk_score: risk.score,
        },
        now,
    );
    let theme_colors = theme::extract_theme_colors(repo).map_err(|source| ScanError::Analysis {
        stage: "theme",
        source,
    })?;

    let update = ScanUpdate {
        tech_stack: report.tech_stack,
        stars: stats.stars,
        forks: stats.forks,
        last_commit: stats.last_commit.to_rfc3339(),
        risk_score: risk.score,
        risk_factors: risk.factors,
        has_env_example: report.has_env_example,
        open_issues: stats.open_issues,
        license: stats.license.unwrap_or_else(|| "None".to_string()),
        core_features,
        required_services,
        custom_score: score,
        theme_colors,
        loc,
        contributors,
        last_scanned: now.to_rfc3339(),
    };

    let template_id = job.id;
    ctx.db
        .call(move |db| db.update_scan(template_id, &update))
        .await
        .map_err(ScanError::Store)?;

    workspace.remove().await.map_err(ScanError::Cleanup)?;
    Ok(ScanOutcome::Updated { template_id })
}

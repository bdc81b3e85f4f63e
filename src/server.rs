use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::{self, AppState, SharedState};
use crate::config::Config;
use crate::db::{CatalogDb, DbHandle};
use crate::host::GitHubClient;
use crate::queue::{JobQueue, MemoryQueue};
use crate::scan::pipeline::ScanContext;
use crate::scan::{producer, worker};

/// Configuration for the scanner server.
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub max_batch: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3141,
            db_path: PathBuf::from("stackscout.db"),
            max_batch: producer::DEFAULT_MAX_BATCH,
        }
    }
}

/// Build the full application router.
pub fn build_router(state: SharedState) -> Router {
    api::api_router()
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Start the scanner server with its worker pool.
pub async fn start_server(config: ServerConfig, runtime: &Config) -> Result<()> {
    // Ensure parent directory exists for the DB. A bare filename has an
    // empty parent, which create_dir_all rejects.
    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let db = CatalogDb::new(&config.db_path).context("Failed to open catalog database")?;
    let db = DbHandle::new(db);
    let queue = Arc::new(MemoryQueue::new());
    let host = Arc::new(GitHubClient::new(runtime));

    let ctx = ScanContext {
        db: db.clone(),
        host,
    };
    let events_task = tokio::spawn(worker::log_failure_events(queue.events()));
    let workers = tokio::spawn(worker::run_workers(
        ctx,
        queue.clone(),
        runtime.concurrency,
    ));

    let state = Arc::new(AppState {
        db,
        queue: queue.clone(),
        max_batch: config.max_batch,
    });
    let app = build_router(state);

    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    println!("stackscout scanner running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    queue.shutdown();
    workers.await.context("Worker pool panicked")?;
    events_task.abort();

    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    println!("\nShutting down...");
}

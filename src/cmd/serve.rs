//! API server command — `stackscout serve`.

use std::path::PathBuf;

use anyhow::Result;

use stackscout::config::Config;
use stackscout::server::{ServerConfig, start_server};

pub async fn cmd_serve(port: u16, db_path: PathBuf, max_batch: usize) -> Result<()> {
    let config = Config::from_env()?;
    start_server(
        ServerConfig {
            port,
            db_path,
            max_batch,
        },
        &config,
    )
    .await
}

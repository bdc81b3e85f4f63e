use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "stackscout")]
#[command(version, about = "Template catalog scanner")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Catalog database path
    #[arg(long, default_value = "stackscout.db", global = true)]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the catalog database
    Init,
    /// Add a repository to the catalog
    Add { repo_url: String },
    /// List catalog entries with their latest scan results
    List,
    /// Sweep stale templates and scan them
    Scan {
        /// Maximum jobs enqueued per sweep
        #[arg(long, default_value = "10")]
        batch: usize,

        /// Keep running and re-sweep on an interval
        #[arg(long)]
        worker: bool,

        /// Seconds between sweeps in worker mode
        #[arg(long, default_value = "300")]
        interval: u64,
    },
    /// Serve the scan-trigger API
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "3141")]
        port: u16,

        /// Maximum jobs enqueued per trigger
        #[arg(long, default_value = "10")]
        batch: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    stackscout::config::load_dotenv();
    let cli = Cli::parse();

    let default_filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Init => cmd::cmd_init(&cli.db)?,
        Commands::Add { repo_url } => cmd::cmd_add(&cli.db, repo_url).await?,
        Commands::List => cmd::cmd_list(&cli.db).await?,
        Commands::Scan {
            batch,
            worker,
            interval,
        } => {
            cmd::cmd_scan(&cli.db, *batch, *worker, Duration::from_secs(*interval)).await?;
        }
        Commands::Serve { port, batch } => {
            cmd::cmd_serve(*port, cli.db.clone(), *batch).await?;
        }
    }

    Ok(())
}

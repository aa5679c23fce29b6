//! Region Indexer Daemon
//!
//! Keeps the genomic-region search index consistent with the upstream
//! primary document store.
//!
//! # Usage
//!
//! ```bash
//! regiond cycle [--dry-run] [--force] [--last-cursor N]
//! regiond state [--reindex all]
//! regiond reindex [--uuid UUID]...
//! regiond stage --uuid UUID [--cursor N]
//! ```

use std::path::Path;

use anyhow::Result;
use clap::Parser;

use region_daemon::{
    handle_cycle, handle_reindex, handle_stage, handle_state, init_tracing, Cli, Commands,
    DaemonConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = DaemonConfig::load(cli.config.as_deref().map(Path::new))?;

    match cli.command {
        Commands::Cycle {
            dry_run,
            force,
            last_cursor,
        } => {
            handle_cycle(&config, dry_run, force, last_cursor).await?;
        }
        Commands::State { reindex } => {
            handle_state(&config, reindex).await?;
        }
        Commands::Reindex { uuids } => {
            handle_reindex(&config, uuids).await?;
        }
        Commands::Stage { uuids, cursor } => {
            handle_stage(&config, uuids, cursor).await?;
        }
    }

    Ok(())
}

//! CLI argument parsing for the region indexer daemon.

use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Region Indexer Daemon
///
/// Keeps the genomic-region search index consistent with the upstream
/// primary document store.
#[derive(Parser, Debug)]
#[command(name = "regiond")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Daemon commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one indexing cycle and print the report
    Cycle {
        /// Resolve and report only, mutate nothing
        #[arg(long)]
        dry_run: bool,

        /// Bypass the residency check, reprojecting resident files
        #[arg(long)]
        force: bool,

        /// Resolve from the transaction log starting at this cursor
        #[arg(long)]
        last_cursor: Option<u64>,
    },

    /// Print current indexer state and derived counts
    State {
        /// Pass "all" to request a full reindex on the next cycle
        #[arg(long)]
        reindex: Option<String>,
    },

    /// Request a reindex: of everything, or of selected datasets
    Reindex {
        /// Dataset uuids to force; empty means everything
        #[arg(long = "uuid")]
        uuids: Vec<Uuid>,
    },

    /// Append identifiers to the hand-off list (what the primary
    /// indexer does in production)
    Stage {
        /// Dataset uuids to stage
        #[arg(long = "uuid", required = true)]
        uuids: Vec<Uuid>,

        /// Snapshot marker to stage alongside the identifiers
        #[arg(long)]
        cursor: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_cycle_flags() {
        let cli = Cli::parse_from(["regiond", "cycle", "--dry-run", "--force"]);
        match cli.command {
            Commands::Cycle {
                dry_run,
                force,
                last_cursor,
            } => {
                assert!(dry_run);
                assert!(force);
                assert_eq!(last_cursor, None);
            }
            _ => panic!("Expected Cycle command"),
        }
    }

    #[test]
    fn test_cli_cycle_with_cursor() {
        let cli = Cli::parse_from(["regiond", "cycle", "--last-cursor", "1042"]);
        match cli.command {
            Commands::Cycle { last_cursor, .. } => assert_eq!(last_cursor, Some(1042)),
            _ => panic!("Expected Cycle command"),
        }
    }

    #[test]
    fn test_cli_state_reindex_all() {
        let cli = Cli::parse_from(["regiond", "state", "--reindex", "all"]);
        match cli.command {
            Commands::State { reindex } => assert_eq!(reindex.as_deref(), Some("all")),
            _ => panic!("Expected State command"),
        }
    }

    #[test]
    fn test_cli_reindex_selected() {
        let uuid = Uuid::new_v4();
        let cli = Cli::parse_from(["regiond", "reindex", "--uuid", &uuid.to_string()]);
        match cli.command {
            Commands::Reindex { uuids } => assert_eq!(uuids, vec![uuid]),
            _ => panic!("Expected Reindex command"),
        }
    }

    #[test]
    fn test_cli_stage_requires_uuid() {
        assert!(Cli::try_parse_from(["regiond", "stage"]).is_err());

        let uuid = Uuid::new_v4();
        let cli = Cli::parse_from([
            "regiond",
            "stage",
            "--uuid",
            &uuid.to_string(),
            "--cursor",
            "77",
        ]);
        match cli.command {
            Commands::Stage { uuids, cursor } => {
                assert_eq!(uuids, vec![uuid]);
                assert_eq!(cursor, Some(77));
            }
            _ => panic!("Expected Stage command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from(["regiond", "--config", "/etc/regiond.toml", "state"]);
        assert_eq!(cli.config, Some("/etc/regiond.toml".to_string()));

        let cli = Cli::parse_from(["regiond", "--log-level", "debug", "state"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }
}

//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::sync::SyncArgs;

/// Reconciles tracked time from Harvest into Tempo work logs.
///
/// Each Harvest time record is split across the Jira issues its notes
/// mention and pushed to Tempo, skipping entries that already exist, so the
/// command is safe to re-run.
#[derive(Debug, Parser)]
#[command(name = "timesync", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile source-ledger time records into the work-log ledger.
    Sync(SyncArgs),

    /// Show the effective configuration with secrets redacted.
    CheckConfig,
}

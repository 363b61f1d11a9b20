use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Task derivation and delivery insights for project spreadsheets.
/// Reads task rows from --data (JSON or CSV) or falls back to a built-in sample project.
#[derive(Parser)]
#[command(name = "pmi", version, about = "Project task insights CLI")]
pub struct Cli {
    /// Path to a task row file (.json or .csv).
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Path to a JSON settings file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Read the status column case-insensitively in priority and progress rules.
    #[arg(long, global = true)]
    pub normalized_status: bool,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

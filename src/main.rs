//! # PMI - Project Insights CLI
//!
//! Derives task status, priority, progress and tags from project task rows and
//! reports sprint velocity, delivery metrics and insights.
//!
//! ## Quick Start
//!
//! ```bash
//! # Explore the built-in sample project
//! pmi tasks
//! pmi insights
//!
//! # Use a spreadsheet export
//! pmi --data project_tasks.csv metrics
//! pmi --data project_tasks.json report --output report.json
//! ```
//!
//! Settings can be kept in a JSON file passed with `--config`:
//!
//! ```json
//! { "target_velocity": 80, "status_match": "normalized", "data": "project_tasks.csv" }
//! ```

use clap::Parser;
use tracing::debug;

use project_insights::cli::Cli;
use project_insights::cmd::*;
use project_insights::config::Settings;
use project_insights::db::ProjectData;
use project_insights::fields::StatusMatch;
use project_insights::fixture::sample_rows;
use project_insights::logging::init_logging;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Completions need no project data.
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    let mut settings = match Settings::load_or_default(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if cli.normalized_status {
        settings.status_match = StatusMatch::Normalized;
    }
    if cli.data.is_some() {
        settings.data = cli.data.clone();
    }

    let data = match settings.data.as_deref() {
        Some(path) => ProjectData::load_or_empty(path, settings.status_match),
        None => {
            debug!("no data file configured, using the sample project");
            ProjectData::from_rows(&sample_rows(), settings.status_match)
        }
    };

    match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled above"),

        Commands::Tasks { status, priority, tags, assignee, due, sort, limit } => {
            let filter = TaskFilter { status, priority, tags, assignee, due };
            cmd_tasks(&data, filter, sort, limit)
        }

        Commands::View { id } => cmd_view(&data, &id),

        Commands::Sprints => cmd_sprints(&data),

        Commands::Metrics => cmd_metrics(&data, &settings),

        Commands::Insights => cmd_insights(&data, &settings),

        Commands::Report { output } => cmd_report(&data, &settings, output),

        Commands::Export { output } => cmd_export(&data, output),
    }
}

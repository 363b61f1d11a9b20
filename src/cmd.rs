//! Command implementations for the CLI interface.
//!
//! Each handler reads an already-derived `ProjectData` and prints a table or JSON.
//! Filtering, sorting and report assembly live in plain functions so they can be
//! tested without capturing stdout.

use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use serde::Serialize;
use tracing::info;

use crate::aggregate::{aggregate_at, Aggregate};
use crate::config::Settings;
use crate::db::*;
use crate::error::{Error, Result};
use crate::fields::*;
use crate::task::{Sprint, Task};

#[derive(Subcommand)]
pub enum Commands {
    /// List derived tasks with optional filters.
    Tasks {
        /// Filter by status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Filter by priority.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Filter by tag. May be repeated. Accepts comma-separated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Filter by assignee (case-insensitive).
        #[arg(long)]
        assignee: Option<String>,
        /// Due filter: today | this-week | overdue.
        #[arg(long, value_enum)]
        due: Option<DueFilter>,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Due)]
        sort: SortKey,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task by ID.
    View {
        /// Task ID to view
        id: String,
    },

    /// List sprints with their velocity.
    Sprints,

    /// Show project metrics and the status distribution.
    Metrics,

    /// Show generated insights.
    Insights,

    /// Write the full derived report as JSON.
    Report {
        /// Output file. Prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Export derived tasks to CSV.
    Export {
        /// Output file. Prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Criteria for the `tasks` command.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
    pub assignee: Option<String>,
    pub due: Option<DueFilter>,
}

/// Normalise a tag string by trimming and lowercasing.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Split comma-separated tag strings and normalise each tag.
pub fn split_and_normalise_tags(inputs: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = inputs
        .iter()
        .flat_map(|raw| raw.split(','))
        .map(normalise_tag)
        .filter(|t| !t.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Apply a filter and sort key to the project's tasks.
pub fn select_tasks<'a>(
    data: &'a ProjectData,
    filter: &TaskFilter,
    sort: SortKey,
    today: NaiveDate,
) -> Vec<&'a Task> {
    let wanted_tags = split_and_normalise_tags(&filter.tags);
    let assignee = filter.assignee.as_deref().map(str::to_lowercase);

    let mut rows: Vec<&Task> = data
        .tasks
        .iter()
        .filter(|t| filter.status.map_or(true, |s| t.status == s))
        .filter(|t| filter.priority.map_or(true, |p| t.priority == p))
        .filter(|t| wanted_tags.iter().all(|w| t.tags.iter().any(|tag| tag == w)))
        .filter(|t| assignee.as_deref().map_or(true, |a| t.assignee.to_lowercase() == a))
        .filter(|t| filter.due.map_or(true, |d| matches_due(t.due_date, d, today)))
        .collect();

    match sort {
        SortKey::Due => rows.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id))),
        SortKey::Priority => {
            rows.sort_by_key(|t| (Reverse(t.priority), t.due_date, t.id.clone()))
        }
        SortKey::Progress => rows.sort_by_key(|t| (t.progress, t.id.clone())),
        SortKey::Id => rows.sort_by(|a, b| a.id.cmp(&b.id)),
    }
    rows
}

/// Serialised form of the `report` command.
#[derive(Serialize)]
pub struct Report<'a> {
    pub generated_at: DateTime<Utc>,
    pub status_match: StatusMatch,
    pub tasks: &'a [Task],
    pub sprints: &'a [Sprint],
    #[serde(flatten)]
    pub aggregate: Aggregate,
}

/// Assemble the JSON report for a project.
pub fn build_report(data: &ProjectData, settings: &Settings, now: DateTime<Utc>) -> Result<String> {
    let report = Report {
        generated_at: now,
        status_match: settings.status_match,
        tasks: &data.tasks,
        sprints: &data.sprints,
        aggregate: aggregate_at(&data.tasks, &data.sprints, settings.target_velocity, now),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write `contents` to `output`, or stdout when no path is given.
fn write_output(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, contents).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
            info!(path = %path.display(), bytes = contents.len(), "wrote output");
            println!("Wrote {}", path.display());
        }
        None => print!("{contents}"),
    }
    Ok(())
}

fn exit_with(e: Error) -> ! {
    eprintln!("Error: {e}");
    std::process::exit(1);
}

/// List tasks matching the filter.
pub fn cmd_tasks(data: &ProjectData, filter: TaskFilter, sort: SortKey, limit: Option<usize>) {
    let today = Local::now().date_naive();
    let mut rows = select_tasks(data, &filter, sort, today);
    if let Some(n) = limit {
        rows.truncate(n);
    }
    if rows.is_empty() {
        println!("No tasks.");
        return;
    }
    print_table(&rows, today);
}

/// Show one task in detail.
pub fn cmd_view(data: &ProjectData, id: &str) {
    let task = match data.require(id) {
        Ok(t) => t,
        Err(e) => exit_with(e),
    };
    let today = Local::now().date_naive();
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Description:  {}", task.description);
    println!("Status:       {}", format_status(task.status));
    println!("Priority:     {}", format_priority(task.priority));
    println!("Assignee:     {}", task.assignee);
    println!(
        "Due:          {} ({})",
        task.due_date.format("%Y-%m-%d"),
        format_due_relative(task.due_date, today)
    );
    println!("Progress:     {}%", task.progress);
    println!("Hours:        {} actual / {} estimated", task.actual_hours, task.estimated_hours);
    println!("Tags:         {}", task.tags.join(", "));
    if task.dependencies.is_empty() {
        println!("Depends on:   -");
    } else {
        println!("Depends on:");
        for dep in &task.dependencies {
            match data.get(dep) {
                Some(d) => println!("  {} {} [{}]", d.id, d.title, format_status(d.status)),
                None => println!("  {dep} (not in this project)"),
            }
        }
    }
    if let Some(reason) = &task.delay_reason {
        println!("Delay reason: {reason}");
    }
}

/// List sprints.
pub fn cmd_sprints(data: &ProjectData) {
    if data.sprints.is_empty() {
        println!("No sprints.");
        return;
    }
    println!("{:<10} {:<12} {:<12} {:>5} {:>8}", "Sprint", "Start", "End", "Tasks", "Velocity");
    for s in &data.sprints {
        println!(
            "{:<10} {:<12} {:<12} {:>5} {:>7}%",
            truncate(&s.name, 10),
            s.start_date.format("%Y-%m-%d"),
            s.end_date.format("%Y-%m-%d"),
            s.tasks.len(),
            s.velocity
        );
    }
}

/// Print project metrics, the velocity series and the status distribution.
pub fn cmd_metrics(data: &ProjectData, settings: &Settings) {
    let agg = aggregate_at(&data.tasks, &data.sprints, settings.target_velocity, Utc::now());
    let m = &agg.metrics;
    println!("Total tasks:       {}", m.total_tasks);
    println!("Completed:         {}", m.completed_tasks);
    println!("Delayed:           {}", m.delayed_tasks);
    println!("Average velocity:  {}%", m.average_velocity);
    println!("On-time delivery:  {}%", m.on_time_delivery);
    println!("Delivery score:    {:.1} / 10", m.delivery_score);

    if !agg.velocity_series.is_empty() {
        println!();
        println!("{:<10} {:>8} {:>6}", "Sprint", "Velocity", "Target");
        for p in &agg.velocity_series {
            println!("{:<10} {:>7}% {:>5}%", truncate(&p.sprint, 10), p.velocity, p.target);
        }
    }

    println!();
    println!("{:<12} {}", "Status", "Count");
    for slice in &agg.status_distribution {
        println!("{:<12} {}", slice.name, slice.value);
    }
}

/// Print generated insights.
pub fn cmd_insights(data: &ProjectData, settings: &Settings) {
    let agg = aggregate_at(&data.tasks, &data.sprints, settings.target_velocity, Utc::now());
    if agg.insights.is_empty() {
        println!("No insights.");
        return;
    }
    for (i, insight) in agg.insights.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!(
            "[{}] {} ({} impact)",
            format_insight_kind(insight.kind),
            insight.title,
            format_impact(insight.impact)
        );
        println!("  {}", insight.description);
        println!("  -> {}", insight.recommendation);
    }
}

/// Write the JSON report.
pub fn cmd_report(data: &ProjectData, settings: &Settings, output: Option<PathBuf>) {
    let result = build_report(data, settings, Utc::now())
        .and_then(|json| write_output(output.as_deref(), &format!("{json}\n")));
    if let Err(e) = result {
        exit_with(e);
    }
}

/// Export derived tasks to CSV.
pub fn cmd_export(data: &ProjectData, output: Option<PathBuf>) {
    if let Err(e) = write_output(output.as_deref(), &tasks_to_csv(&data.tasks)) {
        exit_with(e);
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::sample_rows;
    use chrono::TimeZone;

    fn sample() -> ProjectData {
        ProjectData::from_rows(&sample_rows(), StatusMatch::Literal)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 5).unwrap()
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_split_and_normalise_tags() {
        let tags = split_and_normalise_tags(&["Backend, design".into(), "backend".into()]);
        assert_eq!(tags, vec!["backend", "design"]);
    }

    #[test]
    fn test_select_by_status_and_tag() {
        let data = sample();
        let filter = TaskFilter {
            status: Some(Status::Delayed),
            ..Default::default()
        };
        assert_eq!(ids(&select_tasks(&data, &filter, SortKey::Id, today())), vec!["T103", "T202"]);

        let filter = TaskFilter {
            tags: vec!["backend".into()],
            ..Default::default()
        };
        assert_eq!(
            ids(&select_tasks(&data, &filter, SortKey::Id, today())),
            vec!["T101", "T103", "T201"]
        );
    }

    #[test]
    fn test_select_by_assignee_is_case_insensitive() {
        let data = sample();
        let filter = TaskFilter {
            assignee: Some("kriti".into()),
            ..Default::default()
        };
        assert_eq!(ids(&select_tasks(&data, &filter, SortKey::Id, today())), vec!["T104", "T202"]);
    }

    #[test]
    fn test_sort_by_priority_puts_critical_first() {
        let data = sample();
        let rows = select_tasks(&data, &TaskFilter::default(), SortKey::Priority, today());
        assert_eq!(rows[0].priority, Priority::Critical);
        assert!(rows.windows(2).all(|w| w[0].priority >= w[1].priority));
    }

    #[test]
    fn test_overdue_filter() {
        let data = sample();
        let filter = TaskFilter {
            due: Some(DueFilter::Overdue),
            ..Default::default()
        };
        assert_eq!(
            ids(&select_tasks(&data, &filter, SortKey::Due, today())),
            vec!["T101", "T102", "T104"]
        );
    }

    #[test]
    fn test_build_report_is_valid_json() {
        let now = Utc.with_ymd_and_hms(2025, 2, 6, 12, 0, 0).unwrap();
        let json = build_report(&sample(), &Settings::default(), now).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tasks"].as_array().unwrap().len(), 7);
        assert_eq!(value["sprints"].as_array().unwrap().len(), 2);
        assert_eq!(value["metrics"]["delayed_tasks"], 2);
        assert_eq!(value["metrics"]["delivery_score"], 7.0);
        assert_eq!(value["status_match"], "literal");
        assert_eq!(value["velocity_series"][0]["target"], 75);
    }
}

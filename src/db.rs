//! Project data loading and utility functions.
//!
//! This module provides `ProjectData`, the derived tasks and sprints of one project,
//! along with loaders for raw task rows (JSON or CSV exports) and the formatting
//! helpers used by the table-printing commands.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::derive::derive_task_with;
use crate::error::{Error, Result};
use crate::fields::*;
use crate::task::{Sprint, Task, TaskRow};

/// Columns a CSV export must carry, in any order. `dependencies` may be omitted.
const CSV_COLUMNS: [&str; 11] = [
    "project_id",
    "sprint",
    "task_id",
    "task_name",
    "owner",
    "status",
    "estimated_hours",
    "actual_hours",
    "start_date",
    "end_date",
    "dependencies",
];

/// Derived tasks of one project and their sprint partition.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProjectData {
    pub tasks: Vec<Task>,
    pub sprints: Vec<Sprint>,
}

impl ProjectData {
    /// Derive every row and partition the results by sprint number.
    pub fn from_rows(rows: &[TaskRow], mode: StatusMatch) -> Self {
        let tasks: Vec<Task> = rows.iter().map(|r| derive_task_with(r, mode)).collect();
        let sprints = build_sprints(rows, &tasks);
        debug!(tasks = tasks.len(), sprints = sprints.len(), ?mode, "derived project data");
        ProjectData { tasks, sprints }
    }

    /// Load rows from `path` and derive them. A load failure is logged and yields
    /// an empty project, which every command handles.
    pub fn load_or_empty(path: &Path, mode: StatusMatch) -> Self {
        match load_rows(path) {
            Ok(rows) => ProjectData::from_rows(&rows, mode),
            Err(e) => {
                warn!(error = %e, "failed to load project rows, continuing with no tasks");
                ProjectData::default()
            }
        }
    }

    /// Get a task by ID.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a task by ID, or an error naming the missing ID.
    pub fn require(&self, id: &str) -> Result<&Task> {
        self.get(id).ok_or_else(|| Error::UnknownTask(id.to_string()))
    }
}

/// Group derived tasks by the sprint number of their source rows, in ascending
/// sprint order. `rows` and `tasks` are parallel.
pub fn build_sprints(rows: &[TaskRow], tasks: &[Task]) -> Vec<Sprint> {
    let mut groups: BTreeMap<u32, Vec<(&TaskRow, &Task)>> = BTreeMap::new();
    for (row, task) in rows.iter().zip(tasks) {
        groups.entry(row.sprint).or_default().push((row, task));
    }

    groups
        .into_iter()
        .filter_map(|(number, members)| {
            let start_date = members.iter().map(|(r, _)| r.start_date).min()?;
            let end_date = members.iter().map(|(r, _)| r.end_date).max()?;
            let done = members.iter().filter(|(_, t)| t.status == Status::Done).count();
            let velocity = (done as f64 / members.len() as f64 * 100.0).round() as u32;
            Some(Sprint {
                id: format!("sprint-{number}"),
                name: format!("Sprint {number}"),
                start_date,
                end_date,
                velocity,
                tasks: members.into_iter().map(|(_, t)| t.clone()).collect(),
            })
        })
        .collect()
}

/// Load raw task rows from a `.json` array or a `.csv` export.
pub fn load_rows(path: &Path) -> Result<Vec<TaskRow>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let buf = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = match ext.as_deref() {
        Some("json") => serde_json::from_str(&buf).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?,
        Some("csv") => parse_rows_csv(&buf, path)?,
        _ => return Err(Error::UnsupportedFormat { path: path.to_path_buf() }),
    };
    debug!(path = %path.display(), rows = rows.len(), "loaded task rows");
    Ok(rows)
}

/// Parse CSV text with a header row naming the row columns.
///
/// A malformed record is logged and skipped so the remaining rows still load.
/// Only a header missing a required column rejects the whole file.
pub fn parse_rows_csv(text: &str, path: &Path) -> Result<Vec<TaskRow>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = split_csv_records(text).into_iter();
    let Some((header_line, header)) = records.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = header.into_iter().map(|h| h.trim().to_lowercase()).collect();
    let mut index = BTreeMap::new();
    for column in CSV_COLUMNS {
        match header.iter().position(|h| h == column) {
            Some(i) => {
                index.insert(column, i);
            }
            None if column == "dependencies" => {}
            None => {
                return Err(Error::Csv {
                    path: path.to_path_buf(),
                    line: header_line,
                    message: format!("missing column '{column}'"),
                })
            }
        }
    }

    let mut rows = Vec::new();
    let mut skipped = 0;
    for (line, fields) in records {
        match parse_csv_row(&fields, &index) {
            Ok(row) => rows.push(row),
            Err(message) => {
                let e = Error::Csv {
                    path: path.to_path_buf(),
                    line,
                    message,
                };
                warn!(error = %e, "skipping malformed task row");
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warn!(path = %path.display(), loaded = rows.len(), skipped, "some task rows were skipped");
    }
    Ok(rows)
}

/// Build one row from a CSV record, or describe the first bad field.
fn parse_csv_row(
    fields: &[String],
    index: &BTreeMap<&str, usize>,
) -> std::result::Result<TaskRow, String> {
    let field = |name: &str| -> String {
        index
            .get(name)
            .and_then(|&i| fields.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    let number = |name: &str| -> std::result::Result<f64, String> {
        let raw = field(name);
        if raw.is_empty() {
            return Ok(0.0);
        }
        raw.parse::<f64>()
            .map_err(|_| format!("{name} '{raw}' is not a number"))
    };
    let date = |name: &str| -> std::result::Result<NaiveDate, String> {
        let raw = field(name);
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| format!("{name} '{raw}' is not a YYYY-MM-DD date"))
    };

    let sprint_raw = field("sprint");
    let sprint = sprint_raw
        .parse::<u32>()
        .map_err(|_| format!("sprint '{sprint_raw}' is not a whole number"))?;

    Ok(TaskRow {
        project_id: field("project_id"),
        sprint,
        task_id: field("task_id"),
        task_name: field("task_name"),
        owner: field("owner"),
        status: field("status"),
        estimated_hours: number("estimated_hours")?,
        actual_hours: number("actual_hours")?,
        start_date: date("start_date")?,
        end_date: date("end_date")?,
        dependencies: field("dependencies"),
    })
}

/// Split CSV text into records. Quoted fields may hold separators, doubled quotes
/// and newlines. Each record carries the 1-based line it starts on; blank records
/// are dropped.
fn split_csv_records(text: &str) -> Vec<(usize, Vec<String>)> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, record_line, std::mem::take(&mut fields));
                line += 1;
                record_line = line;
            }
            '\n' => {
                field.push(ch);
                line += 1;
            }
            _ => field.push(ch),
        }
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        push_record(&mut records, record_line, fields);
    }
    records
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, line: usize, fields: Vec<String>) {
    if fields.iter().any(|f| !f.trim().is_empty()) {
        records.push((line, fields));
    }
}

/// Quote a CSV field when it contains a separator, quote or newline.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Render derived tasks as CSV with a header row.
pub fn tasks_to_csv(tasks: &[Task]) -> String {
    let mut out = String::from(
        "ID,Title,Status,Priority,Assignee,Due,Progress,EstimatedHours,ActualHours,Dependencies,Tags,DelayReason\n",
    );
    for t in tasks {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{}\n",
            escape_csv(&t.id),
            escape_csv(&t.title),
            format_status(t.status),
            format_priority(t.priority),
            escape_csv(&t.assignee),
            t.due_date.format("%Y-%m-%d"),
            t.progress,
            t.estimated_hours,
            t.actual_hours,
            escape_csv(&t.dependencies.join(";")),
            escape_csv(&t.tags.join(";")),
            escape_csv(t.delay_reason.as_deref().unwrap_or("-")),
        ));
    }
    out
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    let end = start + Duration::days(6);
    (start, end)
}

/// Whether a due date passes a due filter relative to `today`.
pub fn matches_due(due: NaiveDate, filter: DueFilter, today: NaiveDate) -> bool {
    match filter {
        DueFilter::Today => due == today,
        DueFilter::ThisWeek => {
            let (start, end) = start_end_of_this_week(today);
            due >= start && due <= end
        }
        DueFilter::Overdue => due < today,
    }
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: NaiveDate, today: NaiveDate) -> String {
    let days = (due - today).num_days();
    match days {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}

/// Format a task status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::NotStarted => "Not Started",
        Status::InProgress => "In Progress",
        Status::Delayed => "Delayed",
        Status::Done => "Done",
    }
}

/// Format a priority for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
        Priority::Critical => "Critical",
    }
}

/// Format an insight impact for display.
pub fn format_impact(i: Impact) -> &'static str {
    match i {
        Impact::Low => "Low",
        Impact::Medium => "Medium",
        Impact::High => "High",
    }
}

/// Format an insight kind for display.
pub fn format_insight_kind(k: InsightKind) -> &'static str {
    match k {
        InsightKind::RootCause => "Root Cause",
        InsightKind::FastTrack => "Fast Track",
        InsightKind::ResourceShift => "Resource Shift",
        InsightKind::Reprioritize => "Reprioritize",
        InsightKind::Prediction => "Prediction",
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task], today: NaiveDate) {
    println!(
        "{:<6} {:<12} {:<9} {:>4} {:<10} {:<10} {}",
        "ID", "Status", "Pri", "Prog", "Due", "Assignee", "Title [tags]"
    );
    for t in tasks {
        println!(
            "{:<6} {:<12} {:<9} {:>3}% {:<10} {:<10} {} [{}]",
            truncate(&t.id, 6),
            format_status(t.status),
            format_priority(t.priority),
            t.progress,
            format_due_relative(t.due_date, today),
            truncate(&t.assignee, 10),
            t.title,
            t.tags.join(",")
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

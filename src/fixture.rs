//! Built-in sample project, used when no task row file is configured.

use chrono::NaiveDate;

use crate::task::TaskRow;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn row(
    sprint: u32,
    task_id: &str,
    task_name: &str,
    owner: &str,
    status: &str,
    estimated_hours: f64,
    actual_hours: f64,
    start: (u32, u32),
    end: (u32, u32),
    dependencies: &str,
) -> TaskRow {
    TaskRow {
        project_id: "P001".into(),
        sprint,
        task_id: task_id.into(),
        task_name: task_name.into(),
        owner: owner.into(),
        status: status.into(),
        estimated_hours,
        actual_hours,
        start_date: date(start.0, start.1),
        end_date: date(end.0, end.1),
        dependencies: dependencies.into(),
    }
}

/// Two sprints of seven tasks across four owners.
pub fn sample_rows() -> Vec<TaskRow> {
    vec![
        row(1, "T101", "Build API Contract", "Arun", "Done", 8.0, 7.0, (2, 1), (2, 2), ""),
        row(1, "T102", "Database Schema Finalization", "Neha", "In-Progress", 12.0, 6.0, (2, 2), (2, 3), "T101"),
        row(1, "T103", "Backend Framework Setup", "Raj", "Delayed", 10.0, 14.0, (2, 2), (2, 5), ""),
        row(1, "T104", "UI Wireframe Review", "Kriti", "Not-Started", 6.0, 0.0, (2, 3), (2, 4), ""),
        row(2, "T201", "API Development Sprint 1", "Raj", "In-Progress", 20.0, 8.0, (2, 6), (2, 10), "T101"),
        row(2, "T202", "UI Components Setup", "Kriti", "Delayed", 18.0, 20.0, (2, 6), (2, 10), "T104"),
        row(2, "T203", "Integration Prep", "Arun", "Not-Started", 8.0, 0.0, (2, 6), (2, 10), "T102, T103"),
    ]
}

//! Task data structures.
//!
//! `TaskRow` is the raw record as it arrives from a project spreadsheet export;
//! `Task` is the derived form every other module works with. `Sprint` groups
//! derived tasks by the sprint number of their source rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// One raw task record from the external data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub project_id: String,
    pub sprint: u32,
    pub task_id: String,
    pub task_name: String,
    pub owner: String,
    pub status: String,
    pub estimated_hours: f64,
    pub actual_hours: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub dependencies: String,
}

/// A task after normalisation and inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub assignee: String,
    pub due_date: NaiveDate,
    pub progress: u8,
    pub estimated_hours: f64,
    pub actual_hours: f64,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_reason: Option<String>,
    pub tags: Vec<String>,
}

/// A time-boxed grouping of tasks with its completion velocity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: String,
    pub name: String,
    /// Earliest start date among the sprint's rows.
    pub start_date: NaiveDate,
    /// Latest end (due) date among the sprint's rows.
    pub end_date: NaiveDate,
    /// Percentage of the sprint's tasks that are done, rounded.
    pub velocity: u32,
    pub tasks: Vec<Task>,
}

//! Enumerations and field types for derived tasks and insights.
//!
//! This module defines the closed value sets used across the crate: task status and
//! priority, insight kinds and impact levels, the raw-status matching mode, and the
//! sorting and filtering options exposed by the CLI.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Normalised task status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NotStarted,
    InProgress,
    Delayed,
    Done,
}

/// Inferred task priority, ordered from least to most pressing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Category of a generated insight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    RootCause,
    FastTrack,
    ResourceShift,
    Reprioritize,
    Prediction,
}

/// Expected impact of acting on an insight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
}

/// How the priority and progress rules read a row's status column.
///
/// `Literal` compares the raw column text case-sensitively against `"Delayed"`,
/// `"Done"` and `"Not-Started"`, so `"delayed"` or `"DONE"` do not trigger those
/// rules. `Normalized` consults the normalised [`Status`] instead.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StatusMatch {
    #[default]
    Literal,
    Normalized,
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    Due,
    Priority,
    Progress,
    Id,
}

/// Filtering options for tasks based on due dates.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DueFilter {
    Today,
    ThisWeek,
    Overdue,
}

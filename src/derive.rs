//! Task derivation engine.
//!
//! Pure functions that turn a raw [`TaskRow`] into a fully populated [`Task`]:
//! status normalisation, priority inference, progress calculation, delay-reason
//! templating and tag inference. Exclusive classifications (priority, delay reason)
//! are ordered first-match rule tables; tag inference is a multi-match table where
//! every matching rule contributes.

use tracing::trace;

use crate::fields::*;
use crate::task::{Task, TaskRow};

/// Progress reported for unfinished work never exceeds this value.
pub const PROGRESS_CAP: f64 = 95.0;

/// Tag used when no keyword rule matches a title.
pub const DEFAULT_TAG: &str = "general";

const RAW_DELAYED: &str = "Delayed";
const RAW_DONE: &str = "Done";
const RAW_NOT_STARTED: &str = "Not-Started";

enum Condition {
    Delayed,
    HoursAbove(f64),
}

struct PriorityRule {
    when: Condition,
    then: Priority,
}

/// Exclusive priority rules; the first match wins, otherwise [`Priority::Low`].
const PRIORITY_RULES: &[PriorityRule] = &[
    PriorityRule { when: Condition::Delayed, then: Priority::Critical },
    PriorityRule { when: Condition::HoursAbove(20.0), then: Priority::Critical },
    PriorityRule { when: Condition::HoursAbove(15.0), then: Priority::High },
    PriorityRule { when: Condition::HoursAbove(8.0), then: Priority::Medium },
];

enum Reason {
    /// Sentence with the hour overrun spliced between the two parts.
    Overrun(&'static str, &'static str),
    Fixed(&'static str),
}

impl Reason {
    fn render(&self, overrun: f64) -> String {
        match self {
            Reason::Overrun(head, tail) => format!("{head}{overrun}{tail}"),
            Reason::Fixed(text) => (*text).to_string(),
        }
    }
}

/// Exclusive delay-reason rules keyed on a lowercase title substring.
const DELAY_RULES: &[(&str, Reason)] = &[
    (
        "framework",
        Reason::Overrun("Complex technical challenges requiring additional ", " hours beyond estimate"),
    ),
    (
        "ui",
        Reason::Overrun("Design iterations and stakeholder feedback extended timeline by ", " hours"),
    ),
    ("integration", Reason::Fixed("Dependency delays blocking progress")),
];

const DEFAULT_DELAY_REASON: Reason =
    Reason::Overrun("Task complexity exceeded initial estimates by ", " hours");

/// Inclusive tag rules: any keyword hit adds the tag.
const TAG_RULES: &[(&[&str], &str)] = &[
    (&["api", "backend"], "backend"),
    (&["ui", "wireframe", "component"], "frontend"),
    (&["database", "schema"], "database"),
    (&["integration"], "integration"),
    (&["framework", "setup"], "infrastructure"),
    (&["review", "wireframe"], "design"),
];

/// Map a free-text status onto [`Status`]. Unrecognised input is `NotStarted`.
pub fn normalize_status(raw: &str) -> Status {
    let folded: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect();
    match folded.as_str() {
        "done" => Status::Done,
        "inprogress" => Status::InProgress,
        "delayed" => Status::Delayed,
        _ => Status::NotStarted,
    }
}

/// Infer priority from estimated hours and the raw status column.
///
/// Only the exact text `"Delayed"` triggers the status rule; see [`StatusMatch`].
pub fn infer_priority(estimated_hours: f64, raw_status: &str) -> Priority {
    priority_for(estimated_hours, raw_status == RAW_DELAYED)
}

fn priority_for(estimated_hours: f64, delayed: bool) -> Priority {
    PRIORITY_RULES
        .iter()
        .find(|rule| match rule.when {
            Condition::Delayed => delayed,
            Condition::HoursAbove(limit) => estimated_hours > limit,
        })
        .map(|rule| rule.then)
        .unwrap_or(Priority::Low)
}

/// Compute a progress percentage from logged hours and the raw status column.
///
/// `"Done"` is 100 and `"Not-Started"` is 0 (exact text). Everything else is the
/// actual/estimated ratio capped at [`PROGRESS_CAP`]; a zero estimate yields 0.
pub fn compute_progress(actual: f64, estimated: f64, raw_status: &str) -> u8 {
    match raw_status {
        RAW_DONE => 100,
        RAW_NOT_STARTED => 0,
        _ => progress_from_hours(actual, estimated),
    }
}

fn progress_from_hours(actual: f64, estimated: f64) -> u8 {
    if estimated <= 0.0 {
        return 0;
    }
    let ratio = actual / estimated * 100.0;
    if !ratio.is_finite() {
        return 0;
    }
    ratio.clamp(0.0, PROGRESS_CAP).round() as u8
}

/// Explain why a task is delayed, citing the hour overrun where the template has one.
pub fn build_delay_reason(title: &str, actual: f64, estimated: f64) -> String {
    let lower = title.to_lowercase();
    let overrun = actual - estimated;
    DELAY_RULES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, reason)| reason)
        .unwrap_or(&DEFAULT_DELAY_REASON)
        .render(overrun)
}

/// Infer category tags from a title. Never empty.
pub fn infer_tags(title: &str) -> Vec<String> {
    let lower = title.to_lowercase();
    let tags: Vec<String> = TAG_RULES
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, tag)| (*tag).to_string())
        .collect();
    if tags.is_empty() {
        vec![DEFAULT_TAG.to_string()]
    } else {
        tags
    }
}

/// Split a comma-separated dependency column into trimmed task ids.
pub fn parse_dependencies(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Derive a task using literal raw-status comparisons.
pub fn derive_task(row: &TaskRow) -> Task {
    derive_task_with(row, StatusMatch::Literal)
}

/// Derive a task, choosing how the priority and progress rules read the status.
pub fn derive_task_with(row: &TaskRow, mode: StatusMatch) -> Task {
    let status = normalize_status(&row.status);
    let (progress, priority) = match mode {
        StatusMatch::Literal => (
            compute_progress(row.actual_hours, row.estimated_hours, &row.status),
            infer_priority(row.estimated_hours, &row.status),
        ),
        StatusMatch::Normalized => {
            let progress = match status {
                Status::Done => 100,
                Status::NotStarted => 0,
                _ => progress_from_hours(row.actual_hours, row.estimated_hours),
            };
            (progress, priority_for(row.estimated_hours, status == Status::Delayed))
        }
    };
    let tags = infer_tags(&row.task_name);
    let delay_reason = (status == Status::Delayed)
        .then(|| build_delay_reason(&row.task_name, row.actual_hours, row.estimated_hours));

    trace!(task = %row.task_id, ?status, ?priority, progress, "derived task");

    Task {
        id: row.task_id.clone(),
        title: row.task_name.clone(),
        description: format!("{} - Assigned to {}", row.task_name, row.owner),
        status,
        priority,
        assignee: row.owner.clone(),
        due_date: row.end_date,
        progress,
        estimated_hours: row.estimated_hours,
        actual_hours: row.actual_hours,
        dependencies: parse_dependencies(&row.dependencies),
        delay_reason,
        tags,
    }
}

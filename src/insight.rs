//! Insight rule evaluation.
//!
//! A fixed, ordered list of independent rules run against a derived task
//! collection. Each rule emits zero or more [`Insight`]s; every match is kept and
//! the output follows rule order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fields::*;
use crate::task::Task;

/// In-progress tasks below this progress count as at risk.
pub const AT_RISK_PROGRESS: u8 = 50;

/// Minimum spread of open-task counts between assignees that flags an imbalance.
pub const WORKLOAD_SPREAD: usize = 2;

/// A short generated message reacting to a pattern in the task collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub recommendation: String,
    /// Generation time. Metadata only; two runs over identical tasks differ here.
    pub timestamp: DateTime<Utc>,
}

type Rule = fn(&[Task], DateTime<Utc>) -> Vec<Insight>;

const RULES: &[Rule] = &[root_causes, at_risk_prediction, fast_track, resource_shift];

/// Run every rule against `tasks`, stamping insights with `now`.
pub fn generate_insights(tasks: &[Task], now: DateTime<Utc>) -> Vec<Insight> {
    let insights: Vec<Insight> = RULES.iter().flat_map(|rule| rule(tasks, now)).collect();
    debug!(tasks = tasks.len(), insights = insights.len(), "generated insights");
    insights
}

/// One root-cause insight per delayed task that carries a delay reason.
fn root_causes(tasks: &[Task], now: DateTime<Utc>) -> Vec<Insight> {
    tasks
        .iter()
        .filter(|t| t.status == Status::Delayed)
        .enumerate()
        .filter_map(|(idx, task)| {
            let reason = task.delay_reason.as_deref().filter(|r| !r.is_empty())?;
            Some(Insight {
                id: format!("insight-delay-{idx}"),
                kind: InsightKind::RootCause,
                title: format!("{} Delay Analysis", task.title),
                description: reason.to_string(),
                impact: if task.priority == Priority::Critical {
                    Impact::High
                } else {
                    Impact::Medium
                },
                recommendation: overrun_recommendation(task),
                timestamp: now,
            })
        })
        .collect()
}

fn overrun_recommendation(task: &Task) -> String {
    if task.actual_hours > task.estimated_hours && task.estimated_hours > 0.0 {
        let buffer =
            ((task.actual_hours - task.estimated_hours) / task.estimated_hours * 100.0).round();
        format!("Re-estimate similar tasks with {buffer}% buffer to improve accuracy")
    } else {
        "Review task breakdown and identify blockers early in sprint planning".to_string()
    }
}

fn at_risk_prediction(tasks: &[Task], now: DateTime<Utc>) -> Vec<Insight> {
    let at_risk = tasks
        .iter()
        .filter(|t| t.status == Status::InProgress && t.progress < AT_RISK_PROGRESS)
        .count();
    if at_risk == 0 {
        return Vec::new();
    }
    vec![Insight {
        id: "insight-prediction".into(),
        kind: InsightKind::Prediction,
        title: "At-Risk Tasks Detected".into(),
        description: format!("{at_risk} in-progress tasks showing slow velocity"),
        impact: Impact::Medium,
        recommendation:
            "Daily check-ins recommended for low-velocity tasks to identify blockers early".into(),
        timestamp: now,
    }]
}

fn fast_track(tasks: &[Task], now: DateTime<Utc>) -> Vec<Insight> {
    let early = tasks
        .iter()
        .filter(|t| t.status == Status::Done && t.actual_hours < t.estimated_hours)
        .count();
    if early == 0 {
        return Vec::new();
    }
    vec![Insight {
        id: "insight-fast-track".into(),
        kind: InsightKind::FastTrack,
        title: "Efficiency Gains Identified".into(),
        description: format!("{early} tasks completed under estimate"),
        impact: Impact::Low,
        recommendation:
            "Document successful patterns from early completions to replicate efficiency".into(),
        timestamp: now,
    }]
}

/// Open (not done) task count per assignee. Assignees with only done work count zero.
pub fn open_load_by_assignee(tasks: &[Task]) -> BTreeMap<&str, usize> {
    let mut load: BTreeMap<&str, usize> = BTreeMap::new();
    for t in tasks {
        let open = load.entry(t.assignee.as_str()).or_default();
        if t.status != Status::Done {
            *open += 1;
        }
    }
    load
}

fn resource_shift(tasks: &[Task], now: DateTime<Utc>) -> Vec<Insight> {
    let load = open_load_by_assignee(tasks);
    let (Some(max), Some(min)) = (load.values().max(), load.values().min()) else {
        return Vec::new();
    };
    if max - min < WORKLOAD_SPREAD {
        return Vec::new();
    }
    vec![Insight {
        id: "insight-resource".into(),
        kind: InsightKind::ResourceShift,
        title: "Workload Imbalance Detected".into(),
        description: "Uneven task distribution across team members".into(),
        impact: Impact::Medium,
        recommendation: "Consider redistributing tasks from high-load to low-load team members to optimize delivery".into(),
        timestamp: now,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 6, 9, 0, 0).unwrap()
    }

    fn task(id: &str, assignee: &str, status: Status, progress: u8, est: f64, act: f64) -> Task {
        Task {
            id: id.into(),
            title: format!("Task {id}"),
            description: String::new(),
            status,
            priority: Priority::Medium,
            assignee: assignee.into(),
            due_date: NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
            progress,
            estimated_hours: est,
            actual_hours: act,
            dependencies: Vec::new(),
            delay_reason: (status == Status::Delayed).then(|| "Dependency delays blocking progress".into()),
            tags: vec!["general".into()],
        }
    }

    #[test]
    fn test_no_tasks_no_insights() {
        assert!(generate_insights(&[], now()).is_empty());
    }

    #[test]
    fn test_root_cause_impact_and_recommendation() {
        let mut critical = task("T1", "Raj", Status::Delayed, 95, 10.0, 14.0);
        critical.priority = Priority::Critical;
        let under = task("T2", "Kriti", Status::Delayed, 50, 10.0, 5.0);
        let insights = root_causes(&[critical, under], now());

        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].id, "insight-delay-0");
        assert_eq!(insights[0].title, "Task T1 Delay Analysis");
        assert_eq!(insights[0].impact, Impact::High);
        assert_eq!(
            insights[0].recommendation,
            "Re-estimate similar tasks with 40% buffer to improve accuracy"
        );
        assert_eq!(insights[1].id, "insight-delay-1");
        assert_eq!(insights[1].impact, Impact::Medium);
        assert!(insights[1].recommendation.starts_with("Review task breakdown"));
    }

    #[test]
    fn test_root_cause_skips_missing_reason() {
        let mut t = task("T1", "Raj", Status::Delayed, 95, 10.0, 14.0);
        t.delay_reason = None;
        assert!(root_causes(&[t], now()).is_empty());
    }

    #[test]
    fn test_zero_estimate_falls_back_to_review_text() {
        let t = task("T1", "Raj", Status::Delayed, 0, 0.0, 3.0);
        assert!(overrun_recommendation(&t).starts_with("Review task breakdown"));
    }

    #[test]
    fn test_prediction_is_one_aggregate_insight() {
        let tasks = vec![
            task("T1", "Raj", Status::InProgress, 40, 20.0, 8.0),
            task("T2", "Neha", Status::InProgress, 10, 20.0, 2.0),
            task("T3", "Arun", Status::InProgress, 50, 12.0, 6.0),
        ];
        let insights = at_risk_prediction(&tasks, now());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].description, "2 in-progress tasks showing slow velocity");
    }

    #[test]
    fn test_fast_track_counts_early_completions() {
        let tasks = vec![
            task("T1", "Arun", Status::Done, 100, 8.0, 7.0),
            task("T2", "Arun", Status::Done, 100, 8.0, 8.0),
        ];
        let insights = fast_track(&tasks, now());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].description, "1 tasks completed under estimate");
        assert_eq!(insights[0].impact, Impact::Low);
    }

    #[test]
    fn test_resource_shift_threshold() {
        let balanced = vec![
            task("T1", "Raj", Status::InProgress, 40, 8.0, 3.0),
            task("T2", "Raj", Status::NotStarted, 0, 8.0, 0.0),
            task("T3", "Arun", Status::InProgress, 40, 8.0, 3.0),
        ];
        assert!(resource_shift(&balanced, now()).is_empty());

        let mut skewed = balanced.clone();
        skewed.push(task("T4", "Raj", Status::Delayed, 60, 8.0, 9.0));
        skewed.push(task("T5", "Kriti", Status::Done, 100, 8.0, 7.0));
        assert_eq!(open_load_by_assignee(&skewed)["Kriti"], 0);
        let insights = resource_shift(&skewed, now());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::ResourceShift);
    }

    #[test]
    fn test_resource_shift_fires_at_spread_of_two() {
        let tasks = vec![
            task("T1", "Raj", Status::InProgress, 40, 8.0, 3.0),
            task("T2", "Raj", Status::Delayed, 60, 8.0, 9.0),
            task("T3", "Arun", Status::Done, 100, 8.0, 7.0),
        ];
        let load = open_load_by_assignee(&tasks);
        assert_eq!(load["Raj"], 2);
        assert_eq!(load["Arun"], 0);
        let insights = resource_shift(&tasks, now());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "insight-resource");
    }

    #[test]
    fn test_rules_emit_in_order_with_timestamp() {
        let tasks = vec![
            task("T1", "Raj", Status::Delayed, 95, 10.0, 14.0),
            task("T2", "Raj", Status::InProgress, 40, 20.0, 8.0),
            task("T3", "Raj", Status::NotStarted, 0, 8.0, 0.0),
            task("T4", "Arun", Status::Done, 100, 8.0, 7.0),
        ];
        let kinds: Vec<InsightKind> =
            generate_insights(&tasks, now()).iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                InsightKind::RootCause,
                InsightKind::Prediction,
                InsightKind::FastTrack,
                InsightKind::ResourceShift,
            ]
        );
        assert!(generate_insights(&tasks, now()).iter().all(|i| i.timestamp == now()));
    }
}

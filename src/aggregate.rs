//! Aggregation pass over a derived task collection.
//!
//! [`aggregate`] is recomputed from scratch by the caller whenever the task
//! collection changes. Every figure is a single commutative reduction, so task
//! order never affects the result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fields::Status;
use crate::insight::{generate_insights, Insight};
use crate::task::{Sprint, Task};

/// Sprint velocity target plotted alongside actual velocity.
pub const DEFAULT_TARGET_VELOCITY: u32 = 75;

/// Delivery-score points lost per delayed task.
const DELAY_PENALTY: f64 = 1.5;

/// Task counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub done: usize,
    pub in_progress: usize,
    pub delayed: usize,
    pub not_started: usize,
}

impl StatusCounts {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut counts = StatusCounts::default();
        for t in tasks {
            match t.status {
                Status::Done => counts.done += 1,
                Status::InProgress => counts.in_progress += 1,
                Status::Delayed => counts.delayed += 1,
                Status::NotStarted => counts.not_started += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.done + self.in_progress + self.delayed + self.not_started
    }
}

/// Project-wide summary figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetrics {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub delayed_tasks: usize,
    /// Rounded mean of sprint velocities; 0 without sprints.
    pub average_velocity: u32,
    /// Rounded share of tasks that are done; 0 without tasks.
    pub on_time_delivery: u32,
    /// 1 to 10, one decimal place.
    pub delivery_score: f64,
}

/// One point of the sprint velocity series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityPoint {
    pub sprint: String,
    pub velocity: u32,
    pub target: u32,
}

/// One labelled slice of the status distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSlice {
    pub name: String,
    pub status: Status,
    pub value: usize,
}

/// Everything derived from a task collection in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub counts: StatusCounts,
    pub metrics: ProjectMetrics,
    pub insights: Vec<Insight>,
    pub velocity_series: Vec<VelocityPoint>,
    pub status_distribution: Vec<StatusSlice>,
}

/// Delivery score penalising delayed tasks: `10 - 1.5 * delayed`, kept within 1..=10.
pub fn delivery_score(delayed: usize) -> f64 {
    let raw = (10.0 - DELAY_PENALTY * delayed as f64).clamp(1.0, 10.0);
    (raw * 10.0).round() / 10.0
}

/// Rounded mean of sprint velocities; 0 for no sprints.
pub fn average_velocity(sprints: &[Sprint]) -> u32 {
    if sprints.is_empty() {
        return 0;
    }
    let sum: u32 = sprints.iter().map(|s| s.velocity).sum();
    (f64::from(sum) / sprints.len() as f64).round() as u32
}

/// Compute metrics for a task collection and its sprint partition.
pub fn project_metrics(tasks: &[Task], sprints: &[Sprint]) -> ProjectMetrics {
    let counts = StatusCounts::from_tasks(tasks);
    metrics_from_counts(&counts, sprints)
}

fn metrics_from_counts(counts: &StatusCounts, sprints: &[Sprint]) -> ProjectMetrics {
    let total = counts.total();
    let on_time_delivery = if total == 0 {
        0
    } else {
        (counts.done as f64 / total as f64 * 100.0).round() as u32
    };
    ProjectMetrics {
        total_tasks: total,
        completed_tasks: counts.done,
        delayed_tasks: counts.delayed,
        average_velocity: average_velocity(sprints),
        on_time_delivery,
        delivery_score: delivery_score(counts.delayed),
    }
}

/// Velocity series for charting, one point per sprint in sprint order.
pub fn velocity_series(sprints: &[Sprint], target: u32) -> Vec<VelocityPoint> {
    sprints
        .iter()
        .map(|s| VelocityPoint {
            sprint: s.name.clone(),
            velocity: s.velocity,
            target,
        })
        .collect()
}

/// Status distribution in the fixed order Done, In Progress, Delayed, Not Started.
pub fn status_distribution(counts: &StatusCounts) -> Vec<StatusSlice> {
    [
        ("Done", Status::Done, counts.done),
        ("In Progress", Status::InProgress, counts.in_progress),
        ("Delayed", Status::Delayed, counts.delayed),
        ("Not Started", Status::NotStarted, counts.not_started),
    ]
    .into_iter()
    .map(|(name, status, value)| StatusSlice {
        name: name.to_string(),
        status,
        value,
    })
    .collect()
}

/// Aggregate with the default velocity target, stamping insights with the current time.
pub fn aggregate(tasks: &[Task], sprints: &[Sprint]) -> Aggregate {
    aggregate_at(tasks, sprints, DEFAULT_TARGET_VELOCITY, Utc::now())
}

/// Aggregate with an explicit velocity target and insight timestamp.
pub fn aggregate_at(
    tasks: &[Task],
    sprints: &[Sprint],
    target_velocity: u32,
    now: DateTime<Utc>,
) -> Aggregate {
    let counts = StatusCounts::from_tasks(tasks);
    let metrics = metrics_from_counts(&counts, sprints);
    debug!(
        tasks = metrics.total_tasks,
        sprints = sprints.len(),
        delivery_score = metrics.delivery_score,
        "aggregated project"
    );
    Aggregate {
        counts,
        insights: generate_insights(tasks, now),
        velocity_series: velocity_series(sprints, target_velocity),
        status_distribution: status_distribution(&counts),
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use chrono::{NaiveDate, TimeZone};

    fn task(id: &str, status: Status) -> Task {
        Task {
            id: id.into(),
            title: id.into(),
            description: String::new(),
            status,
            priority: Priority::Low,
            assignee: "Raj".into(),
            due_date: NaiveDate::from_ymd_opt(2025, 2, 5).unwrap(),
            progress: 0,
            estimated_hours: 8.0,
            actual_hours: 8.0,
            dependencies: Vec::new(),
            delay_reason: (status == Status::Delayed).then(|| "late".into()),
            tags: vec!["general".into()],
        }
    }

    fn sprint(n: u32, velocity: u32) -> Sprint {
        let day = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        Sprint {
            id: format!("sprint-{n}"),
            name: format!("Sprint {n}"),
            start_date: day,
            end_date: day,
            velocity,
            tasks: Vec::new(),
        }
    }

    #[test]
    fn test_delivery_score() {
        assert_eq!(delivery_score(0), 10.0);
        assert_eq!(delivery_score(1), 8.5);
        assert_eq!(delivery_score(2), 7.0);
        assert_eq!(delivery_score(6), 1.0);
        assert_eq!(delivery_score(40), 1.0);
    }

    #[test]
    fn test_four_tasks_one_delayed() {
        let tasks = vec![
            task("T1", Status::Done),
            task("T2", Status::InProgress),
            task("T3", Status::Delayed),
            task("T4", Status::NotStarted),
        ];
        let metrics = project_metrics(&tasks, &[]);
        assert_eq!(metrics.delivery_score, 8.5);
        assert_eq!(metrics.total_tasks, 4);
        assert_eq!(metrics.completed_tasks, 1);
        assert_eq!(metrics.delayed_tasks, 1);
        assert_eq!(metrics.on_time_delivery, 25);
    }

    #[test]
    fn test_average_velocity() {
        assert_eq!(average_velocity(&[]), 0);
        assert_eq!(average_velocity(&[sprint(1, 25), sprint(2, 33)]), 29);
        assert_eq!(average_velocity(&[sprint(1, 25), sprint(2, 50)]), 38);
    }

    #[test]
    fn test_aggregate_empty() {
        let now = Utc.with_ymd_and_hms(2025, 2, 6, 0, 0, 0).unwrap();
        let agg = aggregate_at(&[], &[], DEFAULT_TARGET_VELOCITY, now);
        assert_eq!(agg.counts, StatusCounts::default());
        assert_eq!(agg.metrics.total_tasks, 0);
        assert_eq!(agg.metrics.average_velocity, 0);
        assert_eq!(agg.metrics.on_time_delivery, 0);
        assert_eq!(agg.metrics.delivery_score, 10.0);
        assert!(agg.insights.is_empty());
        assert!(agg.velocity_series.is_empty());
        assert!(agg.status_distribution.iter().all(|s| s.value == 0));
    }

    #[test]
    fn test_series_and_distribution() {
        let tasks = vec![task("T1", Status::Done), task("T2", Status::Delayed)];
        let sprints = vec![sprint(1, 50), sprint(2, 0)];
        let agg = aggregate(&tasks, &sprints);

        let names: Vec<&str> = agg.status_distribution.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Done", "In Progress", "Delayed", "Not Started"]);
        assert_eq!(agg.status_distribution[0].value, 1);
        assert_eq!(agg.status_distribution[2].value, 1);

        assert_eq!(agg.velocity_series.len(), 2);
        assert_eq!(agg.velocity_series[0].sprint, "Sprint 1");
        assert_eq!(agg.velocity_series[0].target, DEFAULT_TARGET_VELOCITY);
    }

    #[test]
    fn test_order_does_not_matter() {
        let now = Utc.with_ymd_and_hms(2025, 2, 6, 0, 0, 0).unwrap();
        let mut tasks = vec![
            task("T1", Status::Done),
            task("T2", Status::Delayed),
            task("T3", Status::InProgress),
        ];
        let forward = aggregate_at(&tasks, &[], 75, now);
        tasks.reverse();
        let backward = aggregate_at(&tasks, &[], 75, now);
        assert_eq!(forward.metrics, backward.metrics);
        assert_eq!(forward.counts, backward.counts);
    }
}

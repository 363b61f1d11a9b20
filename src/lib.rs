//! # Project Insights
//!
//! Turns raw project task rows, as exported from a planning spreadsheet, into
//! derived tasks, sprint velocity, delivery metrics and short insight messages.
//!
//! ## Pipeline
//!
//! raw [`TaskRow`](task::TaskRow)s → [`derive_task`](derive::derive_task) →
//! [`build_sprints`](db::build_sprints) → [`aggregate`](aggregate::aggregate)
//!
//! Every stage is a pure function over in-memory values. Aggregates are
//! recomputed from scratch whenever the task collection changes.
//!
//! ```
//! use project_insights::aggregate::aggregate;
//! use project_insights::db::ProjectData;
//! use project_insights::fields::StatusMatch;
//! use project_insights::fixture::sample_rows;
//!
//! let data = ProjectData::from_rows(&sample_rows(), StatusMatch::Literal);
//! let summary = aggregate(&data.tasks, &data.sprints);
//! assert_eq!(summary.metrics.total_tasks, 7);
//! ```
//!
//! ## Status matching
//!
//! Priority and progress rules compare the raw status column case-sensitively by
//! default, so `"delayed"` does not force a critical priority while `"Delayed"`
//! does. [`StatusMatch::Normalized`](fields::StatusMatch) switches them to the
//! normalised status.

pub mod aggregate;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod derive;
pub mod error;
pub mod fields;
pub mod fixture;
pub mod insight;
pub mod logging;
pub mod task;

pub use error::{Error, Result};

// src/dag/mod.rs

//! Plan representation and scheduling.
//!
//! - [`graph`] holds the plan (nodes, dependencies, ordered actions) and its
//!   validation.
//! - [`scheduler`] runs a plan's nodes in dependency order.
//! - [`task_info`] provides the per-node run state.

pub mod graph;
pub mod scheduler;
pub mod task_info;

pub use graph::{Executable, Plan, PlanNode};
pub use scheduler::{RunReport, Scheduler};
pub use task_info::{NodeInfo, NodeRunState};

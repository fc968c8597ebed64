// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::{Executable, Plan};
use crate::dag::task_info::{NodeInfo, NodeRunState};
use crate::errors::{GrainflowError, Result};

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Node ids in completion order.
    pub order: Vec<String>,
    /// Total actions executed.
    pub actions: usize,
}

/// Runs plans and remembers the per-node state of the latest run.
///
/// A run:
/// - validates the plan up front, so a cyclic or dangling plan runs nothing
/// - repeatedly picks the first pending node (in plan order) whose
///   dependencies are all done
/// - executes that node's actions in order, as one unit
/// - aborts on the first action error, leaving completed nodes as they are
#[derive(Debug, Default)]
pub struct Scheduler {
    nodes: Vec<NodeInfo>,
    index: HashMap<String, usize>,
    run_counter: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of runs started (including ones rejected by validation).
    pub fn runs(&self) -> u64 {
        self.run_counter
    }

    /// Read-only view of a node's state in the latest run.
    pub fn run_state_of(&self, id: &str) -> Option<NodeRunState> {
        self.index.get(id).map(|&i| self.nodes[i].run_state)
    }

    /// Nodes of the latest run, in plan order.
    pub fn nodes(&self) -> &[NodeInfo] {
        &self.nodes
    }

    /// Whether every dependency of `id` is done in the latest run.
    ///
    /// Returns `None` if the node is unknown.
    pub fn deps_satisfied(&self, id: &str) -> Option<bool> {
        let info = &self.nodes[*self.index.get(id)?];
        Some(self.deps_done(info))
    }

    pub fn run<A, C>(&mut self, plan: &Plan<A>, ctx: &mut C) -> Result<RunReport>
    where
        A: Executable<C>,
    {
        self.run_counter += 1;
        let run_id = self.run_counter;
        self.nodes.clear();
        self.index.clear();

        plan.validate()?;

        for (i, node) in plan.nodes().iter().enumerate() {
            self.index.insert(node.id.clone(), i);
            self.nodes.push(NodeInfo {
                id: node.id.clone(),
                deps: node.deps.iter().cloned().collect(),
                actions: node.actions.len(),
                run_state: NodeRunState::Pending,
            });
        }
        info!(run_id, nodes = plan.len(), "scheduler: starting run");

        let mut report = RunReport::default();
        while let Some(i) = self.next_ready() {
            let node = &plan.nodes()[i];
            self.nodes[i].run_state = NodeRunState::Running;
            debug!(run_id, node = %node.id, "dependencies satisfied; running node");

            for action in &node.actions {
                debug!(node = %node.id, action = action.id(), "executing action");
                if let Err(err) = action.execute(ctx) {
                    self.nodes[i].run_state = NodeRunState::Failed;
                    warn!(
                        run_id,
                        node = %node.id,
                        action = action.id(),
                        error = %err,
                        "action failed; aborting run"
                    );
                    return Err(err);
                }
                report.actions += 1;
            }

            self.nodes[i].run_state = NodeRunState::Done;
            report.order.push(node.id.clone());
        }

        let stuck: Vec<&str> = self
            .nodes
            .iter()
            .filter(|n| !n.run_state.is_terminal())
            .map(|n| n.id.as_str())
            .collect();
        if !stuck.is_empty() {
            return Err(GrainflowError::GraphError(format!(
                "no runnable node; unmet dependencies for {}",
                stuck.join(", ")
            )));
        }

        info!(run_id, nodes = report.order.len(), actions = report.actions, "scheduler: run finished");
        Ok(report)
    }

    fn next_ready(&self) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.run_state == NodeRunState::Pending && self.deps_done(n))
    }

    fn deps_done(&self, info: &NodeInfo) -> bool {
        info.deps.iter().all(|dep| {
            self.index
                .get(dep)
                .is_some_and(|&j| self.nodes[j].run_state == NodeRunState::Done)
        })
    }
}

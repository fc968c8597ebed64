// src/dag/task_info.rs

//! Per-node run state tracked by the scheduler.

/// Run state of a plan node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRunState {
    /// Waiting on dependencies.
    Pending,
    /// Actions are executing.
    Running,
    /// Every action completed.
    Done,
    /// An action returned an error; the run was aborted here.
    Failed,
}

impl NodeRunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeRunState::Done | NodeRunState::Failed)
    }
}

/// Static node information plus its state in the latest run.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: String,
    pub deps: Vec<String>,
    pub actions: usize,
    pub run_state: NodeRunState,
}

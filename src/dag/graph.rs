// src/dag/graph.rs

use std::collections::{BTreeSet, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{GrainflowError, Result};

/// Something a plan node can run against a context of type `C`.
pub trait Executable<C> {
    fn id(&self) -> &str;
    fn execute(&self, ctx: &mut C) -> Result<()>;
}

/// One node of a plan: its dependencies and the actions it runs, in order.
#[derive(Debug, Clone)]
pub struct PlanNode<A> {
    pub id: String,
    /// Nodes that must complete before this one starts.
    pub deps: BTreeSet<String>,
    pub actions: Vec<A>,
}

impl<A> PlanNode<A> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            deps: BTreeSet::new(),
            actions: Vec::new(),
        }
    }

    pub fn after<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    pub fn actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions);
        self
    }
}

/// Ordered collection of plan nodes.
///
/// Construction does not check anything; [`Plan::validate`] (called by the
/// scheduler before running) rejects duplicate ids, unknown or self
/// dependencies, and cycles.
#[derive(Debug, Clone)]
pub struct Plan<A> {
    nodes: Vec<PlanNode<A>>,
}

impl<A> Default for Plan<A> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<A> Plan<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = PlanNode<A>>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    pub fn push(&mut self, node: PlanNode<A>) {
        self.nodes.push(node);
    }

    pub fn nodes(&self) -> &[PlanNode<A>] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&PlanNode<A>> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of nodes that list `id` as a dependency.
    pub fn dependents_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.deps.contains(id))
            .map(|n| n.id.as_str())
    }

    /// Check the plan is a DAG and return one topological order of its ids.
    pub fn validate(&self) -> Result<Vec<&str>> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(GrainflowError::GraphError(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }

        for node in &self.nodes {
            for dep in &node.deps {
                if dep == &node.id {
                    return Err(GrainflowError::GraphError(format!(
                        "node '{}' cannot depend on itself",
                        node.id
                    )));
                }
                if !seen.contains(dep.as_str()) {
                    return Err(GrainflowError::GraphError(format!(
                        "node '{}' has unknown dependency '{}'",
                        node.id, dep
                    )));
                }
            }
        }

        // Edge direction: dep -> node.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for node in &self.nodes {
            graph.add_node(node.id.as_str());
        }
        for node in &self.nodes {
            for dep in &node.deps {
                graph.add_edge(dep.as_str(), node.id.as_str(), ());
            }
        }

        toposort(&graph, None).map_err(|cycle| {
            GrainflowError::GraphError(format!(
                "cycle detected in plan involving node '{}'",
                cycle.node_id()
            ))
        })
    }
}

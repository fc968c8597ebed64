#![allow(dead_code)]

use grainflow::config::model::{
    BoardSection, GrainsSection, RealtimeSection, TableSection,
};
use grainflow::config::{ConfigFile, RawConfigFile};
use grainflow::dag::{Plan, PlanNode};
use grainflow::geometry::Vec2;
use grainflow::sim::AntSpec;

use crate::recording::RecordingAction;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts with no ants; `build` needs at least one.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                table: TableSection::default(),
                grains: GrainsSection::default(),
                realtime: RealtimeSection::default(),
                board: BoardSection::default(),
                ants: Vec::new(),
            },
        }
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.table.capacity = capacity;
        self
    }

    pub fn grains(mut self, repo: usize) -> Self {
        self.config.grains.repo = repo;
        self
    }

    pub fn tick_ms(mut self, tick_ms: u64) -> Self {
        self.config.realtime.tick_ms = tick_ms;
        self
    }

    pub fn max_ticks(mut self, max_ticks: u64) -> Self {
        self.config.realtime.max_ticks = max_ticks;
        self
    }

    pub fn repo_pos(mut self, x: f64, y: f64) -> Self {
        self.config.realtime.repo_pos = Vec2::new(x, y);
        self
    }

    pub fn ant(mut self, id: &str, x: f64, y: f64, speed: f64) -> Self {
        self.config.ants.push(AntSpec::new(id, Vec2::new(x, y), speed));
        self
    }

    /// `n` ants spread along the x axis, all at `speed`.
    pub fn ants(mut self, n: usize, speed: f64) -> Self {
        for i in 0..n {
            self = self.ant(&format!("ant-{i}"), i as f64, 0.0, speed);
        }
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for plans of [`RecordingAction`]s.
///
/// Each node gets one recording action named after the node.
pub struct PlanBuilder {
    plan: Plan<RecordingAction>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self { plan: Plan::new() }
    }

    pub fn node(mut self, id: &str, deps: &[&str]) -> Self {
        self.plan.push(
            PlanNode::new(id)
                .after(deps.iter().copied())
                .action(RecordingAction::new(id)),
        );
        self
    }

    /// A node whose single action fails.
    pub fn failing_node(mut self, id: &str, deps: &[&str]) -> Self {
        self.plan.push(
            PlanNode::new(id)
                .after(deps.iter().copied())
                .action(RecordingAction::failing(id)),
        );
        self
    }

    /// A node running several recording actions `<id>.0`, `<id>.1`, ...
    pub fn node_with_actions(mut self, id: &str, deps: &[&str], actions: usize) -> Self {
        self.plan.push(
            PlanNode::new(id)
                .after(deps.iter().copied())
                .actions((0..actions).map(|i| RecordingAction::new(&format!("{id}.{i}")))),
        );
        self
    }

    pub fn build(self) -> Plan<RecordingAction> {
        self.plan
    }
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// src/config/model.rs

use serde::Deserialize;

use crate::geometry::Vec2;
use crate::resources::BoardLayout;
use crate::sim::AntSpec;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [table]
/// capacity = 4
///
/// [grains]
/// repo = 64
///
/// [realtime]
/// tick_ms = 16
/// max_ticks = 100000
/// repo_pos = { x = 0.0, y = 0.0 }
///
/// [board]
/// origin = { x = 2.0, y = 1.0 }
/// dx = 1.0
/// dy = 2.0
///
/// [[ant]]
/// id = "ant-0"
/// pos = { x = 0.0, y = 0.0 }
/// speed = 4.0
/// ```
///
/// Every section except `[[ant]]` is optional and has defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub table: TableSection,

    #[serde(default)]
    pub grains: GrainsSection,

    #[serde(default)]
    pub realtime: RealtimeSection,

    #[serde(default)]
    pub board: BoardSection,

    /// Ant roster from `[[ant]]` entries.
    #[serde(default, rename = "ant")]
    pub ants: Vec<AntSpec>,
}

/// Validated configuration. Build it through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub table: TableSection,
    pub grains: GrainsSection,
    pub realtime: RealtimeSection,
    pub board: BoardSection,
    pub ants: Vec<AntSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            table: raw.table,
            grains: raw.grains,
            realtime: raw.realtime,
            board: raw.board,
            ants: raw.ants,
        }
    }
}

impl Default for ConfigFile {
    /// Defaults used when no config file exists: one ant at the origin.
    fn default() -> Self {
        Self {
            table: TableSection::default(),
            grains: GrainsSection::default(),
            realtime: RealtimeSection::default(),
            board: BoardSection::default(),
            ants: vec![AntSpec::new("ant-0", Vec2::ORIGIN, 4.0)],
        }
    }
}

/// `[table]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TableSection {
    /// Number of scratch rows.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    4
}

impl Default for TableSection {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// `[grains]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct GrainsSection {
    /// Grains in the repository at start; the total the pool conserves.
    #[serde(default = "default_repo")]
    pub repo: usize,
}

fn default_repo() -> usize {
    64
}

impl Default for GrainsSection {
    fn default() -> Self {
        Self { repo: default_repo() }
    }
}

/// `[realtime]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeSection {
    /// Simulated milliseconds per tick.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Ticks a single await may spend before timing out.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Where grains are fetched from and returned to.
    #[serde(default)]
    pub repo_pos: Vec2,
}

fn default_tick_ms() -> u64 {
    16
}

fn default_max_ticks() -> u64 {
    100_000
}

impl Default for RealtimeSection {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            max_ticks: default_max_ticks(),
            repo_pos: Vec2::ORIGIN,
        }
    }
}

/// `[board]` section: where the CLA-4 row sites sit.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardSection {
    #[serde(default = "default_origin")]
    pub origin: Vec2,
    #[serde(default = "default_dx")]
    pub dx: f64,
    #[serde(default = "default_dy")]
    pub dy: f64,
}

fn default_origin() -> Vec2 {
    BoardLayout::default().origin
}

fn default_dx() -> f64 {
    BoardLayout::default().dx
}

fn default_dy() -> f64 {
    BoardLayout::default().dy
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            dx: default_dx(),
            dy: default_dy(),
        }
    }
}

impl BoardSection {
    pub fn layout(&self) -> BoardLayout {
        BoardLayout {
            origin: self.origin,
            dx: self.dx,
            dy: self.dy,
        }
    }
}

// src/sim/mod.rs

//! Workers that turn fill/clear intents into grain movements.
//!
//! - [`virtual_worker`] drains bulk jobs instantly.
//! - [`realtime`] runs a roster of ants over positional job chains.
//! - [`tracker`] is the row-to-grain bookkeeping both share.
//! - [`movement`] is the straight-line stepping ants use.

pub mod movement;
pub mod realtime;
pub mod tracker;
pub mod virtual_worker;

use crate::errors::Result;
use crate::resources::{GrainPool, MemoryBoard, ResourceTable};

pub use movement::step_toward;
pub use realtime::{Ant, AntSpec, RealtimeWorkerPool};
pub use tracker::RowTracker;
pub use virtual_worker::VirtualWorker;

/// The resource layer a worker mutates.
#[derive(Debug)]
pub struct SimState {
    pub table: ResourceTable,
    pub grains: GrainPool,
    pub tracker: RowTracker,
    pub board: MemoryBoard,
}

impl SimState {
    pub fn new(capacity: usize, repo: usize, board: MemoryBoard) -> Result<Self> {
        Ok(Self {
            table: ResourceTable::new(capacity)?,
            grains: GrainPool::new(repo),
            tracker: RowTracker::new(),
            board,
        })
    }
}

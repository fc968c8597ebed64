// src/jobs/mod.rs

//! Work items handed to the workers.
//!
//! - [`Job`] is the coarse, virtual vocabulary: fill or clear a whole row.
//! - [`PosJob`] is the positional vocabulary a single ant executes step by
//!   step; a [`JobChain`] is one ant's trip made of several positional jobs.
//! - [`queue`] holds the FIFO both workers pull from.

pub mod queue;

use std::collections::VecDeque;

use crate::geometry::Vec2;
use crate::resources::{GrainId, RowId, Site};

pub use queue::{JobId, JobQueue};

/// Virtual job: instantaneous bulk placement or eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Place `count` grains onto the row, then mark it Ready.
    PlaceOnRow { row: RowId, count: usize },
    /// Evict every grain tracked against the row.
    ClearRow { row: RowId },
}

/// Positional job executed by one ant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PosJob {
    /// Mint a Loose grain near a point and pick it up.
    FetchFromRepo { near: Vec2 },
    /// Pick up a specific Loose grain.
    PickLoose { grain: GrainId },
    /// Walk toward `dest`.
    CarryTo { dest: Vec2 },
    /// Drop the carried grain into a row site.
    PlaceInRow { row: RowId, site: Site },
    /// Lift a grain out of a row.
    EvictFromRow { row: RowId, grain: GrainId },
    /// Hand the carried grain back to the repository.
    ReturnToRepo { grain: GrainId },
}

/// Sequence of positional jobs performed by the same ant, in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobChain {
    steps: VecDeque<PosJob>,
}

impl JobChain {
    pub fn new(steps: impl IntoIterator<Item = PosJob>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    pub fn next_step(&mut self) -> Option<PosJob> {
        self.steps.pop_front()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl From<PosJob> for JobChain {
    fn from(job: PosJob) -> Self {
        Self::new([job])
    }
}

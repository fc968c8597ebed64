// src/engine/context.rs

//! Everything one scheduling run mutates.

use std::time::Duration;

use clap::ValueEnum;
use tracing::debug;

use crate::adder::bits::Bit;
use crate::config::ConfigFile;
use crate::engine::cells::CellStore;
use crate::errors::{GrainflowError, Result};
use crate::geometry::Vec2;
use crate::resources::{MemoryBoard, RowId, RowState};
use crate::sim::{RealtimeWorkerPool, SimState, VirtualWorker};

/// Which worker turns row intents into grain movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    /// Every job completes instantly when awaited.
    #[default]
    Virtual,
    /// Ants walk grains around; awaiting ticks the pool.
    Realtime,
}

/// The active worker, owning its job queue.
#[derive(Debug)]
pub enum Worker {
    Virtual(VirtualWorker),
    Realtime(RealtimeWorkerPool),
}

impl Worker {
    pub fn mode(&self) -> Mode {
        match self {
            Worker::Virtual(_) => Mode::Virtual,
            Worker::Realtime(_) => Mode::Realtime,
        }
    }
}

/// Timing knobs for realtime awaits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AwaitConfig {
    /// Simulated time per tick.
    pub tick: Duration,
    /// Ticks an await may spend before failing with `Timeout`.
    pub max_ticks: u64,
    /// Where evicted grains are carried back to.
    pub repo_pos: Vec2,
}

impl Default for AwaitConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(16),
            max_ticks: 100_000,
            repo_pos: Vec2::ORIGIN,
        }
    }
}

#[derive(Debug)]
pub struct ExecContext {
    pub cells: CellStore,
    pub sim: SimState,
    pub worker: Worker,
    /// Initial carry-in.
    pub c0: Bit,
    pub await_cfg: AwaitConfig,
}

impl ExecContext {
    pub fn new(sim: SimState, worker: Worker, c0: Bit, await_cfg: AwaitConfig) -> Self {
        Self {
            cells: CellStore::new(),
            sim,
            worker,
            c0,
            await_cfg,
        }
    }

    /// Fresh resource layer and worker for `mode`, sized by `cfg`.
    pub fn from_config(cfg: &ConfigFile, mode: Mode, c0: Bit) -> Result<Self> {
        let board = MemoryBoard::cla4_default(cfg.board.layout())?;
        let sim = SimState::new(cfg.table.capacity, cfg.grains.repo, board)?;
        let worker = match mode {
            Mode::Virtual => Worker::Virtual(VirtualWorker::new()),
            Mode::Realtime => Worker::Realtime(RealtimeWorkerPool::new(cfg.ants.iter().cloned())?),
        };
        let await_cfg = AwaitConfig {
            tick: Duration::from_millis(cfg.realtime.tick_ms),
            max_ticks: cfg.realtime.max_ticks,
            repo_pos: cfg.realtime.repo_pos,
        };
        Ok(Self::new(sim, worker, c0, await_cfg))
    }

    pub fn mode(&self) -> Mode {
        self.worker.mode()
    }

    /// Tick the realtime pool until `row` reaches `target`.
    ///
    /// Returns the ticks spent. In virtual mode this drains the queue and
    /// only checks the state afterwards.
    pub fn await_row(&mut self, row: RowId, target: RowState) -> Result<u64> {
        match &mut self.worker {
            Worker::Virtual(worker) => {
                worker.drain(&mut self.sim)?;
                let state = self.sim.table.row(row)?.state;
                if state != target {
                    return Err(GrainflowError::InvalidTransition(format!(
                        "row {row} is {state:?} after drain, expected {target:?}"
                    )));
                }
                Ok(0)
            }
            Worker::Realtime(pool) => {
                let mut ticks = 0;
                while self.sim.table.row(row)?.state != target {
                    if ticks >= self.await_cfg.max_ticks {
                        return Err(GrainflowError::Timeout {
                            what: format!("row {row} to become {target:?}"),
                            ticks,
                        });
                    }
                    pool.tick(&mut self.sim, self.await_cfg.tick)?;
                    ticks += 1;
                }
                debug!(%row, ?target, ticks, "await satisfied");
                Ok(ticks)
            }
        }
    }

    /// Finish all outstanding jobs (ants still walking grains home, etc).
    pub fn settle(&mut self) -> Result<u64> {
        match &mut self.worker {
            Worker::Virtual(worker) => worker.drain(&mut self.sim).map(|n| n as u64),
            Worker::Realtime(pool) => {
                pool.run_until_idle(&mut self.sim, self.await_cfg.tick, self.await_cfg.max_ticks)
            }
        }
    }

    /// Check that every row is back to Free with nothing on it and that the
    /// grain pool is whole again.
    pub fn check_released(&self) -> Result<()> {
        for row in self.sim.table.rows() {
            if row.state != RowState::Free || row.occupancy != 0 {
                return Err(GrainflowError::InvalidTransition(format!(
                    "row {} left {:?} with occupancy {}",
                    row.id, row.state, row.occupancy
                )));
            }
        }
        let stats = self.sim.grains.stats();
        if stats.total != self.sim.grains.capacity() || stats.repo != stats.total {
            return Err(GrainflowError::InvalidGrainState(format!(
                "grains not back in repo: {stats:?} (capacity {})",
                self.sim.grains.capacity()
            )));
        }
        Ok(())
    }
}

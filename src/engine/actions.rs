// src/engine/actions.rs

//! Plan actions: the closed set of operations a node can run.
//!
//! Cell operands are cell ids in the context's
//! [`CellStore`](crate::engine::CellStore); row operands
//! name the cell holding the row id written by `AllocScratch`.

use std::fmt;

use tracing::{debug, trace};

use crate::adder::bits::{self, Bit, GpPart, Gp};
use crate::dag::Executable;
use crate::engine::cells::CellValue;
use crate::engine::context::{ExecContext, Worker};
use crate::errors::{check, GrainflowError, Result};
use crate::geometry::Vec2;
use crate::jobs::{Job, JobChain, PosJob};
use crate::resources::{GrainId, MemKey, RowId, RowState};
use crate::sim::SimState;

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// `out = a XOR b`
    ComputeP { a: String, b: String, out: String },
    /// `out = a AND b`
    ComputeG { a: String, b: String, out: String },
    MaterializeGp { g: String, p: String, out: String },
    /// `out = right ∘ left`
    CombineGp { right: String, left: String, out: String },
    /// `out = G ∨ (P · c0)`
    CarryFromPrefix { prefix: String, out: String },
    /// `out = p XOR c`
    SumFromPc { p: String, c: String, out: String },

    AllocScratch { key: MemKey, out: String },
    SetScratchValue { row: String, value: Bit },
    SetScratchValueFromPair { row: String, pair: String, which: GpPart },
    MarkScratchBusy { row: String },
    MarkScratchReady { row: String },
    BeginScratchClear { row: String },
    IncScratchOccupancy { row: String, by: u32 },
    DecScratchOccupancy { row: String, by: u32 },

    /// Set the row's value from a pair and queue the grains that encode it.
    EnqueueFillRow {
        row: String,
        pair: String,
        which: GpPart,
        key: MemKey,
    },
    AwaitRowReady { row: String },
    /// Begin clearing the row and queue the evictions.
    EnqueueClearRow { row: String },
    AwaitRowFreed { row: String },
}

impl Op {
    /// Short variant name for logs and dry-run output.
    pub fn name(&self) -> &'static str {
        match self {
            Op::ComputeP { .. } => "ComputeP",
            Op::ComputeG { .. } => "ComputeG",
            Op::MaterializeGp { .. } => "MaterializeGp",
            Op::CombineGp { .. } => "CombineGp",
            Op::CarryFromPrefix { .. } => "CarryFromPrefix",
            Op::SumFromPc { .. } => "SumFromPc",
            Op::AllocScratch { .. } => "AllocScratch",
            Op::SetScratchValue { .. } => "SetScratchValue",
            Op::SetScratchValueFromPair { .. } => "SetScratchValueFromPair",
            Op::MarkScratchBusy { .. } => "MarkScratchBusy",
            Op::MarkScratchReady { .. } => "MarkScratchReady",
            Op::BeginScratchClear { .. } => "BeginScratchClear",
            Op::IncScratchOccupancy { .. } => "IncScratchOccupancy",
            Op::DecScratchOccupancy { .. } => "DecScratchOccupancy",
            Op::EnqueueFillRow { .. } => "EnqueueFillRow",
            Op::AwaitRowReady { .. } => "AwaitRowReady",
            Op::EnqueueClearRow { .. } => "EnqueueClearRow",
            Op::AwaitRowFreed { .. } => "AwaitRowFreed",
        }
    }
}

/// A named [`Op`], the unit a plan node runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub id: String,
    pub op: Op,
}

impl Action {
    pub fn new(id: impl Into<String>, op: Op) -> Self {
        Self { id: id.into(), op }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.op.name())
    }
}

impl Executable<ExecContext> for Action {
    fn id(&self) -> &str {
        &self.id
    }

    fn execute(&self, ctx: &mut ExecContext) -> Result<()> {
        match &self.op {
            Op::ComputeP { a, b, out } => {
                let v = ctx.cells.read_bit(a)?.xor(ctx.cells.read_bit(b)?);
                ctx.cells.write(out, CellValue::Bit(v))
            }
            Op::ComputeG { a, b, out } => {
                let v = ctx.cells.read_bit(a)?.and(ctx.cells.read_bit(b)?);
                ctx.cells.write(out, CellValue::Bit(v))
            }
            Op::MaterializeGp { g, p, out } => {
                let gp = Gp::new(ctx.cells.read_bit(g)?, ctx.cells.read_bit(p)?);
                ctx.cells.write(out, CellValue::Pair(gp))
            }
            Op::CombineGp { right, left, out } => {
                let gp = bits::combine(ctx.cells.read_pair(right)?, ctx.cells.read_pair(left)?);
                ctx.cells.write(out, CellValue::Pair(gp))
            }
            Op::CarryFromPrefix { prefix, out } => {
                let c = bits::carry_from_prefix(ctx.cells.read_pair(prefix)?, ctx.c0);
                ctx.cells.write(out, CellValue::Bit(c))
            }
            Op::SumFromPc { p, c, out } => {
                let s = ctx.cells.read_bit(p)?.xor(ctx.cells.read_bit(c)?);
                ctx.cells.write(out, CellValue::Bit(s))
            }

            Op::AllocScratch { key, out } => {
                let row = ctx.sim.table.allocate(*key)?;
                ctx.cells.write(out, CellValue::Row(row))
            }
            Op::SetScratchValue { row, value } => {
                let row = ctx.cells.read_row(row)?;
                ctx.sim.table.set_value(row, *value)
            }
            Op::SetScratchValueFromPair { row, pair, which } => {
                let row = ctx.cells.read_row(row)?;
                let v = ctx.cells.read_pair(pair)?.part(*which);
                ctx.sim.table.set_value(row, v)
            }
            Op::MarkScratchBusy { row } => {
                let row = ctx.cells.read_row(row)?;
                ctx.sim.table.mark_busy(row)
            }
            Op::MarkScratchReady { row } => {
                let row = ctx.cells.read_row(row)?;
                ctx.sim.table.mark_ready(row)
            }
            Op::BeginScratchClear { row } => {
                let row = ctx.cells.read_row(row)?;
                ctx.sim.table.begin_clear(row)
            }
            Op::IncScratchOccupancy { row, by } => {
                let row = ctx.cells.read_row(row)?;
                for _ in 0..*by {
                    ctx.sim.table.inc_occupancy(row)?;
                }
                Ok(())
            }
            Op::DecScratchOccupancy { row, by } => {
                let row = ctx.cells.read_row(row)?;
                for _ in 0..*by {
                    ctx.sim.table.dec_occupancy(row)?;
                }
                Ok(())
            }

            Op::EnqueueFillRow {
                row,
                pair,
                which,
                key,
            } => {
                let row = ctx.cells.read_row(row)?;
                enqueue_fill(ctx, row, pair, *which, *key)
            }
            Op::AwaitRowReady { row } => {
                let row = ctx.cells.read_row(row)?;
                ctx.await_row(row, RowState::Ready).map(|_| ())
            }
            Op::EnqueueClearRow { row } => {
                let row = ctx.cells.read_row(row)?;
                enqueue_clear(ctx, row)
            }
            Op::AwaitRowFreed { row } => {
                let row = ctx.cells.read_row(row)?;
                ctx.await_row(row, RowState::Free)?;
                if ctx.sim.board.remove(row).is_some() {
                    trace!(%row, "board row removed");
                }
                Ok(())
            }
        }
    }
}

fn enqueue_fill(ctx: &mut ExecContext, row: RowId, pair: &str, which: GpPart, key: MemKey) -> Result<()> {
    let bound = ctx.sim.table.row(row)?.key;
    check(bound == Some(key), || {
        GrainflowError::InvalidTransition(format!(
            "fill of {key} on row {row} which holds {}",
            bound.map_or_else(|| "no key".to_string(), |k| k.to_string())
        ))
    })?;

    let value = ctx.cells.read_pair(pair)?.part(which);
    ctx.sim.table.set_value(row, value)?;

    match &mut ctx.worker {
        Worker::Virtual(worker) => {
            let count = key.required_grains();
            let job = worker.enqueue(Job::PlaceOnRow { row, count });
            debug!(%job, %row, count, "fill queued");
        }
        Worker::Realtime(pool) => {
            let sites = ctx.sim.board.realize(key, row)?;
            let near = ctx.await_cfg.repo_pos;
            for site in key.required_sites() {
                let dest = sites.position(site)?;
                let job = pool.enqueue(JobChain::new([
                    PosJob::CarryTo { dest: near },
                    PosJob::FetchFromRepo { near },
                    PosJob::CarryTo { dest },
                    PosJob::PlaceInRow { row, site },
                ]));
                debug!(%job, %row, ?site, %dest, "fill trip queued");
            }
        }
    }
    Ok(())
}

fn enqueue_clear(ctx: &mut ExecContext, row: RowId) -> Result<()> {
    ctx.sim.table.begin_clear(row)?;

    match &mut ctx.worker {
        Worker::Virtual(worker) => {
            let job = worker.enqueue(Job::ClearRow { row });
            debug!(%job, %row, "clear queued");
        }
        Worker::Realtime(pool) => {
            let grains = ctx.sim.tracker.grains_on(row).to_vec();
            if grains.is_empty() && ctx.sim.table.row(row)?.occupancy == 0 {
                // Nothing on the row to carry away.
                return ctx.sim.table.free_if_empty(row);
            }
            let home = ctx.await_cfg.repo_pos;
            for grain in grains {
                let walk_to = site_position(&ctx.sim, row, grain).map(|dest| PosJob::CarryTo { dest });
                let job = pool.enqueue(JobChain::new(walk_to.into_iter().chain([
                    PosJob::EvictFromRow { row, grain },
                    PosJob::CarryTo { dest: home },
                    PosJob::ReturnToRepo { grain },
                ])));
                debug!(%job, %row, %grain, "clear trip queued");
            }
        }
    }
    Ok(())
}

/// Board position of the site `grain` occupies on `row`, if the row is realized.
fn site_position(sim: &SimState, row: RowId, grain: GrainId) -> Option<Vec2> {
    let site = sim.grains.grain(grain).ok()?.slot()?.site?;
    sim.board.sites(row).ok()?.position(site).ok()
}

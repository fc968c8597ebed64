// src/adder/cla4.rs

//! 4-bit carry-lookahead adder expressed as a plan.
//!
//! Per-bit P/G feed a prefix tree (`[1:0]`, `[3:2]`, `[2:0]`, `[3:0]`). Each
//! prefix's G bit is materialised on its own scratch row and freed once the
//! last consumer of that prefix has run.

use std::fmt;

use tracing::info;

use crate::adder::bits::{self, Bit, GpPart};
use crate::dag::{Plan, PlanNode, RunReport, Scheduler};
use crate::engine::{Action, CellStore, CellValue, ExecContext, Op};
use crate::errors::{GrainflowError, Result};
use crate::resources::{MemKey, VarKind};

/// Rows the plan holds at its peak.
pub const SCRATCH_ROWS: usize = 4;
/// Grains comfortably covering four filled range rows.
pub const DEFAULT_GRAINS: usize = 64;

/// Prefix spans in allocation order, with the cell naming their row.
const PREFIXES: [(u8, u8, &str); 4] = [(1, 0, "ROW10"), (3, 2, "ROW32"), (2, 0, "ROW20"), (3, 0, "ROW30")];

fn pfx(hi: u8, lo: u8) -> String {
    format!("PFX[{hi}:{lo}]")
}

fn act(id: impl Into<String>, op: Op) -> Action {
    Action::new(id, op)
}

/// Declare every cell the plan touches.
pub fn prepare_cells(cells: &mut CellStore) {
    for i in 0..4 {
        for role in ["A", "B", "P", "G", "GP", "S"] {
            cells.declare(format!("{role}{i}"));
        }
    }
    for i in 0..=4 {
        cells.declare(format!("C{i}"));
    }
    for (hi, lo, row) in PREFIXES {
        cells.declare(pfx(hi, lo));
        cells.declare(row);
    }
}

/// Write operands `a`, `b` (each 0..=15) and the carry-in `c0`.
pub fn write_inputs(cells: &mut CellStore, a: u8, b: u8, c0: Bit) -> Result<()> {
    for (name, v) in [("a", a), ("b", b)] {
        if v > 15 {
            return Err(GrainflowError::ConfigError(format!(
                "operand {name} must be in 0..=15 (got {v})"
            )));
        }
    }
    for (i, (ai, bi)) in bits::to_nibble(a).into_iter().zip(bits::to_nibble(b)).enumerate() {
        cells.write(&format!("A{i}"), CellValue::Bit(ai))?;
        cells.write(&format!("B{i}"), CellValue::Bit(bi))?;
    }
    cells.write("C0", CellValue::Bit(c0))
}

fn fill_node(
    id: &str,
    deps: [&str; 3],
    (right, left): (&str, &str),
    (hi, lo): (u8, u8),
    row: &str,
) -> Result<PlanNode<Action>> {
    let key = MemKey::range(VarKind::G, hi, lo)?;
    let out = pfx(hi, lo);
    let tag = format!("{hi}{lo}");
    Ok(PlanNode::new(id).after(deps).actions([
        act(
            format!("combine{tag}"),
            Op::CombineGp {
                right: right.to_string(),
                left: left.to_string(),
                out: out.clone(),
            },
        ),
        act(
            format!("fill{tag}"),
            Op::EnqueueFillRow {
                row: row.to_string(),
                pair: out,
                which: GpPart::G,
                key,
            },
        ),
        act(format!("await{tag}"), Op::AwaitRowReady { row: row.to_string() }),
    ]))
}

fn free_node<'a>(id: &str, deps: impl IntoIterator<Item = &'a str>, row: &str, tag: &str) -> PlanNode<Action> {
    PlanNode::new(id).after(deps).actions([
        act(format!("clear{tag}"), Op::EnqueueClearRow { row: row.to_string() }),
        act(format!("freed{tag}"), Op::AwaitRowFreed { row: row.to_string() }),
    ])
}

/// Build the full CLA-4 plan.
pub fn build_plan() -> Result<Plan<Action>> {
    let mut plan = Plan::new();

    for i in 0..4 {
        let (a, b, p, g) = (format!("A{i}"), format!("B{i}"), format!("P{i}"), format!("G{i}"));
        plan.push(PlanNode::new(format!("PG{i}")).actions([
            act(
                format!("P{i}"),
                Op::ComputeP {
                    a: a.clone(),
                    b: b.clone(),
                    out: p.clone(),
                },
            ),
            act(format!("G{i}"), Op::ComputeG { a, b, out: g.clone() }),
        ]));
        plan.push(
            PlanNode::new(format!("GP{i}"))
                .after([format!("PG{i}")])
                .action(act(format!("M{i}"), Op::MaterializeGp { g, p, out: format!("GP{i}") })),
        );
    }

    for (hi, lo, row) in PREFIXES {
        plan.push(PlanNode::new(format!("ALLOC_{hi}{lo}")).action(act(
            format!("alloc{hi}{lo}"),
            Op::AllocScratch {
                key: MemKey::range(VarKind::G, hi, lo)?,
                out: row.to_string(),
            },
        )));
    }

    let p10 = pfx(1, 0);
    let p32 = pfx(3, 2);
    plan.push(fill_node("L1_10", ["GP0", "GP1", "ALLOC_10"], ("GP1", "GP0"), (1, 0), "ROW10")?);
    plan.push(fill_node("L1_32", ["GP2", "GP3", "ALLOC_32"], ("GP3", "GP2"), (3, 2), "ROW32")?);
    plan.push(fill_node("L2_30", ["L1_10", "L1_32", "ALLOC_30"], (p32.as_str(), p10.as_str()), (3, 0), "ROW30")?);
    plan.push(fill_node("SC_20", ["GP2", "L1_10", "ALLOC_20"], ("GP2", p10.as_str()), (2, 0), "ROW20")?);

    for (i, dep, prefix) in [
        (1, "GP0", "GP0".to_string()),
        (2, "L1_10", pfx(1, 0)),
        (3, "SC_20", pfx(2, 0)),
        (4, "L2_30", pfx(3, 0)),
    ] {
        plan.push(PlanNode::new(format!("C{i}")).after([dep]).action(act(
            format!("CFP{i}"),
            Op::CarryFromPrefix {
                prefix,
                out: format!("C{i}"),
            },
        )));
    }

    // S_i reads P_i, so PG_i is a dependency alongside the carry.
    for i in 0..4 {
        let mut node = PlanNode::new(format!("S{i}")).after([format!("PG{i}")]);
        if i > 0 {
            node = node.after([format!("C{i}")]);
        }
        plan.push(node.action(act(
            format!("S{i}A"),
            Op::SumFromPc {
                p: format!("P{i}"),
                c: format!("C{i}"),
                out: format!("S{i}"),
            },
        )));
    }

    plan.push(free_node("FREE_10", ["C2", "SC_20", "L2_30"], "ROW10", "10"));
    plan.push(free_node("FREE_32", ["L2_30"], "ROW32", "32"));
    plan.push(free_node("FREE_20", ["C3"], "ROW20", "20"));
    plan.push(free_node("FREE_30", ["C4"], "ROW30", "30"));

    Ok(plan)
}

/// Final `C4 S3 S2 S1 S0` bits of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readout {
    pub carry: Bit,
    /// LSB-first.
    pub sum: [Bit; 4],
}

impl Readout {
    pub fn read(cells: &CellStore) -> Result<Self> {
        let mut sum = [Bit::Zero; 4];
        for (i, s) in sum.iter_mut().enumerate() {
            *s = cells.read_bit(&format!("S{i}"))?;
        }
        Ok(Self {
            carry: cells.read_bit("C4")?,
            sum,
        })
    }

    pub fn value(&self) -> u32 {
        let mut all = self.sum.to_vec();
        all.push(self.carry);
        bits::from_bits(&all)
    }
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [s0, s1, s2, s3] = self.sum;
        write!(f, "{} {s3}{s2}{s1}{s0}", self.carry)
    }
}

/// Result of one addition.
#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub a: u8,
    pub b: u8,
    pub c0: Bit,
    pub readout: Readout,
    pub report: RunReport,
    /// Ticks (realtime) or jobs (virtual) spent settling after the run.
    pub settled: u64,
}

impl AddOutcome {
    pub fn expected(&self) -> u32 {
        u32::from(self.a) + u32::from(self.b) + u32::from(self.c0.as_u8())
    }

    pub fn is_correct(&self) -> bool {
        self.readout.value() == self.expected()
    }
}

impl fmt::Display for AddOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.a, self.b)?;
        if self.c0.is_set() {
            write!(f, " + 1")?;
        }
        write!(f, " = {} (C4 S3 S2 S1 S0 = {})", self.readout.value(), self.readout)
    }
}

/// Run the CLA-4 plan for `a + b` on `ctx`, then settle outstanding jobs.
pub fn add(ctx: &mut ExecContext, a: u8, b: u8) -> Result<AddOutcome> {
    let plan = build_plan()?;
    prepare_cells(&mut ctx.cells);
    write_inputs(&mut ctx.cells, a, b, ctx.c0)?;

    let report = Scheduler::new().run(&plan, ctx)?;
    let settled = ctx.settle()?;
    let readout = Readout::read(&ctx.cells)?;

    let outcome = AddOutcome {
        a,
        b,
        c0: ctx.c0,
        readout,
        report,
        settled,
    };
    info!(mode = ?ctx.mode(), result = %outcome, "addition finished");
    Ok(outcome)
}

// src/lib.rs

pub mod adder;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod geometry;
pub mod jobs;
pub mod logging;
pub mod resources;
pub mod sim;

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::adder::bits::Bit;
use crate::adder::cla4::{self, AddOutcome};
use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::engine::{ExecContext, Mode, Worker};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - execution context for the chosen worker
/// - the CLA-4 plan and scheduler
/// - readout and resource stats on stdout
pub fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    let c0 = Bit::try_from(args.c0)?;

    if args.dry_run {
        print_dry_run(&cfg, args.mode)?;
        return Ok(());
    }

    if args.exhaustive {
        return run_exhaustive(&cfg, args.mode, c0);
    }

    let (Some(a), Some(b)) = (args.a, args.b) else {
        bail!("--a and --b are required unless --exhaustive or --dry-run is given");
    };

    let mut ctx = ExecContext::from_config(&cfg, args.mode, c0)?;
    let outcome = cla4::add(&mut ctx, a, b)?;
    println!("{outcome}");
    print_stats(&ctx, &outcome);

    if !outcome.is_correct() {
        bail!("readout {} does not match {}", outcome.readout.value(), outcome.expected());
    }
    ctx.check_released()?;
    Ok(())
}

/// Add every operand pair on a fresh context and check each result.
pub fn run_exhaustive(cfg: &ConfigFile, mode: Mode, c0: Bit) -> Result<()> {
    let mut failures = Vec::new();

    for a in 0..=15u8 {
        for b in 0..=15u8 {
            let mut ctx = ExecContext::from_config(cfg, mode, c0)?;
            let verdict = cla4::add(&mut ctx, a, b).and_then(|outcome| {
                ctx.check_released()?;
                Ok(outcome)
            });
            match verdict {
                Ok(outcome) if outcome.is_correct() => {}
                Ok(outcome) => {
                    warn!(result = %outcome, "wrong sum");
                    failures.push(format!("{outcome} (expected {})", outcome.expected()));
                }
                Err(err) => {
                    warn!(a, b, error = %err, "run failed");
                    failures.push(format!("{a} + {b}: {err}"));
                }
            }
        }
    }

    println!("{mode:?}: {}/256 correct", 256 - failures.len());
    for failure in &failures {
        println!("  {failure}");
    }
    info!(?mode, failures = failures.len(), "exhaustive run finished");

    if !failures.is_empty() {
        bail!("{} of 256 additions failed", failures.len());
    }
    Ok(())
}

fn print_stats(ctx: &ExecContext, outcome: &AddOutcome) {
    let t = ctx.sim.table.stats();
    let g = ctx.sim.grains.stats();
    println!(
        "rows: capacity={} free={} reserved={} busy={} ready={} clearing={}",
        t.capacity, t.free, t.reserved, t.busy, t.ready, t.clearing
    );
    println!(
        "grains: repo={} loose={} in_slot={} total={}",
        g.repo, g.loose, g.in_slot, g.total
    );
    print!(
        "plan: {} nodes, {} actions",
        outcome.report.order.len(),
        outcome.report.actions
    );
    if let Worker::Realtime(pool) = &ctx.worker {
        print!(", {} ticks over {} ant(s)", pool.ticks(), pool.ants().len());
    }
    println!();
}

fn print_dry_run(cfg: &ConfigFile, mode: Mode) -> Result<()> {
    let plan = cla4::build_plan()?;
    let order = plan.validate()?;

    println!("grainflow dry run");
    println!("mode: {mode:?}");
    println!(
        "table capacity: {}, grains: {}, ants: {}",
        cfg.table.capacity,
        cfg.grains.repo,
        cfg.ants.len()
    );
    println!();
    println!("Nodes:");
    for node in plan.nodes() {
        let deps: Vec<&str> = node.deps.iter().map(String::as_str).collect();
        println!("  - {}", node.id);
        println!("      after: {:?}", deps);
        for action in &node.actions {
            println!("      {action}");
        }
    }
    println!();
    println!("One valid order: {}", order.join(" -> "));
    Ok(())
}

// tests/cla4_end_to_end.rs

mod common;
use crate::common::builders::ConfigFileBuilder;
use crate::common::{assert_conserved, init_tracing, realtime_ctx, virtual_ctx, TestResult};

use grainflow::adder::cla4::{self, Readout};
use grainflow::adder::Bit;
use grainflow::config::ConfigFile;
use grainflow::engine::{ExecContext, Mode, Worker};
use grainflow::errors::GrainflowError;
use grainflow::resources::RowState;

const SAMPLE: [(u8, u8); 6] = [(0, 0), (13, 10), (15, 15), (7, 8), (1, 14), (9, 6)];

fn assert_released(ctx: &ExecContext) {
    for row in ctx.sim.table.rows() {
        assert_eq!(row.state, RowState::Free, "{} not freed", row.id);
        assert_eq!(row.occupancy, 0, "{} still occupied", row.id);
    }
    assert_conserved(&ctx.sim.grains);
    assert_eq!(ctx.sim.grains.stats().repo, ctx.sim.grains.capacity());
    assert_eq!(ctx.sim.board.realized_rows(), 0);
    ctx.check_released().expect("resources released");
}

#[test]
fn virtual_mode_adds_every_pair_of_nibbles() -> TestResult {
    init_tracing();
    let cfg = ConfigFile::default();

    for a in 0..=15u8 {
        for b in 0..=15u8 {
            let mut ctx = virtual_ctx(&cfg);
            let outcome = cla4::add(&mut ctx, a, b)?;
            assert_eq!(outcome.readout.value(), u32::from(a) + u32::from(b), "{a} + {b}");
            assert!(outcome.is_correct());
            assert_eq!(outcome.report.order.len(), 28);
            assert_released(&ctx);
        }
    }
    Ok(())
}

#[test]
fn carry_in_is_added() -> TestResult {
    let cfg = ConfigFile::default();
    for (a, b) in SAMPLE {
        let mut ctx = ExecContext::from_config(&cfg, Mode::Virtual, Bit::One)?;
        let outcome = cla4::add(&mut ctx, a, b)?;
        assert_eq!(outcome.readout.value(), u32::from(a) + u32::from(b) + 1);
        assert_released(&ctx);
    }
    Ok(())
}

#[test]
fn realtime_single_ant_matches_virtual() -> TestResult {
    init_tracing();
    let cfg = ConfigFile::default();

    for (a, b) in SAMPLE {
        let mut rt = realtime_ctx(&cfg);
        let mut vt = virtual_ctx(&cfg);
        let rt_out = cla4::add(&mut rt, a, b)?;
        let vt_out = cla4::add(&mut vt, a, b)?;

        assert_eq!(rt_out.readout, vt_out.readout, "{a} + {b}");
        assert!(rt_out.is_correct());
        assert_released(&rt);

        let Worker::Realtime(pool) = &rt.worker else {
            panic!("expected realtime worker");
        };
        assert!(pool.ticks() > 0);
        assert!(pool.is_idle());
        assert!(pool.ants().iter().all(|ant| ant.carrying().is_none()));
    }
    Ok(())
}

#[test]
fn realtime_multi_ant_rosters_match() -> TestResult {
    for ants in [2, 3, 5] {
        let cfg = ConfigFileBuilder::new().ants(ants, 4.0).build();
        for (a, b) in SAMPLE {
            let mut ctx = realtime_ctx(&cfg);
            let outcome = cla4::add(&mut ctx, a, b)?;
            assert!(outcome.is_correct(), "{ants} ants: {outcome}");
            assert_released(&ctx);
        }
    }
    Ok(())
}

#[test]
fn realtime_await_times_out_when_ants_are_too_slow() {
    let cfg = ConfigFileBuilder::new()
        .ant("snail", 0.0, 0.0, 0.001)
        .max_ticks(50)
        .build();
    let mut ctx = realtime_ctx(&cfg);

    let err = cla4::add(&mut ctx, 3, 4).unwrap_err();
    assert!(matches!(err, GrainflowError::Timeout { ticks: 50, .. }), "got {err:?}");
}

#[test]
fn too_few_rows_is_out_of_capacity() {
    let cfg = ConfigFileBuilder::new().capacity(3).ants(1, 4.0).build();
    let mut ctx = virtual_ctx(&cfg);

    let err = cla4::add(&mut ctx, 5, 5).unwrap_err();
    assert!(matches!(err, GrainflowError::OutOfCapacity(_)), "got {err:?}");
}

#[test]
fn too_few_grains_is_out_of_grains() {
    let cfg = ConfigFileBuilder::new().grains(10).ants(1, 4.0).build();
    let mut ctx = virtual_ctx(&cfg);

    let err = cla4::add(&mut ctx, 5, 5).unwrap_err();
    assert!(matches!(err, GrainflowError::OutOfGrains(_)), "got {err:?}");
    assert_conserved(&ctx.sim.grains);
}

#[test]
fn operands_must_fit_in_a_nibble() {
    let mut ctx = virtual_ctx(&ConfigFile::default());
    let err = cla4::add(&mut ctx, 16, 0).unwrap_err();
    assert!(matches!(err, GrainflowError::ConfigError(_)), "got {err:?}");
}

#[test]
fn plan_is_a_valid_dag_of_28_nodes() -> TestResult {
    let plan = cla4::build_plan()?;
    assert_eq!(plan.len(), 28);
    let order = plan.validate()?;
    assert_eq!(order.len(), 28);

    let free_10 = plan.node("FREE_10").expect("FREE_10");
    assert!(free_10.deps.contains("C2"));
    assert!(free_10.deps.contains("SC_20"));
    assert!(free_10.deps.contains("L2_30"));
    assert!(plan.dependents_of("L1_10").any(|id| id == "SC_20"));
    Ok(())
}

#[test]
fn readout_formats_carry_then_sum_bits() -> TestResult {
    let cfg = ConfigFile::default();
    let mut ctx = virtual_ctx(&cfg);
    let outcome = cla4::add(&mut ctx, 13, 10)?;

    assert_eq!(outcome.readout.to_string(), "1 0111");
    assert_eq!(outcome.to_string(), "13 + 10 = 23 (C4 S3 S2 S1 S0 = 1 0111)");
    assert_eq!(Readout::read(&ctx.cells)?, outcome.readout);
    Ok(())
}

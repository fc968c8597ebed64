// tests/keys_cells_actions.rs

mod common;
use crate::common::{assert_conserved, init_tracing, realtime_ctx, virtual_ctx, TestResult};

use grainflow::adder::{Bit, Gp, GpPart};
use grainflow::config::ConfigFile;
use grainflow::dag::Executable;
use grainflow::engine::{Action, CellStore, CellValue, ExecContext, Op};
use grainflow::errors::GrainflowError;
use grainflow::geometry::Vec2;
use grainflow::resources::{
    BoardLayout, MemKey, MemoryBoard, RowId, RowState, RowTemplate, Site, VarKind,
};

#[test]
fn mem_keys_parse_and_print() -> TestResult {
    let range: MemKey = "G[2:0]".parse()?;
    assert_eq!(range, MemKey::range(VarKind::G, 2, 0)?);
    assert_eq!(range.to_string(), "G[2:0]");
    assert_eq!(range.required_grains(), 4);
    assert_eq!(
        range.required_sites(),
        [Site::Var, Site::Value, Site::IdxLo, Site::IdxHi]
    );

    let single: MemKey = "C3".parse()?;
    assert_eq!(single.to_string(), "C3");
    assert!(single.span.is_single());
    assert_eq!(single.required_grains(), 3);
    assert_eq!(single.required_sites(), [Site::Var, Site::Value, Site::IdxLo]);

    assert!(matches!(
        "G[0:2]".parse::<MemKey>(),
        Err(GrainflowError::InvalidTransition(_))
    ));
    assert!(matches!(
        "X1".parse::<MemKey>(),
        Err(GrainflowError::UnknownEntity(_))
    ));
    assert!(MemKey::range(VarKind::P, 1, 3).is_err());
    Ok(())
}

#[test]
fn cells_distinguish_unknown_from_unwritten() -> TestResult {
    let mut cells = CellStore::new();
    cells.declare("X");

    assert!(matches!(cells.get("Y"), Err(GrainflowError::UnknownEntity(_))));
    assert!(matches!(cells.get("X"), Err(GrainflowError::InvalidTransition(_))));
    assert!(matches!(
        cells.write("Y", CellValue::Bit(Bit::One)),
        Err(GrainflowError::UnknownEntity(_))
    ));

    cells.write("X", CellValue::Bit(Bit::One))?;
    assert_eq!(cells.read_bit("X")?, Bit::One);
    // Writes are not write-once.
    cells.write("X", CellValue::Row(RowId(2)))?;
    assert_eq!(cells.read_row("X")?, RowId(2));
    assert!(matches!(cells.read_pair("X"), Err(GrainflowError::InvalidTransition(_))));

    cells.declare("X");
    assert_eq!(cells.read_row("X")?, RowId(2));
    Ok(())
}

#[test]
fn arithmetic_actions_compute_through_cells() -> TestResult {
    init_tracing();
    let mut ctx = virtual_ctx(&ConfigFile::default());
    for id in ["a", "b", "p", "g", "gp", "hi", "pfx", "c", "s"] {
        ctx.cells.declare(id);
    }
    ctx.cells.write("a", CellValue::Bit(Bit::One))?;
    ctx.cells.write("b", CellValue::Bit(Bit::One))?;
    ctx.cells.write("hi", CellValue::Pair(Gp::new(Bit::Zero, Bit::One)))?;
    ctx.c0 = Bit::Zero;

    let ops = [
        Op::ComputeP { a: "a".into(), b: "b".into(), out: "p".into() },
        Op::ComputeG { a: "a".into(), b: "b".into(), out: "g".into() },
        Op::MaterializeGp { g: "g".into(), p: "p".into(), out: "gp".into() },
        Op::CombineGp { right: "hi".into(), left: "gp".into(), out: "pfx".into() },
        Op::CarryFromPrefix { prefix: "pfx".into(), out: "c".into() },
        Op::SumFromPc { p: "p".into(), c: "c".into(), out: "s".into() },
    ];
    for (i, op) in ops.into_iter().enumerate() {
        Action::new(format!("op{i}"), op).execute(&mut ctx)?;
    }

    assert_eq!(ctx.cells.read_bit("p")?, Bit::Zero);
    assert_eq!(ctx.cells.read_bit("g")?, Bit::One);
    // (G=0,P=1) ∘ (G=1,P=0) = (1, 0)
    assert_eq!(ctx.cells.read_pair("pfx")?, Gp::new(Bit::One, Bit::Zero));
    assert_eq!(ctx.cells.read_bit("c")?, Bit::One);
    assert_eq!(ctx.cells.read_bit("s")?, Bit::One);
    Ok(())
}

#[test]
fn scratch_actions_drive_the_row_state_machine() -> TestResult {
    let mut ctx = virtual_ctx(&ConfigFile::default());
    ctx.cells.declare("ROW");
    ctx.cells.declare("pair");
    ctx.cells.write("pair", CellValue::Pair(Gp::new(Bit::One, Bit::Zero)))?;
    let key = MemKey::range(VarKind::G, 1, 0)?;

    let run = |ctx: &mut grainflow::engine::ExecContext, op: Op| Action::new("t", op).execute(ctx);

    run(&mut ctx, Op::AllocScratch { key, out: "ROW".into() })?;
    let row = ctx.cells.read_row("ROW")?;
    assert_eq!(ctx.sim.table.row(row)?.state, RowState::Reserved);

    run(&mut ctx, Op::MarkScratchBusy { row: "ROW".into() })?;
    run(&mut ctx, Op::SetScratchValue { row: "ROW".into(), value: Bit::Zero })?;
    run(
        &mut ctx,
        Op::SetScratchValueFromPair { row: "ROW".into(), pair: "pair".into(), which: GpPart::G },
    )?;
    run(&mut ctx, Op::MarkScratchReady { row: "ROW".into() })?;
    let r = ctx.sim.table.row(row)?;
    assert_eq!((r.state, r.value), (RowState::Ready, Some(Bit::One)));

    run(&mut ctx, Op::IncScratchOccupancy { row: "ROW".into(), by: 2 })?;
    run(&mut ctx, Op::BeginScratchClear { row: "ROW".into() })?;
    run(&mut ctx, Op::DecScratchOccupancy { row: "ROW".into(), by: 2 })?;
    assert_eq!(ctx.sim.table.row(row)?.state, RowState::Free);

    let err = run(&mut ctx, Op::MarkScratchReady { row: "missing".into() }).unwrap_err();
    assert!(matches!(err, GrainflowError::UnknownEntity(_)), "got {err:?}");
    Ok(())
}

#[test]
fn fill_and_clear_actions_round_trip_in_virtual_mode() -> TestResult {
    let mut ctx = virtual_ctx(&ConfigFile::default());
    ctx.cells.declare("ROW");
    ctx.cells.declare("pair");
    ctx.cells.write("pair", CellValue::Pair(Gp::new(Bit::One, Bit::One)))?;
    let key = MemKey::range(VarKind::G, 3, 2)?;

    let steps = [
        Op::AllocScratch { key, out: "ROW".into() },
        Op::EnqueueFillRow { row: "ROW".into(), pair: "pair".into(), which: GpPart::P, key },
        Op::AwaitRowReady { row: "ROW".into() },
    ];
    for op in steps {
        Action::new("fill", op).execute(&mut ctx)?;
    }
    let row = ctx.cells.read_row("ROW")?;
    assert_eq!(ctx.sim.table.row(row)?.occupancy, 4);
    assert_eq!(ctx.sim.grains.stats().in_slot, 4);

    Action::new("clear", Op::EnqueueClearRow { row: "ROW".into() }).execute(&mut ctx)?;
    Action::new("freed", Op::AwaitRowFreed { row: "ROW".into() }).execute(&mut ctx)?;
    ctx.check_released()?;
    Ok(())
}

#[test]
fn fill_rejects_a_key_the_row_does_not_hold() -> TestResult {
    let mut ctx = virtual_ctx(&ConfigFile::default());
    ctx.cells.declare("ROW");
    ctx.cells.declare("pair");
    ctx.cells.write("pair", CellValue::Pair(Gp::new(Bit::One, Bit::One)))?;

    Action::new("a", Op::AllocScratch { key: MemKey::range(VarKind::G, 1, 0)?, out: "ROW".into() })
        .execute(&mut ctx)?;
    let err = Action::new(
        "f",
        Op::EnqueueFillRow {
            row: "ROW".into(),
            pair: "pair".into(),
            which: GpPart::G,
            key: MemKey::range(VarKind::G, 3, 0)?,
        },
    )
    .execute(&mut ctx)
    .unwrap_err();
    assert!(matches!(err, GrainflowError::InvalidTransition(_)), "got {err:?}");
    Ok(())
}

#[test]
fn board_places_cla4_rows_on_a_grid() -> TestResult {
    let layout = BoardLayout {
        origin: Vec2::new(1.0, 1.0),
        dx: 2.0,
        dy: 3.0,
    };
    let mut board = MemoryBoard::cla4_default(layout)?;
    let key = MemKey::range(VarKind::G, 2, 0)?;
    assert!(board.has_template_for(&key));

    // [2:0] is the third row of the grid.
    let sites = board.realize(key, RowId(1))?;
    assert_eq!(sites.position(Site::Var)?, Vec2::new(1.0, 7.0));
    assert_eq!(sites.position(Site::IdxHi)?, Vec2::new(5.0, 7.0));
    assert_eq!(sites.position(Site::Value)?, Vec2::new(7.0, 7.0));
    assert_eq!(board.realized_rows(), 1);

    // Keys without a template get their row's own line below the grid.
    let single = MemKey::new(VarKind::C, grainflow::resources::Span::single(1));
    assert!(!board.has_template_for(&single));
    let sites = board.realize(single, RowId(2))?;
    assert_eq!(sites.position(Site::Var)?, Vec2::new(1.0, 19.0));
    assert_eq!(sites.position(Site::Value)?, Vec2::new(7.0, 19.0));
    assert!(matches!(sites.position(Site::IdxHi), Err(GrainflowError::UnknownEntity(_))));

    board.set_template(
        single,
        RowTemplate {
            var: Vec2::ORIGIN,
            idx_lo: Vec2::ORIGIN,
            idx_hi: Some(Vec2::ORIGIN),
            value: Vec2::ORIGIN,
        },
    );
    let sites = board.realize(single, RowId(2))?;
    assert!(matches!(sites.position(Site::IdxHi), Err(GrainflowError::UnknownEntity(_))));

    assert!(board.remove(RowId(1)).is_some());
    assert!(matches!(board.sites(RowId(1)), Err(GrainflowError::UnknownEntity(_))));
    Ok(())
}

fn fill_then_clear(ctx: &mut ExecContext, key: MemKey) -> TestResult {
    ctx.cells.declare("ROW");
    ctx.cells.declare("pair");
    ctx.cells.write("pair", CellValue::Pair(Gp::new(Bit::Zero, Bit::One)))?;

    for op in [
        Op::AllocScratch { key, out: "ROW".into() },
        Op::EnqueueFillRow { row: "ROW".into(), pair: "pair".into(), which: GpPart::P, key },
        Op::AwaitRowReady { row: "ROW".into() },
    ] {
        Action::new("fill", op).execute(ctx)?;
    }
    let row = ctx.cells.read_row("ROW")?;
    let r = ctx.sim.table.row(row)?;
    assert_eq!((r.state, r.value), (RowState::Ready, Some(Bit::One)));
    assert_eq!(r.occupancy as usize, key.required_grains());

    for op in [
        Op::EnqueueClearRow { row: "ROW".into() },
        Op::AwaitRowFreed { row: "ROW".into() },
    ] {
        Action::new("clear", op).execute(ctx)?;
    }
    ctx.settle()?;
    ctx.check_released()?;
    assert_eq!(ctx.sim.board.realized_rows(), 0);
    assert_conserved(&ctx.sim.grains);
    Ok(())
}

#[test]
fn single_bit_rows_fill_and_clear_in_both_modes() -> TestResult {
    init_tracing();
    let cfg = ConfigFile::default();
    for text in ["P2", "C3"] {
        let key: MemKey = text.parse()?;
        fill_then_clear(&mut virtual_ctx(&cfg), key)?;
        fill_then_clear(&mut realtime_ctx(&cfg), key)?;
    }
    Ok(())
}

#[test]
fn bits_convert_only_from_zero_or_one() -> TestResult {
    assert_eq!(Bit::try_from(0)?, Bit::Zero);
    assert_eq!(Bit::try_from(1)?, Bit::One);
    assert!(matches!(Bit::try_from(2), Err(GrainflowError::ConfigError(_))));
    Ok(())
}

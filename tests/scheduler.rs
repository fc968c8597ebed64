// tests/scheduler.rs

mod common;
use crate::common::builders::PlanBuilder;
use crate::common::{init_tracing, TestResult};

use grainflow::dag::{NodeRunState, Scheduler};
use grainflow::errors::GrainflowError;
use grainflow_test_utils::recording::ActionLog;

fn is_graph_error<T: std::fmt::Debug>(r: &grainflow::errors::Result<T>) -> bool {
    matches!(r, Err(GrainflowError::GraphError(_)))
}

#[test]
fn two_node_cycle_runs_nothing() {
    init_tracing();
    let plan = PlanBuilder::new()
        .node("A", &["B"])
        .node("B", &["A"])
        .build();
    let mut log = ActionLog::default();

    let result = Scheduler::new().run(&plan, &mut log);
    assert!(is_graph_error(&result), "got {result:?}");
    assert!(log.executed.is_empty());
}

#[test]
fn cycle_elsewhere_in_the_plan_still_runs_nothing() {
    let plan = PlanBuilder::new()
        .node("root", &[])
        .node("X", &["root", "Z"])
        .node("Y", &["X"])
        .node("Z", &["Y"])
        .build();
    let mut log = ActionLog::default();

    assert!(is_graph_error(&Scheduler::new().run(&plan, &mut log)));
    assert!(log.executed.is_empty());
}

#[test]
fn malformed_plans_are_graph_errors() {
    let cases = [
        PlanBuilder::new().node("A", &["missing"]).build(),
        PlanBuilder::new().node("A", &["A"]).build(),
        PlanBuilder::new().node("A", &[]).node("A", &[]).build(),
    ];
    for plan in cases {
        let mut log = ActionLog::default();
        let result = Scheduler::new().run(&plan, &mut log);
        assert!(is_graph_error(&result), "got {result:?}");
        assert!(log.executed.is_empty());
    }
}

#[test]
fn nodes_complete_after_their_dependencies() -> TestResult {
    let plan = PlanBuilder::new()
        .node("C", &["B"])
        .node("B", &["A"])
        .node("D", &[])
        .node("A", &[])
        .build();
    let mut log = ActionLog::default();
    let mut scheduler = Scheduler::new();

    let report = scheduler.run(&plan, &mut log)?;

    assert_eq!(report.order, ["D", "A", "B", "C"]);
    assert_eq!(report.actions, 4);
    assert_eq!(log.executed, report.order);
    for id in ["A", "B", "C", "D"] {
        assert_eq!(scheduler.run_state_of(id), Some(NodeRunState::Done));
        assert_eq!(scheduler.deps_satisfied(id), Some(true));
    }
    assert_eq!(scheduler.run_state_of("nope"), None);
    Ok(())
}

#[test]
fn a_node_runs_its_actions_in_order_without_interleaving() -> TestResult {
    let plan = PlanBuilder::new()
        .node_with_actions("first", &[], 3)
        .node_with_actions("second", &[], 2)
        .node("last", &["first", "second"])
        .build();
    let mut log = ActionLog::default();

    Scheduler::new().run(&plan, &mut log)?;

    assert_eq!(
        log.executed,
        ["first.0", "first.1", "first.2", "second.0", "second.1", "last"]
    );
    Ok(())
}

#[test]
fn an_action_error_aborts_the_run() {
    let plan = PlanBuilder::new()
        .node("A", &[])
        .failing_node("B", &["A"])
        .node("C", &["B"])
        .node("D", &["A"])
        .build();
    let mut log = ActionLog::default();
    let mut scheduler = Scheduler::new();

    let err = scheduler.run(&plan, &mut log).unwrap_err();
    assert!(matches!(err, GrainflowError::InvalidTransition(_)), "got {err:?}");

    assert_eq!(log.executed, ["A"]);
    assert_eq!(scheduler.run_state_of("A"), Some(NodeRunState::Done));
    assert_eq!(scheduler.run_state_of("B"), Some(NodeRunState::Failed));
    assert_eq!(scheduler.run_state_of("C"), Some(NodeRunState::Pending));
    assert_eq!(scheduler.run_state_of("D"), Some(NodeRunState::Pending));
    assert_eq!(scheduler.deps_satisfied("C"), Some(false));
}

#[test]
fn empty_plan_is_a_no_op() -> TestResult {
    let plan = PlanBuilder::new().build();
    let mut log = ActionLog::default();
    let report = Scheduler::new().run(&plan, &mut log)?;
    assert!(report.order.is_empty());
    Ok(())
}

#[test]
fn scheduler_can_be_reused_across_runs() -> TestResult {
    let mut scheduler = Scheduler::new();
    let mut log = ActionLog::default();

    scheduler.run(&PlanBuilder::new().node("A", &[]).build(), &mut log)?;
    scheduler.run(&PlanBuilder::new().node("B", &[]).build(), &mut log)?;

    assert_eq!(scheduler.runs(), 2);
    assert_eq!(scheduler.run_state_of("A"), None);
    assert_eq!(scheduler.run_state_of("B"), Some(NodeRunState::Done));
    assert_eq!(log.executed, ["A", "B"]);
    Ok(())
}

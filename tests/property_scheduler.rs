// tests/property_scheduler.rs

use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;

use grainflow::dag::{NodeRunState, Plan, PlanNode, Scheduler};
use grainflow_test_utils::recording::{ActionLog, RecordingAction};

/// Acyclic plan: node `i` may only depend on nodes `0..i`. Nodes are then
/// listed in a shuffled order so plan order does not match a valid order.
fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = Plan<RecordingAction>> {
    (1..=max_nodes).prop_flat_map(|n| {
        let deps = proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), n);
        let listing = Just((0..n).collect::<Vec<_>>()).prop_shuffle();
        (deps, listing).prop_map(move |(raw_deps, listing)| {
            let nodes: Vec<PlanNode<RecordingAction>> = raw_deps
                .into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    let deps: BTreeSet<String> = potential
                        .into_iter()
                        .filter(|_| i > 0)
                        .map(|d| format!("n{}", d % i))
                        .collect();
                    let id = format!("n{i}");
                    PlanNode::new(id.clone())
                        .after(deps)
                        .action(RecordingAction::new(&id))
                })
                .collect();
            let mut slots: Vec<Option<PlanNode<RecordingAction>>> =
                nodes.into_iter().map(Some).collect();
            Plan::from_nodes(listing.into_iter().filter_map(|i| slots[i].take()))
        })
    })
}

proptest! {
    #[test]
    fn every_node_completes_once_after_its_dependencies(plan in dag_strategy(12)) {
        let mut log = ActionLog::default();
        let mut scheduler = Scheduler::new();

        let report = scheduler.run(&plan, &mut log).expect("acyclic plan runs");

        prop_assert_eq!(report.order.len(), plan.len());
        prop_assert_eq!(&log.executed, &report.order);

        let position: HashMap<&str, usize> = report
            .order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        prop_assert_eq!(position.len(), plan.len(), "a node ran twice");

        for node in plan.nodes() {
            prop_assert_eq!(scheduler.run_state_of(&node.id), Some(NodeRunState::Done));
            for dep in &node.deps {
                prop_assert!(
                    position[dep.as_str()] < position[node.id.as_str()],
                    "{} ran before its dependency {}", node.id, dep
                );
            }
        }
    }

    #[test]
    fn a_back_edge_makes_the_whole_plan_inert(plan in dag_strategy(8)) {
        prop_assume!(plan.len() >= 2);
        // Close a loop between the first two listed nodes.
        let mut nodes: Vec<PlanNode<RecordingAction>> = plan.nodes().to_vec();
        let (a, b) = (nodes[0].id.clone(), nodes[1].id.clone());
        nodes[0].deps.insert(b);
        nodes[1].deps.insert(a);
        let cyclic = Plan::from_nodes(nodes);

        let mut log = ActionLog::default();
        prop_assert!(Scheduler::new().run(&cyclic, &mut log).is_err());
        prop_assert!(log.executed.is_empty());
    }
}

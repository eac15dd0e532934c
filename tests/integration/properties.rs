//! Ordering and determinism over generated acyclic stacks

use proptest::prelude::*;
use std::collections::BTreeSet;

use stacksynth::core::ResourceType;
use stacksynth::resolver::DependencyGraph;
use stacksynth::stack::{Reference, ResourceNode, Stack, Value};
use stacksynth::synth::Synthesizer;
use stacksynth::test_utils::fixtures;

/// Edges as `(dependent, dependency)` with `dependency < dependent`, so never cyclic.
fn edges_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..10).prop_flat_map(|count| {
        let pairs: Vec<(usize, usize)> =
            (0..count).flat_map(|i| (0..i).map(move |j| (i, j))).collect();
        let len = pairs.len();
        (Just(count), proptest::sample::subsequence(pairs, 0..=len))
    })
}

fn node_id(i: usize) -> String {
    format!("t{i}")
}

fn nodes(count: usize, edges: &[(usize, usize)]) -> Vec<ResourceNode> {
    (0..count)
        .map(|i| {
            let refs: Vec<Value> = edges
                .iter()
                .filter(|(from, _)| *from == i)
                .map(|(_, to)| Reference::new(node_id(*to), "name").into())
                .collect();
            let node = ResourceNode::new(node_id(i), ResourceType::Topic);
            if refs.is_empty() {
                node
            } else {
                node.with_property("DisplayName", Value::join(",", refs))
            }
        })
        .collect()
}

fn stack(nodes: Vec<ResourceNode>) -> Stack {
    let mut stack = Stack::new("Generated", fixtures::context());
    for node in nodes {
        stack.add(node).unwrap();
    }
    stack
}

proptest! {
    #[test]
    fn prop_registration_order_does_not_change_output(
        (count, edges) in edges_strategy(),
        seed in any::<u64>(),
    ) {
        let forward = nodes(count, &edges);
        let mut shuffled = forward.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        if seed % 2 == 0 {
            shuffled.reverse();
        }

        let a = Synthesizer::new().synthesize(&stack(forward)).unwrap();
        let b = Synthesizer::new().synthesize(&stack(shuffled)).unwrap();
        prop_assert_eq!(a.template.to_json_pretty().unwrap(), b.template.to_json_pretty().unwrap());
        prop_assert_eq!(a.order, b.order);
    }

    #[test]
    fn prop_dependencies_precede_dependents((count, edges) in edges_strategy()) {
        let result = Synthesizer::new().synthesize(&stack(nodes(count, &edges))).unwrap();
        let position = |id: &str| result.order.iter().position(|n| n == id).unwrap();

        prop_assert_eq!(result.order.len(), count);
        for (from, to) in &edges {
            prop_assert!(position(&node_id(*to)) < position(&node_id(*from)));
        }
    }

    #[test]
    fn prop_levels_partition_nodes((count, edges) in edges_strategy()) {
        let graph = DependencyGraph::build(&stack(nodes(count, &edges))).unwrap();
        let levels = graph.levels().unwrap();

        let mut seen = BTreeSet::new();
        for (depth, level) in levels.iter().enumerate() {
            prop_assert!(!level.is_empty());
            for id in level {
                prop_assert!(seen.insert(id.clone()));
                for dep in graph.get_direct_deps(id) {
                    let dep_depth = levels.iter().position(|l| l.contains(&dep)).unwrap();
                    prop_assert!(dep_depth < depth);
                }
            }
        }
        prop_assert_eq!(seen.len(), count);
    }
}

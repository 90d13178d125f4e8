// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dependency-ordered traversal of a node's transitive inputs.

use indexmap::IndexSet;

use crate::graph::Graph;
use crate::node::NodeId;
use crate::slot::SlotConnection;

/// Collects `root` and everything it transitively reads from, in
/// dependency order: every node appears after all of its inputs, exactly
/// once, with `root` last.
///
/// Traversal follows public slots, and additionally traversable hidden
/// slots when `include_hidden` is set. Defaulted single slots are not
/// followed, so hidden default nodes never show up in the result.
pub fn transitive_closure(graph: &Graph, root: NodeId, include_hidden: bool) -> Vec<NodeId> {
    let mut visited = IndexSet::new();
    let mut order = Vec::new();
    visit(graph, root, include_hidden, &mut visited, &mut order);
    order
}

fn visit(
    graph: &Graph,
    node: NodeId,
    include_hidden: bool,
    visited: &mut IndexSet<NodeId>,
    order: &mut Vec<NodeId>,
) {
    if !graph.contains(node) || !visited.insert(node) {
        return;
    }
    for slot in graph.slots(node) {
        if !(slot.public || (include_hidden && slot.traversable)) {
            continue;
        }
        match &slot.connection {
            SlotConnection::Multi(list) => {
                for target in list.clone() {
                    visit(graph, target, include_hidden, visited, order);
                }
            }
            SlotConnection::Single(Some(target)) => {
                visit(graph, *target, include_hidden, visited, order);
            }
            SlotConnection::Single(None) => {}
        }
    }
    order.push(node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, NodeOp, OpCtx};
    use crate::slot::{SlotKind, SlotSpec};
    use crate::value::{StaticValueOp, Value, ValueKind};
    use std::any::Any;

    /// Node with one public, one hidden-traversable and one untraversable
    /// input, all accepting anything.
    struct Hub;

    impl NodeOp for Hub {
        fn kind(&self) -> NodeKind {
            NodeKind::Value(ValueKind::Float)
        }

        fn initial_slots(&self) -> Vec<SlotSpec> {
            vec![
                SlotSpec::new("shown", SlotKind::Any),
                SlotSpec::new("internal", SlotKind::Any).hidden(),
                SlotSpec::new("detached", SlotKind::Any).hidden().untraversable(),
            ]
        }

        fn operate(&mut self, _ctx: &mut OpCtx<'_>) {}

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn float_node(graph: &mut Graph, value: f32) -> NodeId {
        graph.add_node(Box::new(StaticValueOp::new(Value::Float(value))))
    }

    #[test]
    fn test_dependencies_come_before_dependants() {
        let mut graph = Graph::new();
        let leaf = float_node(&mut graph, 1.0);
        let mid = graph.add_node(Box::new(Hub));
        let root = graph.add_node(Box::new(Hub));
        graph.connect(mid, "shown", Some(leaf)).unwrap();
        graph.connect(root, "shown", Some(mid)).unwrap();
        let order = transitive_closure(&graph, root, false);
        assert_eq!(order, vec![leaf, mid, root]);
    }

    #[test]
    fn test_shared_dependency_appears_once() {
        let mut graph = Graph::new();
        let shared = float_node(&mut graph, 1.0);
        let left = graph.add_node(Box::new(Hub));
        let right = graph.add_node(Box::new(Hub));
        let root = graph.add_node(Box::new(Hub));
        graph.connect(left, "shown", Some(shared)).unwrap();
        graph.connect(right, "shown", Some(shared)).unwrap();
        graph.connect(root, "shown", Some(left)).unwrap();
        graph.connect(root, "internal", Some(right)).unwrap();
        let order = transitive_closure(&graph, root, true);
        assert_eq!(order.iter().filter(|n| **n == shared).count(), 1);
        assert_eq!(order.last(), Some(&root));
        let shared_pos = order.iter().position(|n| *n == shared).unwrap();
        let left_pos = order.iter().position(|n| *n == left).unwrap();
        let right_pos = order.iter().position(|n| *n == right).unwrap();
        assert!(shared_pos < left_pos && shared_pos < right_pos);
    }

    #[test]
    fn test_hidden_slots_need_opt_in() {
        let mut graph = Graph::new();
        let seen = float_node(&mut graph, 1.0);
        let hidden = float_node(&mut graph, 2.0);
        let detached = float_node(&mut graph, 3.0);
        let root = graph.add_node(Box::new(Hub));
        graph.connect(root, "shown", Some(seen)).unwrap();
        graph.connect(root, "internal", Some(hidden)).unwrap();
        graph.connect(root, "detached", Some(detached)).unwrap();
        let shallow = transitive_closure(&graph, root, false);
        assert_eq!(shallow, vec![seen, root]);
        let deep = transitive_closure(&graph, root, true);
        assert!(deep.contains(&hidden));
        assert!(!deep.contains(&detached));
    }

    #[test]
    fn test_default_nodes_stay_out_of_the_closure() {
        let mut graph = Graph::new();
        let root = graph.add_node(Box::new(Hub));
        let order = transitive_closure(&graph, root, true);
        assert_eq!(order, vec![root]);
    }
}

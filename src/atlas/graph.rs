use std::collections::BTreeMap;

use eframe::egui::Pos2;

use super::snapshot::{NodeKey, NodeStatus, SNAPSHOT_CEILING, Snapshot};

#[derive(Clone, Debug)]
pub struct GraphNode {
    pub position: Pos2,
    pub status: NodeStatus,
    pub neighbors: Vec<NodeKey>,
}

/// Undirected adjacency plus per-node position and status for one frame.
///
/// Every key in a neighbor list is itself a node of the graph, lists never
/// contain their own key, and `a` lists `b` exactly when `b` lists `a`.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: BTreeMap<NodeKey, GraphNode>,
    edge_count: usize,
}

impl Graph {
    /// Builds the graph for one snapshot. Malformed records are dropped and
    /// record lists over [`SNAPSHOT_CEILING`] are ignored wholesale.
    pub fn build(snapshot: &Snapshot) -> Self {
        if snapshot.nodes.len() > SNAPSHOT_CEILING {
            return Self::default();
        }

        let mut nodes = BTreeMap::new();
        for record in snapshot.nodes.iter().filter(|record| record.is_valid()) {
            nodes.insert(
                record.key,
                GraphNode {
                    position: record.position,
                    status: record.status,
                    neighbors: Vec::with_capacity(4),
                },
            );
        }

        let connections = if snapshot.connections.len() > SNAPSHOT_CEILING {
            &[][..]
        } else {
            snapshot.connections.as_slice()
        };

        let mut edge_count = 0usize;
        for connection in connections {
            let source = connection.key;
            if !nodes.contains_key(&source) {
                continue;
            }

            for &target in &connection.neighbors {
                if target.is_null() || target == source || !nodes.contains_key(&target) {
                    continue;
                }

                let added_forward = link(&mut nodes, source, target);
                let added_backward = link(&mut nodes, target, source);
                if added_forward || added_backward {
                    edge_count += 1;
                }
            }
        }

        for node in nodes.values_mut() {
            node.neighbors.sort_unstable();
        }

        Self { nodes, edge_count }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn node(&self, key: NodeKey) -> Option<&GraphNode> {
        self.nodes.get(&key)
    }

    pub fn position(&self, key: NodeKey) -> Option<Pos2> {
        self.nodes.get(&key).map(|node| node.position)
    }

    /// Status of `key`; absent nodes read as neither completed nor accessible.
    pub fn status(&self, key: NodeKey) -> NodeStatus {
        self.nodes
            .get(&key)
            .map(|node| node.status)
            .unwrap_or_default()
    }

    pub fn neighbors(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(&key)
            .map(|node| node.neighbors.as_slice())
            .unwrap_or_default()
    }

    /// Node centers in ascending key order.
    pub fn positions(&self) -> impl Iterator<Item = (NodeKey, Pos2)> + '_ {
        self.nodes.iter().map(|(key, node)| (*key, node.position))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &GraphNode)> + '_ {
        self.nodes.iter().map(|(key, node)| (*key, node))
    }
}

fn link(nodes: &mut BTreeMap<NodeKey, GraphNode>, from: NodeKey, to: NodeKey) -> bool {
    let Some(node) = nodes.get_mut(&from) else {
        return false;
    };
    if node.neighbors.contains(&to) {
        return false;
    }
    node.neighbors.push(to);
    true
}

/// Key of the position closest to `point`; the first of equally close keys wins.
pub fn nearest(point: Pos2, positions: impl IntoIterator<Item = (NodeKey, Pos2)>) -> Option<NodeKey> {
    let mut best: Option<(NodeKey, f32)> = None;
    for (key, position) in positions {
        let distance = point.distance_sq(position);
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((key, distance));
        }
    }
    best.map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;
    use proptest::prelude::*;
    use rstest::rstest;

    use super::super::demo::demo_snapshot;
    use super::super::snapshot::arbitrary::noisy_snapshot;
    use super::super::snapshot::{ConnectionRecord, NodeRecord};
    use super::*;

    fn node(key: NodeKey, x: f32, y: f32) -> NodeRecord {
        NodeRecord {
            key,
            position: pos2(x, y),
            status: NodeStatus::default(),
            name: None,
            biome: None,
        }
    }

    fn assert_symmetric_without_self_loops(graph: &Graph) {
        for (key, node) in graph.iter() {
            assert!(!node.neighbors.contains(&key), "{key:?} lists itself");
            for neighbor in &node.neighbors {
                assert!(graph.contains(*neighbor), "{neighbor:?} is dangling");
                assert!(
                    graph.neighbors(*neighbor).contains(&key),
                    "{neighbor:?} does not list {key:?}"
                );
            }
        }
    }

    proptest! {
        #[test]
        fn built_graphs_are_symmetric_loop_free_and_sentinel_free(snapshot in noisy_snapshot(20, 4)) {
            let graph = Graph::build(&snapshot);
            prop_assert!(!graph.contains(NodeKey::NULL));
            prop_assert_eq!(
                graph.node_count(),
                snapshot.nodes.iter().filter(|record| record.is_valid()).count()
            );

            let mut listed = 0usize;
            for (key, node) in graph.iter() {
                prop_assert!(!node.neighbors.contains(&key), "{:?} lists itself", key);
                prop_assert!(node.neighbors.windows(2).all(|pair| pair[0] < pair[1]));
                for &neighbor in &node.neighbors {
                    prop_assert!(!neighbor.is_null());
                    prop_assert!(graph.contains(neighbor), "{:?} is dangling", neighbor);
                    prop_assert!(graph.neighbors(neighbor).contains(&key));
                }
                listed += node.neighbors.len();
            }
            prop_assert_eq!(listed, graph.edge_count() * 2);
        }

        #[test]
        fn every_link_between_known_cells_becomes_an_edge(snapshot in noisy_snapshot(20, 4)) {
            let graph = Graph::build(&snapshot);
            for connection in &snapshot.connections {
                for &target in &connection.neighbors {
                    if target.is_null()
                        || target == connection.key
                        || !graph.contains(target)
                        || !graph.contains(connection.key)
                    {
                        continue;
                    }
                    prop_assert!(graph.neighbors(connection.key).contains(&target));
                    prop_assert!(graph.neighbors(target).contains(&connection.key));
                }
            }
        }
    }

    #[test]
    fn one_sided_edges_become_symmetric() {
        let a = NodeKey(1, 1);
        let b = NodeKey(1, 2);
        let snapshot = Snapshot {
            nodes: vec![node(a, 0.0, 0.0), node(b, 10.0, 0.0)],
            connections: vec![ConnectionRecord::new(a, &[b])],
            viewer: None,
        };

        let graph = Graph::build(&snapshot);
        assert_eq!(graph.neighbors(a), &[b]);
        assert_eq!(graph.neighbors(b), &[a]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn self_loops_null_slots_and_dangling_neighbors_are_dropped() {
        let a = NodeKey(1, 1);
        let b = NodeKey(1, 2);
        let ghost = NodeKey(9, 9);
        let snapshot = Snapshot {
            nodes: vec![node(a, 0.0, 0.0), node(b, 10.0, 0.0)],
            connections: vec![
                ConnectionRecord::new(a, &[a, NodeKey::NULL, ghost, b]),
                ConnectionRecord::new(ghost, &[a, b]),
            ],
            viewer: None,
        };

        let graph = Graph::build(&snapshot);
        assert_eq!(graph.neighbors(a), &[b]);
        assert_eq!(graph.neighbors(b), &[a]);
        assert!(!graph.contains(ghost));
        assert!(!graph.contains(NodeKey::NULL));
    }

    #[test]
    fn duplicate_and_mirrored_records_do_not_grow_lists() {
        let a = NodeKey(1, 1);
        let b = NodeKey(1, 2);
        let snapshot = Snapshot {
            nodes: vec![node(a, 0.0, 0.0), node(b, 10.0, 0.0)],
            connections: vec![
                ConnectionRecord::new(a, &[b, b]),
                ConnectionRecord::new(b, &[a]),
                ConnectionRecord::new(a, &[b]),
            ],
            viewer: None,
        };

        let graph = Graph::build(&snapshot);
        assert_eq!(graph.neighbors(a).len(), 1);
        assert_eq!(graph.neighbors(b).len(), 1);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn invalid_node_records_are_skipped_without_aborting() {
        let snapshot = Snapshot {
            nodes: vec![
                node(NodeKey::NULL, 0.0, 0.0),
                node(NodeKey(1, 1), f32::NAN, 0.0),
                node(NodeKey(1, 2), 5.0, 5.0),
            ],
            connections: vec![ConnectionRecord::new(NodeKey(1, 2), &[NodeKey(1, 1)])],
            viewer: None,
        };

        let graph = Graph::build(&snapshot);
        assert_eq!(graph.node_count(), 1);
        assert!(graph.neighbors(NodeKey(1, 2)).is_empty());
    }

    #[test]
    fn status_defaults_to_false_for_unknown_nodes() {
        let graph = Graph::build(&Snapshot::default());
        assert_eq!(graph.status(NodeKey(4, 4)), NodeStatus::default());
        assert!(graph.neighbors(NodeKey(4, 4)).is_empty());
        assert!(graph.is_empty());
    }

    #[test]
    fn oversized_node_list_yields_empty_graph() {
        let nodes = (0..=SNAPSHOT_CEILING as i32)
            .map(|i| node(NodeKey(i + 1, 1), i as f32, 0.0))
            .collect();
        let snapshot = Snapshot {
            nodes,
            connections: Vec::new(),
            viewer: None,
        };

        assert!(Graph::build(&snapshot).is_empty());
    }

    #[test]
    fn oversized_connection_list_yields_graph_without_edges() {
        let a = NodeKey(1, 1);
        let b = NodeKey(1, 2);
        let snapshot = Snapshot {
            nodes: vec![node(a, 0.0, 0.0), node(b, 10.0, 0.0)],
            connections: vec![ConnectionRecord::new(a, &[b]); SNAPSHOT_CEILING + 1],
            viewer: None,
        };

        let graph = Graph::build(&snapshot);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
    }

    #[rstest]
    #[case(1, 4, 4)]
    #[case(7, 12, 9)]
    #[case(42, 30, 20)]
    fn noisy_demo_snapshots_build_clean_graphs(
        #[case] seed: u64,
        #[case] columns: i32,
        #[case] rows: i32,
    ) {
        let graph = Graph::build(&demo_snapshot(seed, columns, rows));
        assert_eq!(graph.node_count(), (columns * rows) as usize);
        assert!(graph.edge_count() > 0);
        assert_symmetric_without_self_loops(&graph);
    }

    #[rstest]
    #[case(pos2(1.0, 1.0), Some(NodeKey(1, 1)))]
    #[case(pos2(9.0, 1.0), Some(NodeKey(2, 1)))]
    #[case(pos2(6.0, 9.0), Some(NodeKey(2, 2)))]
    fn nearest_picks_the_closest_center(#[case] point: Pos2, #[case] expected: Option<NodeKey>) {
        let positions = [
            (NodeKey(1, 1), pos2(0.0, 0.0)),
            (NodeKey(2, 1), pos2(10.0, 0.0)),
            (NodeKey(2, 2), pos2(10.0, 10.0)),
        ];
        assert_eq!(nearest(point, positions), expected);
    }

    #[test]
    fn nearest_ties_go_to_the_first_in_key_order() {
        let snapshot = Snapshot {
            nodes: vec![node(NodeKey(3, 1), 10.0, 0.0), node(NodeKey(1, 1), -10.0, 0.0)],
            connections: Vec::new(),
            viewer: None,
        };
        let graph = Graph::build(&snapshot);

        assert_eq!(nearest(pos2(0.0, 0.0), graph.positions()), Some(NodeKey(1, 1)));
    }

    #[test]
    fn nearest_of_nothing_is_none() {
        assert_eq!(nearest(pos2(0.0, 0.0), Vec::new()), None);
    }
}

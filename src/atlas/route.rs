use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use super::graph::Graph;
use super::snapshot::NodeKey;

#[derive(Clone, Copy, Debug)]
struct Frontier {
    estimate: f32,
    cost: f32,
    key: NodeKey,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so the max-heap pops the lowest estimate, then the smallest key.
impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.key.cmp(&self.key))
    }
}

/// Shortest path from `start` to `goal` using Euclidean edge lengths.
///
/// Returns the node sequence with both endpoints included, or `None` when
/// either endpoint is not in the graph or the goal is unreachable. Equal-cost
/// alternatives resolve the same way on every call over the same graph.
pub fn find_path(start: NodeKey, goal: NodeKey, graph: &Graph) -> Option<Vec<NodeKey>> {
    let start_pos = graph.position(start)?;
    let goal_pos = graph.position(goal)?;

    let mut came_from: HashMap<NodeKey, NodeKey> = HashMap::new();
    let mut best_cost: HashMap<NodeKey, f32> = HashMap::from([(start, 0.0)]);
    let mut open = BinaryHeap::from([Frontier {
        estimate: start_pos.distance(goal_pos),
        cost: 0.0,
        key: start,
    }]);

    while let Some(Frontier { cost, key, .. }) = open.pop() {
        if key == goal {
            return Some(reconstruct(&came_from, start, goal));
        }

        if best_cost.get(&key).is_some_and(|&best| cost > best) {
            continue;
        }

        let Some(current_pos) = graph.position(key) else {
            continue;
        };

        for &next in graph.neighbors(key) {
            let Some(next_pos) = graph.position(next) else {
                continue;
            };

            let tentative = cost + current_pos.distance(next_pos);
            if best_cost.get(&next).is_some_and(|&best| tentative >= best) {
                continue;
            }

            came_from.insert(next, key);
            best_cost.insert(next, tentative);
            open.push(Frontier {
                estimate: tentative + next_pos.distance(goal_pos),
                cost: tentative,
                key: next,
            });
        }
    }

    None
}

fn reconstruct(came_from: &HashMap<NodeKey, NodeKey>, start: NodeKey, goal: NodeKey) -> Vec<NodeKey> {
    let mut path = vec![goal];
    let mut cursor = goal;
    while cursor != start {
        let Some(&prev) = came_from.get(&cursor) else {
            break;
        };
        cursor = prev;
        path.push(cursor);
    }
    path.reverse();
    path
}

/// Total Euclidean length of `path`; hops through unknown nodes are skipped.
pub fn path_length(path: &[NodeKey], graph: &Graph) -> f32 {
    path.windows(2)
        .filter_map(|pair| match pair {
            [a, b] => Some(graph.position(*a)?.distance(graph.position(*b)?)),
            _ => None,
        })
        .sum()
}

use eframe::egui::Pos2;

/// Upper bound on node and connection records accepted from one capture.
pub const SNAPSHOT_CEILING: usize = 10_000;

/// Grid cell identifier. Only meaningful within the snapshot it came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(pub i32, pub i32);

impl NodeKey {
    /// Sentinel used by connection records for an empty neighbor slot.
    pub const NULL: Self = Self(0, 0);

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeStatus {
    pub completed: bool,
    pub accessible: bool,
    /// A run on this map was attempted and lost. Only label filtering reads it.
    pub failed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    pub key: NodeKey,
    pub position: Pos2,
    pub status: NodeStatus,
    pub name: Option<String>,
    /// Biome id used for the label border.
    pub biome: Option<u8>,
}

impl NodeRecord {
    pub(crate) fn is_valid(&self) -> bool {
        !self.key.is_null() && self.position.x.is_finite() && self.position.y.is_finite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub key: NodeKey,
    pub neighbors: [NodeKey; 4],
}

impl ConnectionRecord {
    /// Builds a record from up to four neighbors; missing slots are [`NodeKey::NULL`].
    pub fn new(key: NodeKey, neighbors: &[NodeKey]) -> Self {
        let mut slots = [NodeKey::NULL; 4];
        for (slot, neighbor) in slots.iter_mut().zip(neighbors) {
            *slot = *neighbor;
        }
        Self {
            key,
            neighbors: slots,
        }
    }
}

/// Node and connection records captured for a single frame.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub nodes: Vec<NodeRecord>,
    pub connections: Vec<ConnectionRecord>,
    pub viewer: Option<Pos2>,
}

impl Snapshot {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn exceeds_ceiling(&self) -> bool {
        self.nodes.len() > SNAPSHOT_CEILING || self.connections.len() > SNAPSHOT_CEILING
    }

    /// Returns a copy with every node position (and the viewer) passed through `transform`.
    pub fn map_positions(&self, transform: impl Fn(Pos2) -> Pos2) -> Self {
        Self {
            nodes: self
                .nodes
                .iter()
                .map(|node| NodeRecord {
                    position: transform(node.position),
                    ..node.clone()
                })
                .collect(),
            connections: self.connections.clone(),
            viewer: self.viewer.map(&transform),
        }
    }

    pub fn node(&self, key: NodeKey) -> Option<&NodeRecord> {
        self.nodes.iter().rev().find(|node| node.key == key)
    }
}

#[cfg(test)]
pub(super) mod arbitrary {
    use eframe::egui::pos2;
    use proptest::prelude::*;

    use super::*;

    /// Snapshots of `2..=max_nodes` cells keyed `(i, 1)`, each with one
    /// connection record of up to `max_links` raw slots. Slots may be NULL,
    /// point back at their own cell or name a cell that does not exist, and a
    /// NULL-keyed node record is sometimes appended.
    pub(in crate::atlas) fn noisy_snapshot(
        max_nodes: i32,
        max_links: usize,
    ) -> impl Strategy<Value = Snapshot> {
        (2..=max_nodes)
            .prop_flat_map(move |count| {
                let cells = prop::collection::vec(
                    (0u16..200, 0u16..200, any::<bool>(), any::<bool>()),
                    count as usize,
                );
                let links = prop::collection::vec(
                    prop::collection::vec(0..=count + 2, 0..=max_links),
                    count as usize,
                );
                (cells, links, any::<bool>())
            })
            .prop_map(|(cells, links, null_record)| {
                let mut nodes = cells
                    .into_iter()
                    .zip(1..)
                    .map(|((x, y, completed, accessible), i)| NodeRecord {
                        key: NodeKey(i, 1),
                        position: pos2(f32::from(x), f32::from(y)),
                        status: NodeStatus {
                            completed,
                            accessible,
                            failed: false,
                        },
                        name: None,
                        biome: None,
                    })
                    .collect::<Vec<_>>();
                if null_record {
                    nodes.push(NodeRecord {
                        key: NodeKey::NULL,
                        position: pos2(0.0, 0.0),
                        status: NodeStatus::default(),
                        name: None,
                        biome: None,
                    });
                }

                let connections = links
                    .iter()
                    .zip(1..)
                    .map(|(slots, i)| {
                        let neighbors = slots
                            .iter()
                            .map(|&slot| if slot == 0 { NodeKey::NULL } else { NodeKey(slot, 1) })
                            .collect::<Vec<_>>();
                        ConnectionRecord::new(NodeKey(i, 1), &neighbors)
                    })
                    .collect();

                Snapshot {
                    nodes,
                    connections,
                    viewer: None,
                }
            })
    }
}

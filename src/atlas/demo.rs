use eframe::egui::{Pos2, pos2, vec2};
use tracing::warn;

use crate::util::{stable_hash, stable_pair};

use super::snapshot::{ConnectionRecord, NodeKey, NodeRecord, NodeStatus, SNAPSHOT_CEILING, Snapshot};

const CELL_SPACING: f32 = 110.0;
const JITTER: f32 = 0.3;

/// Largest demo grid. Mirrored connection records can double the record
/// count, so half the ceiling keeps every demo atlas routable.
pub const DEMO_MAX_CELLS: i32 = (SNAPSHOT_CEILING / 2) as i32;

/// Biome bands laid out left to right across the demo grid.
pub const DEMO_BIOME_BANDS: i32 = 4;

const CITADELS: [&str; 3] = ["The Copper Citadel", "The Iron Citadel", "The Stone Citadel"];

const MAP_NAMES: [&str; 28] = [
    "Bluff",
    "Lost Towers",
    "Mesa",
    "Sinking Spire",
    "Alpine Ridge",
    "Burial Bog",
    "Creek",
    "Rustbowl",
    "Sandspit",
    "Savannah",
    "Steaming Springs",
    "Steppe",
    "Wetlands",
    "Willow",
    "Castaway",
    "Ice Cave",
    "Derelict Mansion",
    "The Fractured Lake",
    "Vaults of Kamasa",
    "Hidden Grotto",
    "Penitentiary",
    "Crypt",
    "Augury",
    "Forge",
    "Hive",
    "Mire",
    "Headland",
    "Grimhaven",
];

/// Procedural atlas used when no capture file is supplied.
///
/// Lays out a jittered `columns x rows` grid with keys starting at `(1, 1)`.
/// Cells near the left edge are completed, a ring around them is accessible,
/// and the connection records carry the same kinds of noise real captures do.
pub fn demo_snapshot(seed: u64, columns: i32, rows: i32) -> Snapshot {
    let (columns, rows) = demo_dimensions(columns, rows);
    let start = NodeKey(1, rows / 2 + 1);
    let completed_radius = (columns / 5).max(2);

    let mut nodes = Vec::with_capacity((columns * rows) as usize + 1);
    let mut connections = Vec::with_capacity((columns * rows) as usize);

    for column in 1..=columns {
        for row in 1..=rows {
            let key = NodeKey(column, row);
            let distance = (column - start.0).abs() + (row - start.1).abs();
            nodes.push(NodeRecord {
                key,
                position: cell_position(seed, key),
                status: NodeStatus {
                    completed: distance <= completed_radius,
                    accessible: distance <= completed_radius + 1,
                    // The far top citadel carries a lost attempt.
                    failed: columns > 2 && key == NodeKey(columns, 1),
                },
                name: Some(cell_name(seed, key, columns, rows).to_owned()),
                biome: Some(biome_band(column, columns)),
            });
            connections.extend(cell_connections(seed, key, columns, rows));
        }
    }

    // A capture occasionally carries an unset slot; the graph builder drops it.
    if !nodes.is_empty() {
        nodes.push(NodeRecord {
            key: NodeKey::NULL,
            position: pos2(0.0, 0.0),
            status: NodeStatus::default(),
            name: None,
            biome: None,
        });
    }

    let viewer = (columns > 0 && rows > 0)
        .then(|| cell_position(seed, start) - vec2(CELL_SPACING * 0.4, 0.0));

    Snapshot {
        nodes,
        connections,
        viewer,
    }
}

/// Clamps negative sides to zero and trims rows so the grid stays within
/// [`DEMO_MAX_CELLS`].
fn demo_dimensions(columns: i32, rows: i32) -> (i32, i32) {
    let columns = columns.clamp(0, DEMO_MAX_CELLS);
    let rows = rows.max(0);
    match columns.checked_mul(rows) {
        Some(cells) if cells <= DEMO_MAX_CELLS => (columns, rows),
        _ => {
            let fitted = DEMO_MAX_CELLS / columns.max(1);
            warn!(
                columns,
                rows,
                fitted_rows = fitted,
                max_cells = DEMO_MAX_CELLS,
                "demo atlas too large, trimming rows"
            );
            (columns, fitted)
        }
    }
}

fn biome_band(column: i32, columns: i32) -> u8 {
    // column is 1-based and never exceeds columns, so the band is 1..=DEMO_BIOME_BANDS.
    ((column - 1) * DEMO_BIOME_BANDS / columns.max(1) + 1) as u8
}

fn cell_position(seed: u64, key: NodeKey) -> Pos2 {
    let (jx, jy) = stable_pair((seed, "position", key));
    pos2(
        (key.0 as f32 + jx * JITTER) * CELL_SPACING,
        (key.1 as f32 + jy * JITTER) * CELL_SPACING,
    )
}

fn cell_name(seed: u64, key: NodeKey, columns: i32, rows: i32) -> &'static str {
    let citadel_cells = [
        NodeKey(columns, 1),
        NodeKey(columns, rows),
        NodeKey((columns + 1) / 2, rows),
    ];
    if columns > 2
        && let Some(index) = citadel_cells.iter().position(|cell| *cell == key)
    {
        return CITADELS[index];
    }

    MAP_NAMES[(stable_hash((seed, "name", key)) % MAP_NAMES.len() as u64) as usize]
}

fn cell_connections(seed: u64, key: NodeKey, columns: i32, rows: i32) -> Vec<ConnectionRecord> {
    let roll = stable_hash((seed, "links", key));
    let mut neighbors = Vec::with_capacity(4);

    if roll % 7 == 0 {
        neighbors.push(NodeKey::NULL);
    }
    if key.0 < columns && roll % 10 != 1 {
        neighbors.push(NodeKey(key.0 + 1, key.1));
    }
    if key.1 < rows && roll % 10 != 2 {
        neighbors.push(NodeKey(key.0, key.1 + 1));
    }
    if roll % 13 == 0 {
        neighbors.push(key);
    }
    if roll % 11 == 0 {
        neighbors.push(NodeKey(columns + 5, key.1));
    }

    let mut records = vec![ConnectionRecord::new(key, &neighbors)];

    // Some captures repeat an edge from the other endpoint.
    if roll % 9 == 0 && key.0 < columns {
        records.push(ConnectionRecord::new(NodeKey(key.0 + 1, key.1), &[key, key]));
    }
    records
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::super::graph::Graph;
    use super::*;

    #[test]
    fn same_seed_gives_the_same_atlas() {
        let first = demo_snapshot(9, 10, 6);
        let second = demo_snapshot(9, 10, 6);
        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.connections, second.connections);
        assert_eq!(first.viewer, second.viewer);
    }

    #[test]
    fn grid_cells_are_all_valid_and_named() {
        let snapshot = demo_snapshot(3, 8, 5);
        let cells = snapshot
            .nodes
            .iter()
            .filter(|node| node.is_valid())
            .collect::<Vec<_>>();
        assert_eq!(cells.len(), 40);
        assert!(cells.iter().all(|node| node.name.is_some()));
        assert!(
            cells
                .iter()
                .any(|node| node.name.as_deref() == Some("The Iron Citadel"))
        );
    }

    #[test]
    fn start_region_is_completed_and_far_side_is_not() {
        let snapshot = demo_snapshot(1, 12, 7);
        let start = snapshot.node(NodeKey(1, 4)).unwrap();
        assert!(start.status.completed);
        assert!(start.status.accessible);
        assert!(!snapshot.node(NodeKey(12, 1)).unwrap().status.accessible);
        assert!(snapshot.viewer.is_some());
    }

    #[test]
    fn empty_dimensions_give_an_empty_snapshot() {
        let snapshot = demo_snapshot(1, 0, 4);
        assert!(snapshot.is_empty());
        assert!(snapshot.connections.is_empty());
        assert!(snapshot.viewer.is_none());
    }

    #[rstest]
    #[case(50_000, 50_000)]
    #[case(120, 100)]
    #[case(i32::MAX, 3)]
    #[case(3, i32::MAX)]
    fn oversized_grids_are_trimmed_and_stay_routable(#[case] columns: i32, #[case] rows: i32) {
        let snapshot = demo_snapshot(7, columns, rows);
        let cells = snapshot.nodes.iter().filter(|node| node.is_valid()).count();
        assert!(cells > 0);
        assert!(cells <= DEMO_MAX_CELLS as usize);
        assert!(!snapshot.exceeds_ceiling());

        let graph = Graph::build(&snapshot);
        assert_eq!(graph.node_count(), cells);
        assert!(graph.edge_count() > 0);
    }

    #[test]
    fn grids_within_the_limit_keep_their_size() {
        assert_eq!(demo_dimensions(50, 100), (50, 100));
        assert_eq!(demo_dimensions(120, 100), (120, DEMO_MAX_CELLS / 120));
        assert_eq!(demo_dimensions(-4, 9), (0, 9));
    }

    #[test]
    fn biomes_band_the_grid_and_one_citadel_has_failed() {
        let snapshot = demo_snapshot(2, 8, 5);
        let band = |key| snapshot.node(key).and_then(|node| node.biome);
        assert_eq!(band(NodeKey(1, 1)), Some(1));
        assert_eq!(band(NodeKey(3, 2)), Some(2));
        assert_eq!(band(NodeKey(8, 5)), Some(DEMO_BIOME_BANDS as u8));

        let failed = snapshot
            .nodes
            .iter()
            .filter(|node| node.status.failed)
            .map(|node| node.key)
            .collect::<Vec<_>>();
        assert_eq!(failed, [NodeKey(8, 1)]);
        assert_eq!(
            snapshot.node(NodeKey(8, 1)).and_then(|node| node.name.as_deref()),
            Some("The Copper Citadel")
        );
    }
}

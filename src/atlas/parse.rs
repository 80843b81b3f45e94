use anyhow::{Context, Result, anyhow};
use eframe::egui::{Pos2, pos2};
use serde::Deserialize;
use serde_json::Value;

use super::snapshot::{ConnectionRecord, NodeKey, NodeRecord, NodeStatus, SNAPSHOT_CEILING, Snapshot};

#[derive(Clone, Debug, Deserialize)]
struct RawNode {
    key: (i32, i32),
    position: (f32, f32),
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    accessible: bool,
    #[serde(default)]
    failed: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    biome: Option<i64>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawConnection {
    key: (i32, i32),
    #[serde(default)]
    neighbors: Vec<Option<(i32, i32)>>,
}

/// Counts of records dropped while parsing a capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub skipped_nodes: usize,
    pub skipped_connections: usize,
    pub truncated: bool,
}

pub fn parse_snapshot(raw: &str) -> Result<(Snapshot, ParseReport)> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in snapshot capture")?;
    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("snapshot capture must be a JSON object"))?;

    let mut report = ParseReport::default();

    let nodes = records(object.get("nodes"), &mut report.truncated)
        .iter()
        .filter_map(|value| {
            let node = RawNode::deserialize(value).ok().map(node_record);
            if node.is_none() {
                report.skipped_nodes += 1;
            }
            node
        })
        .collect::<Vec<_>>();

    let connections = records(object.get("connections"), &mut report.truncated)
        .iter()
        .filter_map(|value| {
            let connection = RawConnection::deserialize(value).ok().map(connection_record);
            if connection.is_none() {
                report.skipped_connections += 1;
            }
            connection
        })
        .collect::<Vec<_>>();

    let viewer = object
        .get("viewer")
        .and_then(|value| <(f32, f32)>::deserialize(value).ok())
        .map(|(x, y)| pos2(x, y))
        .filter(|point| point.x.is_finite() && point.y.is_finite());

    Ok((
        Snapshot {
            nodes,
            connections,
            viewer,
        },
        report,
    ))
}

// Lists over the ceiling are treated as corrupt and read as empty.
fn records<'a>(value: Option<&'a Value>, truncated: &mut bool) -> &'a [Value] {
    let items = value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if items.len() > SNAPSHOT_CEILING {
        *truncated = true;
        return &[];
    }
    items
}

fn node_record(raw: RawNode) -> NodeRecord {
    NodeRecord {
        key: NodeKey(raw.key.0, raw.key.1),
        position: Pos2::new(raw.position.0, raw.position.1),
        status: NodeStatus {
            completed: raw.completed,
            accessible: raw.accessible,
            failed: raw.failed,
        },
        name: raw.name,
        // Out-of-range ids drop the border, not the node.
        biome: raw.biome.and_then(|id| u8::try_from(id).ok()),
    }
}

fn connection_record(raw: RawConnection) -> ConnectionRecord {
    let neighbors = raw
        .neighbors
        .into_iter()
        .take(4)
        .map(|neighbor| neighbor.map_or(NodeKey::NULL, |(x, y)| NodeKey(x, y)))
        .collect::<Vec<_>>();
    ConnectionRecord::new(NodeKey(raw.key.0, raw.key.1), &neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nodes_connections_and_viewer() {
        let raw = r#"{
            "nodes": [
                {"key": [1, 1], "position": [0.0, 0.0], "completed": true, "accessible": true, "name": "Creek"},
                {"key": [1, 2], "position": [10.0, 0.0]}
            ],
            "connections": [
                {"key": [1, 1], "neighbors": [[1, 2], [0, 0], null]}
            ],
            "viewer": [3.0, 4.0]
        }"#;

        let (snapshot, report) = parse_snapshot(raw).unwrap();
        assert_eq!(report, ParseReport::default());
        assert_eq!(snapshot.node_count(), 2);
        assert!(snapshot.nodes[0].status.completed);
        assert!(!snapshot.nodes[1].status.accessible);
        assert_eq!(snapshot.nodes[0].name.as_deref(), Some("Creek"));
        assert_eq!(
            snapshot.connections[0].neighbors,
            [NodeKey(1, 2), NodeKey::NULL, NodeKey::NULL, NodeKey::NULL]
        );
        assert_eq!(snapshot.viewer, Some(pos2(3.0, 4.0)));
    }

    #[test]
    fn malformed_records_are_skipped_and_counted() {
        let raw = r#"{
            "nodes": [
                {"key": [1, 1], "position": [0.0, 0.0]},
                {"key": "garbage", "position": [0.0, 0.0]},
                {"position": [5.0, 5.0]},
                7
            ],
            "connections": [
                {"key": [1, 1], "neighbors": [[1, 2]]},
                {"neighbors": [[1, 2]]}
            ]
        }"#;

        let (snapshot, report) = parse_snapshot(raw).unwrap();
        assert_eq!(snapshot.node_count(), 1);
        assert_eq!(snapshot.connection_count(), 1);
        assert_eq!(report.skipped_nodes, 3);
        assert_eq!(report.skipped_connections, 1);
        assert!(snapshot.viewer.is_none());
    }

    #[test]
    fn reads_failed_flag_and_biome_id() {
        let raw = r#"{
            "nodes": [
                {"key": [1, 1], "position": [0.0, 0.0], "failed": true, "biome": 3, "name": "The Iron Citadel"},
                {"key": [1, 2], "position": [10.0, 0.0], "biome": 300},
                {"key": [1, 3], "position": [20.0, 0.0]}
            ],
            "connections": []
        }"#;

        let (snapshot, report) = parse_snapshot(raw).unwrap();
        assert_eq!(report.skipped_nodes, 0);
        assert!(snapshot.nodes[0].status.failed);
        assert_eq!(snapshot.nodes[0].biome, Some(3));
        assert_eq!(snapshot.nodes[1].biome, None);
        assert!(!snapshot.nodes[2].status.failed);
        assert_eq!(snapshot.nodes[2].biome, None);
    }

    #[test]
    fn extra_neighbors_beyond_four_are_ignored() {
        let raw = r#"{
            "nodes": [],
            "connections": [
                {"key": [1, 1], "neighbors": [[1, 2], [1, 3], [1, 4], [1, 5], [1, 6]]}
            ]
        }"#;

        let (snapshot, _) = parse_snapshot(raw).unwrap();
        assert_eq!(snapshot.connections[0].neighbors[3], NodeKey(1, 5));
    }

    #[test]
    fn oversized_lists_are_read_as_empty() {
        let nodes = (0..=SNAPSHOT_CEILING)
            .map(|i| format!(r#"{{"key": [{}, 1], "position": [0.0, 0.0]}}"#, i + 1))
            .collect::<Vec<_>>()
            .join(",");
        let raw = format!(r#"{{"nodes": [{nodes}], "connections": []}}"#);

        let (snapshot, report) = parse_snapshot(&raw).unwrap();
        assert!(snapshot.is_empty());
        assert!(report.truncated);
    }

    #[test]
    fn non_object_capture_is_an_error() {
        assert!(parse_snapshot("[1, 2, 3]").is_err());
        assert!(parse_snapshot("{not json").is_err());
    }
}

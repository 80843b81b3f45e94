use std::collections::HashMap;

use eframe::egui::{Pos2, Rect};

use super::graph::{Graph, nearest};
use super::overlay::{ColorClass, Overlay, RouteStyle, Segment, classify, direct_line};
use super::route::{find_path, path_length};
use super::snapshot::NodeKey;

#[derive(Clone, Copy, Debug)]
pub struct RouteQuery {
    pub origin: Pos2,
    pub destination: NodeKey,
    pub destination_rect: Rect,
    pub route_through_graph: bool,
    pub style: RouteStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RouteSummary {
    pub path: Vec<NodeKey>,
    pub length: f32,
    pub completed_stops: usize,
    pub accessible_stops: usize,
}

/// Routing state for a single frame: the resolved start node and the paths
/// already planned toward each destination. Dropped when the frame ends.
pub struct FrameRouter<'g> {
    graph: &'g Graph,
    start: Option<NodeKey>,
    paths: HashMap<NodeKey, Option<Vec<NodeKey>>>,
}

impl<'g> FrameRouter<'g> {
    pub fn new(graph: &'g Graph, viewer: Pos2) -> Self {
        Self {
            graph,
            start: nearest(viewer, graph.positions()),
            paths: HashMap::new(),
        }
    }

    pub fn start(&self) -> Option<NodeKey> {
        self.start
    }

    pub fn planned_routes(&self) -> usize {
        self.paths.len()
    }

    pub fn route(&mut self, query: &RouteQuery) -> Overlay {
        let graph = self.graph;
        let path = if query.route_through_graph {
            self.path_to(query.destination)
        } else {
            None
        };

        match path {
            Some(path) if !path.is_empty() => classify(
                path,
                graph,
                query.origin,
                query.destination_rect,
                query.style,
            ),
            _ => direct_line(query.origin, query.destination_rect, query.style),
        }
    }

    /// Planned route to `destination`, if one was requested this frame.
    pub fn route_summary(&self, destination: NodeKey) -> Option<RouteSummary> {
        let path = self.paths.get(&destination)?.as_ref()?;
        let (completed_stops, accessible_stops) =
            path.iter()
                .fold((0, 0), |(completed, accessible), key| {
                    let status = self.graph.status(*key);
                    (
                        completed + usize::from(status.completed),
                        accessible + usize::from(status.accessible),
                    )
                });
        Some(RouteSummary {
            path: path.clone(),
            length: path_length(path, self.graph),
            completed_stops,
            accessible_stops,
        })
    }

    fn path_to(&mut self, destination: NodeKey) -> Option<&[NodeKey]> {
        let start = self.start?;
        if !self.graph.contains(destination) {
            return None;
        }

        let graph = self.graph;
        self.paths
            .entry(destination)
            .or_insert_with(|| find_path(start, destination, graph))
            .as_deref()
    }
}

/// Both render layers for one frame; the grid is drawn underneath the routes.
#[derive(Clone, Debug, Default)]
pub struct FrameOverlay {
    pub grid: Vec<Segment>,
    pub routes: Overlay,
}

/// One segment per edge whose endpoints both sit inside `viewport`.
pub fn grid_overview(graph: &Graph, viewport: Rect, skip_completed: bool) -> Vec<Segment> {
    let mut segments = Vec::new();
    for (key, node) in graph.iter() {
        if !viewport.contains(node.position) {
            continue;
        }
        if skip_completed && node.status.completed {
            continue;
        }

        for &neighbor in node.neighbors.iter().filter(|neighbor| **neighbor > key) {
            let Some(other) = graph.node(neighbor) else {
                continue;
            };
            if !viewport.contains(other.position) || (skip_completed && other.status.completed) {
                continue;
            }
            segments.push(Segment {
                a: node.position,
                b: other.position,
                class: ColorClass::Grid,
            });
        }
    }
    segments
}

use eframe::egui::{self, RichText, Ui};

use crate::atlas::{NodeKey, normalize_name};
use crate::util::{format_millis, short_name};

use super::super::{ViewModel, status_text};

fn describe_key(key: NodeKey) -> String {
    format!("({}, {})", key.0, key.1)
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Destination Details");
        ui.add_space(6.0);

        self.draw_pinned_details(ui);

        ui.separator();
        ui.label(RichText::new("Frame").strong());
        let stats = self.frame_stats;
        ui.label(format!("Graph nodes: {}", stats.graph_nodes));
        ui.label(format!("Graph edges: {}", stats.graph_edges));
        ui.label(format!("Grid segments: {}", stats.grid_segments));
        ui.label(format!("Labels drawn: {}", stats.labels_drawn));
        ui.label(format!(
            "Routes: {} drawn, {} planned",
            stats.routes_drawn, stats.routes_planned
        ));
        ui.label(format!("Routing time: {}", format_millis(stats.routing_time)));
        ui.label(format!(
            "Viewer: ({:.0}, {:.0})",
            self.viewer.x, self.viewer.y
        ));
    }

    fn draw_pinned_details(&mut self, ui: &mut Ui) {
        let Some(key) = self.pinned else {
            ui.label("Click a map label (or use Find map) to pin it as a destination.");
            return;
        };

        let Some(record) = self.snapshot.node(key) else {
            ui.label("Pinned map no longer exists in the snapshot.");
            return;
        };

        let name = record
            .name
            .as_deref()
            .map(normalize_name)
            .unwrap_or_else(|| "(unnamed)".to_owned());
        let status = record.status;
        let group = self
            .settings
            .group_for(&name)
            .map(|group| group.name.clone());

        ui.label(RichText::new(short_name(&name, 40)).strong());
        ui.small(describe_key(key));
        ui.add_space(6.0);
        ui.label(format!("Status: {}", status_text(status)));
        if status.failed {
            ui.label("Attempt failed");
        }
        if let Some(group) = group {
            ui.label(format!("Group: {group}"));
        }
        if let Some(id) = record.biome {
            let biome = self
                .settings
                .biomes
                .get(id)
                .map_or_else(|| format!("Biome {id}"), |info| info.display_label(id));
            ui.label(format!("Biome: {biome}"));
        }

        ui.horizontal(|ui| {
            if ui.button("Center").clicked() {
                self.focus_request = Some(key);
            }
            if ui.button("Unpin").clicked() {
                self.pinned = None;
            }
        });

        ui.separator();
        ui.label(RichText::new("Route from viewer").strong());
        let Some(summary) = &self.pinned_summary else {
            ui.label("Not routed yet.");
            return;
        };

        match summary.start {
            Some(start) => ui.label(format!("Start node: {}", describe_key(start))),
            None => ui.label("No start node: the graph is empty."),
        };

        let Some(route) = &summary.route else {
            if self.settings.route_through_nodes {
                ui.label("No path through the graph; drawing a direct line.");
            } else {
                ui.label("Routing through nodes is off; drawing a direct line.");
            }
            return;
        };

        let zoom = summary.zoom.max(f32::EPSILON);
        ui.label(format!("Hops: {}", route.path.len().saturating_sub(1)));
        ui.label(format!("Length: {:.0}", route.length / zoom));
        ui.label(format!(
            "Stops completed / accessible: {} / {}",
            route.completed_stops, route.accessible_stops
        ));

        let rendered = if route.path.len() <= 10 {
            route
                .path
                .iter()
                .map(|key| describe_key(*key))
                .collect::<Vec<_>>()
                .join(" -> ")
        } else {
            let head = route
                .path
                .iter()
                .take(5)
                .map(|key| describe_key(*key))
                .collect::<Vec<_>>()
                .join(" -> ");
            let tail = route
                .path
                .iter()
                .skip(route.path.len().saturating_sub(3))
                .map(|key| describe_key(*key))
                .collect::<Vec<_>>()
                .join(" -> ");
            format!("{head} -> ... -> {tail}")
        };
        egui::ScrollArea::vertical()
            .id_salt("pinned_route_scroll")
            .max_height(160.0)
            .show(ui, |ui| {
                ui.label(rendered);
            });
    }
}

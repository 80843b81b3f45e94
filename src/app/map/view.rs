use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use eframe::egui::{
    self, Align2, Color32, FontId, Galley, Pos2, Rect, Sense, Stroke, StrokeKind, Ui, Vec2, vec2,
};

use crate::atlas::{
    ColorClass, FrameOverlay, FrameRouter, Graph, NodeKey, NodeRecord, NodeStatus, RouteQuery, RouteStyle,
    Snapshot, TargetRules, grid_overview, is_printable_name, normalize_name,
};

use super::super::render_utils::{
    blend_color, dim_color, draw_background, draw_markers, draw_segments, draw_viewer,
    world_to_screen,
};
use super::super::{FrameStats, PinnedSummary, ViewModel, status_text};

struct LabelPlacement {
    key: NodeKey,
    name: String,
    rect: Rect,
    text_pos: Pos2,
    galley: Arc<Galley>,
    background: Color32,
    border: Option<Color32>,
    font: Color32,
}

enum LabelTarget {
    Hidden,
    /// Pinned, but without a printable name to label.
    Unnamed,
    Named(String),
}

/// Pinned nodes bypass the label filters and stay routable even when unnamed.
fn label_target(record: &NodeRecord, status: NodeStatus, pinned: bool, rules: &TargetRules) -> LabelTarget {
    let name = record
        .name
        .as_deref()
        .map(normalize_name)
        .filter(|name| is_printable_name(name));
    match name {
        Some(name) if pinned || rules.label_visible(&name, status) => LabelTarget::Named(name),
        None if pinned => LabelTarget::Unnamed,
        _ => LabelTarget::Hidden,
    }
}

/// Last record per key, in key order.
fn label_records(snapshot: &Snapshot) -> BTreeMap<NodeKey, &NodeRecord> {
    snapshot
        .nodes
        .iter()
        .map(|record| (record.key, record))
        .collect()
}

impl ViewModel {
    pub(in crate::app) fn ui_scale(&self) -> f32 {
        self.settings.scale_multiplier.clamp(0.5, 4.0)
    }

    pub(in crate::app) fn path_thickness(&self) -> f32 {
        (self.ui_scale() * self.settings.path_thickness).max(1.0)
    }

    pub(in crate::app) fn draw_atlas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        if self.fit_requested {
            self.fit_to(rect);
        }
        if let Some(key) = self.focus_request.take() {
            self.focus_on(key);
        }

        self.handle_atlas_zoom(ui, rect, &response);
        self.handle_atlas_pan(&response);
        self.handle_viewer_moves(ui, rect, &response);

        draw_background(&painter, rect, self.pan, self.zoom);

        let (pan, zoom) = (self.pan, self.zoom);
        let screen = self
            .snapshot
            .map_positions(|world| world_to_screen(rect, pan, zoom, world));
        let graph = Graph::build(&screen);
        let viewer = world_to_screen(rect, pan, zoom, self.viewer);

        let ui_scale = self.ui_scale();
        let thickness = self.path_thickness();
        let rules = self.settings.target_rules(rect);
        let font_id = FontId::proportional(13.0 * ui_scale);
        let padding = vec2(5.0, 2.0) * ui_scale;
        let nudge = self.settings.anchor_nudge();

        let started = Instant::now();
        let mut frame = FrameOverlay::default();
        if self.settings.draw_grid {
            frame.grid = grid_overview(&graph, rect, self.settings.grid_skip_completed);
        }

        let mut router = FrameRouter::new(&graph, viewer);
        let mut labels = Vec::new();
        let mut routes_drawn = 0usize;

        for (key, record) in label_records(&screen) {
            let Some(node) = graph.node(key) else {
                continue;
            };
            let pinned = self.pinned == Some(key);
            let name = match label_target(record, node.status, pinned, &rules) {
                LabelTarget::Named(name) => name,
                LabelTarget::Hidden => continue,
                LabelTarget::Unnamed => {
                    frame.routes.extend(router.route(&RouteQuery {
                        origin: viewer,
                        destination: key,
                        destination_rect: Rect::from_center_size(node.position, Vec2::splat(thickness * 4.0)),
                        route_through_graph: self.settings.route_through_nodes,
                        style: RouteStyle {
                            class: ColorClass::Pinned,
                            thickness,
                        },
                    }));
                    routes_drawn += 1;
                    continue;
                }
            };

            let colors = self.settings.label_colors(&name, node.status.completed);
            let font = if node.status.accessible {
                colors.font
            } else {
                dim_color(colors.font, 0.6)
            };
            let galley = painter.layout_no_wrap(name.clone(), font_id.clone(), font);
            let text_pos = node.position - galley.size() * 0.5 + nudge;
            let background = Rect::from_min_size(text_pos - padding, galley.size() + padding * 2.0);

            if let Some(class) = rules.destination_class(&name, node.status, text_pos, pinned) {
                frame.routes.extend(router.route(&RouteQuery {
                    origin: viewer,
                    destination: key,
                    destination_rect: background,
                    route_through_graph: self.settings.route_through_nodes,
                    style: RouteStyle { class, thickness },
                }));
                routes_drawn += 1;
            }

            if background.intersects(rect) {
                labels.push(LabelPlacement {
                    key,
                    name,
                    rect: background,
                    text_pos,
                    galley,
                    background: colors.background,
                    border: self.settings.biome_border(record.biome, node.status.completed),
                    font,
                });
            }
        }
        let routing_time = started.elapsed();

        self.pinned_summary = self.pinned.map(|key| PinnedSummary {
            start: router.start(),
            route: router.route_summary(key),
            zoom,
        });
        self.frame_stats = FrameStats {
            graph_nodes: graph.node_count(),
            graph_edges: graph.edge_count(),
            grid_segments: frame.grid.len(),
            routes_drawn,
            routes_planned: router.planned_routes(),
            labels_drawn: labels.len(),
            routing_time,
        };

        draw_segments(&painter, &frame.grid, &self.settings, thickness);
        if !frame.routes.is_empty() {
            draw_segments(&painter, &frame.routes.segments, &self.settings, thickness);
            draw_markers(&painter, rect, &frame.routes.markers, &self.settings);
        }

        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered = pointer.and_then(|pointer| {
            labels
                .iter()
                .rev()
                .find(|label| label.rect.contains(pointer))
        });
        let hovered_key = hovered.map(|label| label.key);
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let rounding = 3.0 * ui_scale;
        let biome_thickness = (ui_scale * self.settings.biome_border_thickness).max(1.0);
        let pinned_color = self.settings.class_color(ColorClass::Pinned);
        for label in &labels {
            let background = if hovered_key == Some(label.key) {
                blend_color(label.background, Color32::WHITE, 0.25)
            } else {
                label.background
            };
            if let Some(border) = label.border {
                let half = biome_thickness * 0.5;
                painter.rect_stroke(
                    label.rect.expand(half),
                    rounding + half,
                    Stroke::new(biome_thickness, border),
                    StrokeKind::Middle,
                );
            }
            painter.rect_filled(label.rect, rounding, background);
            if self.pinned == Some(label.key) {
                painter.rect_stroke(
                    label.rect,
                    rounding,
                    Stroke::new(1.5 * ui_scale, pinned_color),
                    StrokeKind::Outside,
                );
            }
            painter.galley(label.text_pos, Arc::clone(&label.galley), label.font);
        }

        draw_viewer(&painter, viewer, ui_scale);

        if graph.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No valid nodes in this snapshot",
                FontId::proportional(16.0),
                Color32::from_gray(200),
            );
        }

        if let Some(label) = hovered {
            let status = graph.status(label.key);
            let panel_text = format!(
                "{}  |  ({}, {})  |  {}",
                label.name,
                label.key.0,
                label.key.1,
                status_text(status)
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(key) = hovered_key
        {
            self.toggle_pinned(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use crate::config::OverlaySettings;

    use super::*;

    fn rules() -> TargetRules {
        OverlaySettings::default().target_rules(Rect::from_min_max(pos2(0.0, 0.0), pos2(800.0, 600.0)))
    }

    fn record(name: Option<&str>) -> NodeRecord {
        NodeRecord {
            key: NodeKey(3, 3),
            position: pos2(10.0, 10.0),
            status: NodeStatus::default(),
            name: name.map(str::to_owned),
            biome: None,
        }
    }

    #[test]
    fn unnamed_nodes_stay_routable_only_when_pinned() {
        let rules = rules();
        let status = NodeStatus::default();
        assert!(matches!(
            label_target(&record(None), status, true, &rules),
            LabelTarget::Unnamed
        ));
        assert!(matches!(
            label_target(&record(Some("???")), status, true, &rules),
            LabelTarget::Unnamed
        ));
        assert!(matches!(
            label_target(&record(None), status, false, &rules),
            LabelTarget::Hidden
        ));
    }

    #[test]
    fn pinned_labels_bypass_the_filters() {
        let rules = rules();
        let done = NodeStatus {
            completed: true,
            accessible: true,
            failed: true,
        };
        assert!(matches!(
            label_target(&record(Some("Creek")), done, false, &rules),
            LabelTarget::Hidden
        ));
        assert!(matches!(
            label_target(&record(Some(" Creek ")), done, true, &rules),
            LabelTarget::Named(name) if name == "Creek"
        ));
    }

    #[test]
    fn later_records_win_for_labels() {
        let record = |name: &str| NodeRecord {
            key: NodeKey(2, 2),
            position: pos2(0.0, 0.0),
            status: NodeStatus::default(),
            name: Some(name.to_owned()),
            biome: None,
        };
        let snapshot = Snapshot {
            nodes: vec![record("Creek"), record("Mesa")],
            connections: Vec::new(),
            viewer: None,
        };

        let labels = label_records(&snapshot);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[&NodeKey(2, 2)].name.as_deref(), Some("Mesa"));
    }
}

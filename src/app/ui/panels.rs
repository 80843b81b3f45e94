use std::collections::VecDeque;

use eframe::egui::{self, Align, Context, Layout, Pos2, Rect, Vec2};

use crate::atlas::Snapshot;
use crate::config::OverlaySettings;

use super::super::{FrameStats, ViewModel};

fn world_bounds(snapshot: &Snapshot) -> Rect {
    let positions = snapshot
        .nodes
        .iter()
        .filter(|record| record.is_valid())
        .map(|record| record.position)
        .collect::<Vec<_>>();
    Rect::from_points(&positions)
}

fn initial_viewer(snapshot: &Snapshot, bounds: Rect) -> Pos2 {
    snapshot
        .viewer
        .or_else(|| bounds.is_finite().then(|| bounds.center()))
        .unwrap_or(Pos2::ZERO)
}

impl ViewModel {
    pub(in crate::app) fn new(
        snapshot: Snapshot,
        source_label: String,
        settings: OverlaySettings,
    ) -> Self {
        let world_bounds = world_bounds(&snapshot);
        let viewer = initial_viewer(&snapshot, world_bounds);

        Self {
            snapshot,
            source_label,
            settings,
            world_bounds,
            pan: Vec2::ZERO,
            zoom: 1.0,
            fit_requested: true,
            viewer,
            follow_pointer: false,
            pinned: None,
            focus_request: None,
            find_query: String::new(),
            find_cache: None,
            pinned_summary: None,
            frame_stats: FrameStats::default(),
            show_fps_bar: true,
            fps_show_current: true,
            fps_show_average: true,
            fps_show_frame_time: false,
            fps_show_routing: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    /// Swaps in a freshly loaded snapshot, keeping view, viewer and settings.
    pub(in crate::app) fn replace_snapshot(&mut self, snapshot: Snapshot) {
        self.world_bounds = world_bounds(&snapshot);
        if let Some(viewer) = snapshot.viewer {
            self.viewer = viewer;
        }
        if self
            .pinned
            .is_some_and(|key| snapshot.node(key).is_none())
        {
            self.pinned = None;
        }
        self.snapshot = snapshot;
        self.invalidate_find_cache();
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("atlas-route");
                    ui.separator();
                    ui.label(format!("source: {}", self.source_label));
                    ui.label(format!("nodes: {}", self.snapshot.node_count()));
                    ui.label(format!("connections: {}", self.snapshot.connection_count()));
                    if self.snapshot.is_empty() {
                        ui.label("(empty)");
                    }
                    if self.snapshot.exceeds_ceiling() {
                        ui.colored_label(egui::Color32::from_rgb(241, 146, 94), "over ceiling");
                    }
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Fit view").clicked() {
                        self.fit_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.visible_graph_text());
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_atlas(ui));

        if self.follow_pointer {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use crate::atlas::{NodeKey, demo_snapshot};

    use super::*;

    #[test]
    fn new_model_uses_the_captured_viewer() {
        let snapshot = demo_snapshot(2, 6, 4);
        let expected = snapshot.viewer;
        let model = ViewModel::new(snapshot, "demo".to_owned(), OverlaySettings::default());
        assert_eq!(Some(model.viewer), expected);
        assert!(model.world_bounds.is_positive());
        assert!(model.fit_requested);
    }

    #[test]
    fn viewer_falls_back_to_the_atlas_center() {
        let mut snapshot = demo_snapshot(2, 3, 3);
        snapshot.viewer = None;
        let bounds = world_bounds(&snapshot);
        assert_eq!(initial_viewer(&snapshot, bounds), bounds.center());
        assert_eq!(initial_viewer(&Snapshot::default(), Rect::NOTHING), pos2(0.0, 0.0));
    }

    #[test]
    fn reload_drops_a_pin_that_no_longer_exists() {
        let mut model = ViewModel::new(
            demo_snapshot(2, 6, 4),
            "demo".to_owned(),
            OverlaySettings::default(),
        );
        model.pinned = Some(NodeKey(6, 4));
        model.replace_snapshot(demo_snapshot(2, 3, 3));
        assert_eq!(model.pinned, None);
        assert_eq!(model.snapshot.node_count(), 10);
    }
}

use eframe::egui::{self, Rect, Ui};

use crate::atlas::NodeKey;

use super::super::ViewModel;
use super::super::render_utils::screen_to_world;

impl ViewModel {
    pub(in crate::app) fn handle_atlas_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before.to_vec2() * self.zoom);
    }

    pub(in crate::app) fn handle_atlas_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Double-click drops the viewer under the pointer; follow mode keeps it there.
    pub(in crate::app) fn handle_viewer_moves(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        let Some(pointer) = ui.input(|input| input.pointer.hover_pos()) else {
            return;
        };
        if !rect.contains(pointer) {
            return;
        }

        if response.double_clicked() || (self.follow_pointer && response.hovered()) {
            self.viewer = screen_to_world(rect, self.pan, self.zoom, pointer);
        }
    }

    pub(in crate::app) fn fit_to(&mut self, rect: Rect) {
        self.fit_requested = false;
        let bounds = self.world_bounds;
        if !bounds.is_positive() || !bounds.is_finite() {
            self.zoom = 1.0;
            self.pan = -bounds.center().to_vec2();
            if !self.pan.is_finite() {
                self.pan = egui::Vec2::ZERO;
            }
            return;
        }

        let fit = (rect.width() / bounds.width()).min(rect.height() / bounds.height()) * 0.9;
        self.zoom = fit.clamp(0.05, 6.0);
        self.pan = -bounds.center().to_vec2() * self.zoom;
    }

    pub(in crate::app) fn focus_on(&mut self, key: NodeKey) {
        if let Some(record) = self.snapshot.node(key)
            && record.is_valid()
        {
            self.pan = -record.position.to_vec2() * self.zoom;
        }
    }

    pub(in crate::app) fn toggle_pinned(&mut self, key: NodeKey) {
        self.pinned = if self.pinned == Some(key) {
            None
        } else {
            Some(key)
        };
    }
}

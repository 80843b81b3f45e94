use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::atlas::{Marker, Segment};
use crate::config::{OverlaySettings, color32};

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Pos2) -> Pos2 {
    rect.center() + pan + world.to_vec2() * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Pos2 {
    ((screen - rect.center() - pan) / zoom).to_pos2()
}

pub(super) fn draw_segments(
    painter: &Painter,
    segments: &[Segment],
    settings: &OverlaySettings,
    thickness: f32,
) {
    for segment in segments {
        painter.line_segment(
            [segment.a, segment.b],
            Stroke::new(thickness, settings.class_color(segment.class)),
        );
    }
}

pub(super) fn draw_markers(painter: &Painter, rect: Rect, markers: &[Marker], settings: &OverlaySettings) {
    let outline = color32(settings.palette.outline);
    for marker in markers {
        if !circle_visible(rect, marker.point, marker.radius) {
            continue;
        }
        painter.circle_filled(marker.point, marker.radius, settings.class_color(marker.class));
        painter.circle_stroke(
            marker.point,
            marker.radius,
            Stroke::new((marker.radius * 0.35).max(1.0), outline),
        );
    }
}

pub(super) fn draw_viewer(painter: &Painter, position: Pos2, scale: f32) {
    let radius = 7.0 * scale;
    painter.circle_filled(position, radius, Color32::from_rgb(103, 196, 255));
    painter.circle_stroke(
        position,
        radius + 3.0,
        Stroke::new(1.5, Color32::from_rgba_unmultiplied(103, 196, 255, 120)),
    );
}

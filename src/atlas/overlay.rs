use eframe::egui::{Pos2, Rect};

use super::graph::Graph;
use super::snapshot::NodeKey;

/// Render class of a segment or marker. The host maps each class to a color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorClass {
    Grid,
    Citadel,
    Tower,
    Search,
    Pinned,
    /// Between or at completed / reachable nodes.
    Favorable,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub a: Pos2,
    pub b: Pos2,
    pub class: ColorClass,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    pub point: Pos2,
    pub class: ColorClass,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouteStyle {
    pub class: ColorClass,
    pub thickness: f32,
}

impl RouteStyle {
    fn terminal_offset(self) -> f32 {
        self.thickness * 0.6
    }
}

/// Drawable output of one or more routes. Segments are drawn before markers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlay {
    pub segments: Vec<Segment>,
    pub markers: Vec<Marker>,
}

impl Overlay {
    pub fn extend(&mut self, other: Overlay) {
        self.segments.extend(other.segments);
        self.markers.extend(other.markers);
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.markers.is_empty()
    }
}

/// Turns a planned path into drawable segments and markers.
///
/// The route starts at `origin` (which is not a graph node), runs through the
/// path's node centers and ends on the border of `destination`. An empty path
/// degrades to [`direct_line`].
pub fn classify(
    path: &[NodeKey],
    graph: &Graph,
    origin: Pos2,
    destination: Rect,
    style: RouteStyle,
) -> Overlay {
    let stops = path
        .iter()
        .filter_map(|key| Some((graph.position(*key)?, graph.status(*key))))
        .collect::<Vec<_>>();

    let (Some(&(first, first_status)), Some(&(last, _))) = (stops.first(), stops.last()) else {
        return direct_line(origin, destination, style);
    };

    let mut overlay = Overlay {
        segments: Vec::with_capacity(stops.len() + 1),
        markers: Vec::with_capacity(stops.len() + 1),
    };

    overlay.segments.push(Segment {
        a: origin,
        b: first,
        class: style.class,
    });
    if first_status.completed {
        overlay.markers.push(favorable_marker(first, style));
    }

    for pair in stops.windows(2) {
        let [(a, a_status), (b, b_status)] = pair else {
            continue;
        };
        let favorable = (a_status.completed && b_status.completed)
            || (a_status.accessible && b_status.accessible);
        overlay.segments.push(Segment {
            a: *a,
            b: *b,
            class: if favorable {
                ColorClass::Favorable
            } else {
                style.class
            },
        });
        if b_status.completed {
            overlay.markers.push(favorable_marker(*b, style));
        }
    }

    overlay.extend(approach(last, destination, style));
    overlay
}

/// Straight line from `origin` to the border of `destination`.
pub fn direct_line(origin: Pos2, destination: Rect, style: RouteStyle) -> Overlay {
    let mut overlay = Overlay {
        segments: Vec::with_capacity(1),
        markers: Vec::with_capacity(1),
    };
    overlay.extend(approach(origin, destination, style));
    overlay
}

fn approach(from: Pos2, destination: Rect, style: RouteStyle) -> Overlay {
    let tip = line_rect_intersection(from, destination);
    Overlay {
        segments: vec![Segment {
            a: from,
            b: tip,
            class: style.class,
        }],
        markers: vec![Marker {
            point: offset_outside(tip, destination.center(), style.terminal_offset()),
            class: style.class,
            radius: style.thickness,
        }],
    }
}

fn favorable_marker(point: Pos2, style: RouteStyle) -> Marker {
    Marker {
        point,
        class: ColorClass::Favorable,
        radius: style.thickness,
    }
}

/// Point where the ray from `from` toward the center of `rect` enters `rect`.
///
/// A `from` already inside the rectangle is returned unchanged.
pub fn line_rect_intersection(from: Pos2, rect: Rect) -> Pos2 {
    if rect.contains(from) {
        return from;
    }

    let center = rect.center();
    let direction = center - from;
    let dir_x = if direction.x == 0.0 { 1e-6 } else { direction.x };
    let dir_y = if direction.y == 0.0 { 1e-6 } else { direction.y };

    let (mut t_min_x, mut t_max_x) = ((rect.min.x - from.x) / dir_x, (rect.max.x - from.x) / dir_x);
    let (mut t_min_y, mut t_max_y) = ((rect.min.y - from.y) / dir_y, (rect.max.y - from.y) / dir_y);
    if t_min_x > t_max_x {
        std::mem::swap(&mut t_min_x, &mut t_max_x);
    }
    if t_min_y > t_max_y {
        std::mem::swap(&mut t_min_y, &mut t_max_y);
    }

    let t_enter = t_min_x.max(t_min_y);
    let t_exit = t_max_x.min(t_max_y);
    if t_enter > t_exit || t_enter < 0.0 {
        return center;
    }

    from + direction * t_enter.min(1.0)
}

/// Moves `point` by `distance` directly away from `center`.
pub fn offset_outside(point: Pos2, center: Pos2, distance: f32) -> Pos2 {
    let direction = point - center;
    if direction.length_sq() < 1e-6 {
        return point;
    }
    point + direction.normalized() * distance
}

use std::collections::HashSet;

use eframe::egui::{Pos2, Rect};

use super::overlay::ColorClass;
use super::snapshot::NodeStatus;

/// Trims, maps non-breaking spaces to spaces and collapses whitespace runs.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rejects names read from uninitialised or garbled memory.
pub fn is_printable_name(name: &str) -> bool {
    if name.is_empty() || name.chars().all(|ch| ch == '?' || ch.is_whitespace()) {
        return false;
    }
    !name.chars().any(|ch| {
        ch == '\u{FFFD}' || ch.is_control() || is_format_char(ch) || is_private_use(ch)
    })
}

fn is_format_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{00AD}' | '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
    )
}

fn is_private_use(ch: char) -> bool {
    matches!(ch, '\u{E000}'..='\u{F8FF}' | '\u{F0000}'..='\u{10FFFF}')
}

/// Comma-separated search terms, normalised and lowercased; empty terms are dropped.
pub fn split_search_terms(query: &str) -> Vec<String> {
    query
        .split(',')
        .map(normalize_name)
        .filter(|term| !term.is_empty())
        .map(|term| term.to_lowercase())
        .collect()
}

/// `screen` grown on every side by `range - 1` times its own size.
pub fn range_bounds(screen: Rect, range: f32) -> Rect {
    screen.expand2(screen.size() * (range - 1.0))
}

/// Per-frame label and destination rules derived from the overlay settings.
#[derive(Clone, Debug)]
pub struct TargetRules {
    pub hide_completed: bool,
    pub hide_inaccessible: bool,
    pub hide_failed: bool,
    pub citadel_lines: bool,
    pub tower_lines: bool,
    /// Lowercased, normalised names of the tower maps.
    pub towers: HashSet<String>,
    pub tower_bounds: Rect,
    pub search_lines: bool,
    pub search_terms: Vec<String>,
    pub search_bounds: Rect,
}

impl TargetRules {
    pub fn matches_search(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.search_terms.iter().any(|term| name.contains(term.as_str()))
    }

    pub fn label_visible(&self, name: &str, status: NodeStatus) -> bool {
        if !is_printable_name(name) {
            return false;
        }
        if !self.search_terms.is_empty() && !self.matches_search(name) {
            return false;
        }
        if self.hide_completed && status.completed {
            return false;
        }
        if self.hide_failed && status.failed {
            return false;
        }
        !(self.hide_inaccessible && !status.accessible)
    }

    /// Route class for a label anchored at `anchor`, or `None` when no line is wanted.
    pub fn destination_class(
        &self,
        name: &str,
        status: NodeStatus,
        anchor: Pos2,
        pinned: bool,
    ) -> Option<ColorClass> {
        let lowered = name.to_lowercase();
        if self.citadel_lines && lowered.ends_with("citadel") {
            return Some(ColorClass::Citadel);
        }
        if self.tower_lines
            && !status.completed
            && self.towers.contains(&lowered)
            && self.tower_bounds.contains(anchor)
        {
            return Some(ColorClass::Tower);
        }
        if self.search_lines
            && !self.search_terms.is_empty()
            && self.matches_search(name)
            && self.search_bounds.contains(anchor)
        {
            return Some(ColorClass::Search);
        }
        pinned.then_some(ColorClass::Pinned)
    }
}

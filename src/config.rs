use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{Color32, Rect, Vec2, vec2};
use serde::Deserialize;
use tracing::debug;

use crate::atlas::{ColorClass, TargetRules, normalize_name, range_bounds, split_search_terms};

/// RGBA in `0.0..=1.0`, the format settings files use for colors.
pub type Rgba = [f32; 4];

pub fn color32(rgba: Rgba) -> Color32 {
    let [r, g, b, a] = rgba.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8);
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlaySettings {
    pub route_through_nodes: bool,
    pub path_thickness: f32,

    pub search_query: String,
    pub draw_search_lines: bool,
    pub search_range: f32,

    pub draw_citadel_lines: bool,
    pub draw_tower_lines: bool,
    pub tower_range: f32,

    pub hide_completed: bool,
    pub hide_inaccessible: bool,
    pub hide_failed: bool,

    pub draw_grid: bool,
    pub grid_color: Rgba,
    pub grid_skip_completed: bool,

    pub show_biome_border: bool,
    pub biome_border_thickness: f32,
    pub biome_overrides: BTreeMap<u8, BiomeOverride>,
    /// Attached after loading from a separate biome table file.
    #[serde(skip)]
    pub biomes: BiomeTable,

    pub scale_multiplier: f32,
    pub anchor_nudge: [f32; 2],
    pub default_background: Rgba,
    pub default_font: Rgba,
    pub map_groups: Vec<MapGroup>,
    pub palette: RoutePalette,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            route_through_nodes: true,
            path_thickness: 3.0,
            search_query: String::new(),
            draw_search_lines: true,
            search_range: 1.3,
            draw_citadel_lines: false,
            draw_tower_lines: false,
            tower_range: 1.3,
            hide_completed: true,
            hide_inaccessible: false,
            hide_failed: true,
            draw_grid: false,
            grid_color: [1.0, 1.0, 1.0, 0.35],
            grid_skip_completed: false,
            show_biome_border: true,
            biome_border_thickness: 2.5,
            biome_overrides: BTreeMap::new(),
            biomes: BiomeTable::default(),
            scale_multiplier: 1.1,
            anchor_nudge: [0.0, 0.0],
            default_background: [0.0, 0.0, 0.0, 0.85],
            default_font: [1.0, 1.0, 1.0, 1.0],
            map_groups: default_map_groups(),
            palette: RoutePalette::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MapGroup {
    pub name: String,
    pub background: Rgba,
    pub font: Rgba,
    #[serde(default)]
    pub maps: Vec<String>,
}

impl MapGroup {
    fn new(name: &str, background: Rgba, font: Rgba, maps: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            background,
            font,
            maps: maps.iter().map(|map| (*map).to_owned()).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = normalize_name(name);
        self.maps
            .iter()
            .any(|map| normalize_name(map).eq_ignore_ascii_case(&name))
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoutePalette {
    pub citadel: Rgba,
    pub tower: Rgba,
    pub search: Rgba,
    pub pinned: Rgba,
    pub favorable: Rgba,
    pub outline: Rgba,
}

impl Default for RoutePalette {
    fn default() -> Self {
        Self {
            citadel: [1.0, 0.0, 0.0, 1.0],
            tower: [0.051, 0.757, 0.776, 1.0],
            search: [1.0, 1.0, 1.0, 1.0],
            pinned: [1.0, 0.647, 0.0, 1.0],
            favorable: [0.0, 1.0, 0.0, 1.0],
            outline: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Border style of one biome.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct BiomeInfo {
    pub label: String,
    pub border: Rgba,
    pub show: bool,
}

impl Default for BiomeInfo {
    fn default() -> Self {
        Self {
            label: String::new(),
            border: [1.0, 1.0, 1.0, 1.0],
            show: true,
        }
    }
}

impl BiomeInfo {
    fn new(label: &str, border: Rgba) -> Self {
        Self {
            label: label.to_owned(),
            border,
            show: true,
        }
    }

    pub fn display_label(&self, id: u8) -> String {
        if self.label.trim().is_empty() {
            format!("Biome {id}")
        } else {
            self.label.clone()
        }
    }
}

/// Session edits layered over a biome table entry.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct BiomeOverride {
    pub border: Option<Rgba>,
    pub show: Option<bool>,
}

/// Biome id to border style, read from a JSON object keyed by the id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BiomeTable(BTreeMap<u8, BiomeInfo>);

impl BiomeTable {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read biome table {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid biome table in {}", path.display()))
    }

    /// Entries whose key is not a `0..=255` id are skipped.
    pub fn from_json(raw: &str) -> Result<Self> {
        let entries: BTreeMap<String, BiomeInfo> = serde_json::from_str(raw)?;
        let mut table = BTreeMap::new();
        for (id, info) in entries {
            match id.trim().parse::<u8>() {
                Ok(id) => {
                    table.insert(id, info);
                }
                Err(_) => debug!(id = %id, "skipping biome entry with a non-numeric id"),
            }
        }
        Ok(Self(table))
    }

    /// Bands used by the procedural demo atlas.
    pub fn demo() -> Self {
        Self(BTreeMap::from([
            (1, BiomeInfo::new("Lowlands", [0.357, 0.741, 0.341, 1.0])),
            (2, BiomeInfo::new("Woods", [0.180, 0.459, 0.235, 1.0])),
            (3, BiomeInfo::new("Highlands", [0.608, 0.541, 0.420, 1.0])),
            (4, BiomeInfo::new("Coast", [0.263, 0.561, 0.859, 1.0])),
        ]))
    }

    pub fn get(&self, id: u8) -> Option<&BiomeInfo> {
        self.0.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &BiomeInfo)> + '_ {
        self.0.iter().map(|(id, info)| (*id, info))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelColors {
    pub background: Color32,
    pub font: Color32,
}

impl OverlaySettings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid settings in {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// First group listing `name`, compared case-insensitively after normalising.
    pub fn group_for(&self, name: &str) -> Option<&MapGroup> {
        self.map_groups.iter().find(|group| group.contains(name))
    }

    pub fn group_named(&self, group: &str) -> Option<&MapGroup> {
        self.map_groups
            .iter()
            .find(|candidate| candidate.name.eq_ignore_ascii_case(group))
    }

    pub fn label_colors(&self, name: &str, completed: bool) -> LabelColors {
        let (mut background, font) = self
            .group_for(name)
            .map_or((self.default_background, self.default_font), |group| {
                (group.background, group.font)
            });
        if completed {
            background[3] *= 0.4;
        }
        LabelColors {
            background: color32(background),
            font: color32(font),
        }
    }

    /// Visibility and border color of biome `id` after session overrides.
    pub fn resolved_biome(&self, id: u8) -> Option<(bool, Rgba)> {
        let info = self.biomes.get(id)?;
        let overrides = self.biome_overrides.get(&id).copied().unwrap_or_default();
        Some((
            overrides.show.unwrap_or(info.show),
            overrides.border.unwrap_or(info.border),
        ))
    }

    /// Label border for a node in `biome`; completed maps fade like their label.
    pub fn biome_border(&self, biome: Option<u8>, completed: bool) -> Option<Color32> {
        if !self.show_biome_border {
            return None;
        }
        let (show, mut border) = self.resolved_biome(biome?)?;
        if !show {
            return None;
        }
        if completed {
            border[3] *= 0.4;
        }
        Some(color32(border))
    }

    pub fn class_color(&self, class: ColorClass) -> Color32 {
        let palette = &self.palette;
        color32(match class {
            ColorClass::Grid => self.grid_color,
            ColorClass::Citadel => palette.citadel,
            ColorClass::Tower => palette.tower,
            ColorClass::Search => palette.search,
            ColorClass::Pinned => palette.pinned,
            ColorClass::Favorable => palette.favorable,
        })
    }

    /// Label and destination rules for a frame drawn into `screen`.
    pub fn target_rules(&self, screen: Rect) -> TargetRules {
        TargetRules {
            hide_completed: self.hide_completed,
            hide_inaccessible: self.hide_inaccessible,
            hide_failed: self.hide_failed,
            citadel_lines: self.draw_citadel_lines,
            tower_lines: self.draw_tower_lines,
            towers: self
                .group_named("Towers")
                .map(|group| {
                    group
                        .maps
                        .iter()
                        .map(|map| normalize_name(map).to_lowercase())
                        .collect()
                })
                .unwrap_or_default(),
            tower_bounds: range_bounds(screen, self.tower_range),
            search_lines: self.draw_search_lines,
            search_terms: split_search_terms(&self.search_query),
            search_bounds: range_bounds(screen, self.search_range),
        }
    }

    pub fn anchor_nudge(&self) -> Vec2 {
        vec2(self.anchor_nudge[0], self.anchor_nudge[1])
    }
}

fn default_map_groups() -> Vec<MapGroup> {
    vec![
        MapGroup::new(
            "Citadels",
            [1.0, 1.0, 1.0, 0.85],
            [1.0, 0.0, 0.0, 1.0],
            &["The Copper Citadel", "The Iron Citadel", "The Stone Citadel"],
        ),
        MapGroup::new(
            "Towers",
            [0.863, 0.0, 0.882, 0.85],
            [0.0, 0.0, 0.0, 1.0],
            &["Bluff", "Lost Towers", "Mesa", "Sinking Spire", "Alpine Ridge"],
        ),
        MapGroup::new(
            "Pinnacle Boss",
            [0.471, 0.196, 0.471, 0.85],
            [1.0, 1.0, 1.0, 1.0],
            &["The Burning Monolith"],
        ),
        MapGroup::new(
            "Good",
            [0.157, 0.157, 0.0, 0.85],
            [1.0, 1.0, 0.0, 1.0],
            &[
                "Burial Bog",
                "Creek",
                "Rustbowl",
                "Sandspit",
                "Savannah",
                "Steaming Springs",
                "Steppe",
                "Wetlands",
                "Willow",
            ],
        ),
        MapGroup::new(
            "Special",
            [0.737, 0.376, 0.145, 0.85],
            [0.0, 0.0, 0.0, 1.0],
            &[
                "Untainted Paradise",
                "Vaults of Kamasa",
                "Moment of Zen",
                "The Ezomyte Megaliths",
                "Derelict Mansion",
                "The Viridian Wildwood",
                "The Jade Isles",
                "Castaway",
                "The Fractured Lake",
                "Ice Cave",
            ],
        ),
    ]
}

use eframe::egui::{self, Key, Response, RichText, Ui};

use crate::util::short_name;

use super::super::ViewModel;

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

fn default_slider_key_step(min: f32, max: f32) -> f32 {
    ((max - min) / 200.0).max(0.0005)
}

fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    min: f32,
    max: f32,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    if increase_down {
        hold_state.positive_secs += delta_time;
    } else {
        hold_state.positive_secs = 0.0;
    }

    if decrease_down {
        hold_state.negative_secs += delta_time;
    } else {
        hold_state.negative_secs = 0.0;
    }

    let direction = (increase_down as i8) - (decrease_down as i8);
    if direction == 0 {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, hold_state));
        return false;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    let delta = direction as f32 * default_slider_key_step(min, max) * speed * delta_time;

    let old_value = *value;
    *value = (*value + delta).clamp(min, max);
    let changed = (*value - old_value).abs() > f32::EPSILON;

    ui.ctx().request_repaint();
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));
    changed
}

fn accelerated_slider(ui: &mut Ui, value: &mut f32, min: f32, max: f32, text: &str, hint: &str) {
    let slider = ui
        .add(
            egui::Slider::new(&mut *value, min..=max)
                .text(text)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hint);
    if slider.hovered() {
        slider.request_focus();
    }
    apply_slider_arrow_acceleration(ui, &slider, value, min, max);
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Overlay Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_find_map(ui);
        ui.separator();

        let settings = &mut self.settings;

        egui::CollapsingHeader::new("Routing")
            .default_open(true)
            .show(ui, |ui| {
                ui.checkbox(&mut settings.route_through_nodes, "Route lines through nodes")
                    .on_hover_text("Follow atlas connections instead of drawing straight lines.");
                accelerated_slider(
                    ui,
                    &mut settings.path_thickness,
                    1.0,
                    8.0,
                    "Path thickness",
                    "Line width before UI scaling.",
                );
            });

        egui::CollapsingHeader::new("Search")
            .default_open(true)
            .show(ui, |ui| {
                ui.label("Search map")
                    .on_hover_text("Search multiple maps at once using a comma separator.");
                ui.horizontal(|ui| {
                    ui.text_edit_singleline(&mut settings.search_query);
                    if ui.button("Clear").clicked() {
                        settings.search_query.clear();
                    }
                });
                ui.checkbox(&mut settings.draw_search_lines, "Draw lines to search in range");
                ui.add_enabled_ui(settings.draw_search_lines, |ui| {
                    accelerated_slider(
                        ui,
                        &mut settings.search_range,
                        1.0,
                        10.0,
                        "Search range",
                        "Multiples of the canvas size searched around it.",
                    );
                });
            });

        egui::CollapsingHeader::new("Destinations")
            .default_open(true)
            .show(ui, |ui| {
                ui.checkbox(&mut settings.draw_citadel_lines, "Draw lines to citadels");
                ui.checkbox(&mut settings.draw_tower_lines, "Draw lines to towers in range");
                ui.add_enabled_ui(settings.draw_tower_lines, |ui| {
                    accelerated_slider(
                        ui,
                        &mut settings.tower_range,
                        1.0,
                        10.0,
                        "Tower range",
                        "Multiples of the canvas size searched for towers.",
                    );
                });
            });

        egui::CollapsingHeader::new("Filters").show(ui, |ui| {
            ui.checkbox(&mut settings.hide_completed, "Hide completed maps");
            ui.checkbox(&mut settings.hide_inaccessible, "Hide not accessible maps");
            ui.checkbox(&mut settings.hide_failed, "Hide failed maps");
        });

        egui::CollapsingHeader::new("Biomes").show(ui, |ui| {
            ui.checkbox(&mut settings.show_biome_border, "Show biome border");
            ui.add_enabled_ui(settings.show_biome_border, |ui| {
                accelerated_slider(
                    ui,
                    &mut settings.biome_border_thickness,
                    1.0,
                    6.0,
                    "Biome border thickness",
                    "Border width before UI scaling.",
                );
                if settings.biomes.is_empty() {
                    ui.weak("No biome table loaded.");
                }
                let entries = settings
                    .biomes
                    .iter()
                    .map(|(id, info)| (id, info.display_label(id)))
                    .collect::<Vec<_>>();
                for (id, label) in entries {
                    let Some((mut show, mut border)) = settings.resolved_biome(id) else {
                        continue;
                    };
                    ui.horizontal(|ui| {
                        if ui.checkbox(&mut show, "").changed() {
                            settings.biome_overrides.entry(id).or_default().show = Some(show);
                        }
                        if ui.color_edit_button_rgba_unmultiplied(&mut border).changed() {
                            settings.biome_overrides.entry(id).or_default().border = Some(border);
                        }
                        ui.label(label);
                    });
                }
            });
        });

        egui::CollapsingHeader::new("Grid").show(ui, |ui| {
            ui.checkbox(&mut settings.draw_grid, "Draw atlas grid");
            ui.add_enabled_ui(settings.draw_grid, |ui| {
                ui.checkbox(
                    &mut settings.grid_skip_completed,
                    "Hide connections to completed maps",
                );
            });
        });

        egui::CollapsingHeader::new("Appearance").show(ui, |ui| {
            accelerated_slider(
                ui,
                &mut settings.scale_multiplier,
                0.5,
                4.0,
                "Scale",
                "Label and line scale multiplier.",
            );
            ui.horizontal(|ui| {
                ui.label("Label nudge");
                ui.add(egui::DragValue::new(&mut settings.anchor_nudge[0]).prefix("x "));
                ui.add(egui::DragValue::new(&mut settings.anchor_nudge[1]).prefix("y "));
            });
            for group in &settings.map_groups {
                ui.label(format!("{}: {} maps", group.name, group.maps.len()));
            }
        });

        ui.separator();
        ui.checkbox(&mut self.follow_pointer, "Viewer follows pointer")
            .on_hover_text("Move the viewer with the mouse. Double-click places it otherwise.");

        ui.checkbox(&mut self.show_fps_bar, "FPS Display")
            .on_hover_text("Show a live FPS readout in the header.");

        ui.collapsing("FPS Display tuning", |ui| {
            ui.add_enabled_ui(self.show_fps_bar, |ui| {
                ui.checkbox(&mut self.fps_show_current, "Show current FPS");
                ui.checkbox(&mut self.fps_show_average, "Show average FPS");
                ui.checkbox(&mut self.fps_show_frame_time, "Show frame time");
                ui.checkbox(&mut self.fps_show_routing, "Show routing time");
            });
        });
    }

    fn draw_find_map(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Find map").strong())
            .on_hover_text("Fuzzy-find a map by name, then click it to pin and center it.");
        ui.text_edit_singleline(&mut self.find_query);

        let mut picked = None;
        let matches = self.find_matches();
        if matches.is_empty() {
            return;
        }
        egui::ScrollArea::vertical()
            .id_salt("find_map_scroll")
            .max_height(180.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for entry in matches {
                    let label = format!(
                        "{}  ({}, {})",
                        short_name(&entry.name, 28),
                        entry.key.0,
                        entry.key.1
                    );
                    if ui.link(label).on_hover_text(entry.name.as_str()).clicked() {
                        picked = Some(entry.key);
                    }
                }
            });

        if let Some(key) = picked {
            self.pinned = Some(key);
            self.focus_request = Some(key);
        }
    }
}

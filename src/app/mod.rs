use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use eframe::egui::{self, Context, Pos2, Rect, Vec2};
use tracing::warn;

use crate::atlas::{NodeKey, NodeStatus, RouteSummary, Snapshot, SnapshotSource};
use crate::config::OverlaySettings;

mod map;
mod render_utils;
mod ui;

type LoadResult = Result<Snapshot, String>;

pub struct AtlasApp {
    source: SnapshotSource,
    settings: OverlaySettings,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    snapshot: Snapshot,
    source_label: String,
    settings: OverlaySettings,
    world_bounds: Rect,
    pan: Vec2,
    zoom: f32,
    fit_requested: bool,
    viewer: Pos2,
    follow_pointer: bool,
    pinned: Option<NodeKey>,
    focus_request: Option<NodeKey>,
    find_query: String,
    find_cache: Option<FindCache>,
    pinned_summary: Option<PinnedSummary>,
    frame_stats: FrameStats,
    show_fps_bar: bool,
    fps_show_current: bool,
    fps_show_average: bool,
    fps_show_frame_time: bool,
    fps_show_routing: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

struct FindCache {
    query: String,
    matches: Vec<FindMatch>,
}

#[derive(Clone)]
struct FindMatch {
    key: NodeKey,
    name: String,
    score: i64,
}

/// Route to the pinned destination as planned in the last frame.
struct PinnedSummary {
    start: Option<NodeKey>,
    route: Option<RouteSummary>,
    zoom: f32,
}

#[derive(Clone, Copy, Default)]
struct FrameStats {
    graph_nodes: usize,
    graph_edges: usize,
    grid_segments: usize,
    routes_drawn: usize,
    routes_planned: usize,
    labels_drawn: usize,
    routing_time: Duration,
}

fn status_text(status: NodeStatus) -> &'static str {
    match (status.completed, status.accessible) {
        (true, _) => "completed",
        (false, true) => "accessible",
        (false, false) => "not accessible",
    }
}

impl AtlasApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: SnapshotSource,
        settings: OverlaySettings,
    ) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            settings,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: SnapshotSource) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = source.load().map_err(|error| {
                warn!(source = %source.describe(), "snapshot load failed: {error:#}");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: SnapshotSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, snapshot: Snapshot) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(
            snapshot,
            self.source.describe(),
            self.settings.clone(),
        )))
    }
}

impl eframe::App for AtlasApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(snapshot)) => transition = Some(Ok(snapshot)),
                    Ok(Err(error)) => transition = Some(Err(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint_after(Duration::from_millis(50)),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading atlas snapshot...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load atlas snapshot");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    self.state = Self::start_load(self.source.clone());
                    return;
                }
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(snapshot)) => model.replace_snapshot(snapshot),
                        Ok(Err(error)) => transition = Some(Err(error)),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint_after(Duration::from_millis(50));
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }

                // Session edits survive a reload or a later error + retry.
                self.settings.clone_from(&model.settings);
            }
        }

        if let Some(next) = transition {
            self.reload_rx = None;
            self.state = match next {
                Ok(snapshot) => self.ready(snapshot),
                Err(error) => AppState::Error(error),
            };
        }
    }
}

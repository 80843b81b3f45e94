mod demo;
mod frame;
mod graph;
mod load;
mod overlay;
mod parse;
mod route;
mod snapshot;
mod targets;

pub use demo::{DEMO_MAX_CELLS, demo_snapshot};
pub use frame::{FrameOverlay, FrameRouter, RouteQuery, RouteSummary, grid_overview};
pub use graph::Graph;
pub use load::SnapshotSource;
pub use overlay::{ColorClass, Marker, RouteStyle, Segment};
pub use snapshot::{NodeKey, NodeRecord, NodeStatus, Snapshot};
pub use targets::{
    TargetRules, is_printable_name, normalize_name, range_bounds, split_search_terms,
};

mod app;
mod atlas;
mod config;
mod util;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use atlas::{DEMO_MAX_CELLS, SnapshotSource};
use config::{BiomeTable, OverlaySettings};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Captured atlas snapshot (JSON). A procedural atlas is shown when omitted.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Overlay settings (JSON); missing fields keep their defaults.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Biome border table (JSON object keyed by biome id). The demo atlas brings its own.
    #[arg(long)]
    biomes: Option<PathBuf>,

    #[arg(long, default_value_t = 7)]
    seed: u64,

    #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(i32).range(1..=i64::from(DEMO_MAX_CELLS)))]
    columns: i32,

    /// Demo rows; trimmed when columns x rows exceeds the demo cell limit.
    #[arg(long, default_value_t = 14, value_parser = clap::value_parser!(i32).range(1..=i64::from(DEMO_MAX_CELLS)))]
    rows: i32,
}

impl Args {
    fn source(&self) -> SnapshotSource {
        match &self.snapshot {
            Some(path) => SnapshotSource::Capture(path.clone()),
            None => SnapshotSource::Demo {
                seed: self.seed,
                columns: self.columns,
                rows: self.rows,
            },
        }
    }

    fn biome_table(&self) -> Result<BiomeTable> {
        match &self.biomes {
            Some(path) => {
                let table = BiomeTable::load(path)?;
                info!(path = %path.display(), biomes = table.len(), "loaded biome table");
                Ok(table)
            }
            None if self.snapshot.is_none() => Ok(BiomeTable::demo()),
            None => Ok(BiomeTable::default()),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();
    let mut settings = match &args.settings {
        Some(path) => {
            let settings = OverlaySettings::load(path)?;
            info!(path = %path.display(), groups = settings.map_groups.len(), "loaded overlay settings");
            settings
        }
        None => OverlaySettings::default(),
    };
    settings.biomes = args.biome_table()?;
    let source = args.source();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "atlas-route",
        options,
        Box::new(move |cc| Ok(Box::new(app::AtlasApp::new(cc, source, settings)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_source_is_the_default() {
        let args = Args::parse_from(["atlas-route", "--columns", "10", "--rows", "6"]);
        assert_eq!(
            args.source(),
            SnapshotSource::Demo {
                seed: 7,
                columns: 10,
                rows: 6
            }
        );
    }

    #[test]
    fn snapshot_flag_selects_a_capture() {
        let args = Args::parse_from(["atlas-route", "--snapshot", "capture.json"]);
        assert_eq!(
            args.source(),
            SnapshotSource::Capture(PathBuf::from("capture.json"))
        );
    }

    #[test]
    fn grid_sides_are_bounded() {
        assert!(Args::try_parse_from(["atlas-route", "--columns", "0"]).is_err());
        assert!(Args::try_parse_from(["atlas-route", "--rows", "-3"]).is_err());
        assert!(Args::try_parse_from(["atlas-route", "--columns", "50000"]).is_err());
        assert!(Args::try_parse_from(["atlas-route", "--columns", "5000", "--rows", "1"]).is_ok());
    }

    #[test]
    fn demo_brings_its_own_biomes() {
        let demo = Args::parse_from(["atlas-route"]);
        assert_eq!(demo.biome_table().unwrap(), BiomeTable::demo());

        let capture = Args::parse_from(["atlas-route", "--snapshot", "capture.json"]);
        assert!(capture.biome_table().unwrap().is_empty());
    }
}

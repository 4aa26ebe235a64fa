mod app;
mod background;
mod config;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

use config::{ConfigOverrides, NeighborSearch, RenderConfig, Rgb};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with render settings; flags below take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Dot colour as "r, g, b".
    #[arg(long)]
    dot_color: Option<Rgb>,
    /// Line colour as "r, g, b".
    #[arg(long)]
    line_color: Option<Rgb>,
    /// Particle density multiplier.
    #[arg(long)]
    density: Option<f32>,
    /// Maximum distance, in points, for two particles to be connected.
    #[arg(long)]
    connection_distance: Option<f32>,
    #[arg(long, value_enum)]
    neighbor_search: Option<NeighborSearch>,
    /// Seed for particle placement; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            dot_color: self.dot_color,
            line_color: self.line_color,
            density: self.density,
            connection_distance: self.connection_distance,
            neighbor_search: self.neighbor_search,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = RenderConfig::resolve(args.config.as_deref(), &args.overrides())?;
    log::info!(
        "render config: dots {}, lines {}, density {}, connection distance {}",
        config.dot_color,
        config.line_color,
        config.density,
        config.connection_distance
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    let seed = args.seed;
    eframe::run_native(
        "plexus-backdrop",
        options,
        Box::new(move |cc| Ok(Box::new(app::PlexusApp::new(cc, config, seed)))),
    )
    .map_err(|error| anyhow!("failed to run the window: {error}"))
}

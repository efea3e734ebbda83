//! seismap - scatter maps of seismological points
//!
//! This is the main entry point for the seismap command-line tool.

use anyhow::Context;
use std::time::Instant;
use tracing::{error, info};

use seismap::{init_tracing, load_points, log_error, log_timed_operation, plot_map, Config};

fn main() -> anyhow::Result<()> {
    // Load configuration
    let (config, paths) = Config::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        e
    })?;

    init_tracing(&config.log_level);
    info!("Starting seismap v{}", env!("CARGO_PKG_VERSION"));

    // Validate configuration
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    let start = Instant::now();
    let points = load_points(&paths.points_file)
        .with_context(|| format!("Failed to load points from {}", paths.points_file.display()))?;
    info!(points = points.len(), "Loaded points");

    let projection = config.projection()?;
    let style = config.to_style()?;

    let figure = plot_map(&config.render.method, &points, &projection, &style).map_err(|e| {
        log_error(&e, "plot_map");
        e
    })?;

    log_timed_operation("save_figure", || figure.save(&paths.output))
        .with_context(|| format!("Failed to write {}", paths.output.display()))?;

    info!(
        output = %paths.output.display(),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Map written"
    );
    Ok(())
}

//! Configuration management for seismap.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::colorbar::TickFormat;
use crate::colormaps::{get_colormap, parse_color};
use crate::error::{Result, SeismapError};
use crate::figure::{FigureSize, Marker};
use crate::geo::{ProjParams, ProjectionSpec};
use crate::renderers::{MapStyle, Method, Resolution};

/// Command-line arguments for seismap
#[derive(Parser, Debug)]
#[command(name = "seismap")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the JSON points file to plot
    pub points_file: PathBuf,

    /// Output image (.png, .jpg or .jpeg)
    #[arg(short, long, default_value = "map.png")]
    pub output: PathBuf,

    /// Renderer (basemap, cartopy)
    #[arg(short, long, env = "SEISMAP_METHOD")]
    pub method: Option<String>,

    /// Projection (cyl, ortho, local, or a projection name such as Mercator)
    #[arg(short, long)]
    pub projection: Option<String>,

    /// Coastline resolution (c, l, i, h, f, 110m, 50m, 10m)
    #[arg(short, long)]
    pub resolution: Option<String>,

    /// Colormap name
    #[arg(long)]
    pub colormap: Option<String>,

    /// Force the colorbar on or off
    #[arg(long)]
    pub colorbar: Option<bool>,

    /// Marker shape (o, s, ^, v, D, +, x, *)
    #[arg(long)]
    pub marker: Option<String>,

    /// Figure title
    #[arg(long)]
    pub title: Option<String>,

    /// printf-style format of the colorbar tick labels, e.g. "%.1f"
    #[arg(long)]
    pub tick_format: Option<String>,

    /// Directory with Natural Earth GeoJSON files
    #[arg(long, env = "SEISMAP_FEATURES_DIR")]
    pub features_dir: Option<PathBuf>,

    /// TrueType font used for text
    #[arg(long, env = "SEISMAP_FONT")]
    pub font: Option<PathBuf>,

    /// Path to JSON configuration file
    #[arg(short, long, env = "SEISMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SEISMAP_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Input and output files of one CLI run
#[derive(Debug, Clone, PartialEq)]
pub struct RunPaths {
    pub points_file: PathBuf,
    pub output: PathBuf,
}

/// Plot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Renderer name
    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default = "default_projection")]
    pub projection: String,

    #[serde(default = "default_resolution")]
    pub resolution: String,

    #[serde(default = "default_continent_fill_color")]
    pub continent_fill_color: String,

    #[serde(default = "default_water_fill_color")]
    pub water_fill_color: String,

    #[serde(default)]
    pub colormap: Option<String>,

    #[serde(default)]
    pub colorbar: Option<bool>,

    #[serde(default = "default_marker")]
    pub marker: String,

    #[serde(default)]
    pub title: Option<String>,

    /// printf-style colorbar tick label format
    #[serde(default)]
    pub colorbar_ticklabel_format: Option<String>,

    /// Projection parameters; numbers or "auto"
    #[serde(default)]
    pub proj_kwargs: ProjParams,
}

/// Figure configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureConfig {
    #[serde(default = "default_width")]
    pub width_in: f64,

    #[serde(default = "default_height")]
    pub height_in: f64,

    #[serde(default = "default_dpi")]
    pub dpi: f64,

    /// TrueType font for labels, ticks and title
    #[serde(default)]
    pub font: Option<PathBuf>,
}

/// Map data configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory with Natural Earth GeoJSON files
    #[serde(default)]
    pub features_dir: Option<PathBuf>,
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub figure: FigureConfig,

    #[serde(default)]
    pub data: DataConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<(Self, RunPaths)> {
        Self::from_args(Args::parse())
    }

    /// Build the configuration from parsed arguments
    pub fn from_args(args: Args) -> Result<(Self, RunPaths)> {
        // Start with defaults
        let mut config = Config::default();

        // Load from JSON file if provided
        if let Some(config_path) = &args.config {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        // Override with command-line arguments
        let render = &mut config.render;
        if let Some(method) = args.method {
            render.method = method;
        }
        if let Some(projection) = args.projection {
            render.projection = projection;
        }
        if let Some(resolution) = args.resolution {
            render.resolution = resolution;
        }
        if let Some(marker) = args.marker {
            render.marker = marker;
        }
        if args.colormap.is_some() {
            render.colormap = args.colormap;
        }
        if args.colorbar.is_some() {
            render.colorbar = args.colorbar;
        }
        if args.title.is_some() {
            render.title = args.title;
        }
        if args.tick_format.is_some() {
            render.colorbar_ticklabel_format = args.tick_format;
        }
        if args.features_dir.is_some() {
            config.data.features_dir = args.features_dir;
        }
        if args.font.is_some() {
            config.figure.font = args.font;
        }
        if let Some(log_level) = args.log_level {
            config.log_level = log_level;
        }

        let paths = RunPaths {
            points_file: args.points_file,
            output: args.output,
        };

        Ok((config, paths))
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        self.render = other.render;
        self.figure.width_in = other.figure.width_in;
        self.figure.height_in = other.figure.height_in;
        self.figure.dpi = other.figure.dpi;
        if other.figure.font.is_some() {
            self.figure.font = other.figure.font;
        }
        if other.data.features_dir.is_some() {
            self.data.features_dir = other.data.features_dir;
        }
        self.log_level = other.log_level;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate log level
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(SeismapError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        if !(self.figure.dpi > 0.0 && self.figure.dpi.is_finite()) {
            return Err(SeismapError::Config {
                message: format!("DPI must be positive: {}", self.figure.dpi),
            });
        }

        self.figure_size().pixels().map_err(config_error)?;
        self.render.method.parse::<Method>().map_err(config_error)?;
        self.projection()?;
        self.to_style()?;

        if let Some(name) = &self.render.colormap {
            get_colormap(name).map_err(config_error)?;
        }
        parse_color(&self.render.continent_fill_color).map_err(config_error)?;
        parse_color(&self.render.water_fill_color).map_err(config_error)?;

        Ok(())
    }

    pub fn figure_size(&self) -> FigureSize {
        FigureSize {
            width_in: self.figure.width_in,
            height_in: self.figure.height_in,
            dpi: self.figure.dpi,
        }
    }

    /// The configured projection
    pub fn projection(&self) -> Result<ProjectionSpec> {
        self.render.projection.parse().map_err(config_error)
    }

    /// Turn the configuration into plot style options
    pub fn to_style(&self) -> Result<MapStyle> {
        let render = &self.render;
        let resolution: Resolution = render.resolution.parse().map_err(config_error)?;
        let marker: Marker = render.marker.parse().map_err(config_error)?;
        let tick_format = render
            .colorbar_ticklabel_format
            .as_deref()
            .map(TickFormat::printf)
            .transpose()
            .map_err(config_error)?;

        Ok(MapStyle {
            resolution,
            continent_fill_color: render.continent_fill_color.clone(),
            water_fill_color: render.water_fill_color.clone(),
            colormap: render.colormap.clone(),
            colorbar: render.colorbar,
            marker,
            title: render.title.clone(),
            colorbar_ticklabel_format: tick_format,
            // the CLI saves the figure; rasterising up front would only double the work
            show: false,
            figure_size: self.figure_size(),
            features_dir: self.data.features_dir.clone(),
            font: self.figure.font.clone(),
            proj_params: render.proj_kwargs,
        })
    }
}

fn config_error(error: SeismapError) -> SeismapError {
    SeismapError::Config {
        message: error.to_string(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            figure: FigureConfig::default(),
            data: DataConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            projection: default_projection(),
            resolution: default_resolution(),
            continent_fill_color: default_continent_fill_color(),
            water_fill_color: default_water_fill_color(),
            colormap: None,
            colorbar: None,
            marker: default_marker(),
            title: None,
            colorbar_ticklabel_format: None,
            proj_kwargs: ProjParams::default(),
        }
    }
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width_in: default_width(),
            height_in: default_height(),
            dpi: default_dpi(),
            font: None,
        }
    }
}

// Default value functions for serde
fn default_method() -> String {
    "cartopy".to_string()
}

fn default_projection() -> String {
    "cyl".to_string()
}

fn default_resolution() -> String {
    "l".to_string()
}

fn default_continent_fill_color() -> String {
    "0.8".to_string()
}

fn default_water_fill_color() -> String {
    "1.0".to_string()
}

fn default_marker() -> String {
    "o".to_string()
}

fn default_width() -> f64 {
    8.0
}

fn default_height() -> f64 {
    6.0
}

fn default_dpi() -> f64 {
    100.0
}

fn default_log_level() -> String {
    "info".to_string()
}

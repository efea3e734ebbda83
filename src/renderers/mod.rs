//! Map renderers and the plotting entry points.
//!
//! Two renderers share one projection and drawing core and differ in the
//! conventions they reproduce: units of the local extent, default gridlines,
//! label rules and which projections they accept.

#[cfg(feature = "basemap")]
pub mod basemap;
#[cfg(feature = "cartopy")]
pub mod cartopy;
mod common;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

use crate::colorbar::TickFormat;
use crate::error::{Result, SeismapError};
use crate::figure::{Figure, FigureSize, Marker};
use crate::geo::{ProjParams, ProjectionSpec};
use crate::points::PointSet;

#[cfg(feature = "basemap")]
pub use basemap::BasemapRenderer;
#[cfg(feature = "cartopy")]
pub use cartopy::CartopyRenderer;

/// Trait for map renderers
pub trait MapRenderer {
    /// Plot the points on a map and return the figure
    fn render(
        &self,
        points: &PointSet,
        projection: &ProjectionSpec,
        style: &MapStyle,
    ) -> Result<Figure>;

    /// Get the name of this renderer
    fn name(&self) -> &'static str;
}

/// Coastline and boundary detail level.
///
/// Accepts both the letter codes (`c l i h f`) and the Natural Earth scales
/// (`110m 50m 10m`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    Crude,
    #[default]
    Low,
    Intermediate,
    High,
    Full,
}

impl Resolution {
    /// Letter code
    pub fn basemap_code(&self) -> &'static str {
        match self {
            Resolution::Crude => "c",
            Resolution::Low => "l",
            Resolution::Intermediate => "i",
            Resolution::High => "h",
            Resolution::Full => "f",
        }
    }

    /// Natural Earth scale of the feature files
    pub fn cartopy_scale(&self) -> &'static str {
        match self {
            Resolution::Crude | Resolution::Low => "110m",
            Resolution::Intermediate | Resolution::High => "50m",
            Resolution::Full => "10m",
        }
    }

    /// Smallest land polygon kept, in km²
    pub fn basemap_area_thresh(&self) -> f64 {
        match self {
            Resolution::Crude => 10000.0,
            Resolution::Low => 1000.0,
            Resolution::Intermediate => 100.0,
            Resolution::High => 10.0,
            Resolution::Full => 1.0,
        }
    }
}

impl FromStr for Resolution {
    type Err = SeismapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "c" => Ok(Resolution::Crude),
            "l" | "110m" => Ok(Resolution::Low),
            "i" | "50m" => Ok(Resolution::Intermediate),
            "h" => Ok(Resolution::High),
            "f" | "10m" => Ok(Resolution::Full),
            _ => Err(SeismapError::invalid(
                "resolution",
                format!("Unknown resolution '{}', expected one of c l i h f 110m 50m 10m", s),
            )),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.basemap_code())
    }
}

/// Everything about a plot that is not the points or the projection
#[derive(Debug, Clone)]
pub struct MapStyle {
    pub resolution: Resolution,
    /// Land colour (matplotlib colour string)
    pub continent_fill_color: String,
    /// Ocean colour (matplotlib colour string)
    pub water_fill_color: String,
    /// Colormap name; `None` selects the default
    pub colormap: Option<String>,
    /// Force the colorbar on or off; `None` decides from the data
    pub colorbar: Option<bool>,
    pub marker: Marker,
    pub title: Option<String>,
    pub colorbar_ticklabel_format: Option<TickFormat>,
    /// Rasterise the figure before returning it
    pub show: bool,
    pub figure_size: FigureSize,
    /// Directory holding Natural Earth GeoJSON files
    pub features_dir: Option<PathBuf>,
    /// TrueType font for labels, ticks and title
    pub font: Option<PathBuf>,
    /// Projection parameters, used by the cartopy renderer
    pub proj_params: ProjParams,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            continent_fill_color: "0.8".to_string(),
            water_fill_color: "1.0".to_string(),
            colormap: None,
            colorbar: None,
            marker: Marker::Circle,
            title: None,
            colorbar_ticklabel_format: None,
            show: true,
            figure_size: FigureSize::default(),
            features_dir: None,
            font: None,
            proj_params: ProjParams::default(),
        }
    }
}

/// Renderer selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Basemap,
    Cartopy,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::Basemap => "basemap",
            Method::Cartopy => "cartopy",
        }
    }
}

impl FromStr for Method {
    type Err = SeismapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basemap" => Ok(Method::Basemap),
            "cartopy" => Ok(Method::Cartopy),
            _ => Err(SeismapError::UnknownMethod { method: s.to_string() }),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Renderers compiled into this build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub basemap: bool,
    pub cartopy: bool,
}

impl Capabilities {
    pub fn supports(&self, method: Method) -> bool {
        match method {
            Method::Basemap => self.basemap,
            Method::Cartopy => self.cartopy,
        }
    }

    /// Get the renderer for a method
    pub fn renderer(&self, method: Method) -> Result<Box<dyn MapRenderer>> {
        if !self.supports(method) {
            return Err(SeismapError::BackendUnavailable {
                name: method.name().to_string(),
            });
        }
        match method {
            #[cfg(feature = "basemap")]
            Method::Basemap => Ok(Box::new(BasemapRenderer)),
            #[cfg(feature = "cartopy")]
            Method::Cartopy => Ok(Box::new(CartopyRenderer)),
            #[allow(unreachable_patterns)]
            _ => Err(SeismapError::BackendUnavailable {
                name: method.name().to_string(),
            }),
        }
    }
}

/// Report which renderers are available.
pub fn initialize() -> Capabilities {
    let capabilities = Capabilities {
        basemap: cfg!(feature = "basemap"),
        cartopy: cfg!(feature = "cartopy"),
    };
    info!(
        basemap = capabilities.basemap,
        cartopy = capabilities.cartopy,
        "Renderer capabilities"
    );
    capabilities
}

/// Plot points with the renderer named by `method` (`basemap` or `cartopy`).
pub fn plot_map(
    method: &str,
    points: &PointSet,
    projection: &ProjectionSpec,
    style: &MapStyle,
) -> Result<Figure> {
    let method: Method = method.parse()?;
    debug!(method = %method, projection = %projection, "Dispatching map plot");
    initialize().renderer(method)?.render(points, projection, style)
}

/// Plot points with the basemap renderer.
pub fn plot_basemap(
    points: &PointSet,
    projection: &ProjectionSpec,
    style: &MapStyle,
) -> Result<Figure> {
    initialize().renderer(Method::Basemap)?.render(points, projection, style)
}

/// Plot points with the cartopy renderer.
pub fn plot_cartopy(
    points: &PointSet,
    projection: &ProjectionSpec,
    style: &MapStyle,
) -> Result<Figure> {
    initialize().renderer(Method::Cartopy)?.render(points, projection, style)
}

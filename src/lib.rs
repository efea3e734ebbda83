//! # seismap
//!
//! Scatter maps of seismological points: earthquakes, stations, anything
//! with a longitude and a latitude.
//!
//! Points are plotted with one of two renderers that reproduce the
//! conventions of two classic mapping toolkits on a shared projection and
//! rasterisation core.
//!
//! ## Key Features
//!
//! - **Global and local maps**: plate carrée, orthographic centred on the
//!   data, or an azimuthal equidistant view zoomed onto the points
//! - **Antimeridian-aware extents**: clusters spanning the date line stay
//!   centred on the right side of the globe
//! - **Colour by value or time**: numeric and timestamp colour values with a
//!   matching colorbar
//! - **Natural Earth features**: coastlines, borders and land from GeoJSON
//!
//! ## Architecture
//!
//! - **Geo Layer**: extents, nice gridline ticks, spherical projections, features
//! - **Figure Layer**: a scene graph in projected coordinates and its rasteriser
//! - **Renderers**: `basemap` and `cartopy` behind the [`MapRenderer`] trait

pub mod colorbar;
pub mod colormaps;
pub mod config;
pub mod error;
pub mod figure;
pub mod geo;
pub mod logging;
pub mod points;
pub mod renderers;

pub use config::Config;
pub use error::{Result, SeismapError};
pub use figure::{Figure, FigureSize, Marker, OutputFormat};
pub use geo::{ProjParam, ProjParams, ProjectionKind, ProjectionSpec};
pub use logging::{
    init_tracing, log_error, log_operation_end, log_operation_start, log_timed_operation,
};
pub use points::{load_points, ColorSpec, ColorValue, MarkerSize, PointSet};
pub use renderers::{
    initialize, plot_basemap, plot_cartopy, plot_map, Capabilities, MapRenderer, MapStyle, Method,
    Resolution,
};

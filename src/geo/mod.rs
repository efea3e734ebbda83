//! Geographic computations: local map extent, gridline ticks, spherical
//! projections and Natural Earth feature data.

pub mod extent;
pub mod features;
pub mod projection;
pub mod ticks;

pub use extent::{local_extent, normalize_longitude, ExtentUnits, LocalExtent};
pub use features::MapFeatures;
pub use projection::{
    project_lonlat_box, Bounds, ProjParam, ProjParams, Projection, ProjectionKind, ProjectionSpec,
    BASEMAP_RADIUS_M, CARTOPY_RADIUS_M,
};
pub use ticks::{format_latitude, format_longitude, global_gridlines, linspace2, local_gridlines};

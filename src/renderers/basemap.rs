//! Renderer following the classical map-projection toolkit's conventions.
//!
//! Local maps are azimuthal equidistant with the extent measured in metres,
//! every map carries the 30° graticule, and local maps add labelled
//! gridlines on nice round values.

use std::time::Instant;
use tracing::debug;

use super::common::{self, BLACK, BORDER_COLOR, COASTLINE_COLOR};
use super::{MapRenderer, MapStyle};
use crate::error::{Result, SeismapError};
use crate::figure::{Edge, Figure, MapAxes};
use crate::geo::ticks::arange;
use crate::geo::{
    format_latitude, format_longitude, local_extent, local_gridlines, Bounds, ExtentUnits,
    LocalExtent, Projection, ProjectionSpec, BASEMAP_RADIUS_M,
};
use crate::logging::{log_operation_end, log_operation_start};
use crate::points::PointSet;

/// Land polygon threshold used for orthographic and local maps, in km²
const ZOOMED_AREA_THRESH_KM2: f64 = 1000.0;

/// Labels are drawn for point sets smaller than this
const MAX_LABELLED_POINTS: usize = 100;

/// Renderer in the style of the classical map-projection toolkit
#[derive(Debug, Clone, Copy, Default)]
pub struct BasemapRenderer;

impl MapRenderer for BasemapRenderer {
    fn render(
        &self,
        points: &PointSet,
        projection: &ProjectionSpec,
        style: &MapStyle,
    ) -> Result<Figure> {
        let start = Instant::now();
        log_operation_start("plot_basemap", Some(&projection.to_string()));

        let result = render_basemap(points, projection, style, start);
        log_operation_end("plot_basemap", start, result.is_ok());
        result
    }

    fn name(&self) -> &'static str {
        "basemap"
    }
}

fn render_basemap(
    points: &PointSet,
    projection: &ProjectionSpec,
    style: &MapStyle,
    start: Instant,
) -> Result<Figure> {
    let prepared = common::prepare(points, projection, style)?;
    let (land_color, water_color) = common::fill_colors(style)?;
    let rect = prepared.layout.map;

    let (mut axes, local, area_thresh) = match projection {
        ProjectionSpec::Cyl => {
            let axes = MapAxes::global(
                rect,
                Projection::PlateCarree {
                    central_longitude: 0.0,
                },
                water_color,
            );
            (axes, None, style.resolution.basemap_area_thresh())
        }
        ProjectionSpec::Ortho => {
            let axes = MapAxes::global(
                rect,
                Projection::Orthographic {
                    central_longitude: points.mean_lon(),
                    central_latitude: points.mean_lat(),
                    radius: BASEMAP_RADIUS_M,
                },
                water_color,
            );
            (axes, None, ZOOMED_AREA_THRESH_KM2)
        }
        ProjectionSpec::Local => {
            let extent = local_extent(
                points.lons(),
                points.lats(),
                prepared.aspect,
                ExtentUnits::Meters,
            )?;
            let axes = MapAxes::new(
                rect,
                Projection::AzimuthalEquidistant {
                    central_longitude: extent.center_lon,
                    central_latitude: extent.center_lat,
                    radius: BASEMAP_RADIUS_M,
                },
                Bounds::centered(extent.width, extent.height),
                water_color,
            );
            (axes, Some(extent), ZOOMED_AREA_THRESH_KM2)
        }
        ProjectionSpec::Custom(kind) => {
            return Err(SeismapError::UnsupportedProjection {
                name: kind.name().to_string(),
            })
        }
    };

    let mut features = common::load_features(style)?;
    features.retain_land_larger_than(area_thresh);
    axes.fill_polygons(&features.land, land_color);
    axes.fill_polygons(&features.lakes, water_color);
    axes.draw_lines(&features.coastlines, COASTLINE_COLOR, 1);
    axes.draw_lines(&features.borders, BORDER_COLOR, 1);

    if let Some(extent) = &local {
        draw_local_gridlines(&mut axes, extent)?;
    }
    // exclusive upper bounds: 180 and 90 are never drawn
    axes.draw_meridians(&arange(-180.0, 180.0, 30.0, false), BLACK);
    axes.draw_parallels(&arange(-90.0, 90.0, 30.0, false), BLACK);

    let n = points.len();
    if n == 1 || (n > 1 && n < MAX_LABELLED_POINTS) {
        common::label_points(&mut axes, points);
    } else if points.labels().is_some() {
        debug!(points = n, "Too many points, labels skipped");
    }

    common::scatter_points(&mut axes, points, &prepared, style);
    common::finish("basemap", axes, prepared, points, projection, style, start)
}

/// Nice-valued gridlines of a local map; parallels are labelled on the
/// right and top, meridians on the left and bottom.
fn draw_local_gridlines(axes: &mut MapAxes, extent: &LocalExtent) -> Result<()> {
    let (meridians, parallels) = local_gridlines(extent)?;

    let parallel_lines = axes.draw_parallels(&parallels, BLACK);
    let parallel_texts: Vec<String> = parallels.iter().map(|lat| format_latitude(*lat)).collect();
    axes.label_gridlines(&parallel_lines, &parallel_texts, &[Edge::Right, Edge::Top]);

    let meridian_lines = axes.draw_meridians(&meridians, BLACK);
    let meridian_texts: Vec<String> = meridians.iter().map(|lon| format_longitude(*lon)).collect();
    axes.label_gridlines(&meridian_lines, &meridian_texts, &[Edge::Left, Edge::Bottom]);

    debug!(
        meridians = meridians.len(),
        parallels = parallels.len(),
        "Local gridlines drawn"
    );
    Ok(())
}

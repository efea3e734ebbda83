//! Renderer following the GIS cartography library's conventions.
//!
//! Local maps are fitted in angular degrees and shown in an azimuthal
//! equidistant projection; any named projection can be requested with
//! parameters derived from the data.

use std::time::Instant;

use super::common::{self, BORDER_COLOR, COASTLINE_COLOR};
use super::{MapRenderer, MapStyle};
use crate::error::{Result, SeismapError};
use crate::figure::{Figure, MapAxes};
use crate::geo::{
    global_gridlines, local_extent, local_gridlines, project_lonlat_box, ExtentUnits, Projection,
    ProjectionKind, ProjectionSpec, CARTOPY_RADIUS_M,
};
use crate::logging::{log_operation_end, log_operation_start};
use crate::points::PointSet;

const GRID_COLOR: [u8; 4] = [128, 128, 128, 255];

/// Samples per edge when projecting the degree box of a local map
const EXTENT_SAMPLES: usize = 64;

/// Renderer in the style of the GIS cartography library
#[derive(Debug, Clone, Copy, Default)]
pub struct CartopyRenderer;

impl MapRenderer for CartopyRenderer {
    fn render(
        &self,
        points: &PointSet,
        projection: &ProjectionSpec,
        style: &MapStyle,
    ) -> Result<Figure> {
        let start = Instant::now();
        log_operation_start("plot_cartopy", Some(&projection.to_string()));

        let result = render_cartopy(points, projection, style, start);
        log_operation_end("plot_cartopy", start, result.is_ok());
        result
    }

    fn name(&self) -> &'static str {
        "cartopy"
    }
}

fn render_cartopy(
    points: &PointSet,
    projection: &ProjectionSpec,
    style: &MapStyle,
    start: Instant,
) -> Result<Figure> {
    let prepared = common::prepare(points, projection, style)?;
    let (land_color, water_color) = common::fill_colors(style)?;
    let rect = prepared.layout.map;
    let (mean_lon, mean_lat) = (points.mean_lon(), points.mean_lat());

    let mut local = None;
    let mut axes = match projection {
        ProjectionSpec::Cyl => {
            let projection = ProjectionKind::PlateCarree.build(
                &style.proj_params,
                mean_lon,
                mean_lat,
                CARTOPY_RADIUS_M,
            );
            MapAxes::global(rect, projection, water_color)
        }
        ProjectionSpec::Ortho => {
            let projection = Projection::Orthographic {
                central_longitude: mean_lon,
                central_latitude: mean_lat,
                radius: CARTOPY_RADIUS_M,
            };
            MapAxes::global(rect, projection, water_color)
        }
        ProjectionSpec::Local => {
            let extent = local_extent(
                points.lons(),
                points.lats(),
                prepared.aspect,
                ExtentUnits::Degrees,
            )?;
            let projection = Projection::AzimuthalEquidistant {
                central_longitude: extent.center_lon,
                central_latitude: extent.center_lat,
                radius: CARTOPY_RADIUS_M,
            };
            let view = project_lonlat_box(
                &projection,
                extent.lon_range(),
                extent.lat_range(),
                EXTENT_SAMPLES,
            )
            .ok_or_else(|| SeismapError::ImageGeneration {
                message: format!(
                    "Local extent around ({}, {}) does not project onto the map",
                    extent.center_lon, extent.center_lat
                ),
            })?;
            local = Some(extent);
            MapAxes::new(rect, projection, view, water_color)
        }
        ProjectionSpec::Custom(kind) => {
            let projection = kind.build(&style.proj_params, mean_lon, mean_lat, CARTOPY_RADIUS_M);
            MapAxes::global(rect, projection, water_color)
        }
    };

    let features = common::load_features(style)?;
    axes.fill_polygons(&features.land, land_color);
    axes.fill_polygons(&features.lakes, water_color);
    axes.draw_lines(&features.borders, BORDER_COLOR, 1);
    axes.draw_lines(&features.coastlines, COASTLINE_COLOR, 1);

    let (meridians, parallels) = match &local {
        Some(extent) => local_gridlines(extent)?,
        None => global_gridlines(true),
    };
    axes.draw_meridians(&meridians, GRID_COLOR);
    axes.draw_parallels(&parallels, GRID_COLOR);

    common::label_points(&mut axes, points);
    common::scatter_points(&mut axes, points, &prepared, style);
    common::finish("cartopy", axes, prepared, points, projection, style, start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::Layer;
    use crate::geo::{ProjParam, ProjParams};
    use crate::points::{ColorSpec, MarkerSize};

    fn style() -> MapStyle {
        MapStyle {
            show: false,
            ..Default::default()
        }
    }

    fn points(lons: Vec<f64>, lats: Vec<f64>) -> PointSet {
        let color = ColorSpec::Uniform("b".to_string());
        PointSet::new(lons, lats, MarkerSize::Uniform(30.0), color).unwrap()
    }

    #[test]
    fn test_cyl_honours_central_longitude() {
        let style = MapStyle {
            proj_params: ProjParams {
                central_longitude: Some(ProjParam::Fixed(150.0)),
                ..Default::default()
            },
            ..style()
        };
        let figure = CartopyRenderer
            .render(&points(vec![140.0], vec![35.0]), &ProjectionSpec::Cyl, &style)
            .unwrap();
        assert_eq!(
            *figure.map().projection(),
            Projection::PlateCarree {
                central_longitude: 150.0
            }
        );
        assert!(!figure.has_colorbar());
    }

    #[test]
    fn test_custom_projection_from_centroid() {
        let style = MapStyle {
            proj_params: ProjParams {
                central_longitude: Some(ProjParam::DeriveFromCentroid),
                central_latitude: Some(ProjParam::DeriveFromCentroid),
                ..Default::default()
            },
            ..style()
        };
        let figure = CartopyRenderer
            .render(
                &points(vec![10.0, 30.0], vec![40.0, 60.0]),
                &ProjectionSpec::Custom(ProjectionKind::Stereographic),
                &style,
            )
            .unwrap();
        match figure.map().projection() {
            Projection::Stereographic {
                central_longitude,
                central_latitude,
                ..
            } => {
                assert_eq!(*central_longitude, 20.0);
                assert_eq!(*central_latitude, 50.0);
            }
            other => panic!("unexpected projection {:?}", other),
        }
    }

    #[test]
    fn test_local_is_azimuthal_equidistant() {
        let figure = CartopyRenderer
            .render(
                &points(vec![-179.0, 179.0], vec![-20.0, -18.0]),
                &ProjectionSpec::Local,
                &style(),
            )
            .unwrap();
        match figure.map().projection() {
            Projection::AzimuthalEquidistant { central_longitude, .. } => {
                assert!((central_longitude.abs() - 180.0).abs() < 1e-9);
            }
            other => panic!("unexpected projection {:?}", other),
        }
        // both points are on the map
        match figure.map().layers().iter().rev().find(|l| matches!(l, Layer::Scatter { .. })) {
            Some(Layer::Scatter { markers, .. }) => assert_eq!(markers.len(), 2),
            other => panic!("unexpected layer {:?}", other),
        }
    }

    #[test]
    fn test_labels_for_every_point() {
        let lons: Vec<f64> = (0..150).map(|i| -170.0 + i as f64 * 2.0).collect();
        let lats = vec![10.0; 150];
        let labels = (0..150).map(|i| i.to_string()).collect();
        let set = points(lons, lats).with_labels(labels).unwrap();
        let figure = CartopyRenderer.render(&set, &ProjectionSpec::Cyl, &style()).unwrap();
        let labelled: usize = figure
            .map()
            .layers()
            .iter()
            .map(|layer| match layer {
                Layer::Text { items } => items.len(),
                _ => 0,
            })
            .sum();
        assert_eq!(labelled, 150);
    }
}

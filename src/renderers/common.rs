//! Preparation shared by both renderers: colours, layout, features, labels
//! and the final figure assembly.

use std::time::Instant;
use tracing::debug;

use super::MapStyle;
use crate::colorbar::colorbar_ticks;
use crate::colormaps::{parse_color, ColorScale};
use crate::error::Result;
use crate::figure::{load_font, AxesRect, ColorbarAxes, Figure, FigureSize, MapAxes};
use crate::geo::{MapFeatures, ProjectionSpec};
use crate::logging::log_render_stats;
use crate::points::{normalize_colors, should_show_colorbar, ColorSpec, PointSet};

pub(crate) const COASTLINE_COLOR: [u8; 4] = [102, 102, 102, 255];
pub(crate) const BORDER_COLOR: [u8; 4] = [191, 191, 191, 255];
pub(crate) const BLACK: [u8; 4] = [0, 0, 0, 255];

/// Stretch of the local extent aspect when a colorbar takes figure height
const COLORBAR_ASPECT_FACTOR: f64 = 1.2;

/// Axes positions in figure fractions
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Layout {
    pub map: AxesRect,
    pub colorbar: Option<AxesRect>,
}

pub(crate) fn layout(is_local: bool, show_colorbar: bool) -> Layout {
    let (x0, width) = if is_local { (0.10, 0.80) } else { (0.05, 0.90) };
    if show_colorbar {
        return Layout {
            map: AxesRect::new(x0, 0.13, width, 0.77),
            colorbar: Some(AxesRect::new(x0, 0.05, width, 0.05)),
        };
    }
    let (y0, height) = if is_local { (0.10, 0.80) } else { (0.05, 0.85) };
    Layout {
        map: AxesRect::new(x0, y0, width, height),
        colorbar: None,
    }
}

/// Width over height the local extent is fitted to
pub(crate) fn map_aspect(size: &FigureSize, show_colorbar: bool) -> f64 {
    if show_colorbar {
        size.aspect() * COLORBAR_ASPECT_FACTOR
    } else {
        size.aspect()
    }
}

/// Marker colours of every point and the scale the colorbar shows
pub(crate) struct PointColors {
    pub colors: Vec<[u8; 4]>,
    pub scale: ColorScale,
    /// Day number time values count from, when colouring by time
    pub time_origin: Option<f64>,
}

pub(crate) fn point_colors(points: &PointSet, style: &MapStyle) -> Result<PointColors> {
    let colormap = style.colormap.as_deref();
    match points.color() {
        ColorSpec::Values(values) => {
            let axis = normalize_colors(values)?;
            let scale = ColorScale::new(colormap, axis.vmin, axis.vmax)?;
            let colors = axis.values.iter().map(|v| scale.color(*v)).collect();
            Ok(PointColors {
                colors,
                scale,
                time_origin: axis.is_time.then_some(axis.origin),
            })
        }
        ColorSpec::Uniform(spec) => {
            let color = parse_color(spec)?;
            Ok(PointColors {
                colors: vec![color; points.len()],
                scale: ColorScale::new(colormap, 0.0, 1.0)?,
                time_origin: None,
            })
        }
    }
}

/// Per-point marker areas
pub(crate) fn point_sizes(points: &PointSet) -> Vec<f64> {
    (0..points.len()).map(|i| points.size().at(i)).collect()
}

/// Colours, colorbar decision and layout of one plot
pub(crate) struct Prepared {
    pub colors: PointColors,
    pub sizes: Vec<f64>,
    pub show_colorbar: bool,
    pub layout: Layout,
    pub aspect: f64,
}

pub(crate) fn prepare(
    points: &PointSet,
    projection: &ProjectionSpec,
    style: &MapStyle,
) -> Result<Prepared> {
    let colors = point_colors(points, style)?;
    let show_colorbar = should_show_colorbar(style.colorbar, points.len(), points.color());
    let layout = layout(projection.is_local(), show_colorbar);
    let aspect = map_aspect(&style.figure_size, show_colorbar);

    debug!(
        points = points.len(),
        colorbar = show_colorbar,
        colormap = colors.scale.colormap_name(),
        aspect = aspect,
        "Prepared map plot"
    );

    Ok(Prepared {
        colors,
        sizes: point_sizes(points),
        show_colorbar,
        layout,
        aspect,
    })
}

/// Land and ocean colours of the style
pub(crate) fn fill_colors(style: &MapStyle) -> Result<([u8; 4], [u8; 4])> {
    Ok((
        parse_color(&style.continent_fill_color)?,
        parse_color(&style.water_fill_color)?,
    ))
}

pub(crate) fn load_features(style: &MapStyle) -> Result<MapFeatures> {
    MapFeatures::load_optional(style.features_dir.as_deref(), style.resolution.cartopy_scale())
}

/// Annotate every labelled point that is on the map
pub(crate) fn label_points(axes: &mut MapAxes, points: &PointSet) -> usize {
    let Some(labels) = points.labels() else {
        return 0;
    };
    let items = points
        .lons()
        .iter()
        .zip(points.lats())
        .zip(labels)
        .map(|((lon, lat), label)| (*lon, *lat, label.clone()));
    axes.annotate(items)
}

pub(crate) fn scatter_points(
    axes: &mut MapAxes,
    points: &PointSet,
    prepared: &Prepared,
    style: &MapStyle,
) -> usize {
    let placed = axes.scatter(
        points.lons(),
        points.lats(),
        &prepared.sizes,
        &prepared.colors.colors,
        style.marker,
    );
    if placed < points.len() {
        debug!(
            placed = placed,
            dropped = points.len() - placed,
            "Points outside the map were not drawn"
        );
    }
    placed
}

/// Assemble the figure, rasterise it when requested and log the render.
pub(crate) fn finish(
    renderer: &str,
    axes: MapAxes,
    prepared: Prepared,
    points: &PointSet,
    projection: &ProjectionSpec,
    style: &MapStyle,
    start: Instant,
) -> Result<Figure> {
    let colorbar = match (prepared.show_colorbar, prepared.layout.colorbar) {
        (true, Some(rect)) => {
            let PointColors {
                scale, time_origin, ..
            } = prepared.colors;
            let ticks = colorbar_ticks(
                scale.vmin(),
                scale.vmax(),
                time_origin,
                style.colorbar_ticklabel_format.as_ref(),
            );
            Some(ColorbarAxes { rect, scale, ticks })
        }
        _ => None,
    };

    let font = style.font.as_deref().map(load_font).transpose()?;
    if font.is_none() {
        debug!("No font configured, text will not be drawn");
    }

    let mut figure = Figure::new(style.figure_size, axes)
        .with_title(style.title.clone())
        .with_colorbar(colorbar)
        .with_font(font);

    if style.show {
        figure.show()?;
    }

    log_render_stats(
        &figure.id(),
        renderer,
        &projection.to_string(),
        points.len(),
        figure.has_colorbar(),
        start,
    );
    Ok(figure)
}

//! The figure handle returned by the renderers.
//!
//! A [`Figure`] is a small scene graph: one map axes holding layers in
//! projected coordinates, an optional horizontal colorbar and an optional
//! title. Nothing is drawn until [`Figure::render`] (or [`Figure::show`])
//! rasterises it.

mod raster;

use image::{DynamicImage, RgbaImage};
use rusttype::Font;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::colorbar::ColorbarTicks;
use crate::colormaps::ColorScale;
use crate::error::{Result, SeismapError};
use crate::geo::features::{Line, Ring};
use crate::geo::projection::{Bounds, Projection};

/// Degrees between samples when drawing meridians and parallels
const GRATICULE_SAMPLE_DEG: f64 = 1.0;

/// A line in projected coordinates
pub type Polyline = Vec<(f64, f64)>;

/// Figure size and resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureSize {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: f64,
}

impl Default for FigureSize {
    fn default() -> Self {
        Self {
            width_in: 8.0,
            height_in: 6.0,
            dpi: 100.0,
        }
    }
}

impl FigureSize {
    /// Width over height
    pub fn aspect(&self) -> f64 {
        self.width_in / self.height_in
    }

    /// Raster size in pixels
    pub fn pixels(&self) -> Result<(u32, u32)> {
        let width = (self.width_in * self.dpi).round();
        let height = (self.height_in * self.dpi).round();
        let max = u32::MAX as f64;
        if !(width >= 1.0 && height >= 1.0 && width <= max && height <= max) {
            return Err(SeismapError::ImageGeneration {
                message: format!(
                    "Invalid figure size {}x{} in at {} dpi",
                    self.width_in, self.height_in, self.dpi
                ),
            });
        }
        Ok((width as u32, height as u32))
    }

    /// Pixels per typographic point
    pub fn px_per_pt(&self) -> f64 {
        self.dpi / 72.0
    }
}

/// Position of an axes in figure fractions, origin at the bottom left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxesRect {
    pub x0: f64,
    pub y0: f64,
    pub width: f64,
    pub height: f64,
}

impl AxesRect {
    pub fn new(x0: f64, y0: f64, width: f64, height: f64) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
        }
    }

    /// Pixel rectangle `(left, top, width, height)` on a canvas
    pub fn to_pixels(&self, canvas_width: u32, canvas_height: u32) -> (i64, i64, u32, u32) {
        let (cw, ch) = (canvas_width as f64, canvas_height as f64);
        let left = (self.x0 * cw).round() as i64;
        let top = ((1.0 - self.y0 - self.height) * ch).round() as i64;
        let width = (self.width * cw).round().max(1.0) as u32;
        let height = (self.height * ch).round().max(1.0) as u32;
        (left, top, width, height)
    }
}

/// Scatter marker shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
    TriangleUp,
    TriangleDown,
    Diamond,
    Plus,
    Cross,
    Star,
}

impl FromStr for Marker {
    type Err = SeismapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "o" => Ok(Marker::Circle),
            "s" => Ok(Marker::Square),
            "^" => Ok(Marker::TriangleUp),
            "v" => Ok(Marker::TriangleDown),
            "D" => Ok(Marker::Diamond),
            "+" => Ok(Marker::Plus),
            "x" => Ok(Marker::Cross),
            "*" => Ok(Marker::Star),
            _ => Err(SeismapError::invalid(
                "marker",
                format!("Unsupported marker '{}', expected one of o s ^ v D + x *", s),
            )),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Marker::Circle => "o",
            Marker::Square => "s",
            Marker::TriangleUp => "^",
            Marker::TriangleDown => "v",
            Marker::Diamond => "D",
            Marker::Plus => "+",
            Marker::Cross => "x",
            Marker::Star => "*",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dotted,
}

/// One scatter marker in projected coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPoint {
    pub x: f64,
    pub y: f64,
    /// Marker area in points²
    pub size: f64,
    pub color: [u8; 4],
}

/// A text annotation anchored at a projected point
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// Side of the map frame a gridline label sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// Gridline label placed outside the map frame
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabel {
    pub edge: Edge,
    /// Projected coordinate along the edge (x for top/bottom, y for left/right)
    pub position: f64,
    pub text: String,
}

/// Drawing layers, in drawing order
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Fill {
        polygons: Vec<Vec<(f64, f64)>>,
        color: [u8; 4],
    },
    Stroke {
        lines: Vec<Vec<(f64, f64)>>,
        color: [u8; 4],
        width: u32,
        style: LineStyle,
    },
    Scatter {
        markers: Vec<MarkerPoint>,
        marker: Marker,
    },
    Text {
        items: Vec<TextItem>,
    },
    EdgeLabels {
        labels: Vec<EdgeLabel>,
    },
}

/// Outline of the visible map area
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapBoundary {
    Rectangle,
    /// Disc of the given radius around the projection origin
    Circle { radius: f64 },
}

/// The map axes: a projection, a viewing window and the layers drawn in it
#[derive(Debug, Clone)]
pub struct MapAxes {
    rect: AxesRect,
    projection: Projection,
    view: Bounds,
    boundary: MapBoundary,
    background: [u8; 4],
    layers: Vec<Layer>,
}

impl MapAxes {
    pub fn new(rect: AxesRect, projection: Projection, view: Bounds, background: [u8; 4]) -> Self {
        Self {
            rect,
            projection,
            view,
            boundary: MapBoundary::Rectangle,
            background,
            layers: Vec::new(),
        }
    }

    /// Whole-globe axes; disc-shaped projections get a circular boundary.
    pub fn global(rect: AxesRect, projection: Projection, background: [u8; 4]) -> Self {
        let mut axes = Self::new(rect, projection, projection.global_bounds(), background);
        if let Some(radius) = projection.limb_radius() {
            axes.boundary = MapBoundary::Circle { radius };
        }
        axes
    }

    pub fn rect(&self) -> AxesRect {
        self.rect
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn view(&self) -> Bounds {
        self.view
    }

    pub fn boundary(&self) -> MapBoundary {
        self.boundary
    }

    pub fn background(&self) -> [u8; 4] {
        self.background
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Project a point and report it only if it falls inside the map.
    pub fn project_visible(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let (x, y) = self.projection.project(lon, lat)?;
        let inside_boundary = match self.boundary {
            MapBoundary::Rectangle => true,
            MapBoundary::Circle { radius } => x.hypot(y) <= radius,
        };
        (inside_boundary && self.view.contains(x, y)).then_some((x, y))
    }

    /// Fill lon/lat polygons.
    ///
    /// Rings with vertices on the hidden side of the globe are skipped;
    /// rings crossing the seam of a cylindrical projection are unwrapped and
    /// drawn on both sides.
    pub fn fill_polygons(&mut self, rings: &[Ring], color: [u8; 4]) {
        let period = self.seam_period();
        let mut polygons = Vec::with_capacity(rings.len());

        for ring in rings {
            let projected: Option<Vec<(f64, f64)>> = ring
                .iter()
                .map(|(lon, lat)| self.projection.project(*lon, *lat))
                .collect();
            let Some(projected) = projected else {
                continue;
            };
            if projected.len() < 3 {
                continue;
            }

            match period {
                Some(period) if has_seam_jump(&projected, self.projection.seam_jump()) => {
                    let unwrapped = unwrap_ring(&projected, period);
                    for shift in [-period, 0.0, period] {
                        polygons.push(unwrapped.iter().map(|(x, y)| (x + shift, *y)).collect());
                    }
                }
                _ => polygons.push(projected),
            }
        }

        debug!(
            rings = rings.len(),
            polygons = polygons.len(),
            projection = self.projection.name(),
            "Projected fill polygons"
        );
        self.layers.push(Layer::Fill { polygons, color });
    }

    /// Stroke lon/lat lines, split where they leave the visible globe or jump a seam.
    pub fn draw_lines(&mut self, lines: &[Line], color: [u8; 4], width: u32) {
        let projected = lines
            .iter()
            .flat_map(|line| self.project_line(line))
            .collect();
        self.layers.push(Layer::Stroke {
            lines: projected,
            color,
            width,
            style: LineStyle::Solid,
        });
    }

    /// Draw meridians at the given longitudes.
    ///
    /// Returns the projected pieces of each meridian, in input order.
    pub fn draw_meridians(&mut self, meridians: &[f64], color: [u8; 4]) -> Vec<Vec<Polyline>> {
        let steps = (180.0 / GRATICULE_SAMPLE_DEG) as usize;
        let gridlines: Vec<Vec<Polyline>> = meridians
            .iter()
            .map(|lon| {
                let line: Line = (0..=steps)
                    .map(|i| (*lon, -90.0 + i as f64 * GRATICULE_SAMPLE_DEG))
                    .collect();
                self.project_line(&line)
            })
            .collect();
        self.push_graticule(&gridlines, color);
        gridlines
    }

    /// Draw parallels at the given latitudes.
    ///
    /// Returns the projected pieces of each parallel, in input order.
    pub fn draw_parallels(&mut self, parallels: &[f64], color: [u8; 4]) -> Vec<Vec<Polyline>> {
        let steps = (360.0 / GRATICULE_SAMPLE_DEG) as usize;
        let gridlines: Vec<Vec<Polyline>> = parallels
            .iter()
            .map(|lat| {
                let line: Line = (0..=steps)
                    .map(|i| (-180.0 + i as f64 * GRATICULE_SAMPLE_DEG, *lat))
                    .collect();
                self.project_line(&line)
            })
            .collect();
        self.push_graticule(&gridlines, color);
        gridlines
    }

    fn push_graticule(&mut self, gridlines: &[Vec<Polyline>], color: [u8; 4]) {
        self.layers.push(Layer::Stroke {
            lines: gridlines.iter().flatten().cloned().collect(),
            color,
            width: 1,
            style: LineStyle::Dotted,
        });
    }

    /// Label gridlines where they cross the given edges of the map frame.
    ///
    /// `lines` holds the projected pieces of each gridline, in the order of
    /// `texts`. Returns the number of labels placed.
    pub fn label_gridlines(
        &mut self,
        lines: &[Vec<Polyline>],
        texts: &[String],
        edges: &[Edge],
    ) -> usize {
        let mut labels = Vec::new();
        for (pieces, text) in lines.iter().zip(texts) {
            for edge in edges {
                let crossing = pieces
                    .iter()
                    .find_map(|piece| edge_crossing(piece, *edge, &self.view));
                if let Some(position) = crossing {
                    labels.push(EdgeLabel {
                        edge: *edge,
                        position,
                        text: text.clone(),
                    });
                }
            }
        }
        let count = labels.len();
        self.layers.push(Layer::EdgeLabels { labels });
        count
    }

    /// Add scatter markers; points off the map are dropped.
    ///
    /// Returns the number of markers placed.
    pub fn scatter(
        &mut self,
        lons: &[f64],
        lats: &[f64],
        sizes: &[f64],
        colors: &[[u8; 4]],
        marker: Marker,
    ) -> usize {
        let markers: Vec<MarkerPoint> = lons
            .iter()
            .zip(lats)
            .zip(sizes.iter().zip(colors))
            .filter_map(|((lon, lat), (size, color))| {
                self.project_visible(*lon, *lat).map(|(x, y)| MarkerPoint {
                    x,
                    y,
                    size: *size,
                    color: *color,
                })
            })
            .collect();
        let count = markers.len();
        self.layers.push(Layer::Scatter { markers, marker });
        count
    }

    /// Add text annotations; points off the map are skipped.
    pub fn annotate(&mut self, items: impl IntoIterator<Item = (f64, f64, String)>) -> usize {
        let items: Vec<TextItem> = items
            .into_iter()
            .filter_map(|(lon, lat, text)| {
                self.project_visible(lon, lat)
                    .map(|(x, y)| TextItem { x, y, text })
            })
            .collect();
        let count = items.len();
        self.layers.push(Layer::Text { items });
        count
    }

    fn seam_period(&self) -> Option<f64> {
        match self.projection.limb_radius() {
            Some(_) => None,
            None => Some(self.projection.global_bounds().width()),
        }
    }

    fn project_line(&self, line: &[(f64, f64)]) -> Vec<Polyline> {
        let jump = self.projection.seam_jump();
        let mut pieces = Vec::new();
        let mut current: Vec<(f64, f64)> = Vec::new();

        for (lon, lat) in line {
            match self.projection.project(*lon, *lat) {
                Some(point) => {
                    if let Some(last) = current.last() {
                        if (point.0 - last.0).hypot(point.1 - last.1) > jump {
                            pieces.push(std::mem::take(&mut current));
                        }
                    }
                    current.push(point);
                }
                None => {
                    if !current.is_empty() {
                        pieces.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        pieces.push(current);
        pieces.retain(|piece| piece.len() >= 2);
        pieces
    }
}

fn has_seam_jump(points: &[(f64, f64)], jump: f64) -> bool {
    points.windows(2).any(|w| (w[1].0 - w[0].0).abs() > jump)
}

/// Shift x coordinates by multiples of `period` so consecutive vertices stay close
fn unwrap_ring(points: &[(f64, f64)], period: f64) -> Vec<(f64, f64)> {
    let mut offset = 0.0;
    let mut out = Vec::with_capacity(points.len());
    let mut previous: Option<f64> = None;
    for (x, y) in points {
        if let Some(prev) = previous {
            let dx = x - prev;
            if dx > period / 2.0 {
                offset -= period;
            } else if dx < -period / 2.0 {
                offset += period;
            }
        }
        previous = Some(*x);
        out.push((x + offset, *y));
    }
    out
}

/// Where a polyline first crosses one edge of the view, as a coordinate along that edge
fn edge_crossing(line: &[(f64, f64)], edge: Edge, view: &Bounds) -> Option<f64> {
    let (fixed, along_range, pick): (f64, (f64, f64), fn((f64, f64)) -> (f64, f64)) = match edge {
        Edge::Left => (view.x_min, (view.y_min, view.y_max), |(x, y)| (x, y)),
        Edge::Right => (view.x_max, (view.y_min, view.y_max), |(x, y)| (x, y)),
        Edge::Bottom => (view.y_min, (view.x_min, view.x_max), |(x, y)| (y, x)),
        Edge::Top => (view.y_max, (view.x_min, view.x_max), |(x, y)| (y, x)),
    };

    line.windows(2).find_map(|w| {
        let (a_across, a_along) = pick(w[0]);
        let (b_across, b_along) = pick(w[1]);
        if (a_across - fixed) * (b_across - fixed) > 0.0 || a_across == b_across {
            return None;
        }
        let t = (fixed - a_across) / (b_across - a_across);
        let along = a_along + t * (b_along - a_along);
        (along_range.0..=along_range.1).contains(&along).then_some(along)
    })
}

/// The horizontal colorbar below the map
#[derive(Debug)]
pub struct ColorbarAxes {
    pub rect: AxesRect,
    pub scale: ColorScale,
    pub ticks: ColorbarTicks,
}

/// Output image encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                SeismapError::invalid(
                    "output",
                    format!("No file extension in '{}'", path.display()),
                )
            })?;
        extension.parse()
    }
}

impl FromStr for OutputFormat {
    type Err = SeismapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            _ => Err(SeismapError::invalid(
                "format",
                format!("Unsupported image format '{}', expected png or jpeg", s),
            )),
        }
    }
}

/// A finished map plot.
pub struct Figure {
    id: Uuid,
    size: FigureSize,
    title: Option<String>,
    map: MapAxes,
    colorbar: Option<ColorbarAxes>,
    font: Option<Font<'static>>,
    canvas: Option<RgbaImage>,
}

impl Figure {
    pub fn new(size: FigureSize, map: MapAxes) -> Self {
        Self {
            id: Uuid::new_v4(),
            size,
            title: None,
            map,
            colorbar: None,
            font: None,
            canvas: None,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_colorbar(mut self, colorbar: Option<ColorbarAxes>) -> Self {
        self.colorbar = colorbar;
        self
    }

    /// Font used for labels, ticks and the title; without one no text is drawn.
    pub fn with_font(mut self, font: Option<Font<'static>>) -> Self {
        self.font = font;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn size(&self) -> FigureSize {
        self.size
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn map(&self) -> &MapAxes {
        &self.map
    }

    pub fn colorbar(&self) -> Option<&ColorbarAxes> {
        self.colorbar.as_ref()
    }

    pub fn has_colorbar(&self) -> bool {
        self.colorbar.is_some()
    }

    /// The raster produced by the last [`Figure::show`], if any
    pub fn canvas(&self) -> Option<&RgbaImage> {
        self.canvas.as_ref()
    }

    /// Rasterise the figure.
    pub fn render(&self) -> Result<RgbaImage> {
        let start = Instant::now();
        let (width, height) = self.size.pixels()?;
        let image = raster::render(self, width, height);
        debug!(
            figure_id = %self.id,
            width = width,
            height = height,
            text = self.font.is_some(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Figure rasterised"
        );
        Ok(image)
    }

    /// Rasterise now and keep the result on the handle.
    pub fn show(&mut self) -> Result<&RgbaImage> {
        let image = self.render()?;
        Ok(self.canvas.insert(image))
    }

    /// Encode the figure, reusing the cached raster when there is one.
    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>> {
        let rendered;
        let image = match &self.canvas {
            Some(canvas) => canvas,
            None => {
                rendered = self.render()?;
                &rendered
            }
        };

        let mut buffer = Cursor::new(Vec::new());
        match format {
            OutputFormat::Png => {
                image
                    .write_to(&mut buffer, image::ImageFormat::Png)
                    .map_err(|e| SeismapError::ImageGeneration {
                        message: format!("Failed to encode PNG: {}", e),
                    })?;
            }
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel
                DynamicImage::ImageRgba8(image.clone())
                    .to_rgb8()
                    .write_to(&mut buffer, image::ImageFormat::Jpeg)
                    .map_err(|e| SeismapError::ImageGeneration {
                        message: format!("Failed to encode JPEG: {}", e),
                    })?;
            }
        }
        Ok(buffer.into_inner())
    }

    /// Write the figure to a file; the extension picks the format.
    pub fn save(&self, path: &Path) -> Result<()> {
        let format = OutputFormat::from_path(path)?;
        let bytes = self.encode(format)?;
        std::fs::write(path, &bytes)?;
        info!(
            figure_id = %self.id,
            path = %path.display(),
            bytes = bytes.len(),
            "Figure saved"
        );
        Ok(())
    }
}

impl fmt::Debug for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Figure")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("title", &self.title)
            .field("projection", &self.map.projection.name())
            .field("layers", &self.map.layers.len())
            .field("colorbar", &self.colorbar.is_some())
            .field("font", &self.font.is_some())
            .field("rendered", &self.canvas.is_some())
            .finish()
    }
}

/// Load a TrueType/OpenType font for figure text
pub fn load_font(path: &Path) -> Result<Font<'static>> {
    let bytes = std::fs::read(path)?;
    Font::try_from_vec(bytes).ok_or_else(|| SeismapError::Font {
        message: format!("Could not parse font file '{}'", path.display()),
    })
}

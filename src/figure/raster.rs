//! Rasterisation of a [`Figure`] with imageproc and rusttype.

use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut,
    draw_line_segment_mut, draw_polygon_mut, draw_text_mut, text_size,
};
use imageproc::point::Point;
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use tracing::debug;

use super::{ColorbarAxes, Edge, Figure, Layer, LineStyle, MapBoundary, Marker, MarkerPoint};
use crate::geo::projection::Bounds;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

const FONT_SIZE_PT: f64 = 10.0;
const TITLE_SIZE_PT: f64 = 12.0;
const TICK_LENGTH_PX: f32 = 4.0;
const LABEL_PAD_PX: i32 = 4;

/// Projected coordinates beyond this many pixels are clamped
const PIXEL_LIMIT: f64 = 1.0e6;

/// Where the map sits on the canvas and how projected units map to pixels
struct Frame {
    left: i64,
    top: i64,
    width: u32,
    height: u32,
    scale: f64,
    view: Bounds,
}

impl Frame {
    /// Fit the view into the axes rectangle, keeping one unit equal in x and y.
    fn fit(axes: (i64, i64, u32, u32), view: Bounds) -> Self {
        let (ax_left, ax_top, ax_width, ax_height) = axes;
        let scale = if view.width() > 0.0 && view.height() > 0.0 {
            (ax_width as f64 / view.width()).min(ax_height as f64 / view.height())
        } else {
            1.0
        };
        let width = (view.width() * scale).round().max(1.0) as u32;
        let height = (view.height() * scale).round().max(1.0) as u32;
        Self {
            left: ax_left + (ax_width as i64 - width as i64) / 2,
            top: ax_top + (ax_height as i64 - height as i64) / 2,
            width,
            height,
            scale,
            view,
        }
    }

    /// Projected point to pixel position inside the map image
    fn to_px(&self, x: f64, y: f64) -> (f32, f32) {
        let px = ((x - self.view.x_min) * self.scale).clamp(-PIXEL_LIMIT, PIXEL_LIMIT);
        let py = ((self.view.y_max - y) * self.scale).clamp(-PIXEL_LIMIT, PIXEL_LIMIT);
        (px as f32, py as f32)
    }
}

pub(super) fn render(figure: &Figure, width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, WHITE);
    let px_per_pt = figure.size.px_per_pt();
    let font = figure.font.as_ref();

    let frame = Frame::fit(figure.map.rect.to_pixels(width, height), figure.map.view);
    let map_image = draw_map_layers(figure, &frame, px_per_pt);
    imageops::overlay(&mut canvas, &map_image, frame.left, frame.top);
    draw_boundary(&mut canvas, figure, &frame);

    match font {
        Some(font) => {
            let scale = Scale::uniform((FONT_SIZE_PT * px_per_pt) as f32);
            draw_map_text(&mut canvas, figure, &frame, font, scale);
        }
        None => debug!(figure_id = %figure.id, "No font configured, skipping text"),
    }

    if let Some(colorbar) = &figure.colorbar {
        draw_colorbar(&mut canvas, colorbar, font, px_per_pt);
    }

    if let (Some(font), Some(title)) = (font, figure.title.as_deref()) {
        let scale = Scale::uniform((TITLE_SIZE_PT * px_per_pt) as f32);
        let (text_width, _) = text_size(scale, font, title);
        let x = (width as i32 - text_width) / 2;
        let y = (0.02 * height as f64).round() as i32;
        draw_text_mut(&mut canvas, BLACK, x, y, scale, font, title);
    }

    canvas
}

fn draw_map_layers(figure: &Figure, frame: &Frame, px_per_pt: f64) -> RgbaImage {
    let map = &figure.map;
    let mut image = RgbaImage::from_pixel(frame.width, frame.height, Rgba(map.background));

    for layer in &map.layers {
        match layer {
            Layer::Fill { polygons, color } => {
                for polygon in polygons {
                    let points: Vec<(f32, f32)> =
                        polygon.iter().map(|(x, y)| frame.to_px(*x, *y)).collect();
                    fill_polygon(&mut image, &points, Rgba(*color));
                }
            }
            Layer::Stroke {
                lines,
                color,
                width,
                style,
            } => {
                for line in lines {
                    let points: Vec<(f32, f32)> =
                        line.iter().map(|(x, y)| frame.to_px(*x, *y)).collect();
                    stroke_line(&mut image, &points, Rgba(*color), *width, *style);
                }
            }
            Layer::Scatter { markers, marker } => {
                for point in markers {
                    draw_marker(&mut image, frame, point, *marker, px_per_pt);
                }
            }
            Layer::Text { .. } | Layer::EdgeLabels { .. } => {}
        }
    }

    if let MapBoundary::Circle { radius } = map.boundary {
        let (cx, cy) = frame.to_px(0.0, 0.0);
        let r = (radius * frame.scale) as f32;
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy > r * r {
                *pixel = TRANSPARENT;
            }
        }
    }

    image
}

fn draw_boundary(canvas: &mut RgbaImage, figure: &Figure, frame: &Frame) {
    match figure.map.boundary {
        MapBoundary::Rectangle => {
            let rect = Rect::at(frame.left as i32, frame.top as i32)
                .of_size(frame.width, frame.height);
            draw_hollow_rect_mut(canvas, rect, BLACK);
        }
        MapBoundary::Circle { radius } => {
            let (cx, cy) = frame.to_px(0.0, 0.0);
            let center = (
                cx.round() as i32 + frame.left as i32,
                cy.round() as i32 + frame.top as i32,
            );
            draw_hollow_circle_mut(canvas, center, (radius * frame.scale).round() as i32, BLACK);
        }
    }
}

fn fill_polygon(image: &mut RgbaImage, points: &[(f32, f32)], color: Rgba<u8>) {
    let mut poly: Vec<Point<i32>> = points
        .iter()
        .map(|(x, y)| Point::new(x.round() as i32, y.round() as i32))
        .collect();

    // Remove consecutive duplicates and the closing point
    poly.dedup();
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }

    if poly.len() >= 3 {
        draw_polygon_mut(image, &poly, color);
    }
}

fn stroke_line(
    image: &mut RgbaImage,
    points: &[(f32, f32)],
    color: Rgba<u8>,
    width: u32,
    style: LineStyle,
) {
    let mut phase = 0.0f32;
    for segment in points.windows(2) {
        let (a, b) = (segment[0], segment[1]);
        match style {
            LineStyle::Solid => draw_wide_segment(image, a, b, color, width),
            LineStyle::Dotted => draw_dotted_segment(image, a, b, color, &mut phase),
        }
    }
}

/// Clip a segment to the image rectangle grown by `margin` (Liang-Barsky)
fn clip_segment(
    a: (f32, f32),
    b: (f32, f32),
    width: u32,
    height: u32,
    margin: f32,
) -> Option<((f32, f32), (f32, f32))> {
    let (x_min, y_min) = (-margin, -margin);
    let (x_max, y_max) = (width as f32 + margin, height as f32 + margin);
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);

    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    for (p, q) in [
        (-dx, a.0 - x_min),
        (dx, x_max - a.0),
        (-dy, a.1 - y_min),
        (dy, y_max - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some(((a.0 + t0 * dx, a.1 + t0 * dy), (a.0 + t1 * dx, a.1 + t1 * dy)))
}

fn draw_wide_segment(
    image: &mut RgbaImage,
    a: (f32, f32),
    b: (f32, f32),
    color: Rgba<u8>,
    width: u32,
) {
    let margin = width as f32 + 1.0;
    let Some((a, b)) = clip_segment(a, b, image.width(), image.height(), margin) else {
        return;
    };
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let length = (dx * dx + dy * dy).sqrt();
    let (nx, ny) = if length > 0.0 { (-dy / length, dx / length) } else { (0.0, 0.0) };

    let width = width.max(1);
    for k in 0..width {
        let offset = k as f32 - (width - 1) as f32 / 2.0;
        draw_line_segment_mut(
            image,
            (a.0 + nx * offset, a.1 + ny * offset),
            (b.0 + nx * offset, b.1 + ny * offset),
            color,
        );
    }
}

/// One pixel on, two off, continuing the pattern across segments
fn draw_dotted_segment(
    image: &mut RgbaImage,
    a: (f32, f32),
    b: (f32, f32),
    color: Rgba<u8>,
    phase: &mut f32,
) {
    let full_length = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
    let Some((a, b)) = clip_segment(a, b, image.width(), image.height(), 1.0) else {
        *phase = (*phase + full_length).rem_euclid(3.0);
        return;
    };
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return;
    }

    let mut t = 0.0f32;
    while t < length {
        if (*phase + t).rem_euclid(3.0) < 1.0 {
            let x = (a.0 + dx * t / length).round();
            let y = (a.1 + dy * t / length).round();
            if x >= 0.0 && y >= 0.0 && (x as u32) < image.width() && (y as u32) < image.height() {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
        t += 1.0;
    }
    *phase = (*phase + full_length).rem_euclid(3.0);
}

fn draw_marker(
    image: &mut RgbaImage,
    frame: &Frame,
    point: &MarkerPoint,
    marker: Marker,
    px_per_pt: f64,
) {
    let (cx, cy) = frame.to_px(point.x, point.y);
    let r = ((point.size.max(0.0).sqrt() / 2.0) * px_per_pt).max(1.0) as f32;
    let color = Rgba(point.color);

    let polygon = |vertices: &[(f32, f32)]| -> Vec<(f32, f32)> {
        vertices.iter().map(|(x, y)| (cx + x * r, cy + y * r)).collect()
    };

    match marker {
        Marker::Circle => {
            draw_filled_circle_mut(
                image,
                (cx.round() as i32, cy.round() as i32),
                r.round() as i32,
                color,
            );
        }
        Marker::Square => {
            let side = (2.0 * r).round().max(1.0) as u32;
            let rect =
                Rect::at((cx - r).round() as i32, (cy - r).round() as i32).of_size(side, side);
            draw_filled_rect_mut(image, rect, color);
        }
        Marker::TriangleUp => {
            fill_polygon(image, &polygon(&[(0.0, -1.0), (0.866, 0.5), (-0.866, 0.5)]), color);
        }
        Marker::TriangleDown => {
            fill_polygon(image, &polygon(&[(0.0, 1.0), (-0.866, -0.5), (0.866, -0.5)]), color);
        }
        Marker::Diamond => {
            let diamond = polygon(&[(0.0, -1.0), (0.6, 0.0), (0.0, 1.0), (-0.6, 0.0)]);
            fill_polygon(image, &diamond, color);
        }
        Marker::Star => {
            let vertices: Vec<(f32, f32)> = (0..10)
                .map(|i| {
                    let angle = std::f32::consts::PI * (i as f32 / 5.0 - 0.5);
                    let radius = if i % 2 == 0 { 1.0 } else { 0.4 };
                    (radius * angle.cos(), radius * angle.sin())
                })
                .collect();
            fill_polygon(image, &polygon(&vertices), color);
        }
        Marker::Plus => {
            let width = (r / 4.0).round().max(1.0) as u32;
            draw_wide_segment(image, (cx - r, cy), (cx + r, cy), color, width);
            draw_wide_segment(image, (cx, cy - r), (cx, cy + r), color, width);
        }
        Marker::Cross => {
            let width = (r / 4.0).round().max(1.0) as u32;
            let d = r * std::f32::consts::FRAC_1_SQRT_2;
            draw_wide_segment(image, (cx - d, cy - d), (cx + d, cy + d), color, width);
            draw_wide_segment(image, (cx - d, cy + d), (cx + d, cy - d), color, width);
        }
    }
}

/// Heavy black text with a white outline
fn draw_outlined_text(
    canvas: &mut RgbaImage,
    font: &Font<'_>,
    scale: Scale,
    x: i32,
    y: i32,
    text: &str,
) {
    for dx in -2i32..=2 {
        for dy in -2i32..=2 {
            if dx * dx + dy * dy <= 5 {
                draw_text_mut(canvas, WHITE, x + dx, y + dy, scale, font, text);
            }
        }
    }
    draw_text_mut(canvas, BLACK, x, y, scale, font, text);
    draw_text_mut(canvas, BLACK, x + 1, y, scale, font, text);
}

fn draw_map_text(
    canvas: &mut RgbaImage,
    figure: &Figure,
    frame: &Frame,
    font: &Font<'_>,
    scale: Scale,
) {
    for layer in &figure.map.layers {
        match layer {
            Layer::Text { items } => {
                for item in items {
                    let (px, py) = frame.to_px(item.x, item.y);
                    let (_, text_height) = text_size(scale, font, &item.text);
                    // Text starts at the point, sitting on it
                    let x = px.round() as i32 + frame.left as i32;
                    let y = py.round() as i32 + frame.top as i32 - text_height;
                    draw_outlined_text(canvas, font, scale, x, y, &item.text);
                }
            }
            Layer::EdgeLabels { labels } => {
                for label in labels {
                    let (text_width, text_height) = text_size(scale, font, &label.text);
                    let left = frame.left as i32;
                    let top = frame.top as i32;
                    let right = left + frame.width as i32;
                    let bottom = top + frame.height as i32;
                    let (x, y) = match label.edge {
                        Edge::Left | Edge::Right => {
                            let (_, py) = frame.to_px(frame.view.x_min, label.position);
                            let y = top + py.round() as i32 - text_height / 2;
                            if label.edge == Edge::Left {
                                (left - LABEL_PAD_PX - text_width, y)
                            } else {
                                (right + LABEL_PAD_PX, y)
                            }
                        }
                        Edge::Top | Edge::Bottom => {
                            let (px, _) = frame.to_px(label.position, frame.view.y_min);
                            let x = left + px.round() as i32 - text_width / 2;
                            if label.edge == Edge::Top {
                                (x, top - LABEL_PAD_PX - text_height)
                            } else {
                                (x, bottom + LABEL_PAD_PX)
                            }
                        }
                    };
                    draw_text_mut(canvas, BLACK, x, y, scale, font, &label.text);
                }
            }
            _ => {}
        }
    }
}

fn draw_colorbar(
    canvas: &mut RgbaImage,
    colorbar: &ColorbarAxes,
    font: Option<&Font<'_>>,
    px_per_pt: f64,
) {
    let (left, top, width, height) = colorbar.rect.to_pixels(canvas.width(), canvas.height());

    for dx in 0..width {
        let fraction = if width > 1 { dx as f64 / (width - 1) as f64 } else { 0.5 };
        let color = Rgba(colorbar.scale.color_at_fraction(fraction));
        let x = left + dx as i64;
        for dy in 0..height {
            let y = top + dy as i64;
            if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }
    draw_hollow_rect_mut(canvas, Rect::at(left as i32, top as i32).of_size(width, height), BLACK);

    let (vmin, vmax) = (colorbar.scale.vmin(), colorbar.scale.vmax());
    let scale = Scale::uniform((FONT_SIZE_PT * px_per_pt) as f32);
    let bottom = (top + height as i64) as f32;

    for (value, label) in colorbar.ticks.values.iter().zip(&colorbar.ticks.labels) {
        let fraction = if vmax > vmin { (value - vmin) / (vmax - vmin) } else { 0.5 };
        let x = left as f32 + (fraction * (width.saturating_sub(1)) as f64) as f32;
        draw_line_segment_mut(canvas, (x, bottom), (x, bottom + TICK_LENGTH_PX), BLACK);

        if let Some(font) = font {
            let (text_width, _) = text_size(scale, font, label);
            let text_x = x.round() as i32 - text_width / 2;
            let text_y = (bottom + TICK_LENGTH_PX) as i32 + 2;
            draw_text_mut(canvas, BLACK, text_x, text_y, scale, font, label);
        }
    }
}

//! Colormap trait, colormap lookup and colour-string parsing.
//!
//! Colormaps map a normalized value in `[0, 1]` to RGBA. [`ColorScale`]
//! pairs a colormap with the data range of the plotted colour values.

use crate::error::{Result, SeismapError};

/// Colormap used when the caller does not name one
pub const DEFAULT_COLORMAP: &str = "viridis";

/// Trait for color mapping implementations
pub trait Colormap {
    /// Map a normalized value (0.0 to 1.0) to an RGBA color
    fn map_normalized(&self, value: f64) -> [u8; 4];

    /// Map a value to an RGBA color given the data range
    fn map(&self, value: f64, min: f64, max: f64) -> [u8; 4] {
        let normalized = if max > min {
            ((value - min) / (max - min)).clamp(0.0, 1.0)
        } else {
            0.5
        };
        self.map_normalized(normalized)
    }

    /// Get the name of this colormap
    fn name(&self) -> &str;
}

/// Get a colormap by name
pub fn get_colormap(name: &str) -> Result<Box<dyn Colormap>> {
    use super::{diverging::*, sequential::*};

    match name.to_lowercase().as_str() {
        "viridis" => Ok(Box::new(Sequential::viridis())),
        "plasma" => Ok(Box::new(Sequential::plasma())),
        "inferno" => Ok(Box::new(Sequential::inferno())),
        "magma" => Ok(Box::new(Sequential::magma())),
        "cividis" => Ok(Box::new(Sequential::cividis())),
        "turbo" => Ok(Box::new(Sequential::turbo())),
        "jet" => Ok(Box::new(Sequential::jet()?)),
        "coolwarm" => Ok(Box::new(Coolwarm)),
        "rdbu" => Ok(Box::new(RdBu)),
        "seismic" => Ok(Box::new(Seismic)),
        _ => Err(SeismapError::invalid(
            "colormap",
            format!("Unknown colormap: {}", name),
        )),
    }
}

/// A colormap bound to the value range of one plot.
pub struct ColorScale {
    colormap: Box<dyn Colormap>,
    vmin: f64,
    vmax: f64,
}

impl ColorScale {
    /// Build a scale from an optional colormap name and the data range.
    pub fn new(colormap: Option<&str>, vmin: f64, vmax: f64) -> Result<Self> {
        Ok(Self {
            colormap: get_colormap(colormap.unwrap_or(DEFAULT_COLORMAP))?,
            vmin,
            vmax,
        })
    }

    pub fn vmin(&self) -> f64 {
        self.vmin
    }

    pub fn vmax(&self) -> f64 {
        self.vmax
    }

    pub fn colormap_name(&self) -> &str {
        self.colormap.name()
    }

    /// Colour of a data value
    pub fn color(&self, value: f64) -> [u8; 4] {
        self.colormap.map(value, self.vmin, self.vmax)
    }

    /// Colour at a fraction of the scale, used to paint the colorbar
    pub fn color_at_fraction(&self, fraction: f64) -> [u8; 4] {
        self.colormap.map_normalized(fraction.clamp(0.0, 1.0))
    }
}

impl std::fmt::Debug for ColorScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorScale")
            .field("colormap", &self.colormap.name())
            .field("vmin", &self.vmin)
            .field("vmax", &self.vmax)
            .finish()
    }
}

/// Parse a colour string into RGBA.
///
/// Accepts grey levels written as a fraction (`"0.8"`), single-letter codes
/// (`"k"`, `"w"`, `"r"`, ...), CSS names and hex notation.
pub fn parse_color(spec: &str) -> Result<[u8; 4]> {
    let spec = spec.trim();

    if let Ok(level) = spec.parse::<f64>() {
        if !(0.0..=1.0).contains(&level) {
            return Err(SeismapError::invalid(
                "color",
                format!("Grey level must be within [0, 1]: {}", spec),
            ));
        }
        let v = (level * 255.0).round() as u8;
        return Ok([v, v, v, 255]);
    }

    let named = match spec {
        "k" => Some([0, 0, 0, 255]),
        "w" => Some([255, 255, 255, 255]),
        "r" => Some([255, 0, 0, 255]),
        "g" => Some([0, 128, 0, 255]),
        "b" => Some([0, 0, 255, 255]),
        "c" => Some([0, 191, 191, 255]),
        "m" => Some([191, 0, 191, 255]),
        "y" => Some([191, 191, 0, 255]),
        _ => None,
    };
    if let Some(rgba) = named {
        return Ok(rgba);
    }

    spec.parse::<colorgrad::Color>()
        .map(|c| c.to_rgba8())
        .map_err(|e| SeismapError::invalid("color", format!("Invalid color '{}': {}", spec, e)))
}

/// Linear interpolation between two colors
pub fn lerp_color(c1: [u8; 3], c2: [u8; 3], t: f64) -> [u8; 3] {
    [
        (c1[0] as f64 * (1.0 - t) + c2[0] as f64 * t) as u8,
        (c1[1] as f64 * (1.0 - t) + c2[1] as f64 * t) as u8,
        (c1[2] as f64 * (1.0 - t) + c2[2] as f64 * t) as u8,
    ]
}

/// Sample a table of evenly spaced RGB stops at a normalized position.
pub fn interpolate_table(table: &[[u8; 3]], value: f64) -> [u8; 4] {
    let last = table.len() - 1;
    let position = value.clamp(0.0, 1.0) * last as f64;
    let index = position.floor() as usize;

    if index >= last {
        let c = table[last];
        return [c[0], c[1], c[2], 255];
    }

    let rgb = lerp_color(table[index], table[index + 1], position - index as f64);
    [rgb[0], rgb[1], rgb[2], 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_color() {
        let mid = lerp_color([0, 0, 0], [255, 255, 255], 0.5);
        assert_eq!(mid, [127, 127, 127]);
    }

    #[test]
    fn test_parse_grey_levels() {
        assert_eq!(parse_color("0.8").unwrap(), [204, 204, 204, 255]);
        assert_eq!(parse_color("1.0").unwrap(), [255, 255, 255, 255]);
        assert!(parse_color("1.5").is_err());
    }

    #[test]
    fn test_parse_named_and_hex() {
        assert_eq!(parse_color("k").unwrap(), [0, 0, 0, 255]);
        assert_eq!(parse_color("#ff0000").unwrap(), [255, 0, 0, 255]);
        assert_eq!(parse_color("white").unwrap(), [255, 255, 255, 255]);
        assert!(parse_color("not-a-colour").is_err());
    }

    #[test]
    fn test_unknown_colormap() {
        assert!(get_colormap("viridis").is_ok());
        assert!(get_colormap("Seismic").is_ok());
        assert!(get_colormap("nope").is_err());
    }

    #[test]
    fn test_color_scale_ends() {
        let scale = ColorScale::new(Some("seismic"), 0.0, 10.0).unwrap();
        assert_eq!(scale.color(0.0), scale.color_at_fraction(0.0));
        assert_eq!(scale.color(10.0), scale.color_at_fraction(1.0));
        assert_eq!(scale.color(50.0), scale.color_at_fraction(1.0));
        assert_eq!(scale.colormap_name(), "seismic");
    }
}

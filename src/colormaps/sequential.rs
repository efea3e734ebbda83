//! Sequential colormaps (single-hue or perceptual progression).
//!
//! These colormaps are suitable for depths, magnitudes and origin times.

use super::colormap::Colormap;
use crate::error::{Result, SeismapError};

/// A sequential colormap backed by a `colorgrad` gradient
pub struct Sequential {
    name: &'static str,
    gradient: colorgrad::Gradient,
}

impl Sequential {
    /// Viridis colormap - perceptually uniform, colorblind-friendly
    pub fn viridis() -> Self {
        Self {
            name: "viridis",
            gradient: colorgrad::viridis(),
        }
    }

    pub fn plasma() -> Self {
        Self {
            name: "plasma",
            gradient: colorgrad::plasma(),
        }
    }

    pub fn inferno() -> Self {
        Self {
            name: "inferno",
            gradient: colorgrad::inferno(),
        }
    }

    pub fn magma() -> Self {
        Self {
            name: "magma",
            gradient: colorgrad::magma(),
        }
    }

    pub fn cividis() -> Self {
        Self {
            name: "cividis",
            gradient: colorgrad::cividis(),
        }
    }

    pub fn turbo() -> Self {
        Self {
            name: "turbo",
            gradient: colorgrad::turbo(),
        }
    }

    /// Jet colormap - the classic rainbow still common in earthquake catalogues
    pub fn jet() -> Result<Self> {
        let gradient = colorgrad::CustomGradient::new()
            .html_colors(&["#00007f", "#0000ff", "#00ffff", "#ffff00", "#ff0000", "#7f0000"])
            .domain(&[0.0, 0.11, 0.36, 0.64, 0.89, 1.0])
            .build()
            .map_err(|e| SeismapError::invalid("colormap", format!("jet: {}", e)))?;
        Ok(Self {
            name: "jet",
            gradient,
        })
    }
}

impl Colormap for Sequential {
    fn map_normalized(&self, value: f64) -> [u8; 4] {
        self.gradient.at(value.clamp(0.0, 1.0)).to_rgba8()
    }

    fn name(&self) -> &str {
        self.name
    }
}

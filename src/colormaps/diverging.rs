//! Diverging colormaps (two-hue progression with center).
//!
//! Useful for signed quantities such as residuals or polarity.

use super::colormap::{interpolate_table, Colormap};

/// Blue to white to red
const COOLWARM: [[u8; 3]; 32] = [
    [59, 76, 192],
    [68, 90, 204],
    [77, 104, 215],
    [87, 117, 225],
    [98, 130, 234],
    [108, 142, 241],
    [119, 154, 247],
    [130, 165, 251],
    [141, 176, 254],
    [152, 185, 255],
    [163, 194, 255],
    [174, 201, 253],
    [184, 208, 249],
    [194, 213, 244],
    [204, 217, 238],
    [213, 219, 230],
    [221, 221, 221],
    [229, 216, 209],
    [236, 211, 197],
    [241, 204, 185],
    [245, 196, 173],
    [247, 187, 160],
    [247, 177, 148],
    [247, 166, 135],
    [244, 154, 123],
    [241, 141, 111],
    [236, 127, 99],
    [229, 112, 88],
    [222, 96, 77],
    [213, 80, 66],
    [203, 62, 56],
    [192, 40, 47],
];

/// Dark blue to white to dark red
const SEISMIC: [[u8; 3]; 15] = [
    [0, 0, 127],
    [0, 0, 191],
    [0, 63, 255],
    [0, 127, 255],
    [0, 191, 255],
    [127, 223, 255],
    [191, 239, 255],
    [255, 255, 255],
    [255, 239, 191],
    [255, 223, 127],
    [255, 191, 0],
    [255, 127, 0],
    [255, 63, 0],
    [191, 0, 0],
    [127, 0, 0],
];

/// Coolwarm colormap - blue to red through white
pub struct Coolwarm;

impl Colormap for Coolwarm {
    fn map_normalized(&self, value: f64) -> [u8; 4] {
        interpolate_table(&COOLWARM, value)
    }

    fn name(&self) -> &str {
        "coolwarm"
    }
}

/// RdBu colormap - coolwarm traversed from red to blue
pub struct RdBu;

impl Colormap for RdBu {
    fn map_normalized(&self, value: f64) -> [u8; 4] {
        interpolate_table(&COOLWARM, 1.0 - value.clamp(0.0, 1.0))
    }

    fn name(&self) -> &str {
        "rdbu"
    }
}

/// Seismic colormap - blue-white-red for anomalies
pub struct Seismic;

impl Colormap for Seismic {
    fn map_normalized(&self, value: f64) -> [u8; 4] {
        interpolate_table(&SEISMIC, value)
    }

    fn name(&self) -> &str {
        "seismic"
    }
}

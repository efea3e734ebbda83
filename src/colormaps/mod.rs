//! Colormap implementations for colour-coding plotted points.
//!
//! Matplotlib-inspired colormaps plus parsing of matplotlib-style colour strings.

pub mod colormap;
pub mod diverging;
pub mod sequential;

pub use colormap::{get_colormap, parse_color, ColorScale, Colormap, DEFAULT_COLORMAP};

pub use diverging::{Coolwarm, RdBu, Seismic};
pub use sequential::Sequential;

//! Error types for seismap.
//!
//! A single enum covers every failure the library reports. Renderer and
//! projection lookups fail with descriptive messages naming the offending
//! value; everything else is input validation or I/O.

use thiserror::Error;

/// The main error type for seismap operations.
#[derive(Error, Debug)]
pub enum SeismapError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// GeoJSON feature parsing errors
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// A projection name or type the chosen renderer cannot draw
    #[error("Projection '{name}' not supported.")]
    UnsupportedProjection { name: String },

    /// Unknown renderer name passed to `plot_map`
    #[error("The method argument must be either 'basemap' or 'cartopy', not '{method}'.")]
    UnknownMethod { method: String },

    /// Renderer compiled out of this build
    #[error("Renderer '{name}' is not available in this build")]
    BackendUnavailable { name: String },

    /// Colour sequence mixing numbers and timestamps
    #[error("Mixed color values: {message}")]
    MixedColorValues { message: String },

    /// Image generation errors
    #[error("Image generation error: {message}")]
    ImageGeneration { message: String },

    /// Font loading errors
    #[error("Font error: {message}")]
    Font { message: String },
}

impl SeismapError {
    /// Shorthand for [`SeismapError::InvalidParameter`].
    pub fn invalid(param: &str, message: impl Into<String>) -> Self {
        SeismapError::InvalidParameter {
            param: param.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results with SeismapError
pub type Result<T> = std::result::Result<T, SeismapError>;

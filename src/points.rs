//! Point sets to be plotted and their colour values.
//!
//! A [`PointSet`] holds parallel per-point sequences (longitude, latitude,
//! marker size, colour, optional label). Colour values are either numbers or
//! timestamps; [`normalize_colors`] turns them into one numeric colour axis.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, SeismapError};

const SECONDS_PER_DAY: f64 = 86_400.0;
const NANOS_PER_DAY: f64 = SECONDS_PER_DAY * 1e9;

/// Colour value of a single point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorValue {
    /// Plain quantity such as depth or magnitude
    Numeric(f64),
    /// Origin time or other instant
    Time(DateTime<Utc>),
}

impl ColorValue {
    fn kind(&self) -> &'static str {
        match self {
            ColorValue::Numeric(_) => "number",
            ColorValue::Time(_) => "timestamp",
        }
    }
}

impl From<f64> for ColorValue {
    fn from(value: f64) -> Self {
        ColorValue::Numeric(value)
    }
}

impl From<DateTime<Utc>> for ColorValue {
    fn from(value: DateTime<Utc>) -> Self {
        ColorValue::Time(value)
    }
}

/// Colour argument of a plot
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpec {
    /// One colour string shared by every point
    Uniform(String),
    /// One colour value per point, mapped through the colormap
    Values(Vec<ColorValue>),
}

/// Marker size argument (matplotlib area in points²)
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerSize {
    Uniform(f64),
    PerPoint(Vec<f64>),
}

impl MarkerSize {
    pub fn at(&self, index: usize) -> f64 {
        match self {
            MarkerSize::Uniform(size) => *size,
            MarkerSize::PerPoint(sizes) => sizes[index],
        }
    }
}

/// The points of one map plot
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    lons: Vec<f64>,
    lats: Vec<f64>,
    size: MarkerSize,
    color: ColorSpec,
    labels: Option<Vec<String>>,
}

impl PointSet {
    /// Build a point set, checking that every per-point sequence matches.
    pub fn new(lons: Vec<f64>, lats: Vec<f64>, size: MarkerSize, color: ColorSpec) -> Result<Self> {
        if lons.is_empty() {
            return Err(SeismapError::invalid("lons", "At least one point is required"));
        }
        if lats.len() != lons.len() {
            return Err(SeismapError::invalid(
                "lats",
                format!("Expected {} latitudes, got {}", lons.len(), lats.len()),
            ));
        }
        if let Some((lon, lat)) = lons
            .iter()
            .zip(&lats)
            .find(|(lon, lat)| !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0)
        {
            return Err(SeismapError::invalid(
                "lats",
                format!("Invalid coordinate ({}, {})", lon, lat),
            ));
        }
        if let MarkerSize::PerPoint(sizes) = &size {
            if sizes.len() != lons.len() {
                return Err(SeismapError::invalid(
                    "size",
                    format!("Expected {} sizes, got {}", lons.len(), sizes.len()),
                ));
            }
        }
        if let ColorSpec::Values(values) = &color {
            if values.len() != lons.len() {
                return Err(SeismapError::invalid(
                    "color",
                    format!("Expected {} color values, got {}", lons.len(), values.len()),
                ));
            }
        }

        Ok(Self {
            lons,
            lats,
            size,
            color,
            labels: None,
        })
    }

    /// Attach one annotation per point.
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self> {
        if labels.len() != self.lons.len() {
            return Err(SeismapError::invalid(
                "labels",
                format!("Expected {} labels, got {}", self.lons.len(), labels.len()),
            ));
        }
        self.labels = Some(labels);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.lons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lons.is_empty()
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn size(&self) -> &MarkerSize {
        &self.size
    }

    pub fn color(&self) -> &ColorSpec {
        &self.color
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Arithmetic mean of the longitudes
    pub fn mean_lon(&self) -> f64 {
        self.lons.iter().sum::<f64>() / self.lons.len() as f64
    }

    /// Arithmetic mean of the latitudes
    pub fn mean_lat(&self) -> f64 {
        self.lats.iter().sum::<f64>() / self.lats.len() as f64
    }
}

/// Colour values converted to a numeric axis
#[derive(Debug, Clone, PartialEq)]
pub struct ColorAxis {
    /// One numeric value per point; for timestamps, days after `origin`
    pub values: Vec<f64>,
    /// True when the values are days and need date tick labels
    pub is_time: bool,
    /// Day number (see [`date_to_num`]) the time values count from, 0 for numbers
    pub origin: f64,
    pub vmin: f64,
    pub vmax: f64,
}

/// Convert colour values into a numeric colour axis.
///
/// The first element decides whether the sequence holds timestamps; every
/// other element must be of the same kind.
pub fn normalize_colors(values: &[ColorValue]) -> Result<ColorAxis> {
    let first = values
        .first()
        .ok_or_else(|| SeismapError::invalid("color", "No color values given"))?;
    let is_time = matches!(first, ColorValue::Time(_));
    let earliest = values
        .iter()
        .filter_map(|value| match value {
            ColorValue::Time(t) => Some(*t),
            ColorValue::Numeric(_) => None,
        })
        .min();

    let numeric = values
        .iter()
        .enumerate()
        .map(|(index, value)| match (value, is_time) {
            (ColorValue::Time(t), true) => {
                Ok(earliest.map_or(0.0, |origin| days_between(t, &origin)))
            }
            (ColorValue::Numeric(v), false) => Ok(*v),
            (other, _) => Err(SeismapError::MixedColorValues {
                message: format!(
                    "element {} is a {} but the sequence starts with a {}",
                    index,
                    other.kind(),
                    first.kind()
                ),
            }),
        })
        .collect::<Result<Vec<f64>>>()?;

    let vmin = numeric.iter().copied().fold(f64::INFINITY, f64::min);
    let vmax = numeric.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    debug!(
        count = numeric.len(),
        is_time = is_time,
        vmin = vmin,
        vmax = vmax,
        "Normalized color values"
    );

    Ok(ColorAxis {
        values: numeric,
        is_time,
        origin: earliest.filter(|_| is_time).map_or(0.0, |t| date_to_num(&t)),
        vmin,
        vmax,
    })
}

/// Days since 1970-01-01T00:00:00Z, including the fractional day
pub fn date_to_num(t: &DateTime<Utc>) -> f64 {
    t.timestamp() as f64 / SECONDS_PER_DAY
        + t.timestamp_subsec_nanos() as f64 / (SECONDS_PER_DAY * 1e9)
}

/// Days from `origin` to `t` from the exact nanosecond difference, so close
/// instants stay distinct however far they are from 1970.
fn days_between(t: &DateTime<Utc>, origin: &DateTime<Utc>) -> f64 {
    match (*t - *origin).num_nanoseconds() {
        Some(nanos) => nanos as f64 / NANOS_PER_DAY,
        None => date_to_num(t) - date_to_num(origin),
    }
}

/// Inverse of [`date_to_num`], rounded to the nearest millisecond
pub fn num_to_date(days: f64) -> Option<DateTime<Utc>> {
    let millis = (days * SECONDS_PER_DAY * 1000.0).round();
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

/// Decide whether a colorbar is drawn.
///
/// An explicit request wins; otherwise only several points coloured by
/// per-point values get a colorbar.
pub fn should_show_colorbar(request: Option<bool>, point_count: usize, color: &ColorSpec) -> bool {
    match request {
        Some(show) => show,
        None => point_count > 1 && matches!(color, ColorSpec::Values(_)),
    }
}

/// One point as stored in a points JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointRecord {
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub color: Option<ColorValue>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Contents of a points JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsFile {
    pub points: Vec<PointRecord>,
    /// Shared colour string used when points carry no colour values
    #[serde(default)]
    pub color: Option<String>,
}

/// Default marker area when a record does not give one
pub const DEFAULT_MARKER_SIZE: f64 = 30.0;

impl PointsFile {
    /// Turn the records into a validated [`PointSet`].
    pub fn into_point_set(self) -> Result<PointSet> {
        let lons = self.points.iter().map(|p| p.lon).collect();
        let lats = self.points.iter().map(|p| p.lat).collect();
        let size = MarkerSize::PerPoint(
            self.points
                .iter()
                .map(|p| p.size.unwrap_or(DEFAULT_MARKER_SIZE))
                .collect(),
        );

        let colored = self.points.iter().filter(|p| p.color.is_some()).count();
        let color = if colored == 0 {
            ColorSpec::Uniform(self.color.unwrap_or_else(|| "r".to_string()))
        } else if colored == self.points.len() {
            ColorSpec::Values(self.points.iter().filter_map(|p| p.color.clone()).collect())
        } else {
            return Err(SeismapError::invalid(
                "color",
                format!("{} of {} points have a color value", colored, self.points.len()),
            ));
        };

        let labels: Vec<String> = self.points.iter().filter_map(|p| p.label.clone()).collect();
        let has_labels = !labels.is_empty();
        let label_count = labels.len();

        let set = PointSet::new(lons, lats, size, color)?;
        if !has_labels {
            Ok(set)
        } else if label_count == set.len() {
            set.with_labels(labels)
        } else {
            Err(SeismapError::invalid(
                "labels",
                format!("{} of {} points have a label", label_count, set.len()),
            ))
        }
    }
}

/// Load a point set from a JSON file
pub fn load_points(path: &Path) -> Result<PointSet> {
    let content = std::fs::read_to_string(path)?;
    let file: PointsFile = serde_json::from_str(&content)?;
    debug!(path = %path.display(), points = file.points.len(), "Loaded points file");
    file.into_point_set()
}

//! Gridline positions and labels.
//!
//! [`linspace2`] picks round tick values for a local map; the global grids
//! are fixed 30° spacings.

use crate::error::{Result, SeismapError};
use crate::geo::extent::LocalExtent;

/// Spacing of the global graticule, in degrees
pub const GLOBAL_GRID_STEP: f64 = 30.0;

/// Approximate number of gridlines along the longer side of a local map
pub const LOCAL_GRID_TARGET: f64 = 8.0;

/// Return around `n` round values between `val1` and `val2`.
///
/// The spacing is half of `2 * (val2 - val1) / n` rounded at the decimal
/// place suited to that magnitude, so ticks land on multiples of 1, 5, 10,
/// 50, ... times a power of ten. The returned values are multiples of that
/// spacing lying within `[val1, val2]`.
pub fn linspace2(val1: f64, val2: f64, n: usize) -> Result<Vec<f64>> {
    let dval = val2 - val1;
    if n == 0 {
        return Err(SeismapError::invalid("n", "Tick count must be at least 1"));
    }
    if !(dval.is_finite() && dval > 0.0) {
        return Err(SeismapError::invalid(
            "range",
            format!("Tick range must be positive and finite: [{}, {}]", val1, val2),
        ));
    }

    let n = n as f64;
    let round_pos = (-(dval / n).log10()).round() as i32;
    let delta = if round_pos < 0 {
        let factor = 10f64.powi(-round_pos);
        (2.0 * dval / n / factor).round() * factor / 2.0
    } else {
        let factor = 10f64.powi(round_pos);
        (2.0 * dval / n * factor).round() / factor / 2.0
    };
    if delta <= 0.0 {
        return Err(SeismapError::invalid(
            "range",
            format!("No tick spacing found for [{}, {}]", val1, val2),
        ));
    }

    let start = (val1 / delta).ceil() * delta;
    let end = (val2 / delta).floor() * delta;
    if end < start {
        // no multiple of the spacing inside the range
        return Ok(Vec::new());
    }
    let count = ((end - start) / delta).round() as usize + 1;

    Ok(linspace(start, end, count))
}

/// `count` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Values from `start` in steps of `step`, stopping before `stop` (or at it when `inclusive`)
pub fn arange(start: f64, stop: f64, step: f64, inclusive: bool) -> Vec<f64> {
    let mut values = Vec::new();
    let mut i = 0usize;
    loop {
        let value = start + step * i as f64;
        if value > stop || (!inclusive && value >= stop) {
            break;
        }
        values.push(value);
        i += 1;
    }
    values
}

/// Global graticule as `(meridians, parallels)`.
///
/// `inclusive` also emits the closing 180° meridian and 90° parallel.
pub fn global_gridlines(inclusive: bool) -> (Vec<f64>, Vec<f64>) {
    (
        arange(-180.0, 180.0, GLOBAL_GRID_STEP, inclusive),
        arange(-90.0, 90.0, GLOBAL_GRID_STEP, inclusive),
    )
}

/// Gridlines of a local map as `(meridians, parallels)`.
///
/// Meridians beyond 180° are shifted back by 360°.
pub fn local_gridlines(extent: &LocalExtent) -> Result<(Vec<f64>, Vec<f64>)> {
    let longest = extent.width.max(extent.height);
    let n_lat = (extent.height / longest * LOCAL_GRID_TARGET).ceil() as usize;
    let n_lon = (extent.width / longest * LOCAL_GRID_TARGET).ceil() as usize;

    let (lat0, lat1) = extent.lat_range();
    let parallels = linspace2(lat0, lat1, n_lat)?;

    let (lon0, lon1) = extent.lon_range();
    let meridians = linspace2(lon0, lon1, n_lon)?
        .into_iter()
        .map(|lon| if lon > 180.0 { lon - 360.0 } else { lon })
        .collect();

    Ok((meridians, parallels))
}

/// Label of a parallel, e.g. `30°N`
pub fn format_latitude(lat: f64) -> String {
    let hemisphere = if lat > 0.0 {
        "N"
    } else if lat < 0.0 {
        "S"
    } else {
        ""
    };
    format!("{}°{}", trim_number(lat.abs()), hemisphere)
}

/// Label of a meridian, e.g. `120°W`
pub fn format_longitude(lon: f64) -> String {
    let lon = crate::geo::extent::normalize_longitude(lon);
    let hemisphere = if lon > 0.0 {
        "E"
    } else if lon < 0.0 && lon > -180.0 {
        "W"
    } else {
        ""
    };
    format!("{}°{}", trim_number(lon.abs()), hemisphere)
}

fn trim_number(value: f64) -> String {
    let text = format!("{:.4}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

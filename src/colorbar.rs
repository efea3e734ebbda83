//! Colorbar tick placement and tick label formatting.
//!
//! A user-supplied tick format switches the colorbar to at most five nicely
//! spaced ticks. Without one, time axes get calendar-aligned ticks with
//! date labels and numeric axes get nice decimal ticks.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SeismapError};
use crate::points::{date_to_num, num_to_date};

/// Tick count bound used with a user tick format
pub const FORMATTED_MAX_BINS: usize = 5;

/// Tick count bound of the automatic numeric locator
pub const AUTO_MAX_BINS: usize = 9;

/// Multiples of a power of ten a tick step may take
const NICE_STEPS: [f64; 5] = [1.0, 2.0, 2.5, 5.0, 10.0];

/// Fewest ticks a date unit must yield before it is chosen
const DATE_MIN_TICKS: f64 = 5.0;

/// Format applied to colorbar tick values
#[derive(Clone)]
pub enum TickFormat {
    /// printf-style format string, e.g. `%.1f km`
    Printf(String),
    /// Arbitrary formatting function
    Func(Arc<dyn Fn(f64) -> String + Send + Sync>),
}

impl TickFormat {
    /// Checks the format against a sample value before accepting it
    pub fn printf(format: &str) -> Result<Self> {
        printf_value(format, 0.0).map_err(|e| {
            SeismapError::invalid(
                "colorbar_ticklabel_format",
                format!("Invalid format '{}': {:?}", format, e),
            )
        })?;
        Ok(TickFormat::Printf(format.to_string()))
    }

    pub fn func<F>(f: F) -> Self
    where
        F: Fn(f64) -> String + Send + Sync + 'static,
    {
        TickFormat::Func(Arc::new(f))
    }

    pub fn format(&self, value: f64) -> String {
        match self {
            TickFormat::Printf(format) => {
                printf_value(format, value).unwrap_or_else(|_| format.clone())
            }
            TickFormat::Func(f) => f(value),
        }
    }
}

impl fmt::Debug for TickFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickFormat::Printf(format) => f.debug_tuple("Printf").field(format).finish(),
            TickFormat::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// Tick values of a colorbar and their labels
#[derive(Debug, Clone, PartialEq)]
pub struct ColorbarTicks {
    pub values: Vec<f64>,
    pub labels: Vec<String>,
}

/// Pick colorbar ticks for a value range.
///
/// `time_origin` marks values as days counted from that day number (see
/// [`crate::points::ColorAxis`]); ticks are placed and labelled on the
/// absolute dates and returned relative to the origin again.
pub fn colorbar_ticks(
    vmin: f64,
    vmax: f64,
    time_origin: Option<f64>,
    format: Option<&TickFormat>,
) -> ColorbarTicks {
    let origin = time_origin.unwrap_or(0.0);
    let mut ticks = locate_ticks(vmin + origin, vmax + origin, time_origin.is_some(), format);
    if origin != 0.0 {
        ticks.values.iter_mut().for_each(|v| *v -= origin);
    }
    ticks
}

fn locate_ticks(vmin: f64, vmax: f64, is_time: bool, format: Option<&TickFormat>) -> ColorbarTicks {
    if let Some(format) = format {
        let values = max_n_locator(vmin, vmax, FORMATTED_MAX_BINS);
        let labels = values.iter().map(|v| format.format(*v)).collect();
        return ColorbarTicks { values, labels };
    }

    if is_time {
        return auto_date_ticks(vmin, vmax);
    }

    let values = max_n_locator(vmin, vmax, AUTO_MAX_BINS);
    let step = if values.len() > 1 { values[1] - values[0] } else { 1.0 };
    let labels = values.iter().map(|v| format_decimal(*v, step)).collect();
    ColorbarTicks { values, labels }
}

/// At most `max_bins + 1` ticks on multiples of a nice step within `[vmin, vmax]`
pub fn max_n_locator(vmin: f64, vmax: f64, max_bins: usize) -> Vec<f64> {
    if !(vmin.is_finite() && vmax.is_finite()) {
        return Vec::new();
    }
    if vmax <= vmin || max_bins == 0 {
        return vec![vmin];
    }

    let step = nice_step((vmax - vmin) / max_bins as f64);
    ticks_on_step(vmin, vmax, step)
}

fn nice_step(raw_step: f64) -> f64 {
    let scale = 10f64.powf(raw_step.log10().floor());
    NICE_STEPS
        .iter()
        .map(|s| s * scale)
        .find(|s| *s >= raw_step * (1.0 - 1e-9))
        .unwrap_or(10.0 * scale)
}

fn ticks_on_step(vmin: f64, vmax: f64, step: f64) -> Vec<f64> {
    let first = (vmin / step - 1e-9).ceil() as i64;
    let last = (vmax / step + 1e-9).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

/// Format a tick with as many decimals as the tick step needs
pub fn format_decimal(value: f64, step: f64) -> String {
    let decimals = (0..=10usize)
        .find(|d| {
            let scaled = step.abs() * 10f64.powi(*d as i32);
            (scaled - scaled.round()).abs() < 1e-6 * scaled.max(1.0)
        })
        .unwrap_or(10);
    format!("{:.*}", decimals, value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl DateUnit {
    const ALL: [DateUnit; 6] = [
        DateUnit::Year,
        DateUnit::Month,
        DateUnit::Day,
        DateUnit::Hour,
        DateUnit::Minute,
        DateUnit::Second,
    ];

    fn days(&self) -> f64 {
        match self {
            DateUnit::Year => 365.25,
            DateUnit::Month => 30.4375,
            DateUnit::Day => 1.0,
            DateUnit::Hour => 1.0 / 24.0,
            DateUnit::Minute => 1.0 / 1440.0,
            DateUnit::Second => 1.0 / 86_400.0,
        }
    }

    fn intervals(&self) -> &'static [i64] {
        match self {
            DateUnit::Year => &[1, 2, 4, 5, 10, 20, 40, 50, 100, 200, 400, 500, 1000],
            DateUnit::Month => &[1, 2, 3, 4, 6],
            DateUnit::Day => &[1, 2, 3, 7, 14],
            DateUnit::Hour => &[1, 2, 3, 4, 6, 12],
            DateUnit::Minute | DateUnit::Second => &[1, 5, 10, 15, 30],
        }
    }

    fn max_ticks(&self) -> f64 {
        match self {
            DateUnit::Month | DateUnit::Hour => 12.0,
            _ => 11.0,
        }
    }

    fn label_format(&self) -> &'static str {
        match self {
            DateUnit::Year => "%Y",
            DateUnit::Month => "%b %Y",
            DateUnit::Day => "%b %d %Y",
            DateUnit::Hour | DateUnit::Minute | DateUnit::Second => "%H:%M:%S",
        }
    }
}

/// Calendar-aligned ticks for a day-number range, labelled by their scale
pub fn auto_date_ticks(vmin: f64, vmax: f64) -> ColorbarTicks {
    let (start, end) = match (num_to_date(vmin), num_to_date(vmax)) {
        (Some(start), Some(end)) if vmax > vmin => (start, end),
        (Some(start), _) => {
            return ColorbarTicks {
                values: vec![vmin],
                labels: vec![start.format("%Y-%m-%d %H:%M:%S").to_string()],
            }
        }
        _ => {
            return ColorbarTicks {
                values: Vec::new(),
                labels: Vec::new(),
            }
        }
    };

    let span = vmax - vmin;
    let unit = DateUnit::ALL
        .iter()
        .copied()
        .find(|unit| span / unit.days() >= DATE_MIN_TICKS);

    let Some(unit) = unit else {
        // Only a few seconds: plain numeric ticks with sub-second labels
        let step = nice_step(span / FORMATTED_MAX_BINS as f64);
        let values = ticks_on_step(vmin, vmax, step);
        let labels = values
            .iter()
            .map(|v| format_date(*v, "%H:%M:%S%.3f"))
            .collect();
        return ColorbarTicks { values, labels };
    };

    let count = span / unit.days();
    let interval = unit
        .intervals()
        .iter()
        .copied()
        .find(|i| count / *i as f64 <= unit.max_ticks())
        .or_else(|| unit.intervals().last().copied())
        .unwrap_or(1);

    let values: Vec<f64> = date_ticks(unit, interval, start, end)
        .iter()
        .map(date_to_num)
        .filter(|v| (vmin..=vmax).contains(v))
        .collect();
    let labels = values
        .iter()
        .map(|v| format_date(*v, unit.label_format()))
        .collect();

    ColorbarTicks { values, labels }
}

/// Apply a one-value printf format; `%d`-style conversions truncate toward zero.
fn printf_value(format: &str, value: f64) -> std::result::Result<String, sprintf::PrintfError> {
    sprintf::vsprintf(format, &[&value]).or_else(|_| sprintf::vsprintf(format, &[&(value as i64)]))
}

fn format_date(days: f64, format: &str) -> String {
    num_to_date(days)
        .map(|t| t.format(format).to_string())
        .unwrap_or_default()
}

fn date_ticks(
    unit: DateUnit,
    interval: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let midnight = |y: i32, m: u32, d: u32| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single();

    match unit {
        DateUnit::Year => (start.year()..=end.year())
            .filter(|y| (*y as i64).rem_euclid(interval) == 0)
            .filter_map(|y| midnight(y, 1, 1))
            .collect(),
        DateUnit::Month => {
            let first = start.year() as i64 * 12 + start.month0() as i64;
            let last = end.year() as i64 * 12 + end.month0() as i64;
            (first..=last)
                .filter(|m| m.rem_euclid(12) % interval == 0)
                .filter_map(|m| midnight(m.div_euclid(12) as i32, m.rem_euclid(12) as u32 + 1, 1))
                .collect()
        }
        DateUnit::Day => {
            let mut ticks = Vec::new();
            let mut day = start.date_naive();
            while day <= end.date_naive() {
                if (day.day() as i64 - 1) % interval == 0 {
                    if let Some(t) = midnight(day.year(), day.month(), day.day()) {
                        ticks.push(t);
                    }
                }
                match day.succ_opt() {
                    Some(next) => day = next,
                    None => break,
                }
            }
            ticks
        }
        DateUnit::Hour | DateUnit::Minute | DateUnit::Second => {
            let unit_seconds = match unit {
                DateUnit::Hour => 3600,
                DateUnit::Minute => 60,
                _ => 1,
            };
            let step = unit_seconds * interval;
            let first = start.timestamp().div_euclid(step) * step;
            let last = end.timestamp();
            (0..)
                .map(|k| first + k * step)
                .take_while(|s| *s <= last)
                .filter_map(|s| Utc.timestamp_opt(s, 0).single())
                .collect()
        }
    }
}

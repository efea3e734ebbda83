//! Test data generation utilities.
//!
//! This module writes small Natural Earth style GeoJSON feature files and
//! builds point sets with known layouts for testing the renderers.

#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use seismap::{ColorSpec, ColorValue, MarkerSize, PointSet};
use std::fs;
use std::io;
use std::path::Path;

/// A square continent covering 0..40°E, 0..40°N
pub const LAND_GEOJSON: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature", "properties": {"featurecla": "Land"},
         "geometry": {"type": "Polygon",
            "coordinates": [[[0, 0], [40, 0], [40, 40], [0, 40], [0, 0]]]}},
        {"type": "Feature", "properties": {"featurecla": "Land"},
         "geometry": {"type": "Polygon",
            "coordinates": [[[170, -20], [-170, -20], [-170, -10], [170, -10], [170, -20]]]}}
    ]
}"#;

/// The coastline of the square continent
pub const COASTLINE_GEOJSON: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature", "properties": {},
         "geometry": {"type": "LineString",
            "coordinates": [[0, 0], [40, 0], [40, 40], [0, 40], [0, 0]]}}
    ]
}"#;

/// One border splitting the continent along 20°E
pub const BORDERS_GEOJSON: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature", "properties": {},
         "geometry": {"type": "MultiLineString",
            "coordinates": [[[20, 0], [20, 40]]]}}
    ]
}"#;

/// Write a full feature set for one Natural Earth scale into `dir`.
pub fn write_features(dir: &Path, scale: &str) -> io::Result<()> {
    fs::write(dir.join(format!("ne_{}_land.geojson", scale)), LAND_GEOJSON)?;
    fs::write(dir.join(format!("ne_{}_coastline.geojson", scale)), COASTLINE_GEOJSON)?;
    fs::write(
        dir.join(format!("ne_{}_admin_0_boundary_lines_land.json", scale)),
        BORDERS_GEOJSON,
    )?;
    Ok(())
}

/// Points on a small grid, coloured by depth
pub fn depth_points(center_lon: f64, center_lat: f64) -> PointSet {
    let mut lons = Vec::new();
    let mut lats = Vec::new();
    let mut depths = Vec::new();
    for i in 0..3 {
        for j in 0..3 {
            lons.push(center_lon + i as f64 - 1.0);
            lats.push(center_lat + j as f64 - 1.0);
            depths.push(ColorValue::Numeric(10.0 * (i * 3 + j) as f64));
        }
    }
    PointSet::new(lons, lats, MarkerSize::Uniform(60.0), ColorSpec::Values(depths))
        .expect("valid depth points")
}

/// Points coloured by origin time, one hour apart
pub fn timed_points() -> PointSet {
    let t0 = Utc.with_ymd_and_hms(2011, 3, 11, 5, 46, 24).unwrap();
    let times: Vec<ColorValue> = (0..5).map(|i| (t0 + Duration::hours(i)).into()).collect();
    PointSet::new(
        vec![142.4, 142.8, 143.1, 141.9, 142.2],
        vec![38.3, 37.9, 38.8, 36.5, 39.0],
        MarkerSize::PerPoint(vec![100.0, 40.0, 30.0, 20.0, 50.0]),
        ColorSpec::Values(times),
    )
    .expect("valid timed points")
}

/// Labelled stations with a single colour
pub fn stations() -> PointSet {
    PointSet::new(
        vec![11.27, 10.88, 12.02],
        vec![48.16, 47.73, 48.86],
        MarkerSize::Uniform(80.0),
        ColorSpec::Uniform("b".to_string()),
    )
    .and_then(|set| set.with_labels(vec!["FUR".into(), "WET".into(), "RJOB".into()]))
    .expect("valid stations")
}

/// Write a points JSON file in the CLI's format
pub fn write_points_file(path: &Path) -> io::Result<()> {
    fs::write(
        path,
        r#"{"points": [
            {"lon": 142.4, "lat": 38.3, "size": 100, "color": 24.0, "label": "main"},
            {"lon": 141.9, "lat": 36.5, "color": 10.0, "label": "aftershock"}
        ]}"#,
    )
}

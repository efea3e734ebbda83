//! Map extent and centre of a local (zoomed-in) map.
//!
//! The local map is centred on the midpoint of the point cloud's extremes and
//! sized to hold every point with a margin, then stretched to the figure's
//! aspect ratio. Clusters straddling the antimeridian are measured in a
//! `[0, 360)` longitude frame.

use std::f64::consts::PI;

use crate::error::{Result, SeismapError};

/// Mean Earth radius used for degree/metre conversion
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Longitude beyond which a cluster is tested for antimeridian straddling
pub const WRAP_THRESHOLD_DEG: f64 = 150.0;

/// Fraction of `width + height` added to both dimensions
pub const EXTENT_MARGIN: f64 = 0.2;

/// Footprint of a single-point map, in degrees
pub const FALLBACK_HEIGHT_DEG: f64 = 2.0;
pub const FALLBACK_WIDTH_DEG: f64 = 5.0;

/// Units of a [`LocalExtent`]'s width and height
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtentUnits {
    /// Angular degrees (GIS-style renderer)
    Degrees,
    /// Metres on a spherical Earth (projected renderer)
    Meters,
}

/// Centre and size of a local map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalExtent {
    pub center_lon: f64,
    pub center_lat: f64,
    pub width: f64,
    pub height: f64,
    pub units: ExtentUnits,
    /// The points straddle the antimeridian
    pub wraps: bool,
}

impl LocalExtent {
    /// Size of one degree of latitude in this extent's units
    pub fn lat_scale(&self) -> f64 {
        match self.units {
            ExtentUnits::Degrees => 1.0,
            ExtentUnits::Meters => meters_per_degree_lat(),
        }
    }

    /// Size of one degree of longitude at the centre latitude
    pub fn lon_scale(&self) -> f64 {
        match self.units {
            ExtentUnits::Degrees => 1.0,
            ExtentUnits::Meters => meters_per_degree_lon(self.center_lat),
        }
    }

    /// Latitude span of the map, in degrees
    pub fn lat_range(&self) -> (f64, f64) {
        let half = self.height / 2.0 / self.lat_scale();
        (self.center_lat - half, self.center_lat + half)
    }

    /// Longitude span of the map, in degrees.
    ///
    /// For wrapping clusters the span is expressed around the centre taken
    /// modulo 360, so it may exceed 180.
    pub fn lon_range(&self) -> (f64, f64) {
        let center = if self.wraps {
            self.center_lon.rem_euclid(360.0)
        } else {
            self.center_lon
        };
        let half = self.width / 2.0 / self.lon_scale();
        (center - half, center + half)
    }
}

/// Metres per degree of latitude on the spherical Earth
pub fn meters_per_degree_lat() -> f64 {
    2.0 * PI * EARTH_RADIUS_KM * 1000.0 / 360.0
}

/// Metres per degree of longitude at a latitude
pub fn meters_per_degree_lon(lat: f64) -> f64 {
    meters_per_degree_lat() * lat.to_radians().cos()
}

/// True when a longitude set straddles the antimeridian
pub fn straddles_antimeridian(lons: &[f64]) -> bool {
    let (min, max) = min_max(lons);
    min < -WRAP_THRESHOLD_DEG && max > WRAP_THRESHOLD_DEG
}

/// Normalize a longitude value to the range [-180, 180)
pub fn normalize_longitude(lon: f64) -> f64 {
    let normalized = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if normalized >= 180.0 {
        -180.0
    } else {
        normalized
    }
}

/// Compute the centre and size of a local map.
///
/// `aspect` is the width/height ratio of the map area; the extent is widened
/// or heightened, never shrunk, to match it.
pub fn local_extent(
    lons: &[f64],
    lats: &[f64],
    aspect: f64,
    units: ExtentUnits,
) -> Result<LocalExtent> {
    if lons.is_empty() || lons.len() != lats.len() {
        return Err(SeismapError::invalid(
            "lons",
            format!("{} longitudes for {} latitudes", lons.len(), lats.len()),
        ));
    }
    if !(aspect.is_finite() && aspect > 0.0) {
        return Err(SeismapError::invalid(
            "aspect",
            format!("Aspect ratio must be positive: {}", aspect),
        ));
    }

    let wraps = straddles_antimeridian(lons);
    let (min_lon, max_lon) = if wraps {
        let shifted: Vec<f64> = lons.iter().map(|lon| lon.rem_euclid(360.0)).collect();
        min_max(&shifted)
    } else {
        min_max(lons)
    };
    let (min_lat, max_lat) = min_max(lats);

    let center_lat = max_lat / 2.0 + min_lat / 2.0;
    let mut center_lon = max_lon / 2.0 + min_lon / 2.0;
    if center_lon > 180.0 {
        center_lon -= 360.0;
    }

    let (lat_scale, lon_scale) = match units {
        ExtentUnits::Degrees => (1.0, 1.0),
        ExtentUnits::Meters => (meters_per_degree_lat(), meters_per_degree_lon(center_lat)),
    };

    let mut height = (max_lat - min_lat) * lat_scale;
    let mut width = (max_lon - min_lon) * lon_scale;
    if lons.len() > 1 && width + height > 0.0 {
        let margin = EXTENT_MARGIN * (width + height);
        height += margin;
        width += margin;
    } else {
        height = FALLBACK_HEIGHT_DEG * lat_scale;
        width = FALLBACK_WIDTH_DEG * lon_scale;
    }

    if width / height < aspect {
        width = height * aspect;
    } else {
        height = width / aspect;
    }

    Ok(LocalExtent {
        center_lon,
        center_lat,
        width,
        height,
        units,
        wraps,
    })
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASPECT: f64 = 8.0 / 6.0;

    #[test]
    fn test_center_without_wraparound() {
        let lons = [10.0, 14.0, 30.0];
        let lats = [40.0, 45.0, 42.0];
        let extent = local_extent(&lons, &lats, ASPECT, ExtentUnits::Degrees).unwrap();

        assert_eq!(extent.center_lon, (30.0 + 10.0) / 2.0);
        assert_eq!(extent.center_lat, 42.5);
        assert!(!extent.wraps);
    }

    #[test]
    fn test_center_one_sided_extremes_do_not_wrap() {
        // Only one side beyond the threshold
        let lons = [-170.0, 100.0];
        let lats = [0.0, 1.0];
        let extent = local_extent(&lons, &lats, ASPECT, ExtentUnits::Degrees).unwrap();
        assert_eq!(extent.center_lon, (100.0 + -170.0) / 2.0);
    }

    #[test]
    fn test_center_across_antimeridian() {
        let lons = [-179.0, 179.0];
        let lats = [-10.0, -12.0];
        let extent = local_extent(&lons, &lats, ASPECT, ExtentUnits::Degrees).unwrap();

        assert!(extent.wraps);
        assert!((extent.center_lon.abs() - 180.0).abs() < 1e-9);
        // 2° of longitude apart, not 358°
        assert!(extent.width < 20.0);
    }

    #[test]
    fn test_wrapped_center_comes_back_into_range() {
        let lons = [-170.0, 175.0];
        let lats = [0.0, 0.0];
        let extent = local_extent(&lons, &lats, ASPECT, ExtentUnits::Degrees).unwrap();
        // midpoint of 175 and 190 is 182.5 -> -177.5
        assert!((extent.center_lon - (-177.5)).abs() < 1e-9);
        assert!(extent.lon_range().0 < 182.5);
    }

    #[test]
    fn test_single_point_fallback_degrees() {
        let extent = local_extent(&[5.0], &[50.0], 1.0, ExtentUnits::Degrees).unwrap();
        // 5 x 2 already wider than tall for aspect 1 -> height grows to 5
        assert_eq!(extent.width, 5.0);
        assert_eq!(extent.height, 5.0);

        let extent = local_extent(&[5.0], &[50.0], 2.5, ExtentUnits::Degrees).unwrap();
        assert_eq!(extent.height, 2.0);
        assert_eq!(extent.width, 5.0);
    }

    #[test]
    fn test_single_point_fallback_meters() {
        let extent = local_extent(&[0.0], &[0.0], 2.5, ExtentUnits::Meters).unwrap();
        assert!((extent.height - 2.0 * meters_per_degree_lat()).abs() < 1e-6);
        assert!((extent.width - 5.0 * meters_per_degree_lat()).abs() < 1e-6);
    }

    #[test]
    fn test_coincident_points_use_fallback() {
        let extent = local_extent(&[5.0, 5.0], &[50.0, 50.0], 2.5, ExtentUnits::Degrees).unwrap();
        assert_eq!(extent.height, 2.0);
        assert_eq!(extent.width, 5.0);
    }

    #[test]
    fn test_aspect_matching() {
        // Tall cluster: width is expanded
        let extent = local_extent(&[0.0, 1.0], &[0.0, 10.0], ASPECT, ExtentUnits::Degrees).unwrap();
        assert!((extent.width / extent.height - ASPECT).abs() < 1e-12);
        assert!((extent.height - 10.0 * 1.0 - 0.2 * 11.0).abs() < 1e-9);

        // Wide cluster: height is expanded
        let extent = local_extent(&[0.0, 20.0], &[0.0, 1.0], ASPECT, ExtentUnits::Degrees).unwrap();
        assert!((extent.width / extent.height - ASPECT).abs() < 1e-12);
        assert!((extent.width - 20.0 - 0.2 * 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_meter_conversion() {
        assert!((meters_per_degree_lat() - 111_194.93).abs() < 0.01);
        assert!((meters_per_degree_lon(60.0) - meters_per_degree_lat() / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_ranges_in_degrees() {
        let extent = local_extent(&[0.0, 10.0], &[0.0, 10.0], 1.0, ExtentUnits::Meters).unwrap();
        let (lat0, lat1) = extent.lat_range();
        assert!(lat0 < 0.0 && lat1 > 10.0);
        let (lon0, lon1) = extent.lon_range();
        assert!(lon0 < 0.0 && lon1 > 10.0);
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(0.0), 0.0);
        assert_eq!(normalize_longitude(180.0), -180.0);
        assert_eq!(normalize_longitude(-180.0), -180.0);
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(370.0), 10.0);
        assert_eq!(normalize_longitude(-370.0), -10.0);
    }

    #[test]
    fn test_invalid_input() {
        assert!(local_extent(&[], &[], 1.0, ExtentUnits::Degrees).is_err());
        assert!(local_extent(&[1.0], &[1.0, 2.0], 1.0, ExtentUnits::Degrees).is_err());
        assert!(local_extent(&[1.0], &[1.0], 0.0, ExtentUnits::Degrees).is_err());
    }
}

//! Natural Earth map features: land polygons, coastlines, country borders.
//!
//! Features are read from GeoJSON files in a data directory, named the way
//! Natural Earth distributes them (`ne_110m_land.geojson`, ...).

use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;
use crate::geo::extent::meters_per_degree_lat;

/// A closed ring of lon/lat vertices
pub type Ring = Vec<(f64, f64)>;

/// An open line of lon/lat vertices
pub type Line = Vec<(f64, f64)>;

/// Feature geometry used to draw the base map
#[derive(Debug, Clone, Default)]
pub struct MapFeatures {
    /// Exterior rings of land polygons
    pub land: Vec<Ring>,
    /// Interior rings of land polygons, filled with the water colour
    pub lakes: Vec<Ring>,
    pub coastlines: Vec<Line>,
    pub borders: Vec<Line>,
}

impl MapFeatures {
    pub fn is_empty(&self) -> bool {
        self.land.is_empty()
            && self.lakes.is_empty()
            && self.coastlines.is_empty()
            && self.borders.is_empty()
    }

    /// Load every feature file present for a Natural Earth scale (`110m`, `50m`, `10m`).
    ///
    /// Missing files are skipped; malformed files are an error.
    pub fn load(data_dir: &Path, scale: &str) -> Result<Self> {
        let mut features = MapFeatures::default();

        if let Some(path) = find_feature_file(data_dir, scale, "land") {
            let geojson = read_geojson(&path)?;
            process_geojson(&geojson, &mut |geometry| {
                collect_rings(geometry, &mut features.land, &mut features.lakes)
            });
        }

        if let Some(path) = find_feature_file(data_dir, scale, "coastline") {
            let geojson = read_geojson(&path)?;
            process_geojson(&geojson, &mut |geometry| {
                collect_lines(geometry, &mut features.coastlines)
            });
        }

        if let Some(path) = find_feature_file(data_dir, scale, "admin_0_boundary_lines_land") {
            let geojson = read_geojson(&path)?;
            process_geojson(&geojson, &mut |geometry| {
                collect_lines(geometry, &mut features.borders)
            });
        }

        debug!(
            data_dir = %data_dir.display(),
            scale = scale,
            land = features.land.len(),
            lakes = features.lakes.len(),
            coastlines = features.coastlines.len(),
            borders = features.borders.len(),
            "Loaded map features"
        );

        Ok(features)
    }

    /// Load features when a data directory is configured, otherwise none.
    pub fn load_optional(data_dir: Option<&Path>, scale: &str) -> Result<Self> {
        match data_dir {
            Some(dir) => Self::load(dir, scale),
            None => {
                debug!("No feature directory configured, drawing without coastlines");
                Ok(MapFeatures::default())
            }
        }
    }

    /// Drop land polygons and lakes smaller than `min_area_km2`.
    pub fn retain_land_larger_than(&mut self, min_area_km2: f64) {
        let before = self.land.len() + self.lakes.len();
        self.land.retain(|ring| ring_area_km2(ring) >= min_area_km2);
        self.lakes.retain(|ring| ring_area_km2(ring) >= min_area_km2);
        debug!(
            threshold_km2 = min_area_km2,
            dropped = before - self.land.len() - self.lakes.len(),
            "Filtered small land polygons"
        );
    }
}

fn find_feature_file(data_dir: &Path, scale: &str, name: &str) -> Option<PathBuf> {
    let candidates = ["geojson", "json"]
        .iter()
        .map(|ext| data_dir.join(format!("ne_{}_{}.{}", scale, name, ext)));

    for path in candidates {
        if path.exists() {
            return Some(path);
        }
    }

    warn!(
        data_dir = %data_dir.display(),
        scale = scale,
        feature = name,
        "Feature file not found, skipping"
    );
    None
}

fn read_geojson(path: &Path) -> Result<GeoJson> {
    let content = fs::read_to_string(path)?;
    Ok(content.parse::<GeoJson>()?)
}

fn process_geojson<F>(geojson: &GeoJson, on_geometry: &mut F)
where
    F: FnMut(&Geometry),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    on_geometry(geometry);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                on_geometry(geometry);
            }
        }
        GeoJson::Geometry(geometry) => on_geometry(geometry),
    }
}

fn to_line(coords: &[Vec<f64>]) -> Line {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect()
}

fn collect_rings(geometry: &Geometry, land: &mut Vec<Ring>, lakes: &mut Vec<Ring>) {
    match &geometry.value {
        Value::Polygon(rings) => push_polygon(rings, land, lakes),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                push_polygon(rings, land, lakes);
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_rings(g, land, lakes);
            }
        }
        _ => {}
    }
}

/// First ring is the exterior, the rest are holes
fn push_polygon(rings: &[Vec<Vec<f64>>], land: &mut Vec<Ring>, lakes: &mut Vec<Ring>) {
    if let Some((exterior, holes)) = rings.split_first() {
        land.push(to_line(exterior));
        lakes.extend(holes.iter().map(|hole| to_line(hole)));
    }
}

fn collect_lines(geometry: &Geometry, out: &mut Vec<Line>) {
    match &geometry.value {
        Value::LineString(coords) => out.push(to_line(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                out.push(to_line(coords));
            }
        }
        Value::Polygon(rings) => {
            for ring in rings {
                out.push(to_line(ring));
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                for ring in rings {
                    out.push(to_line(ring));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_lines(g, out);
            }
        }
        _ => {}
    }
}

/// Approximate area of a lon/lat ring in km² (shoelace on a cosine-scaled plane)
pub fn ring_area_km2(ring: &[(f64, f64)]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mean_lat = ring.iter().map(|(_, lat)| lat).sum::<f64>() / ring.len() as f64;
    let km_per_deg = meters_per_degree_lat() / 1000.0;
    let lon_scale = km_per_deg * mean_lat.to_radians().cos();

    let twice_area: f64 = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|((x0, y0), (x1, y1))| (x0 * y1 - x1 * y0) * lon_scale * km_per_deg)
        .sum();
    twice_area.abs() / 2.0
}

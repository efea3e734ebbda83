//! Spherical map projections and the projection choices a plot accepts.
//!
//! [`ProjectionSpec`] is what a caller asks for (`cyl`, `ortho`, `local`, or
//! a named projection type with parameters); [`Projection`] is a concrete,
//! fully parameterised projection that maps lon/lat to plane coordinates.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_4, PI};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SeismapError};
use crate::geo::extent::normalize_longitude;

/// Sphere radius of the projected renderer, in metres
pub const BASEMAP_RADIUS_M: f64 = 6_370_997.0;

/// Sphere radius of the GIS renderer (WGS84 semi-major axis), in metres
pub const CARTOPY_RADIUS_M: f64 = 6_378_137.0;

/// Mercator latitude limits, in degrees
const MERCATOR_MIN_LAT: f64 = -80.0;
const MERCATOR_MAX_LAT: f64 = 84.0;

/// A projection parameter that is either given or derived from the data
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjParam {
    Fixed(f64),
    /// Substitute the mean longitude or latitude of the plotted points
    DeriveFromCentroid,
}

impl ProjParam {
    /// Resolve against the point-set mean for this parameter's axis.
    pub fn resolve(&self, centroid: f64) -> f64 {
        match self {
            ProjParam::Fixed(value) => *value,
            ProjParam::DeriveFromCentroid => centroid,
        }
    }
}

impl FromStr for ProjParam {
    type Err = SeismapError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(ProjParam::DeriveFromCentroid);
        }
        s.parse::<f64>()
            .map(ProjParam::Fixed)
            .map_err(|_| {
                SeismapError::invalid(
                    "proj_kwargs",
                    format!("Expected a number or 'auto', got '{}'", s),
                )
            })
    }
}

/// JSON form: a number, or the string `"auto"`
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ProjParamRepr {
    Number(f64),
    Text(String),
}

impl Serialize for ProjParam {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ProjParam::Fixed(v) => ProjParamRepr::Number(*v),
            ProjParam::DeriveFromCentroid => ProjParamRepr::Text("auto".to_string()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ProjParam {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        match ProjParamRepr::deserialize(deserializer)? {
            ProjParamRepr::Number(v) => Ok(ProjParam::Fixed(v)),
            ProjParamRepr::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Named projection parameters for the GIS renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjParams {
    #[serde(default)]
    pub central_longitude: Option<ProjParam>,
    #[serde(default)]
    pub central_latitude: Option<ProjParam>,
    #[serde(default)]
    pub pole_longitude: Option<ProjParam>,
    #[serde(default)]
    pub pole_latitude: Option<ProjParam>,
}

impl ProjParams {
    pub fn is_empty(&self) -> bool {
        *self == ProjParams::default()
    }
}

/// Projection types that can be requested by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionKind {
    PlateCarree,
    Mercator,
    Orthographic,
    Stereographic,
    AzimuthalEquidistant,
    RotatedPole,
}

impl ProjectionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProjectionKind::PlateCarree => "PlateCarree",
            ProjectionKind::Mercator => "Mercator",
            ProjectionKind::Orthographic => "Orthographic",
            ProjectionKind::Stereographic => "Stereographic",
            ProjectionKind::AzimuthalEquidistant => "AzimuthalEquidistant",
            ProjectionKind::RotatedPole => "RotatedPole",
        }
    }

    /// Build the projection, resolving centroid-derived parameters against
    /// the mean longitude and latitude of the points.
    pub fn build(
        &self,
        params: &ProjParams,
        mean_lon: f64,
        mean_lat: f64,
        radius: f64,
    ) -> Projection {
        let lon = |p: Option<ProjParam>| p.map(|p| p.resolve(mean_lon)).unwrap_or(0.0);
        let lat = |p: Option<ProjParam>, default: f64| {
            p.map(|p| p.resolve(mean_lat)).unwrap_or(default)
        };

        match self {
            ProjectionKind::PlateCarree => Projection::PlateCarree {
                central_longitude: lon(params.central_longitude),
            },
            ProjectionKind::Mercator => Projection::Mercator {
                central_longitude: lon(params.central_longitude),
                radius,
            },
            ProjectionKind::Orthographic => Projection::Orthographic {
                central_longitude: lon(params.central_longitude),
                central_latitude: lat(params.central_latitude, 0.0),
                radius,
            },
            ProjectionKind::Stereographic => Projection::Stereographic {
                central_longitude: lon(params.central_longitude),
                central_latitude: lat(params.central_latitude, 0.0),
                radius,
            },
            ProjectionKind::AzimuthalEquidistant => Projection::AzimuthalEquidistant {
                central_longitude: lon(params.central_longitude),
                central_latitude: lat(params.central_latitude, 0.0),
                radius,
            },
            ProjectionKind::RotatedPole => Projection::RotatedPole {
                pole_longitude: lon(params.pole_longitude),
                pole_latitude: lat(params.pole_latitude, 90.0),
            },
        }
    }
}

impl FromStr for ProjectionKind {
    type Err = SeismapError;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "platecarree" => Ok(ProjectionKind::PlateCarree),
            "mercator" => Ok(ProjectionKind::Mercator),
            "orthographic" => Ok(ProjectionKind::Orthographic),
            "stereographic" => Ok(ProjectionKind::Stereographic),
            "azimuthalequidistant" | "aeqd" => Ok(ProjectionKind::AzimuthalEquidistant),
            "rotatedpole" => Ok(ProjectionKind::RotatedPole),
            _ => Err(SeismapError::UnsupportedProjection {
                name: s.to_string(),
            }),
        }
    }
}

/// The projection a plot asks for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionSpec {
    /// Whole globe, equirectangular
    Cyl,
    /// Orthographic, centred on the mean point position
    Ortho,
    /// Azimuthal view zoomed onto the points
    Local,
    /// Any named projection type, parameterised by `proj_kwargs`
    Custom(ProjectionKind),
}

impl ProjectionSpec {
    pub fn is_local(&self) -> bool {
        matches!(self, ProjectionSpec::Local)
    }
}

impl fmt::Display for ProjectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionSpec::Cyl => write!(f, "cyl"),
            ProjectionSpec::Ortho => write!(f, "ortho"),
            ProjectionSpec::Local => write!(f, "local"),
            ProjectionSpec::Custom(kind) => write!(f, "{}", kind.name()),
        }
    }
}

impl FromStr for ProjectionSpec {
    type Err = SeismapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cyl" => Ok(ProjectionSpec::Cyl),
            "ortho" => Ok(ProjectionSpec::Ortho),
            "local" => Ok(ProjectionSpec::Local),
            other => other.parse().map(ProjectionSpec::Custom),
        }
    }
}

/// A concrete projection.
///
/// PlateCarree and RotatedPole produce degrees, all others metres on a
/// sphere of the given radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    PlateCarree {
        central_longitude: f64,
    },
    Mercator {
        central_longitude: f64,
        radius: f64,
    },
    Orthographic {
        central_longitude: f64,
        central_latitude: f64,
        radius: f64,
    },
    Stereographic {
        central_longitude: f64,
        central_latitude: f64,
        radius: f64,
    },
    AzimuthalEquidistant {
        central_longitude: f64,
        central_latitude: f64,
        radius: f64,
    },
    RotatedPole {
        pole_longitude: f64,
        pole_latitude: f64,
    },
}

/// Axis-aligned rectangle in projected coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Rectangle centred on the origin
    pub fn centered(width: f64, height: f64) -> Self {
        Self::new(-width / 2.0, width / 2.0, -height / 2.0, height / 2.0)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }

    /// Smallest rectangle holding all points; `None` for no points
    pub fn enclosing(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        points.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => Bounds::new(x, x, y, y),
                Some(b) => Bounds::new(
                    b.x_min.min(x),
                    b.x_max.max(x),
                    b.y_min.min(y),
                    b.y_max.max(y),
                ),
            })
        })
    }
}

impl Projection {
    pub fn name(&self) -> &'static str {
        match self {
            Projection::PlateCarree { .. } => "PlateCarree",
            Projection::Mercator { .. } => "Mercator",
            Projection::Orthographic { .. } => "Orthographic",
            Projection::Stereographic { .. } => "Stereographic",
            Projection::AzimuthalEquidistant { .. } => "AzimuthalEquidistant",
            Projection::RotatedPole { .. } => "RotatedPole",
        }
    }

    /// Project a geographic point.
    ///
    /// Returns `None` when the point is not visible in this projection
    /// (far hemisphere, antipode, beyond the Mercator latitude limits).
    pub fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        match *self {
            Projection::PlateCarree { central_longitude } => {
                Some((normalize_longitude(lon - central_longitude), lat))
            }
            Projection::Mercator {
                central_longitude,
                radius,
            } => {
                if !(MERCATOR_MIN_LAT..=MERCATOR_MAX_LAT).contains(&lat) {
                    return None;
                }
                let x = radius * normalize_longitude(lon - central_longitude).to_radians();
                let y = radius * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
                Some((x, y))
            }
            Projection::Orthographic {
                central_longitude,
                central_latitude,
                radius,
            } => {
                let a = Azimuthal::new(lon, lat, central_longitude, central_latitude);
                if a.cos_c < 0.0 {
                    return None;
                }
                Some((radius * a.x, radius * a.y))
            }
            Projection::Stereographic {
                central_longitude,
                central_latitude,
                radius,
            } => {
                let a = Azimuthal::new(lon, lat, central_longitude, central_latitude);
                if 1.0 + a.cos_c < 1e-10 {
                    return None;
                }
                let k = 2.0 / (1.0 + a.cos_c);
                Some((radius * k * a.x, radius * k * a.y))
            }
            Projection::AzimuthalEquidistant {
                central_longitude,
                central_latitude,
                radius,
            } => {
                let a = Azimuthal::new(lon, lat, central_longitude, central_latitude);
                // The antipode maps to the whole limb
                if a.cos_c < -1.0 + 1e-12 {
                    return None;
                }
                let c = a.cos_c.clamp(-1.0, 1.0).acos();
                let k = if c < 1e-12 { 1.0 } else { c / c.sin() };
                Some((radius * k * a.x, radius * k * a.y))
            }
            Projection::RotatedPole {
                pole_longitude,
                pole_latitude,
            } => Some(rotate_to_pole(lon, lat, pole_longitude, pole_latitude)),
        }
    }

    /// Extent of the whole-globe view in projected coordinates
    pub fn global_bounds(&self) -> Bounds {
        match *self {
            Projection::PlateCarree { .. } | Projection::RotatedPole { .. } => {
                Bounds::new(-180.0, 180.0, -90.0, 90.0)
            }
            Projection::Mercator { radius, .. } => {
                let y = |lat: f64| radius * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
                Bounds::new(-PI * radius, PI * radius, y(MERCATOR_MIN_LAT), y(MERCATOR_MAX_LAT))
            }
            Projection::Orthographic { radius, .. } => Bounds::centered(2.0 * radius, 2.0 * radius),
            // The hemisphere around the centre
            Projection::Stereographic { radius, .. } => {
                Bounds::centered(4.0 * radius, 4.0 * radius)
            }
            Projection::AzimuthalEquidistant { radius, .. } => {
                Bounds::centered(2.0 * PI * radius, 2.0 * PI * radius)
            }
        }
    }

    /// Radius of the circular limb for projections whose global view is a disc
    pub fn limb_radius(&self) -> Option<f64> {
        match *self {
            Projection::Orthographic { radius, .. } => Some(radius),
            Projection::Stereographic { radius, .. } => Some(2.0 * radius),
            Projection::AzimuthalEquidistant { radius, .. } => Some(PI * radius),
            _ => None,
        }
    }

    /// Largest plausible jump between two consecutive projected vertices of
    /// one line; longer segments cross a seam and are split.
    pub fn seam_jump(&self) -> f64 {
        let b = self.global_bounds();
        b.width().max(b.height()) / 2.0
    }
}

/// Shared terms of the azimuthal projections (unit sphere)
struct Azimuthal {
    x: f64,
    y: f64,
    cos_c: f64,
}

impl Azimuthal {
    fn new(lon: f64, lat: f64, lon0: f64, lat0: f64) -> Self {
        let (phi, phi0) = (lat.to_radians(), lat0.to_radians());
        let dlambda = (lon - lon0).to_radians();
        let cos_c = phi0.sin() * phi.sin() + phi0.cos() * phi.cos() * dlambda.cos();
        Self {
            x: phi.cos() * dlambda.sin(),
            y: phi0.cos() * phi.sin() - phi0.sin() * phi.cos() * dlambda.cos(),
            cos_c,
        }
    }
}

fn lonlat_to_vec3(lon: f64, lat: f64) -> [f64; 3] {
    let (lon, lat) = (lon.to_radians(), lat.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Geographic to rotated-pole coordinates, in degrees.
///
/// The rotated frame's north pole sits at `(pole_lon, pole_lat)` and its
/// origin at `(pole_lon + 180, 90 - pole_lat)`.
fn rotate_to_pole(lon: f64, lat: f64, pole_lon: f64, pole_lat: f64) -> (f64, f64) {
    let z_axis = lonlat_to_vec3(pole_lon, pole_lat);
    let x_axis = lonlat_to_vec3(pole_lon + 180.0, 90.0 - pole_lat);
    let y_axis = cross(z_axis, x_axis);

    let p = lonlat_to_vec3(lon, lat);
    let rlat = dot(p, z_axis).clamp(-1.0, 1.0).asin();
    let rlon = dot(p, y_axis).atan2(dot(p, x_axis));
    (rlon.to_degrees(), rlat.to_degrees())
}

/// Projected outline of a lon/lat box, sampled along its edges.
///
/// Used to turn a degree extent into a projected viewing rectangle.
pub fn project_lonlat_box(
    projection: &Projection,
    lon_range: (f64, f64),
    lat_range: (f64, f64),
    samples: usize,
) -> Option<Bounds> {
    let samples = samples.max(2);
    let (lon0, lon1) = lon_range;
    let (lat0, lat1) = (lat_range.0.max(-90.0), lat_range.1.min(90.0));
    let t = |i: usize| i as f64 / (samples - 1) as f64;

    let edges = (0..samples).flat_map(|i| {
        let lon = lon0 + (lon1 - lon0) * t(i);
        let lat = lat0 + (lat1 - lat0) * t(i);
        [(lon, lat0), (lon, lat1), (lon0, lat), (lon1, lat)]
    });
    Bounds::enclosing(edges.filter_map(|(lon, lat)| projection.project(lon, lat)))
}

/// Great-circle angle between two points, in degrees
pub fn angular_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    dot(lonlat_to_vec3(lon1, lat1), lonlat_to_vec3(lon2, lat2))
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_spec_parsing() {
        assert_eq!("cyl".parse::<ProjectionSpec>().unwrap(), ProjectionSpec::Cyl);
        assert_eq!("ortho".parse::<ProjectionSpec>().unwrap(), ProjectionSpec::Ortho);
        assert_eq!("local".parse::<ProjectionSpec>().unwrap(), ProjectionSpec::Local);
        assert_eq!(
            "Mercator".parse::<ProjectionSpec>().unwrap(),
            ProjectionSpec::Custom(ProjectionKind::Mercator)
        );
        assert_eq!(
            "rotated_pole".parse::<ProjectionSpec>().unwrap(),
            ProjectionSpec::Custom(ProjectionKind::RotatedPole)
        );

        let err = "hammer".parse::<ProjectionSpec>().unwrap_err();
        assert!(err.to_string().contains("'hammer'"));
    }

    #[test]
    fn test_proj_param_json() {
        let json = r#"{"central_longitude": "auto", "central_latitude": 12.5}"#;
        let params: ProjParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.central_longitude, Some(ProjParam::DeriveFromCentroid));
        assert_eq!(params.central_latitude, Some(ProjParam::Fixed(12.5)));
        assert_eq!(params.pole_latitude, None);

        assert!(serde_json::from_str::<ProjParams>(r#"{"central_longitude": "east"}"#).is_err());

        let text = serde_json::to_string(&params).unwrap();
        assert!(text.contains("\"auto\""));
    }

    #[test]
    fn test_auto_params_resolve_to_centroid() {
        let params = ProjParams {
            central_longitude: Some(ProjParam::DeriveFromCentroid),
            central_latitude: Some(ProjParam::DeriveFromCentroid),
            ..Default::default()
        };
        let projection = ProjectionKind::Orthographic.build(&params, 140.0, 35.0, 1.0);
        assert_eq!(
            projection,
            Projection::Orthographic {
                central_longitude: 140.0,
                central_latitude: 35.0,
                radius: 1.0
            }
        );

        let params = ProjParams {
            pole_longitude: Some(ProjParam::DeriveFromCentroid),
            pole_latitude: Some(ProjParam::Fixed(40.0)),
            ..Default::default()
        };
        let projection = ProjectionKind::RotatedPole.build(&params, -170.0, 0.0, 1.0);
        assert_eq!(
            projection,
            Projection::RotatedPole {
                pole_longitude: -170.0,
                pole_latitude: 40.0
            }
        );
    }

    #[test]
    fn test_plate_carree() {
        let p = Projection::PlateCarree {
            central_longitude: 0.0,
        };
        assert_eq!(p.project(10.0, 20.0), Some((10.0, 20.0)));

        let pacific = Projection::PlateCarree {
            central_longitude: 180.0,
        };
        assert_eq!(pacific.project(170.0, 0.0), Some((-10.0, 0.0)));
    }

    #[test]
    fn test_orthographic_hides_far_side() {
        let p = Projection::Orthographic {
            central_longitude: 0.0,
            central_latitude: 0.0,
            radius: 1.0,
        };
        let (x, y) = p.project(0.0, 0.0).unwrap();
        assert!(approx(x, 0.0, 1e-12) && approx(y, 0.0, 1e-12));
        let (x, _) = p.project(90.0, 0.0).unwrap();
        assert!(approx(x, 1.0, 1e-12));
        assert!(p.project(180.0, 0.0).is_none());
    }

    #[test]
    fn test_azimuthal_equidistant_preserves_distance() {
        let p = Projection::AzimuthalEquidistant {
            central_longitude: 10.0,
            central_latitude: 45.0,
            radius: 1.0,
        };
        let (x, y) = p.project(10.0, 55.0).unwrap();
        assert!(approx(x, 0.0, 1e-12));
        assert!(approx(y, 10f64.to_radians(), 1e-12));

        let (x, y) = p.project(40.0, 30.0).unwrap();
        let distance = (x * x + y * y).sqrt().to_degrees();
        assert!(approx(distance, angular_distance(10.0, 45.0, 40.0, 30.0), 1e-9));

        assert!(p.project(-170.0, -45.0).is_none());
    }

    #[test]
    fn test_stereographic_scale_at_center() {
        let p = Projection::Stereographic {
            central_longitude: 0.0,
            central_latitude: 90.0,
            radius: 1.0,
        };
        let (x, y) = p.project(0.0, 90.0).unwrap();
        assert!(approx(x, 0.0, 1e-12) && approx(y, 0.0, 1e-12));
        // Equator of a polar stereographic map lies at radius 2R tan(45°) = 2R
        let (x, y) = p.project(0.0, 0.0).unwrap();
        assert!(approx((x * x + y * y).sqrt(), 2.0, 1e-9));
    }

    #[test]
    fn test_mercator_limits() {
        let p = Projection::Mercator {
            central_longitude: 0.0,
            radius: 1.0,
        };
        let (_, y) = p.project(0.0, 0.0).unwrap();
        assert!(approx(y, 0.0, 1e-12));
        assert!(p.project(0.0, 89.0).is_none());
    }

    #[test]
    fn test_rotated_pole() {
        let p = Projection::RotatedPole {
            pole_longitude: -170.0,
            pole_latitude: 40.0,
        };
        // The rotated origin
        let (x, y) = p.project(10.0, 50.0).unwrap();
        assert!(approx(x, 0.0, 1e-9) && approx(y, 0.0, 1e-9));
        // The rotated pole
        let (_, y) = p.project(-170.0, 40.0).unwrap();
        assert!(approx(y, 90.0, 1e-9));

        // An unrotated pole leaves coordinates unchanged
        let identity = Projection::RotatedPole {
            pole_longitude: 180.0,
            pole_latitude: 90.0,
        };
        let (x, y) = identity.project(25.0, -30.0).unwrap();
        assert!(approx(x, 25.0, 1e-9) && approx(y, -30.0, 1e-9));
    }

    #[test]
    fn test_project_lonlat_box() {
        let p = Projection::PlateCarree {
            central_longitude: 0.0,
        };
        let b = project_lonlat_box(&p, (-10.0, 10.0), (20.0, 30.0), 5).unwrap();
        assert_eq!(b, Bounds::new(-10.0, 10.0, 20.0, 30.0));
    }
}

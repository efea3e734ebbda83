//! Integration tests for seismap
//!
//! These tests plot point sets end to end, from the public entry points to
//! encoded images.

mod common;

use common::{assertions, image_utils, test_data};
use image::ImageFormat;
use pretty_assertions::assert_eq;

use seismap::colorbar::colorbar_ticks;
use seismap::figure::Layer;
use seismap::geo::{linspace2, local_extent, ExtentUnits};
use seismap::points::{date_to_num, normalize_colors, should_show_colorbar};
use seismap::{
    load_points, plot_basemap, plot_cartopy, plot_map, ColorSpec, ColorValue, Config, FigureSize,
    MapStyle, MarkerSize, OutputFormat, PointSet, ProjParam, ProjParams, ProjectionKind,
    ProjectionSpec, Resolution, SeismapError,
};

const LAND: [u8; 4] = [204, 204, 204, 255];

fn small_style() -> MapStyle {
    MapStyle {
        figure_size: FigureSize {
            width_in: 4.0,
            height_in: 3.0,
            dpi: 100.0,
        },
        ..Default::default()
    }
}

fn scatter_count(figure: &seismap::Figure) -> usize {
    figure
        .map()
        .layers()
        .iter()
        .map(|layer| match layer {
            Layer::Scatter { markers, .. } => markers.len(),
            _ => 0,
        })
        .sum()
}

#[test]
fn test_center_longitude_without_wrap() {
    let lons = [-20.0, 35.0, 10.0];
    let lats = [0.0, 5.0, 10.0];
    let extent = local_extent(&lons, &lats, 4.0 / 3.0, ExtentUnits::Degrees).unwrap();
    assertions::assert_approx_eq(extent.center_lon, (35.0 + -20.0) / 2.0, None);
    assertions::assert_approx_eq(extent.center_lat, 5.0, None);
    assert!(!extent.wraps);
}

#[test]
fn test_center_longitude_across_antimeridian() {
    let extent =
        local_extent(&[-179.0, 179.0], &[10.0, 12.0], 4.0 / 3.0, ExtentUnits::Degrees).unwrap();
    assert!(extent.wraps);
    assertions::assert_approx_eq(extent.center_lon.abs(), 180.0, None);
}

#[test]
fn test_single_point_fallback_footprint() {
    let extent = local_extent(&[13.4], &[52.5], 2.5, ExtentUnits::Degrees).unwrap();
    // 2° high by 5° wide already matches an aspect of 2.5
    assertions::assert_approx_eq(extent.height, 2.0, None);
    assertions::assert_approx_eq(extent.width, 5.0, None);
}

#[test]
fn test_linspace2_nice_ticks() {
    let ticks = linspace2(0.0, 100.0, 8).unwrap();
    assertions::assert_strictly_increasing(&ticks);
    assertions::assert_evenly_spaced(&ticks, Some(1e-9));
    assert!(ticks.len() >= 6 && ticks.len() <= 10, "ticks {:?}", ticks);
    assert!(ticks[0] >= 0.0 && ticks[ticks.len() - 1] <= 100.0);

    assert!(matches!(
        linspace2(5.0, 5.0, 8),
        Err(SeismapError::InvalidParameter { .. })
    ));
}

#[test]
fn test_colorbar_visibility() {
    let values = ColorSpec::Values(vec![1.0.into(), 2.0.into(), 3.0.into()]);
    assert!(should_show_colorbar(None, 3, &values));
    assert!(!should_show_colorbar(None, 1, &values));
    assert!(!should_show_colorbar(Some(false), 3, &values));
    assert!(!should_show_colorbar(None, 3, &ColorSpec::Uniform("r".to_string())));
}

#[test]
fn test_unknown_method_names_the_value() {
    let err = plot_map("unknown", &test_data::stations(), &ProjectionSpec::Cyl, &small_style())
        .unwrap_err();
    assert!(err.to_string().contains("unknown"));
}

#[test]
fn test_timestamps_become_monotonic_numbers() {
    let points = test_data::timed_points();
    let values = match points.color() {
        ColorSpec::Values(values) => values.clone(),
        other => panic!("unexpected colour {:?}", other),
    };
    let axis = normalize_colors(&values).unwrap();
    assert!(axis.is_time);
    assertions::assert_strictly_increasing(&axis.values);
    // one hour apart
    assertions::assert_approx_eq(axis.values[1] - axis.values[0], 1.0 / 24.0, Some(1e-9));

    let mixed = vec![ColorValue::Numeric(1.0), values[0].clone()];
    assert!(matches!(
        normalize_colors(&mixed),
        Err(SeismapError::MixedColorValues { .. })
    ));
}

#[test]
fn test_basemap_cyl_draws_features() {
    let dir = tempfile::tempdir().unwrap();
    test_data::write_features(dir.path(), "110m").unwrap();

    let with_features = MapStyle {
        features_dir: Some(dir.path().to_path_buf()),
        resolution: "110m".parse().unwrap(),
        ..small_style()
    };
    let points = test_data::depth_points(100.0, -30.0);
    let figure = plot_basemap(&points, &ProjectionSpec::Cyl, &with_features).unwrap();
    let canvas = figure.canvas().expect("show rasterises the figure");
    let rendered = image::DynamicImage::ImageRgba8(canvas.clone());
    image_utils::assert_image_dimensions(&rendered, 400, 300).unwrap();
    assert!(image_utils::count_pixels(canvas, LAND, 1) > 200);
    assert!(figure.has_colorbar());

    let without = plot_basemap(&points, &ProjectionSpec::Cyl, &small_style()).unwrap();
    let canvas = without.canvas().unwrap();
    assert_eq!(image_utils::count_pixels(canvas, LAND, 1), 0);
}

#[test]
fn test_cartopy_local_with_time_colorbar() {
    let figure =
        plot_cartopy(&test_data::timed_points(), &ProjectionSpec::Local, &small_style()).unwrap();
    assert_eq!(figure.map().projection().name(), "AzimuthalEquidistant");
    assert_eq!(scatter_count(&figure), 5);

    let colorbar = figure.colorbar().expect("time colours get a colorbar");
    assert!(!colorbar.ticks.labels.is_empty());
    // four hours of data: time-of-day labels
    let labels = &colorbar.ticks.labels;
    assert!(labels.iter().all(|l| l.len() == 8 && l.contains(':')), "{:?}", labels);
}

#[test]
fn test_tick_format_switches_locator() {
    let style = MapStyle {
        colorbar_ticklabel_format: Some(seismap::colorbar::TickFormat::printf("%.1f km").unwrap()),
        show: false,
        ..small_style()
    };
    let figure =
        plot_cartopy(&test_data::depth_points(0.0, 0.0), &ProjectionSpec::Cyl, &style).unwrap();
    let ticks = &figure.colorbar().unwrap().ticks;
    assert!(ticks.values.len() <= 6);
    assert!(ticks.labels.iter().all(|l| l.ends_with(" km")));

    let expected = colorbar_ticks(0.0, 80.0, None, style.colorbar_ticklabel_format.as_ref());
    assert_eq!(ticks, &expected);
}

#[test]
fn test_both_renderers_accept_both_vocabularies() {
    let dir = tempfile::tempdir().unwrap();
    test_data::write_features(dir.path(), "50m").unwrap();

    for resolution in ["i", "50m"] {
        let style = MapStyle {
            resolution: resolution.parse().unwrap(),
            features_dir: Some(dir.path().to_path_buf()),
            show: false,
            ..small_style()
        };
        assert_eq!(style.resolution, Resolution::Intermediate);
        for method in ["basemap", "cartopy"] {
            let figure =
                plot_map(method, &test_data::stations(), &ProjectionSpec::Ortho, &style).unwrap();
            let filled = figure.map().layers().iter().any(|layer| {
                matches!(layer, Layer::Fill { polygons, .. } if !polygons.is_empty())
            });
            assert!(filled, "{} with resolution {}", method, resolution);
        }
    }
}

#[test]
fn test_cartopy_custom_projections() {
    let style = MapStyle {
        proj_params: ProjParams {
            pole_longitude: Some(ProjParam::Fixed(-170.0)),
            pole_latitude: Some(ProjParam::DeriveFromCentroid),
            ..Default::default()
        },
        show: false,
        ..small_style()
    };
    for kind in [
        ProjectionKind::RotatedPole,
        ProjectionKind::Mercator,
        ProjectionKind::Stereographic,
    ] {
        let figure =
            plot_cartopy(&test_data::stations(), &ProjectionSpec::Custom(kind), &style).unwrap();
        assert_eq!(figure.map().projection().name(), kind.name());
    }

    let err = plot_basemap(
        &test_data::stations(),
        &ProjectionSpec::Custom(ProjectionKind::Mercator),
        &style,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Projection 'Mercator' not supported.");
}

#[test]
fn test_labels_per_renderer() {
    let style = MapStyle {
        show: false,
        ..small_style()
    };
    for method in ["basemap", "cartopy"] {
        let figure =
            plot_map(method, &test_data::stations(), &ProjectionSpec::Local, &style).unwrap();
        let labelled: usize = figure
            .map()
            .layers()
            .iter()
            .map(|layer| match layer {
                Layer::Text { items } => items.len(),
                _ => 0,
            })
            .sum();
        assert_eq!(labelled, 3, "{}", method);
        assert!(!figure.has_colorbar());
    }
}

#[test]
fn test_points_off_the_globe_are_dropped() {
    let points = PointSet::new(
        vec![0.0, 180.0],
        vec![0.0, 0.0],
        MarkerSize::Uniform(30.0),
        ColorSpec::Uniform("k".to_string()),
    )
    .unwrap();
    let style = MapStyle {
        proj_params: ProjParams {
            central_longitude: Some(ProjParam::Fixed(0.0)),
            central_latitude: Some(ProjParam::Fixed(0.0)),
            ..Default::default()
        },
        show: false,
        ..small_style()
    };
    let projection = ProjectionSpec::Custom(ProjectionKind::Orthographic);
    let figure = plot_cartopy(&points, &projection, &style).unwrap();
    assert_eq!(scatter_count(&figure), 1);
}

#[test]
fn test_save_png_and_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let points = test_data::depth_points(-120.0, 36.0);
    let figure = plot_cartopy(&points, &ProjectionSpec::Local, &small_style()).unwrap();

    let png = dir.path().join("map.png");
    figure.save(&png).unwrap();
    let bytes = std::fs::read(&png).unwrap();
    image_utils::assert_image_format(&bytes, ImageFormat::Png).unwrap();
    let decoded = image_utils::load_image_from_bytes(&bytes).unwrap();
    image_utils::assert_image_dimensions(&decoded, 400, 300).unwrap();
    assert!(image_utils::count_ink_pixels(&decoded.to_rgba8()) > 0);

    let jpeg = figure.encode(OutputFormat::Jpeg).unwrap();
    image_utils::assert_image_format(&jpeg, ImageFormat::Jpeg).unwrap();

    assert!(figure.save(&dir.path().join("map.tiff")).is_err());
}

#[test]
fn test_cli_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let points_path = dir.path().join("events.json");
    test_data::write_points_file(&points_path).unwrap();
    let output = dir.path().join("events.png");

    let args = <seismap::config::Args as clap::Parser>::try_parse_from([
        "seismap",
        points_path.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-m",
        "basemap",
        "-p",
        "local",
        "-r",
        "10m",
    ])
    .unwrap();
    let (config, paths) = Config::from_args(args).unwrap();
    config.validate().unwrap();

    let points = load_points(&paths.points_file).unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points.labels().unwrap(), &["main".to_string(), "aftershock".to_string()]);

    let projection = config.projection().unwrap();
    let style = config.to_style().unwrap();
    let figure = plot_map(&config.render.method, &points, &projection, &style).unwrap();
    assert!(figure.has_colorbar());
    figure.save(&paths.output).unwrap();
    assert!(output.exists());
}

#[test]
fn test_date_numbers_are_days_since_epoch() {
    let t = chrono::DateTime::parse_from_rfc3339("1970-01-02T12:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    assertions::assert_approx_eq(date_to_num(&t), 1.5, None);
}

use approx::assert_abs_diff_eq;
use lane_finder::core::RgbImage;
use lane_finder::detect::{Marking, MarkingThresholds};
use lane_finder::{ConfigError, LaneFinderConfig, PerspectiveConfig, RunReport};
use lane_finder::{run, RunOptions, VecSink, VecSource};

#[test]
fn config_round_trips_through_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");

    let mut cfg = LaneFinderConfig::default();
    cfg.finder.windows.count = 12;
    cfg.finder.waypoints.stride_px = 4;
    // Exactly representable so the JSON round trip is lossless.
    cfg.finder.waypoints.px_per_m_lateral = 190.0;
    cfg.finder.waypoints.px_per_m_forward = 24.0;
    cfg.perspective = Some(PerspectiveConfig {
        source_points: [[560.0, 460.0], [720.0, 460.0], [1150.0, 700.0], [130.0, 700.0]],
        destination_points: [[300.0, 0.0], [980.0, 0.0], [980.0, 720.0], [300.0, 720.0]],
    });
    cfg.write_json(&path).expect("write");

    let back = LaneFinderConfig::load_json(&path).expect("load");
    assert_eq!(back, cfg);
    back.validate().expect("valid");
    let warp = back.build_warp().expect("warp");
    assert_eq!((warp.width, warp.height), (1280, 720));
}

#[test]
fn threshold_files_override_one_colour() {
    let dir = tempfile::tempdir().expect("tempdir");
    let yellow_path = dir.path().join("yellow.json");
    std::fs::write(
        &yellow_path,
        r#"{"hsv_min": [10, 60, 90], "hsv_max": [40, 255, 255]}"#,
    )
    .expect("write");

    let mut cfg = LaneFinderConfig::default();
    cfg.load_thresholds(Marking::Yellow, &yellow_path).expect("load");
    assert_eq!(cfg.finder.thresholds.yellow.hsv_min, [10, 60, 90]);
    assert_eq!(cfg.finder.thresholds.yellow.gradient, None);
    assert_eq!(cfg.finder.thresholds.white, MarkingThresholds::white());
}

#[test]
fn inverted_threshold_file_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("white.json");
    std::fs::write(&path, r#"{"hsv_min": [0, 0, 250], "hsv_max": [179, 40, 200]}"#)
        .expect("write");

    let mut cfg = LaneFinderConfig::default();
    let err = cfg
        .load_thresholds(Marking::White, &path)
        .expect_err("inverted range");
    assert!(matches!(err, ConfigError::InvalidInput(_)));
    assert_eq!(cfg.finder.thresholds.white, MarkingThresholds::white());
}

#[test]
fn missing_and_malformed_files_are_distinct_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = LaneFinderConfig::load_json(dir.path().join("nope.json")).expect_err("missing");
    assert!(matches!(missing, ConfigError::Io(_)));

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{ not json").expect("write");
    let err = LaneFinderConfig::load_json(&bad).expect_err("malformed");
    assert!(matches!(err, ConfigError::Json(_)));
}

#[test]
fn run_report_is_written_and_read_back() {
    let cfg = LaneFinderConfig {
        rectified_width: 320,
        rectified_height: 240,
        ..LaneFinderConfig::default()
    };
    let mut road = RgbImage::from_pixel(320, 240, [90, 92, 96]);
    road.fill_rect(74, 0, 86, 240, [245, 245, 245]);
    road.fill_rect(234, 0, 246, 240, [245, 245, 245]);

    let summary = run(
        &cfg.build_finder().expect("finder"),
        &cfg.build_warp().expect("warp"),
        &mut VecSource::new([road.clone(), RgbImage::from_pixel(320, 240, [90, 92, 96])]),
        &mut VecSink::default(),
        &RunOptions::default(),
    )
    .expect("run");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("report.json");
    let report = summary.into_report(Some("cfg.json".to_string()));
    report.write_json(&path).expect("write");

    let back = RunReport::load_json(&path).expect("load");
    assert_eq!(back.num_frames, 2);
    assert_eq!(back.frames.len(), 2);
    assert_eq!(back.config_path.as_deref(), Some("cfg.json"));
    assert_eq!(back.frames[0].waypoints.len(), report.frames[0].waypoints.len());
    for (a, b) in back.frames[0].waypoints.iter().zip(&report.frames[0].waypoints) {
        assert_abs_diff_eq!(a.lateral_m, b.lateral_m, epsilon = 1e-9);
        assert_abs_diff_eq!(a.forward_m, b.forward_m, epsilon = 1e-9);
    }
    assert!(back.frames[1].waypoints.is_empty());

    let raw = std::fs::read_to_string(&path).expect("read");
    assert!(raw.contains("\"no_detection\""));
    assert!(raw.contains("\"fitted\""));
}

use approx::assert_abs_diff_eq;
use finderquad::core::GrayImage;
use finderquad::geometry::{GeometryError, GridParams};
use finderquad::pattern::BinarizationMethod;
use finderquad::{DetectError, FinderDetector, FinderParams, QuadSource};
use nalgebra::Point2;

const MODULE: usize = 7;

/// Paint a 7x7-module finder pattern (dark ring, light ring, dark 3x3 core)
/// centered on pixel `(cx, cy)`.
fn draw_finder(img: &mut GrayImage, cx: usize, cy: usize) {
    let half = 7 * MODULE / 2;
    for y in cy - half..=cy + half {
        for x in cx - half..=cx + half {
            let ring = (x as i32 - cx as i32)
                .abs()
                .max((y as i32 - cy as i32).abs()) as usize;
            if (ring + MODULE / 2) / MODULE != 2 {
                img.set(x, y, 0);
            }
        }
    }
}

fn scene(centers: &[(usize, usize)]) -> GrayImage {
    scene_sized(400, 400, centers)
}

fn scene_sized(width: usize, height: usize, centers: &[(usize, usize)]) -> GrayImage {
    let mut img = GrayImage::filled(width, height, 255);
    for &(cx, cy) in centers {
        draw_finder(&mut img, cx, cy);
    }
    img
}

fn unexpanded() -> FinderParams {
    FinderParams {
        grid: GridParams {
            expansion_ratio: None,
            ..GridParams::default()
        },
        ..FinderParams::default()
    }
}

fn assert_near(p: Point2<f32>, x: f32, y: f32) {
    assert!(
        (p.x - x).abs() <= 1.0 && (p.y - y).abs() <= 1.0,
        "({}, {}) not near ({x}, {y})",
        p.x,
        p.y
    );
}

#[test]
fn three_patterns_reconstruct_the_fourth_corner() {
    let img = scene(&[(80, 80), (320, 80), (80, 320)]);
    let result = FinderDetector::new(unexpanded())
        .detect(&img.view())
        .expect("detection");

    assert_eq!(result.patterns.len(), 3);
    assert_eq!(result.source, QuadSource::Triple);
    assert!(result.quad.valid, "{:?}", result.quad.violations);
    assert!(result.quad.reconstructed);
    assert_near(result.quad.top_left(), 80.0, 80.0);
    assert_near(result.quad.top_right(), 320.0, 80.0);
    assert_near(result.quad.bottom_left(), 80.0, 320.0);
    assert_near(result.quad.bottom_right(), 320.0, 320.0);
    assert_abs_diff_eq!(result.quad.aspect_ratio, 1.0, epsilon = 0.01);
    assert_eq!(result.corner_patterns[2], None);

    let grid = result.grid.expect("grid sampled");
    assert_eq!((grid.width, grid.height), (21, 21));
    assert_eq!(grid.get(0, 0), Some(true));
    assert_eq!(grid.get(20, 0), Some(true));
    assert_eq!(grid.get(0, 20), Some(true));
    assert_eq!(grid.get(20, 20), Some(false));
    assert_eq!(grid.get(10, 10), Some(false));
}

#[test]
fn every_variant_is_reported() {
    let img = scene(&[(80, 80), (320, 80), (80, 320)]);
    let params = FinderParams::default();
    let scan = FinderDetector::new(params.clone()).detect_patterns(&img.view());

    assert_eq!(scan.reports.len(), params.binarize.methods.len());
    for exact in [BinarizationMethod::OtsuOriginal, BinarizationMethod::FixedMid] {
        let report = scan
            .reports
            .iter()
            .find(|r| r.method == exact)
            .expect("variant ran");
        assert!(report.accepted >= 3, "{exact}: {report:?}");
    }
    assert_eq!(scan.patterns.len(), 3);
    for c in scan.patterns.iter() {
        assert!(c.composite_score > 0.5);
        assert!(c.valid_directions() >= 3);
    }
    assert!(scan.patterns.separation >= 50.0);
}

#[test]
fn default_expansion_samples_a_full_grid() {
    let img = scene(&[(80, 80), (320, 80), (80, 320)]);
    let result = FinderDetector::default()
        .detect(&img.view())
        .expect("detection");
    let grid = result.grid.expect("grid sampled");
    assert_eq!(grid.bits.len(), 21 * 21);
    assert!(grid.corners[0].x < 80.0 && grid.corners[0].y < 80.0);
    assert!(grid.corners[2].x > 320.0 && grid.corners[2].y > 320.0);
}

#[test]
fn four_patterns_form_a_rectangle() {
    let img = scene(&[(80, 80), (320, 80), (80, 320), (320, 320)]);
    let result = FinderDetector::new(unexpanded())
        .detect(&img.view())
        .expect("detection");

    assert_eq!(result.patterns.len(), 4);
    assert_eq!(result.source, QuadSource::Rectangle);
    assert!(!result.quad.reconstructed);
    assert!(result.corner_patterns.iter().all(Option::is_some));
    assert_near(result.quad.bottom_right(), 320.0, 320.0);

    let grid = result.grid.expect("grid sampled");
    assert_eq!(grid.get(20, 20), Some(true));
}

#[test]
fn two_patterns_are_not_enough() {
    let img = scene(&[(80, 80), (320, 80)]);
    let err = FinderDetector::default()
        .detect(&img.view())
        .expect_err("two patterns");
    assert!(matches!(err, DetectError::InsufficientCandidates { found: 2 }));
}

#[test]
fn elongated_layout_is_degenerate() {
    let img = scene_sized(460, 300, &[(60, 100), (400, 100), (60, 200)]);
    let err = FinderDetector::default()
        .detect(&img.view())
        .expect_err("aspect 3.4");
    assert!(
        matches!(
            err,
            DetectError::DegenerateGeometry(GeometryError::AspectOutOfRange { .. })
        ),
        "{err}"
    );
}

#[test]
fn records_follow_the_interchange_shape() {
    let img = scene(&[(80, 80), (320, 80), (80, 320)]);
    let result = FinderDetector::new(unexpanded())
        .detect(&img.view())
        .expect("detection");

    let records = result.pattern_records();
    assert_eq!(records.len(), 3);
    let json = serde_json::to_value(&records[0]).expect("serializable");
    assert!(json["center"]["x"].is_i64());
    assert!(json["analysis"]["line_pattern_score"].is_f64());
    assert!(json["analysis"]["valid_directions"].as_u64() >= Some(3));

    let rect = serde_json::to_value(result.rectangle_record()).expect("serializable");
    assert_eq!(rect["bottom_right"]["x"], 320);
    assert_eq!(rect["bottom_right"]["y"], 320);
}

mod common;

use common::*;
use nalgebra::Point2;
use table_rectify::core::PixelLayout;
use table_rectify::{
    intersect_edges, order_corners, rectify_frames, CornerOrderParams, FailurePolicy, OrderedQuad,
    RectifyError, RectifyReport, TableRectifier, TableRectifyParams,
};

fn p(x: f64, y: f64) -> Point2<f64> {
    Point2::new(x, y)
}

#[test]
fn axis_aligned_table_corners_are_labelled() {
    let mut img = blank(640, 360, FLOOR);
    fill_rect(&mut img, 100, 50, 500, 250, FELT);

    let det = TableRectifier::default()
        .detect(&img.view())
        .expect("table detected");

    assert_eq!(
        det.polygon,
        Some([
            Point2::new(100, 50),
            Point2::new(500, 50),
            Point2::new(500, 250),
            Point2::new(100, 250)
        ])
    );
    assert_eq!(det.corners.top_left, p(100.0, 50.0));
    assert_eq!(det.corners.top_right, p(500.0, 50.0));
    assert_eq!(det.corners.bottom_right, p(500.0, 250.0));
    assert_eq!(det.corners.bottom_left, p(100.0, 250.0));
}

#[test]
fn rotated_table_is_rectified_to_configured_size() {
    let (img, truth) = rotated_table();

    let out = TableRectifier::default()
        .rectify(&img.view())
        .expect("rectified");

    assert_eq!((out.image.width, out.image.height), (1200, 600));
    assert_eq!(out.image.layout, PixelLayout::Rgb8);

    let refined = out.detection.refined.corners.to_array();
    for (r, t) in refined.iter().zip(truth.iter()) {
        assert_near(*r, *t, 2.0);
    }

    // deep inside the table everything is felt
    let view = out.image.view();
    assert_eq!(view.pixel(600, 300), FELT);
    assert_eq!(view.pixel(20, 20), FELT);
    assert_eq!(view.pixel(1180, 580), FELT);
}

#[test]
fn destination_size_follows_params() {
    let (img, _) = rotated_table();
    let mut params = TableRectifyParams::default();
    params.table.length = 357;
    params.table.width = 178;

    let out = TableRectifier::new(params)
        .rectify(&img.view())
        .expect("rectified");
    assert_eq!((out.image.width, out.image.height), (357, 178));
}

#[test]
fn pipeline_corners_match_ground_truth_across_rotations() {
    for deg in [-30.0, -15.0, 0.0, 20.0, 35.0] {
        let corners = rotated_rect(320.0, 240.0, 400.0, 200.0, deg);
        let mut img = blank(640, 480, FLOOR);
        fill_convex(&mut img, &corners, FELT);

        let det = TableRectifier::default()
            .detect(&img.view())
            .unwrap_or_else(|e| panic!("rotation {deg}: {e}"));
        let truth = order_corners(&corners, &CornerOrderParams::default()).expect("truth");

        for (r, t) in det
            .refined
            .corners
            .to_array()
            .iter()
            .zip(truth.to_array().iter())
        {
            assert_near(*r, *t, 2.0);
        }
    }
}

#[test]
fn homography_maps_refined_corners_onto_destination() {
    let (img, _) = rotated_table();
    let params = TableRectifyParams::default();
    let det = TableRectifier::new(params.clone())
        .detect(&img.view())
        .expect("detected");

    let h = det.homography.h_rect_from_img;
    for (src, dst) in det
        .refined
        .corners
        .to_array()
        .iter()
        .zip(params.table.corners().iter())
    {
        let m = h.apply(*src);
        assert!((m - *dst).norm() < 1e-6, "{m:?} != {dst:?}");
    }
}

#[test]
fn bgr_frames_give_the_same_geometry() {
    let (rgb, _) = rotated_table();
    let mut bgr = rgb.clone();
    bgr.layout = PixelLayout::Bgr8;
    for px in bgr.data.chunks_exact_mut(3) {
        px.swap(0, 2);
    }

    let rectifier = TableRectifier::default();
    let a = rectifier.rectify(&rgb.view()).expect("rgb");
    let b = rectifier.rectify(&bgr.view()).expect("bgr");
    assert_eq!(a.detection.refined.corners, b.detection.refined.corners);
    assert_eq!(b.image.layout, PixelLayout::Bgr8);
    assert_eq!(b.image.view().pixel(600, 300), [FELT[2], FELT[1], FELT[0]]);
}

#[test]
fn all_black_frame_has_no_region() {
    let img = blank(320, 240, [0, 0, 0]);
    let err = TableRectifier::default().rectify(&img.view()).unwrap_err();
    assert_eq!(err, RectifyError::NoRegionFound);
}

#[test]
fn l_shaped_felt_is_not_a_quadrilateral() {
    let mut img = blank(500, 500, FLOOR);
    fill_rect(&mut img, 100, 100, 400, 200, FELT);
    fill_rect(&mut img, 100, 100, 200, 400, FELT);

    let err = TableRectifier::default().detect(&img.view()).unwrap_err();
    assert_eq!(err, RectifyError::NotAQuadrilateral { vertices: 6 });
}

#[test]
fn triangular_felt_is_not_a_quadrilateral() {
    let mut img = blank(640, 480, FLOOR);
    fill_convex(&mut img, &[p(320.0, 60.0), p(560.0, 420.0), p(80.0, 420.0)], FELT);

    let err = TableRectifier::default().detect(&img.view()).unwrap_err();
    assert_eq!(err, RectifyError::NotAQuadrilateral { vertices: 3 });
}

#[test]
fn nearly_collinear_corners_are_refused() {
    let img = blank(640, 480, FLOOR);
    let pts = [p(100.0, 100.0), p(300.0, 101.0), p(500.0, 100.0), p(300.0, 400.0)];
    let err = TableRectifier::default()
        .rectify_from_corners(&img.view(), &pts)
        .unwrap_err();
    assert_eq!(err, RectifyError::DegenerateQuadrilateral);
}

#[test]
fn collinear_corners_never_yield_a_transform() {
    let img = blank(64, 64, FLOOR);
    let pts = [p(0.0, 0.0), p(10.0, 10.0), p(20.0, 20.0), p(30.0, 30.0)];
    let err = TableRectifier::default()
        .rectify_from_corners(&img.view(), &pts)
        .unwrap_err();
    assert!(matches!(
        err,
        RectifyError::DegenerateQuadrilateral | RectifyError::ParallelEdges { .. }
    ));
}

#[test]
fn concave_corners_are_refused_before_warping() {
    let img = blank(640, 480, FLOOR);
    let pts = [p(100.0, 100.0), p(500.0, 100.0), p(300.0, 400.0), p(300.0, 150.0)];
    let err = TableRectifier::default()
        .rectify_from_corners(&img.view(), &pts)
        .unwrap_err();
    assert_eq!(err, RectifyError::DegenerateQuadrilateral);
}

#[test]
fn dart_shaped_felt_is_refused() {
    // two triangles sharing the x = 320 column, notch at (320, 160)
    let mut img = blank(640, 480, FLOOR);
    fill_convex(&mut img, &[p(100.0, 60.0), p(320.0, 160.0), p(320.0, 420.0)], FELT);
    fill_convex(&mut img, &[p(320.0, 160.0), p(540.0, 60.0), p(320.0, 420.0)], FELT);

    let err = TableRectifier::default().rectify(&img.view()).unwrap_err();
    assert_eq!(err, RectifyError::DegenerateQuadrilateral);
}

#[test]
fn felt_outline_with_a_flat_vertex_is_refused() {
    // right triangle whose long side bulges out by 12 px at its midpoint;
    // the outline keeps the bulge as a fourth vertex turning about 4 degrees
    let mut img = blank(640, 480, FLOOR);
    fill_convex(
        &mut img,
        &[p(60.0, 60.0), p(580.0, 60.0), p(580.0, 440.0), p(313.0, 259.7)],
        FELT,
    );
    let mut params = TableRectifyParams::default();
    params.approx_epsilon_frac = 0.005;

    let err = TableRectifier::new(params).detect(&img.view()).unwrap_err();
    assert_eq!(err, RectifyError::DegenerateQuadrilateral);
}

#[test]
fn oversized_destination_is_a_typed_error() {
    let (img, _) = rotated_table();
    let mut params = TableRectifyParams::default();
    params.table.length = 1 << 40;
    params.table.width = 1 << 40;

    let err = TableRectifier::new(params).rectify(&img.view()).unwrap_err();
    assert!(matches!(err, RectifyError::InvalidTableSize { .. }));
}

#[test]
fn edge_intersection_is_idempotent_on_exact_rectangles() {
    for deg in [0.0, 15.0, -40.0] {
        let quad = OrderedQuad::from_array(rotated_rect(320.0, 240.0, 400.0, 200.0, deg));
        let once = intersect_edges(&quad, 1e-9).expect("intersect");
        for (a, b) in once.to_array().iter().zip(quad.to_array().iter()) {
            assert_near(*a, *b, 1e-9);
        }
    }
}

#[test]
fn canonical_order_holds_for_shuffled_inputs() {
    for deg in [-40.0, -20.0, 0.0, 10.0, 40.0] {
        let c = rotated_rect(320.0, 240.0, 400.0, 200.0, deg);
        let shuffled = [c[2], c[0], c[3], c[1]];
        let q = order_corners(&shuffled, &CornerOrderParams::default()).expect("ordered");
        assert!(q.top_left.y.max(q.top_right.y) <= q.bottom_left.y.min(q.bottom_right.y));
        assert!(q.top_left.x < q.top_right.x);
        assert!(q.bottom_left.x < q.bottom_right.x);
    }
}

#[test]
fn batch_skips_failed_frames_by_default() {
    let (table, _) = rotated_table();
    let black = blank(640, 480, [0, 0, 0]);
    let frames = [table.view(), black.view(), table.view()];

    let outcomes = rectify_frames(frames, &TableRectifyParams::default(), FailurePolicy::Skip)
        .collect::<Result<Vec<_>, _>>()
        .expect("batch");
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].result.is_ok());
    assert_eq!(
        outcomes[1].result.as_ref().err(),
        Some(&RectifyError::NoRegionFound)
    );
    assert!(outcomes[2].result.is_ok());
}

#[test]
fn batch_abort_keeps_frames_before_the_failure() {
    let (table, _) = rotated_table();
    let black = blank(640, 480, [0, 0, 0]);
    let frames = [table.view(), black.view(), table.view()];

    let mut batch = rectify_frames(frames, &TableRectifyParams::default(), FailurePolicy::Abort);

    let first = batch.next().expect("frame 0").expect("not aborted");
    assert_eq!(first.frame, 0);
    assert!(first.result.is_ok());

    let err = batch.next().expect("frame 1").unwrap_err();
    assert_eq!(err.frame, 1);
    assert_eq!(err.source, RectifyError::NoRegionFound);
    assert_eq!(batch.failed(), 1);

    // the third frame is never processed
    assert!(batch.next().is_none());
}

#[test]
fn batch_outputs_can_be_dropped_frame_by_frame() {
    let (table, _) = rotated_table();
    let frames = std::iter::repeat(table.view()).take(4);

    let mut seen = 0;
    for outcome in rectify_frames(frames, &TableRectifyParams::default(), FailurePolicy::Skip) {
        let outcome = outcome.expect("skip never aborts");
        let out = outcome.result.expect("rectified");
        assert_eq!((out.image.width, out.image.height), (1200, 600));
        seen += 1;
    }
    assert_eq!(seen, 4);
}

#[test]
fn report_survives_a_json_round_trip() {
    let (img, _) = rotated_table();
    let out = TableRectifier::default()
        .rectify(&img.view())
        .expect("rectified");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("report.json");
    let report = RectifyReport::from_result(None, Some(&dir.path().join("out.png")), &out);
    report.write_json(&path).expect("write");

    let back = RectifyReport::load_json(&path).expect("load");
    assert_eq!(back.output_size, Some([1200, 600]));
    assert_eq!(back.output_path, report.output_path);
    assert_eq!(back.polygon, report.polygon);
    assert!(back.error.is_none());

    let (saved, loaded) = (
        report.refined_corners.expect("corners"),
        back.refined_corners.expect("corners"),
    );
    for (a, b) in saved.to_array().iter().zip(loaded.to_array().iter()) {
        assert_near(*a, *b, 1e-9);
    }
}

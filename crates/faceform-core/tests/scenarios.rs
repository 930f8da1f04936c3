use faceform_core::landmarks::{mesh_indices, names};
use faceform_core::{
    AnalysisInput, FaceAnalyzer, FaceBox, FaceShape, FallbackReason, ImageDims, LandmarkPoint,
    LandmarkSet, MeasurementSource, RgbFrame, Undertone,
};

/// Frontal face centred at x = 400 with the given pixel geometry
fn face(forehead: f32, cheek: f32, jaw: f32, length: f32, ipd: f32) -> LandmarkSet {
    let cx = 400.0;
    let pts = [
        (names::FOREHEAD_LEFT, cx - forehead / 2.0, 180.0),
        (names::FOREHEAD_RIGHT, cx + forehead / 2.0, 180.0),
        (names::FOREHEAD_CENTER, cx, 190.0),
        (names::CHEEKBONE_LEFT, cx - cheek / 2.0, 280.0),
        (names::CHEEKBONE_RIGHT, cx + cheek / 2.0, 280.0),
        (names::CHEEK_LEFT, cx - cheek / 4.0, 300.0),
        (names::CHEEK_RIGHT, cx + cheek / 4.0, 300.0),
        (names::JAW_LEFT, cx - jaw / 2.0, 360.0),
        (names::JAW_RIGHT, cx + jaw / 2.0, 360.0),
        (names::FACE_TOP, cx, 120.0),
        (names::CHIN_BOTTOM, cx, 120.0 + length),
        (names::CHIN_CENTER, cx, 120.0 + length * 0.9),
        (names::EYE_LEFT, cx - ipd / 2.0, 250.0),
        (names::EYE_RIGHT, cx + ipd / 2.0, 250.0),
    ];
    let mut set = LandmarkSet::new();
    for (name, x, y) in pts {
        set.insert(name, LandmarkPoint::new(x, y)).unwrap();
    }
    set
}

fn analyze(set: &LandmarkSet) -> faceform_core::AnalysisReport {
    let input = AnalysisInput::new(ImageDims::new(800, 800)).with_landmarks(set);
    FaceAnalyzer::new().analyze(&input).unwrap()
}

#[test]
fn scenario_a_tapered_face_is_diamond() {
    let report = analyze(&face(180.0, 200.0, 160.0, 240.0, 65.0));

    assert_eq!(report.ratios.fc, 1.2);
    assert_eq!(report.ratios.fw_cw, 0.9);
    assert_eq!(report.ratios.cw_jw, 1.25);
    assert_eq!(report.face_shape, FaceShape::Diamond);
    assert_eq!(report.confidence, 90);
    assert_eq!(report.source, MeasurementSource::Landmarks);
}

#[test]
fn scenario_b_compact_symmetric_face_is_round() {
    let report = analyze(&face(190.0, 190.0, 190.0, 200.0, 65.0));
    assert_eq!(report.face_shape, FaceShape::Round);
    assert_eq!(report.confidence, 83);
}

#[test]
fn scenario_c_elongated_face_is_long() {
    let report = analyze(&face(190.0, 200.0, 190.0, 320.0, 65.0));
    assert_eq!(report.ratios.fc, 1.6);
    assert_eq!(report.face_shape, FaceShape::Long);
    assert!(report.reasoning.contains("1.45"));
}

#[test]
fn scenario_d_no_face_uses_deterministic_estimate() {
    let analyzer = FaceAnalyzer::new();
    let input = AnalysisInput::new(ImageDims::new(640, 480));
    let first = analyzer.analyze(&input).unwrap();
    let second = analyzer.analyze(&input).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.source,
        MeasurementSource::Fallback {
            reason: FallbackReason::NoLandmarks
        }
    );
    assert_eq!(first.face_shape, FaceShape::Diamond);
    assert_eq!(first.confidence, 74);
    assert_eq!(first.measurements.cheekbone_width, 364.8);
}

#[test]
fn face_box_drives_fallback_geometry() {
    let input = AnalysisInput::new(ImageDims::new(1920, 1080))
        .with_face_box(FaceBox::new(800.0, 300.0, 300.0, 400.0));
    let report = FaceAnalyzer::new().analyze(&input).unwrap();
    assert_eq!(report.measurements.cheekbone_width, 285.0);
    assert_eq!(report.measurements.face_length, 300.0);
}

#[test]
fn mediapipe_mesh_feeds_the_pipeline() {
    // Scenario A geometry on a 1000x1000 image, normalized coordinates
    let mut mesh = vec![[0.5f32, 0.5, 0.0]; mesh_indices::MESH_SIZE];
    let mut put = |idx: usize, x: f32, y: f32| mesh[idx] = [x / 1000.0, y / 1000.0, 0.0];
    put(127, 410.0, 300.0);
    put(356, 590.0, 300.0);
    put(234, 400.0, 400.0);
    put(454, 600.0, 400.0);
    put(136, 420.0, 480.0);
    put(365, 580.0, 480.0);
    put(10, 500.0, 250.0);
    put(152, 500.0, 490.0);
    put(33, 467.5, 350.0);
    put(362, 532.5, 350.0);

    let set = LandmarkSet::from_mesh(&mesh, true, 1000, 1000).unwrap();
    let input = AnalysisInput::new(ImageDims::new(1000, 1000)).with_landmarks(&set);
    let report = FaceAnalyzer::new().analyze(&input).unwrap();

    assert_eq!(report.face_shape, FaceShape::Diamond);
    assert_eq!(report.measurements.forehead_width, 180.0);
    assert_eq!(report.measurements.interpupillary_distance, 65.0);
}

#[test]
fn end_to_end_report_with_undertone() {
    let set = face(180.0, 200.0, 160.0, 240.0, 65.0);
    let frame = RgbFrame::filled(800, 800, [186, 160, 200]);
    let input = AnalysisInput::from_frame(&frame).with_landmarks(&set);
    let report = FaceAnalyzer::new().analyze(&input).unwrap();

    let color = report.personal_color.as_ref().unwrap();
    assert_eq!(color.undertone, Undertone::Cool);
    assert_eq!(color.confidence, 71);
    assert_eq!(color.recommended_palette[1], "lavender");

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["face_shape"], "diamond");
    assert_eq!(json["confidence"], 90);
    assert_eq!(json["personal_color"]["undertone"], "Cool");
    assert_eq!(json["source"]["kind"], "landmarks");
    assert!(json["details"].as_array().unwrap().len() >= 4);
}

#[test]
fn malformed_landmarks_rejected_at_construction() {
    let mut set = LandmarkSet::new();
    let err = set
        .insert(names::EYE_LEFT, LandmarkPoint::new(f32::NAN, 10.0))
        .unwrap_err();
    assert!(matches!(err, faceform_core::AnalysisError::MalformedLandmarks(_)));
    assert!(set.is_empty());
}

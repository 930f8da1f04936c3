//! Shared fixtures for unit tests.

use crate::landmarks::{names, LandmarkPoint, LandmarkSet};

/// Frontal symmetric face centred on x = 300 with the given pixel widths,
/// crown-to-chin length and eye-corner distance.
pub fn symmetric_face(forehead: f32, cheek: f32, jaw: f32, length: f32, ipd: f32) -> LandmarkSet {
    let cx = 300.0;
    let pts = [
        (names::FOREHEAD_LEFT, cx - forehead / 2.0, 150.0),
        (names::FOREHEAD_RIGHT, cx + forehead / 2.0, 150.0),
        (names::FOREHEAD_CENTER, cx, 160.0),
        (names::CHEEKBONE_LEFT, cx - cheek / 2.0, 250.0),
        (names::CHEEKBONE_RIGHT, cx + cheek / 2.0, 250.0),
        (names::CHEEK_LEFT, cx - cheek / 4.0, 270.0),
        (names::CHEEK_RIGHT, cx + cheek / 4.0, 270.0),
        (names::JAW_LEFT, cx - jaw / 2.0, 330.0),
        (names::JAW_RIGHT, cx + jaw / 2.0, 330.0),
        (names::FACE_TOP, cx, 100.0),
        (names::CHIN_BOTTOM, cx, 100.0 + length),
        (names::CHIN_CENTER, cx, 100.0 + length * 0.9),
        (names::EYE_LEFT, cx - ipd / 2.0, 220.0),
        (names::EYE_RIGHT, cx + ipd / 2.0, 220.0),
    ];
    let mut set = LandmarkSet::new();
    for (name, x, y) in pts {
        set.insert(name, LandmarkPoint::new(x, y)).unwrap();
    }
    set
}

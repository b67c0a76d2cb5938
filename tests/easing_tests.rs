//! Easing Tests
//!
//! Tests for:
//! - Endpoint clamping for every curve and shape
//! - Monotonic curves stay monotonic and inside the range
//! - Strength blending towards linear

use affinity::animation::{Curve, Easing, Shape};

const SHAPES: [Shape; 3] = [Shape::In, Shape::Out, Shape::InOut];
const CURVES: [Curve; 7] = [
    Curve::Linear,
    Curve::Quadratic,
    Curve::Cubic,
    Curve::Quartic,
    Curve::Quintic,
    Curve::Back,
    Curve::Elastic,
];

// ============================================================================
// Endpoints
// ============================================================================

#[test]
fn endpoints_are_clamped_for_every_easing() {
    for shape in SHAPES {
        for curve in CURVES {
            let easing = Easing::new(shape, curve);
            assert_eq!(easing.ease(-20, 400), 0, "{shape:?} {curve:?}");
            assert_eq!(easing.ease(0, 400), 0, "{shape:?} {curve:?}");
            assert_eq!(easing.ease(400, 400), 400, "{shape:?} {curve:?}");
            assert_eq!(easing.ease(900, 400), 400, "{shape:?} {curve:?}");
        }
    }
}

#[test]
fn zero_duration_yields_zero() {
    assert_eq!(Easing::STRONG_OUT.ease(10, 0), 0);
    assert_eq!(Easing::BACK_IN_OUT.ease(0, 0), 0);
}

// ============================================================================
// Shape Laws
// ============================================================================

#[test]
fn polynomial_curves_are_monotonic() {
    for shape in SHAPES {
        for curve in [Curve::Linear, Curve::Quadratic, Curve::Cubic, Curve::Quartic, Curve::Quintic] {
            let easing = Easing::new(shape, curve);
            let mut previous = 0;
            for t in 0..=1000 {
                let eased = easing.ease(t, 1000);
                assert!(eased >= previous, "{shape:?} {curve:?} decreased at {t}");
                assert!((0..=1000).contains(&eased));
                previous = eased;
            }
        }
    }
}

#[test]
fn in_and_out_mirror_each_other() {
    for t in [100, 250, 400, 600, 900] {
        let a = Easing::REGULAR_IN.ease(t, 1000);
        let b = Easing::REGULAR_OUT.ease(1000 - t, 1000);
        assert!((a + b - 1000).abs() <= 1, "t={t}: {a} + {b}");
    }
}

#[test]
fn out_curves_lead_linear_time() {
    assert!(Easing::STRONG_OUT.ease(200, 1000) > 200);
    assert!(Easing::STRONG_IN.ease(200, 1000) < 200);
}

// ============================================================================
// Strength
// ============================================================================

#[test]
fn half_strength_lies_between_curve_and_linear() {
    let full = Easing::STRONG_IN.ease(500, 1000);
    let half = Easing::STRONG_IN.with_strength(0.5).ease(500, 1000);
    assert!(full < half && half < 500);
}

#[test]
fn strength_is_clamped() {
    assert_eq!(Easing::REGULAR_IN.with_strength(3.0).strength(), 1.0);
    assert_eq!(Easing::REGULAR_IN.with_strength(-1.0).strength(), 0.0);
}

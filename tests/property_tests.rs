//! Property tests for the hyperboloid geometry kernel.

use hyperwalk::manifold::{
    ball_to_hyperboloid, distance, exp_map, lift_timelike, minkowski_dot, project_to_tangent,
};
use ndarray::Array1;
use proptest::prelude::*;

/// Lift arbitrary spatial coordinates onto the hyperboloid.
fn on_manifold(spatial: &[f64]) -> Array1<f64> {
    let mut x = Array1::zeros(spatial.len() + 1);
    for (i, &v) in spatial.iter().enumerate() {
        x[i] = v;
    }
    lift_timelike(&mut x);
    x
}

fn spatial3() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-3.0..3.0f64, 3)
}

fn ambient4() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-10.0..10.0f64, 4)
}

proptest! {
    #[test]
    fn prop_lifted_points_satisfy_constraint(spatial in prop::collection::vec(-5.0..5.0f64, 1..6)) {
        let x = on_manifold(&spatial);
        prop_assert!((minkowski_dot(x.view(), x.view()) + 1.0).abs() < 1e-9);
        prop_assert!(x[spatial.len()] > 0.0);
    }

    #[test]
    fn prop_ball_lift_satisfies_constraint(ball in prop::collection::vec(-0.45..0.45f64, 2..5)) {
        let x = ball_to_hyperboloid(Array1::from_vec(ball).view());
        prop_assert!((minkowski_dot(x.view(), x.view()) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_tangent_projection_is_orthogonal(spatial in spatial3(), v in ambient4()) {
        let p = on_manifold(&spatial);
        let v = Array1::from_vec(v);
        let tangent = project_to_tangent(p.view(), v.view());
        prop_assert!(minkowski_dot(p.view(), tangent.view()).abs() < 1e-8);
    }

    #[test]
    fn prop_distance_symmetric_and_identity(a in spatial3(), b in spatial3()) {
        let x = on_manifold(&a);
        let y = on_manifold(&b);

        let d_xy = distance(x.view(), y.view());
        let d_yx = distance(y.view(), x.view());
        prop_assert!((d_xy - d_yx).abs() < 1e-9);
        prop_assert!(d_xy >= 0.0);

        // Clamped domain makes d(x,x) tiny rather than exactly zero
        prop_assert!(distance(x.view(), x.view()) < 1e-3);
    }

    #[test]
    fn prop_exp_map_returns_manifold_point(spatial in spatial3(), v in ambient4()) {
        let p = on_manifold(&spatial);
        let v = Array1::from_vec(v);
        let tangent = project_to_tangent(p.view(), v.view());
        let out = exp_map(p.view(), tangent.view(), 2.0);

        prop_assert!((minkowski_dot(out.view(), out.view()) + 1.0).abs() < 1e-9);
        prop_assert!(out[3] > 0.0, "upper sheet");
    }

    #[test]
    fn prop_exp_map_zero_step_is_identity(spatial in spatial3()) {
        let p = on_manifold(&spatial);
        let zero = Array1::zeros(4);
        let out = exp_map(p.view(), zero.view(), 1.0);
        prop_assert_eq!(out, p);
    }

    #[test]
    fn prop_exp_map_respects_step_clip(spatial in spatial3(), v in ambient4()) {
        let p = on_manifold(&spatial);
        let v = Array1::from_vec(v);
        let tangent = project_to_tangent(p.view(), v.view());
        let out = exp_map(p.view(), tangent.view(), 1.5);

        // A step clipped to Minkowski norm 1.5 travels at most distance 1.5
        prop_assert!(distance(p.view(), out.view()) <= 1.5 + 1e-6);
    }
}

//! Hyperboloid-model geometry kernel.
//!
//! Pure functions over ambient coordinate arrays of shape `[..., d+1]`
//! where the *last* axis is the timelike coordinate. Points live on the
//! upper sheet `{x : <x,x>_M = -1, x_d > 0}` of the Minkowski quadratic
//! form; tangent vectors are Minkowski-orthogonal to their base point.
//!
//! All operations are total over finite inputs: arguments that drift out
//! of domain from floating round-off (an `acosh` argument below 1, a
//! near-zero tangent norm) are clamped, never reported as errors - the
//! manifold boundary is reached routinely during optimization.
//!
//! # References
//!
//! - Nickel & Kiela (2018). "Learning Continuous Hierarchies in the
//!   Lorentz Model of Hyperbolic Geometry"

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

/// Lower clamp on the `acosh` argument offset in [`distance`].
///
/// For on-manifold points `-<x,y>_M - 1 >= 0` holds exactly; round-off can
/// push it slightly negative, outside the domain of `acosh`.
pub const DISTANCE_EPS: f64 = 1e-7;

/// Norms below this are treated as zero (unit-normalization guard).
pub const MIN_NORM: f64 = 1e-15;

/// Minkowski inner product `<x,y>_M = sum_{i<d} x_i y_i - x_d y_d`.
pub fn minkowski_dot(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let d = x.len() - 1;
    let mut dot = 0.0;
    for i in 0..d {
        dot += x[i] * y[i];
    }
    dot - x[d] * y[d]
}

/// Pairwise Minkowski inner products: `out[i][j] = <x_i, y_j>_M`.
///
/// Cross variant for N x M distance computation.
pub fn minkowski_dot_cross(x: ArrayView2<f64>, y: ArrayView2<f64>) -> Array2<f64> {
    debug_assert_eq!(x.ncols(), y.ncols());
    let d = x.ncols() - 1;
    let spatial = x.slice(s![.., ..d]).dot(&y.slice(s![.., ..d]).t());
    let timelike = x.slice(s![.., d..]).dot(&y.slice(s![.., d..]).t());
    spatial - timelike
}

/// Geodesic distance between two hyperboloid points.
///
/// `acosh(1 + max(eps, -<x,y>_M - 1))`; the clamp keeps the argument in
/// the valid domain `[1, inf)`.
pub fn distance(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let inner = (-minkowski_dot(x, y) - 1.0).max(DISTANCE_EPS);
    (1.0 + inner).acosh()
}

/// Pairwise geodesic distances: `out[i][j] = d(x_i, y_j)`.
pub fn distance_cross(x: ArrayView2<f64>, y: ArrayView2<f64>) -> Array2<f64> {
    let mut inner = minkowski_dot_cross(x, y);
    inner.mapv_inplace(|m| (1.0 + (-m - 1.0).max(DISTANCE_EPS)).acosh());
    inner
}

/// Project an ambient vector onto the tangent space at `base`.
///
/// `v + <base,v>_M * base`. The result satisfies
/// `<base, project_to_tangent(base, v)>_M ~= 0`.
pub fn project_to_tangent(base: ArrayView1<f64>, v: ArrayView1<f64>) -> Array1<f64> {
    let coef = minkowski_dot(base, v);
    let mut out = v.to_owned();
    out.scaled_add(coef, &base);
    out
}

/// Exponential map: follow the geodesic at `base` with initial velocity
/// `tangent` for unit time.
///
/// The tangent norm is clipped to `max_norm` to bound the step under large
/// gradients. A near-zero tangent returns `base` unchanged. The timelike
/// coordinate of the result is re-derived from the spatial ones so the
/// hyperboloid constraint holds to machine precision on output.
pub fn exp_map(base: ArrayView1<f64>, tangent: ArrayView1<f64>, max_norm: f64) -> Array1<f64> {
    // Lorentzian signature makes <v,v>_M >= 0 for genuine tangent vectors;
    // round-off can still produce a tiny negative.
    let norm = minkowski_dot(tangent, tangent).max(0.0).sqrt();
    if norm < MIN_NORM {
        return base.to_owned();
    }
    let clipped = norm.min(max_norm);

    let mut out = base.mapv(|e| e * clipped.cosh());
    out.scaled_add(clipped.sinh() / norm, &tangent);
    lift_timelike(&mut out);
    out
}

/// Recompute the timelike coordinate from the spatial ones:
/// `t = sqrt(1 + ||x_{0..d}||^2)`.
pub fn lift_timelike(x: &mut Array1<f64>) {
    let d = x.len() - 1;
    let spatial_sq: f64 = x.slice(s![..d]).iter().map(|e| e * e).sum();
    x[d] = (1.0 + spatial_sq).sqrt();
}

/// Lift a point of the Poincare ball (`||x|| < 1`, dimension `d`) onto the
/// hyperboloid (dimension `d+1`): `(2x, 1 + ||x||^2) / (1 - ||x||^2)`.
pub fn ball_to_hyperboloid(x: ArrayView1<f64>) -> Array1<f64> {
    let norm_sq: f64 = x.iter().map(|e| e * e).sum();
    let denom = 1.0 - norm_sq;
    let d = x.len();
    let mut out = Array1::zeros(d + 1);
    for i in 0..d {
        out[i] = 2.0 * x[i] / denom;
    }
    out[d] = (1.0 + norm_sq) / denom;
    out
}

/// Project a hyperboloid point back into the Poincare ball:
/// `y_i = x_i / (1 + x_d)`.
pub fn hyperboloid_to_ball(x: ArrayView1<f64>) -> Array1<f64> {
    let d = x.len() - 1;
    let t = x[d];
    Array1::from_iter((0..d).map(|i| x[i] / (1.0 + t)))
}

//! Projection primitives shared by the main loop and the cut loop.
//!
//! - `closest_point_on_segment`: Euclidean projection of a target onto `[a, b]`.
//! - `dominates_within`: componentwise `a >= b - precision`.
//! - `clamp_to`: componentwise minimum, used to restore `q <= f` after a step.

use nalgebra::DVector;

/// Squared segment length below which `[a, b]` is treated as the single point `a`.
pub const DEGENERATE_SEGMENT_EPS: f64 = 1e-5;

/// Point on the closed segment `[a, b]` closest to `target`.
///
/// Pre: `a`, `b`, `target` share one dimension.
/// Post: returns `a` for a degenerate segment (`|b-a|^2 <= 1e-5`), otherwise the
/// affine combination `(1-α) a + α b` with `α` clipped to `[0, 1]`.
pub fn closest_point_on_segment(
    a: &DVector<f64>,
    b: &DVector<f64>,
    target: &DVector<f64>,
) -> DVector<f64> {
    let dir = b - a;
    let denom = dir.norm_squared();
    if denom <= DEGENERATE_SEGMENT_EPS {
        return a.clone();
    }
    let alpha = dir.dot(&(target - a)) / denom;
    if (0.0..=1.0).contains(&alpha) {
        a * (1.0 - alpha) + b * alpha
    } else if alpha > 1.0 {
        b.clone()
    } else {
        a.clone()
    }
}

/// True iff `min_i (a[i] - b[i]) >= -precision`.
///
/// An empty pair of vectors dominates trivially.
pub fn dominates_within(a: &DVector<f64>, b: &DVector<f64>, precision: f64) -> bool {
    debug_assert_eq!(a.len(), b.len(), "dimension mismatch");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x - y)
        .fold(f64::INFINITY, f64::min)
        >= -precision
}

/// Componentwise `min(q_i, cap_i)`.
#[inline]
pub fn clamp_to(q: &DVector<f64>, cap: &DVector<f64>) -> DVector<f64> {
    q.zip_map(cap, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;
    use proptest::prelude::*;

    #[test]
    fn segment_interior_and_endpoints() {
        let a = dvector![0.0, 0.0];
        let b = dvector![2.0, 0.0];
        let mid = closest_point_on_segment(&a, &b, &dvector![1.0, 5.0]);
        assert!((mid - dvector![1.0, 0.0]).norm() < 1e-12);
        let past_b = closest_point_on_segment(&a, &b, &dvector![3.0, -1.0]);
        assert_eq!(past_b, b);
        let before_a = closest_point_on_segment(&a, &b, &dvector![-0.5, 1.0]);
        assert_eq!(before_a, a);
    }

    #[test]
    fn short_segment_collapses_to_first_endpoint() {
        let a = dvector![1.0, 1.0, 1.0];
        let b = dvector![1.001, 1.0, 1.0];
        let p = closest_point_on_segment(&a, &b, &dvector![5.0, 0.0, 0.0]);
        assert_eq!(p, a);
    }

    #[test]
    fn dominance_boundary_cases() {
        let a = dvector![0.5, 0.25];
        assert!(dominates_within(&a, &a, 0.0));
        assert!(!dominates_within(&dvector![0.5, 0.2], &a, 0.01));
        assert!(dominates_within(&dvector![0.5, 0.245], &a, 0.01));
    }

    #[test]
    fn clamp_is_idempotent_on_dominated_input() {
        let cap = dvector![1.0, 2.0, 3.0];
        let q = dvector![0.5, 2.0, -1.0];
        assert_eq!(clamp_to(&q, &cap), q);
        let over = dvector![1.5, 2.0, 4.0];
        assert_eq!(clamp_to(&over, &cap), dvector![1.0, 2.0, 3.0]);
    }

    fn vec3() -> impl Strategy<Value = DVector<f64>> {
        prop::collection::vec(-10.0f64..10.0, 3).prop_map(DVector::from_vec)
    }

    proptest! {
        #[test]
        fn degenerate_segment_returns_a(a in vec3(), t in vec3()) {
            prop_assert_eq!(closest_point_on_segment(&a, &a, &t), a);
        }

        #[test]
        fn projection_beats_sampled_segment_points(a in vec3(), b in vec3(), t in vec3()) {
            prop_assume!((&b - &a).norm_squared() > DEGENERATE_SEGMENT_EPS);
            let p = closest_point_on_segment(&a, &b, &t);
            let dist = (&p - &t).norm();
            for k in 0..=20 {
                let s = k as f64 / 20.0;
                let x = &a * (1.0 - s) + &b * s;
                prop_assert!(dist <= (&x - &t).norm() + 1e-9);
            }
            // p lies on the segment: distances to the endpoints add up to its length.
            let len = (&b - &a).norm();
            prop_assert!(((&p - &a).norm() + (&b - &p).norm() - len).abs() < 1e-7);
        }

        #[test]
        fn dominance_matches_coordinatewise_definition(a in vec3(), b in vec3(), eps in 0.0f64..1.0) {
            let expected = (0..3).all(|i| a[i] - b[i] >= -eps);
            prop_assert_eq!(dominates_within(&a, &b, eps), expected);
        }
    }
}

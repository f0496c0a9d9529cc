//! Closest point in the convex hull of a finite point set.
//!
//! Purpose
//! - Fully corrective step of the packing loop: re-fit `q` against every cut
//!   and solution collected so far instead of a single segment.
//!
//! Formulation
//! - Variables are the convex multipliers `λ ∈ Δ_m` (simplex); the hull point
//!   is `Vλ` where the columns of `V` are the candidates.
//! - `Equality`: minimize `|Vλ - t|²`.
//! - `Dominance`: minimize `|q - t|²` over `q <= Vλ`; for fixed `λ` the best
//!   `q` is `min(t, Vλ)`, so the objective is `|min(Vλ - t, 0)|²`.
//! - Both are smooth convex programs over the simplex. We run accelerated
//!   projected gradient (FISTA with adaptive restart) and stop on the
//!   Frank–Wolfe gap, which bounds the distance to the optimal value.
//!
//! The returned point is always `Vλ` for a `λ` on the simplex, so it lies in
//! the hull even when the gap target is missed.

use std::fmt;

use nalgebra::{DMatrix, DVector};

use crate::solver::{SolverProfile, Tolerances};

/// Which relation links the projected point and the hull.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HullMode {
    /// The point is a convex combination of the candidates.
    Equality,
    /// The point is dominated by a convex combination of the candidates.
    Dominance,
}

/// Projection settings; defaults to the loose solver profile.
#[derive(Clone, Copy, Debug)]
pub struct ProjectionCfg {
    pub tolerances: Tolerances,
    pub max_iter: usize,
}

impl Default for ProjectionCfg {
    fn default() -> Self {
        Self {
            tolerances: SolverProfile::Loose.tolerances(),
            max_iter: 20_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionError {
    NoCandidates,
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
    NonFinite,
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCandidates => write!(f, "hull projection needs at least one candidate"),
            Self::DimensionMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "candidate {index} has dimension {found}, expected {expected}"
            ),
            Self::NonFinite => write!(f, "non-finite value in hull projection input"),
        }
    }
}

impl std::error::Error for ProjectionError {}

/// Result of a hull projection.
#[derive(Clone, Debug)]
pub struct HullProjection {
    /// `Σ_c λ_c · candidate_c`.
    pub point: DVector<f64>,
    pub weights: DVector<f64>,
    /// Objective at `weights`: `|point - target|²` (equality) or its dominance analogue.
    pub distance_sq: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Closest point to `target` in `conv(candidates)` under `mode`.
pub fn closest_point_in_hull(
    target: &DVector<f64>,
    candidates: &[DVector<f64>],
    mode: HullMode,
    cfg: &ProjectionCfg,
) -> Result<HullProjection, ProjectionError> {
    if candidates.is_empty() {
        return Err(ProjectionError::NoCandidates);
    }
    let d = target.len();
    for (index, c) in candidates.iter().enumerate() {
        if c.len() != d {
            return Err(ProjectionError::DimensionMismatch {
                index,
                expected: d,
                found: c.len(),
            });
        }
        if c.iter().any(|x| !x.is_finite()) {
            return Err(ProjectionError::NonFinite);
        }
    }
    if target.iter().any(|x| !x.is_finite()) {
        return Err(ProjectionError::NonFinite);
    }

    let qp = HullQp {
        v: DMatrix::from_columns(candidates),
        target,
        mode,
    };
    let tol = cfg.tolerances;
    let lip = qp.lipschitz().max(1e-12);

    // Warm start at the best single candidate.
    let m = candidates.len();
    let start = (0..m)
        .map(|c| (c, qp.objective(&DVector::from_fn(m, |i, _| f64::from(i == c)))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(0, |(c, _)| c);
    let mut lambda = DVector::from_fn(m, |i, _| f64::from(i == start));
    let mut obj = qp.objective(&lambda);
    let mut y = lambda.clone();
    let mut t = 1.0f64;

    let mut iterations = 0;
    let mut converged = false;
    while iterations < cfg.max_iter {
        let g = qp.gradient(&lambda);
        let gap = g.dot(&lambda) - g.min();
        if gap <= tol.abs_gap.max(tol.rel_gap * obj) {
            converged = true;
            break;
        }
        iterations += 1;

        let gy = qp.gradient(&y);
        let next = project_to_simplex(&(&y - gy / lip));
        let next_obj = qp.objective(&next);
        if next_obj > obj {
            // Adaptive restart: drop momentum and take a plain step from λ.
            t = 1.0;
            let g = qp.gradient(&lambda);
            lambda = project_to_simplex(&(&lambda - g / lip));
            obj = qp.objective(&lambda);
            y = lambda.clone();
            continue;
        }
        let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
        y = &next + (&next - &lambda) * ((t - 1.0) / t_next);
        lambda = next;
        obj = next_obj;
        t = t_next;
    }
    if !converged {
        tracing::warn!(
            iterations,
            distance_sq = obj,
            "hull projection stopped at iteration limit"
        );
    }

    Ok(HullProjection {
        point: &qp.v * &lambda,
        weights: lambda,
        distance_sq: obj,
        iterations,
        converged,
    })
}

struct HullQp<'a> {
    v: DMatrix<f64>,
    target: &'a DVector<f64>,
    mode: HullMode,
}

impl HullQp<'_> {
    fn residual(&self, lambda: &DVector<f64>) -> DVector<f64> {
        let r = &self.v * lambda - self.target;
        match self.mode {
            HullMode::Equality => r,
            HullMode::Dominance => r.map(|x| x.min(0.0)),
        }
    }

    fn objective(&self, lambda: &DVector<f64>) -> f64 {
        self.residual(lambda).norm_squared()
    }

    fn gradient(&self, lambda: &DVector<f64>) -> DVector<f64> {
        self.v.tr_mul(&self.residual(lambda)) * 2.0
    }

    /// Upper bound on the gradient's Lipschitz constant: `2 |V|₂²`, with
    /// `|V|₂² <= min(|V|_F², |V|₁ |V|_∞)`.
    fn lipschitz(&self) -> f64 {
        let frob = self.v.norm_squared();
        let col_max = self
            .v
            .column_iter()
            .map(|c| c.abs().sum())
            .fold(0.0, f64::max);
        let row_max = self
            .v
            .row_iter()
            .map(|r| r.abs().sum())
            .fold(0.0, f64::max);
        2.0 * frob.min(col_max * row_max)
    }
}

/// Euclidean projection onto the probability simplex (sort-and-threshold).
fn project_to_simplex(v: &DVector<f64>) -> DVector<f64> {
    let mut u: Vec<f64> = v.iter().copied().collect();
    u.sort_by(|a, b| b.total_cmp(a));
    let mut cumsum = 0.0;
    let mut theta = 0.0;
    for (j, &uj) in u.iter().enumerate() {
        cumsum += uj;
        let candidate = (cumsum - 1.0) / (j + 1) as f64;
        if uj - candidate > 0.0 {
            theta = candidate;
        }
    }
    v.map(|x| (x - theta).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::clamp_to;
    use nalgebra::dvector;

    fn tight() -> ProjectionCfg {
        ProjectionCfg {
            tolerances: SolverProfile::Standard.tolerances(),
            max_iter: 50_000,
        }
    }

    #[test]
    fn simplex_projection_basics() {
        let p = project_to_simplex(&dvector![0.5, 0.5, 0.5]);
        assert!((p.sum() - 1.0).abs() < 1e-12);
        assert!(p.iter().all(|&x| (x - 1.0 / 3.0).abs() < 1e-12));
        let q = project_to_simplex(&dvector![3.0, -1.0]);
        assert_eq!(q, dvector![1.0, 0.0]);
    }

    #[test]
    fn equality_projects_onto_segment_midpoint() {
        let cands = vec![dvector![1.0, 0.0], dvector![0.0, 1.0]];
        let res =
            closest_point_in_hull(&dvector![1.0, 1.0], &cands, HullMode::Equality, &tight())
                .unwrap();
        assert!(res.converged);
        assert!((res.point - dvector![0.5, 0.5]).norm() < 1e-3);
        assert!((res.weights.sum() - 1.0).abs() < 1e-9);
        assert!((res.distance_sq - 0.5).abs() < 1e-6);
    }

    #[test]
    fn equality_target_inside_hull_is_fixed() {
        let cands = vec![
            dvector![0.0, 0.0, 0.0],
            dvector![1.0, 0.0, 0.0],
            dvector![0.0, 1.0, 0.0],
            dvector![0.0, 0.0, 1.0],
        ];
        let t = dvector![0.2, 0.3, 0.1];
        let res = closest_point_in_hull(&t, &cands, HullMode::Equality, &tight()).unwrap();
        assert!((res.point - t).norm() < 1e-3);
    }

    #[test]
    fn dominance_allows_points_below_the_hull() {
        let cands = vec![dvector![1.0, 0.0], dvector![0.0, 1.0]];
        let t = dvector![0.2, 0.2];
        let res = closest_point_in_hull(&t, &cands, HullMode::Dominance, &tight()).unwrap();
        assert!(res.distance_sq < 1e-6);
        // Vλ dominates the target up to the solver tolerance and stays in the hull.
        assert!(res.point.iter().all(|&x| x >= 0.2 - 1e-3));
        assert!((res.point.sum() - 1.0).abs() < 1e-9);

        let eq = closest_point_in_hull(&t, &cands, HullMode::Equality, &tight()).unwrap();
        assert!((eq.distance_sq - 0.18).abs() < 1e-6);
    }

    #[test]
    fn loose_profile_still_lands_in_hull() {
        // Triangle matching: zero vector, the odd-set cut and the degree rows.
        let cands = vec![
            dvector![0.0, 0.0, 0.0],
            dvector![1.0, 1.0, 1.0],
            dvector![1.0, 1.0, 0.0],
            dvector![1.0, 0.0, 1.0],
            dvector![0.0, 1.0, 1.0],
        ];
        let f = DVector::from_element(3, 3f64.sqrt());
        let res =
            closest_point_in_hull(&f, &cands, HullMode::Dominance, &ProjectionCfg::default())
                .unwrap();
        assert!((res.point.clone() - dvector![1.0, 1.0, 1.0]).norm() < 2e-2);
        // Clamping a point that is already below f changes nothing.
        assert_eq!(clamp_to(&res.point, &f), res.point);
    }

    #[test]
    fn zero_candidates_converge_immediately() {
        let cands = vec![DVector::zeros(2)];
        let res = closest_point_in_hull(&dvector![1.0, 2.0], &cands, HullMode::Dominance, &tight())
            .unwrap();
        assert!(res.converged);
        assert_eq!(res.iterations, 0);
        assert_eq!(res.point, DVector::zeros(2));
    }

    #[test]
    fn rejects_bad_input() {
        let cfg = ProjectionCfg::default();
        assert_eq!(
            closest_point_in_hull(&dvector![1.0], &[], HullMode::Equality, &cfg).unwrap_err(),
            ProjectionError::NoCandidates
        );
        let err = closest_point_in_hull(
            &dvector![1.0, 0.0],
            &[dvector![1.0, 0.0], dvector![1.0]],
            HullMode::Equality,
            &cfg,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::DimensionMismatch { index: 1, .. }
        ));
        let err = closest_point_in_hull(
            &dvector![f64::NAN],
            &[dvector![1.0]],
            HullMode::Equality,
            &cfg,
        )
        .unwrap_err();
        assert_eq!(err, ProjectionError::NonFinite);
    }
}

//! Primal-dual packing algorithm and the companion LP cut loop.
//!
//! Purpose
//! - Approximate `max <obj, x>` over a packing polytope known only through a
//!   separation oracle, certified against a verification relaxation.
//!
//! Outline (one iteration)
//! - `f = obj / gamma` is the scaled objective, `q <= f` the best point built
//!   from cuts so far. Once `q` dominates `f` up to `precision`, the
//!   relaxation bound certifies `gamma` and the loop stops.
//! - Separate `x = 2(f - q) / tau` with `tau = Σ (f_i - q_i)(f_i + q_i)`.
//!   A feasible `x` raises `gamma` to `<obj, x>`; a cut is recorded and fed to
//!   the relaxation. Either way `q` moves toward `f`: onto a segment
//!   (incremental) or onto the hull of all cuts (fully corrective).
//! - `q` is clamped to `min(q, f)` after every move.
//!
//! References
//! - Code cross-refs: `segment::{closest_point_on_segment, dominates_within}`,
//!   `projection::closest_point_in_hull`, `oracle::SeparationOracle`,
//!   `relaxation::VerificationModel`.

mod cut_loop;
mod types;

use std::time::Instant;

use nalgebra::DVector;
use tracing::{debug, info};

use crate::oracle::SeparationOracle;
use crate::projection::{closest_point_in_hull, HullMode, ProjectionCfg};
use crate::relaxation::VerificationModel;
use crate::segment::{clamp_to, closest_point_on_segment, dominates_within};

pub use cut_loop::cut_loop;
pub use types::{CutLoopRun, Outcome, PackingCfg, PackingError, PackingRun, TraceRow};

/// Run the packing loop from the lower bound `lbopt`.
///
/// `init_cuts` join every fully corrective projection as extra hull points,
/// usually `oracle.standard_cuts()`. The verification model should carry the
/// same polytope the oracle separates over; it receives every cut.
pub fn packing_algorithm(
    oracle: &mut dyn SeparationOracle,
    verif: &mut dyn VerificationModel,
    lbopt: f64,
    init_cuts: &[DVector<f64>],
    cfg: &PackingCfg,
) -> Result<PackingRun, PackingError> {
    if !(lbopt.is_finite() && lbopt > 0.0) {
        return Err(PackingError::InvalidLowerBound { lbopt });
    }
    let obj = oracle.objective().clone();
    let d = obj.len();
    if obj.iter().any(|x| !x.is_finite()) {
        return Err(PackingError::NonFinite { what: "objective" });
    }
    for cut in init_cuts {
        check_dim("initial cut", cut, d)?;
    }
    let precision = cfg.precision;

    let mut gamma = lbopt;
    let mut q = DVector::zeros(d);
    let mut f = &obj / gamma;
    let origin = DVector::zeros(d);

    let mut separated = vec![q.clone()];
    let mut solutions = Vec::new();
    let mut sepa_rounds = Vec::new();
    let mut gamma_history = vec![gamma];
    let mut f_history = vec![f.clone()];
    let mut q_history = vec![q.clone()];

    let mut iterations = 0;
    let mut primal_steps = 0;
    let mut dual_steps = 0;

    let start = Instant::now();
    let outcome = loop {
        if dominates_within(&q, &f, precision) {
            let dual_val = verif.optimize()?;
            debug!(iteration = iterations, dual_val, gamma, "q dominates f");
            // NaN never passes.
            if dual_val / gamma < cfg.accept_ratio {
                break Outcome::Converged;
            }
        }

        let fully_corrective = cfg.corrective_freq > 0 && iterations % cfg.corrective_freq == 0;

        let tau: f64 = f.iter().zip(q.iter()).map(|(fi, qi)| (fi - qi) * (fi + qi)).sum();
        if !(tau > 0.0) {
            return Err(PackingError::NonPositiveTau {
                iteration: iterations,
                tau,
            });
        }
        let x = (&f - &q) * (2.0 / tau);

        match oracle.separate(&x, precision)? {
            None => {
                let value = obj.dot(&x);
                if !(value.is_finite() && value > 0.0) {
                    return Err(PackingError::NonPositiveGamma {
                        iteration: iterations,
                        gamma: value,
                    });
                }
                gamma = value;
                f = &obj / gamma;
                q = if fully_corrective {
                    project_onto_cuts(&f, &separated, init_cuts, &cfg.projection)?
                } else {
                    closest_point_on_segment(&q, &origin, &f)
                };
                debug!(iteration = iterations, gamma, fully_corrective, "feasible point");
                solutions.push(x);
                primal_steps += 1;
            }
            Some(cut) => {
                check_dim("separated cut", &cut, d)?;
                verif.add_cut(&cut)?;
                let segment_q = (!fully_corrective).then(|| closest_point_on_segment(&q, &cut, &f));
                separated.push(cut);
                q = match segment_q {
                    Some(p) => p,
                    None => project_onto_cuts(&f, &separated, init_cuts, &cfg.projection)?,
                };
                debug!(iteration = iterations, gamma, fully_corrective, "separated cut");
                sepa_rounds.push(iterations + 1);
                dual_steps += 1;
            }
        }

        q = clamp_to(&q, &f);
        iterations += 1;
        gamma_history.push(gamma);
        f_history.push(f.clone());
        q_history.push(q.clone());

        if iterations >= cfg.max_iter {
            break Outcome::IterationLimit;
        }
    };
    let elapsed = start.elapsed();

    info!(
        primal_steps,
        dual_steps,
        iterations,
        gamma,
        ?outcome,
        secs = elapsed.as_secs_f64(),
        "packing algorithm finished"
    );

    Ok(PackingRun {
        gamma,
        separated,
        solutions,
        gamma_history,
        sepa_rounds,
        f_history,
        q_history,
        iterations,
        primal_steps,
        dual_steps,
        outcome,
        elapsed,
    })
}

/// Fully corrective step: dominance projection of `f` onto the hull of every cut.
fn project_onto_cuts(
    f: &DVector<f64>,
    separated: &[DVector<f64>],
    init_cuts: &[DVector<f64>],
    cfg: &ProjectionCfg,
) -> Result<DVector<f64>, PackingError> {
    let candidates: Vec<DVector<f64>> = separated.iter().chain(init_cuts).cloned().collect();
    Ok(closest_point_in_hull(f, &candidates, HullMode::Dominance, cfg)?.point)
}

fn check_dim(what: &'static str, v: &DVector<f64>, expected: usize) -> Result<(), PackingError> {
    if v.len() != expected {
        return Err(PackingError::DimensionMismatch {
            what,
            expected,
            found: v.len(),
        });
    }
    Ok(())
}

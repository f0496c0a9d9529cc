//! Plain cutting-plane loop over an LP relaxation.

use std::time::Instant;

use tracing::{debug, info};

use super::types::{CutLoopRun, PackingError};
use crate::oracle::SeparationOracle;
use crate::relaxation::LpRelaxation;

/// Solve the relaxation, separate its optimum, add the cut, repeat.
///
/// Stops when no cut is found, when `obj_val <= lbopt + precision`, or after
/// `max_iter` rounds. Every round's objective value is recorded.
pub fn cut_loop(
    relaxation: &mut LpRelaxation,
    oracle: &mut dyn SeparationOracle,
    precision: f64,
    max_iter: usize,
    lbopt: Option<f64>,
) -> Result<CutLoopRun, PackingError> {
    let start = Instant::now();
    let mut obj_values = Vec::new();
    let mut cuts_added = 0;
    for round in 1..=max_iter {
        let obj_val = relaxation.optimize()?;
        obj_values.push(obj_val);
        let x = relaxation
            .solution()
            .ok_or(PackingError::NotOptimal { round })?;
        let cut = oracle.separate(&x, precision)?;
        debug!(round, obj_val, cut = cut.is_some(), "cut loop round");

        let bound_reached = lbopt.is_some_and(|lb| lb - obj_val >= -precision);
        match cut {
            Some(cut) if !bound_reached => {
                relaxation.add_cut(&cut)?;
                cuts_added += 1;
            }
            _ => break,
        }
    }
    let elapsed = start.elapsed();
    info!(
        rounds = obj_values.len(),
        cuts_added,
        secs = elapsed.as_secs_f64(),
        "cut loop finished"
    );
    Ok(CutLoopRun {
        obj_values,
        cuts_added,
        elapsed,
    })
}

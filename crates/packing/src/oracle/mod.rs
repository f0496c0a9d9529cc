//! Separation oracles for packing polytopes.
//!
//! Purpose
//! - Given a point, either certify (up to `precision`) that it lies in the
//!   target polytope or return a violated valid inequality `<cut, x> <= 1`.
//! - Each oracle owns one long-lived auxiliary integer program. A call to
//!   `separate` only replaces its objective and re-optimizes; the constraint
//!   set never changes after construction.
//!
//! Families
//! - `MatchingOracle`: odd-set inequalities over edges, plus degree rows.
//! - `StableSetOracle`: clique inequalities over nodes, plus edge rows.
//!
//! A single oracle's model is stateful; concurrent runs need their own oracle.

mod matching;
mod stable_set;

use nalgebra::DVector;

use crate::graph::{Graph, Weighting};
use crate::solver::{Backend, SolverError};

pub use matching::MatchingOracle;
pub use stable_set::StableSetOracle;

/// Polytope family an oracle separates over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    Matching,
    StableSet,
}

pub trait SeparationOracle {
    /// Objective vector; its length is the problem dimension.
    fn objective(&self) -> &DVector<f64>;

    /// Radius of a ball inscribed in the polytope, a valid lower bound on the optimum
    /// after scaling the objective.
    fn inner_radius(&self) -> f64;

    /// Baseline valid rows (degree rows, edge rows) used to seed hull projections.
    fn standard_cuts(&self) -> &[DVector<f64>];

    /// A violated inequality, or `None` when no violation above `precision` exists.
    fn separate(
        &mut self,
        point: &DVector<f64>,
        precision: f64,
    ) -> Result<Option<DVector<f64>>, SolverError>;

    fn dim(&self) -> usize {
        self.objective().len()
    }
}

/// Construct the oracle for `family` on `graph`.
pub fn build_oracle(
    family: Family,
    graph: &Graph,
    weighting: Weighting,
    backend: Backend,
) -> Result<Box<dyn SeparationOracle>, SolverError> {
    Ok(match family {
        Family::Matching => Box::new(MatchingOracle::new(graph, weighting, backend)?),
        Family::StableSet => Box::new(StableSetOracle::new(graph, weighting, backend)?),
    })
}

pub(crate) fn check_dim(point: &DVector<f64>, expected: usize) -> Result<(), SolverError> {
    if point.len() != expected {
        return Err(SolverError::DimensionMismatch {
            expected,
            found: point.len(),
        });
    }
    Ok(())
}

//! Configuration, run record and errors of the packing loops.

use std::fmt;
use std::time::Duration;

use nalgebra::DVector;

use crate::projection::{ProjectionCfg, ProjectionError};
use crate::solver::SolverError;

/// Packing-loop configuration.
#[derive(Clone, Copy, Debug)]
pub struct PackingCfg {
    /// Tolerance for the dominance test and every violation comparison.
    pub precision: f64,
    pub max_iter: usize,
    /// Every `corrective_freq`-th iteration is fully corrective; 0 disables.
    pub corrective_freq: usize,
    /// Stop once `dual_val / gamma` drops below this ratio.
    pub accept_ratio: f64,
    pub projection: ProjectionCfg,
}

impl Default for PackingCfg {
    fn default() -> Self {
        Self {
            precision: 1e-4,
            max_iter: 1000,
            corrective_freq: 10,
            accept_ratio: 1.01,
            projection: ProjectionCfg::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The verification bound certified `gamma`.
    Converged,
    /// The iteration budget ran out first.
    IterationLimit,
}

/// Everything one packing run produced.
#[derive(Clone, Debug)]
pub struct PackingRun {
    pub gamma: f64,
    /// Cuts in separation order; the first entry is the initial zero vector.
    pub separated: Vec<DVector<f64>>,
    /// Separation candidates the oracle accepted.
    pub solutions: Vec<DVector<f64>>,
    /// `gamma` before the first iteration and after each one.
    pub gamma_history: Vec<f64>,
    /// 1-based iteration numbers that produced a cut.
    pub sepa_rounds: Vec<usize>,
    pub f_history: Vec<DVector<f64>>,
    pub q_history: Vec<DVector<f64>>,
    pub iterations: usize,
    pub primal_steps: usize,
    pub dual_steps: usize,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

/// One row of the per-iteration trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceRow {
    pub iteration: usize,
    pub gamma: f64,
    /// `max_i (f_i - q_i)`, the dominance gap.
    pub gap: f64,
    /// Whether this iteration separated a cut.
    pub separated: bool,
}

impl PackingRun {
    #[inline]
    pub fn converged(&self) -> bool {
        self.outcome == Outcome::Converged
    }

    /// Cuts found by the oracle, without the initial zero vector.
    pub fn cuts(&self) -> &[DVector<f64>] {
        self.separated.get(1..).unwrap_or(&[])
    }

    /// State after every iteration, starting with the initial one (iteration 0).
    pub fn trace(&self) -> Vec<TraceRow> {
        self.gamma_history
            .iter()
            .zip(self.f_history.iter().zip(&self.q_history))
            .enumerate()
            .map(|(iteration, (&gamma, (f, q)))| TraceRow {
                iteration,
                gamma,
                gap: (f - q).max(),
                separated: self.sepa_rounds.contains(&iteration),
            })
            .collect()
    }
}

/// Objective values of an LP cut loop, one per round.
#[derive(Clone, Debug)]
pub struct CutLoopRun {
    pub obj_values: Vec<f64>,
    pub cuts_added: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PackingError {
    InvalidLowerBound {
        lbopt: f64,
    },
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    NonPositiveTau {
        iteration: usize,
        tau: f64,
    },
    NonPositiveGamma {
        iteration: usize,
        gamma: f64,
    },
    NonFinite {
        what: &'static str,
    },
    /// The relaxation had no optimal solution to separate.
    NotOptimal {
        round: usize,
    },
    Solver(SolverError),
    Projection(ProjectionError),
}

impl fmt::Display for PackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLowerBound { lbopt } => {
                write!(f, "lower bound must be finite and positive, got {lbopt}")
            }
            Self::DimensionMismatch {
                what,
                expected,
                found,
            } => write!(f, "{what} has dimension {found}, expected {expected}"),
            Self::NonPositiveTau { iteration, tau } => {
                write!(f, "tau = {tau} is not positive at iteration {iteration}")
            }
            Self::NonPositiveGamma { iteration, gamma } => write!(
                f,
                "feasible point has objective {gamma} at iteration {iteration}"
            ),
            Self::NonFinite { what } => write!(f, "non-finite value in {what}"),
            Self::NotOptimal { round } => {
                write!(f, "relaxation not solved to optimality in round {round}")
            }
            Self::Solver(err) => write!(f, "solver: {err}"),
            Self::Projection(err) => write!(f, "hull projection: {err}"),
        }
    }
}

impl std::error::Error for PackingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Solver(err) => Some(err),
            Self::Projection(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SolverError> for PackingError {
    fn from(err: SolverError) -> Self {
        Self::Solver(err)
    }
}

impl From<ProjectionError> for PackingError {
    fn from(err: ProjectionError) -> Self {
        Self::Projection(err)
    }
}

//! Mathematical-program capability consumed by oracles and relaxations.
//!
//! Purpose
//! - Hide the concrete LP/MIP engine behind one narrow trait so oracles,
//!   relaxations and tests never branch on solver names.
//! - Keep the model description owned by the backend; callers only hold
//!   `VarId` handles and replace objectives in place between solves.
//!
//! Conventions
//! - Constraints are `Σ coef·x  (<=|>=|==)  rhs`.
//! - `objective_value` is NaN whenever the last solve was not optimal, so
//!   diagnostic callers can proceed without matching on the status.

mod microlp_backend;

use std::fmt;

pub use microlp_backend::MicroLpModel;

/// Handle of a variable inside one model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Continuous,
    Integer,
    Binary,
}

/// Relation between a linear expression and its right-hand side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cmp {
    Le,
    Ge,
    Eq,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Maximize,
    Minimize,
}

/// Outcome of the most recent `optimize` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStatus {
    NotSolved,
    Optimal,
    Infeasible,
    Unbounded,
}

/// Numerical tolerances of one precision profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub feasibility: f64,
    pub dual_feasibility: f64,
    pub rel_gap: f64,
    pub abs_gap: f64,
}

/// Named precision profiles.
///
/// `Standard` serves LP relaxations and separation programs; `Loose` serves the
/// convex-hull projection, which runs every few iterations and only needs
/// a good, not exact, answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolverProfile {
    #[default]
    Standard,
    Loose,
}

impl SolverProfile {
    pub fn tolerances(self) -> Tolerances {
        match self {
            Self::Standard => Tolerances {
                feasibility: 1e-6,
                dual_feasibility: 1e-6,
                rel_gap: 1e-6,
                abs_gap: 1e-9,
            },
            Self::Loose => Tolerances {
                feasibility: 1e-4,
                dual_feasibility: 1e-4,
                rel_gap: 1e-4,
                abs_gap: 1e-5,
            },
        }
    }
}

/// Errors raised by a backend; non-optimal statuses are not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    UnknownVariable { var: VarId, num_vars: usize },
    NonFinite { context: String },
    DimensionMismatch { expected: usize, found: usize },
    Backend { reason: String },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownVariable { var, num_vars } => {
                write!(f, "unknown variable {} (model has {num_vars})", var.0)
            }
            Self::NonFinite { context } => write!(f, "non-finite coefficient in {context}"),
            Self::DimensionMismatch { expected, found } => {
                write!(f, "expected {expected} coefficients, got {found}")
            }
            Self::Backend { reason } => write!(f, "solver backend failed: {reason}"),
        }
    }
}

impl std::error::Error for SolverError {}

/// A mutable optimization model.
pub trait MathProgram: fmt::Debug {
    /// Add a variable with objective coefficient `obj` and bounds `(lb, ub)`.
    /// Use `±infinity()` for absent bounds; binaries ignore `bounds`.
    fn add_var(&mut self, kind: VarKind, obj: f64, bounds: (f64, f64), name: &str) -> VarId;

    fn add_constraint(
        &mut self,
        terms: &[(VarId, f64)],
        cmp: Cmp,
        rhs: f64,
        name: &str,
    ) -> Result<(), SolverError>;

    /// Add a constraint to a model that may already hold a solution.
    fn add_cut(
        &mut self,
        terms: &[(VarId, f64)],
        cmp: Cmp,
        rhs: f64,
        name: &str,
    ) -> Result<(), SolverError> {
        self.discard_solution();
        self.add_constraint(terms, cmp, rhs, name)
    }

    fn set_sense(&mut self, sense: Sense);

    /// Replace the whole objective; variables not listed get coefficient 0.
    fn set_objective(&mut self, terms: &[(VarId, f64)]) -> Result<(), SolverError>;

    fn optimize(&mut self) -> Result<SolveStatus, SolverError>;

    fn status(&self) -> SolveStatus;

    /// Objective value of the last solve, NaN unless `status()` is `Optimal`.
    fn objective_value(&self) -> f64;

    /// Value of `var` in the last optimal solution.
    fn value(&self, var: VarId) -> Option<f64>;

    /// Full solution vector (indexed by `VarId`), NaN-filled unless optimal.
    fn solution(&self) -> Vec<f64>;

    /// Drop any retained solution, e.g. before the model changes.
    fn discard_solution(&mut self);

    fn num_vars(&self) -> usize;

    fn infinity(&self) -> f64 {
        f64::INFINITY
    }
}

/// Solver backend chosen once at configuration time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    #[default]
    MicroLp,
}

impl Backend {
    /// Create an empty model with the given precision profile.
    pub fn create_model(self, profile: SolverProfile) -> Box<dyn MathProgram> {
        match self {
            Self::MicroLp => Box::new(MicroLpModel::new(profile.tolerances())),
        }
    }
}

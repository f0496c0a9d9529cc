//! Approximate packing LPs over combinatorial polytopes.
//!
//! The primal-dual loop in `algorithm` talks to the polytope only through a
//! separation oracle (`oracle`) and certifies its answer against an LP
//! relaxation (`relaxation`). Every model is built through the `solver`
//! capability so the MIP/LP engine is chosen once, at configuration time.
//!
//! Module map
//! - `segment`, `projection`: geometric primitives and the hull projection.
//! - `solver`: `MathProgram` trait and the `microlp` backend.
//! - `graph`, `generate`: instances, weight schemes, synthetic odd-set graphs.
//! - `oracle`: matching (odd-set) and stable-set (clique) separation.
//! - `relaxation`: verification LPs that accumulate cuts.
//! - `algorithm`: `packing_algorithm` and the plain `cut_loop`.

pub mod algorithm;
pub mod generate;
pub mod graph;
pub mod oracle;
pub mod projection;
pub mod relaxation;
pub mod segment;
pub mod solver;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use algorithm::{cut_loop, packing_algorithm, Outcome, PackingCfg, PackingError, PackingRun};
pub use graph::{Graph, Weighting};
pub use oracle::{build_oracle, Family, SeparationOracle};
pub use relaxation::{InitConss, LpRelaxation, VerificationModel};
pub use solver::Backend;

/// Common exports for callers that set up and run a full instance.
pub mod prelude {
    pub use crate::algorithm::{
        cut_loop, packing_algorithm, CutLoopRun, Outcome, PackingCfg, PackingError, PackingRun,
        TraceRow,
    };
    pub use crate::graph::{inner_radius_simplex, Graph, GraphError, Weighting};
    pub use crate::oracle::{build_oracle, Family, MatchingOracle, SeparationOracle, StableSetOracle};
    pub use crate::projection::{closest_point_in_hull, HullMode, ProjectionCfg};
    pub use crate::relaxation::{InitConss, LpRelaxation, VerificationModel};
    pub use crate::solver::{Backend, SolverError, SolverProfile};
    pub use nalgebra::DVector;
}

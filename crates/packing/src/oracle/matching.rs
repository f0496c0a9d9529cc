//! Odd-set separation for the matching polytope.
//!
//! Auxiliary program (fixed after construction):
//!
//! ```text
//! max  Σ_k x_k e_k - p
//! s.t. e_k <= v_i,  e_k <= v_j,  v_i + v_j <= e_k + 1   for edge k = {i, j}
//!      Σ_i v_i = 2p + 1
//!      v, e binary, p integer >= 0
//! ```
//!
//! A positive optimum is the violation of the odd-set inequality of the node set
//! `S = {i : v_i > 1/2}`; scaled to right-hand side 1 its coefficients are
//! `2 / (|S| - 1)` on edges inside `S`.

use nalgebra::DVector;

use super::{check_dim, SeparationOracle};
use crate::graph::{inner_radius_simplex, Graph, Weighting};
use crate::solver::{Backend, Cmp, MathProgram, Sense, SolverError, SolverProfile, VarId, VarKind};

#[derive(Debug)]
pub struct MatchingOracle {
    graph: Graph,
    obj: DVector<f64>,
    inner_radius: f64,
    degree_cuts: Vec<DVector<f64>>,
    model: Box<dyn MathProgram>,
    node_vars: Vec<VarId>,
    edge_vars: Vec<VarId>,
    parity: VarId,
}

impl MatchingOracle {
    pub fn new(graph: &Graph, weighting: Weighting, backend: Backend) -> Result<Self, SolverError> {
        let n = graph.num_nodes();
        let mut model = backend.create_model(SolverProfile::Standard);
        model.set_sense(Sense::Maximize);

        let node_vars: Vec<VarId> = (0..n)
            .map(|i| model.add_var(VarKind::Binary, 0.0, (0.0, 1.0), &format!("v{i}")))
            .collect();
        let edge_vars: Vec<VarId> = (0..graph.num_edges())
            .map(|k| model.add_var(VarKind::Binary, 0.0, (0.0, 1.0), &format!("e{k}")))
            .collect();
        let max_parity = (n.saturating_sub(1) / 2) as f64;
        let parity = model.add_var(VarKind::Integer, -1.0, (0.0, max_parity), "parity");

        let mut odd: Vec<(VarId, f64)> = node_vars.iter().map(|&v| (v, 1.0)).collect();
        odd.push((parity, -2.0));
        model.add_constraint(&odd, Cmp::Eq, 1.0, "select_odd_set")?;

        for (&(i, j), &e) in graph.edges().iter().zip(&edge_vars) {
            let (vi, vj) = (node_vars[i], node_vars[j]);
            model.add_constraint(&[(e, 1.0), (vi, -1.0)], Cmp::Le, 0.0, &format!("edge_{i}_{j}_1"))?;
            model.add_constraint(&[(e, 1.0), (vj, -1.0)], Cmp::Le, 0.0, &format!("edge_{i}_{j}_2"))?;
            model.add_constraint(
                &[(vi, 1.0), (vj, 1.0), (e, -1.0)],
                Cmp::Le,
                1.0,
                &format!("edge_{i}_{j}_3"),
            )?;
        }

        Ok(Self {
            graph: graph.clone(),
            obj: graph.edge_objective(weighting),
            inner_radius: inner_radius_simplex(graph.num_edges()),
            degree_cuts: graph.degree_rows(),
            model,
            node_vars,
            edge_vars,
            parity,
        })
    }

    /// Most violated odd-set inequality: (violation, cut). Violation is NaN when
    /// the auxiliary program has no optimal solution.
    fn odd_set(
        &mut self,
        point: &DVector<f64>,
        precision: f64,
    ) -> Result<(f64, Option<DVector<f64>>), SolverError> {
        let mut terms: Vec<(VarId, f64)> = self
            .edge_vars
            .iter()
            .zip(point.iter())
            .map(|(&e, &x)| (e, x))
            .collect();
        terms.push((self.parity, -1.0));
        self.model.set_objective(&terms)?;
        self.model.optimize()?;

        let violation = self.model.objective_value();
        if !(violation > precision) {
            return Ok((violation, None));
        }
        let in_set: Vec<bool> = self
            .node_vars
            .iter()
            .map(|&v| self.model.value(v).is_some_and(|x| x > 0.5))
            .collect();
        let size = in_set.iter().filter(|&&b| b).count();
        if size < 3 {
            return Ok((violation, None));
        }
        let scale = 2.0 / (size - 1) as f64;
        let cut = DVector::from_iterator(
            self.graph.num_edges(),
            self.graph
                .edges()
                .iter()
                .map(|&(u, v)| if in_set[u] && in_set[v] { scale } else { 0.0 }),
        );
        Ok((violation, Some(cut)))
    }

    /// Node whose degree row is violated by more than `threshold`, the largest first.
    fn degree_violation(&self, point: &DVector<f64>, threshold: f64) -> Option<usize> {
        let mut best = None;
        let mut bar = threshold;
        for v in 0..self.graph.num_nodes() {
            let violation = self.graph.incident_edges(v).map(|k| point[k]).sum::<f64>() - 1.0;
            if violation > bar {
                bar = violation;
                best = Some(v);
            }
        }
        best
    }
}

impl SeparationOracle for MatchingOracle {
    fn objective(&self) -> &DVector<f64> {
        &self.obj
    }

    fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    fn standard_cuts(&self) -> &[DVector<f64>] {
        &self.degree_cuts
    }

    fn separate(
        &mut self,
        point: &DVector<f64>,
        precision: f64,
    ) -> Result<Option<DVector<f64>>, SolverError> {
        check_dim(point, self.graph.num_edges())?;
        let (violation, odd_cut) = self.odd_set(point, precision)?;
        tracing::trace!(violation, found = odd_cut.is_some(), "odd-set separation");

        // A degree row takes over only when strictly more violated than the odd set.
        let threshold = if violation.is_nan() {
            precision
        } else {
            violation.max(precision)
        };
        match self.degree_violation(point, threshold) {
            Some(v) => Ok(Some(self.graph.degree_row(v))),
            None => Ok(odd_cut),
        }
    }
}

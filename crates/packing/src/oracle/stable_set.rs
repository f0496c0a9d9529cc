//! Clique separation for the stable-set polytope.
//!
//! The auxiliary program picks a clique of the graph by forbidding every
//! non-adjacent pair (`v_u + v_w <= 1` for each complement edge). Its optimum
//! under the point as objective is the left-hand side of the most violated
//! clique inequality `Σ_{v∈C} x_v <= 1`.

use nalgebra::DVector;

use super::{check_dim, SeparationOracle};
use crate::graph::{inner_radius_simplex, Graph, Weighting};
use crate::solver::{Backend, Cmp, MathProgram, Sense, SolverError, SolverProfile, VarId, VarKind};

#[derive(Debug)]
pub struct StableSetOracle {
    obj: DVector<f64>,
    inner_radius: f64,
    edge_cuts: Vec<DVector<f64>>,
    model: Box<dyn MathProgram>,
    node_vars: Vec<VarId>,
}

impl StableSetOracle {
    pub fn new(graph: &Graph, weighting: Weighting, backend: Backend) -> Result<Self, SolverError> {
        let n = graph.num_nodes();
        let mut model = backend.create_model(SolverProfile::Standard);
        model.set_sense(Sense::Maximize);
        let node_vars: Vec<VarId> = (0..n)
            .map(|i| model.add_var(VarKind::Binary, 0.0, (0.0, 1.0), &format!("v{i}")))
            .collect();
        for (u, w) in graph.complement_edges() {
            model.add_constraint(
                &[(node_vars[u], 1.0), (node_vars[w], 1.0)],
                Cmp::Le,
                1.0,
                &format!("nonedge_{u}_{w}"),
            )?;
        }
        Ok(Self {
            obj: graph.node_objective(weighting),
            inner_radius: inner_radius_simplex(n),
            edge_cuts: graph.edge_rows(),
            model,
            node_vars,
        })
    }
}

impl SeparationOracle for StableSetOracle {
    fn objective(&self) -> &DVector<f64> {
        &self.obj
    }

    fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    fn standard_cuts(&self) -> &[DVector<f64>] {
        &self.edge_cuts
    }

    fn separate(
        &mut self,
        point: &DVector<f64>,
        precision: f64,
    ) -> Result<Option<DVector<f64>>, SolverError> {
        check_dim(point, self.node_vars.len())?;
        let terms: Vec<(VarId, f64)> = self
            .node_vars
            .iter()
            .zip(point.iter())
            .map(|(&v, &x)| (v, x))
            .collect();
        self.model.set_objective(&terms)?;
        self.model.optimize()?;

        let lhs = self.model.objective_value();
        tracing::trace!(lhs, "clique separation");
        if !(lhs - 1.0 > precision) {
            return Ok(None);
        }
        let cut = DVector::from_iterator(
            self.node_vars.len(),
            self.node_vars
                .iter()
                .map(|&v| f64::from(self.model.value(v).is_some_and(|x| x > 0.5))),
        );
        Ok(Some(cut))
    }
}

//! LP relaxations of the packing problems, used to certify termination.
//!
//! The packing loop only needs `optimize` and `add_cut` from its verification
//! model (`VerificationModel`). `LpRelaxation` is the standard implementation:
//! a continuous LP over the same coordinates as the oracle, warm-started with
//! box and standard rows and tightened by every cut the loop separates.

use nalgebra::DVector;

use crate::graph::Graph;
use crate::oracle::{check_dim, Family, SeparationOracle};
use crate::solver::{Backend, Cmp, MathProgram, Sense, SolverError, SolverProfile, VarId, VarKind};

/// Relaxation consumed by the packing loop.
pub trait VerificationModel {
    /// Optimal value of the current relaxation; NaN when not optimal.
    fn optimize(&mut self) -> Result<f64, SolverError>;

    /// Add the valid inequality `<cut, x> <= 1`.
    fn add_cut(&mut self, cut: &DVector<f64>) -> Result<(), SolverError>;
}

/// Rows the relaxation starts with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InitConss {
    None,
    /// `0 <= x <= 1`.
    Box,
    /// Box rows plus degree rows (matching) or edge rows (stable set).
    #[default]
    Standard,
}

impl InitConss {
    /// The same rows as hull points for the fully corrective projection:
    /// unit vectors for the box, plus the oracle's standard cuts.
    pub fn rows(self, oracle: &dyn SeparationOracle) -> Vec<DVector<f64>> {
        let d = oracle.dim();
        let mut rows = Vec::new();
        if self != InitConss::None {
            rows.extend((0..d).map(|i| DVector::from_fn(d, |j, _| f64::from(i == j))));
        }
        if self == InitConss::Standard {
            rows.extend_from_slice(oracle.standard_cuts());
        }
        rows
    }
}

#[derive(Debug)]
pub struct LpRelaxation {
    model: Box<dyn MathProgram>,
    vars: Vec<VarId>,
    num_cuts: usize,
}

impl LpRelaxation {
    /// Edge LP of the matching polytope. Variables are free unless box rows are added.
    pub fn matching(
        graph: &Graph,
        obj: &DVector<f64>,
        init: InitConss,
        backend: Backend,
    ) -> Result<Self, SolverError> {
        check_dim(obj, graph.num_edges())?;
        let mut model = backend.create_model(SolverProfile::Standard);
        let inf = model.infinity();
        let vars: Vec<VarId> = obj
            .iter()
            .enumerate()
            .map(|(k, &c)| model.add_var(VarKind::Continuous, c, (-inf, inf), &format!("e{k}")))
            .collect();
        if init != InitConss::None {
            add_box_rows(model.as_mut(), &vars)?;
        }
        if init == InitConss::Standard {
            for node in 0..graph.num_nodes() {
                let terms: Vec<(VarId, f64)> =
                    graph.incident_edges(node).map(|k| (vars[k], 1.0)).collect();
                if !terms.is_empty() {
                    model.add_constraint(&terms, Cmp::Le, 1.0, &format!("degree_{node}"))?;
                }
            }
        }
        model.set_sense(Sense::Maximize);
        Ok(Self {
            model,
            vars,
            num_cuts: 0,
        })
    }

    /// Node LP of the stable-set polytope, `x >= 0`.
    pub fn stable_set(
        graph: &Graph,
        obj: &DVector<f64>,
        init: InitConss,
        backend: Backend,
    ) -> Result<Self, SolverError> {
        check_dim(obj, graph.num_nodes())?;
        let mut model = backend.create_model(SolverProfile::Standard);
        let inf = model.infinity();
        let vars: Vec<VarId> = obj
            .iter()
            .enumerate()
            .map(|(v, &c)| model.add_var(VarKind::Continuous, c, (0.0, inf), &format!("v{v}")))
            .collect();
        if init != InitConss::None {
            add_box_rows(model.as_mut(), &vars)?;
        }
        if init == InitConss::Standard {
            for &(u, v) in graph.edges() {
                model.add_constraint(
                    &[(vars[u], 1.0), (vars[v], 1.0)],
                    Cmp::Le,
                    1.0,
                    &format!("edge_{u}_{v}"),
                )?;
            }
        }
        model.set_sense(Sense::Maximize);
        Ok(Self {
            model,
            vars,
            num_cuts: 0,
        })
    }

    pub fn for_family(
        family: Family,
        graph: &Graph,
        obj: &DVector<f64>,
        init: InitConss,
        backend: Backend,
    ) -> Result<Self, SolverError> {
        match family {
            Family::Matching => Self::matching(graph, obj, init, backend),
            Family::StableSet => Self::stable_set(graph, obj, init, backend),
        }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.vars.len()
    }

    pub fn num_cuts(&self) -> usize {
        self.num_cuts
    }

    pub fn optimize(&mut self) -> Result<f64, SolverError> {
        self.model.optimize()?;
        Ok(self.model.objective_value())
    }

    /// Primal solution of the last `optimize`, if it was optimal.
    pub fn solution(&self) -> Option<DVector<f64>> {
        let values: Option<Vec<f64>> = self.vars.iter().map(|&v| self.model.value(v)).collect();
        values.map(DVector::from_vec)
    }

    pub fn add_cut(&mut self, cut: &DVector<f64>) -> Result<(), SolverError> {
        check_dim(cut, self.vars.len())?;
        let terms: Vec<(VarId, f64)> = self.vars.iter().copied().zip(cut.iter().copied()).collect();
        let name = format!("cut_{}", self.num_cuts);
        self.model.add_cut(&terms, Cmp::Le, 1.0, &name)?;
        self.num_cuts += 1;
        Ok(())
    }
}

impl VerificationModel for LpRelaxation {
    fn optimize(&mut self) -> Result<f64, SolverError> {
        LpRelaxation::optimize(self)
    }

    fn add_cut(&mut self, cut: &DVector<f64>) -> Result<(), SolverError> {
        LpRelaxation::add_cut(self, cut)
    }
}

fn add_box_rows(model: &mut dyn MathProgram, vars: &[VarId]) -> Result<(), SolverError> {
    for (i, &x) in vars.iter().enumerate() {
        model.add_constraint(&[(x, 1.0)], Cmp::Le, 1.0, &format!("ub_{i}"))?;
        model.add_constraint(&[(x, 1.0)], Cmp::Ge, 0.0, &format!("lb_{i}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    fn triangle() -> Graph {
        Graph::new(3, &[(0, 1), (0, 2), (1, 2)], None)
    }

    #[test]
    fn matching_relaxation_tightens_with_odd_set_cut() {
        let g = triangle();
        let obj = DVector::from_element(3, 1.0);
        let mut lp = LpRelaxation::matching(&g, &obj, InitConss::Standard, Backend::default())
            .unwrap();
        assert!((lp.optimize().unwrap() - 1.5).abs() < 1e-6);
        let x = lp.solution().unwrap();
        assert!(x.iter().all(|&v| (v - 0.5).abs() < 1e-6));

        lp.add_cut(&dvector![1.0, 1.0, 1.0]).unwrap();
        assert_eq!(lp.num_cuts(), 1);
        assert!(lp.solution().is_none());
        assert!((lp.optimize().unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn box_rows_only() {
        let g = triangle();
        let obj = dvector![1.0, 2.0, 3.0];
        let mut lp = LpRelaxation::matching(&g, &obj, InitConss::Box, Backend::default()).unwrap();
        assert!((lp.optimize().unwrap() - 6.0).abs() < 1e-6);
    }

    #[test]
    fn stable_set_relaxation_on_path() {
        let g = Graph::new(3, &[(0, 1), (1, 2)], None);
        let obj = DVector::from_element(3, 1.0);
        let mut lp = LpRelaxation::stable_set(&g, &obj, InitConss::Standard, Backend::default())
            .unwrap();
        assert_eq!(lp.dim(), 3);
        assert!((lp.optimize().unwrap() - 2.0).abs() < 1e-6);
        lp.add_cut(&dvector![1.0, 1.0, 1.0]).unwrap();
        assert!((lp.optimize().unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn init_rows_for_projection() {
        use crate::graph::Weighting;
        use crate::oracle::MatchingOracle;
        let oracle =
            MatchingOracle::new(&triangle(), Weighting::Instance, Backend::default()).unwrap();
        assert!(InitConss::None.rows(&oracle).is_empty());
        let boxed = InitConss::Box.rows(&oracle);
        assert_eq!(
            boxed,
            vec![
                dvector![1.0, 0.0, 0.0],
                dvector![0.0, 1.0, 0.0],
                dvector![0.0, 0.0, 1.0]
            ]
        );
        let standard = InitConss::Standard.rows(&oracle);
        assert_eq!(standard.len(), 6);
        assert_eq!(standard[3], dvector![1.0, 1.0, 0.0]);
    }

    #[test]
    fn dimension_checks() {
        let g = triangle();
        assert!(LpRelaxation::matching(&g, &dvector![1.0], InitConss::Box, Backend::default())
            .is_err());
        let obj = DVector::from_element(3, 1.0);
        let mut lp =
            LpRelaxation::for_family(Family::StableSet, &g, &obj, InitConss::Box, Backend::MicroLp)
                .unwrap();
        let err = lp.add_cut(&dvector![1.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            SolverError::DimensionMismatch {
                expected: 3,
                found: 2
            }
        );
    }
}

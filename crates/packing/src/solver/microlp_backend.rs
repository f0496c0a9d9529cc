//! `MathProgram` backed by the pure-Rust `microlp` simplex / branch-and-bound.
//!
//! `microlp::Problem` fixes the direction and objective at variable creation,
//! so this backend keeps its own model description and rebuilds a `Problem`
//! on every `optimize`. Objective replacement and cuts are therefore cheap
//! edits of the description.

use microlp::{ComparisonOp, OptimizationDirection, Problem, Variable};

use super::{Cmp, MathProgram, Sense, SolveStatus, SolverError, Tolerances, VarId, VarKind};

#[derive(Clone, Debug)]
struct VarSpec {
    kind: VarKind,
    obj: f64,
    lb: f64,
    ub: f64,
    name: String,
}

#[derive(Clone, Debug)]
struct RowSpec {
    terms: Vec<(VarId, f64)>,
    cmp: Cmp,
    rhs: f64,
    name: String,
}

#[derive(Clone, Debug)]
pub struct MicroLpModel {
    tol: Tolerances,
    sense: Sense,
    vars: Vec<VarSpec>,
    rows: Vec<RowSpec>,
    status: SolveStatus,
    objective: f64,
    values: Vec<f64>,
}

impl MicroLpModel {
    /// Only `tol.feasibility` is honoured (empty-row checks and integral rounding);
    /// microlp exposes no gap or dual tolerances.
    pub fn new(tol: Tolerances) -> Self {
        Self {
            tol,
            sense: Sense::Minimize,
            vars: Vec::new(),
            rows: Vec::new(),
            status: SolveStatus::NotSolved,
            objective: f64::NAN,
            values: Vec::new(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn var_name(&self, var: VarId) -> Option<&str> {
        self.vars.get(var.0).map(|v| v.name.as_str())
    }

    /// Validate ids and coefficients; merge repeated variables (microlp rejects them).
    fn normalize_terms(
        &self,
        terms: &[(VarId, f64)],
        context: &str,
    ) -> Result<Vec<(VarId, f64)>, SolverError> {
        let mut merged: Vec<(VarId, f64)> = Vec::with_capacity(terms.len());
        for &(var, coef) in terms {
            if var.0 >= self.vars.len() {
                return Err(SolverError::UnknownVariable {
                    var,
                    num_vars: self.vars.len(),
                });
            }
            if !coef.is_finite() {
                return Err(SolverError::NonFinite {
                    context: context.to_string(),
                });
            }
            match merged.iter_mut().find(|(v, _)| *v == var) {
                Some((_, c)) => *c += coef,
                None => merged.push((var, coef)),
            }
        }
        merged.retain(|&(_, c)| c != 0.0);
        Ok(merged)
    }

    fn build(&self) -> (Problem, Vec<Variable>) {
        let direction = match self.sense {
            Sense::Maximize => OptimizationDirection::Maximize,
            Sense::Minimize => OptimizationDirection::Minimize,
        };
        let mut problem = Problem::new(direction);
        let lp_vars: Vec<Variable> = self
            .vars
            .iter()
            .map(|v| match v.kind {
                VarKind::Continuous => problem.add_var(v.obj, (v.lb, v.ub)),
                VarKind::Binary => problem.add_binary_var(v.obj),
                VarKind::Integer => problem.add_integer_var(
                    v.obj,
                    (int_bound(v.lb.ceil(), i32::MIN), int_bound(v.ub.floor(), i32::MAX)),
                ),
            })
            .collect();
        for row in self.rows.iter().filter(|r| !r.terms.is_empty()) {
            let op = match row.cmp {
                Cmp::Le => ComparisonOp::Le,
                Cmp::Ge => ComparisonOp::Ge,
                Cmp::Eq => ComparisonOp::Eq,
            };
            let expr: Vec<(Variable, f64)> =
                row.terms.iter().map(|&(v, c)| (lp_vars[v.0], c)).collect();
            problem.add_constraint(expr, op, row.rhs);
        }
        (problem, lp_vars)
    }

    /// Rows without terms reduce to `0 cmp rhs`; a violated one makes the model infeasible.
    fn trivially_infeasible(&self) -> Option<&str> {
        let eps = self.tol.feasibility;
        self.rows
            .iter()
            .filter(|r| r.terms.is_empty())
            .find(|r| match r.cmp {
                Cmp::Le => r.rhs < -eps,
                Cmp::Ge => r.rhs > eps,
                Cmp::Eq => r.rhs.abs() > eps,
            })
            .map(|r| r.name.as_str())
    }

    fn store(&mut self, status: SolveStatus, objective: f64, values: Vec<f64>) -> SolveStatus {
        self.status = status;
        self.objective = objective;
        self.values = values;
        status
    }
}

#[inline]
fn int_bound(x: f64, absent: i32) -> i32 {
    if x.is_finite() {
        // `as` saturates at the i32 range.
        x as i32
    } else {
        absent
    }
}

impl MathProgram for MicroLpModel {
    fn add_var(&mut self, kind: VarKind, obj: f64, bounds: (f64, f64), name: &str) -> VarId {
        let (lb, ub) = match kind {
            VarKind::Binary => (0.0, 1.0),
            _ => bounds,
        };
        self.vars.push(VarSpec {
            kind,
            obj,
            lb,
            ub,
            name: name.to_string(),
        });
        self.discard_solution();
        VarId(self.vars.len() - 1)
    }

    fn add_constraint(
        &mut self,
        terms: &[(VarId, f64)],
        cmp: Cmp,
        rhs: f64,
        name: &str,
    ) -> Result<(), SolverError> {
        if !rhs.is_finite() {
            return Err(SolverError::NonFinite {
                context: format!("right-hand side of {name}"),
            });
        }
        let terms = self.normalize_terms(terms, name)?;
        self.rows.push(RowSpec {
            terms,
            cmp,
            rhs,
            name: name.to_string(),
        });
        Ok(())
    }

    fn set_sense(&mut self, sense: Sense) {
        self.sense = sense;
        self.discard_solution();
    }

    fn set_objective(&mut self, terms: &[(VarId, f64)]) -> Result<(), SolverError> {
        let terms = self.normalize_terms(terms, "objective")?;
        for v in &mut self.vars {
            v.obj = 0.0;
        }
        for (var, coef) in terms {
            self.vars[var.0].obj = coef;
        }
        self.discard_solution();
        Ok(())
    }

    fn optimize(&mut self) -> Result<SolveStatus, SolverError> {
        if let Some(row) = self.trivially_infeasible() {
            tracing::trace!(row, "empty row violated");
            return Ok(self.store(SolveStatus::Infeasible, f64::NAN, Vec::new()));
        }
        if self.vars.is_empty() {
            return Ok(self.store(SolveStatus::Optimal, 0.0, Vec::new()));
        }
        let (problem, lp_vars) = self.build();
        match problem.solve() {
            Ok(sol) => {
                let eps = self.tol.feasibility;
                let values = lp_vars
                    .iter()
                    .zip(&self.vars)
                    .map(|(&lv, spec)| {
                        let x: f64 = sol[lv];
                        let r = x.round();
                        if spec.kind != VarKind::Continuous && (x - r).abs() <= eps {
                            r
                        } else {
                            x
                        }
                    })
                    .collect();
                Ok(self.store(SolveStatus::Optimal, sol.objective(), values))
            }
            Err(microlp::Error::Infeasible) => {
                Ok(self.store(SolveStatus::Infeasible, f64::NAN, Vec::new()))
            }
            Err(microlp::Error::Unbounded) => {
                Ok(self.store(SolveStatus::Unbounded, f64::NAN, Vec::new()))
            }
            Err(other) => {
                self.discard_solution();
                Err(SolverError::Backend {
                    reason: other.to_string(),
                })
            }
        }
    }

    fn status(&self) -> SolveStatus {
        self.status
    }

    fn objective_value(&self) -> f64 {
        match self.status {
            SolveStatus::Optimal => self.objective,
            _ => f64::NAN,
        }
    }

    fn value(&self, var: VarId) -> Option<f64> {
        match self.status {
            SolveStatus::Optimal => self.values.get(var.0).copied(),
            _ => None,
        }
    }

    fn solution(&self) -> Vec<f64> {
        match self.status {
            SolveStatus::Optimal => self.values.clone(),
            _ => vec![f64::NAN; self.vars.len()],
        }
    }

    fn discard_solution(&mut self) {
        self.status = SolveStatus::NotSolved;
        self.objective = f64::NAN;
        self.values.clear();
    }

    fn num_vars(&self) -> usize {
        self.vars.len()
    }
}

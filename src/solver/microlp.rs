use log::trace;
use microlp::{ComparisonOp, OptimizationDirection, Problem};
use typed_index_collections::TiVec;

use crate::lp::{CanonicalModel, Col};

use super::{Direction, SolveResult, SolveStatus, Solver};

/// Adapter over the pure-Rust `microlp` simplex implementation. Does not
/// produce dual values.
#[derive(Debug, Default, Clone, Copy)]
pub struct MicrolpSolver;

impl Solver for MicrolpSolver {
    fn solve(&mut self, model: &CanonicalModel, direction: Direction) -> SolveResult {
        trace!(
            "handing `{}` to microlp ({} columns, {} rows)",
            model.name(),
            model.num_columns(),
            model.num_rows()
        );

        let mut problem = Problem::new(match direction {
            Direction::Minimize => OptimizationDirection::Minimize,
            Direction::Maximize => OptimizationDirection::Maximize,
        });

        // microlp understands IEEE infinities directly, so those are the
        // sentinel of choice here.
        let (lower, upper) = model.column_bounds_dense(f64::INFINITY);
        let vars: TiVec<Col, microlp::Variable> = model
            .columns()
            .map(|c| problem.add_var(model.objective()[c], (lower[*c], upper[*c])))
            .collect();

        let mut rows: Vec<Vec<(microlp::Variable, f64)>> = vec![Vec::new(); model.num_rows()];
        for t in model.triplets() {
            rows[*t.row].push((vars[t.col], t.value));
        }

        for r in model.rows() {
            let lhs = rows[*r].as_slice();
            match (model.row_lower()[r], model.row_upper()[r]) {
                (Some(l), Some(u)) if l == u => problem.add_constraint(lhs, ComparisonOp::Eq, l),
                (Some(l), Some(u)) => {
                    problem.add_constraint(lhs, ComparisonOp::Ge, l);
                    problem.add_constraint(lhs, ComparisonOp::Le, u);
                }
                (Some(l), None) => problem.add_constraint(lhs, ComparisonOp::Ge, l),
                (None, Some(u)) => problem.add_constraint(lhs, ComparisonOp::Le, u),
                (None, None) => {}
            }
        }

        match problem.solve() {
            Ok(solution) => {
                let columns: TiVec<Col, f64> =
                    vars.iter().map(|&v| *solution.var_value(v)).collect();
                SolveResult::optimal(solution.objective(), columns, None)
            }
            Err(microlp::Error::Infeasible) => {
                SolveResult::without_solution(SolveStatus::Infeasible)
            }
            Err(microlp::Error::Unbounded) => SolveResult::without_solution(SolveStatus::Unbounded),
            Err(other) => SolveResult::without_solution(SolveStatus::Error(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::{Bounds, Constraint, LinearExpr, Model, Relation};

    /// maximize x subject to x >= 1, x in [0, inf): unbounded above.
    fn open_ended_model() -> CanonicalModel {
        let mut model = Model::new("open");
        let items = model.define_set("items", ["a"]).unwrap();
        model
            .declare_vars("x", items, Bounds::non_negative())
            .unwrap();
        model
            .equation("floor", Relation::GreaterEqual, |s| {
                let mut lhs = LinearExpr::new();
                lhs.add(s.var("x", &"a".into())?, 1.0);
                Ok(Constraint { lhs, rhs: 1.0 })
            })
            .unwrap();
        model.set_objective("reach", |s| {
            let mut expr = LinearExpr::new();
            expr.add(s.var("x", &"a".into())?, 1.0);
            Ok(expr)
        });
        model.compile().unwrap()
    }

    #[test]
    fn unbounded_is_a_status_not_an_error() {
        let compiled = open_ended_model();
        let result = MicrolpSolver.solve(&compiled, Direction::Maximize);

        assert_eq!(result.status, SolveStatus::Unbounded);
        assert!(result.objective.is_none());
        assert!(result.columns.is_none());
    }

    #[test]
    fn minimizing_the_same_model_is_optimal_at_the_floor() {
        let compiled = open_ended_model();
        let result = MicrolpSolver.solve(&compiled, Direction::Minimize);

        assert_eq!(result.status, SolveStatus::Optimal);
        let columns = result.columns.unwrap();
        assert!((columns[Col::from(0)] - 1.0).abs() < 1e-9);
        assert!((result.objective.unwrap() - 1.0).abs() < 1e-9);
    }
}

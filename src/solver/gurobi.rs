use grb::prelude::*;
use log::trace;

use crate::lp::CanonicalModel;

use super::{Direction, SolveResult, SolveStatus, Solver};

/// Adapter over the Gurobi `grb` bindings. Reports row duals from the
/// `Pi` attribute.
#[derive(Debug, Default)]
pub struct GurobiSolver;

impl Solver for GurobiSolver {
    fn solve(&mut self, model: &CanonicalModel, direction: Direction) -> SolveResult {
        match try_solve(model, direction) {
            Ok(result) => result,
            Err(e) => SolveResult::without_solution(SolveStatus::Error(e.to_string())),
        }
    }
}

fn try_solve(canonical: &CanonicalModel, direction: Direction) -> grb::Result<SolveResult> {
    trace!(
        "handing `{}` to gurobi ({} columns, {} rows)",
        canonical.name(),
        canonical.num_columns(),
        canonical.num_rows()
    );

    let mut model = Model::new(canonical.name())?;
    model.set_param(param::OutputFlag, 0)?;

    // Gurobi treats IEEE infinities as unbounded sides.
    let (lower, upper) = canonical.column_bounds_dense(f64::INFINITY);
    let mut vars: Vec<Var> = Vec::with_capacity(canonical.num_columns());
    for c in canonical.columns() {
        vars.push(model.add_var(
            &canonical.column_names()[c],
            VarType::Continuous,
            0.0,
            lower[*c],
            upper[*c],
            std::iter::empty(),
        )?);
    }

    let objective = canonical
        .columns()
        .map(|c| canonical.objective()[c] * vars[*c])
        .grb_sum();
    model.set_objective(
        objective,
        match direction {
            Direction::Minimize => Minimize,
            Direction::Maximize => Maximize,
        },
    )?;

    let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); canonical.num_rows()];
    for t in canonical.triplets() {
        rows[*t.row].push((*t.col, t.value));
    }

    let mut constrs: Vec<Constr> = Vec::with_capacity(canonical.num_rows());
    for r in canonical.rows() {
        let lhs: Expr = rows[*r].iter().map(|&(c, v)| v * vars[c]).grb_sum();
        let name = canonical.row_names()[r].as_str();
        let constr = match (canonical.row_lower()[r], canonical.row_upper()[r]) {
            (Some(l), Some(u)) if l == u => model.add_constr(name, c!(lhs == l))?,
            (Some(l), Some(u)) => {
                let lower = model.add_constr(&format!("{}_lb", name), c!(lhs.clone() >= l))?;
                model.add_constr(&format!("{}_ub", name), c!(lhs <= u))?;
                lower
            }
            (Some(l), None) => model.add_constr(name, c!(lhs >= l))?,
            (None, Some(u)) => model.add_constr(name, c!(lhs <= u))?,
            (None, None) => model.add_constr(name, c!(lhs >= f64::NEG_INFINITY))?,
        };
        constrs.push(constr);
    }

    model.optimize()?;

    let result = match model.status()? {
        Status::Optimal => {
            let objective = model.get_attr(attr::ObjVal)?;
            let columns = model.get_obj_attr_batch(attr::X, vars)?;
            let duals = model.get_obj_attr_batch(attr::Pi, constrs)?;
            SolveResult::optimal(objective, columns.into(), Some(duals.into()))
        }
        Status::Infeasible => SolveResult::without_solution(SolveStatus::Infeasible),
        Status::Unbounded | Status::InfOrUnbd => {
            SolveResult::without_solution(SolveStatus::Unbounded)
        }
        other => SolveResult::without_solution(SolveStatus::Error(format!(
            "gurobi returned status {:?}",
            other
        ))),
    };
    Ok(result)
}

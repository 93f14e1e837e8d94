//! Label-keyed solution reporting. A presentation layer never needs to
//! know internal column ordering: every value is keyed by the variable
//! block's name and the original index-set label.

use std::fmt;

use serde::Serialize;

use crate::lp::{Label, Model};
use crate::solver::{SolveResult, SolveStatus};

/// One resolved variable value.
#[derive(Debug, Clone, Serialize)]
pub struct VariableValue {
    pub block: String,
    /// `None` for scalar variables.
    pub label: Option<Label>,
    pub value: f64,
}

/// The outcome of a solve, resolved back to the model's own vocabulary.
/// Values are present only when the solve was optimal.
#[derive(Debug, Clone, Serialize)]
pub struct SolutionReport {
    pub model: String,
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub values: Vec<VariableValue>,
}

impl SolutionReport {
    pub fn new(model: &Model, result: &SolveResult) -> Self {
        let values = match (&result.status, &result.columns) {
            (SolveStatus::Optimal, Some(columns)) => model
                .variables()
                .map(|(col, block, label)| VariableValue {
                    block: block.to_string(),
                    label: label.cloned(),
                    value: columns[col],
                })
                .collect(),
            _ => Vec::new(),
        };

        SolutionReport {
            model: model.name().to_string(),
            status: result.status.clone(),
            objective: result.objective,
            values,
        }
    }

    /// The resolved value of `block[label]`, if the solve produced one.
    pub fn value(&self, block: &str, label: &Label) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.block == block && v.label.as_ref() == Some(label))
            .map(|v| v.value)
    }

    /// The resolved value of the scalar variable `block`.
    pub fn scalar_value(&self, block: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.block == block && v.label.is_none())
            .map(|v| v.value)
    }
}

impl fmt::Display for SolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status: {}", self.status)?;
        if let Some(objective) = self.objective {
            writeln!(f, "Objective: {}", objective)?;
        }
        for v in &self.values {
            match &v.label {
                Some(label) => writeln!(f, "  {}[{}] = {}", v.block, label, v.value)?,
                None => writeln!(f, "  {} = {}", v.block, v.value)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::{Bounds, Col, Constraint, LinearExpr, Model, Relation};
    use crate::solver::SolveResult;
    use typed_index_collections::TiVec;

    fn model() -> Model {
        let mut model = Model::new("pair");
        let items = model.define_set("items", ["a", "b"]).unwrap();
        model
            .declare_vars("x", items, Bounds::non_negative())
            .unwrap();
        model
            .equation("sum", Relation::Equal, |s| {
                let mut lhs = LinearExpr::new();
                for label in s.set("items")?.labels() {
                    lhs.add(s.var("x", label)?, 1.0);
                }
                Ok(Constraint { lhs, rhs: 1.0 })
            })
            .unwrap();
        model.set_objective("cost", |s| {
            let mut expr = LinearExpr::new();
            expr.add(s.var("x", &"a".into())?, 1.0);
            expr.add(s.var("x", &"b".into())?, 2.0);
            Ok(expr)
        });
        model
    }

    #[test]
    fn values_are_keyed_by_label_not_column() {
        let model = model();
        let columns: TiVec<Col, f64> = vec![0.25, 0.75].into();
        let report = SolutionReport::new(&model, &SolveResult::optimal(1.75, columns, None));

        assert_eq!(report.value("x", &"a".into()), Some(0.25));
        assert_eq!(report.value("x", &"b".into()), Some(0.75));
        assert_eq!(report.value("x", &"c".into()), None);
        assert_eq!(report.objective, Some(1.75));
    }

    #[test]
    fn non_optimal_results_carry_no_values() {
        let model = model();
        let report = SolutionReport::new(
            &model,
            &SolveResult::without_solution(SolveStatus::Infeasible),
        );

        assert_eq!(report.status, SolveStatus::Infeasible);
        assert!(report.values.is_empty());
        assert!(report.objective.is_none());
    }
}

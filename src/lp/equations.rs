use std::collections::HashMap;

use derive_more::{Deref, From, Into};
use itertools::Itertools;
use log::trace;

use super::error::{CompilationError, Error};
use super::parameters::ParameterStore;
use super::sets::{IndexSet, Label, SetId, SetRegistry};
use super::variables::{Col, VariableCatalog};

/// A row of the canonical model. Rows are dense 0-based, assigned in family
/// declaration order, then governing-set order within a family.
#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct Row(usize);

/// How a row's left-hand side relates to its right-hand scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Equal,
    GreaterEqual,
    LessEqual,
}

impl Relation {
    /// Derive row bounds from the right-hand value. Equalities pin both
    /// sides; inequalities leave the far side unbounded.
    pub fn row_bounds(&self, rhs: f64) -> (Option<f64>, Option<f64>) {
        match self {
            Relation::Equal => (Some(rhs), Some(rhs)),
            Relation::GreaterEqual => (Some(rhs), None),
            Relation::LessEqual => (None, Some(rhs)),
        }
    }
}

/// A linear combination of columns. Adding a column that is already present
/// accumulates into its coefficient, so two algebraic terms referencing the
/// same variable sum rather than overwrite.
#[derive(Debug, Clone, Default)]
pub struct LinearExpr {
    terms: HashMap<Col, f64>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, col: Col, coeff: f64) {
        *self.terms.entry(col).or_insert(0.0) += coeff;
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Column-sorted terms with exact zeros dropped.
    pub(crate) fn into_sorted(self) -> Vec<(Col, f64)> {
        self.terms
            .into_iter()
            .filter(|&(_, coeff)| coeff != 0.0)
            .sorted_by_key(|&(col, _)| col)
            .collect()
    }
}

impl FromIterator<(Col, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (Col, f64)>>(iter: I) -> Self {
        let mut expr = LinearExpr::new();
        for (col, coeff) in iter {
            expr.add(col, coeff);
        }
        expr
    }
}

/// One concrete constraint produced by a family body: a left-hand linear
/// expression against a right-hand scalar.
pub struct Constraint {
    pub lhs: LinearExpr,
    pub rhs: f64,
}

/// Read-only view of the model's sets, parameters and variables, handed to
/// family bodies during expansion.
pub struct Scope<'a> {
    pub(crate) sets: &'a SetRegistry,
    pub(crate) params: &'a ParameterStore,
    pub(crate) vars: &'a VariableCatalog,
}

impl<'a> Scope<'a> {
    pub fn set(&self, name: &str) -> Result<&'a IndexSet, Error> {
        Ok(self.sets.get(self.sets.lookup(name)?))
    }

    pub fn param(&self, name: &str, key: &[Label]) -> Result<f64, Error> {
        Ok(self.params.get(self.sets, name, key)?)
    }

    /// An arity-0 parameter.
    pub fn scalar_param(&self, name: &str) -> Result<f64, Error> {
        self.param(name, &[])
    }

    pub fn var(&self, name: &str, label: &Label) -> Result<Col, Error> {
        Ok(self.vars.column(self.sets, name, label)?)
    }

    pub fn scalar_var(&self, name: &str) -> Result<Col, Error> {
        Ok(self.vars.scalar_column(name)?)
    }
}

pub(crate) enum FamilyKind {
    /// Empty governing set: exactly one row.
    Scalar(Box<dyn Fn(&Scope<'_>) -> Result<Constraint, Error>>),
    /// One row per label of the governing set, in declaration order.
    Indexed(
        SetId,
        Box<dyn Fn(&Scope<'_>, &Label) -> Result<Constraint, Error>>,
    ),
}

/// A symbolic row template replicated over its governing index set.
pub struct EquationFamily {
    pub(crate) name: String,
    pub(crate) relation: Relation,
    pub(crate) kind: FamilyKind,
}

impl EquationFamily {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_scalar(&self) -> bool {
        matches!(self.kind, FamilyKind::Scalar(_))
    }
}

/// One expanded row, ready for assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRow {
    pub row: Row,
    pub name: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    /// Column-sorted, coalesced coefficients.
    pub coefficients: Vec<(Col, f64)>,
}

fn finish(
    family: &EquationFamily,
    label: Option<&Label>,
    constraint: Constraint,
    columns: usize,
    row: Row,
) -> Result<CompiledRow, Error> {
    let coefficients = constraint.lhs.into_sorted();

    for &(col, _) in &coefficients {
        if *col >= columns {
            return Err(CompilationError::UnboundVariableReference {
                equation: family.name.clone(),
                column: *col,
            }
            .into());
        }
    }
    if coefficients.is_empty() {
        return Err(CompilationError::EmptyExpression {
            equation: family.name.clone(),
            label: label.cloned(),
        }
        .into());
    }

    let (lower, upper) = family.relation.row_bounds(constraint.rhs);
    let name = match label {
        Some(label) => format!("{}[{}]", family.name, label),
        None => family.name.clone(),
    };

    Ok(CompiledRow {
        row,
        name,
        lower,
        upper,
        coefficients,
    })
}

/// Expand every family into concrete rows, in declaration order.
pub(crate) fn expand(
    families: &[EquationFamily],
    scope: &Scope<'_>,
    columns: usize,
) -> Result<Vec<CompiledRow>, Error> {
    let mut rows = Vec::new();

    for family in families {
        let first = rows.len();
        match &family.kind {
            FamilyKind::Scalar(body) => {
                let constraint = body(scope)?;
                rows.push(finish(family, None, constraint, columns, Row(rows.len()))?);
            }
            FamilyKind::Indexed(set, body) => {
                for label in scope.sets.get(*set).labels() {
                    let constraint = body(scope, label)?;
                    rows.push(finish(
                        family,
                        Some(label),
                        constraint,
                        columns,
                        Row(rows.len()),
                    )?);
                }
            }
        }
        trace!(
            "expanded equation family `{}` into {} row(s)",
            family.name,
            rows.len() - first
        );
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::variables::Bounds;

    fn scope_parts() -> (SetRegistry, ParameterStore, VariableCatalog) {
        let mut registry = SetRegistry::new();
        let feeds = registry.define("feeds", ["A", "B"]).unwrap();
        let mut params = ParameterStore::new();
        params.declare(&mut registry, "weight", &[feeds]).unwrap();
        params.set(&registry, "weight", &["A".into()], 2.0).unwrap();
        params.set(&registry, "weight", &["B".into()], 3.0).unwrap();
        let mut vars = VariableCatalog::new();
        vars.declare(&mut registry, "x", feeds, Bounds::non_negative())
            .unwrap();
        (registry, params, vars)
    }

    fn family(
        relation: Relation,
        body: impl Fn(&Scope<'_>) -> Result<Constraint, Error> + 'static,
    ) -> EquationFamily {
        EquationFamily {
            name: "row".to_string(),
            relation,
            kind: FamilyKind::Scalar(Box::new(body)),
        }
    }

    #[test]
    fn relation_determines_row_bounds() {
        assert_eq!(Relation::Equal.row_bounds(5.0), (Some(5.0), Some(5.0)));
        assert_eq!(Relation::GreaterEqual.row_bounds(5.0), (Some(5.0), None));
        assert_eq!(Relation::LessEqual.row_bounds(5.0), (None, Some(5.0)));
    }

    #[test]
    fn duplicate_terms_sum_into_one_coefficient() {
        let (registry, params, vars) = scope_parts();
        let scope = Scope {
            sets: &registry,
            params: &params,
            vars: &vars,
        };

        // Two algebraic terms touching x[A]: 1.0 direct plus its weight.
        let families = vec![family(Relation::Equal, |s| {
            let mut lhs = LinearExpr::new();
            let a = s.var("x", &"A".into())?;
            lhs.add(a, 1.0);
            lhs.add(a, s.param("weight", &["A".into()])?);
            Ok(Constraint { lhs, rhs: 1.0 })
        })];

        let rows = expand(&families, &scope, vars.columns()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].coefficients, vec![(Col::from(0), 3.0)]);
    }

    #[test]
    fn terms_cancelling_to_zero_leave_an_empty_row() {
        let (registry, params, vars) = scope_parts();
        let scope = Scope {
            sets: &registry,
            params: &params,
            vars: &vars,
        };

        let families = vec![family(Relation::GreaterEqual, |s| {
            let mut lhs = LinearExpr::new();
            let a = s.var("x", &"A".into())?;
            lhs.add(a, 1.0);
            lhs.add(a, -1.0);
            Ok(Constraint { lhs, rhs: 0.0 })
        })];

        let err = expand(&families, &scope, vars.columns()).unwrap_err();
        assert_eq!(
            err,
            Error::Compilation(CompilationError::EmptyExpression {
                equation: "row".to_string(),
                label: None,
            })
        );
    }

    #[test]
    fn out_of_catalog_columns_are_rejected() {
        let (registry, params, vars) = scope_parts();
        let scope = Scope {
            sets: &registry,
            params: &params,
            vars: &vars,
        };

        let families = vec![family(Relation::Equal, |_| {
            let mut lhs = LinearExpr::new();
            lhs.add(Col::from(7), 1.0);
            Ok(Constraint { lhs, rhs: 0.0 })
        })];

        let err = expand(&families, &scope, vars.columns()).unwrap_err();
        assert_eq!(
            err,
            Error::Compilation(CompilationError::UnboundVariableReference {
                equation: "row".to_string(),
                column: 7,
            })
        );
    }

    #[test]
    fn indexed_families_expand_in_set_order() {
        let (registry, params, vars) = scope_parts();
        let scope = Scope {
            sets: &registry,
            params: &params,
            vars: &vars,
        };

        let set = registry.lookup("feeds").unwrap();
        let families = vec![EquationFamily {
            name: "cap".to_string(),
            relation: Relation::LessEqual,
            kind: FamilyKind::Indexed(
                set,
                Box::new(|s: &Scope<'_>, label: &Label| {
                    let mut lhs = LinearExpr::new();
                    lhs.add(s.var("x", label)?, 1.0);
                    Ok(Constraint { lhs, rhs: 10.0 })
                }),
            ),
        }];

        let rows = expand(&families, &scope, vars.columns()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "cap[A]");
        assert_eq!(rows[1].name, "cap[B]");
        assert_eq!(rows[0].row, Row::from(0));
        assert_eq!(rows[1].row, Row::from(1));
        assert_eq!(rows[0].lower, None);
        assert_eq!(rows[0].upper, Some(10.0));
    }
}

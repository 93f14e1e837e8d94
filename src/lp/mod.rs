//! The algebraic-model-to-matrix-form compiler.
//!
//! A [`Model`] collects index sets, parameters, variable blocks and
//! equation families, then [`Model::compile`] expands the families into
//! concrete rows and assembles the canonical LP form a solver consumes:
//! objective vector, column/row bounds and a triplet-form constraint
//! matrix. The pipeline is a pure data transformation; it runs to
//! completion synchronously and a builder must not be shared across
//! threads.

pub mod equations;
pub mod error;
pub mod matrix;
pub mod parameters;
pub mod sets;
pub mod variables;

use log::trace;
use typed_index_collections::TiVec;

pub use equations::{CompiledRow, Constraint, LinearExpr, Relation, Row, Scope};
pub use error::{CompilationError, Error, ModelDefinitionError};
pub use matrix::{CanonicalModel, Triplet};
pub use sets::{IndexSet, Label, SetId, SetRegistry};
pub use variables::{Bounds, Col, VariableCatalog};

use equations::{EquationFamily, FamilyKind};
use parameters::ParameterStore;

/// Knobs for [`Model::compile`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Permit variables that appear in no row and not in the objective.
    /// Orphans are then logged instead of failing compilation.
    pub allow_orphan_variables: bool,
}

enum ObjectiveKind {
    /// The objective coefficients come from an expression evaluated once.
    Direct {
        name: String,
        body: Box<dyn Fn(&Scope<'_>) -> Result<LinearExpr, Error>>,
    },
    /// The objective is a free variable pinned by a scalar equality row;
    /// the canonical model flags that row and column for the adapter.
    ViaRow { variable: Col, family: String },
}

/// Builder for one linear program. All inputs are declared up front; there
/// is no incremental compilation.
pub struct Model {
    name: String,
    sets: SetRegistry,
    params: ParameterStore,
    vars: VariableCatalog,
    families: Vec<EquationFamily>,
    objective: Option<ObjectiveKind>,
    options: CompileOptions,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Model {
            name: name.to_string(),
            sets: SetRegistry::new(),
            params: ParameterStore::new(),
            vars: VariableCatalog::new(),
            families: Vec::new(),
            objective: None,
            options: CompileOptions::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_options(&mut self, options: CompileOptions) {
        self.options = options;
    }

    /// Define the ordered index set `name`.
    pub fn define_set<L: Into<Label>>(
        &mut self,
        name: &str,
        labels: impl IntoIterator<Item = L>,
    ) -> Result<SetId, Error> {
        Ok(self.sets.define(name, labels)?)
    }

    pub fn index_set(&self, id: SetId) -> &IndexSet {
        self.sets.get(id)
    }

    /// Declare a parameter dimensioned over `dims` (empty for a scalar).
    pub fn declare_param(&mut self, name: &str, dims: &[SetId]) -> Result<(), Error> {
        Ok(self.params.declare(&mut self.sets, name, dims)?)
    }

    pub fn set_param(&mut self, name: &str, key: &[Label], value: f64) -> Result<(), Error> {
        Ok(self.params.set(&self.sets, name, key, value)?)
    }

    /// Declare one non-negative/bounded variable per label of `set`.
    pub fn declare_vars(&mut self, name: &str, set: SetId, bounds: Bounds) -> Result<Col, Error> {
        Ok(self.vars.declare(&mut self.sets, name, set, bounds)?)
    }

    /// Declare a single free-standing variable.
    pub fn declare_scalar_var(&mut self, name: &str, bounds: Bounds) -> Result<Col, Error> {
        Ok(self.vars.declare_scalar(name, bounds)?)
    }

    /// The column of `name[label]`, for callers that hold handles.
    pub fn column(&self, name: &str, label: &Label) -> Result<Col, Error> {
        Ok(self.vars.column(&self.sets, name, label)?)
    }

    fn push_family(
        &mut self,
        name: &str,
        relation: Relation,
        kind: FamilyKind,
    ) -> Result<(), Error> {
        if self.families.iter().any(|f| f.name == name) {
            return Err(ModelDefinitionError::Redeclaration {
                kind: "equation family",
                name: name.to_string(),
            }
            .into());
        }
        self.families.push(EquationFamily {
            name: name.to_string(),
            relation,
            kind,
        });
        Ok(())
    }

    /// Declare an equation family with an empty governing set: exactly one
    /// row, whose body is evaluated once at compile time.
    pub fn equation(
        &mut self,
        name: &str,
        relation: Relation,
        body: impl Fn(&Scope<'_>) -> Result<Constraint, Error> + 'static,
    ) -> Result<(), Error> {
        self.push_family(name, relation, FamilyKind::Scalar(Box::new(body)))
    }

    /// Declare an equation family governed by `set`: one row per label, in
    /// the set's declared order.
    pub fn equation_over(
        &mut self,
        name: &str,
        set: SetId,
        relation: Relation,
        body: impl Fn(&Scope<'_>, &Label) -> Result<Constraint, Error> + 'static,
    ) -> Result<(), Error> {
        self.sets.mark_referenced(set);
        self.push_family(name, relation, FamilyKind::Indexed(set, Box::new(body)))
    }

    /// Declare the objective as a linear expression evaluated once.
    pub fn set_objective(
        &mut self,
        name: &str,
        body: impl Fn(&Scope<'_>) -> Result<LinearExpr, Error> + 'static,
    ) {
        self.objective = Some(ObjectiveKind::Direct {
            name: name.to_string(),
            body: Box::new(body),
        });
    }

    /// Route the objective through `variable`, which must be pinned by the
    /// scalar equality family `family`. The assembled model carries the
    /// (row, column) flag so the adapter knows which row is the objective.
    pub fn set_objective_variable(&mut self, variable: Col, family: &str) {
        self.objective = Some(ObjectiveKind::ViaRow {
            variable,
            family: family.to_string(),
        });
    }

    /// Read-only view over sets, parameters and variables, as seen by
    /// equation bodies.
    pub fn scope(&self) -> Scope<'_> {
        Scope {
            sets: &self.sets,
            params: &self.params,
            vars: &self.vars,
        }
    }

    /// Every column with its block name and label, in column order.
    pub fn variables(&self) -> impl Iterator<Item = (Col, &str, Option<&Label>)> {
        self.vars.iter_columns(&self.sets)
    }

    fn build_objective(
        &self,
        scope: &Scope<'_>,
        rows: &[CompiledRow],
    ) -> Result<(TiVec<Col, f64>, Option<(Row, Col)>), Error> {
        let columns = self.vars.columns();
        let mut dense: TiVec<Col, f64> = vec![0.0; columns].into();

        match &self.objective {
            None => Err(CompilationError::MissingObjective.into()),
            Some(ObjectiveKind::Direct { name, body }) => {
                let terms = body(scope)?.into_sorted();
                if terms.is_empty() {
                    return Err(CompilationError::EmptyExpression {
                        equation: name.clone(),
                        label: None,
                    }
                    .into());
                }
                for (col, coeff) in terms {
                    if *col >= columns {
                        return Err(CompilationError::UnboundVariableReference {
                            equation: name.clone(),
                            column: *col,
                        }
                        .into());
                    }
                    dense[col] = coeff;
                }
                Ok((dense, None))
            }
            Some(ObjectiveKind::ViaRow { variable, family }) => {
                let valid = self
                    .families
                    .iter()
                    .find(|f| f.name == *family)
                    .map(|f| f.is_scalar() && f.relation == Relation::Equal)
                    .unwrap_or(false);
                if !valid {
                    return Err(CompilationError::ObjectiveRowInvalid {
                        equation: family.clone(),
                    }
                    .into());
                }
                // A scalar family's single row carries the family's name.
                let row = rows
                    .iter()
                    .find(|r| r.name == *family)
                    .map(|r| r.row)
                    .ok_or_else(|| CompilationError::ObjectiveRowInvalid {
                        equation: family.clone(),
                    })?;
                if **variable >= columns {
                    return Err(CompilationError::UnboundVariableReference {
                        equation: family.clone(),
                        column: **variable,
                    }
                    .into());
                }
                dense[*variable] = 1.0;
                Ok((dense, Some((row, *variable))))
            }
        }
    }

    /// Expand all equation families and assemble the canonical model.
    /// Aborts on the first definition or compilation error; a partial
    /// model is never returned.
    pub fn compile(&self) -> Result<CanonicalModel, Error> {
        trace!("compiling model `{}`", self.name);

        let scope = self.scope();
        let rows = equations::expand(&self.families, &scope, self.vars.columns())?;
        let (objective, objective_row) = self.build_objective(&scope, &rows)?;

        Ok(matrix::assemble(
            &self.name,
            &self.sets,
            &self.vars,
            rows,
            objective,
            objective_row,
            self.options,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The equality formulation: minimize z subject to z == 2 x[a], with x
    /// pinned so the model is fully determined.
    fn via_row_model() -> Model {
        let mut model = Model::new("via-row");
        let items = model.define_set("items", ["a"]).unwrap();
        model
            .declare_vars("x", items, Bounds::new(Some(1.0), Some(1.0)))
            .unwrap();
        let z = model.declare_scalar_var("z", Bounds::free()).unwrap();

        model
            .equation("cost_def", Relation::Equal, |s| {
                let mut lhs = LinearExpr::new();
                lhs.add(s.scalar_var("z")?, 1.0);
                lhs.add(s.var("x", &"a".into())?, -2.0);
                Ok(Constraint { lhs, rhs: 0.0 })
            })
            .unwrap();
        model.set_objective_variable(z, "cost_def");
        model
    }

    #[test]
    fn objective_via_row_is_flagged() {
        let model = via_row_model();
        let compiled = model.compile().unwrap();

        assert_eq!(compiled.num_rows(), 1);
        let (row, col) = compiled.objective_row().unwrap();
        assert_eq!(*row, 0);
        assert_eq!(*col, 1);
        assert_eq!(compiled.objective()[col], 1.0);
        assert_eq!(compiled.objective()[Col::from(0)], 0.0);
    }

    #[test]
    fn objective_row_must_be_a_scalar_equality() {
        let mut model = via_row_model();
        // Re-point the flag at a family that does not exist.
        let z = model.scope().scalar_var("z").unwrap();
        model.set_objective_variable(z, "no_such_family");

        let err = model.compile().unwrap_err();
        assert_eq!(
            err,
            Error::Compilation(CompilationError::ObjectiveRowInvalid {
                equation: "no_such_family".to_string(),
            })
        );
    }

    #[test]
    fn compiling_without_an_objective_fails() {
        let mut model = Model::new("empty");
        let items = model.define_set("items", ["a"]).unwrap();
        model
            .declare_vars("x", items, Bounds::non_negative())
            .unwrap();
        model
            .equation("pin", Relation::Equal, |s| {
                let mut lhs = LinearExpr::new();
                lhs.add(s.var("x", &"a".into())?, 1.0);
                Ok(Constraint { lhs, rhs: 0.0 })
            })
            .unwrap();

        let err = model.compile().unwrap_err();
        assert_eq!(err, Error::Compilation(CompilationError::MissingObjective));
    }

    #[test]
    fn family_names_are_unique() {
        let mut model = Model::new("dup");
        model
            .equation("total", Relation::Equal, |_| {
                Ok(Constraint {
                    lhs: LinearExpr::new(),
                    rhs: 0.0,
                })
            })
            .unwrap();
        let err = model
            .equation("total", Relation::Equal, |_| {
                Ok(Constraint {
                    lhs: LinearExpr::new(),
                    rhs: 0.0,
                })
            })
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Definition(ModelDefinitionError::Redeclaration { .. })
        ));
    }
}

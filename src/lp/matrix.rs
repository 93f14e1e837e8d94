use derive_more::Constructor;
use log::{debug, warn};
use typed_index_collections::TiVec;

use super::equations::{CompiledRow, Row};
use super::error::CompilationError;
use super::sets::SetRegistry;
use super::variables::{Bounds, Col, VariableCatalog};
use super::CompileOptions;

/// One sparse matrix entry.
#[derive(Constructor, Debug, Clone, Copy, PartialEq)]
pub struct Triplet {
    pub row: Row,
    pub col: Col,
    pub value: f64,
}

/// The assembled linear program: objective vector, column and row bounds,
/// and the constraint matrix in triplet form. Duplicate (row, column)
/// pairs never occur; contributions are summed during expansion.
///
/// The model is handed read-only to a solver adapter; bounds use `None`
/// for unbounded sides and are materialized to whatever infinity the back
/// end expects via [`CanonicalModel::column_bounds_dense`] and
/// [`CanonicalModel::row_bounds_dense`].
#[derive(Debug, Clone)]
pub struct CanonicalModel {
    name: String,
    objective: TiVec<Col, f64>,
    column_bounds: TiVec<Col, Bounds>,
    column_names: TiVec<Col, String>,
    row_lower: TiVec<Row, Option<f64>>,
    row_upper: TiVec<Row, Option<f64>>,
    row_names: TiVec<Row, String>,
    triplets: Vec<Triplet>,
    /// Set when the objective is routed through a free variable defined by
    /// an equality row: (defining row, objective column).
    objective_row: Option<(Row, Col)>,
}

impl CanonicalModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_columns(&self) -> usize {
        self.objective.len()
    }

    pub fn num_rows(&self) -> usize {
        self.row_names.len()
    }

    /// Objective coefficients, one per column.
    pub fn objective(&self) -> &TiVec<Col, f64> {
        &self.objective
    }

    pub fn column_bounds(&self) -> &TiVec<Col, Bounds> {
        &self.column_bounds
    }

    pub fn column_names(&self) -> &TiVec<Col, String> {
        &self.column_names
    }

    pub fn row_lower(&self) -> &TiVec<Row, Option<f64>> {
        &self.row_lower
    }

    pub fn row_upper(&self) -> &TiVec<Row, Option<f64>> {
        &self.row_upper
    }

    pub fn row_names(&self) -> &TiVec<Row, String> {
        &self.row_names
    }

    /// Matrix entries, sorted by row then column.
    pub fn triplets(&self) -> &[Triplet] {
        &self.triplets
    }

    pub fn objective_row(&self) -> Option<(Row, Col)> {
        self.objective_row
    }

    pub fn columns(&self) -> impl Iterator<Item = Col> {
        (0..self.num_columns()).map(Col::from)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row> {
        (0..self.num_rows()).map(Row::from)
    }

    /// Column bounds as dense arrays, with `infinity` standing in for
    /// unbounded sides.
    pub fn column_bounds_dense(&self, infinity: f64) -> (Vec<f64>, Vec<f64>) {
        let lower = self
            .column_bounds
            .iter()
            .map(|b| b.lower.unwrap_or(-infinity))
            .collect();
        let upper = self
            .column_bounds
            .iter()
            .map(|b| b.upper.unwrap_or(infinity))
            .collect();
        (lower, upper)
    }

    /// Row bounds as dense arrays, with `infinity` standing in for
    /// unbounded sides.
    pub fn row_bounds_dense(&self, infinity: f64) -> (Vec<f64>, Vec<f64>) {
        let lower = self
            .row_lower
            .iter()
            .map(|b| b.unwrap_or(-infinity))
            .collect();
        let upper = self
            .row_upper
            .iter()
            .map(|b| b.unwrap_or(infinity))
            .collect();
        (lower, upper)
    }

    fn validate(&self) -> Result<(), CompilationError> {
        let columns = self.num_columns();
        let rows = self.num_rows();

        let column_arrays: [(&'static str, usize); 2] = [
            ("column bounds", self.column_bounds.len()),
            ("column names", self.column_names.len()),
        ];
        for (what, actual) in column_arrays {
            if actual != columns {
                return Err(CompilationError::InconsistentDimensions {
                    what,
                    expected: columns,
                    actual,
                });
            }
        }

        let row_arrays: [(&'static str, usize); 2] = [
            ("row lower bounds", self.row_lower.len()),
            ("row upper bounds", self.row_upper.len()),
        ];
        for (what, actual) in row_arrays {
            if actual != rows {
                return Err(CompilationError::InconsistentDimensions {
                    what,
                    expected: rows,
                    actual,
                });
            }
        }

        debug_assert!(self
            .triplets
            .windows(2)
            .all(|w| (w[0].row, w[0].col) < (w[1].row, w[1].col)));
        Ok(())
    }
}

/// Merge compiled rows and the variable catalog into one canonical model.
pub(crate) fn assemble(
    name: &str,
    registry: &SetRegistry,
    catalog: &VariableCatalog,
    rows: Vec<CompiledRow>,
    objective: TiVec<Col, f64>,
    objective_row: Option<(Row, Col)>,
    options: CompileOptions,
) -> Result<CanonicalModel, CompilationError> {
    let column_names = catalog.names(registry);

    let mut used = vec![false; catalog.columns()];
    for (col, &coeff) in objective.iter_enumerated() {
        if coeff != 0.0 {
            used[*col] = true;
        }
    }

    let mut triplets = Vec::new();
    let mut row_lower: TiVec<Row, Option<f64>> = Vec::with_capacity(rows.len()).into();
    let mut row_upper: TiVec<Row, Option<f64>> = Vec::with_capacity(rows.len()).into();
    let mut row_names: TiVec<Row, String> = Vec::with_capacity(rows.len()).into();

    for row in rows {
        for &(col, value) in &row.coefficients {
            used[*col] = true;
            triplets.push(Triplet::new(row.row, col, value));
        }
        row_lower.push(row.lower);
        row_upper.push(row.upper);
        row_names.push(row.name);
    }

    for (col, used) in used.into_iter().enumerate() {
        if !used {
            let variable = column_names[Col::from(col)].clone();
            if options.allow_orphan_variables {
                warn!("variable `{}` appears in no row and not in the objective", variable);
            } else {
                return Err(CompilationError::OrphanVariable { variable });
            }
        }
    }

    let model = CanonicalModel {
        name: name.to_string(),
        objective,
        column_bounds: catalog.bounds(),
        column_names,
        row_lower,
        row_upper,
        row_names,
        triplets,
        objective_row,
    };
    model.validate()?;

    debug!(
        "assembled `{}`: {} columns, {} rows, {} nonzeros",
        model.name,
        model.num_columns(),
        model.num_rows(),
        model.triplets.len()
    );
    Ok(model)
}

use std::collections::HashMap;

use derive_more::{Deref, From, Into};
use serde::{Deserialize, Serialize};
use typed_index_collections::TiVec;

use super::error::ModelDefinitionError;
use super::sets::{Label, SetId, SetRegistry};

/// A column of the canonical model. Columns form a dense 0-based range
/// assigned in block declaration order, then set order within a block.
#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct Col(usize);

/// Lower/upper bounds of a variable or row. `None` on a side means
/// unbounded in that direction; numeric infinity sentinels are a solver
/// convention and only materialized at the adapter boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Bounds {
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        Bounds { lower, upper }
    }

    /// `[0, +inf)`, the usual shape for quantity variables.
    pub fn non_negative() -> Self {
        Bounds {
            lower: Some(0.0),
            upper: None,
        }
    }

    /// `(-inf, +inf)`.
    pub fn free() -> Self {
        Bounds {
            lower: None,
            upper: None,
        }
    }

    pub fn fixed(value: f64) -> Self {
        Bounds {
            lower: Some(value),
            upper: Some(value),
        }
    }
}

#[derive(Debug)]
struct VarBlock {
    name: String,
    /// `None` for a free-standing scalar variable.
    set: Option<SetId>,
    first: Col,
    len: usize,
    bounds: Bounds,
}

/// All decision variables of one model, grouped in blocks: one variable per
/// label of an index set, or a single scalar.
#[derive(Debug, Default)]
pub struct VariableCatalog {
    blocks: Vec<VarBlock>,
    by_name: HashMap<String, usize>,
    columns: usize,
}

impl VariableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(
        &mut self,
        name: &str,
        set: Option<SetId>,
        len: usize,
        bounds: Bounds,
    ) -> Result<Col, ModelDefinitionError> {
        if self.by_name.contains_key(name) {
            return Err(ModelDefinitionError::Redeclaration {
                kind: "variable block",
                name: name.to_string(),
            });
        }
        if let (Some(lower), Some(upper)) = (bounds.lower, bounds.upper) {
            if lower > upper {
                return Err(ModelDefinitionError::NonMonotonicBounds {
                    variable: name.to_string(),
                    lower,
                    upper,
                });
            }
        }

        let first = Col(self.columns);
        self.by_name.insert(name.to_string(), self.blocks.len());
        self.blocks.push(VarBlock {
            name: name.to_string(),
            set,
            first,
            len,
            bounds,
        });
        self.columns += len;
        Ok(first)
    }

    /// Declare one variable per label of `set`, with uniform bounds.
    /// Returns the first column of the block. Freezes the set.
    pub fn declare(
        &mut self,
        registry: &mut SetRegistry,
        name: &str,
        set: SetId,
        bounds: Bounds,
    ) -> Result<Col, ModelDefinitionError> {
        let len = registry.get(set).len();
        let first = self.push(name, Some(set), len, bounds)?;
        registry.mark_referenced(set);
        Ok(first)
    }

    /// Declare a single free-standing variable, e.g. an objective-value
    /// variable in the equality formulation.
    pub fn declare_scalar(
        &mut self,
        name: &str,
        bounds: Bounds,
    ) -> Result<Col, ModelDefinitionError> {
        self.push(name, None, 1, bounds)
    }

    fn block(&self, name: &str) -> Result<&VarBlock, ModelDefinitionError> {
        self.by_name
            .get(name)
            .map(|&i| &self.blocks[i])
            .ok_or_else(|| ModelDefinitionError::UnknownVariable {
                name: name.to_string(),
            })
    }

    /// The column of the variable `name[label]`.
    pub fn column(
        &self,
        registry: &SetRegistry,
        name: &str,
        label: &Label,
    ) -> Result<Col, ModelDefinitionError> {
        let block = self.block(name)?;
        let set = block
            .set
            .ok_or_else(|| ModelDefinitionError::VariableArity {
                variable: name.to_string(),
                indexed: false,
            })?;
        let position = registry.get(set).position_of(label)?;
        Ok(Col(*block.first + position))
    }

    /// The column of the scalar variable `name`.
    pub fn scalar_column(&self, name: &str) -> Result<Col, ModelDefinitionError> {
        let block = self.block(name)?;
        if block.set.is_some() {
            return Err(ModelDefinitionError::VariableArity {
                variable: name.to_string(),
                indexed: true,
            });
        }
        Ok(block.first)
    }

    /// Total number of columns declared so far.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Per-column bounds, in column order.
    pub fn bounds(&self) -> TiVec<Col, Bounds> {
        let mut out: TiVec<Col, Bounds> = Vec::with_capacity(self.columns).into();
        for block in &self.blocks {
            for _ in 0..block.len {
                out.push(block.bounds);
            }
        }
        out
    }

    /// Per-column display names, `x[A]` style for indexed blocks.
    pub fn names(&self, registry: &SetRegistry) -> TiVec<Col, String> {
        let mut out: TiVec<Col, String> = Vec::with_capacity(self.columns).into();
        for block in &self.blocks {
            match block.set {
                Some(set) => {
                    for label in registry.get(set).labels() {
                        out.push(format!("{}[{}]", block.name, label));
                    }
                }
                None => out.push(block.name.clone()),
            }
        }
        out
    }

    /// Every column with its block name and label, in column order. This is
    /// what lets reports stay keyed by labels instead of column numbers.
    pub fn iter_columns<'a>(
        &'a self,
        registry: &'a SetRegistry,
    ) -> impl Iterator<Item = (Col, &'a str, Option<&'a Label>)> + 'a {
        self.blocks.iter().flat_map(move |block| {
            let labels: Vec<Option<&Label>> = match block.set {
                Some(set) => registry.get(set).labels().iter().map(Some).collect(),
                None => vec![None],
            };
            labels
                .into_iter()
                .enumerate()
                .map(move |(i, label)| (Col(*block.first + i), block.name.as_str(), label))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_dense_and_in_declaration_order() {
        let mut registry = SetRegistry::new();
        let feeds = registry.define("feeds", ["A", "B", "C"]).unwrap();
        let comps = registry.define("components", ["X", "Y"]).unwrap();

        let mut catalog = VariableCatalog::new();
        let x = catalog
            .declare(&mut registry, "x", feeds, Bounds::non_negative())
            .unwrap();
        let slack = catalog
            .declare(&mut registry, "slack", comps, Bounds::non_negative())
            .unwrap();
        let z = catalog.declare_scalar("z", Bounds::free()).unwrap();

        assert_eq!(*x, 0);
        assert_eq!(*slack, 3);
        assert_eq!(*z, 5);
        assert_eq!(catalog.columns(), 6);

        // Bijection onto [0, columns): every column resolves, none repeats.
        let cols: Vec<usize> = catalog
            .iter_columns(&registry)
            .map(|(c, _, _)| *c)
            .collect();
        assert_eq!(cols, (0..6).collect::<Vec<_>>());

        assert_eq!(
            catalog.column(&registry, "x", &"B".into()).unwrap(),
            Col::from(1)
        );
        assert_eq!(
            catalog.column(&registry, "slack", &"Y".into()).unwrap(),
            Col::from(4)
        );
        assert_eq!(catalog.scalar_column("z").unwrap(), Col::from(5));
    }

    #[test]
    fn non_monotonic_bounds_are_rejected() {
        let mut catalog = VariableCatalog::new();
        let err = catalog
            .declare_scalar("z", Bounds::new(Some(1.0), Some(0.0)))
            .unwrap_err();
        assert_eq!(
            err,
            ModelDefinitionError::NonMonotonicBounds {
                variable: "z".to_string(),
                lower: 1.0,
                upper: 0.0,
            }
        );
    }

    #[test]
    fn scalar_and_indexed_access_do_not_mix() {
        let mut registry = SetRegistry::new();
        let feeds = registry.define("feeds", ["A"]).unwrap();

        let mut catalog = VariableCatalog::new();
        catalog
            .declare(&mut registry, "x", feeds, Bounds::non_negative())
            .unwrap();
        catalog.declare_scalar("z", Bounds::free()).unwrap();

        assert!(matches!(
            catalog.scalar_column("x"),
            Err(ModelDefinitionError::VariableArity { .. })
        ));
        assert!(matches!(
            catalog.column(&registry, "z", &"A".into()),
            Err(ModelDefinitionError::VariableArity { .. })
        ));
    }

    #[test]
    fn block_names_are_unique() {
        let mut catalog = VariableCatalog::new();
        catalog.declare_scalar("z", Bounds::free()).unwrap();
        let err = catalog.declare_scalar("z", Bounds::free()).unwrap_err();
        assert!(matches!(err, ModelDefinitionError::Redeclaration { .. }));
    }
}

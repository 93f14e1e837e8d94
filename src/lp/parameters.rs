use std::collections::HashMap;

use super::error::ModelDefinitionError;
use super::sets::{Label, SetId, SetRegistry};

/// A named table of real values keyed by labels of the sets it is
/// dimensioned over. Arity 0 is a plain scalar.
#[derive(Debug)]
struct Parameter {
    name: String,
    dims: Vec<SetId>,
    values: HashMap<Vec<usize>, f64>,
}

/// All parameters of one model. Every key tuple is validated against the
/// owning sets when written, and reading a tuple that was never written is
/// an error rather than an implicit zero: a feed without an explicit cost
/// is an unmodelled feed, not a free one.
#[derive(Debug, Default)]
pub struct ParameterStore {
    params: Vec<Parameter>,
    by_name: HashMap<String, usize>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` as a parameter over `dims` (empty for a scalar).
    /// Freezes the referenced sets.
    pub fn declare(
        &mut self,
        registry: &mut SetRegistry,
        name: &str,
        dims: &[SetId],
    ) -> Result<(), ModelDefinitionError> {
        if self.by_name.contains_key(name) {
            return Err(ModelDefinitionError::Redeclaration {
                kind: "parameter",
                name: name.to_string(),
            });
        }
        for &dim in dims {
            registry.mark_referenced(dim);
        }

        self.by_name.insert(name.to_string(), self.params.len());
        self.params.push(Parameter {
            name: name.to_string(),
            dims: dims.to_vec(),
            values: HashMap::new(),
        });
        Ok(())
    }

    fn index_of(&self, name: &str) -> Result<usize, ModelDefinitionError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ModelDefinitionError::UnknownParameter {
                name: name.to_string(),
            })
    }

    /// Resolve a key tuple to set positions, validating arity and membership.
    fn resolve(
        param: &Parameter,
        registry: &SetRegistry,
        key: &[Label],
    ) -> Result<Vec<usize>, ModelDefinitionError> {
        if key.len() != param.dims.len() {
            return Err(ModelDefinitionError::InvalidKey {
                parameter: param.name.clone(),
                key: key.to_vec(),
                detail: format!("expected arity {}, got {}", param.dims.len(), key.len()),
            });
        }

        param
            .dims
            .iter()
            .zip(key)
            .map(|(&dim, label)| {
                let set = registry.get(dim);
                set.position_of(label)
                    .map_err(|_| ModelDefinitionError::InvalidKey {
                        parameter: param.name.clone(),
                        key: key.to_vec(),
                        detail: format!("`{}` is not a member of set `{}`", label, set.name()),
                    })
            })
            .collect()
    }

    /// Write one value. Writing the same key twice overwrites; the store is
    /// only mutated during model construction.
    pub fn set(
        &mut self,
        registry: &SetRegistry,
        name: &str,
        key: &[Label],
        value: f64,
    ) -> Result<(), ModelDefinitionError> {
        let index = self.index_of(name)?;
        let positions = Self::resolve(&self.params[index], registry, key)?;
        self.params[index].values.insert(positions, value);
        Ok(())
    }

    /// Read one value. The exact key tuple must have been set.
    pub fn get(
        &self,
        registry: &SetRegistry,
        name: &str,
        key: &[Label],
    ) -> Result<f64, ModelDefinitionError> {
        let param = &self.params[self.index_of(name)?];
        let positions = Self::resolve(param, registry, key)?;
        param
            .values
            .get(&positions)
            .copied()
            .ok_or_else(|| ModelDefinitionError::MissingValue {
                parameter: param.name.clone(),
                key: key.to_vec(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (SetRegistry, ParameterStore) {
        let mut registry = SetRegistry::new();
        let feeds = registry.define("feeds", ["A", "B"]).unwrap();
        let comps = registry.define("components", ["X"]).unwrap();

        let mut params = ParameterStore::new();
        params.declare(&mut registry, "cost", &[feeds]).unwrap();
        params
            .declare(&mut registry, "content", &[feeds, comps])
            .unwrap();
        params.declare(&mut registry, "total", &[]).unwrap();
        (registry, params)
    }

    #[test]
    fn set_and_get_round_trip() {
        let (registry, mut params) = store();
        params.set(&registry, "cost", &["A".into()], 10.0).unwrap();
        params
            .set(&registry, "content", &["A".into(), "X".into()], 0.6)
            .unwrap();
        params.set(&registry, "total", &[], 100.0).unwrap();

        assert_eq!(params.get(&registry, "cost", &["A".into()]).unwrap(), 10.0);
        assert_eq!(
            params
                .get(&registry, "content", &["A".into(), "X".into()])
                .unwrap(),
            0.6
        );
        assert_eq!(params.get(&registry, "total", &[]).unwrap(), 100.0);
    }

    #[test]
    fn missing_value_is_an_error_not_zero() {
        let (registry, mut params) = store();
        params.set(&registry, "cost", &["A".into()], 10.0).unwrap();

        let err = params.get(&registry, "cost", &["B".into()]).unwrap_err();
        assert_eq!(
            err,
            ModelDefinitionError::MissingValue {
                parameter: "cost".to_string(),
                key: vec!["B".into()],
            }
        );
    }

    #[test]
    fn key_arity_is_validated() {
        let (registry, mut params) = store();
        let err = params
            .set(&registry, "content", &["A".into()], 0.5)
            .unwrap_err();
        assert!(matches!(err, ModelDefinitionError::InvalidKey { .. }));
    }

    #[test]
    fn key_membership_is_validated() {
        let (registry, mut params) = store();
        let err = params
            .set(&registry, "cost", &["Z".into()], 1.0)
            .unwrap_err();
        assert!(matches!(err, ModelDefinitionError::InvalidKey { .. }));
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let (registry, params) = store();
        let err = params.get(&registry, "margin", &[]).unwrap_err();
        assert_eq!(
            err,
            ModelDefinitionError::UnknownParameter {
                name: "margin".to_string(),
            }
        );
    }
}

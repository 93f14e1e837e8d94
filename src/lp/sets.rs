use std::collections::HashMap;
use std::fmt;

use derive_more::{Deref, From, Into};
use serde::{Deserialize, Serialize};

use super::error::ModelDefinitionError;

/// A member of an index set. Labels are either short names ("A", "X") or
/// small integers; they are the sole addressing mechanism for variables and
/// rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Text(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(i) => write!(f, "{}", i),
            Label::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Text(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::Text(s)
    }
}

impl From<&String> for Label {
    fn from(s: &String) -> Self {
        Label::Text(s.clone())
    }
}

impl From<i64> for Label {
    fn from(i: i64) -> Self {
        Label::Int(i)
    }
}

/// Handle to a defined index set.
#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct SetId(usize);

/// An ordered collection of unique labels. Positions are assigned at
/// definition time and stable thereafter.
#[derive(Debug, Clone)]
pub struct IndexSet {
    name: String,
    labels: Vec<Label>,
    positions: HashMap<Label, usize>,
}

impl IndexSet {
    fn new(name: &str, labels: Vec<Label>) -> Result<Self, ModelDefinitionError> {
        let mut positions = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if positions.insert(label.clone(), i).is_some() {
                return Err(ModelDefinitionError::DuplicateLabel {
                    set: name.to_string(),
                    label: label.clone(),
                });
            }
        }

        Ok(IndexSet {
            name: name.to_string(),
            labels,
            positions,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The labels of this set, in declaration order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The position of `label` within this set.
    pub fn position_of(&self, label: &Label) -> Result<usize, ModelDefinitionError> {
        self.positions
            .get(label)
            .copied()
            .ok_or_else(|| ModelDefinitionError::UnknownLabel {
                set: self.name.clone(),
                label: label.clone(),
            })
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.positions.contains_key(label)
    }
}

/// All index sets of one model, by name. A set may be redefined freely up
/// until the first parameter, variable block or equation family references
/// it; after that it is frozen.
#[derive(Debug, Default)]
pub struct SetRegistry {
    sets: Vec<IndexSet>,
    by_name: HashMap<String, SetId>,
    referenced: Vec<bool>,
}

impl SetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or, while still unreferenced, redefine) the set `name`.
    pub fn define<L: Into<Label>>(
        &mut self,
        name: &str,
        labels: impl IntoIterator<Item = L>,
    ) -> Result<SetId, ModelDefinitionError> {
        let labels = labels.into_iter().map(Into::into).collect();
        let set = IndexSet::new(name, labels)?;

        match self.by_name.get(name) {
            Some(&id) => {
                if self.referenced[*id] {
                    return Err(ModelDefinitionError::SetAlreadyInUse {
                        set: name.to_string(),
                    });
                }
                self.sets[*id] = set;
                Ok(id)
            }
            None => {
                let id = SetId(self.sets.len());
                self.sets.push(set);
                self.referenced.push(false);
                self.by_name.insert(name.to_string(), id);
                Ok(id)
            }
        }
    }

    pub fn get(&self, id: SetId) -> &IndexSet {
        &self.sets[*id]
    }

    pub fn lookup(&self, name: &str) -> Result<SetId, ModelDefinitionError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ModelDefinitionError::UnknownSet {
                name: name.to_string(),
            })
    }

    /// Freeze `id` against redefinition.
    pub fn mark_referenced(&mut self, id: SetId) {
        self.referenced[*id] = true;
    }
}

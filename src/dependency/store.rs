use indexmap::IndexSet;

use crate::error::{SpecGenError, SpecGenResult};

/// Name ↔ dense index table for graph vertices
///
/// Indices follow registration order and carry no meaning beyond making
/// iteration deterministic.
#[derive(Debug, Clone, Default)]
pub struct TargetStore {
    names: IndexSet<String>,
}

impl TargetStore {
    /// Register `targets` in order; a repeated name is rejected
    pub fn new<I, S>(targets: I) -> SpecGenResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = IndexSet::new();
        for target in targets {
            let target = target.into();
            if names.contains(&target) {
                return Err(SpecGenError::DuplicateTarget {
                    spec: "dependency graph".to_string(),
                    name: target,
                });
            }
            names.insert(target);
        }
        Ok(Self { names })
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.get_index_of(name)
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get_index(index).map(String::as_str)
    }

    /// Index of `name`, or `UnknownTarget`
    pub fn require(&self, name: &str) -> SpecGenResult<usize> {
        self.index_of(name).ok_or_else(|| SpecGenError::UnknownTarget {
            name: name.to_string(),
        })
    }

    /// Translate indices back to names
    pub fn names_of(&self, indices: &[usize]) -> SpecGenResult<Vec<String>> {
        indices
            .iter()
            .map(|&i| {
                self.name_of(i)
                    .map(str::to_string)
                    .ok_or_else(|| crate::internal_error!("invalid dependency index: {}", i))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

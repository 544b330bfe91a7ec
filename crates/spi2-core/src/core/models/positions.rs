use super::object::SphereSet;
use nalgebra::Point3;
use std::collections::BTreeMap;
use thiserror::Error;

/// Raised when an evaluation step reads an object that has not been resolved yet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("No positions recorded for object '{0}'")]
pub struct MissingObjectError(pub String);

/// Snapshot of every object's resolved spheres for one design vector, keyed by name.
///
/// Rebuilt from scratch on every evaluation. Iteration order is lexicographic by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionsMap {
    entries: BTreeMap<String, SphereSet>,
}

impl PositionsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, spheres: SphereSet) {
        self.entries.insert(name.into(), spheres);
    }

    pub fn get(&self, name: &str) -> Result<&SphereSet, MissingObjectError> {
        self.entries
            .get(name)
            .ok_or_else(|| MissingObjectError(name.to_string()))
    }

    /// The first sphere center of `name`.
    pub fn reference_point(&self, name: &str) -> Result<Point3<f64>, MissingObjectError> {
        self.get(name)?
            .reference_point()
            .copied()
            .ok_or_else(|| MissingObjectError(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SphereSet)> + Clone + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

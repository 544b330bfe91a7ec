use crate::core::io::report::{ReportError, write_design_vector_log_csv};
use std::path::Path;

/// Append-only record of design vectors: the starting point followed by every accepted
/// iterate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignVectorLog {
    entries: Vec<Vec<f64>>,
}

impl DesignVectorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, design_vector: &[f64]) {
        self.entries.push(design_vector.to_vec());
    }

    pub fn entries(&self) -> &[Vec<f64>] {
        &self.entries
    }

    pub fn last(&self) -> Option<&[f64]> {
        self.entries.last().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Vec<f64>> {
        self.entries
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), ReportError> {
        write_design_vector_log_csv(path, &self.entries)
    }
}

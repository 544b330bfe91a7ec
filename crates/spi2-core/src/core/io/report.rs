use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV writing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// Final value of one interference constraint category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConstraintReport {
    pub category: String,
    pub value: f64,
    pub tolerance: f64,
    pub feasible: bool,
}

/// Summary of an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OptimizationReport {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub iterations: usize,
    pub objective: f64,
    pub final_design_vector: Vec<f64>,
    pub design_vector_log: Vec<Vec<f64>>,
    pub constraints: Vec<ConstraintReport>,
}

impl OptimizationReport {
    pub fn to_toml_string(&self) -> Result<String, ReportError> {
        Ok(toml::to_string(self)?)
    }

    pub fn write_toml(&self, path: &Path) -> Result<(), ReportError> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ReportError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }
}

/// Writes a design-vector log as CSV: a header `iteration,x0,x1,...` followed by one row
/// per logged vector.
pub fn write_design_vector_log_csv(path: &Path, log: &[Vec<f64>]) -> Result<(), ReportError> {
    let csv_err = |e: csv::Error| ReportError::Csv {
        path: path.to_string_lossy().to_string(),
        source: e,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;

    let width = log.iter().map(Vec::len).max().unwrap_or(0);
    let header = std::iter::once("iteration".to_string()).chain((0..width).map(|i| format!("x{i}")));
    writer.write_record(header).map_err(csv_err)?;

    for (iteration, vector) in log.iter().enumerate() {
        let row = std::iter::once(iteration.to_string()).chain(vector.iter().map(f64::to_string));
        writer.write_record(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| ReportError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

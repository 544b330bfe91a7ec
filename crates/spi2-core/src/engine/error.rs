use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::input::InputError;
use crate::core::io::report::ReportError;
use crate::core::models::positions::MissingObjectError;
use crate::core::models::validation::ValidationError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid system: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to load input: {0}")]
    Input(#[from] InputError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to write output: {0}")]
    Output(#[from] ReportError),

    #[error(transparent)]
    MissingObject(#[from] MissingObjectError),

    #[error("Design vector has {found} entries, expected {expected}")]
    DesignVectorLength { expected: usize, found: usize },

    #[error("Non-finite {what} encountered at iteration {iteration}")]
    NonFinite { what: String, iteration: usize },

    #[error("Solver failed: {0}")]
    Solver(String),
}

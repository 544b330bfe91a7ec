use super::log::DesignVectorLog;
use super::problem::Evaluation;
use std::fmt;

/// Lifecycle of an optimization run.
///
/// `Init -> Iterating -> {Converged, MaxIterations, Failed}`. The three right-hand states
/// are terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverStatus {
    Init,
    Iterating,
    Converged,
    MaxIterations,
    Failed { reason: String },
}

impl SolverStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SolverStatus::Converged | SolverStatus::MaxIterations | SolverStatus::Failed { .. }
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolverStatus::Init => "init",
            SolverStatus::Iterating => "iterating",
            SolverStatus::Converged => "converged",
            SolverStatus::MaxIterations => "max-iterations",
            SolverStatus::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverStatus::Failed { reason } => write!(f, "failed: {reason}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Result of a driver run. A failed run still carries the iterates logged before the
/// failure.
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub status: SolverStatus,
    pub design_vector: Vec<f64>,
    /// Evaluation at `design_vector`, absent if the failure happened before any
    /// finite evaluation was available.
    pub evaluation: Option<Evaluation>,
    pub iterations: usize,
    pub multipliers: Vec<f64>,
    pub log: DesignVectorLog,
}

use crate::core::models::system::{InterferenceCategory, SpatialSystem};
use crate::core::io::report::ConstraintReport;
use crate::engine::config::OptimizationConfig;
use crate::engine::configuration::SpatialConfiguration;
use crate::engine::error::EngineError;
use crate::engine::problem::{ConstrainedProblem, Evaluation, LayoutProblem};
use tracing::{info, instrument};

/// Value of one active interference category at a design vector.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryValue {
    pub category: InterferenceCategory,
    pub value: f64,
    pub tolerance: f64,
    pub feasible: bool,
}

impl From<&CategoryValue> for ConstraintReport {
    fn from(value: &CategoryValue) -> Self {
        ConstraintReport {
            category: value.category.to_string(),
            value: value.value,
            tolerance: value.tolerance,
            feasible: value.feasible,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub design_vector: Vec<f64>,
    pub objective: f64,
    pub constraints: Vec<CategoryValue>,
}

impl EvaluationResult {
    pub fn is_feasible(&self) -> bool {
        self.constraints.iter().all(|c| c.feasible)
    }
}

/// Evaluates the configured objective and every active interference category.
///
/// Without an explicit `design_vector` the starting layout from `config` is used.
#[instrument(skip_all, name = "evaluation_workflow")]
pub fn run(
    system: SpatialSystem,
    design_vector: Option<Vec<f64>>,
    config: &OptimizationConfig,
) -> Result<EvaluationResult, EngineError> {
    let system = system.with_segment_limit(config.max_spheres_per_segment);
    let mut configuration = SpatialConfiguration::with_layout(system, &config.layout)?;
    if let Some(design_vector) = design_vector {
        configuration.set_design_vector(design_vector)?;
    }

    let problem = LayoutProblem::new(&configuration, config);
    let evaluation = problem.evaluate(configuration.design_vector())?;
    let constraints = category_values(&problem, &evaluation);
    info!(
        objective = evaluation.objective,
        categories = constraints.len(),
        "Evaluated design vector."
    );

    Ok(EvaluationResult {
        design_vector: configuration.design_vector().to_vec(),
        objective: evaluation.objective,
        constraints,
    })
}

pub(crate) fn category_values(problem: &LayoutProblem<'_>, evaluation: &Evaluation) -> Vec<CategoryValue> {
    problem
        .constraints()
        .iter()
        .zip(&evaluation.constraints)
        .map(|(constraint, &value)| CategoryValue {
            category: constraint.category,
            value,
            tolerance: constraint.tolerance,
            feasible: constraint.is_feasible(value),
        })
        .collect()
}

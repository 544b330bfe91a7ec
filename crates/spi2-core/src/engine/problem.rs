use super::config::OptimizationConfig;
use super::configuration::SpatialConfiguration;
use super::constraints::InterferenceConstraint;
use super::error::EngineError;
use super::objectives::Objective;
use crate::core::models::system::InterferenceCategory;
use tracing::debug;

/// Objective and constraint values at one design vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub objective: f64,
    pub constraints: Vec<f64>,
}

impl Evaluation {
    pub fn is_finite(&self) -> bool {
        self.objective.is_finite() && self.constraints.iter().all(|c| c.is_finite())
    }

    /// Largest amount by which any constraint exceeds its upper bound, or zero.
    pub fn max_violation(&self, upper_bounds: &[f64]) -> f64 {
        self.constraints
            .iter()
            .zip(upper_bounds)
            .map(|(c, u)| (c - u).max(0.0))
            .fold(0.0, f64::max)
    }
}

/// A problem of the form: minimize `f(x)` subject to `c_i(x) <= u_i`.
pub trait ConstrainedProblem {
    fn dimension(&self) -> usize;

    /// Upper bound `u_i` of each constraint, in evaluation order.
    fn constraint_bounds(&self) -> &[f64];

    fn evaluate(&self, x: &[f64]) -> Result<Evaluation, EngineError>;
}

/// The packaging problem: a configured objective plus one interference constraint per
/// enabled, non-empty category.
pub struct LayoutProblem<'a> {
    configuration: &'a SpatialConfiguration,
    objective: Objective,
    constraints: Vec<InterferenceConstraint>,
    bounds: Vec<f64>,
}

impl<'a> LayoutProblem<'a> {
    pub fn new(configuration: &'a SpatialConfiguration, config: &OptimizationConfig) -> Self {
        let system = configuration.system();
        let objective = Objective::from_config(&config.objective, system);
        let constraints: Vec<InterferenceConstraint> = config
            .constraints
            .categories
            .iter()
            .filter_map(|(&category, &tolerance)| {
                let constraint =
                    InterferenceConstraint::new(system, category, tolerance, config.constraints.rho);
                if constraint.is_none() {
                    debug!(%category, "Skipping interference category with no object pairs");
                }
                constraint
            })
            .collect();
        let bounds = constraints.iter().map(|c| c.tolerance).collect();
        Self {
            configuration,
            objective,
            constraints,
            bounds,
        }
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn categories(&self) -> impl Iterator<Item = InterferenceCategory> + '_ {
        self.constraints.iter().map(|c| c.category)
    }

    pub fn constraints(&self) -> &[InterferenceConstraint] {
        &self.constraints
    }
}

impl ConstrainedProblem for LayoutProblem<'_> {
    fn dimension(&self) -> usize {
        self.configuration.design_len()
    }

    fn constraint_bounds(&self) -> &[f64] {
        &self.bounds
    }

    fn evaluate(&self, x: &[f64]) -> Result<Evaluation, EngineError> {
        let positions = self.configuration.calculate_positions(x)?;
        let objective = self.objective.evaluate(&positions)?;
        let constraints = self
            .constraints
            .iter()
            .map(|c| c.evaluate(&positions))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Evaluation {
            objective,
            constraints,
        })
    }
}

use super::evaluate::{CategoryValue, category_values};
use crate::core::io::report::{ConstraintReport, OptimizationReport};
use crate::core::models::system::SpatialSystem;
use crate::engine::config::OptimizationConfig;
use crate::engine::configuration::SpatialConfiguration;
use crate::engine::differentiation::CentralDifference;
use crate::engine::error::EngineError;
use crate::engine::problem::LayoutProblem;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::solver::AugmentedLagrangian;
use crate::engine::state::{SolverOutcome, SolverStatus};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub outcome: SolverOutcome,
    /// Final configuration at the returned design vector.
    pub configuration: SpatialConfiguration,
    /// Objective at the final design vector, or `None` if the run failed before any
    /// finite evaluation.
    pub objective: Option<f64>,
    pub constraints: Vec<CategoryValue>,
}

impl OptimizationResult {
    pub fn status(&self) -> &SolverStatus {
        &self.outcome.status
    }

    pub fn to_report(&self) -> OptimizationReport {
        let message = match &self.outcome.status {
            SolverStatus::Failed { reason } => Some(reason.clone()),
            _ => None,
        };
        OptimizationReport {
            status: self.outcome.status.as_str().to_string(),
            message,
            iterations: self.outcome.iterations,
            objective: self.objective.unwrap_or(f64::NAN),
            final_design_vector: self.outcome.design_vector.clone(),
            design_vector_log: self.outcome.log.entries().to_vec(),
            constraints: self.constraints.iter().map(ConstraintReport::from).collect(),
        }
    }
}

/// Generates the starting layout, optimizes it and evaluates the result.
///
/// A numerically failed solve is not an error: it comes back as a result whose status is
/// [`SolverStatus::Failed`], carrying the iterates logged before the failure.
#[instrument(skip_all, name = "optimization_workflow")]
pub fn run(
    system: SpatialSystem,
    config: &OptimizationConfig,
    reporter: &ProgressReporter,
) -> Result<OptimizationResult, EngineError> {
    let system = system.with_segment_limit(config.max_spheres_per_segment);

    // === Phase 1: Starting layout ===
    let mut configuration = reporter.phase("Layout", || {
        info!(
            objects = system.objects_iter().count(),
            design_len = system.design_len(),
            "Generating starting layout."
        );
        SpatialConfiguration::with_layout(system, &config.layout)
    })?;

    // === Phase 2: Constrained optimization ===
    let outcome = reporter.phase("Optimization", || {
        let problem = LayoutProblem::new(&configuration, config);
        let differentiator = CentralDifference::new(config.finite_difference_step);
        let driver =
            AugmentedLagrangian::new(config.solver.clone(), config.objective.scale, &differentiator);
        driver.minimize(&problem, configuration.design_vector().to_vec(), reporter)
    })?;

    // === Phase 3: Final evaluation ===
    let constraints = reporter.phase("Final Evaluation", || -> Result<_, EngineError> {
        configuration.set_design_vector(outcome.design_vector.clone())?;
        let problem = LayoutProblem::new(&configuration, config);
        Ok(match &outcome.evaluation {
            Some(evaluation) => category_values(&problem, evaluation),
            None => Vec::new(),
        })
    })?;

    let objective = outcome.evaluation.as_ref().map(|e| e.objective);
    if let SolverStatus::Failed { reason } = &outcome.status {
        warn!(%reason, iterations = outcome.iterations, "Optimization failed.");
        reporter.report(Progress::Message(format!("Optimization failed: {reason}")));
    } else {
        info!(
            status = %outcome.status,
            iterations = outcome.iterations,
            objective = objective.unwrap_or(f64::NAN),
            "Optimization workflow complete."
        );
    }
    for value in constraints.iter().filter(|c| !c.feasible) {
        warn!(
            category = %value.category,
            value = value.value,
            tolerance = value.tolerance,
            "Interference constraint is violated at the final design."
        );
        reporter.report(Progress::Message(format!(
            "Constraint {} is violated: {:.3e} > {:.3e}",
            value.category, value.value, value.tolerance
        )));
    }
    let stretched = configuration
        .system()
        .stretched_edges(configuration.positions())?;
    if !stretched.is_empty() {
        warn!(
            edges = ?stretched,
            limit = config.max_spheres_per_segment,
            "Interconnect edges exceed the sphere limit and are sampled sparsely."
        );
    }

    Ok(OptimizationResult {
        outcome,
        configuration,
        objective,
        constraints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::input::parse_system;
    use crate::core::models::system::InterferenceCategory;
    use crate::engine::config::{LayoutGeneration, ObjectiveKind, OptimizationConfigBuilder};
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    const DOCUMENT: &str = r#"
        [[components]]
        name = "a"
        degrees-of-freedom = ["x", "y", "z"]
        spheres = [[0.0, 0.0, 0.0, 0.5]]

        [[components]]
        name = "b"
        degrees-of-freedom = ["x", "y", "z"]
        spheres = [[3.0, 0.0, 0.0, 0.5]]
    "#;

    const PLANT: &str = r#"
        [[components]]
        name = "pump"
        degrees-of-freedom = ["x", "y", "z"]
        spheres = [[0.0, 0.0, 0.0, 0.5], [0.6, 0.0, 0.0, 0.5]]

        [[components]]
        name = "tank"
        degrees-of-freedom = ["x", "y", "z"]
        spheres = [[4.0, 0.0, 0.0, 0.75]]

        [[components]]
        name = "valve"
        degrees-of-freedom = ["x", "y", "z"]
        spheres = [[2.0, 3.0, 0.0, 0.4]]

        [[ports]]
        component = "pump"
        name = "out"
        offset = [1.1, 0.0, 0.0]
        radius = 0.05

        [[ports]]
        component = "tank"
        name = "in"
        offset = [-0.75, 0.0, 0.0]
        radius = 0.05

        [[interconnects]]
        name = "hose"
        component-1 = "pump"
        port-1 = "out"
        component-2 = "tank"
        port-2 = "in"
        radius = 0.1
        bends = 1

        [[structures]]
        name = "frame"
        spheres = [[2.0, 0.0, -40.0, 1.0]]
    "#;

    const SEGMENT_LIMIT: usize = 100;

    fn system() -> SpatialSystem {
        parse_system(DOCUMENT, Path::new("."), "doc.toml").unwrap()
    }

    fn plant() -> SpatialSystem {
        parse_system(PLANT, Path::new("."), "plant.toml").unwrap()
    }

    fn plant_config(kind: ObjectiveKind) -> OptimizationConfigBuilder {
        OptimizationConfigBuilder::new()
            .objective(kind)
            .max_outer_iterations(3)
            .max_inner_iterations(10)
            .max_spheres_per_segment(SEGMENT_LIMIT)
    }

    fn messages(events: &Arc<Mutex<Vec<String>>>) -> ProgressReporter<'static> {
        let sink = Arc::clone(events);
        ProgressReporter::with_callback(Box::new(move |event| {
            if let Progress::Message(message) = event {
                sink.lock().unwrap().push(message);
            }
        }))
    }

    fn gap_config(max_outer_iterations: usize) -> OptimizationConfig {
        let mut categories = BTreeMap::new();
        categories.insert(InterferenceCategory::ComponentComponent, 0.0);
        OptimizationConfigBuilder::new()
            .objective(ObjectiveKind::AggregateGap)
            .constraints(categories)
            .max_outer_iterations(max_outer_iterations)
            .build()
            .unwrap()
    }

    fn center_distance(design: &[f64]) -> f64 {
        let dx = design[3] - design[0];
        let dy = design[4] - design[1];
        let dz = design[5] - design[2];
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    #[test]
    fn gap_objective_pulls_spheres_into_contact() {
        let result = run(system(), &gap_config(30), &ProgressReporter::new()).unwrap();
        assert!(!matches!(result.status(), SolverStatus::Failed { .. }));
        let distance = center_distance(&result.outcome.design_vector);
        assert!(distance < 3.0);
        assert!(distance > 0.9, "spheres interpenetrate: {distance}");
        assert_eq!(result.constraints.len(), 1);
        assert_eq!(
            result.configuration.design_vector(),
            result.outcome.design_vector.as_slice()
        );
    }

    #[test]
    fn report_mirrors_outcome() {
        let result = run(system(), &gap_config(2), &ProgressReporter::new()).unwrap();
        let report = result.to_report();
        assert_eq!(report.status, result.status().as_str());
        assert_eq!(report.iterations, result.outcome.iterations);
        assert_eq!(report.design_vector_log.len(), result.outcome.log.len());
        assert_eq!(report.design_vector_log[0], vec![0.0, 0.0, 0.0, 3.0, 0.0, 0.0]);
        assert_eq!(report.constraints[0].category, "component-component");
        assert!(report.message.is_none());
    }

    #[test]
    fn phases_are_reported_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if let Progress::PhaseStart { name } = event {
                sink.lock().unwrap().push(name);
            }
        }));
        run(system(), &gap_config(1), &reporter).unwrap();
        assert_eq!(
            *events.lock().unwrap(),
            vec!["Layout", "Optimization", "Final Evaluation"]
        );
    }

    #[test]
    fn interconnected_system_terminates_under_both_objectives() {
        for kind in [ObjectiveKind::BoundingBoxVolume, ObjectiveKind::AggregateGap] {
            let config = plant_config(kind).build().unwrap();
            let result = run(plant(), &config, &ProgressReporter::new()).unwrap();

            assert!(
                !matches!(result.status(), SolverStatus::Failed { .. }),
                "{kind}: {}",
                result.status()
            );
            assert!(result.outcome.iterations <= 3);
            assert_eq!(result.outcome.log.len(), result.outcome.iterations + 1);
            assert_eq!(result.outcome.design_vector.len(), 3 * 3 + 3);
            assert!(result.objective.is_some_and(f64::is_finite));
            let categories: Vec<_> = result.constraints.iter().map(|c| c.category).collect();
            assert_eq!(
                categories,
                vec![
                    InterferenceCategory::ComponentComponent,
                    InterferenceCategory::ComponentInterconnect,
                    InterferenceCategory::StructureAll,
                ]
            );
            let positions = result.configuration.positions();
            for edge in ["hose_edge_0", "hose_edge_1"] {
                assert!(positions.get(edge).unwrap().len() <= SEGMENT_LIMIT);
            }
        }
    }

    #[test]
    fn volume_run_shrinks_the_layout_and_stays_feasible() {
        let config = plant_config(ObjectiveKind::BoundingBoxVolume)
            .enable_constraint(InterferenceCategory::StructureAll, 0.0)
            .max_outer_iterations(5)
            .max_inner_iterations(20)
            .build()
            .unwrap();
        let start = crate::workflows::evaluate::run(plant(), None, &config).unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let result = run(plant(), &config, &messages(&events)).unwrap();

        assert!(!matches!(result.status(), SolverStatus::Failed { .. }));
        let objective = result.objective.unwrap();
        assert!(objective < start.objective, "{objective} >= {}", start.objective);
        assert_eq!(result.constraints.len(), 1);
        assert!(result.constraints.iter().all(|c| c.feasible));
        assert!(result.to_report().constraints.iter().all(|c| c.feasible));
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn non_finite_layout_fails_instead_of_converging() {
        let mut config = gap_config(10);
        config.layout = LayoutGeneration::Manual(vec![f64::NAN, 0.0, 0.0, 3.0, 0.0, 0.0]);
        let events = Arc::new(Mutex::new(Vec::new()));
        let result = run(system(), &config, &messages(&events)).unwrap();

        assert!(matches!(result.status(), SolverStatus::Failed { .. }));
        assert_eq!(result.outcome.iterations, 0);
        assert!(result.objective.is_none());
        assert!(result.constraints.is_empty());
        let report = result.to_report();
        assert_eq!(report.status, "failed");
        assert!(report.message.is_some());
        assert!(
            events
                .lock()
                .unwrap()
                .iter()
                .any(|m| m.starts_with("Optimization failed"))
        );
    }

    #[test]
    fn violated_constraint_is_surfaced() {
        let mut config = gap_config(1);
        config.layout = LayoutGeneration::Manual(vec![0.0, 0.0, 0.0, 0.5, 0.0, 0.0]);
        let events = Arc::new(Mutex::new(Vec::new()));
        let result = run(system(), &config, &messages(&events)).unwrap();

        assert_eq!(result.status(), &SolverStatus::MaxIterations);
        assert!(!result.constraints[0].feasible);
        assert!(
            events
                .lock()
                .unwrap()
                .iter()
                .any(|m| m.contains("component-component") && m.contains("violated"))
        );
    }
}

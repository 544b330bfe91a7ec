use crate::cli::{EvaluateArgs, OptimizeArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use serde::Deserialize;
use spi2pp::core::models::system::InterferenceCategory;
use spi2pp::engine::config::{
    self as core_config, BoundingBoxMode, GapNormalization, LayoutGeneration, ObjectiveKind,
    OptimizationConfigBuilder,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const DEFAULT_OBJECTIVE: &str = "bounding-box-volume";
const DEFAULT_MAX_OUTER_ITERATIONS: usize = 50;
/// Half-width of the cube random layouts are drawn from when no bounds are configured.
const DEFAULT_RANDOM_EXTENT: f64 = 5.0;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialObjectiveConfig {
    kind: Option<String>,
    scale: Option<f64>,
    bounding_box: Option<String>,
    bounding_box_rho: Option<f64>,
    gap_normalization: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialConstraintConfig {
    rho: Option<f64>,
    enabled: Option<Vec<String>>,
    tolerances: Option<BTreeMap<String, f64>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSolverConfig {
    max_outer_iterations: Option<usize>,
    max_inner_iterations: Option<usize>,
    lbfgs_memory: Option<usize>,
    initial_penalty: Option<f64>,
    penalty_growth: Option<f64>,
    feasibility_tolerance: Option<f64>,
    step_tolerance: Option<f64>,
    gradient_tolerance: Option<f64>,
    finite_difference_step: Option<f64>,
    max_spheres_per_segment: Option<usize>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(
    deny_unknown_fields,
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case"
)]
enum PartialLayout {
    Default,
    Manual {
        design_vector: Vec<f64>,
    },
    Random {
        seed: Option<u64>,
        min: Option<[f64; 3]>,
        max: Option<[f64; 3]>,
    },
}

/// Optimization settings as read from a config file, before CLI overrides.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialOptimizationConfig {
    objective: Option<PartialObjectiveConfig>,
    constraints: Option<PartialConstraintConfig>,
    solver: Option<PartialSolverConfig>,
    layout: Option<PartialLayout>,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub objective: Option<String>,
    pub max_iterations: Option<usize>,
    pub constraints: Option<Vec<String>>,
    pub seed: Option<u64>,
    pub set_values: Vec<String>,
}

impl From<&OptimizeArgs> for CliOverrides {
    fn from(args: &OptimizeArgs) -> Self {
        Self {
            objective: args.objective.clone(),
            max_iterations: args.max_iterations,
            constraints: args.constraints.clone(),
            seed: args.seed,
            set_values: args.set_values.clone(),
        }
    }
}

impl From<&EvaluateArgs> for CliOverrides {
    fn from(args: &EvaluateArgs) -> Self {
        Self {
            set_values: args.set_values.clone(),
            ..Self::default()
        }
    }
}

impl PartialOptimizationConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads `path` if given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    pub fn merge_with_cli(mut self, overrides: &CliOverrides) -> Result<core_config::OptimizationConfig> {
        self.apply_set_values(&overrides.set_values)?;

        let objective = self.objective.take().unwrap_or_default();
        let constraints = self.constraints.take().unwrap_or_default();
        let solver = self.solver.take().unwrap_or_default();

        let kind_name = overrides
            .objective
            .as_deref()
            .or(objective.kind.as_deref())
            .unwrap_or(DEFAULT_OBJECTIVE);
        let kind = parse_named::<ObjectiveKind>("objective.kind", kind_name)?;

        let mut builder = OptimizationConfigBuilder::new().objective(kind).max_outer_iterations(
            overrides
                .max_iterations
                .or(solver.max_outer_iterations)
                .unwrap_or(DEFAULT_MAX_OUTER_ITERATIONS),
        );

        builder = Self::merge_objective(builder, &objective)?;
        builder = builder.constraints(Self::merge_categories(
            overrides.constraints.as_deref().or(constraints.enabled.as_deref()),
            constraints.tolerances.as_ref(),
        )?);
        if let Some(rho) = constraints.rho {
            builder = builder.ks_rho(rho);
        }
        builder = Self::merge_solver(builder, &solver);
        builder = builder.layout(Self::merge_layout(self.layout.take(), overrides.seed));

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn merge_objective(
        mut builder: OptimizationConfigBuilder,
        partial: &PartialObjectiveConfig,
    ) -> Result<OptimizationConfigBuilder> {
        if let Some(scale) = partial.scale {
            builder = builder.objective_scale(scale);
        }
        if let Some(normalization) = &partial.gap_normalization {
            builder = builder.gap_normalization(parse_named::<GapNormalization>(
                "objective.gap-normalization",
                normalization,
            )?);
        }
        let mode = match partial.bounding_box.as_deref() {
            None | Some("exact") => BoundingBoxMode::Exact,
            Some("smooth") => BoundingBoxMode::Smooth {
                rho: partial
                    .bounding_box_rho
                    .unwrap_or(core_config::OptimizationConfig::DEFAULT_KS_RHO),
            },
            Some(other) => {
                return Err(CliError::Config(format!(
                    "Invalid value for objective.bounding-box: '{other}'. Expected 'exact' or 'smooth'."
                )));
            }
        };
        Ok(builder.bounding_box(mode))
    }

    /// Builds the enabled-category map. Without an explicit list every category is
    /// enabled; tolerances fall back to each category's default.
    fn merge_categories(
        enabled: Option<&[String]>,
        tolerances: Option<&BTreeMap<String, f64>>,
    ) -> Result<BTreeMap<InterferenceCategory, f64>> {
        let mut configured = BTreeMap::new();
        for (name, tolerance) in tolerances.into_iter().flatten() {
            let category = parse_named::<InterferenceCategory>("constraints.tolerances", name)?;
            configured.insert(category, *tolerance);
        }

        let categories: Vec<InterferenceCategory> = match enabled {
            None => InterferenceCategory::ALL.to_vec(),
            Some(names) => names
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty() && !n.eq_ignore_ascii_case("none"))
                .map(|n| parse_named::<InterferenceCategory>("constraints.enabled", n))
                .collect::<Result<_>>()?,
        };

        Ok(categories
            .into_iter()
            .map(|c| {
                let tolerance = configured.get(&c).copied().unwrap_or(c.default_tolerance());
                (c, tolerance)
            })
            .collect())
    }

    fn merge_solver(
        mut builder: OptimizationConfigBuilder,
        partial: &PartialSolverConfig,
    ) -> OptimizationConfigBuilder {
        if let Some(v) = partial.max_inner_iterations {
            builder = builder.max_inner_iterations(v);
        }
        if let Some(v) = partial.lbfgs_memory {
            builder = builder.lbfgs_memory(v);
        }
        if let Some(v) = partial.initial_penalty {
            builder = builder.initial_penalty(v);
        }
        if let Some(v) = partial.penalty_growth {
            builder = builder.penalty_growth(v);
        }
        if let Some(v) = partial.feasibility_tolerance {
            builder = builder.feasibility_tolerance(v);
        }
        if let Some(v) = partial.step_tolerance {
            builder = builder.step_tolerance(v);
        }
        if let Some(v) = partial.gradient_tolerance {
            builder = builder.gradient_tolerance(v);
        }
        if let Some(v) = partial.finite_difference_step {
            builder = builder.finite_difference_step(v);
        }
        if let Some(v) = partial.max_spheres_per_segment {
            builder = builder.max_spheres_per_segment(v);
        }
        builder
    }

    /// A `--seed` always selects a random layout, keeping any bounds from the file.
    fn merge_layout(partial: Option<PartialLayout>, seed: Option<u64>) -> LayoutGeneration {
        let default_min = [-DEFAULT_RANDOM_EXTENT; 3];
        let default_max = [DEFAULT_RANDOM_EXTENT; 3];
        match (partial, seed) {
            (Some(PartialLayout::Random { seed: file_seed, min, max }), cli_seed) => {
                LayoutGeneration::Random {
                    seed: cli_seed.or(file_seed).unwrap_or(0),
                    min: min.unwrap_or(default_min),
                    max: max.unwrap_or(default_max),
                }
            }
            (_, Some(seed)) => LayoutGeneration::Random {
                seed,
                min: default_min,
                max: default_max,
            },
            (Some(PartialLayout::Manual { design_vector }), None) => {
                LayoutGeneration::Manual(design_vector)
            }
            (Some(PartialLayout::Default) | None, None) => LayoutGeneration::Default,
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for pair in set_values {
            let (key, value) =
                parser::parse_assignment(pair).map_err(|e| CliError::Config(e.to_string()))?;

            if let Some(category) = key.strip_prefix("constraints.tolerances.") {
                self.constraints
                    .get_or_insert_with(Default::default)
                    .tolerances
                    .get_or_insert_with(Default::default)
                    .insert(category.to_string(), parse_value(key, value)?);
                continue;
            }

            match key {
                "objective.kind" => {
                    self.objective_mut().kind = Some(value.to_string());
                }
                "objective.scale" => {
                    self.objective_mut().scale = Some(parse_value(key, value)?);
                }
                "objective.bounding-box" => {
                    self.objective_mut().bounding_box = Some(value.to_string());
                }
                "objective.bounding-box-rho" => {
                    self.objective_mut().bounding_box_rho = Some(parse_value(key, value)?);
                }
                "objective.gap-normalization" => {
                    self.objective_mut().gap_normalization = Some(value.to_string());
                }
                "constraints.rho" => {
                    self.constraints.get_or_insert_with(Default::default).rho =
                        Some(parse_value(key, value)?);
                }
                "constraints.enabled" => {
                    self.constraints.get_or_insert_with(Default::default).enabled =
                        Some(value.split(',').map(str::to_string).collect());
                }
                "solver.max-outer-iterations" => {
                    self.solver_mut().max_outer_iterations = Some(parse_value(key, value)?);
                }
                "solver.max-inner-iterations" => {
                    self.solver_mut().max_inner_iterations = Some(parse_value(key, value)?);
                }
                "solver.lbfgs-memory" => {
                    self.solver_mut().lbfgs_memory = Some(parse_value(key, value)?);
                }
                "solver.initial-penalty" => {
                    self.solver_mut().initial_penalty = Some(parse_value(key, value)?);
                }
                "solver.penalty-growth" => {
                    self.solver_mut().penalty_growth = Some(parse_value(key, value)?);
                }
                "solver.feasibility-tolerance" => {
                    self.solver_mut().feasibility_tolerance = Some(parse_value(key, value)?);
                }
                "solver.step-tolerance" => {
                    self.solver_mut().step_tolerance = Some(parse_value(key, value)?);
                }
                "solver.gradient-tolerance" => {
                    self.solver_mut().gradient_tolerance = Some(parse_value(key, value)?);
                }
                "solver.finite-difference-step" => {
                    self.solver_mut().finite_difference_step = Some(parse_value(key, value)?);
                }
                "solver.max-spheres-per-segment" => {
                    self.solver_mut().max_spheres_per_segment = Some(parse_value(key, value)?);
                }
                "layout.seed" => {
                    let seed = parse_value(key, value)?;
                    self.layout = Some(match self.layout.take() {
                        Some(PartialLayout::Random { min, max, .. }) => PartialLayout::Random {
                            seed: Some(seed),
                            min,
                            max,
                        },
                        _ => PartialLayout::Random {
                            seed: Some(seed),
                            min: None,
                            max: None,
                        },
                    });
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{key}'"
                    )));
                }
            }
        }
        Ok(())
    }

    fn objective_mut(&mut self) -> &mut PartialObjectiveConfig {
        self.objective.get_or_insert_with(Default::default)
    }

    fn solver_mut(&mut self) -> &mut PartialSolverConfig {
        self.solver.get_or_insert_with(Default::default)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {key}: {value}",
            std::any::type_name::<T>()
        ))
    })
}

fn parse_named<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Unrecognized value for {key}: '{value}'")))
}

use crate::core::geometry::routing;
use crate::core::models::system::InterferenceCategory;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveKind {
    BoundingBoxVolume,
    AggregateGap,
}

impl FromStr for ObjectiveKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "bounding-box-volume" | "volume" => Ok(ObjectiveKind::BoundingBoxVolume),
            "aggregate-gap" | "gap" => Ok(ObjectiveKind::AggregateGap),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ObjectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectiveKind::BoundingBoxVolume => f.write_str("bounding-box-volume"),
            ObjectiveKind::AggregateGap => f.write_str("aggregate-gap"),
        }
    }
}

/// How the bounding-box objective aggregates sphere extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundingBoxMode {
    /// Exact min/max; not differentiable where the extreme sphere changes.
    Exact,
    /// KS-smoothed min/max with the given aggregation parameter.
    Smooth { rho: f64 },
}

/// How the aggregate-gap objective combines per-pair sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapNormalization {
    #[default]
    Sum,
    /// Divide by the number of object pairs.
    Mean,
}

impl FromStr for GapNormalization {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(GapNormalization::Sum),
            "mean" => Ok(GapNormalization::Mean),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveConfig {
    pub kind: ObjectiveKind,
    pub bounding_box: BoundingBoxMode,
    pub gap_normalization: GapNormalization,
    /// Multiplier applied to the objective before it reaches the solver.
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintConfig {
    /// KS aggregation parameter for interference measures.
    pub rho: f64,
    /// Enabled categories with their penetration tolerance.
    pub categories: BTreeMap<InterferenceCategory, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub max_outer_iterations: usize,
    pub max_inner_iterations: usize,
    pub lbfgs_memory: usize,
    pub initial_penalty: f64,
    pub penalty_growth: f64,
    pub feasibility_tolerance: f64,
    pub step_tolerance: f64,
    pub gradient_tolerance: f64,
}

/// How the starting design vector is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutGeneration {
    /// Base geometry with nodes on straight lines between ports.
    Default,
    /// An explicit design vector.
    Manual(Vec<f64>),
    /// Component reference points drawn uniformly inside `[min, max]`, rotations drawn
    /// uniformly in `[0, 2*pi)`, nodes on straight lines.
    Random {
        seed: u64,
        min: [f64; 3],
        max: [f64; 3],
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationConfig {
    pub objective: ObjectiveConfig,
    pub constraints: ConstraintConfig,
    pub solver: SolverConfig,
    pub finite_difference_step: f64,
    /// Most spheres any interconnect edge resolves to.
    pub max_spheres_per_segment: usize,
    pub layout: LayoutGeneration,
}

impl OptimizationConfig {
    pub const DEFAULT_KS_RHO: f64 = 100.0;
    pub const DEFAULT_MAX_INNER_ITERATIONS: usize = 100;
    pub const DEFAULT_LBFGS_MEMORY: usize = 7;
    pub const DEFAULT_INITIAL_PENALTY: f64 = 10.0;
    pub const DEFAULT_PENALTY_GROWTH: f64 = 10.0;
    pub const DEFAULT_FEASIBILITY_TOLERANCE: f64 = 1e-6;
    pub const DEFAULT_STEP_TOLERANCE: f64 = 1e-6;
    pub const DEFAULT_GRADIENT_TOLERANCE: f64 = 1e-8;
    pub const DEFAULT_FINITE_DIFFERENCE_STEP: f64 = 1e-6;
    pub const DEFAULT_MAX_SPHERES_PER_SEGMENT: usize = routing::DEFAULT_MAX_SPHERES_PER_SEGMENT;
}

#[derive(Default)]
pub struct OptimizationConfigBuilder {
    objective: Option<ObjectiveKind>,
    bounding_box: Option<BoundingBoxMode>,
    gap_normalization: Option<GapNormalization>,
    objective_scale: Option<f64>,
    ks_rho: Option<f64>,
    categories: Option<BTreeMap<InterferenceCategory, f64>>,
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
    layout: Option<LayoutGeneration>,
}

impl OptimizationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objective(mut self, kind: ObjectiveKind) -> Self {
        self.objective = Some(kind);
        self
    }
    pub fn bounding_box(mut self, mode: BoundingBoxMode) -> Self {
        self.bounding_box = Some(mode);
        self
    }
    pub fn gap_normalization(mut self, normalization: GapNormalization) -> Self {
        self.gap_normalization = Some(normalization);
        self
    }
    pub fn objective_scale(mut self, scale: f64) -> Self {
        self.objective_scale = Some(scale);
        self
    }
    pub fn ks_rho(mut self, rho: f64) -> Self {
        self.ks_rho = Some(rho);
        self
    }
    /// Enables exactly the given categories with their tolerances.
    pub fn constraints(mut self, categories: BTreeMap<InterferenceCategory, f64>) -> Self {
        self.categories = Some(categories);
        self
    }
    /// Enables one category, keeping any already enabled.
    pub fn enable_constraint(mut self, category: InterferenceCategory, tolerance: f64) -> Self {
        self.categories
            .get_or_insert_with(BTreeMap::new)
            .insert(category, tolerance);
        self
    }
    pub fn max_outer_iterations(mut self, iterations: usize) -> Self {
        self.max_outer_iterations = Some(iterations);
        self
    }
    pub fn max_inner_iterations(mut self, iterations: usize) -> Self {
        self.max_inner_iterations = Some(iterations);
        self
    }
    pub fn lbfgs_memory(mut self, memory: usize) -> Self {
        self.lbfgs_memory = Some(memory);
        self
    }
    pub fn initial_penalty(mut self, penalty: f64) -> Self {
        self.initial_penalty = Some(penalty);
        self
    }
    pub fn penalty_growth(mut self, growth: f64) -> Self {
        self.penalty_growth = Some(growth);
        self
    }
    pub fn feasibility_tolerance(mut self, tolerance: f64) -> Self {
        self.feasibility_tolerance = Some(tolerance);
        self
    }
    pub fn step_tolerance(mut self, tolerance: f64) -> Self {
        self.step_tolerance = Some(tolerance);
        self
    }
    pub fn gradient_tolerance(mut self, tolerance: f64) -> Self {
        self.gradient_tolerance = Some(tolerance);
        self
    }
    pub fn finite_difference_step(mut self, step: f64) -> Self {
        self.finite_difference_step = Some(step);
        self
    }
    pub fn max_spheres_per_segment(mut self, limit: usize) -> Self {
        self.max_spheres_per_segment = Some(limit);
        self
    }
    pub fn layout(mut self, layout: LayoutGeneration) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Assembles the configuration.
    ///
    /// The objective kind and the outer iteration budget are required. Every other
    /// setting falls back to the constants on [`OptimizationConfig`]; when no constraint
    /// categories are given, all four are enabled with their default tolerances.
    pub fn build(self) -> Result<OptimizationConfig, ConfigError> {
        let kind = self
            .objective
            .ok_or(ConfigError::MissingParameter("objective"))?;
        let max_outer_iterations = self
            .max_outer_iterations
            .ok_or(ConfigError::MissingParameter("max_outer_iterations"))?;

        let bounding_box = self.bounding_box.unwrap_or(BoundingBoxMode::Exact);
        if let BoundingBoxMode::Smooth { rho } = bounding_box {
            require_positive("bounding_box_rho", rho)?;
        }
        let scale = self.objective_scale.unwrap_or(1.0);
        require_positive("objective_scale", scale)?;

        let rho = self.ks_rho.unwrap_or(OptimizationConfig::DEFAULT_KS_RHO);
        require_positive("ks_rho", rho)?;
        let categories = self.categories.unwrap_or_else(|| {
            InterferenceCategory::ALL
                .iter()
                .map(|c| (*c, c.default_tolerance()))
                .collect()
        });
        if let Some((category, tolerance)) = categories.iter().find(|(_, t)| !t.is_finite()) {
            return Err(ConfigError::InvalidValue {
                parameter: "constraint_tolerance",
                reason: format!("tolerance for {category} must be finite, got {tolerance}"),
            });
        }

        let solver = SolverConfig {
            max_outer_iterations,
            max_inner_iterations: self
                .max_inner_iterations
                .unwrap_or(OptimizationConfig::DEFAULT_MAX_INNER_ITERATIONS),
            lbfgs_memory: self
                .lbfgs_memory
                .unwrap_or(OptimizationConfig::DEFAULT_LBFGS_MEMORY),
            initial_penalty: self
                .initial_penalty
                .unwrap_or(OptimizationConfig::DEFAULT_INITIAL_PENALTY),
            penalty_growth: self
                .penalty_growth
                .unwrap_or(OptimizationConfig::DEFAULT_PENALTY_GROWTH),
            feasibility_tolerance: self
                .feasibility_tolerance
                .unwrap_or(OptimizationConfig::DEFAULT_FEASIBILITY_TOLERANCE),
            step_tolerance: self
                .step_tolerance
                .unwrap_or(OptimizationConfig::DEFAULT_STEP_TOLERANCE),
            gradient_tolerance: self
                .gradient_tolerance
                .unwrap_or(OptimizationConfig::DEFAULT_GRADIENT_TOLERANCE),
        };
        if solver.lbfgs_memory == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "lbfgs_memory",
                reason: "must be at least 1".to_string(),
            });
        }
        require_positive("initial_penalty", solver.initial_penalty)?;
        if solver.penalty_growth.is_nan() || solver.penalty_growth <= 1.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "penalty_growth",
                reason: format!("must be greater than 1, got {}", solver.penalty_growth),
            });
        }
        require_non_negative("feasibility_tolerance", solver.feasibility_tolerance)?;
        require_non_negative("step_tolerance", solver.step_tolerance)?;
        require_non_negative("gradient_tolerance", solver.gradient_tolerance)?;

        let finite_difference_step = self
            .finite_difference_step
            .unwrap_or(OptimizationConfig::DEFAULT_FINITE_DIFFERENCE_STEP);
        require_positive("finite_difference_step", finite_difference_step)?;

        let max_spheres_per_segment = self
            .max_spheres_per_segment
            .unwrap_or(OptimizationConfig::DEFAULT_MAX_SPHERES_PER_SEGMENT);
        if max_spheres_per_segment == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "max_spheres_per_segment",
                reason: "must be at least 1".to_string(),
            });
        }

        let layout = self.layout.unwrap_or(LayoutGeneration::Default);
        if let LayoutGeneration::Random { min, max, .. } = &layout {
            if min.iter().zip(max).any(|(lo, hi)| !lo.is_finite() || !hi.is_finite() || lo > hi) {
                return Err(ConfigError::InvalidValue {
                    parameter: "layout_bounds",
                    reason: format!("min {min:?} must not exceed max {max:?}"),
                });
            }
        }

        Ok(OptimizationConfig {
            objective: ObjectiveConfig {
                kind,
                bounding_box,
                gap_normalization: self.gap_normalization.unwrap_or_default(),
                scale,
            },
            constraints: ConstraintConfig { rho, categories },
            solver,
            finite_difference_step,
            max_spheres_per_segment,
            layout,
        })
    }
}

fn require_positive(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            parameter,
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn require_non_negative(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            parameter,
            reason: format!("must be non-negative, got {value}"),
        })
    }
}

use super::config::LayoutGeneration;
use super::error::EngineError;
use crate::core::models::positions::PositionsMap;
use crate::core::models::system::SpatialSystem;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use tracing::debug;

/// A spatial system together with its current design vector and resolved geometry.
///
/// The design-vector layout is fixed by the system for the lifetime of the
/// configuration. [`Self::calculate_positions`] is a pure function of its argument; only
/// [`Self::set_design_vector`] changes the stored state.
#[derive(Debug, Clone)]
pub struct SpatialConfiguration {
    system: SpatialSystem,
    design_vector: Vec<f64>,
    positions: PositionsMap,
}

impl SpatialConfiguration {
    /// Creates a configuration at the default layout.
    pub fn new(system: SpatialSystem) -> Result<Self, EngineError> {
        Self::with_layout(system, &LayoutGeneration::Default)
    }

    /// Creates a configuration at a generated starting layout.
    pub fn with_layout(system: SpatialSystem, layout: &LayoutGeneration) -> Result<Self, EngineError> {
        let design_vector = generate_layout(&system, layout)?;
        let positions = system.resolve(&design_vector)?;
        Ok(Self {
            system,
            design_vector,
            positions,
        })
    }

    pub fn system(&self) -> &SpatialSystem {
        &self.system
    }

    pub fn design_len(&self) -> usize {
        self.system.design_len()
    }

    pub fn design_vector(&self) -> &[f64] {
        &self.design_vector
    }

    /// Positions resolved for the stored design vector.
    pub fn positions(&self) -> &PositionsMap {
        &self.positions
    }

    /// Resolves every object for `design_vector` without touching the stored state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DesignVectorLength`] if the vector does not match the
    /// system's layout.
    pub fn calculate_positions(&self, design_vector: &[f64]) -> Result<PositionsMap, EngineError> {
        self.check_len(design_vector)?;
        Ok(self.system.resolve(design_vector)?)
    }

    /// Stores a new design vector and the positions it resolves to.
    pub fn set_design_vector(&mut self, design_vector: Vec<f64>) -> Result<(), EngineError> {
        let positions = self.calculate_positions(&design_vector)?;
        self.design_vector = design_vector;
        self.positions = positions;
        Ok(())
    }

    fn check_len(&self, design_vector: &[f64]) -> Result<(), EngineError> {
        let expected = self.design_len();
        if design_vector.len() == expected {
            Ok(())
        } else {
            Err(EngineError::DesignVectorLength {
                expected,
                found: design_vector.len(),
            })
        }
    }
}

/// Produces a starting design vector for `system`.
pub fn generate_layout(system: &SpatialSystem, layout: &LayoutGeneration) -> Result<Vec<f64>, EngineError> {
    match layout {
        LayoutGeneration::Default => Ok(system.default_design_vector()?),
        LayoutGeneration::Manual(design) => {
            if design.len() != system.design_len() {
                return Err(EngineError::DesignVectorLength {
                    expected: system.design_len(),
                    found: design.len(),
                });
            }
            Ok(design.clone())
        }
        LayoutGeneration::Random { seed, min, max } => {
            let mut rng = StdRng::seed_from_u64(*seed);
            let mut design = Vec::with_capacity(system.component_design_len());
            for component in system.components() {
                let len = component.design_len();
                if len >= 3 {
                    design.extend((0..3).map(|axis| rng.gen_range(min[axis]..=max[axis])));
                }
                design.extend((3..len).map(|_| rng.gen_range(0.0..TAU)));
            }
            debug!(seed, "Generated random component layout");
            Ok(system.with_straight_line_nodes(design)?)
        }
    }
}

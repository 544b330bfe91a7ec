use crate::core::geometry::aggregation::kreisselmeier_steinhauser;
use crate::core::geometry::distance::sphere_signed_distance;
use crate::core::models::positions::{MissingObjectError, PositionsMap};
use crate::core::models::system::{InterferenceCategory, SpatialSystem};

/// Smooth maximum penetration depth over every sphere pair of every object pair in one
/// interference category.
///
/// The value is `KS(rho, -(signed distance))`, so it is positive when any two spheres
/// overlap and negative when the closest pair is apart. The category is feasible when
/// the value does not exceed `tolerance`.
#[derive(Debug, Clone, PartialEq)]
pub struct InterferenceConstraint {
    pub category: InterferenceCategory,
    pub tolerance: f64,
    pub rho: f64,
    pairs: Vec<(String, String)>,
}

impl InterferenceConstraint {
    /// Builds the constraint for `category`, or `None` if the system has no object pair
    /// in that category.
    pub fn new(
        system: &SpatialSystem,
        category: InterferenceCategory,
        tolerance: f64,
        rho: f64,
    ) -> Option<Self> {
        let pairs = system.interference_pairs(category);
        (!pairs.is_empty()).then(|| Self {
            category,
            tolerance,
            rho,
            pairs: pairs.to_vec(),
        })
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn evaluate(&self, positions: &PositionsMap) -> Result<f64, MissingObjectError> {
        let mut penetrations = Vec::new();
        for (first, second) in &self.pairs {
            let a = positions.get(first)?;
            let b = positions.get(second)?;
            for (ca, ra) in a.iter() {
                for (cb, rb) in b.iter() {
                    penetrations.push(-sphere_signed_distance(ca, ra, cb, rb));
                }
            }
        }
        Ok(kreisselmeier_steinhauser(&penetrations, self.rho))
    }

    pub fn is_feasible(&self, value: f64) -> bool {
        value <= self.tolerance
    }
}

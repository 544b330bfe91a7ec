use super::object::{Color, SphereSet, validate_name};
use super::validation::ValidationError;

/// A static obstacle. Its spheres never move.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    name: String,
    color: Color,
    spheres: SphereSet,
}

impl Structure {
    pub fn new(name: &str, color: Color, spheres: SphereSet) -> Result<Self, ValidationError> {
        Ok(Self {
            name: validate_name(name)?,
            color,
            spheres,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    pub fn resolve(&self) -> SphereSet {
        self.spheres.clone()
    }
}

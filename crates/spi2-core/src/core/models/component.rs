use super::object::{Color, DegreesOfFreedom, MovementClass, SphereSet, validate_name};
use super::validation::ValidationError;
use crate::core::geometry::transform::transform_points;
use nalgebra::{Point3, Vector3};

/// A rigid object placed by the optimizer.
///
/// A component keeps its *base* sphere geometry as loaded from the input. Its world
/// geometry for a given design-vector slice is always recomputed from the base, so
/// resolving the same slice twice yields identical spheres.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    name: String,
    color: Color,
    movement_class: MovementClass,
    degrees_of_freedom: DegreesOfFreedom,
    base: SphereSet,
    design_len: usize,
}

impl Component {
    /// Creates a component and fixes the length of its design-vector slice.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotImplemented`] for fully dependent components and for
    /// degree-of-freedom subsets other than none, translation, or translation plus
    /// rotation.
    pub fn new(
        name: &str,
        color: Color,
        movement_class: MovementClass,
        degrees_of_freedom: DegreesOfFreedom,
        base: SphereSet,
    ) -> Result<Self, ValidationError> {
        let name = validate_name(name)?;
        let design_len = match movement_class {
            MovementClass::Static => 0,
            MovementClass::Independent => degrees_of_freedom.design_len(&name)?,
            MovementClass::FullyDependent => {
                return Err(ValidationError::NotImplemented {
                    name,
                    detail: "fully dependent components are not supported".to_string(),
                });
            }
        };
        Ok(Self {
            name,
            color,
            movement_class,
            degrees_of_freedom,
            base,
            design_len,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    pub fn movement_class(&self) -> MovementClass {
        self.movement_class
    }

    pub fn degrees_of_freedom(&self) -> &DegreesOfFreedom {
        &self.degrees_of_freedom
    }

    pub fn base(&self) -> &SphereSet {
        &self.base
    }

    /// The reference point of the base geometry.
    pub fn base_reference_point(&self) -> Point3<f64> {
        self.base
            .reference_point()
            .copied()
            .unwrap_or_else(Point3::origin)
    }

    /// Number of design variables this component owns: 0, 3 or 6.
    pub fn design_len(&self) -> usize {
        self.design_len
    }

    /// The design-vector slice that reproduces the base geometry: the base reference
    /// point followed by zero rotation when rotation is free.
    pub fn initial_design_vector(&self) -> Vec<f64> {
        let reference = self.base_reference_point();
        let mut slice: Vec<f64> = reference.coords.iter().copied().collect();
        slice.resize(self.design_len, 0.0);
        slice
    }

    /// Computes world geometry for the design slice `design`.
    ///
    /// The reference point lands on `design[0..3]` and rotation by `design[3..6]` happens
    /// about it. A component with an empty slice resolves to its base geometry.
    pub fn resolve(&self, design: &[f64]) -> SphereSet {
        if design.len() < 3 {
            return self.base.clone();
        }
        let reference = self.base_reference_point();
        let target = Vector3::new(design[0], design[1], design[2]);
        let translation = target - reference.coords;
        let rotation = if design.len() >= 6 {
            Vector3::new(design[3], design[4], design[5])
        } else {
            Vector3::zeros()
        };
        let positions = transform_points(self.base.positions(), &translation, &rotation, &reference);
        SphereSet::from_parts(positions, self.base.radii().to_vec())
    }
}

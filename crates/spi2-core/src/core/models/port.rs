use super::object::{Color, SphereSet, validate_name};
use super::validation::ValidationError;
use nalgebra::Vector3;

/// A connection point rigidly offset from a parent component's reference point.
///
/// Ports own no design variables. The offset is applied in world axes; it does not follow
/// the parent's rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    name: String,
    local_name: String,
    component: String,
    offset: Vector3<f64>,
    radius: f64,
    color: Color,
}

impl Port {
    /// Creates the port `local_name` on `component`, named `{component}_{local_name}_port`.
    pub fn new(
        component: &str,
        local_name: &str,
        offset: Vector3<f64>,
        radius: f64,
        color: Color,
    ) -> Result<Self, ValidationError> {
        let local_name = validate_name(local_name)?;
        let name = Self::qualified_name(component, &local_name);
        if !offset.iter().all(|c| c.is_finite()) {
            return Err(ValidationError::InvalidPosition { name, row: 0 });
        }
        if !radius.is_finite() || radius < 0.0 {
            return Err(ValidationError::InvalidRadius {
                name,
                row: 0,
                value: radius,
            });
        }
        Ok(Self {
            name,
            local_name,
            component: component.to_string(),
            offset,
            radius,
            color,
        })
    }

    /// The system-wide name of port `port` on `component`.
    pub fn qualified_name(component: &str, port: &str) -> String {
        format!("{component}_{port}_port")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn offset(&self) -> &Vector3<f64> {
        &self.offset
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    /// Places the port relative to its parent's resolved spheres.
    pub fn resolve(&self, parent: &SphereSet) -> Option<SphereSet> {
        parent
            .reference_point()
            .map(|reference| SphereSet::single(reference + self.offset, self.radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn port() -> Port {
        Port::new(
            "pump",
            "supply",
            Vector3::new(0.5, 0.0, 0.0),
            0.1,
            Color::parse("p", "black").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn name_is_qualified_by_component() {
        assert_eq!(port().name(), "pump_supply_port");
        assert_eq!(port().local_name(), "supply");
    }

    #[test]
    fn resolve_follows_parent_reference_point() {
        let parent = SphereSet::new(
            "pump",
            vec![Point3::new(1.0, 2.0, 3.0), Point3::new(9.0, 9.0, 9.0)],
            vec![1.0, 1.0],
        )
        .unwrap();
        let resolved = port().resolve(&parent).unwrap();
        assert_eq!(resolved.positions(), &[Point3::new(1.5, 2.0, 3.0)]);
        assert_eq!(resolved.radii(), &[0.1]);
    }

    #[test]
    fn negative_radius_is_rejected() {
        let err = Port::new(
            "pump",
            "supply",
            Vector3::zeros(),
            -1.0,
            Color::parse("p", "black").unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRadius { .. }));
    }
}

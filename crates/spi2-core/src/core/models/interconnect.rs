use super::object::{Color, SphereSet, validate_name};
use super::port::Port;
use super::positions::{MissingObjectError, PositionsMap};
use super::validation::ValidationError;
use crate::core::geometry::routing::{route_segment, sphere_count};
use nalgebra::Point3;

/// A movable waypoint of an interconnect, represented by a single sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct InterconnectNode {
    name: String,
    radius: f64,
}

impl InterconnectNode {
    /// Number of design variables a node owns.
    pub const DESIGN_LEN: usize = 3;

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn resolve(&self, design: &[f64]) -> SphereSet {
        let center = match design {
            [x, y, z, ..] => Point3::new(*x, *y, *z),
            _ => Point3::origin(),
        };
        SphereSet::single(center, self.radius)
    }
}

/// A straight interconnect segment between two named endpoints (ports or nodes).
#[derive(Debug, Clone, PartialEq)]
pub struct InterconnectEdge {
    name: String,
    start: String,
    end: String,
    radius: f64,
}

impl InterconnectEdge {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    /// Routes a sphere chain of at most `max_spheres` spheres between the resolved
    /// reference points of both endpoints.
    pub fn resolve(
        &self,
        positions: &PositionsMap,
        max_spheres: usize,
    ) -> Result<SphereSet, MissingObjectError> {
        let (start, end) = self.endpoints(positions)?;
        Ok(route_segment(&start, &end, self.radius, max_spheres))
    }

    /// Whether the chain between the resolved endpoints needs more than `max_spheres`
    /// spheres, in which case [`Self::resolve`] samples it sparsely.
    pub fn exceeds(
        &self,
        positions: &PositionsMap,
        max_spheres: usize,
    ) -> Result<bool, MissingObjectError> {
        let (start, end) = self.endpoints(positions)?;
        Ok(sphere_count(&start, &end, self.radius) > max_spheres)
    }

    fn endpoints(
        &self,
        positions: &PositionsMap,
    ) -> Result<(Point3<f64>, Point3<f64>), MissingObjectError> {
        Ok((
            positions.reference_point(&self.start)?,
            positions.reference_point(&self.end)?,
        ))
    }
}

/// One resolvable piece of an interconnect.
#[derive(Debug, Clone, PartialEq)]
pub enum InterconnectElement {
    Node(InterconnectNode),
    Edge(InterconnectEdge),
}

impl InterconnectElement {
    pub fn name(&self) -> &str {
        match self {
            InterconnectElement::Node(node) => node.name(),
            InterconnectElement::Edge(edge) => edge.name(),
        }
    }

    /// Resolves the element: nodes read their design slice, edges read the positions of
    /// their endpoints and hold at most `max_spheres` spheres.
    pub fn resolve(
        &self,
        design: &[f64],
        positions: &PositionsMap,
        max_spheres: usize,
    ) -> Result<SphereSet, MissingObjectError> {
        match self {
            InterconnectElement::Node(node) => Ok(node.resolve(design)),
            InterconnectElement::Edge(edge) => edge.resolve(positions, max_spheres),
        }
    }
}

/// A flexible connection routed from one component port to another.
///
/// An interconnect with `n` bends owns `n` nodes (`{name}_node_{i}`) and `n + 1` edges
/// (`{name}_edge_{i}`) chaining port, nodes and port in order. Elements are created once
/// and only ever repositioned.
#[derive(Debug, Clone, PartialEq)]
pub struct Interconnect {
    name: String,
    port_1: String,
    port_2: String,
    radius: f64,
    color: Color,
    elements: Vec<InterconnectElement>,
}

impl Interconnect {
    /// Creates an interconnect between port `port_1` of `component_1` and port `port_2`
    /// of `component_2` with `bends` intermediate nodes.
    pub fn new(
        name: &str,
        (component_1, port_1): (&str, &str),
        (component_2, port_2): (&str, &str),
        radius: f64,
        color: Color,
        bends: usize,
    ) -> Result<Self, ValidationError> {
        let name = validate_name(name)?;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ValidationError::InvalidInterconnectRadius { name, radius });
        }
        let port_1 = Port::qualified_name(component_1, port_1);
        let port_2 = Port::qualified_name(component_2, port_2);

        let nodes: Vec<InterconnectNode> = (0..bends)
            .map(|i| InterconnectNode {
                name: format!("{name}_node_{i}"),
                radius,
            })
            .collect();

        let waypoints: Vec<String> = std::iter::once(port_1.clone())
            .chain(nodes.iter().map(|n| n.name.clone()))
            .chain(std::iter::once(port_2.clone()))
            .collect();
        let edges = waypoints
            .windows(2)
            .enumerate()
            .map(|(i, pair)| InterconnectEdge {
                name: format!("{name}_edge_{i}"),
                start: pair[0].clone(),
                end: pair[1].clone(),
                radius,
            });

        let elements = nodes
            .into_iter()
            .map(InterconnectElement::Node)
            .chain(edges.map(InterconnectElement::Edge))
            .collect();

        Ok(Self {
            name,
            port_1,
            port_2,
            radius,
            color,
            elements,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Qualified name of the starting port.
    pub fn port_1(&self) -> &str {
        &self.port_1
    }

    /// Qualified name of the ending port.
    pub fn port_2(&self) -> &str {
        &self.port_2
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    /// All elements, nodes first, then edges in chain order.
    pub fn elements(&self) -> &[InterconnectElement] {
        &self.elements
    }

    pub fn nodes(&self) -> impl Iterator<Item = &InterconnectNode> {
        self.elements.iter().filter_map(|e| match e {
            InterconnectElement::Node(n) => Some(n),
            InterconnectElement::Edge(_) => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = &InterconnectEdge> {
        self.elements.iter().filter_map(|e| match e {
            InterconnectElement::Edge(edge) => Some(edge),
            InterconnectElement::Node(_) => None,
        })
    }

    pub fn bends(&self) -> usize {
        self.nodes().count()
    }

    /// Node positions evenly spread on the straight line between the two ports.
    pub fn straight_line_nodes(&self, start: &Point3<f64>, end: &Point3<f64>) -> Vec<Point3<f64>> {
        let segments = (self.bends() + 1) as f64;
        (1..=self.bends())
            .map(|i| start + (end - start) * (i as f64 / segments))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::routing::DEFAULT_MAX_SPHERES_PER_SEGMENT;

    fn interconnect(bends: usize) -> Interconnect {
        Interconnect::new(
            "hose",
            ("pump", "out"),
            ("tank", "in"),
            0.25,
            Color::parse("hose", "black").unwrap(),
            bends,
        )
        .unwrap()
    }

    #[test]
    fn elements_follow_naming_rules() {
        let ic = interconnect(2);
        let names: Vec<&str> = ic.elements().iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec![
                "hose_node_0",
                "hose_node_1",
                "hose_edge_0",
                "hose_edge_1",
                "hose_edge_2"
            ]
        );
    }

    #[test]
    fn edges_chain_ports_through_nodes() {
        let ic = interconnect(1);
        let edges: Vec<(&str, &str)> = ic.edges().map(|e| (e.start(), e.end())).collect();
        assert_eq!(
            edges,
            vec![("pump_out_port", "hose_node_0"), ("hose_node_0", "tank_in_port")]
        );
    }

    #[test]
    fn zero_bends_give_a_single_direct_edge() {
        let ic = interconnect(0);
        assert_eq!(ic.bends(), 0);
        assert_eq!(ic.edges().count(), 1);
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let err = Interconnect::new(
            "hose",
            ("a", "b"),
            ("c", "d"),
            0.0,
            Color::parse("hose", "black").unwrap(),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidInterconnectRadius { .. }));
    }

    #[test]
    fn straight_line_nodes_are_evenly_spaced() {
        let ic = interconnect(3);
        let nodes = ic.straight_line_nodes(&Point3::origin(), &Point3::new(4.0, 0.0, 0.0));
        assert_eq!(
            nodes,
            vec![
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0)
            ]
        );
    }

    #[test]
    fn edge_resolution_requires_endpoints() {
        let ic = interconnect(0);
        let edge = InterconnectElement::Edge(ic.edges().next().unwrap().clone());
        let mut positions = PositionsMap::new();
        assert!(edge.resolve(&[], &positions, DEFAULT_MAX_SPHERES_PER_SEGMENT).is_err());

        positions.insert("pump_out_port", SphereSet::single(Point3::origin(), 0.1));
        positions.insert("tank_in_port", SphereSet::single(Point3::new(2.0, 0.0, 0.0), 0.1));
        let chain = edge.resolve(&[], &positions, DEFAULT_MAX_SPHERES_PER_SEGMENT).unwrap();
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.positions()[3], Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn node_resolution_reads_its_design_slice() {
        let ic = interconnect(1);
        let node = &ic.elements()[0];
        let spheres = node
            .resolve(&[1.0, 2.0, 3.0], &PositionsMap::new(), DEFAULT_MAX_SPHERES_PER_SEGMENT)
            .unwrap();
        assert_eq!(spheres.positions(), &[Point3::new(1.0, 2.0, 3.0)]);
        assert_eq!(spheres.radii(), &[0.25]);
    }

    #[test]
    fn stretched_edge_is_capped_and_flagged() {
        let ic = interconnect(0);
        let edge = ic.edges().next().unwrap().clone();
        let mut positions = PositionsMap::new();
        positions.insert("pump_out_port", SphereSet::single(Point3::origin(), 0.1));
        positions.insert("tank_in_port", SphereSet::single(Point3::new(1e4, 0.0, 0.0), 0.1));
        assert!(edge.exceeds(&positions, 100).unwrap());
        assert_eq!(edge.resolve(&positions, 100).unwrap().len(), 100);
        assert!(!edge.exceeds(&positions, DEFAULT_MAX_SPHERES_PER_SEGMENT * 100).unwrap());
    }
}

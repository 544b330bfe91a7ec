use super::component::Component;
use super::ids::ObjectId;
use super::interconnect::{Interconnect, InterconnectElement, InterconnectNode};
use super::port::Port;
use super::positions::{MissingObjectError, PositionsMap};
use super::structure::Structure;
use super::validation::ValidationError;
use crate::core::geometry::routing::DEFAULT_MAX_SPHERES_PER_SEGMENT;
use itertools::Itertools;
use slotmap::SlotMap;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// A single object stored in a [`SpatialSystem`].
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialObject {
    Component(Component),
    Port(Port),
    Interconnect(Interconnect),
    Structure(Structure),
}

impl SpatialObject {
    pub fn name(&self) -> &str {
        match self {
            SpatialObject::Component(c) => c.name(),
            SpatialObject::Port(p) => p.name(),
            SpatialObject::Interconnect(i) => i.name(),
            SpatialObject::Structure(s) => s.name(),
        }
    }

    /// Resolution tier. Objects of a lower tier never read objects of a higher one.
    fn tier(&self) -> u8 {
        match self {
            SpatialObject::Component(_) | SpatialObject::Structure(_) => 0,
            SpatialObject::Port(_) => 1,
            SpatialObject::Interconnect(_) => 2,
        }
    }
}

/// Families of object pairs checked for geometric interference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InterferenceCategory {
    ComponentComponent,
    ComponentInterconnect,
    InterconnectInterconnect,
    StructureAll,
}

impl InterferenceCategory {
    pub const ALL: [InterferenceCategory; 4] = [
        InterferenceCategory::ComponentComponent,
        InterferenceCategory::ComponentInterconnect,
        InterferenceCategory::InterconnectInterconnect,
        InterferenceCategory::StructureAll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InterferenceCategory::ComponentComponent => "component-component",
            InterferenceCategory::ComponentInterconnect => "component-interconnect",
            InterferenceCategory::InterconnectInterconnect => "interconnect-interconnect",
            InterferenceCategory::StructureAll => "structure-all",
        }
    }

    /// Maximum tolerated penetration depth used when none is configured.
    pub fn default_tolerance(&self) -> f64 {
        match self {
            InterferenceCategory::ComponentInterconnect => 0.2,
            _ => 0.0,
        }
    }
}

impl fmt::Display for InterferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterferenceCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "component-component" | "cc" => Ok(InterferenceCategory::ComponentComponent),
            "component-interconnect" | "ci" => Ok(InterferenceCategory::ComponentInterconnect),
            "interconnect-interconnect" | "ii" => {
                Ok(InterferenceCategory::InterconnectInterconnect)
            }
            "structure-all" | "sa" => Ok(InterferenceCategory::StructureAll),
            _ => Err(()),
        }
    }
}

/// Where each independent object's variables live in the flat design vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignLayout {
    components: Vec<(ObjectId, Range<usize>)>,
    nodes: Vec<(ObjectId, usize, Range<usize>)>,
    len: usize,
}

impl DesignLayout {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn component_range(&self, id: ObjectId) -> Option<Range<usize>> {
        self.components
            .iter()
            .find(|(cid, _)| *cid == id)
            .map(|(_, r)| r.clone())
    }

    /// Range of the `index`-th element of interconnect `id`, if that element is a node.
    pub fn node_range(&self, id: ObjectId, index: usize) -> Option<Range<usize>> {
        self.nodes
            .iter()
            .find(|(iid, i, _)| *iid == id && *i == index)
            .map(|(_, _, r)| r.clone())
    }
}

/// An immutable, validated collection of objects with a fixed evaluation order,
/// design-vector layout and interference pair lists.
#[derive(Debug, Clone, Default)]
pub struct SpatialSystem {
    objects: SlotMap<ObjectId, SpatialObject>,
    name_index: HashMap<String, ObjectId>,
    insertion_order: Vec<ObjectId>,
    evaluation_order: Vec<ObjectId>,
    layout: DesignLayout,
    pairs: BTreeMap<InterferenceCategory, Vec<(String, String)>>,
    segment_limit: Option<usize>,
}

impl SpatialSystem {
    pub fn builder() -> SpatialSystemBuilder {
        SpatialSystemBuilder::default()
    }

    pub fn object(&self, id: ObjectId) -> Option<&SpatialObject> {
        self.objects.get(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.name_index.get(name).copied()
    }

    /// Objects in input order.
    pub fn objects_iter(&self) -> impl Iterator<Item = (ObjectId, &SpatialObject)> {
        self.insertion_order
            .iter()
            .filter_map(|&id| self.objects.get(id).map(|o| (id, o)))
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.objects_iter().filter_map(|(_, o)| match o {
            SpatialObject::Component(c) => Some(c),
            _ => None,
        })
    }

    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.objects_iter().filter_map(|(_, o)| match o {
            SpatialObject::Port(p) => Some(p),
            _ => None,
        })
    }

    pub fn interconnects(&self) -> impl Iterator<Item = &Interconnect> {
        self.objects_iter().filter_map(|(_, o)| match o {
            SpatialObject::Interconnect(i) => Some(i),
            _ => None,
        })
    }

    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.objects_iter().filter_map(|(_, o)| match o {
            SpatialObject::Structure(s) => Some(s),
            _ => None,
        })
    }

    pub fn layout(&self) -> &DesignLayout {
        &self.layout
    }

    pub fn design_len(&self) -> usize {
        self.layout.len()
    }

    /// Object-name pairs checked for interference in `category`.
    pub fn interference_pairs(&self, category: InterferenceCategory) -> &[(String, String)] {
        self.pairs.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Caps the spheres of every interconnect edge at `limit`.
    pub fn with_segment_limit(mut self, limit: usize) -> Self {
        self.segment_limit = Some(limit);
        self
    }

    /// Most spheres any interconnect edge resolves to.
    pub fn segment_limit(&self) -> usize {
        self.segment_limit.unwrap_or(DEFAULT_MAX_SPHERES_PER_SEGMENT)
    }

    /// Names of the edges that `positions` stretches beyond [`Self::segment_limit`].
    pub fn stretched_edges(&self, positions: &PositionsMap) -> Result<Vec<String>, MissingObjectError> {
        let limit = self.segment_limit();
        let mut stretched = Vec::new();
        for edge in self.interconnects().flat_map(|ic| ic.edges()) {
            if edge.exceeds(positions, limit)? {
                stretched.push(edge.name().to_string());
            }
        }
        Ok(stretched)
    }

    /// Resolves every object for `design` in dependency order.
    ///
    /// `design` must have exactly [`Self::design_len`] entries; callers check this.
    pub fn resolve(&self, design: &[f64]) -> Result<PositionsMap, MissingObjectError> {
        let mut positions = PositionsMap::new();
        for &id in &self.evaluation_order {
            let Some(object) = self.objects.get(id) else {
                continue;
            };
            match object {
                SpatialObject::Component(c) => {
                    let slice = self
                        .layout
                        .component_range(id)
                        .and_then(|r| design.get(r))
                        .unwrap_or(&[]);
                    positions.insert(c.name(), c.resolve(slice));
                }
                SpatialObject::Structure(s) => positions.insert(s.name(), s.resolve()),
                SpatialObject::Port(p) => {
                    let parent = positions.get(p.component())?;
                    let spheres = p
                        .resolve(parent)
                        .ok_or_else(|| MissingObjectError(p.component().to_string()))?;
                    positions.insert(p.name(), spheres);
                }
                SpatialObject::Interconnect(ic) => {
                    for (index, element) in ic.elements().iter().enumerate() {
                        let slice = self
                            .layout
                            .node_range(id, index)
                            .and_then(|r| design.get(r))
                            .unwrap_or(&[]);
                        let spheres = element.resolve(slice, &positions, self.segment_limit())?;
                        positions.insert(element.name(), spheres);
                    }
                }
            }
        }
        Ok(positions)
    }

    /// The design vector reproducing the input geometry: each component at its base
    /// reference point with zero rotation and each node on the straight line between
    /// its interconnect's ports.
    pub fn default_design_vector(&self) -> Result<Vec<f64>, MissingObjectError> {
        let components: Vec<f64> = self
            .components()
            .flat_map(|c| c.initial_design_vector())
            .collect();
        self.with_straight_line_nodes(components)
    }

    /// Completes the component part of a design vector with node positions spread on the
    /// straight line between each interconnect's resolved ports.
    pub fn with_straight_line_nodes(
        &self,
        mut design: Vec<f64>,
    ) -> Result<Vec<f64>, MissingObjectError> {
        let component_len = design.len();
        design.resize(self.design_len(), 0.0);
        let anchors = self.resolve(&design)?;
        design.truncate(component_len);
        for ic in self.interconnects() {
            let start = anchors.reference_point(ic.port_1())?;
            let end = anchors.reference_point(ic.port_2())?;
            for node in ic.straight_line_nodes(&start, &end) {
                design.extend(node.coords.iter().copied());
            }
        }
        Ok(design)
    }

    /// Length of the leading part of the design vector owned by components.
    pub fn component_design_len(&self) -> usize {
        self.components().map(Component::design_len).sum()
    }
}

/// Collects objects and validates them into a [`SpatialSystem`].
#[derive(Debug, Default)]
pub struct SpatialSystemBuilder {
    components: Vec<Component>,
    ports: Vec<Port>,
    interconnects: Vec<Interconnect>,
    structures: Vec<Structure>,
}

impl SpatialSystemBuilder {
    pub fn add_component(&mut self, component: Component) -> &mut Self {
        self.components.push(component);
        self
    }

    pub fn add_port(&mut self, port: Port) -> &mut Self {
        self.ports.push(port);
        self
    }

    pub fn add_interconnect(&mut self, interconnect: Interconnect) -> &mut Self {
        self.interconnects.push(interconnect);
        self
    }

    pub fn add_structure(&mut self, structure: Structure) -> &mut Self {
        self.structures.push(structure);
        self
    }

    /// Validates names and references, fixes the design-vector layout and enumerates
    /// interference pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateName`] if any two objects (including
    /// interconnect nodes and edges) share a name, and
    /// [`ValidationError::UnknownReference`] if a port's parent is not a component or an
    /// interconnect endpoint is not a known port.
    pub fn build(self) -> Result<SpatialSystem, ValidationError> {
        let component_names: HashSet<&str> = self.components.iter().map(|c| c.name()).collect();
        let port_names: HashSet<&str> = self.ports.iter().map(|p| p.name()).collect();

        for port in &self.ports {
            if !component_names.contains(port.component()) {
                return Err(ValidationError::UnknownReference {
                    name: port.name().to_string(),
                    reference: port.component().to_string(),
                });
            }
        }
        for ic in &self.interconnects {
            for endpoint in [ic.port_1(), ic.port_2()] {
                if !port_names.contains(endpoint) {
                    return Err(ValidationError::UnknownReference {
                        name: ic.name().to_string(),
                        reference: endpoint.to_string(),
                    });
                }
            }
        }

        let all_names = self
            .components
            .iter()
            .map(|c| c.name())
            .chain(self.ports.iter().map(|p| p.name()))
            .chain(self.interconnects.iter().flat_map(|ic| {
                std::iter::once(ic.name()).chain(ic.elements().iter().map(|e| e.name()))
            }))
            .chain(self.structures.iter().map(|s| s.name()));
        let mut seen = HashSet::new();
        for name in all_names {
            if !seen.insert(name) {
                return Err(ValidationError::DuplicateName(name.to_string()));
            }
        }

        let pairs = enumerate_pairs(&self.components, &self.interconnects, &self.structures);

        let mut system = SpatialSystem::default();
        let mut offset = 0;
        for component in self.components {
            let len = component.design_len();
            let id = system.insert(SpatialObject::Component(component));
            system.layout.components.push((id, offset..offset + len));
            offset += len;
        }
        for port in self.ports {
            system.insert(SpatialObject::Port(port));
        }
        let interconnect_ids: Vec<ObjectId> = self
            .interconnects
            .into_iter()
            .map(|ic| system.insert(SpatialObject::Interconnect(ic)))
            .collect();
        for id in interconnect_ids {
            if let Some(SpatialObject::Interconnect(ic)) = system.objects.get(id) {
                for (index, element) in ic.elements().iter().enumerate() {
                    if matches!(element, InterconnectElement::Node(_)) {
                        let len = InterconnectNode::DESIGN_LEN;
                        system.layout.nodes.push((id, index, offset..offset + len));
                        offset += len;
                    }
                }
            }
        }
        for structure in self.structures {
            system.insert(SpatialObject::Structure(structure));
        }
        system.layout.len = offset;

        let mut order = system.insertion_order.clone();
        order.sort_by_key(|&id| system.objects.get(id).map(SpatialObject::tier));
        system.evaluation_order = order;
        system.pairs = pairs;
        Ok(system)
    }
}

impl SpatialSystem {
    fn insert(&mut self, object: SpatialObject) -> ObjectId {
        let name = object.name().to_string();
        let id = self.objects.insert(object);
        self.name_index.insert(name, id);
        self.insertion_order.push(id);
        id
    }
}

fn enumerate_pairs(
    components: &[Component],
    interconnects: &[Interconnect],
    structures: &[Structure],
) -> BTreeMap<InterferenceCategory, Vec<(String, String)>> {
    let owned = |(a, b): (&str, &str)| (a.to_string(), b.to_string());

    let component_names: Vec<&str> = components.iter().map(|c| c.name()).collect();
    let edges: Vec<(usize, &str)> = interconnects
        .iter()
        .enumerate()
        .flat_map(|(i, ic)| ic.edges().map(move |e| (i, e.name())))
        .collect();

    let component_component = component_names
        .iter()
        .tuple_combinations()
        .map(|(&a, &b)| owned((a, b)))
        .collect();
    let component_interconnect = component_names
        .iter()
        .cartesian_product(edges.iter())
        .map(|(&c, &(_, e))| owned((c, e)))
        .collect();
    let interconnect_interconnect = edges
        .iter()
        .tuple_combinations()
        .filter(|((ia, _), (ib, _))| ia != ib)
        .map(|(&(_, a), &(_, b))| owned((a, b)))
        .collect();
    let structure_all = structures
        .iter()
        .map(|s| s.name())
        .cartesian_product(
            component_names
                .iter()
                .copied()
                .chain(edges.iter().map(|&(_, e)| e))
                .collect::<Vec<_>>(),
        )
        .map(owned)
        .collect();

    BTreeMap::from([
        (InterferenceCategory::ComponentComponent, component_component),
        (InterferenceCategory::ComponentInterconnect, component_interconnect),
        (InterferenceCategory::InterconnectInterconnect, interconnect_interconnect),
        (InterferenceCategory::StructureAll, structure_all),
    ])
}

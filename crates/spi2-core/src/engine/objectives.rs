use super::config::{BoundingBoxMode, GapNormalization, ObjectiveConfig, ObjectiveKind};
use crate::core::geometry::bounding_box::{bounding_box, smooth_bounding_box};
use crate::core::models::object::SphereSet;
use crate::core::models::positions::{MissingObjectError, PositionsMap};
use crate::core::models::system::SpatialSystem;
use itertools::Itertools;

/// A scalar packaging objective evaluated on resolved positions.
#[derive(Debug, Clone, PartialEq)]
pub enum Objective {
    /// Volume of the axis-aligned box enclosing every packaged object.
    BoundingBoxVolume {
        mode: BoundingBoxMode,
        objects: Vec<String>,
    },
    /// Sum of all sphere-center distances over every pair of named objects.
    ///
    /// Grows quickly with the number of spheres, which can swamp the constraint terms.
    AggregateGap { normalization: GapNormalization },
}

impl Objective {
    /// Builds the configured objective for `system`.
    ///
    /// The bounding box covers components, ports and interconnect elements. Static
    /// structures are excluded because they are not being packaged.
    pub fn from_config(config: &ObjectiveConfig, system: &SpatialSystem) -> Self {
        match config.kind {
            ObjectiveKind::BoundingBoxVolume => {
                let objects = system
                    .components()
                    .map(|c| c.name().to_string())
                    .chain(system.ports().map(|p| p.name().to_string()))
                    .chain(
                        system
                            .interconnects()
                            .flat_map(|ic| ic.elements().iter().map(|e| e.name().to_string())),
                    )
                    .collect();
                Objective::BoundingBoxVolume {
                    mode: config.bounding_box,
                    objects,
                }
            }
            ObjectiveKind::AggregateGap => Objective::AggregateGap {
                normalization: config.gap_normalization,
            },
        }
    }

    pub fn evaluate(&self, positions: &PositionsMap) -> Result<f64, MissingObjectError> {
        match self {
            Objective::BoundingBoxVolume { mode, objects } => {
                let sets = objects
                    .iter()
                    .map(|name| positions.get(name))
                    .collect::<Result<Vec<&SphereSet>, _>>()?;
                let packaged = SphereSet::concat(sets);
                let bounds = match mode {
                    BoundingBoxMode::Exact => bounding_box(packaged.iter()),
                    BoundingBoxMode::Smooth { rho } => smooth_bounding_box(packaged.iter(), *rho),
                };
                Ok(bounds.map_or(0.0, |b| b.volume()))
            }
            Objective::AggregateGap { normalization } => {
                Ok(aggregate_gap(positions, *normalization))
            }
        }
    }
}

/// Sums center-to-center distances over every sphere pair of every pair of distinct
/// objects in `positions`.
pub fn aggregate_gap(positions: &PositionsMap, normalization: GapNormalization) -> f64 {
    let (total, pairs) = positions
        .iter()
        .tuple_combinations()
        .fold((0.0, 0usize), |(total, pairs), ((_, a), (_, b))| {
            let sum: f64 = a
                .positions()
                .iter()
                .cartesian_product(b.positions())
                .map(|(p, q)| (p - q).norm())
                .sum();
            (total + sum, pairs + 1)
        });
    match normalization {
        GapNormalization::Sum => total,
        GapNormalization::Mean if pairs > 0 => total / pairs as f64,
        GapNormalization::Mean => 0.0,
    }
}

//! Geometric primitives shared by the spatial model and the objective layer.
//!
//! - [`transform`]: rigid-body transformation of point sets.
//! - [`routing`]: discretization of interconnect segments into sphere chains.
//! - [`distance`]: point, segment and sphere minimum distances.
//! - [`aggregation`]: Kreisselmeier-Steinhauser smooth maximum.
//! - [`bounding_box`]: exact and smooth axis-aligned bounds over sphere extents.

pub mod aggregation;
pub mod bounding_box;
pub mod distance;
pub mod routing;
pub mod transform;

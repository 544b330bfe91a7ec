//! # SPI2++ Core Library
//!
//! A library for spatial packaging: placing components, flexible interconnects and static
//! structures inside a shared volume so that the packaged volume is small and no two
//! objects interfere.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless sphere-proxy object models (`SpatialSystem`),
//!   pure geometric kernels (rigid-body transform, interconnect routing, minimum distances,
//!   smooth-max aggregation, bounding boxes), and input/output utilities.
//!
//! - **[`engine`]: The Logic Core.** Maps a flat design vector to world-space geometry
//!   (`SpatialConfiguration`), evaluates objectives and interference constraints,
//!   differentiates them, and drives the constrained optimizer.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that tie `core` and `engine`
//!   together: evaluating a layout and optimizing it into a report.

pub mod core;
pub mod engine;
pub mod workflows;

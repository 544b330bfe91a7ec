//! # Core Models Module
//!
//! Data structures describing the objects being packaged.
//!
//! ## Key Components
//!
//! - [`object`] - Shared object properties: sphere sets, colors, movement classes and
//!   degrees of freedom
//! - [`component`] - Rigid, independently movable components
//! - [`port`] - Connection points rigidly offset from a parent component
//! - [`interconnect`] - Routed interconnects made of movable nodes and sphere-chain edges
//! - [`structure`] - Static obstacles
//! - [`system`] - The immutable object graph with its design-vector layout and
//!   interference pairs
//! - [`positions`] - The per-evaluation mapping from object name to resolved spheres
//! - [`validation`] - Construction-time validation errors
//! - [`ids`] - Keys for objects stored in the system

pub mod component;
pub mod ids;
pub mod interconnect;
pub mod object;
pub mod port;
pub mod positions;
pub mod structure;
pub mod system;
pub mod validation;

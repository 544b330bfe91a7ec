//! # Core Module
//!
//! The fundamental building blocks of spatial packaging: how objects are represented,
//! how their geometry moves, and how geometric quantities between them are measured.
//!
//! ## Architecture
//!
//! - **Object Representation** ([`models`]) - Components, ports, interconnects and structures
//!   approximated by finite sets of spheres, and the system that owns them
//! - **Geometric Kernels** ([`geometry`]) - Rigid-body transforms, interconnect routing,
//!   minimum distances, smooth-max aggregation and bounding boxes
//! - **File I/O** ([`io`]) - Input documents, sphere files and result reports
//!
//! Every kernel in [`geometry`] is a pure function over plain points and scalars so that
//! any differentiation backend can wrap it.

pub mod geometry;
pub mod io;
pub mod models;

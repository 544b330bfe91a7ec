//! # Workflows Module
//!
//! High-level entry points that run a complete packaging procedure on a validated
//! [`SpatialSystem`](crate::core::models::system::SpatialSystem).
//!
//! - **Evaluation Workflow** ([`evaluate`]) - Objective and per-category interference
//!   values for one design vector, without optimizing.
//! - **Optimization Workflow** ([`optimize`]) - Layout generation, constrained
//!   optimization and final evaluation, summarized as an
//!   [`OptimizationReport`](crate::core::io::report::OptimizationReport).

pub mod evaluate;
pub mod optimize;

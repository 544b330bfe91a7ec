//! # Engine Module
//!
//! Turns a validated [`SpatialSystem`](crate::core::models::system::SpatialSystem) into an
//! optimization problem and solves it.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Objective, constraint, solver and layout settings
//! - **Spatial Configuration** ([`configuration`]) - Design vector to world geometry,
//!   plus initial layout generation
//! - **Objectives** ([`objectives`]) - Bounding-box volume and aggregate gap
//! - **Constraints** ([`constraints`]) - Per-category smooth interference measures
//! - **Problem** ([`problem`]) - The constrained problem seen by the solver
//! - **Differentiation** ([`differentiation`]) - Pluggable Jacobian backends
//! - **Solver** ([`solver`]) - Augmented-Lagrangian driver over L-BFGS
//! - **State Tracking** ([`state`]) - Solver status and outcome
//! - **Design Log** ([`log`]) - Append-only record of every iterate
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod config;
pub mod configuration;
pub mod constraints;
pub mod differentiation;
pub mod error;
pub mod log;
pub mod objectives;
pub mod problem;
pub mod progress;
pub mod solver;
pub mod state;

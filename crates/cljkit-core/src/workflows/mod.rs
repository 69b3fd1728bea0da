//! # Workflows Module
//!
//! High-level entry points that drive the engine from a list of atom collections to a
//! finished result.
//!
//! ## Architecture
//!
//! - **Evaluation Workflow** ([`evaluate`]) - Builds a box index sized for the supplied
//!   functions and reports the total energy with its per-function breakdown.
//! - **Sampling Workflow** ([`sample`]) - Rigid-body Metropolis Monte Carlo over the groups
//!   of a [`SharedBoxes`](crate::engine::shared::SharedBoxes) index, priced move by move
//!   with deltas and periodically checked against a full recalculation.
//!
//! Both workflows report phases and task progress through a
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter).

pub mod evaluate;
pub mod sample;

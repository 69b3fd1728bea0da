//! # Core Models Module
//!
//! Data structures describing atoms as the nonbonded kernel sees them.
//!
//! ## Key Components
//!
//! - [`atom`] - A single flat, immutable atom record (position, charge, LJ, group)
//! - [`collection`] - Ordered immutable collections of records and their staging builder
//! - [`space`] - Vacuum or rectangular periodic boundaries and the minimum-image distance
//! - [`connectivity`] - Bond graphs and the 1-2/1-3/1-4 exclusion tables derived from them
//! - [`ids`] - Identifier types for groups and index tokens
//!
//! ## Usage
//!
//! ```ignore
//! use cljkit::core::models::{collection::{AtomCollection, MoleculeArrays}, ids::GroupId};
//!
//! let water = AtomCollection::build(GroupId(1), MoleculeArrays {
//!     coordinates: &coords,
//!     charges: &charges,
//!     lj: &lj,
//! })?;
//! let moved = water.translated(&Vector3::new(0.5, 0.0, 0.0));
//! ```

pub mod atom;
pub mod collection;
pub mod connectivity;
pub mod ids;
pub mod space;

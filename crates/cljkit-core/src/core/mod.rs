//! # Core Module
//!
//! The stateless foundation of cljkit: how atoms are represented once flattened for the
//! nonbonded kernel, and the kernel itself.
//!
//! ## Architecture
//!
//! - **Atom Representation** ([`models`]) - Atom records, immutable collections, the
//!   simulation space and intramolecular connectivity
//! - **Energy Calculations** ([`forcefield`]) - Pair potentials, switching functions,
//!   the energy accumulator and the closed family of cutoff functions
//!
//! Nothing in this module holds mutable shared state. Configuration flows in explicitly
//! and every function is safe to call from many threads at once.

pub mod forcefield;
pub mod models;

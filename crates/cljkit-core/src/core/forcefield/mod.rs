//! Pure nonbonded math: potentials, switching, pair kernels and cutoff functions.
//!
//! Nothing in this module holds mutable state. Every function is safe to share across
//! threads and gives bit-identical results for identical input.

pub mod function;
pub mod grid;
pub mod params;
pub mod potentials;
pub mod switching;
pub mod term;

//! # cljkit Core Library
//!
//! Cutoff-based Coulomb and Lennard-Jones ("CLJ") energy evaluation over a spatial
//! box decomposition, with incremental delta evaluation for Monte Carlo moves.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Immutable data models (`AtomRecord`, `AtomCollection`,
//!   `Space`, exclusion tables) and the pure mathematics of the nonbonded kernel
//!   (`potentials`, switching functions, the `CljFunction` variants and the grid potential).
//!
//! - **[`engine`]: The Logic Core.** Stateful structures built on top of the foundation:
//!   the `CljBoxes` spatial index with stable tokens, the parallel `calculator`,
//!   the speculative `CljDelta` evaluator and the lock-guarded `SharedBoxes`.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures such as a full energy
//!   evaluation and a Metropolis Monte Carlo sampling loop driven by deltas.

pub mod core;
pub mod engine;
pub mod workflows;

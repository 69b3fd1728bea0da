//! # Engine Module
//!
//! Stateful machinery built on top of [`crate::core`]: where atoms live, how their energy
//! is summed, and how a proposed move is priced before it is accepted.
//!
//! ## Architecture
//!
//! - **Box Index** ([`boxes`]) - Cell decomposition with stable atom tokens
//! - **Calculator** ([`calculator`]) - Parallel, order-stable summation over box pairs
//! - **Deltas** ([`delta`]) - Non-mutating energy change of replacing one group
//! - **Shared Index** ([`shared`]) - Read/write-locked index for concurrent callers
//! - **Configuration** ([`config`]) - Builders for cutoff and sampling parameters
//! - **Progress Monitoring** ([`progress`]) - Progress events and the reporter callback
//! - **Error Handling** ([`error`]) - Engine error type composed from the core errors
//!
//! ## Move lifecycle
//!
//! A Monte Carlo move builds a new [`AtomCollection`](crate::core::models::collection::AtomCollection)
//! for one group, evaluates a [`delta::CljDelta`] against the current index, and either
//! commits it (the index generation must not have moved in between) or drops it.

pub mod boxes;
pub mod calculator;
pub mod config;
pub mod delta;
pub mod error;
pub mod progress;
pub mod shared;

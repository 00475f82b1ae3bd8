//! # Base Test Utilities
//!
//! Shared testing utilities for the base crates:
//! - Standard building templates, items and campaign fixtures
//! - Invariant checks for status flags and capacities
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod invariants;

/// Re-export proptest for convenience.
pub use proptest;

//! Common test utilities for circuit-ssa
//!
//! Shared fixtures and assertions for integration tests.

#![allow(dead_code)]

mod assertions;
mod fixtures;

pub use assertions::*;
pub use fixtures::*;

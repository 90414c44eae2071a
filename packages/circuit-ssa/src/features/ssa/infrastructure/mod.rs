//! SSA construction
//!
//! - environment     - per-function state: label arena, sub-CFG stack, arguments
//! - label           - per-block resolution, sealing, control/depend merging
//! - variable        - variable handles and trivial-phi removal
//! - control         - jumps, branches, loops and value emission on the current label
//! - circuit_adapter - `CircuitPort` for the in-crate `Circuit`

pub mod circuit_adapter;
pub mod control;
pub mod environment;
pub mod errors;
pub mod label;
pub mod variable;

pub use environment::Environment;
pub use errors::{SsaError, SsaResult};
pub use variable::Variable;

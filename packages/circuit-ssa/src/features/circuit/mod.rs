//! Circuit: the gate graph one function is compiled into
//!
//! - domain/         - Gate, GateRef, opcode and type tags
//! - infrastructure/ - Append-only arena with use lists and forwarding

pub mod domain;
pub mod infrastructure;

pub use domain::{Gate, GateRef, GateType, MachineType, OpCode};
pub use infrastructure::Circuit;

//! Circuit domain model

pub mod gate;

pub use gate::{Gate, GateRef, GateType, MachineType, OpCode};

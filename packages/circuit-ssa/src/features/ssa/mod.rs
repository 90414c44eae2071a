// Incremental SSA construction over the circuit
//
// Hexagonal Architecture:
// - domain: Label and variable ids, per-block state, type tags, statistics
// - ports: CircuitPort (gate storage), FunctionEmitter (IR drivers)
// - infrastructure: Environment, label resolution, variables, control emission
// - application: batch circuit building

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{BuildCircuitsUseCase, CompiledFunction};
pub use domain::{Label, LabelImpl, SsaStats, VariableId, VariableType};
pub use infrastructure::{Environment, SsaError, SsaResult, Variable};
pub use ports::{CircuitPort, FunctionEmitter};

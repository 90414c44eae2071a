/*
 * SSA Error Types
 *
 * Every variant is a compiler-internal invariant violation: the emission
 * driver misused the construction API. Detection happens at the point of
 * misuse, before any state changes, and the function's compilation is
 * abandoned by propagating the error.
 */

use thiserror::Error;

use crate::features::circuit::domain::GateRef;
use crate::features::ssa::domain::{Label, VariableId};

/// SSA construction error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SsaError {
    /// Operation needs a current label but none is bound
    #[error("No current label bound for {operation}")]
    NoCurrentLabel { operation: &'static str },

    /// Sealing is monotonic
    #[error("Label {label} is already sealed")]
    AlreadySealed { label: Label },

    /// Predecessor set is final once sealed
    #[error("Cannot append predecessor {predecessor} to sealed label {label}")]
    PredecessorAfterSeal { label: Label, predecessor: Label },

    /// Bind requires at least one incoming edge
    #[error("Label {label} has no predecessors to bind")]
    NoPredecessors { label: Label },

    /// Loop heads merge exactly one entry and one back edge
    #[error("Loop head {label} expects 2 predecessors and 1 back edge, found {predecessors} predecessors and {back_edges} back edges")]
    MalformedLoopHead {
        label: Label,
        predecessors: usize,
        back_edges: usize,
    },

    /// Merged controls must line up with predecessors
    #[error("Label {label} has {predecessors} predecessors but {controls} incoming controls")]
    ControlMismatch {
        label: Label,
        predecessors: usize,
        controls: usize,
    },

    /// A variable read resolved to the "no value" sentinel
    #[error("Variable {variable} has no value in label {label}")]
    UndefinedValue { variable: VariableId, label: Label },

    /// Gate is not a selector created by this environment
    #[error("Gate {gate} is not a selector of this environment")]
    UnknownSelector { gate: GateRef },

    #[error("Argument index {index} out of range ({count} arguments)")]
    ArgumentOutOfRange { index: usize, count: usize },

    #[error("Input index {index} out of range ({count} inputs)")]
    InputOutOfRange { index: usize, count: usize },

    /// Entry label of a sub-CFG must be fresh
    #[error("Sub-CFG entry label {label} already has predecessors or is sealed")]
    SubCfgEntryNotFresh { label: Label },

    #[error("Sub-CFG exit without matching entry")]
    SubCfgUnderflow,

    #[error("Sub-CFG nesting exceeds configured depth {max_depth}")]
    SubCfgTooDeep { max_depth: usize },

    /// Environment finished with sub-CFG regions still open
    #[error("Environment finished with {open} open sub-CFG regions")]
    UnbalancedSubCfg { open: usize },

    /// Verifier found a selector with unfilled operands
    #[error("Selector {gate} has unfilled operands (label never sealed?)")]
    IncompletePhi { gate: GateRef },

    #[error("Unknown call signature '{name}'")]
    UnknownSignature { name: String },

    #[error("Call to '{name}' expects {expected} arguments, got {actual}")]
    ArgumentCountMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Internal error (should not happen)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type for SSA operations
pub type SsaResult<T> = Result<T, SsaError>;

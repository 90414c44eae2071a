//! Gate model
//!
//! A Gate is one node of the circuit (sea-of-nodes IR). Gates are addressed by
//! `GateRef`, a stable arena index that never moves or gets reused.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle to a gate in a [`Circuit`](crate::features::circuit::Circuit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GateRef(u32);

impl GateRef {
    /// Sentinel distinguishable from every real gate
    pub const NULL: GateRef = GateRef(u32::MAX);

    /// Panics once a circuit holds `u32::MAX` gates, the last index being `NULL`
    pub(crate) fn from_index(index: usize) -> Self {
        assert!(index < u32::MAX as usize, "circuit exhausted the gate index space");
        GateRef(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl fmt::Display for GateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "g{}", self.0)
        }
    }
}

/// Gate opcode
///
/// Control gates (`StateEntry` .. `LoopBack`) form the control chain, depend
/// gates thread memory ordering, and everything else computes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpCode {
    // Roots
    StateEntry,
    DependEntry,
    Argument(u32),
    Constant(u64),
    /// Value of a variable that was never written on some path
    NoValue,

    // Control
    OrdinaryBlock,
    IfBranch,
    IfTrue,
    IfFalse,
    Merge,
    LoopBegin,
    LoopBack,
    Return,
    ReturnVoid,

    // Merges
    ValueSelector,
    DependSelector,

    // Effects
    Call(u32),
    Load,
    Store,

    // Values
    Add,
    Sub,
    Mul,
    Equal,
    LessThan,

    /// Gate whose references were all rewritten; kept so handles stay stable
    Nop,
}

impl OpCode {
    pub fn is_selector(self) -> bool {
        matches!(self, OpCode::ValueSelector | OpCode::DependSelector)
    }

    pub fn is_value_selector(self) -> bool {
        self == OpCode::ValueSelector
    }

    pub fn is_loop_head(self) -> bool {
        self == OpCode::LoopBegin
    }

    /// Number of control predecessors a label entered through this gate expects
    pub fn state_count(self) -> usize {
        match self {
            OpCode::LoopBegin => 2,
            _ => 1,
        }
    }
}

/// Machine-level representation of a gate's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineType {
    NoValue,
    I1,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    ArchPtr,
}

/// Semantic (language-level) type carried through the core untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateType {
    Empty,
    NJsValue,
    TaggedValue,
    TaggedPointer,
    AnyType,
}

/// One node of the circuit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gate {
    pub opcode: OpCode,
    pub machine_type: MachineType,
    pub gate_type: GateType,
    pub ins: Vec<GateRef>,
    /// Gates that reference this one, once per operand slot
    #[serde(skip)]
    pub uses: Vec<GateRef>,
}

impl Gate {
    pub fn new(
        opcode: OpCode,
        machine_type: MachineType,
        ins: Vec<GateRef>,
        gate_type: GateType,
    ) -> Self {
        Self {
            opcode,
            machine_type,
            gate_type,
            ins,
            uses: Vec::new(),
        }
    }

    pub fn is_nop(&self) -> bool {
        self.opcode == OpCode::Nop
    }
}

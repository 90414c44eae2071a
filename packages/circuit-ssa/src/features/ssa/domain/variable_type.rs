use crate::features::circuit::domain::{GateType, MachineType};
use serde::{Deserialize, Serialize};

/// Type tag of a variable: how it is represented and what it means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableType {
    pub machine_type: MachineType,
    pub gate_type: GateType,
}

impl VariableType {
    pub const fn new(machine_type: MachineType, gate_type: GateType) -> Self {
        Self {
            machine_type,
            gate_type,
        }
    }

    /// Memory/dependency token; merged by depend selectors
    pub const fn void() -> Self {
        Self::new(MachineType::NoValue, GateType::Empty)
    }

    pub const fn bool() -> Self {
        Self::new(MachineType::I1, GateType::NJsValue)
    }

    pub const fn int32() -> Self {
        Self::new(MachineType::I32, GateType::NJsValue)
    }

    pub const fn int64() -> Self {
        Self::new(MachineType::I64, GateType::NJsValue)
    }

    pub const fn float64() -> Self {
        Self::new(MachineType::F64, GateType::NJsValue)
    }

    pub const fn native_pointer() -> Self {
        Self::new(MachineType::ArchPtr, GateType::NJsValue)
    }

    pub const fn js_any() -> Self {
        Self::new(MachineType::I64, GateType::TaggedValue)
    }

    pub const fn js_pointer() -> Self {
        Self::new(MachineType::I64, GateType::TaggedPointer)
    }

    pub fn is_void(&self) -> bool {
        self.machine_type == MachineType::NoValue
    }
}

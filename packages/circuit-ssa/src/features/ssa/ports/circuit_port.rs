use crate::features::circuit::domain::{GateRef, GateType, MachineType, OpCode};

/// Gate storage the SSA core builds into
///
/// The core only ever appends gates and rewrites operand slots. Nothing is
/// freed: a removed gate keeps its handle and forwards to its replacement.
pub trait CircuitPort {
    /// Append one gate; `ins` may be empty
    fn new_gate(
        &mut self,
        opcode: OpCode,
        machine_type: MachineType,
        ins: &[GateRef],
        gate_type: GateType,
    ) -> GateRef;

    fn null_gate(&self) -> GateRef {
        GateRef::NULL
    }

    fn state_root(&self) -> GateRef;

    fn depend_root(&self) -> GateRef;

    /// Hash-consed constant
    fn constant(&mut self, machine_type: MachineType, value: u64, gate_type: GateType) -> GateRef;

    /// The "no value" sentinel for variables never written on some path
    fn no_value(&mut self) -> GateRef;

    fn opcode(&self, gate: GateRef) -> OpCode;

    fn machine_type(&self, gate: GateRef) -> MachineType;

    fn gate_type(&self, gate: GateRef) -> GateType;

    fn num_ins(&self, gate: GateRef) -> usize;

    fn get_in(&self, gate: GateRef, idx: usize) -> GateRef;

    /// Write operand `idx`, growing the operand list if needed
    fn set_in(&mut self, gate: GateRef, idx: usize, value: GateRef);

    /// Rewrite every reference to `old` (except its self-references) to `new`.
    /// Returns the distinct rewritten users.
    fn replace_all_uses(&mut self, old: GateRef, new: GateRef) -> Vec<GateRef>;

    /// Turn `gate` into a `Nop` that forwards to `replacement`
    fn delete_gate(&mut self, gate: GateRef, replacement: GateRef);

    /// Follow forwarding left by `delete_gate`
    fn resolve(&self, gate: GateRef) -> GateRef;

    fn is_selector(&self, gate: GateRef) -> bool {
        !gate.is_null() && self.opcode(gate).is_selector()
    }

    fn is_no_value(&self, gate: GateRef) -> bool {
        !gate.is_null() && self.opcode(gate) == OpCode::NoValue
    }
}

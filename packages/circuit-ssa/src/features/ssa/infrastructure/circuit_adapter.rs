//! Circuit adapter for the SSA core
//!
//! Bridges the `Circuit` arena to the `CircuitPort` trait so `Environment`
//! builds straight into it.

use crate::features::circuit::domain::{GateRef, GateType, MachineType, OpCode};
use crate::features::circuit::Circuit;
use crate::features::ssa::ports::CircuitPort;

impl CircuitPort for Circuit {
    fn new_gate(
        &mut self,
        opcode: OpCode,
        machine_type: MachineType,
        ins: &[GateRef],
        gate_type: GateType,
    ) -> GateRef {
        Circuit::new_gate(self, opcode, machine_type, ins, gate_type)
    }

    fn state_root(&self) -> GateRef {
        Circuit::state_root(self)
    }

    fn depend_root(&self) -> GateRef {
        Circuit::depend_root(self)
    }

    fn constant(&mut self, machine_type: MachineType, value: u64, gate_type: GateType) -> GateRef {
        Circuit::constant(self, machine_type, value, gate_type)
    }

    fn no_value(&mut self) -> GateRef {
        Circuit::no_value(self)
    }

    fn opcode(&self, gate: GateRef) -> OpCode {
        Circuit::opcode(self, gate)
    }

    fn machine_type(&self, gate: GateRef) -> MachineType {
        self.gate(gate).machine_type
    }

    fn gate_type(&self, gate: GateRef) -> GateType {
        self.gate(gate).gate_type
    }

    fn num_ins(&self, gate: GateRef) -> usize {
        self.ins(gate).len()
    }

    fn get_in(&self, gate: GateRef, idx: usize) -> GateRef {
        Circuit::get_in(self, gate, idx)
    }

    fn set_in(&mut self, gate: GateRef, idx: usize, value: GateRef) {
        Circuit::set_in(self, gate, idx, value)
    }

    fn replace_all_uses(&mut self, old: GateRef, new: GateRef) -> Vec<GateRef> {
        Circuit::replace_all_uses(self, old, new)
    }

    fn delete_gate(&mut self, gate: GateRef, replacement: GateRef) {
        Circuit::delete_gate(self, gate, replacement)
    }

    fn resolve(&self, gate: GateRef) -> GateRef {
        Circuit::resolve(self, gate)
    }
}

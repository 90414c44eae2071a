/*
 * Circuit - append-only gate arena
 *
 * Every gate lives at a fixed index for the whole compilation:
 * - Operands are stored as GateRef indices, never pointers
 * - Reverse use lists make "replace all uses" proportional to the use count
 * - Removal rewrites references and leaves a forwarding Nop behind
 */

use ahash::AHashMap as HashMap;
use serde::Serialize;

use crate::features::circuit::domain::{Gate, GateRef, GateType, MachineType, OpCode};

/// Gate arena for one compiled function
#[derive(Debug, Clone)]
pub struct Circuit {
    gates: Vec<Gate>,
    forward: HashMap<GateRef, GateRef>,
    constants: HashMap<(MachineType, u64, GateType), GateRef>,
    no_value: Option<GateRef>,
    state_root: GateRef,
    depend_root: GateRef,
}

#[derive(Serialize)]
struct GateDump<'a> {
    id: GateRef,
    #[serde(flatten)]
    gate: &'a Gate,
}

impl Circuit {
    pub fn new() -> Self {
        let mut circuit = Self {
            gates: Vec::new(),
            forward: HashMap::new(),
            constants: HashMap::new(),
            no_value: None,
            state_root: GateRef::NULL,
            depend_root: GateRef::NULL,
        };
        circuit.state_root =
            circuit.new_gate(OpCode::StateEntry, MachineType::NoValue, &[], GateType::Empty);
        circuit.depend_root =
            circuit.new_gate(OpCode::DependEntry, MachineType::NoValue, &[], GateType::Empty);
        circuit
    }

    pub fn null_gate() -> GateRef {
        GateRef::NULL
    }

    pub fn new_gate(
        &mut self,
        opcode: OpCode,
        machine_type: MachineType,
        ins: &[GateRef],
        gate_type: GateType,
    ) -> GateRef {
        let id = GateRef::from_index(self.gates.len());
        self.gates
            .push(Gate::new(opcode, machine_type, ins.to_vec(), gate_type));
        for &input in ins {
            if !input.is_null() {
                self.gates[input.index()].uses.push(id);
            }
        }
        id
    }

    pub fn state_root(&self) -> GateRef {
        self.state_root
    }

    pub fn depend_root(&self) -> GateRef {
        self.depend_root
    }

    pub fn constant(&mut self, machine_type: MachineType, value: u64, gate_type: GateType) -> GateRef {
        if let Some(&gate) = self.constants.get(&(machine_type, value, gate_type)) {
            return gate;
        }
        let gate = self.new_gate(OpCode::Constant(value), machine_type, &[], gate_type);
        self.constants.insert((machine_type, value, gate_type), gate);
        gate
    }

    pub fn no_value(&mut self) -> GateRef {
        match self.no_value {
            Some(gate) => gate,
            None => {
                let gate = self.new_gate(OpCode::NoValue, MachineType::NoValue, &[], GateType::AnyType);
                self.no_value = Some(gate);
                gate
            }
        }
    }

    pub fn gate(&self, gate: GateRef) -> &Gate {
        &self.gates[gate.index()]
    }

    pub fn opcode(&self, gate: GateRef) -> OpCode {
        self.gate(gate).opcode
    }

    pub fn ins(&self, gate: GateRef) -> &[GateRef] {
        &self.gate(gate).ins
    }

    pub fn uses(&self, gate: GateRef) -> &[GateRef] {
        &self.gate(gate).uses
    }

    /// Value operands of a selector (operand 0 is its control)
    pub fn selector_operands(&self, gate: GateRef) -> &[GateRef] {
        let ins = self.ins(gate);
        if ins.is_empty() {
            ins
        } else {
            &ins[1..]
        }
    }

    pub fn get_in(&self, gate: GateRef, idx: usize) -> GateRef {
        self.gate(gate).ins[idx]
    }

    pub fn set_in(&mut self, gate: GateRef, idx: usize, value: GateRef) {
        let ins_len = self.gates[gate.index()].ins.len();
        if idx >= ins_len {
            self.gates[gate.index()]
                .ins
                .resize(idx + 1, GateRef::NULL);
        }
        let old = std::mem::replace(&mut self.gates[gate.index()].ins[idx], value);
        if old == value {
            return;
        }
        if !old.is_null() {
            self.remove_one_use(old, gate);
        }
        if !value.is_null() {
            self.gates[value.index()].uses.push(gate);
        }
    }

    pub fn replace_all_uses(&mut self, old: GateRef, new: GateRef) -> Vec<GateRef> {
        let mut users: Vec<GateRef> = Vec::new();
        let uses = std::mem::take(&mut self.gates[old.index()].uses);
        let mut kept = Vec::new();
        for user in uses {
            if user == old {
                kept.push(user);
                continue;
            }
            if !users.contains(&user) {
                users.push(user);
            }
        }
        self.gates[old.index()].uses = kept;

        for &user in &users {
            let mut rewritten = 0;
            for slot in self.gates[user.index()].ins.iter_mut() {
                if *slot == old {
                    *slot = new;
                    rewritten += 1;
                }
            }
            let new_uses = &mut self.gates[new.index()].uses;
            new_uses.extend(std::iter::repeat(user).take(rewritten));
        }
        users
    }

    pub fn delete_gate(&mut self, gate: GateRef, replacement: GateRef) {
        let ins = std::mem::take(&mut self.gates[gate.index()].ins);
        for input in ins {
            if !input.is_null() && input != gate {
                self.remove_one_use(input, gate);
            }
        }
        let entry = &mut self.gates[gate.index()];
        entry.opcode = OpCode::Nop;
        entry.uses.clear();
        self.forward.insert(gate, replacement);
    }

    pub fn resolve(&self, mut gate: GateRef) -> GateRef {
        while let Some(&next) = self.forward.get(&gate) {
            gate = next;
        }
        gate
    }

    pub fn is_nop(&self, gate: GateRef) -> bool {
        self.gate(gate).is_nop()
    }

    /// Total gates ever allocated, removed ones included
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    pub fn live_gates(&self) -> impl Iterator<Item = GateRef> + '_ {
        self.gates
            .iter()
            .enumerate()
            .filter(|(_, gate)| !gate.is_nop())
            .map(|(index, _)| GateRef::from_index(index))
    }

    pub fn count_opcode(&self, opcode: OpCode) -> usize {
        self.gates.iter().filter(|gate| gate.opcode == opcode).count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let dump: Vec<GateDump<'_>> = self
            .live_gates()
            .map(|id| GateDump {
                id,
                gate: self.gate(id),
            })
            .collect();
        serde_json::to_string_pretty(&dump)
    }

    fn remove_one_use(&mut self, input: GateRef, user: GateRef) {
        let uses = &mut self.gates[input.index()].uses;
        if let Some(pos) = uses.iter().position(|&u| u == user) {
            uses.swap_remove(pos);
        }
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

/*
 * Control-flow and value emission on the current label
 *
 * Terminators (jump, branch, loop_end) hand their outgoing control to the
 * target labels as predecessors and leave no label current. The caller
 * binds the next label before emitting more code.
 *
 * Memory operations and calls thread the current label's depend edge.
 */

use tracing::debug;

use super::environment::Environment;
use super::errors::{SsaError, SsaResult};
use crate::features::call_signature;
use crate::features::circuit::domain::{GateRef, GateType, MachineType, OpCode};
use crate::features::ssa::domain::{Label, VariableType};
use crate::features::ssa::ports::CircuitPort;

impl<C: CircuitPort> Environment<C> {
    /// Enter `label` as the current block
    pub fn bind(&mut self, label: Label) -> SsaResult<()> {
        label.bind(self)?;
        self.set_current_label(Some(label));
        Ok(())
    }

    /// Unconditional edge from the current label to `target`
    pub fn jump(&mut self, target: Label) -> SsaResult<()> {
        let current = self.require_current("jump")?;
        self.ensure_open(target, current)?;

        let control = current.control(self);
        let goto = self.control_gate(OpCode::OrdinaryBlock, &[control]);
        current.set_control(self, goto);
        target.append_predecessor(self, current)?;
        target.merge_control(self, goto);
        self.set_current_label(None);
        Ok(())
    }

    /// Two-way edge on `condition`
    pub fn branch(&mut self, condition: GateRef, if_true: Label, if_false: Label) -> SsaResult<()> {
        let current = self.require_current("branch")?;
        self.ensure_open(if_true, current)?;
        self.ensure_open(if_false, current)?;

        let control = current.control(self);
        let branch = self.control_gate(OpCode::IfBranch, &[control, condition]);
        current.set_control(self, branch);

        let taken = self.control_gate(OpCode::IfTrue, &[branch]);
        if_true.append_predecessor(self, current)?;
        if_true.merge_control(self, taken);

        let not_taken = self.control_gate(OpCode::IfFalse, &[branch]);
        if_false.append_predecessor(self, current)?;
        if_false.merge_control(self, not_taken);

        self.set_current_label(None);
        Ok(())
    }

    /// Open loop header `head`, already reached from its pre-header
    ///
    /// The header stays unsealed: reads inside the body see placeholders
    /// until `loop_end` supplies the back edge.
    pub fn loop_begin(&mut self, head: Label) -> SsaResult<()> {
        if head.is_sealed(self) {
            return Err(SsaError::AlreadySealed { label: head });
        }
        if head.predecessors(self).is_empty() {
            return Err(SsaError::NoPredecessors { label: head });
        }

        let entry_control = head.control(self);
        let loop_begin = self.control_gate(OpCode::LoopBegin, &[entry_control, GateRef::NULL]);
        head.set_control(self, loop_begin);
        head.set_prede_control(self, loop_begin);
        head.bind(self)?;
        self.set_current_label(Some(head));
        debug!("loop {} opened", head);
        Ok(())
    }

    /// Back edge from the current label to `head`; seals the header
    pub fn loop_end(&mut self, head: Label) -> SsaResult<()> {
        let current = self.require_current("loop_end")?;
        self.ensure_open(head, current)?;
        let predecessors = head.predecessors(self).len();
        if !head.is_loop_head(self) || predecessors != 1 {
            return Err(SsaError::MalformedLoopHead {
                label: head,
                predecessors: predecessors + 1,
                back_edges: self.label_state(head).other_prede_controls.len() + 1,
            });
        }

        let control = current.control(self);
        let back_edge = self.control_gate(OpCode::LoopBack, &[control]);
        current.set_control(self, back_edge);
        head.append_predecessor(self, current)?;
        head.merge_control(self, back_edge);
        head.merge_all_control(self)?;
        head.merge_all_depend(self)?;
        head.seal(self)?;
        self.set_current_label(None);
        debug!("loop {} closed by {}", head, current);
        Ok(())
    }

    pub fn return_value(&mut self, value: GateRef) -> SsaResult<GateRef> {
        let current = self.require_current("return")?;
        let (control, depend) = (current.control(self), current.depend(self));
        let ret = self.control_gate(OpCode::Return, &[control, depend, value]);
        current.set_control(self, ret);
        Ok(ret)
    }

    pub fn return_void(&mut self) -> SsaResult<GateRef> {
        let current = self.require_current("return")?;
        let (control, depend) = (current.control(self), current.depend(self));
        let ret = self.control_gate(OpCode::ReturnVoid, &[control, depend]);
        current.set_control(self, ret);
        Ok(ret)
    }

    pub fn int32(&mut self, value: i32) -> GateRef {
        self.circuit
            .constant(MachineType::I32, value as u32 as u64, GateType::NJsValue)
    }

    pub fn int64(&mut self, value: i64) -> GateRef {
        self.circuit
            .constant(MachineType::I64, value as u64, GateType::NJsValue)
    }

    pub fn boolean(&mut self, value: bool) -> GateRef {
        self.circuit
            .constant(MachineType::I1, u64::from(value), GateType::NJsValue)
    }

    pub fn double(&mut self, value: f64) -> GateRef {
        self.circuit
            .constant(MachineType::F64, value.to_bits(), GateType::NJsValue)
    }

    /// Pure two-operand value gate; carries no control or depend edge
    pub fn binary(&mut self, opcode: OpCode, ty: VariableType, lhs: GateRef, rhs: GateRef) -> GateRef {
        self.circuit
            .new_gate(opcode, ty.machine_type, &[lhs, rhs], ty.gate_type)
    }

    pub fn int32_add(&mut self, lhs: GateRef, rhs: GateRef) -> GateRef {
        self.binary(OpCode::Add, VariableType::int32(), lhs, rhs)
    }

    pub fn int32_sub(&mut self, lhs: GateRef, rhs: GateRef) -> GateRef {
        self.binary(OpCode::Sub, VariableType::int32(), lhs, rhs)
    }

    pub fn int32_mul(&mut self, lhs: GateRef, rhs: GateRef) -> GateRef {
        self.binary(OpCode::Mul, VariableType::int32(), lhs, rhs)
    }

    pub fn int32_equal(&mut self, lhs: GateRef, rhs: GateRef) -> GateRef {
        self.binary(OpCode::Equal, VariableType::bool(), lhs, rhs)
    }

    pub fn int32_less_than(&mut self, lhs: GateRef, rhs: GateRef) -> GateRef {
        self.binary(OpCode::LessThan, VariableType::bool(), lhs, rhs)
    }

    pub fn load(&mut self, ty: VariableType, base: GateRef, offset: GateRef) -> SsaResult<GateRef> {
        let current = self.require_current("load")?;
        let depend = current.depend(self);
        let load = self
            .circuit
            .new_gate(OpCode::Load, ty.machine_type, &[depend, base, offset], ty.gate_type);
        current.set_depend(self, load);
        Ok(load)
    }

    pub fn store(&mut self, base: GateRef, offset: GateRef, value: GateRef) -> SsaResult<GateRef> {
        let current = self.require_current("store")?;
        let depend = current.depend(self);
        let store = self.circuit.new_gate(
            OpCode::Store,
            MachineType::NoValue,
            &[depend, base, offset, value],
            GateType::Empty,
        );
        current.set_depend(self, store);
        Ok(store)
    }

    /// Call the registered stub `name`
    pub fn call_stub(&mut self, name: &str, args: &[GateRef]) -> SsaResult<GateRef> {
        let current = self.require_current("call_stub")?;
        let (index, signature) =
            call_signature::lookup(name).ok_or_else(|| SsaError::UnknownSignature {
                name: name.to_string(),
            })?;
        if !signature.accepts(args.len()) {
            return Err(SsaError::ArgumentCountMismatch {
                name: name.to_string(),
                expected: signature.params.len(),
                actual: args.len(),
            });
        }

        let mut ins = Vec::with_capacity(args.len() + 1);
        ins.push(current.depend(self));
        ins.extend_from_slice(args);
        let ret = signature.return_type;
        let call = self
            .circuit
            .new_gate(OpCode::Call(index), ret.machine_type, &ins, ret.gate_type);
        current.set_depend(self, call);
        Ok(call)
    }

    fn control_gate(&mut self, opcode: OpCode, ins: &[GateRef]) -> GateRef {
        self.circuit
            .new_gate(opcode, MachineType::NoValue, ins, GateType::Empty)
    }

    /// Reject an edge into a sealed label before any gate is emitted
    fn ensure_open(&self, target: Label, from: Label) -> SsaResult<()> {
        if target.is_sealed(self) {
            return Err(SsaError::PredecessorAfterSeal {
                label: target,
                predecessor: from,
            });
        }
        Ok(())
    }
}

/*
 * Label - incremental SSA construction per basic block
 *
 * Variables are resolved on demand while control flow is still being
 * emitted (Braun et al., "Simple and Efficient Construction of SSA Form"):
 *
 *   read(var, block):
 *     local value            -> return it
 *     block not sealed       -> placeholder phi, completed when sealed
 *     one predecessor        -> read(var, predecessor)
 *     several predecessors   -> phi cached first (breaks loops), then one
 *                               operand per predecessor, then trivial-phi removal
 *
 * Resolution runs on an explicit frame stack instead of native recursion, so
 * long block chains and deep loop nests cannot exhaust the call stack.
 */

use ahash::AHashSet as HashSet;
use tracing::{debug, trace};

use super::environment::Environment;
use super::errors::{SsaError, SsaResult};
use crate::features::circuit::domain::{GateRef, GateType, MachineType, OpCode};
use crate::features::ssa::domain::{Label, VariableId};
use crate::features::ssa::ports::CircuitPort;

impl Label {
    /// New open label without an entry control yet
    pub fn new<C: CircuitPort>(env: &mut Environment<C>) -> Self {
        env.new_label(GateRef::NULL)
    }

    /// Finish entering the block: merge incoming edges and seal once every
    /// predecessor is known. Loop heads stay open until their back edge arrives.
    pub fn bind<C: CircuitPort>(self, env: &mut Environment<C>) -> SsaResult<()> {
        env.bind_label(self)
    }

    /// Fix the predecessor set and complete every placeholder phi
    pub fn seal<C: CircuitPort>(self, env: &mut Environment<C>) -> SsaResult<()> {
        env.seal_label(self)
    }

    pub fn write_variable<C: CircuitPort>(
        self,
        env: &mut Environment<C>,
        var: VariableId,
        value: GateRef,
    ) {
        env.label_state_mut(self).value_map.insert(var, value);
    }

    pub fn read_variable<C: CircuitPort>(
        self,
        env: &mut Environment<C>,
        var: VariableId,
    ) -> SsaResult<GateRef> {
        env.read_variable_in(self, var)
    }

    pub fn append_predecessor<C: CircuitPort>(
        self,
        env: &mut Environment<C>,
        predecessor: Label,
    ) -> SsaResult<()> {
        env.append_predecessor(self, predecessor)
    }

    pub fn merge_control<C: CircuitPort>(self, env: &mut Environment<C>, control: GateRef) {
        env.merge_control(self, control)
    }

    pub fn merge_all_control<C: CircuitPort>(self, env: &mut Environment<C>) -> SsaResult<()> {
        env.merge_all_control(self)
    }

    pub fn merge_all_depend<C: CircuitPort>(self, env: &mut Environment<C>) -> SsaResult<()> {
        env.merge_all_depend(self)
    }

    pub fn control<C: CircuitPort>(self, env: &Environment<C>) -> GateRef {
        env.label_state(self).control
    }

    pub fn set_control<C: CircuitPort>(self, env: &mut Environment<C>, control: GateRef) {
        env.label_state_mut(self).control = control;
    }

    /// Replace the entry control; phis already placed in the block move with it
    pub fn set_prede_control<C: CircuitPort>(self, env: &mut Environment<C>, control: GateRef) {
        env.label_state_mut(self).prede_control = control;
        env.retarget_selectors(self, control);
    }

    /// Current depend edge (follows the edge if its selector was simplified away)
    pub fn depend<C: CircuitPort>(self, env: &Environment<C>) -> GateRef {
        env.resolved_depend(self)
    }

    pub fn set_depend<C: CircuitPort>(self, env: &mut Environment<C>, depend: GateRef) {
        env.label_state_mut(self).depend = depend;
    }

    pub fn predecessors<C: CircuitPort>(self, env: &Environment<C>) -> Vec<Label> {
        env.label_state(self).predecessors.clone()
    }

    pub fn is_sealed<C: CircuitPort>(self, env: &Environment<C>) -> bool {
        env.label_state(self).is_sealed
    }

    pub fn is_loop_head<C: CircuitPort>(self, env: &Environment<C>) -> bool {
        env.is_loop_head(self)
    }
}

/// Where a resolution run starts
enum Start {
    Read(Label),
    /// Fill an existing placeholder from the owning label's predecessors
    Complete { phi: GateRef, label: Label },
}

/// A phi receiving one operand per predecessor, in predecessor order
struct PhiFill {
    phi: GateRef,
    label: Label,
    filled: usize,
    /// Single-predecessor labels walked through to reach `label`
    chain: Vec<Label>,
    /// Record the final value in `label` (false when completing a placeholder,
    /// whose label may have been written since)
    cache: bool,
}

enum Descent {
    Resolved(GateRef),
    NeedsOperands(PhiFill),
}

impl<C: CircuitPort> Environment<C> {
    pub(crate) fn read_variable_in(&mut self, label: Label, var: VariableId) -> SsaResult<GateRef> {
        if let Some(&value) = self.label_state(label).value_map.get(&var) {
            return Ok(self.circuit.resolve(value));
        }
        self.resolve_variable(var, Start::Read(label))
    }

    /// Supply one operand per predecessor to a placeholder and simplify it
    pub(crate) fn complete_phi(&mut self, var: VariableId, phi: GateRef) -> SsaResult<GateRef> {
        let label = self
            .label_from_selector(phi)
            .ok_or(SsaError::UnknownSelector { gate: phi })?;
        // One empty slot per predecessor: a half-filled phi is never judged trivial.
        let slots = self.label_state(label).predecessors.len();
        for idx in self.circuit.num_ins(phi)..=slots {
            self.circuit.set_in(phi, idx, GateRef::NULL);
        }
        self.resolve_variable(var, Start::Complete { phi, label })
    }

    fn resolve_variable(&mut self, var: VariableId, start: Start) -> SsaResult<GateRef> {
        let mut frames: Vec<PhiFill> = Vec::new();
        let mut next_read: Option<Label> = None;
        let mut returned: Option<GateRef> = None;
        match start {
            Start::Read(label) => next_read = Some(label),
            Start::Complete { phi, label } => frames.push(PhiFill {
                phi,
                label,
                filled: 0,
                chain: Vec::new(),
                cache: false,
            }),
        }

        loop {
            if let Some(label) = next_read.take() {
                match self.descend(var, label) {
                    Descent::Resolved(value) => returned = Some(value),
                    Descent::NeedsOperands(fill) => frames.push(fill),
                }
            }

            let Some(fill) = frames.last_mut() else {
                return returned.ok_or_else(|| SsaError::Internal {
                    message: format!("resolution of {} produced no value", var),
                });
            };
            if let Some(value) = returned.take() {
                fill.filled += 1;
                let value = self.circuit.resolve(value);
                self.circuit.set_in(fill.phi, fill.filled, value);
            }
            let pending = self.labels[fill.label.index()]
                .predecessors
                .get(fill.filled)
                .copied();
            if let Some(predecessor) = pending {
                next_read = Some(predecessor);
                continue;
            }

            if let Some(done) = frames.pop() {
                let value = self.try_remove_trivial_phi(done.phi);
                if done.cache {
                    self.label_state_mut(done.label).value_map.insert(var, value);
                }
                self.cache_along(var, &done.chain, value);
                returned = Some(value);
            }
        }
    }

    /// Walk single-predecessor chains until a value or a phi site is found
    fn descend(&mut self, var: VariableId, label: Label) -> Descent {
        let mut chain: Vec<Label> = Vec::new();
        let mut visited: HashSet<Label> = HashSet::new();
        let mut current = label;

        loop {
            let (cached, sealed, predecessor_count) = {
                let state = self.label_state(current);
                (
                    state.value_map.get(&var).copied(),
                    state.is_sealed,
                    state.predecessors.len(),
                )
            };

            if let Some(value) = cached {
                let value = self.circuit.resolve(value);
                self.cache_along(var, &chain, value);
                return Descent::Resolved(value);
            }

            if !sealed {
                let phi = self.new_selector(var, current, predecessor_count);
                let state = self.label_state_mut(current);
                state.incomplete_phis.insert(var, phi);
                state.value_map.insert(var, phi);
                self.cache_along(var, &chain, phi);
                return Descent::Resolved(phi);
            }

            match predecessor_count {
                0 => {
                    let value = self.circuit.no_value();
                    self.label_state_mut(current).value_map.insert(var, value);
                    self.cache_along(var, &chain, value);
                    return Descent::Resolved(value);
                }
                1 => {
                    if !visited.insert(current) {
                        // Single-predecessor cycle: the blocks are unreachable.
                        let value = self.circuit.no_value();
                        self.cache_along(var, &chain, value);
                        return Descent::Resolved(value);
                    }
                    chain.push(current);
                    current = self.label_state(current).predecessors[0];
                }
                count => {
                    let phi = self.new_selector(var, current, count);
                    self.label_state_mut(current).value_map.insert(var, phi);
                    return Descent::NeedsOperands(PhiFill {
                        phi,
                        label: current,
                        filled: 0,
                        chain,
                        cache: true,
                    });
                }
            }
        }
    }

    fn cache_along(&mut self, var: VariableId, chain: &[Label], value: GateRef) {
        for &label in chain {
            self.label_state_mut(label).value_map.insert(var, value);
        }
    }

    /// Selector at `label`'s entry with `slots` empty operand slots
    fn new_selector(&mut self, var: VariableId, label: Label, slots: usize) -> GateRef {
        let ty = self.variable_type(var);
        let opcode = if ty.is_void() {
            OpCode::DependSelector
        } else {
            OpCode::ValueSelector
        };
        let mut ins = Vec::with_capacity(slots + 1);
        ins.push(self.label_state(label).prede_control);
        ins.resize(slots + 1, GateRef::NULL);

        let phi = self
            .circuit
            .new_gate(opcode, ty.machine_type, &ins, ty.gate_type);
        self.add_selector_to_label(phi, label);
        self.stats.phis_created += 1;
        if self.config().trace_circuit {
            trace!("phi {} for {} at {} ({} slots)", phi, var, label, slots);
        }
        phi
    }

    pub(crate) fn seal_label(&mut self, label: Label) -> SsaResult<()> {
        if self.label_state(label).is_sealed {
            return Err(SsaError::AlreadySealed { label });
        }
        let mut completed = 0;
        while let Some((var, phi)) = self.label_state_mut(label).incomplete_phis.pop_first() {
            self.complete_phi(var, phi)?;
            completed += 1;
        }
        self.label_state_mut(label).is_sealed = true;
        debug!(
            "sealed {} ({} predecessors, {} placeholders completed)",
            label,
            self.label_state(label).predecessors.len(),
            completed
        );
        Ok(())
    }

    pub(crate) fn append_predecessor(&mut self, label: Label, predecessor: Label) -> SsaResult<()> {
        let state = self.label_state_mut(label);
        if state.is_sealed {
            return Err(SsaError::PredecessorAfterSeal { label, predecessor });
        }
        state.predecessors.push(predecessor);
        Ok(())
    }

    pub(crate) fn merge_control(&mut self, label: Label, control: GateRef) {
        let state = self.label_state_mut(label);
        if state.prede_control.is_null() {
            state.prede_control = control;
            state.control = control;
            self.retarget_selectors(label, control);
        } else {
            state.other_prede_controls.push(control);
        }
    }

    /// Point operand 0 of every live selector placed in `label` at `control`
    ///
    /// Placeholders read before the block's incoming controls were merged
    /// hang off whatever entry control existed at the time.
    pub(crate) fn retarget_selectors(&mut self, label: Label, control: GateRef) {
        let mut selectors: Vec<GateRef> = self
            .phi_to_labels
            .iter()
            .filter(|&(_, &owner)| owner == label)
            .map(|(&selector, _)| selector)
            .collect();
        selectors.sort_unstable();
        for selector in selectors {
            if self.circuit.is_selector(selector) && self.circuit.get_in(selector, 0) != control {
                self.circuit.set_in(selector, 0, control);
            }
        }
    }

    pub(crate) fn is_loop_head(&self, label: Label) -> bool {
        let control = self.label_state(label).prede_control;
        !control.is_null() && self.circuit.opcode(control).is_loop_head()
    }

    /// Every predecessor has arrived for a block entered through its current control
    fn is_need_seal(&self, label: Label) -> bool {
        let state = self.label_state(label);
        let state_count = if state.prede_control.is_null() {
            1
        } else {
            self.circuit.opcode(state.prede_control).state_count()
        };
        state.predecessors.len() >= state_count
    }

    pub(crate) fn merge_all_control(&mut self, label: Label) -> SsaResult<()> {
        let predecessors = self.label_state(label).predecessors.len();
        if predecessors < 2 {
            return Ok(());
        }

        if self.is_loop_head(label) {
            let state = self.label_state(label);
            if predecessors != 2 || state.other_prede_controls.len() != 1 {
                return Err(SsaError::MalformedLoopHead {
                    label,
                    predecessors,
                    back_edges: state.other_prede_controls.len(),
                });
            }
            let (head, back_edge) = (state.prede_control, state.other_prede_controls[0]);
            self.circuit.set_in(head, 1, back_edge);
            return Ok(());
        }

        let state = self.label_state(label);
        let controls = state.other_prede_controls.len() + usize::from(!state.prede_control.is_null());
        if state.prede_control.is_null() || controls != predecessors {
            return Err(SsaError::ControlMismatch {
                label,
                predecessors,
                controls,
            });
        }
        let mut ins = Vec::with_capacity(predecessors);
        ins.push(state.prede_control);
        ins.extend_from_slice(&state.other_prede_controls);

        let merge = self
            .circuit
            .new_gate(OpCode::Merge, MachineType::NoValue, &ins, GateType::Empty);
        let state = self.label_state_mut(label);
        state.other_prede_controls.clear();
        state.prede_control = merge;
        state.control = merge;
        self.retarget_selectors(label, merge);
        Ok(())
    }

    pub(crate) fn merge_all_depend(&mut self, label: Label) -> SsaResult<()> {
        let predecessors = self.label_state(label).predecessors.clone();
        match predecessors.as_slice() {
            [] => Err(SsaError::NoPredecessors { label }),
            [single] => {
                let depend = self.resolved_depend(*single);
                self.label_state_mut(label).depend = depend;
                Ok(())
            }
            [_, back_edge] if self.is_loop_head(label) => {
                let loop_depend = self.label_state(label).loop_depend;
                if loop_depend.is_null() {
                    return Err(SsaError::MalformedLoopHead {
                        label,
                        predecessors: 2,
                        back_edges: 1,
                    });
                }
                let back_depend = self.resolved_depend(*back_edge);
                self.circuit.set_in(loop_depend, 2, back_depend);
                Ok(())
            }
            many => {
                if self.is_loop_head(label) {
                    return Err(SsaError::MalformedLoopHead {
                        label,
                        predecessors: many.len(),
                        back_edges: many.len() - 1,
                    });
                }
                let mut ins = Vec::with_capacity(many.len() + 1);
                ins.push(self.label_state(label).prede_control);
                for predecessor in many {
                    ins.push(self.resolved_depend(*predecessor));
                }
                let depend = self.circuit.new_gate(
                    OpCode::DependSelector,
                    MachineType::NoValue,
                    &ins,
                    GateType::Empty,
                );
                self.label_state_mut(label).depend = depend;
                Ok(())
            }
        }
    }

    /// Depend edge leaving `label`, following simplified selectors
    pub(crate) fn resolved_depend(&self, label: Label) -> GateRef {
        let depend = self.label_state(label).depend;
        if depend.is_null() {
            depend
        } else {
            self.circuit.resolve(depend)
        }
    }

    pub(crate) fn bind_label(&mut self, label: Label) -> SsaResult<()> {
        let state = self.label_state(label);
        if state.is_sealed {
            return Err(SsaError::AlreadySealed { label });
        }
        let Some(&first) = state.predecessors.first() else {
            return Err(SsaError::NoPredecessors { label });
        };

        if self.is_loop_head(label) {
            let control = self.label_state(label).prede_control;
            let entry_depend = self.resolved_depend(first);
            let loop_depend = self.circuit.new_gate(
                OpCode::DependSelector,
                MachineType::NoValue,
                &[control, entry_depend, GateRef::NULL],
                GateType::Empty,
            );
            let state = self.label_state_mut(label);
            state.loop_depend = loop_depend;
            state.depend = loop_depend;
        }

        if self.is_need_seal(label) {
            self.merge_all_control(label)?;
            self.merge_all_depend(label)?;
            self.seal_label(label)?;
        }
        Ok(())
    }
}

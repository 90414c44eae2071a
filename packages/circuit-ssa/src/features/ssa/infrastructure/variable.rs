//! Variable handle and trivial-phi removal
//!
//! A `Variable` is a typed handle whose reads and writes go through the
//! environment's current label. Phi simplification lives here as well: a
//! selector whose operands are all itself or one other value `v` is replaced
//! by `v` everywhere, and selectors that used it are re-checked through a
//! worklist.

use ahash::AHashSet as HashSet;
use tracing::{debug, trace};

use super::environment::Environment;
use super::errors::{SsaError, SsaResult};
use crate::features::circuit::domain::GateRef;
use crate::features::ssa::domain::{VariableId, VariableType};
use crate::features::ssa::ports::CircuitPort;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    id: VariableId,
    ty: VariableType,
    current_value: GateRef,
}

impl Variable {
    /// Declare a variable and write `value` in the current label
    pub fn new<C: CircuitPort>(
        env: &mut Environment<C>,
        ty: VariableType,
        value: GateRef,
    ) -> SsaResult<Self> {
        let mut var = Self::declare(env, ty);
        var.write(env, value)?;
        Ok(var)
    }

    /// Declare without a definition; reads before any write see the
    /// values reaching from predecessors
    pub fn declare<C: CircuitPort>(env: &mut Environment<C>, ty: VariableType) -> Self {
        Self {
            id: env.next_variable_id(ty),
            ty,
            current_value: GateRef::NULL,
        }
    }

    pub fn id(&self) -> VariableId {
        self.id
    }

    pub fn ty(&self) -> VariableType {
        self.ty
    }

    /// Last value written through this handle
    pub fn current_value(&self) -> GateRef {
        self.current_value
    }

    /// Value reaching the current label
    ///
    /// Fails with `UndefinedValue` when some path never defines the variable.
    pub fn read<C: CircuitPort>(&self, env: &mut Environment<C>) -> SsaResult<GateRef> {
        let label = env.require_current("read_variable")?;
        let value = env.read_variable_in(label, self.id)?;
        if env.circuit().is_no_value(value) {
            return Err(SsaError::UndefinedValue {
                variable: self.id,
                label,
            });
        }
        Ok(value)
    }

    pub fn write<C: CircuitPort>(
        &mut self,
        env: &mut Environment<C>,
        value: GateRef,
    ) -> SsaResult<()> {
        let label = env.require_current("write_variable")?;
        label.write_variable(env, self.id, value);
        self.current_value = value;
        if env.config().trace_circuit {
            trace!("{} := {} in {}", self.id, value, label);
        }
        Ok(())
    }

    /// Fill `phi` from its label's predecessors and simplify it
    pub fn add_phi_operand<C: CircuitPort>(
        &self,
        env: &mut Environment<C>,
        phi: GateRef,
    ) -> SsaResult<GateRef> {
        env.complete_phi(self.id, phi)
    }

    /// Write operand `idx` of `selector`
    pub fn add_operand_to_selector<C: CircuitPort>(
        &self,
        env: &mut Environment<C>,
        selector: GateRef,
        idx: usize,
        value: GateRef,
    ) -> GateRef {
        env.circuit_mut().set_in(selector, idx, value);
        selector
    }

    pub fn try_remove_trivial_phi<C: CircuitPort>(
        &self,
        env: &mut Environment<C>,
        phi: GateRef,
    ) -> GateRef {
        env.try_remove_trivial_phi(phi)
    }
}

impl<C: CircuitPort> Environment<C> {
    /// Replace `phi` if trivial, cascading to selectors that used it.
    /// Returns whatever now stands for `phi`.
    pub(crate) fn try_remove_trivial_phi(&mut self, phi: GateRef) -> GateRef {
        let mut worklist = vec![phi];
        let mut queued: HashSet<GateRef> = HashSet::new();
        queued.insert(phi);

        while let Some(candidate) = worklist.pop() {
            queued.remove(&candidate);
            if !self.circuit.is_selector(candidate) {
                continue;
            }
            let Some(same) = self.trivial_replacement(candidate) else {
                continue;
            };

            let users = self.circuit.replace_all_uses(candidate, same);
            self.circuit.delete_gate(candidate, same);
            if self.phi_to_labels.remove(&candidate).is_some() {
                self.stats.phis_removed += 1;
            }
            debug!("trivial phi {} -> {}", candidate, same);

            for user in users {
                if self.circuit.is_selector(user) && queued.insert(user) {
                    worklist.push(user);
                }
            }
        }

        self.circuit.resolve(phi)
    }

    /// The single value a selector merges, ignoring self-references.
    /// `None` while a slot is empty or when two distinct values meet.
    fn trivial_replacement(&mut self, phi: GateRef) -> Option<GateRef> {
        let mut same: Option<GateRef> = None;
        for idx in 1..self.circuit.num_ins(phi) {
            let operand = self.circuit.get_in(phi, idx);
            if operand.is_null() {
                return None;
            }
            if operand == phi || same == Some(operand) {
                continue;
            }
            if same.is_some() {
                return None;
            }
            same = Some(operand);
        }
        Some(match same {
            Some(value) => value,
            None => self.circuit.no_value(),
        })
    }
}

/*
 * Environment - per-function construction state
 *
 * Owns everything one function's circuit is built with:
 * - The label arena (all blocks, freed together with the environment)
 * - The current label and the stack of outer labels saved by sub-CFG regions
 * - Variable ids and their type tags
 * - Function arguments and opaque inputs
 * - The selector -> label map phi completion goes through
 */

use ahash::AHashMap as HashMap;
use tracing::debug;

use super::errors::{SsaError, SsaResult};
use crate::config::CompilationConfig;
use crate::features::circuit::domain::{GateRef, OpCode};
use crate::features::circuit::Circuit;
use crate::features::ssa::domain::{Label, LabelImpl, SsaStats, VariableId, VariableType};
use crate::features::ssa::ports::CircuitPort;

/// Construction state for one function or stub
pub struct Environment<C: CircuitPort = Circuit> {
    pub(crate) circuit: C,
    config: CompilationConfig,
    pub(crate) labels: Vec<LabelImpl>,
    pub(crate) variable_types: Vec<VariableType>,
    stack: Vec<Label>,
    current: Option<Label>,
    entry: Label,
    arguments: Vec<GateRef>,
    inputs: Vec<GateRef>,
    pub(crate) phi_to_labels: HashMap<GateRef, Label>,
    pub(crate) stats: SsaStats,
}

impl Environment<Circuit> {
    /// Environment over a fresh circuit
    pub fn new(config: CompilationConfig, argument_types: &[VariableType]) -> Self {
        Self::with_circuit(Circuit::new(), config, argument_types)
    }
}

impl<C: CircuitPort> Environment<C> {
    /// Environment building into `circuit`
    ///
    /// Creates one argument gate per entry of `argument_types` and a sealed
    /// entry label sitting on the circuit's state and depend roots. The entry
    /// label is current when this returns.
    pub fn with_circuit(
        mut circuit: C,
        config: CompilationConfig,
        argument_types: &[VariableType],
    ) -> Self {
        let arguments = argument_types
            .iter()
            .enumerate()
            .map(|(index, ty)| {
                circuit.new_gate(
                    OpCode::Argument(index as u32),
                    ty.machine_type,
                    &[],
                    ty.gate_type,
                )
            })
            .collect();
        let state_root = circuit.state_root();
        let depend_root = circuit.depend_root();

        let mut env = Self {
            circuit,
            config,
            labels: Vec::new(),
            variable_types: Vec::new(),
            stack: Vec::new(),
            current: None,
            entry: Label::from_index(0),
            arguments,
            inputs: Vec::new(),
            phi_to_labels: HashMap::new(),
            stats: SsaStats::default(),
        };

        let entry = env.new_label(state_root);
        let state = env.label_state_mut(entry);
        state.depend = depend_root;
        state.is_sealed = true;
        env.entry = entry;
        env.current = Some(entry);
        env
    }

    /// Allocate a label whose entry control is `control`
    pub fn new_label(&mut self, control: GateRef) -> Label {
        let label = Label::from_index(self.labels.len());
        self.labels.push(LabelImpl::new(control));
        self.stats.labels += 1;
        label
    }

    pub fn label_state(&self, label: Label) -> &LabelImpl {
        &self.labels[label.index()]
    }

    pub(crate) fn label_state_mut(&mut self, label: Label) -> &mut LabelImpl {
        &mut self.labels[label.index()]
    }

    pub fn entry_label(&self) -> Label {
        self.entry
    }

    pub fn current_label(&self) -> Option<Label> {
        self.current
    }

    pub fn set_current_label(&mut self, label: Option<Label>) {
        self.current = label;
    }

    pub(crate) fn require_current(&self, operation: &'static str) -> SsaResult<Label> {
        self.current.ok_or(SsaError::NoCurrentLabel { operation })
    }

    /// Enter a nested region whose blocks start at `entry`
    ///
    /// The current label is saved and `entry` takes over its control and
    /// depend edges. `entry` gets the saved label as its only predecessor and
    /// is sealed, so values defined before the region stay readable inside.
    pub fn sub_cfg_entry(&mut self, entry: Label) -> SsaResult<()> {
        let outer = self.require_current("sub_cfg_entry")?;
        if self.stack.len() >= self.config.max_sub_cfg_depth {
            return Err(SsaError::SubCfgTooDeep {
                max_depth: self.config.max_sub_cfg_depth,
            });
        }
        let state = self.label_state(entry);
        if state.is_sealed || !state.predecessors.is_empty() {
            return Err(SsaError::SubCfgEntryNotFresh { label: entry });
        }

        let (control, depend) = {
            let outer_state = self.label_state(outer);
            (outer_state.control, outer_state.depend)
        };
        self.stack.push(outer);

        let state = self.label_state_mut(entry);
        state.control = control;
        state.prede_control = control;
        state.depend = depend;
        state.predecessors.push(outer);
        state.is_sealed = true;
        self.current = Some(entry);

        debug!(
            "sub-CFG entry {} from {} (depth {})",
            entry,
            outer,
            self.stack.len()
        );
        Ok(())
    }

    /// Leave the innermost region, handing its final edges back to the saved label
    pub fn sub_cfg_exit(&mut self) -> SsaResult<()> {
        let inner = self.require_current("sub_cfg_exit")?;
        let outer = self.stack.pop().ok_or(SsaError::SubCfgUnderflow)?;

        let (control, depend) = {
            let inner_state = self.label_state(inner);
            (inner_state.control, inner_state.depend)
        };
        let state = self.label_state_mut(outer);
        state.control = control;
        state.depend = depend;
        self.current = Some(outer);

        debug!("sub-CFG exit {} -> {} (depth {})", inner, outer, self.stack.len());
        Ok(())
    }

    pub fn sub_cfg_depth(&self) -> usize {
        self.stack.len()
    }

    /// Fresh variable id carrying `ty`
    pub fn next_variable_id(&mut self, ty: VariableType) -> VariableId {
        let id = VariableId::from_index(self.variable_types.len());
        self.variable_types.push(ty);
        self.stats.variables += 1;
        id
    }

    pub fn variable_type(&self, var: VariableId) -> VariableType {
        self.variable_types[var.index()]
    }

    pub fn argument(&self, index: usize) -> SsaResult<GateRef> {
        self.arguments
            .get(index)
            .copied()
            .ok_or(SsaError::ArgumentOutOfRange {
                index,
                count: self.arguments.len(),
            })
    }

    pub fn arguments(&self) -> &[GateRef] {
        &self.arguments
    }

    /// Register an opaque input value; returns its index
    pub fn add_input(&mut self, gate: GateRef) -> usize {
        self.inputs.push(gate);
        self.inputs.len() - 1
    }

    pub fn input(&self, index: usize) -> SsaResult<GateRef> {
        self.inputs
            .get(index)
            .copied()
            .ok_or(SsaError::InputOutOfRange {
                index,
                count: self.inputs.len(),
            })
    }

    pub fn add_selector_to_label(&mut self, selector: GateRef, label: Label) {
        self.phi_to_labels.insert(selector, label);
    }

    pub fn label_from_selector(&self, selector: GateRef) -> Option<Label> {
        self.phi_to_labels.get(&selector).copied()
    }

    pub fn circuit(&self) -> &C {
        &self.circuit
    }

    pub fn circuit_mut(&mut self) -> &mut C {
        &mut self.circuit
    }

    pub fn config(&self) -> &CompilationConfig {
        &self.config
    }

    pub fn is_32bit(&self) -> bool {
        self.config.is_32bit()
    }

    pub fn is_aarch64(&self) -> bool {
        self.config.is_aarch64()
    }

    pub fn is_amd64(&self) -> bool {
        self.config.is_amd64()
    }

    pub fn stats(&self) -> SsaStats {
        self.stats
    }

    /// Check the structural invariants of a finished construction
    ///
    /// Every selector still alive must have all operands filled, which only
    /// holds if every label that produced a placeholder got sealed.
    pub fn verify(&self) -> SsaResult<()> {
        let mut selectors: Vec<GateRef> = self.phi_to_labels.keys().copied().collect();
        selectors.sort();
        for selector in selectors {
            if !self.circuit.is_selector(selector) {
                continue;
            }
            let unfilled = (1..self.circuit.num_ins(selector))
                .any(|idx| self.circuit.get_in(selector, idx).is_null());
            if unfilled {
                return Err(SsaError::IncompletePhi { gate: selector });
            }
        }
        debug!("circuit verified: {} selectors", self.phi_to_labels.len());
        Ok(())
    }

    /// Tear down the environment and hand back the built circuit
    pub fn finish(self) -> SsaResult<C> {
        if !self.stack.is_empty() {
            return Err(SsaError::UnbalancedSubCfg {
                open: self.stack.len(),
            });
        }
        if self.config.verify_circuit {
            self.verify()?;
        }
        debug!(
            "environment finished: {} labels, {} variables, {} phis ({} removed)",
            self.stats.labels,
            self.stats.variables,
            self.stats.phis_created,
            self.stats.phis_removed
        );
        Ok(self.circuit)
    }
}

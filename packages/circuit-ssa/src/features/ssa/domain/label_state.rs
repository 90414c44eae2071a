//! Per-block state

use ahash::AHashMap as HashMap;
use std::collections::BTreeMap;

use super::ids::{Label, VariableId};
use crate::features::circuit::domain::GateRef;

/// State of one basic block
///
/// Lifecycle: open (accepting predecessors, reads produce placeholder phis)
/// then sealed (predecessor set fixed, every placeholder completed). Sealing
/// never reverts.
#[derive(Debug, Clone)]
pub struct LabelImpl {
    /// Current control edge
    pub(crate) control: GateRef,
    /// Control edge at block entry; phis hang off it
    pub(crate) prede_control: GateRef,
    /// Current depend edge
    pub(crate) depend: GateRef,
    /// Depend selector of a loop head, back edge wired when the loop closes
    pub(crate) loop_depend: GateRef,
    /// Incoming controls beyond the first
    pub(crate) other_prede_controls: Vec<GateRef>,
    pub(crate) value_map: HashMap<VariableId, GateRef>,
    /// Ordered so sealing completes placeholders deterministically
    pub(crate) incomplete_phis: BTreeMap<VariableId, GateRef>,
    pub(crate) predecessors: Vec<Label>,
    pub(crate) is_sealed: bool,
}

impl LabelImpl {
    pub fn new(control: GateRef) -> Self {
        Self {
            control,
            prede_control: control,
            depend: GateRef::NULL,
            loop_depend: GateRef::NULL,
            other_prede_controls: Vec::new(),
            value_map: HashMap::new(),
            incomplete_phis: BTreeMap::new(),
            predecessors: Vec::new(),
            is_sealed: false,
        }
    }

    pub fn control(&self) -> GateRef {
        self.control
    }

    pub fn prede_control(&self) -> GateRef {
        self.prede_control
    }

    pub fn depend(&self) -> GateRef {
        self.depend
    }

    pub fn predecessors(&self) -> &[Label] {
        &self.predecessors
    }

    pub fn is_sealed(&self) -> bool {
        self.is_sealed
    }

    /// Value recorded for `var` in this block, if any
    pub fn value_of(&self, var: VariableId) -> Option<GateRef> {
        self.value_map.get(&var).copied()
    }

    pub fn pending_phi_count(&self) -> usize {
        self.incomplete_phis.len()
    }
}

use std::fmt;

/// Handle to a basic block owned by an `Environment`
///
/// `Copy` on purpose: every copy observes the same block state, which lives
/// in the environment's label arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(u32);

impl Label {
    pub(crate) fn from_index(index: usize) -> Self {
        Label(u32::try_from(index).expect("label arena exceeds the u32 index space"))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Identity of an SSA-tracked variable, unique within one `Environment`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(u32);

impl VariableId {
    pub(crate) fn from_index(index: usize) -> Self {
        VariableId(u32::try_from(index).expect("variable count exceeds the u32 index space"))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

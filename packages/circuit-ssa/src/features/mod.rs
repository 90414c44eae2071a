//! Feature modules - Each feature follows Hexagonal Architecture
//!
//! - circuit        - gate arena the SSA core builds into
//! - ssa            - labels, variables and on-the-fly phi construction
//! - call_signature - stub signature table used by call emission

pub mod call_signature;
pub mod circuit;
pub mod ssa;

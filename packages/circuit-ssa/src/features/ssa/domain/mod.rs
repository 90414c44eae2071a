pub mod ids;
pub mod label_state;
pub mod stats;
pub mod variable_type;

pub use ids::{Label, VariableId};
pub use label_state::LabelImpl;
pub use stats::SsaStats;
pub use variable_type::VariableType;

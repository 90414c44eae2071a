use crate::features::ssa::domain::VariableType;
use crate::features::ssa::infrastructure::{Environment, SsaResult};

/// IR-emission driver for one function or stub
///
/// Implementors translate their source (bytecode, HIR, a stub template) into
/// the environment's circuit using labels and variables.
pub trait FunctionEmitter: Send + Sync {
    fn name(&self) -> &str;

    fn argument_types(&self) -> Vec<VariableType> {
        Vec::new()
    }

    fn emit(&self, env: &mut Environment) -> SsaResult<()>;
}

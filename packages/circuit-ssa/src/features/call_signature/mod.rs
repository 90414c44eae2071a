//! Call signatures for stub calls emitted through `Environment::call_stub`

pub mod registry;

pub use registry::{
    init, lookup, registry, CallKind, CallSignature, RegistryError, SignatureRegistry,
};

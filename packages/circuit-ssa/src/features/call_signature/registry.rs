/*
 * Call signature registry
 *
 * Stubs are called by index. The table is built once at startup and never
 * changes, so emitters on any thread look signatures up without locking.
 */

use ahash::AHashMap as HashMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::features::ssa::domain::VariableType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    CommonStub,
    RuntimeStub,
    BuiltinsStub,
}

/// Parameter and return types of a callable stub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSignature {
    pub name: String,
    pub kind: CallKind,
    pub params: Vec<VariableType>,
    pub return_type: VariableType,
    /// Extra arguments past `params` are accepted
    #[serde(default)]
    pub variadic: bool,
}

impl CallSignature {
    pub fn new(
        name: impl Into<String>,
        kind: CallKind,
        params: Vec<VariableType>,
        return_type: VariableType,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            params,
            return_type,
            variadic: false,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn accepts(&self, argument_count: usize) -> bool {
        if self.variadic {
            argument_count >= self.params.len()
        } else {
            argument_count == self.params.len()
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("call signature registry already initialized")]
    AlreadyInitialized,

    #[error("duplicate call signature '{name}'")]
    Duplicate { name: String },
}

/// Immutable name -> (index, signature) table
#[derive(Debug, Default)]
pub struct SignatureRegistry {
    signatures: Vec<CallSignature>,
    by_name: HashMap<String, u32>,
}

impl SignatureRegistry {
    pub fn new(signatures: Vec<CallSignature>) -> Result<Self, RegistryError> {
        let mut by_name = HashMap::with_capacity(signatures.len());
        for (index, signature) in signatures.iter().enumerate() {
            if by_name.insert(signature.name.clone(), index as u32).is_some() {
                return Err(RegistryError::Duplicate {
                    name: signature.name.clone(),
                });
            }
        }
        Ok(Self {
            signatures,
            by_name,
        })
    }

    pub fn get(&self, name: &str) -> Option<(u32, &CallSignature)> {
        let index = *self.by_name.get(name)?;
        Some((index, &self.signatures[index as usize]))
    }

    pub fn get_by_index(&self, index: u32) -> Option<&CallSignature> {
        self.signatures.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CallSignature> {
        self.signatures.iter()
    }
}

static REGISTRY: OnceCell<SignatureRegistry> = OnceCell::new();

/// Install the process-wide table. Only the first call succeeds.
pub fn init(signatures: Vec<CallSignature>) -> Result<(), RegistryError> {
    let registry = SignatureRegistry::new(signatures)?;
    let count = registry.len();
    REGISTRY
        .set(registry)
        .map_err(|_| RegistryError::AlreadyInitialized)?;
    info!("call signature registry initialized with {} entries", count);
    Ok(())
}

pub fn registry() -> Option<&'static SignatureRegistry> {
    REGISTRY.get()
}

pub fn lookup(name: &str) -> Option<(u32, &'static CallSignature)> {
    registry()?.get(name)
}

/// Signatures every unit test in this crate shares; the global table can
/// only be installed once per process.
#[cfg(test)]
pub(crate) fn init_for_tests() {
    let signatures = vec![
        CallSignature::new(
            "GetProperty",
            CallKind::CommonStub,
            vec![VariableType::native_pointer(), VariableType::js_any()],
            VariableType::js_any(),
        ),
        CallSignature::new(
            "Print",
            CallKind::RuntimeStub,
            vec![VariableType::native_pointer()],
            VariableType::void(),
        )
        .variadic(),
    ];
    match init(signatures) {
        Ok(()) | Err(RegistryError::AlreadyInitialized) => {}
        Err(err) => panic!("test signatures rejected: {}", err),
    }
}

/*
 * Circuit SSA - incremental SSA construction for a sea-of-nodes JIT IR
 *
 * Feature-First Hexagonal Architecture:
 * - config/    : Compilation configuration (presets, YAML, validation)
 * - features/  : Vertical slices (circuit → ssa → call_signature)
 *
 * Construction:
 * - Phis created on demand while control flow is emitted (Braun et al. 2013)
 * - Trivial phis removed as soon as their operands are known
 * - Functions built independently on the rayon pool
 */

// Crate-level lint configuration
#![allow(clippy::new_without_default)] // Label::new takes the environment
#![allow(clippy::upper_case_acronyms)] // SSA, CFG naming
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::should_implement_trait)] // from_str naming intentional

/// Configuration system
pub mod config;

/// Feature modules
pub mod features;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{CompilationConfig, ConfigError, Preset, TargetTriple};
pub use features::circuit::{Circuit, Gate, GateRef, GateType, MachineType, OpCode};
pub use features::ssa::{
    BuildCircuitsUseCase, CircuitPort, Environment, FunctionEmitter, Label, SsaError, SsaResult,
    SsaStats, Variable, VariableId, VariableType,
};

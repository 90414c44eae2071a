/*
 * SSA application layer
 *
 * BuildCircuitsUseCase - runs a batch of FunctionEmitters, one Environment each
 */

pub mod build_circuits;

pub use build_circuits::{init_rayon, BuildCircuitsUseCase, CompiledFunction};

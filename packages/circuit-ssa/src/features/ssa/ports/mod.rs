pub mod circuit_port;
pub mod function_emitter;

pub use circuit_port::CircuitPort;
pub use function_emitter::FunctionEmitter;

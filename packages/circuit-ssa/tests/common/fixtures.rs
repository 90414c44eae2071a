//! Environment and graph-shape fixtures

use circuit_ssa::{
    CompilationConfig, Environment, GateRef, GateType, Label, MachineType, Preset, VariableType,
};

/// Route `tracing` output to the test harness; RUST_LOG filters it
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Environment with verification and tracing switched on
pub fn debug_env(argument_types: &[VariableType]) -> Environment {
    init_tracing();
    Environment::new(CompilationConfig::from_preset(Preset::Debug), argument_types)
}

pub fn env() -> Environment {
    debug_env(&[])
}

pub fn i32_const(env: &mut Environment, value: u64) -> GateRef {
    env.circuit_mut()
        .constant(MachineType::I32, value, GateType::NJsValue)
}

/// Fresh labels, all open
pub fn labels<const N: usize>(env: &mut Environment) -> [Label; N] {
    std::array::from_fn(|_| Label::new(env))
}

/// Wire `preds -> label` in order
pub fn connect(env: &mut Environment, label: Label, preds: &[Label]) {
    for &pred in preds {
        label
            .append_predecessor(env, pred)
            .expect("label still open");
    }
}

/// entry -> {b, c} -> d, all sealed; returns [b, c, d]
pub fn diamond(env: &mut Environment) -> [Label; 3] {
    let entry = env.entry_label();
    let [b, c, d] = labels::<3>(env);
    connect(env, b, &[entry]);
    connect(env, c, &[entry]);
    connect(env, d, &[b, c]);
    for label in [b, c, d] {
        label.seal(env).expect("seal");
    }
    [b, c, d]
}

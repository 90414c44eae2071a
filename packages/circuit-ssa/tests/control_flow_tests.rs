//! Driver-level tests: functions emitted through jump/branch/loop primitives

mod common;

use circuit_ssa::features::ssa::FunctionEmitter;
use circuit_ssa::{
    BuildCircuitsUseCase, CompilationConfig, Environment, Label, OpCode, Preset, SsaError,
    SsaResult, Variable, VariableType,
};
use common::*;
use pretty_assertions::assert_eq;

/// fn max(a, b) { if a < b { r = b } else { r = a }; return r }
struct Max;

impl FunctionEmitter for Max {
    fn name(&self) -> &str {
        "max"
    }

    fn argument_types(&self) -> Vec<VariableType> {
        vec![VariableType::int32(), VariableType::int32()]
    }

    fn emit(&self, env: &mut Environment) -> SsaResult<()> {
        let (a, b) = (env.argument(0)?, env.argument(1)?);
        let mut r = Variable::declare(env, VariableType::int32());
        let then_label = Label::new(env);
        let else_label = Label::new(env);
        let exit = Label::new(env);

        let cond = env.int32_less_than(a, b);
        env.branch(cond, then_label, else_label)?;

        env.bind(then_label)?;
        r.write(env, b)?;
        env.jump(exit)?;

        env.bind(else_label)?;
        r.write(env, a)?;
        env.jump(exit)?;

        env.bind(exit)?;
        let result = r.read(env)?;
        env.return_value(result)?;
        Ok(())
    }
}

/// fn sum(n) { s = 0; i = 0; while i < n { s = s + i; i = i + 1 }; return s }
struct Sum;

impl FunctionEmitter for Sum {
    fn name(&self) -> &str {
        "sum"
    }

    fn argument_types(&self) -> Vec<VariableType> {
        vec![VariableType::int32()]
    }

    fn emit(&self, env: &mut Environment) -> SsaResult<()> {
        let n = env.argument(0)?;
        let zero = env.int32(0);
        let mut s = Variable::new(env, VariableType::int32(), zero)?;
        let mut i = Variable::new(env, VariableType::int32(), zero)?;
        let head = Label::new(env);
        let body = Label::new(env);
        let exit = Label::new(env);

        env.jump(head)?;
        env.loop_begin(head)?;
        let iv = i.read(env)?;
        let cond = env.int32_less_than(iv, n);
        env.branch(cond, body, exit)?;

        env.bind(body)?;
        let (sv, iv) = (s.read(env)?, i.read(env)?);
        let next_s = env.int32_add(sv, iv);
        s.write(env, next_s)?;
        let one = env.int32(1);
        let next_i = env.int32_add(iv, one);
        i.write(env, next_i)?;
        env.loop_end(head)?;

        env.bind(exit)?;
        let result = s.read(env)?;
        env.return_value(result)?;
        Ok(())
    }
}

#[test]
fn test_if_else_produces_merge_and_phi() {
    init_tracing();
    let use_case = BuildCircuitsUseCase::new(CompilationConfig::from_preset(Preset::Debug));
    let compiled = use_case.build_one(&Max).unwrap();
    let circuit = &compiled.circuit;

    assert_eq!(circuit.count_opcode(OpCode::Merge), 1);
    assert_eq!(circuit.count_opcode(OpCode::IfTrue), 1);
    assert_eq!(circuit.count_opcode(OpCode::IfFalse), 1);
    assert_eq!(compiled.stats.live_phis(), 1);

    let ret = circuit
        .live_gates()
        .find(|&g| circuit.opcode(g) == OpCode::Return)
        .unwrap();
    let phi = circuit.get_in(ret, 2);
    assert_eq!(circuit.opcode(phi), OpCode::ValueSelector);
    let merge = circuit.get_in(phi, 0);
    assert_eq!(circuit.opcode(merge), OpCode::Merge);
}

#[test]
fn test_counting_loop_keeps_only_loop_carried_phis() {
    init_tracing();
    let use_case = BuildCircuitsUseCase::new(CompilationConfig::from_preset(Preset::Debug));
    let compiled = use_case.build_one(&Sum).unwrap();
    let circuit = &compiled.circuit;

    assert_eq!(circuit.count_opcode(OpCode::LoopBegin), 1);
    assert_eq!(circuit.count_opcode(OpCode::LoopBack), 1);
    // s and i are loop-carried; nothing else survives
    assert_eq!(compiled.stats.live_phis(), 2);

    let loop_begin = circuit
        .live_gates()
        .find(|&g| circuit.opcode(g) == OpCode::LoopBegin)
        .unwrap();
    for phi in circuit
        .live_gates()
        .filter(|&g| circuit.opcode(g) == OpCode::ValueSelector)
    {
        assert_eq!(circuit.get_in(phi, 0), loop_begin);
        assert_eq!(circuit.selector_operands(phi).len(), 2);
    }
}

#[test]
fn test_loop_depend_selector_gets_back_edge() {
    let mut env = debug_env(&[VariableType::native_pointer()]);
    let base = env.argument(0).unwrap();
    let head = Label::new(&mut env);
    let body = Label::new(&mut env);
    let exit = Label::new(&mut env);

    env.jump(head).unwrap();
    env.loop_begin(head).unwrap();
    let loop_depend = head.depend(&env);
    assert_eq!(env.circuit().opcode(loop_depend), OpCode::DependSelector);

    let flag = env.boolean(true);
    env.branch(flag, body, exit).unwrap();
    env.bind(body).unwrap();
    let offset = env.int32(0);
    let store = env.store(base, offset, offset).unwrap();
    env.loop_end(head).unwrap();

    assert_eq!(env.circuit().get_in(loop_depend, 2), store);
    assert_eq!(
        env.circuit().get_in(loop_depend, 1),
        env.circuit().depend_root()
    );
}

#[test]
fn test_void_variable_merges_through_depend_selector() {
    let mut env = env();
    let root = env.circuit().depend_root();
    let mut token = Variable::new(&mut env, VariableType::void(), root).unwrap();
    let [t, f, join] = labels::<3>(&mut env);
    let cond = env.boolean(false);
    env.branch(cond, t, f).unwrap();

    env.bind(t).unwrap();
    let base = env.int64(0);
    let store = env.store(base, base, base).unwrap();
    token.write(&mut env, store).unwrap();
    env.jump(join).unwrap();

    env.bind(f).unwrap();
    env.jump(join).unwrap();
    env.bind(join).unwrap();

    let merged = token.read(&mut env).unwrap();
    assert_eq!(env.circuit().opcode(merged), OpCode::DependSelector);
    assert_eq!(env.circuit().selector_operands(merged), &[store, root]);
}

#[test]
fn test_join_read_before_last_edge_is_keyed_to_merge() {
    let mut env = env();
    let one = env.int32(1);
    let mut x = Variable::new(&mut env, VariableType::int32(), one).unwrap();
    let [t, f, join] = labels::<3>(&mut env);
    let cond = env.boolean(true);
    env.branch(cond, t, f).unwrap();

    env.bind(t).unwrap();
    let seven = env.int32(7);
    x.write(&mut env, seven).unwrap();
    env.jump(join).unwrap();
    // join has one of its two edges; the read places a placeholder
    let phi = join.read_variable(&mut env, x.id()).unwrap();

    env.bind(f).unwrap();
    env.jump(join).unwrap();
    env.bind(join).unwrap();

    let merge = join.control(&env);
    assert_eq!(env.circuit().opcode(merge), OpCode::Merge);
    assert_eq!(env.circuit().opcode(phi), OpCode::ValueSelector);
    assert_eq!(env.circuit().get_in(phi, 0), merge);
    assert_eq!(env.circuit().selector_operands(phi), &[seven, one]);
    assert_eq!(x.read(&mut env), Ok(phi));
    env.verify().unwrap();
}

// ============================================================================
// Sub-CFG
// ============================================================================

#[test]
fn test_sub_cfg_sees_outer_values_and_hands_back_edges() {
    let mut env = env();
    let v = env.int32(4);
    let x = Variable::new(&mut env, VariableType::int32(), v).unwrap();
    let entry = env.entry_label();
    let [inner, inner_exit] = labels::<2>(&mut env);

    env.sub_cfg_entry(inner).unwrap();
    assert_eq!(env.sub_cfg_depth(), 1);
    assert!(inner.is_sealed(&env));
    assert_eq!(inner.predecessors(&env), vec![entry]);
    assert_eq!(x.read(&mut env).unwrap(), v);

    env.jump(inner_exit).unwrap();
    env.bind(inner_exit).unwrap();
    let exit_control = inner_exit.control(&env);
    env.sub_cfg_exit().unwrap();

    assert_eq!(env.current_label(), Some(entry));
    assert_eq!(entry.control(&env), exit_control);
    assert_eq!(env.sub_cfg_depth(), 0);
}

#[test]
fn test_sub_cfg_entry_must_be_fresh() {
    let mut env = env();
    let [inner] = labels::<1>(&mut env);
    inner.seal(&mut env).unwrap();
    assert_eq!(
        env.sub_cfg_entry(inner),
        Err(SsaError::SubCfgEntryNotFresh { label: inner })
    );
    assert_eq!(env.sub_cfg_depth(), 0);
}

#[test]
fn test_nested_sub_cfgs_unwind_in_order() {
    let mut env = env();
    let entry = env.entry_label();
    let [first, second] = labels::<2>(&mut env);
    env.sub_cfg_entry(first).unwrap();
    env.sub_cfg_entry(second).unwrap();
    assert_eq!(env.sub_cfg_depth(), 2);

    env.sub_cfg_exit().unwrap();
    assert_eq!(env.current_label(), Some(first));
    env.sub_cfg_exit().unwrap();
    assert_eq!(env.current_label(), Some(entry));
    assert_eq!(env.sub_cfg_exit(), Err(SsaError::SubCfgUnderflow));
}

// ============================================================================
// Batch building
// ============================================================================

struct ReadsUndefined;

impl FunctionEmitter for ReadsUndefined {
    fn name(&self) -> &str {
        "reads_undefined"
    }

    fn emit(&self, env: &mut Environment) -> SsaResult<()> {
        let x = Variable::declare(env, VariableType::int32());
        x.read(env).map(|_| ())
    }
}

#[test]
fn test_batch_reports_each_function() {
    init_tracing();
    let use_case = BuildCircuitsUseCase::new(CompilationConfig::from_preset(Preset::Release));
    let emitters: Vec<Box<dyn FunctionEmitter>> =
        vec![Box::new(Max), Box::new(ReadsUndefined), Box::new(Sum)];
    let results = use_case.execute(&emitters);

    let names: Vec<_> = results
        .iter()
        .map(|r| r.as_ref().map(|f| f.name.as_str()).ok())
        .collect();
    assert_eq!(names, vec![Some("max"), None, Some("sum")]);
    assert!(matches!(
        results[1],
        Err(SsaError::UndefinedValue { .. })
    ));
}

#[test]
fn test_circuit_dump_is_json() {
    let use_case = BuildCircuitsUseCase::new(CompilationConfig::default());
    let compiled = use_case.build_one(&Max).unwrap();
    let json = compiled.circuit.to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    let gates = parsed.as_array().unwrap();
    assert_eq!(gates.len(), compiled.circuit.live_gates().count());
    assert!(gates
        .iter()
        .any(|g| g["opcode"] == serde_json::json!("VALUE_SELECTOR")));
}

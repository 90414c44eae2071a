//! SSA construction through the label API
//!
//! Graph shapes are wired by hand (append_predecessor + seal) so each test
//! pins down exactly one construction property.

mod common;

use circuit_ssa::{Label, OpCode, SsaError, Variable, VariableType};
use common::*;
use pretty_assertions::assert_eq;

// ============================================================================
// Propagation
// ============================================================================

#[test]
fn test_straight_line_chain_creates_no_phi() {
    let mut env = env();
    let entry = env.entry_label();
    let [b, c] = labels::<2>(&mut env);
    connect(&mut env, b, &[entry]);
    connect(&mut env, c, &[b]);
    b.seal(&mut env).unwrap();
    c.seal(&mut env).unwrap();

    let v = i32_const(&mut env, 42);
    let x = Variable::new(&mut env, VariableType::int32(), v).unwrap();

    assert_eq!(c.read_variable(&mut env, x.id()).unwrap(), v);
    assert_eq!(env.stats().phis_created, 0);
    assert_eq!(env.circuit().count_opcode(OpCode::ValueSelector), 0);
}

#[test]
fn test_chain_read_is_cached_in_intermediate_labels() {
    let mut env = env();
    let entry = env.entry_label();
    let [b, c] = labels::<2>(&mut env);
    connect(&mut env, b, &[entry]);
    connect(&mut env, c, &[b]);
    b.seal(&mut env).unwrap();
    c.seal(&mut env).unwrap();

    let v = i32_const(&mut env, 1);
    let x = Variable::new(&mut env, VariableType::int32(), v).unwrap();
    c.read_variable(&mut env, x.id()).unwrap();

    assert_eq!(env.label_state(b).value_of(x.id()), Some(v));
}

#[test]
fn test_same_block_reads_are_identical() {
    let mut env = env();
    let x = Variable::declare(&mut env, VariableType::int32());
    let [head] = labels::<1>(&mut env);
    let first = head.read_variable(&mut env, x.id()).unwrap();
    let second = head.read_variable(&mut env, x.id()).unwrap();

    assert_eq!(first, second);
    assert_eq!(env.stats().phis_created, 1);
}

// ============================================================================
// Merges
// ============================================================================

#[test]
fn test_diamond_merge_keeps_predecessor_order() {
    let mut env = env();
    let x = Variable::declare(&mut env, VariableType::int32());
    let [b, c, d] = diamond(&mut env);
    let v1 = i32_const(&mut env, 1);
    let v2 = i32_const(&mut env, 2);
    b.write_variable(&mut env, x.id(), v1);
    c.write_variable(&mut env, x.id(), v2);

    let phi = d.read_variable(&mut env, x.id()).unwrap();
    assert_value_phi(&env, phi, &[v1, v2]);
    assert_eq!(env.label_from_selector(phi), Some(d));
}

#[test]
fn test_redundant_merge_collapses() {
    let mut env = env();
    let v0 = i32_const(&mut env, 7);
    let x = Variable::new(&mut env, VariableType::int32(), v0).unwrap();
    let [_, _, d] = diamond(&mut env);

    assert_eq!(d.read_variable(&mut env, x.id()).unwrap(), v0);
    assert_eq!(env.stats().live_phis(), 0);
    assert_eq!(env.circuit().count_opcode(OpCode::ValueSelector), 0);
}

#[test]
fn test_merge_of_undefined_and_defined_keeps_no_value_operand() {
    let mut env = env();
    let x = Variable::declare(&mut env, VariableType::int32());
    let [b, _, d] = diamond(&mut env);
    let v = i32_const(&mut env, 3);
    b.write_variable(&mut env, x.id(), v);

    let phi = d.read_variable(&mut env, x.id()).unwrap();
    let no_value = env.circuit_mut().no_value();
    assert_value_phi(&env, phi, &[v, no_value]);
}

fn then_else_scenario(then_first: bool) -> Vec<u64> {
    let mut env = env();
    let ten = i32_const(&mut env, 10);
    let twenty = i32_const(&mut env, 20);
    let mut x = Variable::new(&mut env, VariableType::int32(), ten).unwrap();
    let entry = env.entry_label();

    let [then_label, else_label, after] = labels::<3>(&mut env);
    connect(&mut env, then_label, &[entry]);
    connect(&mut env, else_label, &[entry]);
    then_label.seal(&mut env).unwrap();
    else_label.seal(&mut env).unwrap();

    env.set_current_label(Some(then_label));
    x.write(&mut env, twenty).unwrap();

    if then_first {
        connect(&mut env, after, &[then_label, else_label]);
    } else {
        connect(&mut env, after, &[else_label, then_label]);
    }
    after.seal(&mut env).unwrap();
    env.set_current_label(Some(after));

    let phi = x.read(&mut env).unwrap();
    env.circuit()
        .selector_operands(phi)
        .iter()
        .map(|&operand| match operand {
            g if g == ten => 10,
            g if g == twenty => 20,
            other => panic!("unexpected operand {other}"),
        })
        .collect()
}

#[test]
fn test_then_else_operands_follow_registration_order() {
    assert_eq!(then_else_scenario(true), vec![20, 10]);
    assert_eq!(then_else_scenario(false), vec![10, 20]);
}

// ============================================================================
// Loops
// ============================================================================

/// entry -> head <-> body; head left open until the back edge arrives
fn open_loop(env: &mut circuit_ssa::Environment) -> (Label, Label) {
    let entry = env.entry_label();
    let [head, body] = labels::<2>(env);
    connect(env, head, &[entry]);
    connect(env, body, &[head]);
    body.seal(env).unwrap();
    (head, body)
}

#[test]
fn test_loop_phi_completed_on_seal() {
    let mut env = env();
    let init = i32_const(&mut env, 0);
    let x = Variable::new(&mut env, VariableType::int32(), init).unwrap();
    let (head, body) = open_loop(&mut env);

    let placeholder = body.read_variable(&mut env, x.id()).unwrap();
    assert_eq!(env.label_state(head).pending_phi_count(), 1);

    let one = i32_const(&mut env, 1);
    let next = env.int32_add(placeholder, one);
    body.write_variable(&mut env, x.id(), next);
    connect(&mut env, head, &[body]);
    head.seal(&mut env).unwrap();

    let resolved = head.read_variable(&mut env, x.id()).unwrap();
    assert_eq!(resolved, placeholder);
    assert_value_phi(&env, resolved, &[init, next]);
    assert_eq!(head.read_variable(&mut env, x.id()).unwrap(), resolved);
    assert_eq!(env.label_state(head).pending_phi_count(), 0);
}

#[test]
fn test_loop_invariant_phi_collapses_to_initial_value() {
    let mut env = env();
    let init = i32_const(&mut env, 5);
    let x = Variable::new(&mut env, VariableType::int32(), init).unwrap();
    let (head, body) = open_loop(&mut env);

    let placeholder = body.read_variable(&mut env, x.id()).unwrap();
    let _use = env.int32_add(placeholder, placeholder);
    connect(&mut env, head, &[body]);
    head.seal(&mut env).unwrap();

    assert_eq!(head.read_variable(&mut env, x.id()).unwrap(), init);
    assert_eq!(body.read_variable(&mut env, x.id()).unwrap(), init);
    assert_eq!(env.circuit().resolve(placeholder), init);
    assert_no_dangling_uses(&env);
}

#[test]
fn test_nested_loops_collapse_transitively() {
    let mut env = env();
    let init = i32_const(&mut env, 9);
    let x = Variable::new(&mut env, VariableType::int32(), init).unwrap();
    let entry = env.entry_label();
    let [outer, inner, inner_body, outer_latch] = labels::<4>(&mut env);

    connect(&mut env, outer, &[entry]);
    connect(&mut env, inner, &[outer]);
    connect(&mut env, inner_body, &[inner]);
    inner_body.seal(&mut env).unwrap();

    let read = inner_body.read_variable(&mut env, x.id()).unwrap();
    connect(&mut env, inner, &[inner_body]);
    inner.seal(&mut env).unwrap();

    connect(&mut env, outer_latch, &[inner]);
    outer_latch.seal(&mut env).unwrap();
    connect(&mut env, outer, &[outer_latch]);
    outer.seal(&mut env).unwrap();

    assert_eq!(env.circuit().resolve(read), init);
    assert_eq!(env.stats().live_phis(), 0);
    assert_no_trivial_phis(&env);
    assert!(env.verify().is_ok());
}

// ============================================================================
// Misuse
// ============================================================================

#[test]
fn test_seal_twice_is_rejected() {
    let mut env = env();
    let [b] = labels::<1>(&mut env);
    b.seal(&mut env).unwrap();
    assert_eq!(b.seal(&mut env), Err(SsaError::AlreadySealed { label: b }));
}

#[test]
fn test_predecessor_after_seal_is_rejected() {
    let mut env = env();
    let entry = env.entry_label();
    let [b] = labels::<1>(&mut env);
    b.seal(&mut env).unwrap();
    assert_eq!(
        b.append_predecessor(&mut env, entry),
        Err(SsaError::PredecessorAfterSeal {
            label: b,
            predecessor: entry
        })
    );
}

#[test]
fn test_read_without_current_label_is_rejected() {
    let mut env = env();
    let x = Variable::declare(&mut env, VariableType::int32());
    env.set_current_label(None);
    assert!(matches!(
        x.read(&mut env),
        Err(SsaError::NoCurrentLabel { .. })
    ));
}

#[test]
fn test_unsealed_label_fails_verification() {
    let mut env = env();
    let x = Variable::declare(&mut env, VariableType::int32());
    let entry = env.entry_label();
    let [head] = labels::<1>(&mut env);
    connect(&mut env, head, &[entry]);
    let phi = head.read_variable(&mut env, x.id()).unwrap();

    assert_eq!(env.verify(), Err(SsaError::IncompletePhi { gate: phi }));
    assert!(env.finish().is_err());
}

//! Circuit-level assertions

use circuit_ssa::{Circuit, Environment, GateRef, OpCode};

/// `gate` is a live value selector with exactly `operands` after the control
pub fn assert_value_phi(env: &Environment, gate: GateRef, operands: &[GateRef]) {
    let circuit: &Circuit = env.circuit();
    assert_eq!(
        circuit.opcode(gate),
        OpCode::ValueSelector,
        "expected a value selector at {gate}, got {:?}",
        circuit.opcode(gate)
    );
    assert_eq!(
        circuit.selector_operands(gate),
        operands,
        "operands of {gate} (predecessor order)"
    );
}

/// No live selector has an operand equal to itself plus one other value only
pub fn assert_no_trivial_phis(env: &Environment) {
    let circuit = env.circuit();
    for gate in circuit.live_gates() {
        if !circuit.opcode(gate).is_value_selector() {
            continue;
        }
        let mut distinct: Vec<GateRef> = circuit
            .selector_operands(gate)
            .iter()
            .copied()
            .filter(|&operand| operand != gate)
            .collect();
        distinct.sort();
        distinct.dedup();
        assert!(
            distinct.len() > 1,
            "selector {gate} is trivial: {:?}",
            circuit.selector_operands(gate)
        );
    }
}

/// No live gate references a removed one
pub fn assert_no_dangling_uses(env: &Environment) {
    let circuit = env.circuit();
    for gate in circuit.live_gates() {
        for &input in circuit.ins(gate) {
            if input.is_null() {
                continue;
            }
            assert!(
                !circuit.is_nop(input),
                "{gate} still uses removed gate {input}"
            );
        }
    }
}

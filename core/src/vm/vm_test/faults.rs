use super::*;

#[test]
fn test_reserved_opcodes_are_unsupported() {
    for op in [Opcode::AndB, Opcode::AndI, Opcode::OrB, Opcode::OrI, Opcode::Parameter] {
        assert!(op.is_reserved());
        let f = raw(vec![op.byte(), Opcode::Return.byte(), 0]);
        let err = run(&f, &mut [], &[]).unwrap_err();
        assert_eq!(err, FaultKind::Unsupported(op).at(0));
    }
}

#[test]
fn test_unknown_opcode() {
    let f = raw(vec![Opcode::Nop.byte(), 0xFF]);
    assert_eq!(run(&f, &mut [], &[]).unwrap_err(), FaultKind::UnknownOpcode(0xFF).at(1));
}

#[test]
fn test_integer_division_by_zero() {
    for op in ["divides", "divideu", "remainders", "remainderu"] {
        let f = function(&format!("pushimmediate 1\npushimmediate 0\n{op}\nreturn 1"), 0);
        assert_eq!(fault_kind(&f), FaultKind::DivisionByZero, "{op}");
    }
}

#[test]
fn test_float_division_by_zero_is_infinite() {
    let f = function("pushimmediate 1.0\npushimmediate 0.0\ndividef\nreturn 1", 0);
    let out = run(&f, &mut [], &[]).unwrap();
    assert_eq!(out[0].as_f32(), f32::INFINITY);
}

#[test]
fn test_stack_underflow() {
    assert_eq!(fault_kind(&function("addi\nreturn 1", 0)), FaultKind::StackUnderflow);
    assert_eq!(fault_kind(&function("pop 1\nreturn 0", 0)), FaultKind::StackUnderflow);
    assert_eq!(fault_kind(&function("return 1", 0)), FaultKind::StackUnderflow);
}

#[test]
fn test_out_of_bounds_accesses() {
    let f = function("pushimmediate 3\nload\nreturn 1", 1);
    let err = run(&f, &mut ints(&[0]), &[]).unwrap_err();
    assert_eq!(
        err.kind,
        FaultKind::OutOfBounds {
            space: Space::Stack,
            index: 3,
            len: 1
        }
    );

    let f = function("pushimmediate -1\nload\nreturn 1", 0);
    assert!(matches!(fault_kind(&f), FaultKind::OutOfBounds { index: -1, .. }));

    let f = function("loadglobal 0\nreturn 1", 0);
    assert_eq!(
        fault_kind(&f),
        FaultKind::OutOfBounds {
            space: Space::Globals,
            index: 0,
            len: 0
        }
    );
}

#[test]
fn test_swizzle_index_outside_source() {
    let f = function("swizzle 2, 1, 2\nreturn 1", 2);
    let err = run(&f, &mut ints(&[1, 2]), &[]).unwrap_err();
    assert_eq!(
        err.kind,
        FaultKind::OutOfBounds {
            space: Space::LaneBuffer,
            index: 2,
            len: 2
        }
    );
}

#[test]
fn test_swizzle_source_too_wide() {
    let f = raw(vec![Opcode::Swizzle.byte(), 17, 0, Opcode::Return.byte(), 0]);
    assert_eq!(fault_kind(&f), FaultKind::InvalidLaneCount(17));
}

#[test]
fn test_bad_lane_counts_and_ops() {
    let zero = raw(vec![Opcode::Vector.byte(), 0, Opcode::AddI.byte()]);
    assert_eq!(fault_kind(&zero), FaultKind::InvalidLaneCount(0));

    let dup = raw(vec![Opcode::Vector.byte(), 2, Opcode::Dup.byte()]);
    assert_eq!(fault_kind(&dup), FaultKind::UnsupportedLaneOp(Opcode::Dup));
}

#[test]
fn test_misaligned_immediate() {
    let mut code = vec![Opcode::PushImmediate.byte()];
    code.extend_from_slice(&1u32.to_le_bytes());
    let f = raw(code);
    assert_eq!(run(&f, &mut [], &[]).unwrap_err(), FaultKind::Misaligned { width: 4 }.at(0));
}

#[test]
fn test_running_off_the_end() {
    let f = raw(vec![Opcode::Nop.byte()]);
    assert_eq!(run(&f, &mut [], &[]).unwrap_err(), FaultKind::CodeOverrun.at(1));
}

#[test]
fn test_branch_outside_code() {
    let f = raw(vec![Opcode::Nop.byte(), Opcode::Branch.byte(), 0x00, 0x10]);
    assert_eq!(run(&f, &mut [], &[]).unwrap_err(), FaultKind::CodeOverrun.at(0x1000));
}

#[test]
fn test_budget_stops_infinite_loop() {
    let f = function("top:\nbranch top", 0);
    let mut interp = Interpreter::with_options(InterpreterOptions::default().with_instruction_budget(100));
    let err = interp.run(&f, &mut [], &[]).unwrap_err();
    assert_eq!(err.kind, FaultKind::BudgetExhausted { limit: 100 });
    assert_eq!(interp.steps(), 100);
}

use super::*;

fn binary_ops() -> impl Iterator<Item = Opcode> {
    Opcode::ALL.iter().copied().filter(|op| op.is_binary())
}

fn unary_ops() -> impl Iterator<Item = Opcode> {
    Opcode::ALL.iter().copied().filter(|op| op.is_unary())
}

fn operands() -> [(Value, Value); 3] {
    [
        (Value::from_i32(17), Value::from_i32(5)),
        (Value::from_i32(-9), Value::from_i32(4)),
        (Value::from_f32(7.5), Value::from_f32(-2.0)),
    ]
}

fn run_code(code: Vec<u8>, args: &[Value]) -> Result<Vec<Value>, Fault> {
    let f = raw(code).with_parameters(vec![Parameter::input(1); args.len()]);
    run(&f, &mut args.to_vec(), &[])
}

#[test]
fn test_vector_add_pairs_lanes() {
    let f = function("vector 2 addi\nreturn 2", 4);
    assert_eq!(run_ints(&f, &[1, 2, 10, 20]).unwrap(), vec![11, 22]);
}

#[test]
fn test_single_lane_binary_matches_scalar() {
    for op in binary_ops() {
        for (a, b) in operands() {
            let mut scalar = Assembler::new();
            scalar.op(op).ret(1);
            let mut lane = Assembler::new();
            lane.vector(1, op).ret(1);
            let expected = run_code(scalar.finish().unwrap(), &[a, b]).unwrap();
            let actual = run_code(lane.finish().unwrap(), &[a, b]).unwrap();
            assert_eq!(expected, actual, "{op} on {a:?}, {b:?}");
        }
    }
}

#[test]
fn test_single_lane_unary_matches_scalar() {
    for op in unary_ops() {
        for (a, _) in operands() {
            let mut scalar = Assembler::new();
            scalar.op(op).ret(1);
            let mut lane = Assembler::new();
            lane.vector(1, op).ret(1);
            let expected = run_code(scalar.finish().unwrap(), &[a]).unwrap();
            let actual = run_code(lane.finish().unwrap(), &[a]).unwrap();
            assert_eq!(expected, actual, "{op} on {a:?}");
        }
    }
}

fn assert_same_outcome(scalar: &str, lane: &str, layout: &Arc<GlobalLayout>, args: &[i32], inputs: &[i32]) {
    let build = |source: &str| {
        Function::new("form", assemble(source).unwrap(), Arc::clone(layout))
            .with_parameters(vec![Parameter::input(1); args.len()])
    };
    let expected = run(&build(scalar), &mut ints(args), &ints(inputs));
    let actual = run(&build(lane), &mut ints(args), &ints(inputs));
    assert!(expected.is_ok(), "{scalar}: {expected:?}");
    assert_eq!(expected, actual, "{lane}");
}

#[test]
fn test_single_lane_memory_and_branches_match_scalar() {
    let no_globals = Arc::new(GlobalLayout::default());
    let args = [10, 20, 30];

    assert_same_outcome(
        "pushimmediate 1\nload\nreturn 4",
        "pushimmediate 1\nvector 1 load\nreturn 4",
        &no_globals,
        &args,
        &[],
    );
    assert_same_outcome(
        "pushimmediate 2\npushimmediate 99\nstore\nreturn 3",
        "pushimmediate 2\npushimmediate 99\nvector 1 store\nreturn 3",
        &no_globals,
        &args,
        &[],
    );

    let globals = Arc::new(GlobalLayout::new(3, vec![0, 1, 2]));
    assert_same_outcome(
        "loadglobal 2\nreturn 4",
        "vector 1 loadglobal 2\nreturn 4",
        &globals,
        &args,
        &[4, 5, 6],
    );

    assert_same_outcome(
        "branch skip\npushimmediate 1\nreturn 1\nskip: pushimmediate 2\nreturn 1",
        "vector 1 branch skip\npushimmediate 1\nreturn 1\nskip: pushimmediate 2\nreturn 1",
        &no_globals,
        &args,
        &[],
    );

    for flag in [0, 5] {
        assert_same_outcome(
            "pushimmediate 0\nload\nconditionalbranch yes\npushimmediate 1\nreturn 1\nyes: pushimmediate 2\nreturn 1",
            "pushimmediate 0\nload\nvector 1 conditionalbranch yes\npushimmediate 1\nreturn 1\nyes: pushimmediate 2\nreturn 1",
            &no_globals,
            &[flag],
            &[],
        );
    }
}

#[test]
fn test_vector_compare_and_negate() {
    let f = function(
        "
        vector 3 compareslt
        vector 3 not
        return 3
        ",
        6,
    );
    assert_eq!(run_ints(&f, &[1, 5, 9, 4, 5, 6]).unwrap(), vec![0, 1, 1]);
}

#[test]
fn test_vector_load_and_store() {
    // Copy slots 0..3 onto 3..6, then read them back.
    let f = function(
        "
        pushimmediate 3
        pushimmediate 0
        vector 3 load
        vector 3 store
        pushimmediate 3
        vector 3 load
        return 3
        ",
        6,
    );
    let mut interp = Interpreter::new();
    let mut args = ints(&[1, 2, 3, 0, 0, 0]);
    let out = interp.run(&f, &mut args, &[]).unwrap().to_vec();
    assert_eq!(out, ints(&[1, 2, 3]));
}

#[test]
fn test_vector_store_pops_its_base() {
    let f = function(
        "
        pushimmediate 77  ; sentinel
        pushimmediate 0
        pushimmediate 5
        pushimmediate 6
        vector 2 store
        return 3
        ",
        2,
    );
    assert_eq!(run_ints(&f, &[0, 0]).unwrap(), vec![5, 6, 77]);
}

#[test]
fn test_vector_load_global_reads_consecutive_slots() {
    let layout = Arc::new(GlobalLayout::new(4, vec![1, 2, 3]));
    let code = assemble("vector 3 loadglobal 1\nvector 1 addf\nreturn 2").unwrap();
    let f = Function::new("globals", code, layout);
    let inputs = [Value::from_f32(1.0), Value::from_f32(2.0), Value::from_f32(0.5)];
    let out = run(&f, &mut [], &inputs).unwrap();
    assert_eq!(out[0].as_f32(), 1.0);
    assert_eq!(out[1].as_f32(), 2.5);
}

#[test]
fn test_vector_branches_ignore_width() {
    let f = function(
        "
            pushimmediate 1
            vector 4 conditionalbranch taken
            pushimmediate 0
            return 1
        taken:
            vector 4 branch out
            pushimmediate 0
            return 1
        out:
            pushimmediate 9
            return 1
        ",
        0,
    );
    assert_eq!(run_ints(&f, &[]).unwrap(), vec![9]);
}

#[test]
fn test_vector_division_by_zero_faults() {
    let f = function("vector 2 divides\nreturn 2", 4);
    let err = run(&f, &mut ints(&[4, 4, 2, 0]), &[]).unwrap_err();
    assert_eq!(err.kind, FaultKind::DivisionByZero);
}

use super::*;

fn out_param_function() -> Function {
    // in int a; inout int2 b; b = (a + 1, a * 2)
    let code = assemble(
        "
        pushimmediate 1
        pushimmediate 0
        load
        pushimmediate 1
        addi
        store
        pushimmediate 2
        pushimmediate 0
        load
        pushimmediate 2
        multiplys
        store
        return 0
        ",
    )
    .unwrap();
    Function::new("out_params", code, Arc::new(GlobalLayout::default()))
        .with_parameters(vec![Parameter::input(1), Parameter::inout(2)])
}

#[test]
fn test_out_parameters_are_copied_back() {
    let f = out_param_function();
    let mut args = ints(&[7, 0, 0]);
    run(&f, &mut args, &[]).unwrap();
    assert_eq!(args, ints(&[7, 8, 14]));
}

#[test]
fn test_in_parameters_keep_caller_values() {
    let code = assemble("pushimmediate 0\npushimmediate 99\nstore\nreturn 0").unwrap();
    let f = Function::new("in_only", code, Arc::new(GlobalLayout::default()))
        .with_parameters(vec![Parameter::input(1), Parameter::inout(1)]);
    let mut args = ints(&[1, 2]);
    run(&f, &mut args, &[]).unwrap();
    assert_eq!(args, ints(&[1, 2]));
}

#[test]
fn test_out_parameters_after_results() {
    // The copy-back reads the frame as it stands after `return`.
    let code = assemble(
        "
        pushimmediate 0
        pushimmediate 5
        store
        pushimmediate 3
        return 1
        ",
    )
    .unwrap();
    let f = Function::new("overlap", code, Arc::new(GlobalLayout::default()))
        .with_parameters(vec![Parameter::inout(1), Parameter::inout(1)]);
    let mut args = ints(&[0, 4]);
    let out = run(&f, &mut args, &[]).unwrap();
    assert_eq!(out, ints(&[3]));
    assert_eq!(args, ints(&[3, 4]));
}

#[test]
fn test_argument_and_input_counts_are_checked() {
    let f = out_param_function();
    let err = run(&f, &mut ints(&[1, 2]), &[]).unwrap_err();
    assert_eq!(err, Fault::from(FaultKind::ArgumentCount { expected: 3, actual: 2 }));

    let layout = Arc::new(GlobalLayout::new(2, vec![0, 1]));
    let g = Function::new("inputs", vec![Opcode::Return.byte(), 0], layout);
    let err = run(&g, &mut [], &[Value::ZERO]).unwrap_err();
    assert_eq!(err.ip, None);
    assert_eq!(err.kind, FaultKind::InputCount { expected: 2, actual: 1 });
}

#[test]
fn test_interpreter_is_reusable_after_fault() {
    let bad = function("pushimmediate 1\npushimmediate 0\ndivides\nreturn 1", 0);
    let good = function("pushimmediate 6\npushimmediate 3\ndivides\nreturn 1", 0);
    let mut interp = Interpreter::new();
    assert!(interp.run(&bad, &mut [], &[]).is_err());
    assert_eq!(interp.run(&good, &mut [], &[]).unwrap(), ints(&[2]).as_slice());
    assert_eq!(interp.stack().len(), 1);
}

#[test]
fn test_globals_reset_between_invocations() {
    let layout = Arc::new(GlobalLayout::new(1, vec![]));
    let write = Function::new(
        "write",
        assemble("pushimmediate 0\npushimmediate 5\nstoreglobal\nreturn 0").unwrap(),
        Arc::clone(&layout),
    );
    let read = Function::new("read", assemble("loadglobal 0\nreturn 1").unwrap(), layout);
    let mut interp = Interpreter::new();
    interp.run(&write, &mut [], &[]).unwrap();
    assert_eq!(interp.globals(), &[Value::from_i32(5)]);
    assert_eq!(interp.run(&read, &mut [], &[]).unwrap(), &[Value::UNINITIALIZED]);
}

#[test]
fn test_steps_count_every_instruction() {
    let f = function("nop\nvector 2 addi\nreturn 2", 4);
    let mut interp = Interpreter::new();
    interp.run(&f, &mut ints(&[1, 2, 3, 4]), &[]).unwrap();
    assert_eq!(interp.steps(), 3);
}

#[test]
fn test_budget_allows_terminating_programs() {
    let f = function("dup\nreturn 1", 1);
    let mut interp = Interpreter::with_options(InterpreterOptions::default().with_instruction_budget(2));
    assert_eq!(interp.run(&f, &mut ints(&[1]), &[]).unwrap(), ints(&[1]).as_slice());
}

#[test]
fn test_rejected_invocation_resets_steps() {
    let f = function("dup\npop 1\nreturn 0", 1);
    let mut interp = Interpreter::new();
    interp.run(&f, &mut ints(&[1]), &[]).unwrap();
    assert_eq!(interp.steps(), 3);

    let err = interp.run(&f, &mut [], &[]).unwrap_err();
    assert_eq!(err.kind, FaultKind::ArgumentCount { expected: 1, actual: 0 });
    assert_eq!(interp.steps(), 0);
}

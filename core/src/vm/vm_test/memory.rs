use super::*;

#[test]
fn test_dup_then_pop_leaves_stack_unchanged() {
    let f = function(
        "
        dup
        pop 1
        return 0
        ",
        3,
    );
    let mut interp = Interpreter::new();
    interp.run(&f, &mut ints(&[4, 5, 6]), &[]).unwrap();
    assert_eq!(interp.stack(), ints(&[4, 5, 6]).as_slice());
}

#[test]
fn test_store_then_load_reads_back() {
    // Two parameters followed by two locals; every slot is a valid target.
    for target in 0..4 {
        let code = assemble(&format!(
            "
            pushimmediate {target}
            pushimmediate 42
            store
            pushimmediate {target}
            load
            return 1
            "
        ))
        .unwrap();
        let f = Function::new("locals", code, Arc::new(GlobalLayout::default()))
            .with_parameters(vec![Parameter::input(1); 2])
            .with_locals(2);
        assert_eq!(run_ints(&f, &[7, 8]).unwrap(), vec![42], "target {target}");
    }
}

#[test]
fn test_locals_start_uninitialized() {
    let code = assemble("pushimmediate 0\nload\nreturn 1").unwrap();
    let f = Function::new("locals", code, Arc::new(GlobalLayout::default())).with_locals(1);
    let out = run(&f, &mut [], &[]).unwrap();
    assert_eq!(out, vec![Value::UNINITIALIZED]);
}

#[test]
fn test_load_swizzle_matches_individual_loads() {
    let swizzled = function(
        "
        pushimmediate 0
        loadswizzle 4, 2, 0, 3, 2
        return 4
        ",
        4,
    );
    let individual = function(
        "
        pushimmediate 2
        load
        pushimmediate 0
        load
        pushimmediate 3
        load
        pushimmediate 2
        load
        return 4
        ",
        4,
    );
    let args = [10, 20, 30, 40];
    assert_eq!(run_ints(&swizzled, &args).unwrap(), vec![30, 10, 40, 30]);
    assert_eq!(run_ints(&swizzled, &args).unwrap(), run_ints(&individual, &args).unwrap());
}

#[test]
fn test_store_swizzle_scatters_and_drops_base() {
    let f = function(
        "
        pushimmediate 0   ; base
        pushimmediate 7
        pushimmediate 8
        storeswizzle 2, 2, 0
        return 3
        ",
        3,
    );
    assert_eq!(run_ints(&f, &[1, 2, 3]).unwrap(), vec![8, 2, 7]);
}

#[test]
fn test_swizzle_reorders_lane_group() {
    let f = function("swizzle 4, 2, 3, 0\nreturn 2", 4);
    assert_eq!(run_ints(&f, &[11, 22, 33, 44]).unwrap(), vec![44, 11]);
}

#[test]
fn test_swizzle_can_widen() {
    let f = function("swizzle 2, 4, 1, 1, 0, 1\nreturn 4", 2);
    assert_eq!(run_ints(&f, &[5, 6]).unwrap(), vec![6, 6, 5, 6]);
}

#[test]
fn test_dup_down_copies_beneath_store_target() {
    // [9, 5, 1, 2] -> [9, 1, 2, 5, 1, 2]
    let f = function("dupdown 2\nreturn 6", 4);
    assert_eq!(run_ints(&f, &[9, 5, 1, 2]).unwrap(), vec![9, 1, 2, 5, 1, 2]);
}

#[test]
fn test_dup_down_feeds_chained_assignment() {
    // a = b = 6 with a in slot 0 and b in slot 1; the copy survives the store.
    let f = function(
        "
        pushimmediate 0
        pushimmediate 1
        pushimmediate 6
        dupdown 1
        store
        store
        pushimmediate 0
        load
        pushimmediate 1
        load
        return 2
        ",
        2,
    );
    assert_eq!(run_ints(&f, &[0, 0]).unwrap(), vec![6, 6]);
}

#[test]
fn test_globals_read_by_immediate_written_by_stack() {
    let layout = Arc::new(GlobalLayout::new(3, vec![2]));
    let code = assemble(
        "
        pushimmediate 0
        loadglobal 2
        pushimmediate 1
        addi
        storeglobal
        loadglobal 0
        loadglobal 1
        return 2
        ",
    )
    .unwrap();
    let f = Function::new("globals", code, layout);
    let out = run(&f, &mut [], &[Value::from_i32(41)]).unwrap();
    assert_eq!(out[0].as_i32(), 42);
    assert_eq!(out[1], Value::UNINITIALIZED);
}

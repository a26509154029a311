use expect_test::expect;
use lir::builder::FuncBuilder;
use lir::{Function, FunctionSignature, Opcode, Type};

use crate::dead_code_elimination;

#[test]
fn removes_dead_chains_in_one_sweep() {
    let mut func = Function::with_name("dead");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::I32);
    let v1 = b.param(Type::Ptr);

    b.switch_to_block(block0);
    let v2 = b.binary(Opcode::Iadd, Type::I32, v0, v0);
    let _v3 = b.binary(Opcode::Imul, Type::I32, v2, v2);
    b.store(v1, v0);
    let _v4 = b.volatile_load(Type::I32, v1);
    b.ret(None);

    // the sweep runs backwards, so the imul dies first and takes the iadd
    // with it in the same pass
    assert_eq!(dead_code_elimination(&mut func), 2);

    let expected = expect![[r#"
        function %dead(v0: i32, v1: ptr) {
        block0:
            store v1, v0
            v4 = load.i32 volatile v1
            ret
        }
    "#]];
    expected.assert_eq(&func.to_debug_string());
}

#[test]
fn calls_and_effects_survive() {
    let mut func = Function::with_name("keep");
    let print = func.import_function(FunctionSignature {
        name: "print".to_owned(),
        params: 1,
        returns: Some(Type::I32),
        has_sideeffects: true,
    });
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::I32);

    b.switch_to_block(block0);
    // result unused, but calls are never considered trivially dead
    let _v1 = b.call(print, &[v0]);
    b.ret(None);

    assert_eq!(dead_code_elimination(&mut func), 0);
}

#[test]
fn used_instructions_survive() {
    let mut func = Function::with_name("live");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::I32);

    b.switch_to_block(block0);
    let v1 = b.binary(Opcode::Iadd, Type::I32, v0, v0);
    let v2 = b.binary(Opcode::Imul, Type::I32, v1, v1);
    b.ret(Some(v2));

    assert_eq!(dead_code_elimination(&mut func), 0);
}

use expect_test::expect;

use crate::builder::FuncBuilder;
use crate::{Function, FunctionSignature, Opcode, Type};

#[test]
fn write_function_body() {
    let mut func = Function::with_name("foo");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let block1 = b.create_block();
    let block2 = b.create_block();
    let block3 = b.create_block();

    let v0 = b.param(Type::I32);
    let v1 = b.param(Type::Ptr);
    let c7 = b.func.dfg.iconst(Type::I32, 7);

    b.switch_to_block(block0);
    let v3 = b.binary(Opcode::Iadd, Type::I32, v0, c7);
    b.store(v1, v3);
    let v4 = b.load(Type::I32, v1);
    let v5 = b.cmp(Opcode::Ieq, v4, v3);
    b.br(v5, block1, block2);

    b.switch_to_block(block1);
    b.jump(block3);

    b.switch_to_block(block2);
    b.jump(block3);

    b.switch_to_block(block3);
    let v6 = b.phi(Type::I32, &[(block1, v3), (block2, v4)]);
    b.ret(Some(v6));

    let expected = expect![[r#"
        function %foo(v0: i32, v1: ptr) {
            v2 = iconst.i32 7
        block0:
            v3 = iadd.i32 v0, v2
            store v1, v3
            v4 = load.i32 v1
            v5 = ieq.b1 v4, v3
            br v5, block1, block2

        block1:
            jmp block3

        block2:
            jmp block3

        block3:
            v6 = phi.i32 [v3, block1], [v4, block2]
            ret v6
        }
    "#]];
    expected.assert_eq(&func.to_debug_string());
}

#[test]
fn write_signatures_and_volatile() {
    let mut func = Function::with_name("effects");
    let powi = func.import_function(FunctionSignature {
        name: "powi".to_owned(),
        params: 2,
        returns: Some(Type::I64),
        has_sideeffects: false,
    });
    let print = func.import_function(FunctionSignature {
        name: "print".to_owned(),
        params: 1,
        returns: None,
        has_sideeffects: true,
    });

    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::I64);
    let v1 = b.param(Type::Ptr);

    b.switch_to_block(block0);
    let v2 = b.call(powi, &[v0, v0]).unwrap();
    b.call(print, &[v2]);
    b.volatile_store(v1, v2);
    let v3 = b.volatile_load(Type::I64, v1);
    b.ret(Some(v3));

    let expected = expect![[r#"
        function %effects(v0: i64, v1: ptr) {
            fn0 = const fn %powi(2) -> i64
            fn1 = fn %print(1)

        block0:
            v2 = call.i64 fn0(v0, v0)
            call fn1(v2)
            store volatile v1, v2
            v3 = load.i64 volatile v1
            ret v3
        }
    "#]];
    expected.assert_eq(&func.to_debug_string());
}

use expect_test::{expect, Expect};
use lir::builder::FuncBuilder;
use lir::{Function, Opcode, Type};

use crate::simplify::{simplify_insts, FoldSimplifier};

fn check(func: &mut Function, simplified: u32, expected: Expect) {
    assert_eq!(simplify_insts(func, &mut FoldSimplifier), simplified);
    expected.assert_eq(&func.to_debug_string());
}

#[test]
fn folds_constants() {
    let mut func = Function::with_name("fold");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let two = b.func.dfg.iconst(Type::I32, 2);
    let three = b.func.dfg.iconst(Type::I32, 3);

    b.switch_to_block(block0);
    let v2 = b.binary(Opcode::Iadd, Type::I32, two, three);
    b.ret(Some(v2));

    check(
        &mut func,
        1,
        expect![[r#"
            function %fold() {
                v3 = iconst.i32 5
            block0:
                ret v3
            }
        "#]],
    );
}

#[test]
fn add_of_zero_is_identity() {
    let mut func = Function::with_name("add_zero");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::I32);
    let zero = b.func.dfg.iconst(Type::I32, 0);

    b.switch_to_block(block0);
    let v2 = b.binary(Opcode::Iadd, Type::I32, v0, zero);
    b.ret(Some(v2));

    check(
        &mut func,
        1,
        expect![[r#"
            function %add_zero(v0: i32) {
            block0:
                ret v0
            }
        "#]],
    );
}

#[test]
fn subtracting_a_value_from_itself() {
    let mut func = Function::with_name("sub_self");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::I32);

    b.switch_to_block(block0);
    let v1 = b.binary(Opcode::Isub, Type::I32, v0, v0);
    b.ret(Some(v1));

    check(
        &mut func,
        1,
        expect![[r#"
            function %sub_self(v0: i32) {
                v2 = iconst.i32 0
            block0:
                ret v2
            }
        "#]],
    );
}

#[test]
fn self_comparison_is_decided() {
    let mut func = Function::with_name("eq_self");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::I32);

    b.switch_to_block(block0);
    let v1 = b.cmp(Opcode::Ieq, v0, v0);
    b.ret(Some(v1));

    check(
        &mut func,
        1,
        expect![[r#"
            function %eq_self(v0: i32) {
                v2 = bconst true
            block0:
                ret v2
            }
        "#]],
    );
}

#[test]
fn float_self_comparison_is_left_alone() {
    // NaN: v0 == v0 cannot be decided from the operand identity
    let mut func = Function::with_name("feq_self");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::F64);

    b.switch_to_block(block0);
    let v1 = b.cmp(Opcode::Feq, v0, v0);
    b.ret(Some(v1));

    assert_eq!(simplify_insts(&mut func, &mut FoldSimplifier), 0);
}

#[test]
fn double_negation_collapses() {
    let mut func = Function::with_name("double_neg");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::I32);

    b.switch_to_block(block0);
    let v1 = b.unary(Opcode::Ineg, Type::I32, v0);
    let v2 = b.unary(Opcode::Ineg, Type::I32, v1);
    b.ret(Some(v2));

    check(
        &mut func,
        1,
        expect![[r#"
            function %double_neg(v0: i32) {
            block0:
                v1 = ineg.i32 v0
                ret v0
            }
        "#]],
    );
}

#[test]
fn phi_with_agreeing_inputs() {
    let mut func = Function::with_name("phi_same");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let block1 = b.create_block();
    let block2 = b.create_block();
    let block3 = b.create_block();
    let v0 = b.param(Type::I32);
    let v1 = b.param(Type::B1);

    b.switch_to_block(block0);
    b.br(v1, block1, block2);
    b.switch_to_block(block1);
    b.jump(block3);
    b.switch_to_block(block2);
    b.jump(block3);
    b.switch_to_block(block3);
    let v2 = b.phi(Type::I32, &[(block1, v0), (block2, v0)]);
    b.ret(Some(v2));

    check(
        &mut func,
        1,
        expect![[r#"
            function %phi_same(v0: i32, v1: b1) {
            block0:
                br v1, block1, block2

            block1:
                jmp block3

            block2:
                jmp block3

            block3:
                ret v0
            }
        "#]],
    );
}

#[test]
fn division_by_zero_is_not_folded() {
    let mut func = Function::with_name("div_zero");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let seven = b.func.dfg.iconst(Type::I32, 7);
    let zero = b.func.dfg.iconst(Type::I32, 0);

    b.switch_to_block(block0);
    let v2 = b.binary(Opcode::Idiv, Type::I32, seven, zero);
    b.ret(Some(v2));

    assert_eq!(simplify_insts(&mut func, &mut FoldSimplifier), 0);
}

#[test]
fn i32_arithmetic_wraps() {
    let mut func = Function::with_name("wrap");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let max = b.func.dfg.iconst(Type::I32, i32::MAX as i64);
    let one = b.func.dfg.iconst(Type::I32, 1);

    b.switch_to_block(block0);
    let v2 = b.binary(Opcode::Iadd, Type::I32, max, one);
    b.ret(Some(v2));

    check(
        &mut func,
        1,
        expect![[r#"
            function %wrap() {
                v3 = iconst.i32 -2147483648
            block0:
                ret v3
            }
        "#]],
    );
}

use expect_test::expect;
use lir::builder::FuncBuilder;
use lir::{Function, Opcode, Type};

use crate::{eliminate_redundant_loads, store_to_load_forwarding};

#[test]
fn redundant_load_is_collapsed() {
    let mut func = Function::with_name("redundant_load");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::Ptr);

    b.switch_to_block(block0);
    let v1 = b.load(Type::I32, v0);
    let v2 = b.binary(Opcode::Iadd, Type::I32, v1, v1);
    let v3 = b.load(Type::I32, v0);
    let v4 = b.binary(Opcode::Iadd, Type::I32, v2, v3);
    b.ret(Some(v4));

    assert_eq!(eliminate_redundant_loads(&mut func), 1);

    let expected = expect![[r#"
        function %redundant_load(v0: ptr) {
        block0:
            v1 = load.i32 v0
            v2 = iadd.i32 v1, v1
            v4 = iadd.i32 v2, v1
            ret v4
        }
    "#]];
    expected.assert_eq(&func.to_debug_string());
}

#[test]
fn load_scan_stops_at_store() {
    let mut func = Function::with_name("clobbered");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::Ptr);
    let v1 = b.param(Type::Ptr);

    b.switch_to_block(block0);
    let v2 = b.load(Type::I32, v0);
    let v3 = b.binary(Opcode::Iadd, Type::I32, v2, v2);
    b.store(v1, v3);
    // the store may alias v0, so this literal match must survive
    let v4 = b.load(Type::I32, v0);
    b.ret(Some(v4));

    assert_eq!(eliminate_redundant_loads(&mut func), 0);
}

#[test]
fn load_of_other_type_survives() {
    let mut func = Function::with_name("retyped");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::Ptr);

    b.switch_to_block(block0);
    let _v1 = b.load(Type::I32, v0);
    let v2 = b.load(Type::I64, v0);
    b.ret(Some(v2));

    assert_eq!(eliminate_redundant_loads(&mut func), 0);
}

#[test]
fn volatile_loads_are_untouchable() {
    let mut func = Function::with_name("volatile");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::Ptr);

    b.switch_to_block(block0);
    let _v1 = b.load(Type::I32, v0);
    let v2 = b.volatile_load(Type::I32, v0);
    b.ret(Some(v2));

    assert_eq!(eliminate_redundant_loads(&mut func), 0);
}

#[test]
fn store_forwards_to_load() {
    let mut func = Function::with_name("forward");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::Ptr);
    let v1 = b.param(Type::I32);

    b.switch_to_block(block0);
    b.store(v0, v1);
    let v2 = b.binary(Opcode::Iadd, Type::I32, v1, v1);
    let v3 = b.load(Type::I32, v0);
    let v4 = b.binary(Opcode::Iadd, Type::I32, v2, v3);
    b.ret(Some(v4));

    assert_eq!(store_to_load_forwarding(&mut func), (1, 0));

    let expected = expect![[r#"
        function %forward(v0: ptr, v1: i32) {
        block0:
            store v0, v1
            v2 = iadd.i32 v1, v1
            v4 = iadd.i32 v2, v1
            ret v4
        }
    "#]];
    expected.assert_eq(&func.to_debug_string());
}

#[test]
fn forwarding_stops_at_any_load() {
    let mut func = Function::with_name("conservative");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::Ptr);
    let v1 = b.param(Type::I32);
    let v2 = b.param(Type::Ptr);

    b.switch_to_block(block0);
    b.store(v0, v1);
    let _v3 = b.load(Type::I32, v2);
    // a load of any address ends the scan, so this one is not forwarded
    let v4 = b.load(Type::I32, v0);
    b.ret(Some(v4));

    assert_eq!(store_to_load_forwarding(&mut func), (0, 0));
}

#[test]
fn overwritten_store_is_dead() {
    let mut func = Function::with_name("dead_store");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::Ptr);
    let v1 = b.param(Type::I32);
    let v2 = b.param(Type::I32);

    b.switch_to_block(block0);
    b.store(v0, v1);
    b.store(v0, v2);
    b.ret(None);

    assert_eq!(store_to_load_forwarding(&mut func), (0, 1));

    let expected = expect![[r#"
        function %dead_store(v0: ptr, v1: i32, v2: i32) {
        block0:
            store v0, v2
            ret
        }
    "#]];
    expected.assert_eq(&func.to_debug_string());
}

#[test]
fn volatile_stores_are_not_elided() {
    let mut func = Function::with_name("volatile_store");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::Ptr);
    let v1 = b.param(Type::I32);
    let v2 = b.param(Type::I32);

    b.switch_to_block(block0);
    b.volatile_store(v0, v1);
    b.store(v0, v2);
    b.ret(None);

    assert_eq!(store_to_load_forwarding(&mut func), (0, 0));
}

#[test]
fn volatile_store_does_not_forward() {
    let mut func = Function::with_name("volatile_origin");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::Ptr);
    let v1 = b.param(Type::I32);

    b.switch_to_block(block0);
    b.volatile_store(v0, v1);
    let v2 = b.load(Type::I32, v0);
    b.ret(Some(v2));

    assert_eq!(store_to_load_forwarding(&mut func), (0, 0));
}

#[test]
fn forwarding_requires_matching_type() {
    let mut func = Function::with_name("retyped_forward");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::Ptr);
    let v1 = b.param(Type::I32);

    b.switch_to_block(block0);
    b.store(v0, v1);
    let v2 = b.load(Type::I64, v0);
    b.ret(Some(v2));

    assert_eq!(store_to_load_forwarding(&mut func), (0, 0));
}

#[test]
fn forwarding_chains_through_several_loads() {
    let mut func = Function::with_name("chain");
    let mut b = FuncBuilder::new(&mut func);
    let block0 = b.create_block();
    let v0 = b.param(Type::Ptr);
    let v1 = b.param(Type::I32);

    b.switch_to_block(block0);
    b.store(v0, v1);
    let v2 = b.load(Type::I32, v0);
    let v3 = b.load(Type::I32, v0);
    let v4 = b.binary(Opcode::Iadd, Type::I32, v2, v3);
    b.ret(Some(v4));

    assert_eq!(store_to_load_forwarding(&mut func), (2, 0));

    let expected = expect![[r#"
        function %chain(v0: ptr, v1: i32) {
        block0:
            store v0, v1
            v4 = iadd.i32 v1, v1
            ret v4
        }
    "#]];
    expected.assert_eq(&func.to_debug_string());
}

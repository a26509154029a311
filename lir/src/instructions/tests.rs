use super::*;

#[test]
fn opcode_flags() {
    assert!(Opcode::Jmp.is_terminator());
    assert!(Opcode::Br.is_terminator());
    assert!(Opcode::Ret.is_terminator());
    assert!(!Opcode::Iadd.is_terminator());

    assert!(Opcode::Jmp.is_branch());
    assert!(!Opcode::Ret.is_branch());

    assert!(Opcode::Feq.is_float_compare());
    assert!(Opcode::Fge.is_float_compare());
    assert!(!Opcode::Ieq.is_float_compare());
    assert!(!Opcode::Fadd.is_float_compare());

    assert!(Opcode::Iadd.is_commutative());
    assert!(!Opcode::Isub.is_commutative());
}

#[test]
fn arguments() {
    let v0 = Value::with_number(0).unwrap();
    let v1 = Value::with_number(1).unwrap();
    let block0 = Block::with_number(0).unwrap();
    let block1 = Block::with_number(1).unwrap();

    let unary = InstructionData::Unary { opcode: Opcode::Ineg, arg: v0 };
    assert_eq!(unary.arguments(), &[v0]);
    assert_eq!(unary.opcode(), Opcode::Ineg);

    let store = InstructionData::Store { args: [v0, v1], volatile: false };
    assert_eq!(store.arguments(), &[v0, v1]);
    assert_eq!(store.opcode(), Opcode::Store);

    let alloca = InstructionData::Alloca;
    assert!(alloca.arguments().is_empty());

    let jump = InstructionData::Jump { destination: block0 };
    assert!(jump.arguments().is_empty());
    assert!(jump.is_terminator());

    let phi = InstructionData::Phi { args: Box::new([v0, v1]), blocks: Box::new([block0, block1]) };
    assert_eq!(phi.arguments(), &[v0, v1]);
    let edges: Vec<_> = phi.phi_edges().collect();
    assert_eq!(edges, vec![(block0, v0), (block1, v1)]);

    // non-phis have no edges
    assert_eq!(unary.phi_edges().count(), 0);
}

#[test]
fn rewrite_through_arguments_mut() {
    let v0 = Value::with_number(0).unwrap();
    let v9 = Value::with_number(9).unwrap();

    let mut data = InstructionData::Binary { opcode: Opcode::Iadd, args: [v0, v0] };
    for arg in data.arguments_mut() {
        *arg = v9;
    }
    assert_eq!(data.arguments(), &[v9, v9]);
}

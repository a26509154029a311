//! Algebraic simplification.
//!
//! The sweep itself only knows the replace-and-erase contract: an oracle is
//! asked for an equivalent existing value per instruction, and a hit redirects
//! all uses and erases the instruction. [`FoldSimplifier`] is the default
//! oracle with target-independent rules; hosts with target-specific knowledge
//! can supply their own [`InstSimplifier`].

use lir::{Const, DataFlowGraph, Function, Inst, InstructionData, Opcode, Type, Value, ValueDef};

#[cfg(test)]
mod tests;

/// An oracle deciding whether an instruction's result is equal to an already
/// existing value.
pub trait InstSimplifier {
    /// Return a value equivalent to `inst`'s result, or `None` to leave the
    /// instruction in place. The returned value must not be the instruction's
    /// own result.
    fn simplify_inst(&mut self, dfg: &mut DataFlowGraph, inst: Inst) -> Option<Value>;
}

/// Ask `simplifier` about every instruction that produces a result and has no
/// side effects; erase those it can replace. Returns the number of erased
/// instructions.
pub fn simplify_insts(func: &mut Function, simplifier: &mut dyn InstSimplifier) -> u32 {
    let mut simplified = 0;

    let mut block_cursor = func.layout.blocks_cursor();
    while let Some(block) = block_cursor.next(&func.layout) {
        let mut inst_cursor = func.layout.block_inst_cursor(block);
        while let Some(inst) = inst_cursor.next(&func.layout) {
            let res = match func.dfg.inst_result(inst) {
                Some(res) => res,
                None => continue,
            };
            if func.dfg.has_sideeffects(inst) {
                continue;
            }
            if let Some(val) = simplifier.simplify_inst(&mut func.dfg, inst) {
                debug_assert_ne!(val, res, "simplification must produce a different value");
                func.dfg.replace_uses(res, val);
                func.dfg.zap_inst(inst);
                func.layout.remove_inst(inst);
                simplified += 1;
            }
        }
    }

    simplified
}

/// Target-independent constant folding and algebraic identities.
#[derive(Clone, Copy, Default)]
pub struct FoldSimplifier;

impl InstSimplifier for FoldSimplifier {
    fn simplify_inst(&mut self, dfg: &mut DataFlowGraph, inst: Inst) -> Option<Value> {
        let ty = dfg.value_ty(dfg.inst_result(inst)?);
        match dfg.insts[inst].clone() {
            InstructionData::Unary { opcode, arg } => simplify_unary(dfg, opcode, ty, arg),
            InstructionData::Binary { opcode, args: [lhs, rhs] } => {
                simplify_binary(dfg, opcode, ty, lhs, rhs)
            }
            InstructionData::Phi { .. } => simplify_phi(dfg, inst),
            _ => None,
        }
    }
}

/// A phi whose incoming values all agree is that value.
fn simplify_phi(dfg: &DataFlowGraph, inst: Inst) -> Option<Value> {
    let mut edges = dfg.insts[inst].phi_edges();
    let (_, first) = edges.next()?;
    if edges.all(|(_, val)| val == first) {
        Some(first)
    } else {
        None
    }
}

fn simplify_unary(dfg: &mut DataFlowGraph, opcode: Opcode, ty: Type, arg: Value) -> Option<Value> {
    if let Some(const_) = as_const(dfg, arg) {
        return fold_unary(dfg, opcode, ty, const_);
    }

    // Involutions collapse: ineg (ineg x) is x.
    if let ValueDef::Result(def) = dfg.value_def(arg) {
        if let InstructionData::Unary { opcode: def_op, arg: inner } = dfg.insts[def] {
            if def_op == opcode
                && matches!(opcode, Opcode::Ineg | Opcode::Fneg | Opcode::Inot | Opcode::Bnot)
            {
                return Some(inner);
            }
        }
    }

    None
}

fn fold_unary(dfg: &mut DataFlowGraph, opcode: Opcode, ty: Type, arg: Const) -> Option<Value> {
    let res = match (opcode, arg) {
        (Opcode::Ineg, Const::Int(v)) => dfg.iconst(ty, wrap(ty, v.wrapping_neg())),
        (Opcode::Inot, Const::Int(v)) => dfg.iconst(ty, wrap(ty, !v)),
        (Opcode::Bnot, Const::Bool(v)) => dfg.bconst(!v),
        (Opcode::Fneg, Const::Float(v)) => dfg.f64const(-f64::from(v)),
        _ => return None,
    };
    Some(res)
}

fn simplify_binary(
    dfg: &mut DataFlowGraph,
    opcode: Opcode,
    ty: Type,
    lhs: Value,
    rhs: Value,
) -> Option<Value> {
    if let (Some(a), Some(b)) = (as_const(dfg, lhs), as_const(dfg, rhs)) {
        if let Some(res) = fold_binary(dfg, opcode, ty, a, b) {
            return Some(res);
        }
    }

    match opcode {
        Opcode::Iadd => {
            if is_int_zero(dfg, rhs) {
                return Some(lhs);
            }
            if is_int_zero(dfg, lhs) {
                return Some(rhs);
            }
        }
        Opcode::Isub => {
            if is_int_zero(dfg, rhs) {
                return Some(lhs);
            }
            if lhs == rhs {
                return Some(dfg.iconst(ty, 0));
            }
        }
        Opcode::Imul => {
            if is_int_one(dfg, rhs) {
                return Some(lhs);
            }
            if is_int_one(dfg, lhs) {
                return Some(rhs);
            }
            if is_int_zero(dfg, lhs) || is_int_zero(dfg, rhs) {
                return Some(dfg.iconst(ty, 0));
            }
        }
        Opcode::Idiv => {
            if is_int_one(dfg, rhs) {
                return Some(lhs);
            }
        }
        Opcode::Iand | Opcode::Ior => {
            if lhs == rhs {
                return Some(lhs);
            }
        }
        Opcode::Ixor => {
            if lhs == rhs {
                return Some(dfg.iconst(ty, 0));
            }
        }
        Opcode::Ishl | Opcode::Ishr => {
            if is_int_zero(dfg, rhs) {
                return Some(lhs);
            }
        }
        // Self comparisons are decided by reflexivity. Only the integer ones:
        // a NaN operand breaks it for floats.
        Opcode::Ieq | Opcode::Ile | Opcode::Ige => {
            if lhs == rhs {
                return Some(dfg.bconst(true));
            }
        }
        Opcode::Ine | Opcode::Ilt | Opcode::Igt => {
            if lhs == rhs {
                return Some(dfg.bconst(false));
            }
        }
        _ => (),
    }

    None
}

fn fold_binary(
    dfg: &mut DataFlowGraph,
    opcode: Opcode,
    ty: Type,
    lhs: Const,
    rhs: Const,
) -> Option<Value> {
    let res = match (lhs, rhs) {
        (Const::Int(a), Const::Int(b)) => match opcode {
            Opcode::Iadd => dfg.iconst(ty, wrap(ty, a.wrapping_add(b))),
            Opcode::Isub => dfg.iconst(ty, wrap(ty, a.wrapping_sub(b))),
            Opcode::Imul => dfg.iconst(ty, wrap(ty, a.wrapping_mul(b))),
            Opcode::Idiv if b != 0 => dfg.iconst(ty, wrap(ty, a.wrapping_div(b))),
            Opcode::Irem if b != 0 => dfg.iconst(ty, wrap(ty, a.wrapping_rem(b))),
            Opcode::Iand => dfg.iconst(ty, a & b),
            Opcode::Ior => dfg.iconst(ty, a | b),
            Opcode::Ixor => dfg.iconst(ty, a ^ b),
            Opcode::Ishl if in_shift_range(ty, b) => {
                dfg.iconst(ty, wrap(ty, a.wrapping_shl(b as u32)))
            }
            Opcode::Ishr if in_shift_range(ty, b) => match ty {
                Type::I32 => dfg.iconst(ty, ((a as i32) >> b) as i64),
                _ => dfg.iconst(ty, a >> b),
            },
            Opcode::Ieq => dfg.bconst(a == b),
            Opcode::Ine => dfg.bconst(a != b),
            Opcode::Ilt => dfg.bconst(a < b),
            Opcode::Igt => dfg.bconst(a > b),
            Opcode::Ile => dfg.bconst(a <= b),
            Opcode::Ige => dfg.bconst(a >= b),
            _ => return None,
        },
        (Const::Float(a), Const::Float(b)) => {
            let (a, b) = (f64::from(a), f64::from(b));
            match opcode {
                Opcode::Fadd => dfg.f64const(a + b),
                Opcode::Fsub => dfg.f64const(a - b),
                Opcode::Fmul => dfg.f64const(a * b),
                Opcode::Fdiv => dfg.f64const(a / b),
                Opcode::Feq => dfg.bconst(a == b),
                Opcode::Fne => dfg.bconst(a != b),
                Opcode::Flt => dfg.bconst(a < b),
                Opcode::Fgt => dfg.bconst(a > b),
                Opcode::Fle => dfg.bconst(a <= b),
                Opcode::Fge => dfg.bconst(a >= b),
                _ => return None,
            }
        }
        _ => return None,
    };
    Some(res)
}

fn wrap(ty: Type, val: i64) -> i64 {
    match ty {
        Type::I32 => val as i32 as i64,
        _ => val,
    }
}

fn in_shift_range(ty: Type, amount: i64) -> bool {
    let bits = match ty {
        Type::I32 => 32,
        _ => 64,
    };
    (0..bits).contains(&amount)
}

fn as_const(dfg: &DataFlowGraph, val: Value) -> Option<Const> {
    dfg.value_def(val).as_const()
}

fn is_int_zero(dfg: &DataFlowGraph, val: Value) -> bool {
    matches!(as_const(dfg, val), Some(Const::Int(0)))
}

fn is_int_one(dfg: &DataFlowGraph, val: Value) -> bool {
    matches!(as_const(dfg, val), Some(Const::Int(1)))
}

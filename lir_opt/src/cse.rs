//! Dominance-scoped common subexpression elimination.
//!
//! The pass walks the dominator tree in preorder, keeping a table of the
//! expressions that are available on the current dominance path. An
//! instruction whose structural key is already in the table recomputes a value
//! that a dominating instruction has produced, so its uses are redirected to
//! the earlier result and it is erased. The traversal order is what makes the
//! rewrite sound: a table hit always names an instruction whose block
//! dominates the current one (or precedes it in the same block), so every
//! redirected use stays dominated by its definition.
//!
//! Structural keys are deliberately strict. Operand *identity* must match at
//! every position, in order; nothing is keyed through commutativity or through
//! operand types.

use ahash::AHashMap;
use lir::{Block, DataFlowGraph, Function, Inst, InstructionData, Opcode, Type, Value};

use crate::dominators::DominatorTree;


/// Instructions that must not participate in expression merging: memory state
/// (loads, stores, stack slots), externally visible effects (calls), IEEE 754
/// comparisons with their NaN ordering caveats, and control flow.
pub fn ignore_for_cse(dfg: &DataFlowGraph, inst: Inst) -> bool {
    match dfg.insts[inst] {
        InstructionData::Load { .. }
        | InstructionData::Store { .. }
        | InstructionData::Alloca
        | InstructionData::Call { .. } => true,
        InstructionData::Binary { opcode, .. } => opcode.is_float_compare(),
        ref data => data.is_terminator(),
    }
}

/// The structural identity of an eligible instruction: opcode, result type and
/// ordered operand identities. Phis additionally carry their incoming block
/// list, so only phis joining the same edges compare equal.
#[derive(Clone, PartialEq, Eq, Hash)]
enum ExprKey {
    Unary { opcode: Opcode, ty: Type, arg: Value },
    Binary { opcode: Opcode, ty: Type, args: [Value; 2] },
    Phi { ty: Type, args: Box<[Value]>, blocks: Box<[Block]> },
}

fn expr_key(dfg: &DataFlowGraph, inst: Inst) -> Option<ExprKey> {
    if ignore_for_cse(dfg, inst) {
        return None;
    }
    let ty = dfg.value_ty(dfg.inst_result(inst)?);
    let key = match dfg.insts[inst] {
        InstructionData::Unary { opcode, arg } => ExprKey::Unary { opcode, ty, arg },
        InstructionData::Binary { opcode, args } => ExprKey::Binary { opcode, ty, args },
        InstructionData::Phi { ref args, ref blocks } => {
            ExprKey::Phi { ty, args: args.clone(), blocks: blocks.clone() }
        }
        _ => return None,
    };
    Some(key)
}

/// The expressions available along the dominance path to the block currently
/// being visited.
///
/// Entering a block opens a scope; definitions made inside it are rolled back
/// when the walk leaves the block's subtree, restoring whatever binding an
/// ancestor had for the same key.
#[derive(Default)]
struct AvailableExprs {
    exprs: AHashMap<ExprKey, Inst>,
    undo: Vec<(ExprKey, Option<Inst>)>,
    scopes: Vec<usize>,
}

impl AvailableExprs {
    fn enter_scope(&mut self) {
        self.scopes.push(self.undo.len());
    }

    fn leave_scope(&mut self) {
        let mark = self.scopes.pop().expect("scope underflow");
        while self.undo.len() > mark {
            let (key, prev) = self.undo.pop().unwrap();
            match prev {
                Some(inst) => self.exprs.insert(key, inst),
                None => self.exprs.remove(&key),
            };
        }
    }

    fn lookup(&self, key: &ExprKey) -> Option<Inst> {
        self.exprs.get(key).copied()
    }

    fn define(&mut self, key: ExprKey, inst: Inst) {
        let prev = self.exprs.insert(key.clone(), inst);
        self.undo.push((key, prev));
    }
}

enum Walk {
    Enter(Block),
    Leave,
}

/// Erase instructions that recompute a value already available from a
/// dominating instruction. Returns the number of erased instructions.
pub fn eliminate_common_subexpressions(func: &mut Function, dom_tree: &DominatorTree) -> u32 {
    let entry = match func.layout.entry_block() {
        Some(entry) => entry,
        None => return 0,
    };

    let mut avail = AvailableExprs::default();
    let mut eliminated = 0;

    let mut stack = vec![Walk::Enter(entry)];
    while let Some(step) = stack.pop() {
        match step {
            Walk::Enter(block) => {
                avail.enter_scope();
                eliminated += process_block(func, &mut avail, block);
                stack.push(Walk::Leave);
                for &child in dom_tree.children(block).iter().rev() {
                    stack.push(Walk::Enter(child));
                }
            }
            Walk::Leave => avail.leave_scope(),
        }
    }

    eliminated
}

fn process_block(func: &mut Function, avail: &mut AvailableExprs, block: Block) -> u32 {
    let mut eliminated = 0;
    let mut cursor = func.layout.block_inst_cursor(block);
    while let Some(inst) = cursor.next(&func.layout) {
        let key = match expr_key(&func.dfg, inst) {
            Some(key) => key,
            None => continue,
        };
        match avail.lookup(&key) {
            Some(earlier) => {
                let dest = func.dfg.first_result(inst);
                let src = func.dfg.first_result(earlier);
                func.dfg.replace_uses(dest, src);
                func.dfg.zap_inst(inst);
                func.layout.remove_inst(inst);
                eliminated += 1;
            }
            None => avail.define(key, inst),
        }
    }
    eliminated
}

use lir::{DataFlowGraph, Function, Inst, InstructionData};

#[cfg(test)]
mod tests;

/// An instruction is trivially dead when erasing it cannot be observed: it is
/// not a call, has no side effects, is not a terminator and nothing reads its
/// result.
pub fn is_trivially_dead(dfg: &DataFlowGraph, inst: Inst) -> bool {
    if matches!(dfg.insts[inst], InstructionData::Call { .. }) {
        return false;
    }
    if dfg.insts[inst].is_terminator() || dfg.has_sideeffects(inst) {
        return false;
    }
    dfg.safe_to_remove(inst)
}

/// Erase all trivially dead instructions in a single sweep. Returns the number
/// of erased instructions.
///
/// The sweep runs backwards so that erasing an instruction exposes its
/// operands' definitions before they are visited.
pub fn dead_code_elimination(func: &mut Function) -> u32 {
    let mut removed = 0;

    let mut block_cursor = func.layout.rev_blocks_cursor();
    while let Some(block) = block_cursor.next(&func.layout) {
        let mut inst_cursor = func.layout.block_inst_cursor(block);
        while let Some(inst) = inst_cursor.next_back(&func.layout) {
            if is_trivially_dead(&func.dfg, inst) {
                func.dfg.zap_inst(inst);
                func.layout.remove_inst(inst);
                removed += 1;
            }
        }
    }

    removed
}

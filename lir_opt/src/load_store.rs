//! Local memory optimizations.
//!
//! Both passes are a single forward scan per basic block and reason about
//! memory without alias analysis: two accesses are known to touch the same
//! location only when their address operands are the same value. Anything
//! that may write memory is treated as clobbering every address.

use lir::{Function, InstructionData};

#[cfg(test)]
mod tests;

/// Collapse repeated reads of the same address.
///
/// For every non-volatile load, the scan walks forward through the block and
/// redirects later non-volatile loads of the same address and type to the
/// first one's result. A store ends the scan since it may alias the loaded
/// address, as does any instruction with side effects. Returns the number of
/// erased loads.
pub fn eliminate_redundant_loads(func: &mut Function) -> u32 {
    let mut eliminated = 0;

    let mut block_cursor = func.layout.blocks_cursor();
    while let Some(block) = block_cursor.next(&func.layout) {
        let mut pos = func.layout.first_inst(block);
        while let Some(inst) = pos {
            if let InstructionData::Load { arg: addr, volatile: false } = func.dfg.insts[inst] {
                let ty = func.dfg.value_ty(func.dfg.first_result(inst));
                let mut scan = func.layout.next_inst(inst);
                while let Some(next) = scan {
                    scan = func.layout.next_inst(next);
                    match func.dfg.insts[next] {
                        InstructionData::Load { arg, volatile: false }
                            if arg == addr
                                && func.dfg.value_ty(func.dfg.first_result(next)) == ty =>
                        {
                            let dest = func.dfg.first_result(next);
                            let src = func.dfg.first_result(inst);
                            func.dfg.replace_uses(dest, src);
                            func.dfg.zap_inst(next);
                            func.layout.remove_inst(next);
                            eliminated += 1;
                        }
                        InstructionData::Store { .. } => break,
                        _ if func.dfg.has_sideeffects(next) => break,
                        _ => (),
                    }
                }
            }
            pos = func.layout.next_inst(inst);
        }
    }

    eliminated
}

/// Serve re-reads of a stored value without touching memory, and drop stores
/// that are overwritten before anything can read them.
///
/// For every non-volatile store, the scan walks forward through the block. A
/// non-volatile load of the stored address with the stored value's type is
/// replaced by the stored value directly. A non-volatile store of the same
/// address and value type makes the scanned store unobservable, so it is
/// erased. Any other load or store, and any instruction with side effects, is
/// an invalidation boundary that ends the scan. Volatile stores are never scan
/// origins; they only bound the scans of others.
///
/// Returns `(loads forwarded, stores erased)`.
pub fn store_to_load_forwarding(func: &mut Function) -> (u32, u32) {
    let mut forwarded = 0;
    let mut eliminated = 0;

    let mut block_cursor = func.layout.blocks_cursor();
    while let Some(block) = block_cursor.next(&func.layout) {
        let mut pos = func.layout.first_inst(block);
        while let Some(inst) = pos {
            let (addr, stored) = match func.dfg.insts[inst] {
                InstructionData::Store { args: [addr, val], volatile: false } => (addr, val),
                _ => {
                    pos = func.layout.next_inst(inst);
                    continue;
                }
            };
            let stored_ty = func.dfg.value_ty(stored);

            let mut erased_self = false;
            let mut scan = func.layout.next_inst(inst);
            while let Some(next) = scan {
                scan = func.layout.next_inst(next);
                match func.dfg.insts[next] {
                    InstructionData::Load { arg, volatile: false }
                        if arg == addr
                            && func.dfg.value_ty(func.dfg.first_result(next)) == stored_ty =>
                    {
                        let dest = func.dfg.first_result(next);
                        func.dfg.replace_uses(dest, stored);
                        func.dfg.zap_inst(next);
                        func.layout.remove_inst(next);
                        forwarded += 1;
                    }
                    InstructionData::Load { .. } => break,
                    InstructionData::Store { args: [arg, val], volatile: false }
                        if arg == addr && func.dfg.value_ty(val) == stored_ty =>
                    {
                        // Overwritten before any read, so the first store can
                        // never be observed. Pick up the continuation before
                        // the node is unlinked.
                        pos = func.layout.next_inst(inst);
                        func.dfg.zap_inst(inst);
                        func.layout.remove_inst(inst);
                        eliminated += 1;
                        erased_self = true;
                        break;
                    }
                    InstructionData::Store { .. } => break,
                    _ if func.dfg.has_sideeffects(next) => break,
                    _ => (),
                }
            }

            if !erased_self {
                pos = func.layout.next_inst(inst);
            }
        }
    }

    (forwarded, eliminated)
}

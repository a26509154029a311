//! Converting functions to text.
//!
//! The `write` module provides the `write_function` function which converts an
//! IR `Function` to a textual form, used for snapshots and debugging.

use core::fmt::{self, Write};

use crate::{Const, DataFlowGraph, Function, Inst, InstructionData, Value, ValueDef};

#[cfg(test)]
mod tests;

/// Write `func` to `w` as text.
pub fn write_function(w: &mut dyn Write, func: &Function) -> fmt::Result {
    write!(w, "function %{}(", func.name)?;

    let mut params: Vec<(usize, Value)> = func
        .dfg
        .values()
        .filter_map(|val| {
            if let ValueDef::Param(def) = func.dfg.value_def(val) {
                Some((def.into(), val))
            } else {
                None
            }
        })
        .collect();
    params.sort_by_key(|(pos, _)| *pos);
    let mut seen = false;
    for (_, val) in params {
        if seen {
            write!(w, ", ")?;
        } else {
            seen = true;
        }
        write!(w, "{}: {}", val, func.dfg.value_ty(val))?;
    }
    writeln!(w, ") {{")?;

    let mut any = write_preamble(w, func)?;
    for block in &func.layout {
        if any {
            writeln!(w)?;
        }
        writeln!(w, "{}:", block)?;
        for inst in func.layout.block_insts(block) {
            write_instruction(w, func, inst)?;
        }
        any = true;
    }
    writeln!(w, "}}")
}

fn write_preamble(w: &mut dyn Write, func: &Function) -> Result<bool, fmt::Error> {
    let mut any = false;

    // Write out all signatures before the body since call instructions refer
    // to them.
    for (sig, sig_data) in func.dfg.signatures.iter_enumerated() {
        any = true;
        writeln!(w, "    {} = {}", sig, sig_data)?;
    }

    for val in func.dfg.values() {
        if func.dfg.uses(val).next().is_none() {
            continue;
        }
        match func.dfg.value_def(val) {
            ValueDef::Const(Const::Int(def)) => {
                writeln!(w, "    {} = iconst.{} {}", val, func.dfg.value_ty(val), def)?
            }
            ValueDef::Const(Const::Float(def)) => writeln!(w, "    {} = fconst {}", val, def)?,
            ValueDef::Const(Const::Bool(def)) => writeln!(w, "    {} = bconst {}", val, def)?,
            _ => (),
        }
    }

    Ok(any)
}

fn write_instruction(w: &mut dyn Write, func: &Function, inst: Inst) -> fmt::Result {
    writeln!(w, "    {}", func.dfg.display_inst(inst))
}

/// Write the operands of `inst` to `w` with a prepended space.
pub fn write_operands(w: &mut dyn Write, dfg: &DataFlowGraph, inst: Inst) -> fmt::Result {
    match dfg.insts[inst] {
        InstructionData::Unary { arg, .. } => write!(w, " {}", arg),
        InstructionData::Binary { args, .. } => write!(w, " {}, {}", args[0], args[1]),
        InstructionData::Load { arg, volatile } => {
            if volatile {
                write!(w, " volatile {}", arg)
            } else {
                write!(w, " {}", arg)
            }
        }
        InstructionData::Store { args, volatile } => {
            if volatile {
                write!(w, " volatile {}, {}", args[0], args[1])
            } else {
                write!(w, " {}, {}", args[0], args[1])
            }
        }
        InstructionData::Alloca => Ok(()),
        InstructionData::Call { func_ref, ref args } => {
            write!(w, " {}(", func_ref)?;
            for (i, arg) in args.iter().enumerate() {
                if i != 0 {
                    write!(w, ", ")?;
                }
                write!(w, "{}", arg)?;
            }
            write!(w, ")")
        }
        InstructionData::Phi { .. } => {
            let mut first = true;
            for (block, val) in dfg.insts[inst].phi_edges() {
                if first {
                    first = false;
                } else {
                    write!(w, ",")?;
                }
                write!(w, " [{}, {}]", val, block)?;
            }
            Ok(())
        }
        InstructionData::Jump { destination } => write!(w, " {}", destination),
        InstructionData::Branch { cond, then_dst, else_dst } => {
            write!(w, " {}, {}, {}", cond, then_dst, else_dst)
        }
        InstructionData::Ret { ref args } => match args.first() {
            Some(arg) => write!(w, " {}", arg),
            None => Ok(()),
        },
    }
}

//! A small typed SSA IR.
//!
//! Function bodies are represented as basic blocks of instructions in
//! [SSA] form. The implementation is heavily inspired by the IR in
//! [`cranelift`]: entity references index into tables owned by the enclosing
//! function, the block and instruction order lives in a [`Layout`] of linked
//! lists, and every operand position is tracked as a use of its value so that
//! rewrites and liveness queries are cheap.
//!
//! Unlike cranelift this IR is deliberately minimal: one result per
//! instruction, a handful of scalar types and no instruction encodings. It
//! exists to be analyzed and transformed, not lowered to hardware; code
//! generation is somebody else's problem.
//!
//! [`cranelift`]: https://github.com/bytecodealliance/wasmtime/tree/main/cranelift
//! [SSA]: https://en.wikipedia.org/wiki/Static_single_assignment_form

use core::fmt;

mod dfg;
mod entities;
mod instructions;
mod layout;

pub mod builder;
pub mod flowgraph;
pub mod write;

pub use stdx::Ieee64;

pub use crate::dfg::{Const, DataFlowGraph, DisplayInst, UseIter, ValueDef};
pub use crate::entities::{Block, FuncRef, Inst, Param, Use, Value};
pub use crate::flowgraph::ControlFlowGraph;
pub use crate::instructions::{InstructionData, Opcode, PhiEdges};
pub use crate::layout::{BlockCursor, Blocks, InstCursor, InstIter, Layout, RevBlockCursor};

/// The type of a value.
///
/// All opcodes have fixed operand type shapes; instructions must be
/// constructed with correct types. Only the memory instructions and the
/// structural equivalence checks inspect types at all.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    /// A boolean produced by comparisons and consumed by branches.
    B1,
    I32,
    I64,
    F64,
    /// An untyped memory address.
    Ptr,
}

impl Type {
    pub const fn name(self) -> &'static str {
        match self {
            Type::B1 => "b1",
            Type::I32 => "i32",
            Type::I64 => "i64",
            Type::F64 => "f64",
            Type::Ptr => "ptr",
        }
    }

}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signature of an external function referenced by call instructions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionSignature {
    pub name: String,
    pub params: u16,
    pub returns: Option<Type>,
    pub has_sideeffects: bool,
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let FunctionSignature { name, params, returns, has_sideeffects } = self;
        let qualifier = if *has_sideeffects { "" } else { "const " };
        write!(f, "{}fn %{}({})", qualifier, name, params)?;
        if let Some(ty) = returns {
            write!(f, " -> {}", ty)?;
        }
        Ok(())
    }
}

/// A function body together with the entities it owns.
///
/// Functions can be cloned, but it is not a very fast operation. The clone
/// will have all the same entity numbers as the original.
#[derive(Clone, Default)]
pub struct Function {
    pub name: String,

    /// Data flow graph containing the primary definition of all instructions
    /// and values.
    pub dfg: DataFlowGraph,

    /// Layout of blocks and instructions in the function body.
    pub layout: Layout,
}

impl Function {
    pub fn new() -> Function {
        Self { name: String::new(), dfg: DataFlowGraph::new(), layout: Layout::new() }
    }

    pub fn with_name(name: impl Into<String>) -> Function {
        let mut res = Function::new();
        res.name = name.into();
        res
    }

    /// Clear all data structures in this function.
    pub fn clear(&mut self) {
        self.dfg.clear();
        self.layout.clear();
    }

    /// Adds a signature which can later be used to declare an external
    /// function import.
    pub fn import_function(&mut self, signature: FunctionSignature) -> FuncRef {
        self.dfg.signatures.push_and_get_key(signature)
    }

    pub fn to_debug_string(&self) -> String {
        format!("{:?}", self)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write::write_function(f, self)
    }
}

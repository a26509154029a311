//! Function builder.
//!
//! A `FuncBuilder` provides a convenient interface for appending blocks and
//! instructions to a function under construction. It is the construction
//! surface used by hosts and tests; the optimization passes never create
//! instructions.

use crate::entities::{Block, FuncRef, Inst, Param, Value};
use crate::{Function, InstructionData, Opcode, Type};

pub struct FuncBuilder<'a> {
    pub func: &'a mut Function,
    pos: Option<Block>,
    num_params: u32,
}

impl<'a> FuncBuilder<'a> {
    pub fn new(func: &'a mut Function) -> FuncBuilder<'a> {
        FuncBuilder { func, pos: None, num_params: 0 }
    }

    /// Create a new block and append it to the function layout.
    pub fn create_block(&mut self) -> Block {
        let block = self.func.layout.make_block();
        self.func.layout.append_block(block);
        block
    }

    /// Subsequent instructions are appended to `block`.
    pub fn switch_to_block(&mut self, block: Block) {
        self.pos = Some(block);
    }

    /// Declare the next function parameter.
    pub fn param(&mut self, ty: Type) -> Value {
        let param = Param::from(self.num_params as usize);
        self.num_params += 1;
        self.func.dfg.make_param(param, ty)
    }

    fn ins(&mut self, data: InstructionData) -> Inst {
        let inst = self.func.dfg.make_inst(data);
        let block = self.pos.expect("not positioned at a block");
        self.func.layout.append_inst_to_bb(inst, block);
        inst
    }

    fn ins_with_result(&mut self, data: InstructionData, ty: Type) -> Value {
        let inst = self.ins(data);
        self.func.dfg.make_inst_result(inst, ty)
    }

    pub fn unary(&mut self, opcode: Opcode, ty: Type, arg: Value) -> Value {
        self.ins_with_result(InstructionData::Unary { opcode, arg }, ty)
    }

    pub fn binary(&mut self, opcode: Opcode, ty: Type, lhs: Value, rhs: Value) -> Value {
        self.ins_with_result(InstructionData::Binary { opcode, args: [lhs, rhs] }, ty)
    }

    /// An integer or float comparison; the result is always `b1`.
    pub fn cmp(&mut self, opcode: Opcode, lhs: Value, rhs: Value) -> Value {
        self.ins_with_result(InstructionData::Binary { opcode, args: [lhs, rhs] }, Type::B1)
    }

    pub fn load(&mut self, ty: Type, addr: Value) -> Value {
        self.ins_with_result(InstructionData::Load { arg: addr, volatile: false }, ty)
    }

    pub fn volatile_load(&mut self, ty: Type, addr: Value) -> Value {
        self.ins_with_result(InstructionData::Load { arg: addr, volatile: true }, ty)
    }

    pub fn store(&mut self, addr: Value, val: Value) -> Inst {
        self.ins(InstructionData::Store { args: [addr, val], volatile: false })
    }

    pub fn volatile_store(&mut self, addr: Value, val: Value) -> Inst {
        self.ins(InstructionData::Store { args: [addr, val], volatile: true })
    }

    pub fn alloca(&mut self) -> Value {
        self.ins_with_result(InstructionData::Alloca, Type::Ptr)
    }

    pub fn call(&mut self, func_ref: FuncRef, args: &[Value]) -> Option<Value> {
        let inst = self.ins(InstructionData::Call { func_ref, args: args.into() });
        let returns = self.func.dfg.signatures[func_ref].returns;
        returns.map(|ty| self.func.dfg.make_inst_result(inst, ty))
    }

    pub fn phi(&mut self, ty: Type, edges: &[(Block, Value)]) -> Value {
        let blocks = edges.iter().map(|&(block, _)| block).collect();
        let args = edges.iter().map(|&(_, val)| val).collect();
        self.ins_with_result(InstructionData::Phi { args, blocks }, ty)
    }

    pub fn jump(&mut self, destination: Block) -> Inst {
        self.ins(InstructionData::Jump { destination })
    }

    pub fn br(&mut self, cond: Value, then_dst: Block, else_dst: Block) -> Inst {
        self.ins(InstructionData::Branch { cond, then_dst, else_dst })
    }

    pub fn ret(&mut self, arg: Option<Value>) -> Inst {
        let args: Box<[Value]> = match arg {
            Some(val) => Box::new([val]),
            None => Box::default(),
        };
        self.ins(InstructionData::Ret { args })
    }
}

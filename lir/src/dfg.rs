use std::fmt;

use ahash::AHashMap;
use stdx::packed_option::PackedOption;
use stdx::Ieee64;
use typed_index_collections::{TiSlice, TiVec};

use crate::entities::{FuncRef, Inst, Param, Use, Value};
use crate::write::write_operands;
use crate::{FunctionSignature, InstructionData, Type};


/// A data flow graph defines all instructions and values in a function as well
/// as the data flow dependencies between them. Values are instruction results,
/// function parameters or interned constants.
///
/// The layout of blocks in the function and of instructions in each block is
/// recorded by the `Layout` data structure which forms the other half of the
/// function representation.
#[derive(Clone)]
pub struct DataFlowGraph {
    /// Data about all of the instructions in the function, including opcodes
    /// and operands. The instructions in this map are not in program order.
    /// That is tracked by `Layout`, along with the block containing each
    /// instruction.
    pub insts: TiVec<Inst, InstructionData>,

    /// The result value of each instruction, if it has one.
    results: TiVec<Inst, PackedOption<Value>>,

    /// The use entity of every operand position of each instruction.
    operands: TiVec<Inst, Box<[Use]>>,

    /// Primary value table with entries for all values.
    values: TiVec<Value, ValueData>,

    /// Primary use table with entries for all uses.
    uses: TiVec<Use, UseData>,

    /// Function signature table. These signatures are referenced by external
    /// function references.
    pub signatures: TiVec<FuncRef, FunctionSignature>,

    /// Interned integer constants, keyed by type and value.
    int_consts: AHashMap<(Type, i64), Value>,

    /// Interned double precision constants.
    float_consts: AHashMap<Ieee64, Value>,

    /// Interned boolean constants, `false` then `true`.
    bool_consts: [PackedOption<Value>; 2],
}

#[derive(Clone, Debug)]
struct ValueData {
    ty: Type,
    def: ValueDataKind,
    uses_head: PackedOption<Use>,
    uses_tail: PackedOption<Use>,
}

#[derive(Clone, Copy, Debug)]
enum ValueDataKind {
    /// Value is the result of an instruction.
    Inst(Inst),
    /// A function parameter.
    Param(Param),
    Iconst(i64),
    Fconst(Ieee64),
    Bconst(bool),
}

#[derive(Clone, Copy, Debug)]
struct UseData {
    parent: Inst,
    parent_idx: u16,
    next: PackedOption<Use>,
    prev: PackedOption<Use>,
}

/// Where did a value come from?
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueDef {
    /// Value is the result of an instruction.
    Result(Inst),
    /// Value is a parameter of the function.
    Param(Param),
    /// Value is an interned constant.
    Const(Const),
}

impl ValueDef {
    /// Get the instruction where the value was defined, if any.
    #[inline]
    pub fn inst(&self) -> Option<Inst> {
        match *self {
            Self::Result(inst) => Some(inst),
            _ => None,
        }
    }

    #[inline]
    pub fn as_const(&self) -> Option<Const> {
        match *self {
            Self::Const(const_) => Some(const_),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Const {
    Int(i64),
    Float(Ieee64),
    Bool(bool),
}

impl Default for DataFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFlowGraph {
    /// Create a new empty `DataFlowGraph`.
    pub fn new() -> Self {
        Self {
            insts: TiVec::new(),
            results: TiVec::new(),
            operands: TiVec::new(),
            values: TiVec::new(),
            uses: TiVec::new(),
            signatures: TiVec::new(),
            int_consts: AHashMap::new(),
            float_consts: AHashMap::new(),
            bool_consts: [None.into(), None.into()],
        }
    }

    /// Clear everything.
    pub fn clear(&mut self) {
        self.insts.clear();
        self.results.clear();
        self.operands.clear();
        self.values.clear();
        self.uses.clear();
        self.signatures.clear();
        self.int_consts.clear();
        self.float_consts.clear();
        self.bool_consts = [None.into(), None.into()];
    }

    /// Get the total number of instructions created in this function, whether
    /// they are currently inserted in the layout or not.
    pub fn num_insts(&self) -> usize {
        self.insts.len()
    }

    /// Get the total number of values.
    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    /// Get an iterator over all values.
    pub fn values(&self) -> impl Iterator<Item = Value> + ExactSizeIterator + '_ {
        self.values.keys()
    }

    /// Returns an object that displays `inst`.
    pub fn display_inst(&self, inst: Inst) -> DisplayInst {
        DisplayInst(self, inst)
    }
}

/// Handling instructions.
impl DataFlowGraph {
    /// Create a new instruction and track the uses of its operands.
    ///
    /// The instruction is not inserted into the layout; if it produces a
    /// result, also call [`make_inst_result`](Self::make_inst_result).
    pub fn make_inst(&mut self, data: InstructionData) -> Inst {
        let inst = self.insts.next_key();
        let mut uses = Vec::with_capacity(data.arguments().len());
        for (idx, &arg) in data.arguments().iter().enumerate() {
            debug_assert!(idx <= u16::MAX as usize, "Too many operands");
            uses.push(self.make_use(arg, inst, idx as u16));
        }
        self.insts.push(data);
        self.results.push(None.into());
        self.operands.push(uses.into_boxed_slice());
        inst
    }

    /// Create the result value of `inst` with the given type.
    pub fn make_inst_result(&mut self, inst: Inst, ty: Type) -> Value {
        debug_assert!(self.results[inst].is_none(), "Instruction already has a result");
        let res = self.values.push_and_get_key(ValueData {
            ty,
            def: ValueDataKind::Inst(inst),
            uses_head: None.into(),
            uses_tail: None.into(),
        });
        self.results[inst] = res.into();
        res
    }

    /// Get the result of an instruction, if it has one.
    pub fn inst_result(&self, inst: Inst) -> Option<Value> {
        self.results[inst].expand()
    }

    /// Get the result of an instruction.
    ///
    /// This function panics if the instruction doesn't have a result.
    pub fn first_result(&self, inst: Inst) -> Value {
        self.results[inst].expect("Instruction has no result")
    }

    /// Get all value arguments of `inst` as a slice.
    pub fn instr_args(&self, inst: Inst) -> &[Value] {
        self.insts[inst].arguments()
    }

    /// Get the use entities of `inst`'s operand positions.
    pub fn operands(&self, inst: Inst) -> &[Use] {
        &self.operands[inst]
    }

    /// Returns whether an instruction is safe to remove: its result is unused
    /// or it never had one.
    pub fn safe_to_remove(&self, inst: Inst) -> bool {
        self.results[inst].expand().map_or(true, |res| self.value_dead(res))
    }

    /// Whether executing `inst` has an effect beyond producing its result.
    /// Terminators are accounted for separately.
    pub fn has_sideeffects(&self, inst: Inst) -> bool {
        match self.insts[inst] {
            InstructionData::Store { .. } => true,
            InstructionData::Load { volatile, .. } => volatile,
            InstructionData::Call { func_ref, .. } => self.signatures[func_ref].has_sideeffects,
            _ => false,
        }
    }

    /// Detach all operand uses of `inst`, so that the values it reads no
    /// longer count it as a user. Must be called before the instruction is
    /// removed from the layout for good.
    pub fn zap_inst(&mut self, inst: Inst) {
        for idx in 0..self.operands[inst].len() {
            let use_ = self.operands[inst][idx];
            self.detach_use(use_);
        }
    }
}

/// Handling values.
impl DataFlowGraph {
    /// Allocate a parameter value.
    pub fn make_param(&mut self, param: Param, ty: Type) -> Value {
        self.values.push_and_get_key(ValueData {
            ty,
            def: ValueDataKind::Param(param),
            uses_head: None.into(),
            uses_tail: None.into(),
        })
    }

    /// Check if a value reference is valid.
    pub fn is_value_valid(&self, v: Value) -> bool {
        usize::from(v) < self.values.len()
    }

    /// Get the type of a value.
    #[inline]
    pub fn value_ty(&self, v: Value) -> Type {
        self.values[v].ty
    }

    /// Get the definition of a value.
    ///
    /// This is either the instruction that defined it, the parameter it was
    /// born as, or the constant it was interned from.
    #[inline]
    pub fn value_def(&self, v: Value) -> ValueDef {
        match self.values[v].def {
            ValueDataKind::Inst(inst) => ValueDef::Result(inst),
            ValueDataKind::Param(param) => ValueDef::Param(param),
            ValueDataKind::Iconst(val) => ValueDef::Const(Const::Int(val)),
            ValueDataKind::Fconst(val) => ValueDef::Const(Const::Float(val)),
            ValueDataKind::Bconst(val) => ValueDef::Const(Const::Bool(val)),
        }
    }

    /// A value is dead when no instruction operand references it.
    pub fn value_dead(&self, val: Value) -> bool {
        self.values[val].uses_head.is_none()
    }

    /// Intern an integer constant of the given type.
    pub fn iconst(&mut self, ty: Type, val: i64) -> Value {
        debug_assert!(matches!(ty, Type::I32 | Type::I64 | Type::Ptr));
        *self.int_consts.entry((ty, val)).or_insert_with(|| {
            self.values.push_and_get_key(ValueData {
                ty,
                def: ValueDataKind::Iconst(val),
                uses_head: None.into(),
                uses_tail: None.into(),
            })
        })
    }

    /// Intern a double precision constant. Negative zero is normalized to
    /// positive zero so both spellings intern to the same value.
    pub fn f64const(&mut self, val: f64) -> Value {
        let val = if val == 0.0 { 0.0 } else { val };
        self.fconst(val.into())
    }

    pub fn fconst(&mut self, val: Ieee64) -> Value {
        *self.float_consts.entry(val).or_insert_with(|| {
            self.values.push_and_get_key(ValueData {
                ty: Type::F64,
                def: ValueDataKind::Fconst(val),
                uses_head: None.into(),
                uses_tail: None.into(),
            })
        })
    }

    /// Intern a boolean constant.
    pub fn bconst(&mut self, val: bool) -> Value {
        let slot = &mut self.bool_consts[val as usize];
        match slot.expand() {
            Some(res) => res,
            None => {
                let res = self.values.push_and_get_key(ValueData {
                    ty: Type::B1,
                    def: ValueDataKind::Bconst(val),
                    uses_head: None.into(),
                    uses_tail: None.into(),
                });
                self.bool_consts[val as usize] = res.into();
                res
            }
        }
    }
}

/// Handling uses.
impl DataFlowGraph {
    fn make_use(&mut self, val: Value, parent: Inst, parent_idx: u16) -> Use {
        let def = &mut self.values[val];
        let use_ = self.uses.push_and_get_key(UseData {
            parent,
            parent_idx,
            next: def.uses_head,
            prev: None.into(),
        });

        if let Some(old_head) = def.uses_head.expand() {
            self.uses[old_head].prev = use_.into();
        } else {
            def.uses_tail = use_.into();
        }

        def.uses_head = use_.into();
        use_
    }

    /// Unlink `use_` from the use list of the value it currently reads.
    pub fn detach_use(&mut self, use_: Use) {
        let UseData { parent, parent_idx, next, prev } = self.uses[use_];
        let val = self.insts[parent].arguments()[parent_idx as usize];
        self.uses[use_].next = None.into();
        self.uses[use_].prev = None.into();

        match (prev.expand(), next.expand()) {
            (None, None) => {
                self.values[val].uses_head = None.into();
                self.values[val].uses_tail = None.into();
            }
            (Some(prev), Some(next)) => {
                self.uses[prev].next = next.into();
                self.uses[next].prev = prev.into();
            }
            (None, Some(next)) => {
                self.values[val].uses_head = next.into();
                self.uses[next].prev = None.into();
            }
            (Some(prev), None) => {
                self.values[val].uses_tail = prev.into();
                self.uses[prev].next = None.into();
            }
        }
    }

    /// The instruction and operand position a use belongs to.
    pub fn use_to_operand(&self, use_: Use) -> (Inst, u16) {
        (self.uses[use_].parent, self.uses[use_].parent_idx)
    }

    /// Iterate over all operand positions that currently read `value`.
    pub fn uses(&self, value: Value) -> UseIter<'_> {
        UseIter { uses: &self.uses, next: self.values[value].uses_head.expand() }
    }

    /// Rewrite every use of `dest` to read `src` instead.
    ///
    /// All operand slots are updated and `dest`'s use list is spliced onto
    /// `src`'s, leaving `dest` without uses.
    ///
    /// # Note
    /// Calling this with `dest == src` will cause incorrect results.
    pub fn replace_uses(&mut self, dest: Value, src: Value) {
        debug_assert_ne!(dest, src);

        // replace values in instructions
        let mut cursor = self.values[dest].uses_head;
        while let Some(use_) = cursor.expand() {
            cursor = self.uses[use_].next;
            let UseData { parent, parent_idx, .. } = self.uses[use_];
            self.insts[parent].arguments_mut()[parent_idx as usize] = src;
        }

        // splice the use lists
        if let Some(new_head) = self.values[dest].uses_head.take() {
            let dest_tail = self.values[dest].uses_tail.take().unwrap();
            if let Some(old_head) = self.values[src].uses_head.expand() {
                self.uses[dest_tail].next = old_head.into();
                self.uses[old_head].prev = dest_tail.into();
            } else {
                self.values[src].uses_tail = dest_tail.into();
            }
            self.values[src].uses_head = new_head.into();
        }
    }
}

#[derive(Clone)]
pub struct UseIter<'a> {
    uses: &'a TiSlice<Use, UseData>,
    next: Option<Use>,
}

impl Iterator for UseIter<'_> {
    type Item = Use;

    fn next(&mut self) -> Option<Self::Item> {
        let res = self.next?;
        self.next = self.uses[res].next.expand();
        Some(res)
    }
}

/// Object that can display an instruction.
pub struct DisplayInst<'a>(&'a DataFlowGraph, Inst);

impl fmt::Display for DisplayInst<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let dfg = self.0;
        let inst = self.1;

        if let Some(res) = dfg.inst_result(inst) {
            write!(f, "{} = {}.{}", res, dfg.insts[inst].opcode(), dfg.value_ty(res))?;
        } else {
            write!(f, "{}", dfg.insts[inst].opcode())?;
        }

        write_operands(f, dfg, inst)
    }
}

//! Function layout.
//!
//! The order of basic blocks in a function and the order of instructions in a
//! block is determined by the `Layout` data structure defined in this module.

use stdx::packed_option::PackedOption;
use typed_index_collections::TiVec;

use crate::{Block, Inst};


/// The `Layout` struct determines the layout of blocks and instructions in a
/// function. It does not contain definitions of instructions or blocks, but
/// depends on `Inst` and `Block` entity references being defined elsewhere.
///
/// This data structure determines:
///
/// - The order of blocks in the function.
/// - Which block contains a given instruction.
/// - The order of instructions within a block.
///
/// While data dependencies are not recorded, instruction ordering does affect
/// control dependencies, so part of the semantics of the program are determined
/// by the layout.
#[derive(Clone)]
pub struct Layout {
    /// Linked list nodes for the layout order of blocks. Forms a doubly linked
    /// list, terminated in both ends by `None`.
    blocks: TiVec<Block, BlockNode>,

    /// Linked list nodes for the layout order of instructions. Forms a doubly
    /// linked list per block, terminated in both ends by `None`.
    insts: TiVec<Inst, InstNode>,

    /// First block in the layout order, or `None` when no blocks have been
    /// laid out.
    first_block: Option<Block>,

    /// Last block in the layout order, or `None` when no blocks have been laid
    /// out.
    last_block: Option<Block>,
}

#[derive(Clone, Debug, Default)]
struct BlockNode {
    prev: PackedOption<Block>,
    next: PackedOption<Block>,
    first_inst: PackedOption<Inst>,
    last_inst: PackedOption<Inst>,
}

#[derive(Clone, Debug, Default)]
struct InstNode {
    /// The block containing this instruction, or `None` if the instruction is
    /// not yet inserted.
    block: PackedOption<Block>,
    prev: PackedOption<Inst>,
    next: PackedOption<Inst>,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

impl Layout {
    /// Create a new empty `Layout`.
    pub fn new() -> Self {
        Self { blocks: TiVec::new(), insts: TiVec::new(), first_block: None, last_block: None }
    }

    /// Clear the layout.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.insts.clear();
        self.first_block = None;
        self.last_block = None;
    }

    /// Returns the capacity of the block map.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }
}

/// Methods for laying out blocks.
///
/// An unknown block starts out as *not inserted* in the block layout. The
/// layout is a linear order of inserted blocks. Once a block has been inserted
/// in the layout, instructions can be added.
impl Layout {
    pub fn make_block(&mut self) -> Block {
        self.blocks.push_and_get_key(BlockNode::default())
    }

    /// Is `block` currently part of the layout?
    pub fn is_block_inserted(&self, block: Block) -> bool {
        Some(block) == self.first_block || self.blocks[block].prev.is_some()
    }

    /// Insert `block` as the last block in the layout.
    pub fn append_block(&mut self, block: Block) {
        debug_assert!(
            !self.is_block_inserted(block),
            "Cannot append block that is already in the layout"
        );
        {
            let node = &mut self.blocks[block];
            debug_assert!(node.first_inst.is_none() && node.last_inst.is_none());
            node.prev = self.last_block.into();
            node.next = None.into();
        }
        if let Some(last) = self.last_block {
            self.blocks[last].next = block.into();
        } else {
            self.first_block = Some(block);
        }
        self.last_block = Some(block);
    }

    /// Return an iterator over all blocks in layout order.
    pub fn blocks(&self) -> Blocks {
        Blocks { layout: self, next: self.first_block }
    }

    pub fn blocks_cursor(&self) -> BlockCursor {
        BlockCursor { next: self.first_block }
    }

    pub fn rev_blocks_cursor(&self) -> RevBlockCursor {
        RevBlockCursor { next: self.last_block }
    }

    /// Get the function's entry block.
    /// This is simply the first block in the layout order.
    pub fn entry_block(&self) -> Option<Block> {
        self.first_block
    }

    /// Get the last block in the layout.
    pub fn last_block(&self) -> Option<Block> {
        self.last_block
    }

    /// Get the block preceding `block` in the layout order.
    pub fn prev_block(&self, block: Block) -> Option<Block> {
        self.blocks[block].prev.expand()
    }

    /// Get the block following `block` in the layout order.
    pub fn next_block(&self, block: Block) -> Option<Block> {
        self.blocks[block].next.expand()
    }
}

/// Iterate over blocks in layout order. See [`Layout::blocks`].
pub struct Blocks<'f> {
    layout: &'f Layout,
    next: Option<Block>,
}

impl<'f> Iterator for Blocks<'f> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        match self.next {
            Some(block) => {
                self.next = self.layout.next_block(block);
                Some(block)
            }
            None => None,
        }
    }
}

/// Use a layout reference in a for loop.
impl<'f> IntoIterator for &'f Layout {
    type Item = Block;
    type IntoIter = Blocks<'f>;

    fn into_iter(self) -> Blocks<'f> {
        self.blocks()
    }
}

pub struct BlockCursor {
    pub next: Option<Block>,
}

impl BlockCursor {
    pub fn next(&mut self, layout: &Layout) -> Option<Block> {
        match self.next {
            Some(block) => {
                self.next = layout.next_block(block);
                Some(block)
            }
            None => None,
        }
    }
}

pub struct RevBlockCursor {
    pub next: Option<Block>,
}

impl RevBlockCursor {
    pub fn next(&mut self, layout: &Layout) -> Option<Block> {
        match self.next {
            Some(block) => {
                self.next = layout.prev_block(block);
                Some(block)
            }
            None => None,
        }
    }
}

/// Methods for arranging instructions.
///
/// An instruction starts out as *not inserted* in the layout. An instruction
/// can be inserted into a block at a given position.
impl Layout {
    /// Get the block containing `inst`, or `None` if `inst` is not inserted in
    /// the layout.
    pub fn inst_block(&self, inst: Inst) -> Option<Block> {
        self.insts.get(inst).and_then(|inst| inst.block.expand())
    }

    /// Append `inst` to the end of `block`.
    pub fn append_inst_to_bb(&mut self, inst: Inst, block: Block) {
        if self.insts.len() <= usize::from(inst) {
            self.insts.resize(usize::from(inst) + 1, InstNode::default())
        }

        debug_assert_eq!(self.inst_block(inst), None);
        debug_assert!(
            self.is_block_inserted(block),
            "Cannot append instructions to block not in layout"
        );

        let block_node = &mut self.blocks[block];
        {
            let inst_node = &mut self.insts[inst];
            inst_node.block = block.into();
            inst_node.prev = block_node.last_inst;
            debug_assert!(inst_node.next.is_none());
        }
        if block_node.first_inst.is_none() {
            block_node.first_inst = inst.into();
        } else {
            self.insts[block_node.last_inst.unwrap()].next = inst.into();
        }
        block_node.last_inst = inst.into();
    }

    /// Fetch a block's first instruction.
    pub fn first_inst(&self, block: Block) -> Option<Inst> {
        self.blocks[block].first_inst.into()
    }

    /// Fetch a block's last instruction.
    pub fn last_inst(&self, block: Block) -> Option<Inst> {
        self.blocks[block].last_inst.into()
    }

    /// Fetch the instruction following `inst`.
    pub fn next_inst(&self, inst: Inst) -> Option<Inst> {
        self.insts[inst].next.expand()
    }

    /// Fetch the instruction preceding `inst`.
    pub fn prev_inst(&self, inst: Inst) -> Option<Inst> {
        self.insts[inst].prev.expand()
    }

    /// The terminator is always the last instruction of a block.
    pub fn block_terminator(&self, block: Block) -> Option<Inst> {
        self.blocks[block].last_inst.into()
    }

    /// Remove `inst` from the layout.
    ///
    /// The neighboring instructions are relinked, so a traversal that has
    /// already advanced past `inst` resumes at the instruction that followed
    /// it.
    pub fn remove_inst(&mut self, inst: Inst) {
        let block = self.inst_block(inst).expect("Instruction already removed.");
        // Clear the `inst` node and extract links.
        let prev;
        let next;
        {
            let n = &mut self.insts[inst];
            prev = n.prev;
            next = n.next;
            n.block = None.into();
            n.prev = None.into();
            n.next = None.into();
        }
        // Fix up links to `inst`.
        match prev.expand() {
            None => self.blocks[block].first_inst = next,
            Some(p) => self.insts[p].next = next,
        }
        match next.expand() {
            None => self.blocks[block].last_inst = prev,
            Some(n) => self.insts[n].prev = prev,
        }
    }

    /// Iterate over the instructions in `block` in layout order.
    pub fn block_insts(&self, block: Block) -> InstIter {
        InstIter { layout: self, cursor: self.block_inst_cursor(block) }
    }

    /// Cursor over the instructions in `block` in layout order.
    pub fn block_inst_cursor(&self, block: Block) -> InstCursor {
        InstCursor {
            head: self.blocks[block].first_inst.into(),
            tail: self.blocks[block].last_inst.into(),
        }
    }
}

/// Iterate over instructions in a block in layout order. See [`Layout::block_insts`].
#[derive(Clone)]
pub struct InstIter<'f> {
    pub layout: &'f Layout,
    pub cursor: InstCursor,
}

impl<'f> Iterator for InstIter<'f> {
    type Item = Inst;

    fn next(&mut self) -> Option<Inst> {
        self.cursor.next(self.layout)
    }
}

impl<'f> DoubleEndedIterator for InstIter<'f> {
    fn next_back(&mut self) -> Option<Inst> {
        self.cursor.next_back(self.layout)
    }
}

/// Detached cursor over the instructions of a block.
///
/// The cursor advances before an instruction is handed out, so the current
/// instruction may be removed from the layout without disturbing the
/// traversal.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InstCursor {
    pub head: Option<Inst>,
    pub tail: Option<Inst>,
}

impl InstCursor {
    pub fn next(&mut self, layout: &Layout) -> Option<Inst> {
        let rval = self.head;
        if let Some(inst) = rval {
            if self.head == self.tail {
                self.head = None;
                self.tail = None;
            } else {
                self.head = layout.insts[inst].next.into();
            }
        }
        rval
    }

    pub fn next_back(&mut self, layout: &Layout) -> Option<Inst> {
        let rval = self.tail;
        if let Some(inst) = rval {
            if self.head == self.tail {
                self.head = None;
                self.tail = None;
            } else {
                self.tail = layout.insts[inst].prev.into();
            }
        }
        rval
    }
}

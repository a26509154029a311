//! A control flow graph represented as mappings of basic blocks to their
//! predecessors and successors.
//!
//! Successor edges are read off the terminator of each block. Since a block
//! ends in at most a two-way branch, successors are stored inline as a packed
//! pair while predecessors are gathered in a per-block list.

use std::cmp::Ordering;
use std::iter::FilterMap;
use std::ops::Index;

use stdx::packed_option::PackedOption;
use typed_index_collections::TiVec;

use crate::{Block, Function, InstructionData};

/// A container for the successors and predecessors of some block.
#[derive(Clone, Default)]
pub struct CFGNode {
    /// Blocks that can branch or jump to this block.
    pub predecessors: Vec<Block>,

    /// Set of blocks that are the targets of branches and jumps in this block.
    pub successors: Successors,
}

/// At most two successor blocks, ordered by block number.
#[derive(Clone, Default, Copy, PartialEq, Eq, Debug)]
pub struct Successors(PackedOption<Block>, PackedOption<Block>);

impl Successors {
    /// Insert `bb`, keeping the pair sorted. Returns whether the set changed.
    #[inline]
    pub fn insert(&mut self, bb: Block) -> bool {
        let res = PackedOption::from(bb);
        let res = match self.0.cmp(&res) {
            Ordering::Equal => false,
            Ordering::Less => {
                let changed = self.1 != res;
                debug_assert!(
                    self.1.is_none() || !changed,
                    "no space to insert {} into [{:?}, {:?}]",
                    bb,
                    self.0,
                    self.1
                );
                self.1 = res;
                changed
            }
            Ordering::Greater => {
                debug_assert!(self.0.is_none() || self.1.is_none());
                self.1 = self.0;
                self.0 = res;
                true
            }
        };

        debug_assert_ne!(self.0, self.1);
        res
    }

    #[inline]
    pub fn iter(self) -> SuccIter {
        [self.0, self.1].into_iter().filter_map(|it| it.expand())
    }

    pub fn is_empty(self) -> bool {
        self.0.is_none()
    }
}

pub type SuccIter = FilterMap<
    std::array::IntoIter<PackedOption<Block>, 2>,
    fn(PackedOption<Block>) -> Option<Block>,
>;

/// The Control Flow Graph maintains a mapping of blocks to their predecessors
/// and successors.
#[derive(Clone)]
pub struct ControlFlowGraph {
    data: TiVec<Block, CFGNode>,
    valid: bool,
}

impl ControlFlowGraph {
    /// Allocate a new blank control flow graph.
    pub fn new() -> Self {
        Self { data: TiVec::new(), valid: false }
    }

    /// Clear all data structures in this control flow graph.
    pub fn clear(&mut self) {
        self.data.clear();
        self.valid = false;
    }

    /// Allocate and compute the control flow graph for `func`.
    pub fn with_function(func: &Function) -> Self {
        let mut cfg = Self::new();
        cfg.compute(func);
        cfg
    }

    /// Compute the control flow graph of `func`.
    ///
    /// This will clear and overwrite any information already stored in this
    /// data structure.
    pub fn compute(&mut self, func: &Function) {
        self.clear();
        self.data.resize(func.layout.num_blocks(), CFGNode::default());

        for block in &func.layout {
            self.compute_block(func, block);
        }

        self.valid = true;
    }

    fn compute_block(&mut self, func: &Function, block: Block) {
        if let Some(inst) = func.layout.last_inst(block) {
            match func.dfg.insts[inst] {
                InstructionData::Jump { destination } => self.add_edge(block, destination),
                InstructionData::Branch { then_dst, else_dst, .. } => {
                    self.add_edge(block, then_dst);
                    self.add_edge(block, else_dst);
                }
                _ => (),
            }
        }
    }

    fn add_edge(&mut self, from: Block, to: Block) {
        if self.data[from].successors.insert(to) {
            self.data[to].predecessors.push(from);
        }
    }

    /// Get an iterator over the CFG predecessors of `block`.
    pub fn pred_iter(&self, block: Block) -> impl Iterator<Item = Block> + '_ {
        self.data[block].predecessors.iter().copied()
    }

    pub fn successors(&self, block: Block) -> Successors {
        self.data[block].successors
    }

    /// Get an iterator over the CFG successors of `block`.
    pub fn succ_iter(&self, block: Block) -> SuccIter {
        debug_assert!(self.is_valid());
        self.data[block].successors.iter()
    }

    /// Check if the CFG is in a valid state.
    ///
    /// Note that this doesn't perform any kind of validity checks. It simply
    /// checks if the `compute()` method has been called since the last
    /// `clear()`. It does not check that the CFG is consistent with the
    /// function.
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl Default for ControlFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<Block> for ControlFlowGraph {
    type Output = CFGNode;

    fn index(&self, bb: Block) -> &Self::Output {
        &self.data[bb]
    }
}

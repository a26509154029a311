//! Redundancy elimination over [`lir`] function graphs.
//!
//! The passes in this crate remove computation that provably repeats work:
//! trivially dead instructions, algebraically simplifiable instructions,
//! common subexpressions along dominance paths, repeated loads of an
//! unchanged address and stores whose value is re-read or overwritten
//! locally. All of them mutate the function in place through
//! replace-uses-then-erase and none of them edits the control flow graph,
//! so a dominator tree computed at the start of a function run stays valid
//! for the whole run.
//!
//! [`optimize`] bundles the passes in a fixed order; each is also usable on
//! its own.

use core::fmt;

use lir::{ControlFlowGraph, Function};

mod cse;
mod dead_code;
mod dominators;
mod load_store;
mod simplify;


pub use crate::cse::{eliminate_common_subexpressions, ignore_for_cse};
pub use crate::dead_code::{dead_code_elimination, is_trivially_dead};
pub use crate::dominators::DominatorTree;
pub use crate::load_store::{eliminate_redundant_loads, store_to_load_forwarding};
pub use crate::simplify::{simplify_insts, FoldSimplifier, InstSimplifier};

/// Effect counters accumulated over one [`optimize`] run.
///
/// The counters are plain values so runs stay independent and testable; hosts
/// that want a report can render the `Display` form, one `name,value` line
/// per counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptStats {
    /// Trivially dead instructions erased.
    pub dead_removed: u32,
    /// Instructions replaced by the simplification oracle.
    pub simplified: u32,
    /// Instructions merged into a dominating equivalent.
    pub cse_eliminated: u32,
    /// Loads served by an earlier load of the same address.
    pub loads_eliminated: u32,
    /// Loads served directly by the stored value.
    pub stores_forwarded: u32,
    /// Stores erased because they are overwritten before any read.
    pub stores_eliminated: u32,
}

impl fmt::Display for OptStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "dead_removed,{}", self.dead_removed)?;
        writeln!(f, "simplified,{}", self.simplified)?;
        writeln!(f, "cse_eliminated,{}", self.cse_eliminated)?;
        writeln!(f, "loads_eliminated,{}", self.loads_eliminated)?;
        writeln!(f, "stores_forwarded,{}", self.stores_forwarded)?;
        writeln!(f, "stores_eliminated,{}", self.stores_eliminated)
    }
}

/// Run the full pipeline on `func` with the default simplification oracle.
pub fn optimize(func: &mut Function) -> OptStats {
    optimize_with(func, &mut FoldSimplifier)
}

/// Run the full pipeline on `func`: dead code removal, simplification,
/// dominance-scoped CSE, then the local memory passes.
///
/// The dominator tree is computed fresh after the erasing sweeps; it would go
/// stale the instant the block graph changed, but instruction erasure leaves
/// it intact.
pub fn optimize_with(func: &mut Function, simplifier: &mut dyn InstSimplifier) -> OptStats {
    let mut stats = OptStats::default();

    stats.dead_removed = dead_code_elimination(func);
    stats.simplified = simplify_insts(func, simplifier);

    let mut cfg = ControlFlowGraph::new();
    cfg.compute(func);
    let mut dom_tree = DominatorTree::default();
    dom_tree.compute(func, &cfg);
    stats.cse_eliminated = eliminate_common_subexpressions(func, &dom_tree);

    stats.loads_eliminated = eliminate_redundant_loads(func);
    let (forwarded, stores_eliminated) = store_to_load_forwarding(func);
    stats.stores_forwarded = forwarded;
    stats.stores_eliminated = stores_eliminated;

    stats
}

//! The "global variables" pass (spec §4.D.5): a variable used before
//! being killed (assigned) in its own block needs to be tracked across
//! blocks — φ-insertion only has work to do for those.

use rustc_hash::FxHashSet;
use shecc_ir::{BlockId, Context, VarId};

pub(crate) struct GlobalsInfo {
    /// Deduplicated, in scan order, so φ-insertion's worklist processing
    /// order matches the block scan that found them.
    pub global_vars: Vec<VarId>,
}

/// Per block, scan instructions in order: a use seen before that same
/// variable's def in this block marks the variable global. Every
/// definition is recorded onto the variable's own `ref_block_list`
/// (spec's "registers the block as a reference site") — φ-insertion
/// walks that list as its initial worklist.
pub(crate) fn analyze(ctx: &mut Context, order: &[BlockId]) -> GlobalsInfo {
    let mut seen = FxHashSet::default();
    let mut global_vars = Vec::new();

    for &b in order {
        let mut killed_here = FxHashSet::default();
        let instrs = ctx.blocks.get(b).instructions.clone();
        for instr in &instrs {
            for used in [instr.src0, instr.src1] {
                let Some(v) = used else { continue };
                if !killed_here.contains(&v) && seen.insert(v) {
                    global_vars.push(v);
                }
            }
            if let Some(d) = instr.dest {
                killed_here.insert(d);
                ctx.var_mut(d).ref_block_list.push(b);
            }
        }
    }

    GlobalsInfo { global_vars }
}

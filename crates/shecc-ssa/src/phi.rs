//! φ-insertion (spec §4.D.6): for each global variable, walk its
//! definition sites' dominance frontiers (a worklist, since inserting a
//! φ makes the φ-owning block itself a new definition site), dropping a
//! φ at the top of each frontier block within the variable's lexical
//! scope, skipping the function's exit block.

use rustc_hash::FxHashSet;
use shecc_ir::{BlockId, Context, FuncId, Opcode, Phase1Instr};

use crate::globals::GlobalsInfo;

pub(crate) fn insert(ctx: &mut Context, func: FuncId, globals: &GlobalsInfo) {
    let exit_bb = ctx.funcs.get(func).exit_bb;

    for &base in &globals.global_vars {
        // File-scope globals live in the data section across the whole
        // program, not in any one function's SSA renaming — they skip
        // φ-insertion entirely (spec §4.D.6 last sentence).
        if ctx.var(base).is_global {
            continue;
        }

        let mut worklist: Vec<BlockId> = ctx.var(base).ref_block_list.clone();
        let mut has_phi = FxHashSet::default();
        let mut i = 0;
        while i < worklist.len() {
            let def_site = worklist[i];
            i += 1;
            let frontier = ctx.blocks.get(def_site).dominance_frontier.clone();
            for d in frontier {
                if d == exit_bb || has_phi.contains(&d) {
                    continue;
                }
                let mut instr = Phase1Instr::new(Opcode::Phi);
                instr.dest = Some(base);
                ctx.blocks.get_mut(d).instructions.insert(0, instr);
                has_phi.insert(d);
                worklist.push(d);
            }
        }
    }
}

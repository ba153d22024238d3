//! Liveness analysis (spec §4.D, "Liveness analysis"): per-block
//! `live_gen`/`live_kill` from a single forward scan, then the standard
//! backward dataflow fixpoint over `live_in = (live_out − live_kill) ∪
//! live_gen` and `live_out = ⋃ successors' live_in`, iterated in reverse
//! RPO until stable.

use rustc_hash::FxHashSet;
use shecc_ir::{BlockId, Context, VarId};

pub(crate) fn analyze(ctx: &mut Context, order: &[BlockId]) {
    for &b in order {
        let mut gen = FxHashSet::default();
        let mut kill = FxHashSet::default();
        for instr in &ctx.blocks.get(b).instructions {
            for used in [instr.src0, instr.src1] {
                if let Some(v) = used {
                    if !kill.contains(&v) {
                        gen.insert(v);
                    }
                }
            }
            if let Some(d) = instr.dest {
                kill.insert(d);
            }
        }
        let blk = ctx.blocks.get_mut(b);
        blk.live_gen = gen.into_iter().collect();
        blk.live_kill = kill.into_iter().collect();
    }

    let mut changed = true;
    while changed {
        changed = false;
        for &b in order.iter().rev() {
            let mut live_out: FxHashSet<VarId> = FxHashSet::default();
            for (succ, _) in ctx.blocks.get(b).successors() {
                live_out.extend(ctx.blocks.get(succ).live_in.iter().copied());
            }
            let kill: FxHashSet<VarId> = ctx.blocks.get(b).live_kill.iter().copied().collect();
            let mut live_in: FxHashSet<VarId> = live_out.difference(&kill).copied().collect();
            live_in.extend(ctx.blocks.get(b).live_gen.iter().copied());

            let new_in: Vec<VarId> = live_in.into_iter().collect();
            let new_out: Vec<VarId> = live_out.into_iter().collect();
            let blk = ctx.blocks.get_mut(b);
            if differs(&blk.live_in, &new_in) || differs(&blk.live_out, &new_out) {
                blk.live_in = new_in;
                blk.live_out = new_out;
                changed = true;
            }
        }
    }
}

fn differs(a: &[VarId], b: &[VarId]) -> bool {
    let sa: FxHashSet<VarId> = a.iter().copied().collect();
    let sb: FxHashSet<VarId> = b.iter().copied().collect();
    sa != sb
}

//! Immediate dominators, the dominator tree, and dominance frontiers
//! (spec §4.D.2–4).

use shecc_ir::{BlockId, Context};

/// Cooper-Harvey-Kennedy fixpoint over RPO order (spec §4.D.2):
/// `entry.idom = entry`, then repeatedly recompute each other block's
/// idom as the intersection of its already-processed predecessors'
/// idoms, until nothing changes.
pub(crate) fn compute_idoms(ctx: &mut Context, order: &[BlockId]) {
    let entry = order[0];
    ctx.blocks.get_mut(entry).idom = Some(entry);

    let mut changed = true;
    while changed {
        changed = false;
        for &b in &order[1..] {
            let preds = ctx.blocks.get(b).predecessors.clone();
            let mut new_idom = None;
            for (p, _) in &preds {
                if ctx.blocks.get(*p).idom.is_none() {
                    continue;
                }
                new_idom = Some(match new_idom {
                    None => *p,
                    Some(cur) => intersect(ctx, cur, *p),
                });
            }
            if let Some(ni) = new_idom {
                if ctx.blocks.get(b).idom != Some(ni) {
                    ctx.blocks.get_mut(b).idom = Some(ni);
                    changed = true;
                }
            }
        }
    }
}

fn intersect(ctx: &Context, mut a: BlockId, mut b: BlockId) -> BlockId {
    while a != b {
        while rpo_of(ctx, a) > rpo_of(ctx, b) {
            a = ctx.blocks.get(a).idom.expect("idom set for every already-processed block");
        }
        while rpo_of(ctx, b) > rpo_of(ctx, a) {
            b = ctx.blocks.get(b).idom.expect("idom set for every already-processed block");
        }
    }
    a
}

fn rpo_of(ctx: &Context, id: BlockId) -> i32 {
    ctx.blocks.get(id).rpo
}

/// Link each block beneath its idom's `dominance_children` (spec
/// §4.D.3). Duplicate links are idempotent, since a fixpoint re-run
/// could in principle revisit an unchanged idom.
pub(crate) fn build_dominator_tree(ctx: &mut Context, order: &[BlockId]) {
    let entry = order[0];
    for &b in order {
        if b == entry {
            continue;
        }
        let Some(idom) = ctx.blocks.get(b).idom else { continue };
        let children = &mut ctx.blocks.get_mut(idom).dominance_children;
        if !children.contains(&b) {
            children.push(b);
        }
    }
}

/// For each block with ≥2 predecessors, walk each predecessor upward
/// via idom until the block's own idom is reached, appending the block
/// to every visited node's dominance frontier (spec §4.D.4).
pub(crate) fn compute_dominance_frontiers(ctx: &mut Context, order: &[BlockId]) {
    for &b in order {
        let preds = ctx.blocks.get(b).predecessors.clone();
        if preds.len() < 2 {
            continue;
        }
        let idom = ctx.blocks.get(b).idom;
        for (p, _) in preds {
            let mut runner = p;
            while Some(runner) != idom {
                let df = &mut ctx.blocks.get_mut(runner).dominance_frontier;
                if !df.contains(&b) {
                    df.push(b);
                }
                runner = ctx
                    .blocks
                    .get(runner)
                    .idom
                    .expect("idom set for every block on a path to the entry");
            }
        }
    }
}

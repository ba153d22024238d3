//! Reverse post-order numbering (spec §4.D.1): a post-order DFS from the
//! entry block, reversed, gives the order later passes iterate in.
//! `rpo` is the ascending RPO index; `rpo_r` is the DFS post-order index
//! it was reversed from, kept around because the dominance walk in
//! `dominance.rs` needs to compare "which of two blocks was reached
//! later in post-order" without recomputing it.

use rustc_hash::FxHashSet;
use shecc_ir::{BlockId, Context, FuncId};

pub(crate) fn compute(ctx: &mut Context, func: FuncId) -> Vec<BlockId> {
    let entry = ctx.funcs.get(func).entry_bb;
    let mut visited = FxHashSet::default();
    let mut postorder = Vec::new();
    dfs(ctx, entry, &mut visited, &mut postorder);
    postorder.reverse();

    let n = postorder.len();
    for (i, &id) in postorder.iter().enumerate() {
        let b = ctx.blocks.get_mut(id);
        b.rpo = i as i32;
        b.rpo_r = (n - 1 - i) as i32;
    }
    ctx.funcs.get_mut(func).bb_list = postorder.clone();
    postorder
}

fn dfs(ctx: &Context, id: BlockId, visited: &mut FxHashSet<BlockId>, postorder: &mut Vec<BlockId>) {
    if !visited.insert(id) {
        return;
    }
    for (succ, _) in ctx.blocks.get(id).successors() {
        dfs(ctx, succ, visited, postorder);
    }
    postorder.push(id);
}

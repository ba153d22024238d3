//! Last-use indexing (spec §4.F: "Lifetime is the instruction index of
//! the last use"). Instructions are numbered once, in the same order
//! the scan in `scan.rs` walks them (RPO blocks, program order within
//! each block), and each variable's `liveness` field is set to the
//! highest index at which it's read or written.

use rustc_hash::FxHashMap;
use shecc_ir::{Context, FuncId, VarId};

pub(crate) fn compute(ctx: &mut Context, func: FuncId) {
    let order = ctx.funcs.get(func).bb_list.clone();
    let mut last: FxHashMap<VarId, u32> = FxHashMap::default();
    let mut idx: u32 = 0;
    for &b in &order {
        for instr in &ctx.blocks.get(b).instructions {
            for operand in [instr.src0, instr.src1] {
                if let Some(v) = operand {
                    last.insert(v, idx);
                }
            }
            if let Some(d) = instr.dest {
                last.insert(d, idx);
            }
            idx += 1;
        }
    }
    for (var, at) in last {
        ctx.var_mut(var).liveness = Some(at);
    }
}

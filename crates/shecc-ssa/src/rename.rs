//! Variable renaming (spec §4.D.7): a preorder walk of the dominator
//! tree, pushing a fresh subscript on every definition and rewriting
//! every use to the top of its variable's rename stack, filling in φ
//! operands for each CFG successor along the way, and popping on exit.
//!
//! The rename stack itself isn't a field on `Variable` (spec's
//! `rename_stack` is transient algorithm state, not part of the
//! variable's persistent record) — it lives here as a local map keyed
//! by the original (`subscript == 0`) variable id.

use rustc_hash::FxHashMap;
use shecc_ir::{BlockId, Context, FuncId, Opcode, VarId};

type Stacks = FxHashMap<VarId, Vec<VarId>>;

pub(crate) fn rename(ctx: &mut Context, func: FuncId, order: &[BlockId]) {
    let entry = order[0];
    let mut stacks: Stacks = FxHashMap::default();
    // Parameters are pre-renamed to subscript 0 at function entry: the
    // parameter's own declared `VarId` already *is* subscript 0.
    for &p in &ctx.funcs.get(func).params.clone() {
        stacks.entry(p).or_default().push(p);
    }
    rename_block(ctx, entry, &mut stacks);
}

fn rename_block(ctx: &mut Context, b: BlockId, stacks: &mut Stacks) {
    let mut defined_here = Vec::new();
    let n = ctx.blocks.get(b).instructions.len();

    // φs live at the top of the block (inserted there by `phi::insert`);
    // give each a fresh destination subscript first.
    for idx in 0..n {
        if ctx.blocks.get(b).instructions[idx].op != Opcode::Phi {
            break;
        }
        let base = ctx.blocks.get(b).instructions[idx]
            .dest
            .expect("phi always carries a destination");
        let renamed = fresh(ctx, base, stacks, &mut defined_here);
        ctx.blocks.get_mut(b).instructions[idx].dest = Some(renamed);
        ctx.blocks.get_mut(b).symbol_list.push(renamed);
    }

    // Every other instruction, in program order: rewrite uses to the
    // current top-of-stack, then give the destination (if any) a fresh
    // subscript of its own.
    for idx in 0..n {
        if ctx.blocks.get(b).instructions[idx].op == Opcode::Phi {
            continue;
        }
        let (src0, src1) = {
            let instr = &ctx.blocks.get(b).instructions[idx];
            (instr.src0, instr.src1)
        };
        if let Some(s) = src0 {
            let renamed = current(s, stacks);
            ctx.blocks.get_mut(b).instructions[idx].src0 = Some(renamed);
        }
        if let Some(s) = src1 {
            let renamed = current(s, stacks);
            ctx.blocks.get_mut(b).instructions[idx].src1 = Some(renamed);
        }
        if let Some(d) = ctx.blocks.get(b).instructions[idx].dest {
            let renamed = fresh(ctx, d, stacks, &mut defined_here);
            ctx.blocks.get_mut(b).instructions[idx].dest = Some(renamed);
            ctx.blocks.get_mut(b).symbol_list.push(renamed);
        }
    }

    // Append this block's current value to every φ in each CFG
    // successor — whether or not that successor has been renamed yet:
    // an unrenamed φ destination's `base` is itself, so the lookup
    // below resolves correctly either way.
    for (succ, _) in ctx.blocks.get(b).successors() {
        let phi_count = ctx.blocks.get(succ).instructions.len();
        for sidx in 0..phi_count {
            if ctx.blocks.get(succ).instructions[sidx].op != Opcode::Phi {
                continue;
            }
            let phi_dest = ctx.blocks.get(succ).instructions[sidx].dest.unwrap();
            let base = ctx.var(phi_dest).base;
            let value = current(base, stacks);
            let already_filled = ctx.blocks.get(succ).instructions[sidx]
                .phi_operands
                .iter()
                .any(|(pred, _)| *pred == b);
            if !already_filled {
                ctx.blocks.get_mut(succ).instructions[sidx].phi_operands.push((b, value));
            }
        }
    }

    let children = ctx.blocks.get(b).dominance_children.clone();
    for c in children {
        rename_block(ctx, c, stacks);
    }

    for base in defined_here {
        stacks.get_mut(&base).expect("pushed before recursing").pop();
    }
}

fn fresh(ctx: &mut Context, base: VarId, stacks: &mut Stacks, defined_here: &mut Vec<VarId>) -> VarId {
    let subscript = stacks.entry(base).or_default().len() as u32;
    let id = if subscript == 0 { base } else { ctx.rename_var(base, subscript) };
    stacks.entry(base).or_default().push(id);
    defined_here.push(base);
    id
}

fn current(base: VarId, stacks: &Stacks) -> VarId {
    stacks.get(&base).and_then(|s| s.last().copied()).unwrap_or(base)
}

//! Local peephole rewrites on phase-2 IR (spec §4.G), applied to
//! fixpoint within each basic block. Rewrites never look past a label,
//! branch, or call — each block's instruction list is rewritten in
//! isolation, which the caller already guarantees by handing us one
//! block's `phase2_instructions` at a time.

use shecc_ir::{Context, FuncId, Opcode, Phase2Instr, RegOrSlot};

pub(crate) fn run(ctx: &mut Context, func: FuncId) {
    let blocks = ctx.funcs.get(func).bb_list.clone();
    for b in blocks {
        let mut instrs = std::mem::take(&mut ctx.blocks.get_mut(b).phase2_instructions);
        loop {
            let before = instrs.len();
            instrs = rewrite_once(instrs);
            if instrs.len() == before {
                break;
            }
        }
        ctx.blocks.get_mut(b).phase2_instructions = instrs;
    }
}

fn reg(o: RegOrSlot) -> Option<u8> {
    match o {
        RegOrSlot::Reg(r) => Some(r),
        _ => None,
    }
}

fn is_pow2(n: i32) -> Option<u32> {
    if n > 0 && (n & (n - 1)) == 0 {
        Some(n.trailing_zeros())
    } else {
        None
    }
}

/// Does one forward sweep, folding or dropping instructions where a
/// rewrite applies and copying everything else through unchanged. The
/// length strictly decreases whenever a rewrite fires, which is what
/// `run`'s fixpoint loop watches for.
fn rewrite_once(instrs: Vec<Phase2Instr>) -> Vec<Phase2Instr> {
    let mut out: Vec<Phase2Instr> = Vec::with_capacity(instrs.len());
    let mut i = 0;
    while i < instrs.len() {
        let cur = &instrs[i];

        // Identity / absorbing element / strength reduction on an
        // immediate second operand synthesized by `LoadConstant` just
        // before a binary op consuming it in the same register.
        if let Some((folded, consumed)) = fold_immediate_binop(&instrs, i) {
            match folded {
                Some(rewritten) => out.push(rewritten),
                None => {}
            }
            i += consumed;
            continue;
        }

        // Register-based self-ops: `x - x`, `x ^ x` -> 0; `x | x`, `x & x` -> x (drop).
        if let (Some(a), Some(b)) = (reg(cur.src0), reg(cur.src1)) {
            if a == b {
                match cur.op {
                    Opcode::Sub | Opcode::BitXor => {
                        let mut p = Phase2Instr::new(Opcode::LoadConstant);
                        p.dest = cur.dest;
                        p.src0 = RegOrSlot::Imm(0);
                        out.push(p);
                        i += 1;
                        continue;
                    }
                    Opcode::BitOr | Opcode::BitAnd | Opcode::LogAnd | Opcode::LogOr => {
                        if cur.dest == cur.src0 {
                            i += 1;
                            continue;
                        }
                        let mut p = Phase2Instr::new(Opcode::Assign);
                        p.dest = cur.dest;
                        p.src0 = cur.src0;
                        out.push(p);
                        i += 1;
                        continue;
                    }
                    Opcode::Eq | Opcode::Geq | Opcode::Leq => {
                        let mut p = Phase2Instr::new(Opcode::LoadConstant);
                        p.dest = cur.dest;
                        p.src0 = RegOrSlot::Imm(1);
                        out.push(p);
                        i += 1;
                        continue;
                    }
                    Opcode::Neq | Opcode::Lt | Opcode::Gt => {
                        let mut p = Phase2Instr::new(Opcode::LoadConstant);
                        p.dest = cur.dest;
                        p.src0 = RegOrSlot::Imm(0);
                        out.push(p);
                        i += 1;
                        continue;
                    }
                    _ => {}
                }
            }
        }

        // Double negation: two `Negate`/`LogNot` in a row over the same
        // register collapse to a plain move (or drop entirely when the
        // destination is already the source).
        if i + 1 < instrs.len() {
            let next = &instrs[i + 1];
            if cur.op == next.op
                && matches!(cur.op, Opcode::Negate | Opcode::LogNot | Opcode::BitNot)
                && reg(cur.dest).is_some()
                && cur.dest == next.src0
            {
                if next.dest == cur.src0 {
                    i += 2;
                    continue;
                }
                let mut p = Phase2Instr::new(Opcode::Assign);
                p.dest = next.dest;
                p.src0 = cur.src0;
                out.push(p);
                i += 2;
                continue;
            }
        }

        // Instruction fusion: a compute into register R immediately
        // followed by an unconditional move of R into the final
        // destination collapses into computing directly into that
        // destination, provided nothing else still needs R.
        if i + 1 < instrs.len() {
            let next = &instrs[i + 1];
            if next.op == Opcode::Assign && Some(next.src0) == Some(cur.dest) && reg(cur.dest).is_some() {
                let mut fused = cur.clone();
                fused.dest = next.dest;
                out.push(fused);
                i += 2;
                continue;
            }
        }

        // Dead-store elimination: two consecutive writes to the same
        // slot/global with nothing reading the first value in between.
        if cur.op == Opcode::Write {
            if let Some(next) = instrs.get(i + 1) {
                if next.op == Opcode::Write && next.src0 == cur.src0 && next.size == cur.size {
                    i += 1;
                    continue;
                }
            }
            // Store-to-load forwarding: a write immediately followed by
            // a read of the exact same address reuses the stored value
            // instead of reloading it.
            if let Some(next) = instrs.get(i + 1) {
                if next.op == Opcode::Read && next.src0 == cur.src0 && next.size == cur.size {
                    out.push(cur.clone());
                    let mut p = Phase2Instr::new(Opcode::Assign);
                    p.dest = next.dest;
                    p.src0 = cur.src1;
                    out.push(p);
                    i += 2;
                    continue;
                }
            }
        }

        // Redundant-load merging: two consecutive reads of the same
        // address into different registers — the second just copies
        // the first's result.
        if cur.op == Opcode::Read {
            if let Some(next) = instrs.get(i + 1) {
                if next.op == Opcode::Read && next.src0 == cur.src0 && next.size == cur.size {
                    out.push(cur.clone());
                    let mut p = Phase2Instr::new(Opcode::Assign);
                    p.dest = next.dest;
                    p.src0 = cur.dest;
                    out.push(p);
                    i += 2;
                    continue;
                }
            }
        }

        out.push(cur.clone());
        i += 1;
    }
    out
}

/// Folds `LoadConstant r, k` immediately followed by a binary op
/// consuming `r` as its second operand: identities (`+0`, `*1`, `&-1`,
/// `|0`, `^0`, `<<0`, `>>0`), the absorbing element (`*0`), and
/// power-of-two strength reduction for `*`/`/`/`%`.
///
/// Returns `(replacement_instruction, units_consumed)` where
/// `replacement_instruction` is `None` when the binop collapses to a
/// pure identity (drop both instructions).
fn fold_immediate_binop(instrs: &[Phase2Instr], i: usize) -> Option<(Option<Phase2Instr>, usize)> {
    let load = &instrs[i];
    if load.op != Opcode::LoadConstant {
        return None;
    }
    let next = instrs.get(i + 1)?;
    let k_reg = reg(load.dest)?;
    if reg(next.src1) != Some(k_reg) {
        return None;
    }
    let k = match load.src0 {
        RegOrSlot::Imm(v) => v,
        _ => return None,
    };
    let dest_is_src0 = next.dest == next.src0;

    let identity = || {
        if !dest_is_src0 {
            let mut p = Phase2Instr::new(Opcode::Assign);
            p.dest = next.dest;
            p.src0 = next.src0;
            Some(p)
        } else {
            None
        }
    };

    match next.op {
        Opcode::Add | Opcode::Sub | Opcode::BitOr | Opcode::BitXor | Opcode::Lshift | Opcode::Rshift if k == 0 => {
            Some((identity(), 2))
        }
        Opcode::Mul if k == 1 => Some((identity(), 2)),
        Opcode::BitAnd if k == -1 => Some((identity(), 2)),
        Opcode::Mul if k == 0 => {
            let mut p = Phase2Instr::new(Opcode::LoadConstant);
            p.dest = next.dest;
            p.src0 = RegOrSlot::Imm(0);
            Some((Some(p), 2))
        }
        Opcode::Mul if is_pow2(k).is_some() => {
            let mut p = Phase2Instr::new(Opcode::Lshift);
            p.dest = next.dest;
            p.src0 = next.src0;
            p.src1 = RegOrSlot::Imm(is_pow2(k).unwrap() as i32);
            Some((Some(p), 2))
        }
        Opcode::Div if is_pow2(k).is_some() => {
            let mut p = Phase2Instr::new(Opcode::Rshift);
            p.dest = next.dest;
            p.src0 = next.src0;
            p.src1 = RegOrSlot::Imm(is_pow2(k).unwrap() as i32);
            Some((Some(p), 2))
        }
        Opcode::Mod if is_pow2(k).is_some() => {
            let mut p = Phase2Instr::new(Opcode::BitAnd);
            p.dest = next.dest;
            p.src0 = next.src0;
            p.src1 = RegOrSlot::Imm(k - 1);
            Some((Some(p), 2))
        }
        _ => None,
    }
}

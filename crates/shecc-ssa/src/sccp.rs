//! SCCP-style constant/branch folding (spec §4.E): walks RPO to
//! fixpoint, propagating constants through `assign`/`unwound_phi`
//! copies, folding `add`/`sub`/`mul` and the integer compares, folding
//! `trunc`/`sign_ext` of a constant, and turning a `branch` on a
//! constant condition into a `jump` with the un-taken edge detached.
//!
//! Because the IR is SSA, a destination's constant-ness (once proven)
//! holds everywhere that destination is used — no per-block lattice
//! merge is needed, only a single `VarId → i32` map refined to
//! fixpoint.

use rustc_hash::FxHashMap;
use shecc_ir::{BlockId, Context, FuncId, Opcode, Phase1Instr, VarId};

pub(crate) fn run(ctx: &mut Context, func: FuncId) {
    let order = ctx.block_ids_of(func);
    let mut consts: FxHashMap<VarId, i32> = FxHashMap::default();
    let mut changed = true;

    while changed {
        changed = false;
        for &b in &order {
            let n = ctx.blocks.get(b).instructions.len();
            for idx in 0..n {
                if fold_instruction(ctx, b, idx, &mut consts) {
                    changed = true;
                }
            }
            if fold_branch_terminator(ctx, b, &consts) {
                changed = true;
            }
        }
    }
}

fn fold_instruction(ctx: &mut Context, b: BlockId, idx: usize, consts: &mut FxHashMap<VarId, i32>) -> bool {
    let instr = ctx.blocks.get(b).instructions[idx].clone();
    match instr.op {
        Opcode::LoadConstant => {
            if let (Some(d), Some(c)) = (instr.dest, instr.constant) {
                return record(consts, d, c);
            }
            false
        }
        Opcode::Assign | Opcode::UnwoundPhi => {
            let (Some(d), Some(s)) = (instr.dest, instr.src0) else { return false };
            let Some(&c) = consts.get(&s) else { return false };
            let updated = record(consts, d, c);
            replace_with_constant(ctx, b, idx, d, c);
            updated || true
        }
        Opcode::Trunc | Opcode::SignExt => {
            let (Some(d), Some(s)) = (instr.dest, instr.src0) else { return false };
            let Some(&c) = consts.get(&s) else { return false };
            if !matches!(instr.size, 1 | 2 | 4) {
                return false;
            }
            let folded = match instr.op {
                Opcode::Trunc => truncate(c, instr.size),
                Opcode::SignExt => sign_extend(c, instr.size),
                _ => unreachable!(),
            };
            let updated = record(consts, d, folded);
            replace_with_constant(ctx, b, idx, d, folded);
            updated || true
        }
        Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Eq | Opcode::Neq | Opcode::Lt | Opcode::Leq
        | Opcode::Gt | Opcode::Geq => {
            let (Some(d), Some(s0), Some(s1)) = (instr.dest, instr.src0, instr.src1) else { return false };
            let (Some(&a), Some(&rhs)) = (consts.get(&s0), consts.get(&s1)) else { return false };
            let folded = fold_binop(instr.op, a, rhs);
            let updated = record(consts, d, folded);
            replace_with_constant(ctx, b, idx, d, folded);
            updated || true
        }
        _ => false,
    }
}

fn record(consts: &mut FxHashMap<VarId, i32>, var: VarId, value: i32) -> bool {
    consts.insert(var, value) != Some(value)
}

fn replace_with_constant(ctx: &mut Context, b: BlockId, idx: usize, dest: VarId, value: i32) {
    let mut instr = Phase1Instr::new(Opcode::LoadConstant);
    instr.dest = Some(dest);
    instr.constant = Some(value);
    ctx.blocks.get_mut(b).instructions[idx] = instr;
}

fn fold_binop(op: Opcode, a: i32, b: i32) -> i32 {
    match op {
        Opcode::Add => a.wrapping_add(b),
        Opcode::Sub => a.wrapping_sub(b),
        Opcode::Mul => a.wrapping_mul(b),
        Opcode::Eq => i32::from(a == b),
        Opcode::Neq => i32::from(a != b),
        Opcode::Lt => i32::from(a < b),
        Opcode::Leq => i32::from(a <= b),
        Opcode::Gt => i32::from(a > b),
        Opcode::Geq => i32::from(a >= b),
        _ => unreachable!("not one of the foldable binops"),
    }
}

fn truncate(value: i32, size: u8) -> i32 {
    match size {
        1 => value as i8 as i32,
        2 => value as i16 as i32,
        _ => value,
    }
}

fn sign_extend(value: i32, size: u8) -> i32 {
    truncate(value, size)
}

/// A `branch` on a provably constant condition becomes a `jump`; the
/// un-taken successor is detached from both the block's outgoing edge
/// and the target's predecessor list.
fn fold_branch_terminator(ctx: &mut Context, b: BlockId, consts: &FxHashMap<VarId, i32>) -> bool {
    let Some(last) = ctx.blocks.get(b).instructions.last().cloned() else { return false };
    if last.op != Opcode::Branch {
        return false;
    }
    let Some(cond) = last.src0 else { return false };
    let Some(&c) = consts.get(&cond) else { return false };

    let blk = ctx.blocks.get(b);
    let (Some(then_), Some(else_)) = (blk.then_, blk.else_) else { return false };
    let (target, dead) = if c != 0 { (then_, else_) } else { (else_, then_) };

    let blk = ctx.blocks.get_mut(b);
    blk.then_ = None;
    blk.else_ = None;
    blk.next = Some(target);
    if let Some(terminator) = blk.instructions.last_mut() {
        terminator.op = Opcode::Jump;
        terminator.src0 = None;
        terminator.false_label = None;
    }
    ctx.blocks.get_mut(dead).predecessors.retain(|(p, _)| *p != b);
    true
}

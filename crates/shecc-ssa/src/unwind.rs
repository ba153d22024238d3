//! φ unwinding (spec §4.D.8): before register allocation, every φ is
//! replaced by one `unwound_phi rd ← rs` copy appended to the end of
//! each predecessor block, immediately ahead of that block's terminator
//! if it has one.

use shecc_ir::{BlockId, Context, Opcode, Phase1Instr};

pub(crate) fn unwind_phis(ctx: &mut Context, order: &[BlockId]) {
    for &b in order {
        let phis: Vec<Phase1Instr> = ctx
            .blocks
            .get(b)
            .instructions
            .iter()
            .filter(|i| i.op == Opcode::Phi)
            .cloned()
            .collect();
        if phis.is_empty() {
            continue;
        }
        for phi in &phis {
            let dest = phi.dest.expect("phi always carries a destination");
            for &(pred, value) in &phi.phi_operands {
                append_copy(ctx, pred, dest, value);
            }
        }
        ctx.blocks.get_mut(b).instructions.retain(|i| i.op != Opcode::Phi);
    }
}

fn append_copy(ctx: &mut Context, pred: BlockId, dest: shecc_ir::VarId, src: shecc_ir::VarId) {
    let mut instr = Phase1Instr::new(Opcode::UnwoundPhi);
    instr.dest = Some(dest);
    instr.src0 = Some(src);

    let instrs = &mut ctx.blocks.get_mut(pred).instructions;
    let at = match instrs.last() {
        Some(last) if last.op.is_terminator() => instrs.len() - 1,
        _ => instrs.len(),
    };
    instrs.insert(at, instr);
}

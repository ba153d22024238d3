//! Architecture lowering, local peephole rewrites, and the ARM/RISC-V
//! encoders (spec §4.G, §4.H). Takes the register allocator's phase-2
//! IR and produces a finished [`shecc_elf::ElfImage`] ready to write to
//! disk.
//!
//! The global-data pointer (`r12` on ARM, `gp` on RISC-V) is loaded
//! once at program start with `.data`'s absolute load address, which is
//! only known once the code segment's length is final — hence the
//! two-step `code_len`/`encode` split in each architecture module.

mod arm;
mod layout;
mod peephole;
mod riscv;

use shecc_ir::{Context, FuncId, Opcode, Result, Target};

/// Marks each block's `Branch` instruction — on both the `BasicBlock`
/// and its lowered `Phase2Instr` — as detached when `else_` is not the
/// block immediately following it in layout (`bb_list`) order. A
/// detached branch needs an extra unconditional jump to `else_`; an
/// attached one just falls through.
fn mark_branch_detachment(ctx: &mut Context, func: FuncId) {
    let bb_list = ctx.funcs.get(func).bb_list.clone();
    for (i, &b) in bb_list.iter().enumerate() {
        let Some(else_block) = ctx.blocks.get(b).else_ else { continue };
        let falls_through = bb_list.get(i + 1).copied() == Some(else_block);
        let detached = !falls_through;
        ctx.blocks.get_mut(b).is_branch_detached = detached;
        if let Some(instr) = ctx
            .blocks
            .get_mut(b)
            .phase2_instructions
            .iter_mut()
            .find(|ins| ins.op == Opcode::Branch)
        {
            instr.is_branch_detached = detached;
        }
    }
}

/// Runs lowering (peephole + branch detachment) and the target's
/// two-pass encoder over every function in `ctx`, returning a finished
/// image containing `.text`, `.data`, and the symbol table.
pub fn compile(ctx: &mut Context) -> Result<shecc_elf::ElfImage> {
    let funcs: Vec<FuncId> = ctx.funcs.iter().map(|(id, _)| id).collect();
    for &f in &funcs {
        peephole::run(ctx, f);
        mark_branch_detachment(ctx, f);
    }

    let machine = match ctx.options.target {
        Target::Arm => shecc_elf::Machine::Arm,
        Target::RiscV32 => shecc_elf::Machine::RiscV,
    };

    let code_len = match ctx.options.target {
        Target::Arm => arm::code_len(ctx, &funcs),
        Target::RiscV32 => riscv::code_len(ctx, &funcs),
    };
    let data_base = shecc_elf::ELF_START + shecc_elf::HEADER_LEN + code_len;
    tracing::debug!(?machine, code_len, data_base, "backend: data segment placed");

    let (words, syms) = match ctx.options.target {
        Target::Arm => arm::encode(ctx, &funcs, data_base)?,
        Target::RiscV32 => riscv::encode(ctx, &funcs, data_base)?,
    };

    let mut code = Vec::with_capacity(words.len() * 4);
    for w in words {
        code.extend_from_slice(&w.to_le_bytes());
    }

    let mut image = shecc_elf::ElfImage::new(machine);
    image.code = code;
    image.data = ctx.data_section.clone();
    image.symbols = syms
        .into_iter()
        .map(|(name, value)| shecc_elf::Symbol { name: ctx.interner.resolve(name).to_string(), value })
        .collect();
    Ok(image)
}

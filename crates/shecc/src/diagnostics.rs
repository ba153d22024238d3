//! Located error printing (spec §7) and the `--dump-ir` listing.

use shecc_ir::{CompileError, Context};

/// Formats a [`CompileError`] the way spec §7 describes: `Error
/// <message> at <file>:<line>:<column>` for errors anchored to a
/// source location, and a bare `Error <message>` for the handful that
/// aren't (backend/IO failures have no textual position to report).
pub fn format_error(err: &CompileError, ctx: &Context) -> String {
    match err.loc() {
        Some(loc) => format!("Error {err} at {}", loc.display(&ctx.interner)),
        None => format!("Error {err}"),
    }
}

pub fn elf_err(err: shecc_elf::ElfError) -> CompileError {
    match err {
        shecc_elf::ElfError::Io(e) => CompileError::Io(e),
    }
}

/// Prints every function's phase-1 IR, one instruction per line. A
/// debugging aid, not a stable format: shapes follow `Phase1Instr`'s
/// derived `Debug`.
pub fn dump_ir(ctx: &Context) {
    for (id, func) in ctx.funcs.iter() {
        eprintln!("function {} ({:?})", ctx.interner.resolve(func.name), id);
        for &bb in &func.bb_list {
            let block = ctx.blocks.get(bb);
            eprintln!("  block {bb:?}:");
            for instr in &block.instructions {
                eprintln!("    {instr:?}");
            }
        }
    }
}

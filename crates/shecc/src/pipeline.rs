//! Orchestrates the whole compilation (spec §4): lex, optionally
//! prepend the bundled libc token stream, preprocess, parse, run SSA
//! construction and SCCP per function, allocate registers, lower and
//! encode, then write the finished image.

use std::path::Path;

use shecc_ir::{Context, Result, TokenKind};
use tracing::info;

use crate::loader::FsLoader;

/// Runs the whole pipeline against a caller-owned `Context`, so a
/// failing compilation still leaves its interner alive for the caller
/// to resolve the error's `SourceLoc` against.
pub fn run(input: &Path, ctx: &mut Context) -> Result<()> {
    let main_path = input.to_string_lossy().to_string();
    let main_text = std::fs::read_to_string(input)?;
    let main_file = ctx.intern(&main_path);

    let mut tokens = Vec::new();
    if ctx.options.include_libc {
        let libc_file = ctx.intern(crate::libc::FILE_NAME);
        let mut libc_tokens = shecc_lex::lex(&crate::libc::source(), libc_file, &mut ctx.interner)?;
        // Drop the bundled source's own EOF marker so its tokens splice
        // directly ahead of the user file's, the same way the original
        // build concatenated `LIBC_SRC`'s token list with the input's.
        if matches!(libc_tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            libc_tokens.pop();
        }
        info!(tokens = libc_tokens.len(), "prepended bundled libc");
        tokens.extend(libc_tokens);
    }
    tokens.extend(shecc_lex::lex(&main_text, main_file, &mut ctx.interner)?);

    let mut loader = FsLoader;
    let tokens = shecc_pp::preprocess(tokens, main_file, ctx, &mut loader)?;

    shecc_parse::parse(tokens, ctx)?;

    let funcs: Vec<_> = ctx.funcs.iter().map(|(id, _)| id).collect();
    for &f in &funcs {
        shecc_ssa::build_ssa(ctx, f);
        shecc_ssa::run_sccp(ctx, f);
    }

    shecc_regalloc::layout_globals(ctx);
    for &f in &funcs {
        shecc_regalloc::allocate(ctx, f)?;
    }

    if ctx.options.dump_ir {
        crate::diagnostics::dump_ir(ctx);
    }

    let image = shecc_backend::compile(ctx)?;
    image.write(&ctx.options.output_path).map_err(crate::diagnostics::elf_err)?;

    info!(output = %ctx.options.output_path.display(), "wrote ELF image");
    Ok(())
}

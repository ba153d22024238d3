//! Linear-scan register allocation (spec §4.F): lowers a function's
//! unwound, constant-folded phase-1 IR into phase-2 IR over a fixed
//! register budget and a monotonic stack frame.
//!
//! Global-variable data-section layout (`layout_globals`) must run once
//! per compilation, before any function's `allocate`, since the
//! data-section offset a global gets here is what every function's
//! `load`/`store` of that global encodes.

mod globals_layout;
mod lastuse;
mod regfile;
mod scan;
mod slots;

use shecc_ir::{CompileError, Context, FuncId, Result};

/// Assign every global variable its data-section offset.
pub fn layout_globals(ctx: &mut Context) {
    globals_layout::layout(ctx);
}

/// Allocate registers and stack slots for one function, turning its
/// phase-1 instructions into phase-2 ones in place.
pub fn allocate(ctx: &mut Context, func: FuncId) -> Result<()> {
    lastuse::compute(ctx, func);
    scan::run(ctx, func);

    let stack_size = ctx.funcs.get(func).stack_size;
    if stack_size > shecc_ir::MAX_STACK_SIZE {
        return Err(CompileError::StackOverflow { loc: ctx.funcs.get(func).decl_loc });
    }
    Ok(())
}

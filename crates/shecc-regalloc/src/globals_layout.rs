//! Global-variable layout into the data section (spec §3 "Variable":
//! `offset` is "stack offset (locals) or data-section offset
//! (globals)"). Runs once per compilation, ahead of any function's
//! per-block allocation, since a global's address must be stable
//! across every function that references it.

use shecc_ir::{align4, Context};

use crate::slots::elem_size;

pub(crate) fn layout(ctx: &mut Context) {
    for var in ctx.globals.clone() {
        let size = elem_size(ctx, var);
        let padded = align4(ctx.data_section.len() as i32);
        while (ctx.data_section.len() as i32) < padded {
            ctx.data_section.push(0);
        }
        let offset = ctx.data_section.len() as i32;
        let value = ctx.var(var).init_val.unwrap_or(0);
        if size == 1 {
            ctx.data_section.push(value as u8);
        } else {
            ctx.data_section.extend_from_slice(&value.to_le_bytes());
        }
        ctx.var_mut(var).offset = offset;
    }
}

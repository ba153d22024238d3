//! Stack-slot assignment (spec §4.F: "Allocate a 4-byte stack slot on
//! first spill; slots are monotonic"). A slot is only handed out the
//! first time a variable actually needs one — either because it's
//! spilled out of a register, or because its address was taken and it
//! can never live in a register at all (`address_of`/`allocat` in
//! `scan.rs` go straight to a slot, bypassing the register path).

use rustc_hash::FxHashMap;
use shecc_ir::{BaseKind, Context, VarId};

pub(crate) struct SlotAllocator {
    next_offset: i32,
    assigned: FxHashMap<VarId, i32>,
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self { next_offset: 0, assigned: FxHashMap::default() }
    }

    /// The stack offset for `var`, assigning one on first request. The
    /// variable's own `offset` field is kept in sync so later phases
    /// (layout, debugging) can read it straight off the `Variable`.
    pub fn slot_for(&mut self, ctx: &mut Context, var: VarId) -> i32 {
        if let Some(&off) = self.assigned.get(&var) {
            return off;
        }
        let size = slot_size(ctx, var);
        let off = self.next_offset;
        self.next_offset += size;
        self.assigned.insert(var, off);
        ctx.var_mut(var).offset = off;
        off
    }

    /// Total bytes of local storage handed out so far, rounded to the
    /// platform's 4-byte alignment.
    pub fn total_size(&self) -> i32 {
        shecc_ir::align4(self.next_offset)
    }
}

fn slot_size(ctx: &Context, var: VarId) -> i32 {
    let v = ctx.var(var);
    if v.array_size > 0 {
        shecc_ir::align4(v.array_size * elem_size(ctx, var))
    } else {
        4
    }
}

pub(crate) fn elem_size(ctx: &Context, var: VarId) -> i32 {
    let v = ctx.var(var);
    if v.ptr_depth > 0 {
        4
    } else if ctx.types.get(v.type_id).base_kind == BaseKind::Char {
        1
    } else {
        4
    }
}

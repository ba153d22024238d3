//! Lvalue discipline (spec §4.C "Lvalue discipline"): the one place
//! that decides whether an operand is a plain SSA-friendly variable or
//! needs an actual memory access, and the only site that emits
//! `address_of`/`read`/`write`.

use shecc_ir::{BaseKind, BlockId, Opcode, Phase1Instr, Result, TypeId, VarId};

use crate::Parser;

/// The result of resolving a postfix expression chain down to something
/// that can be loaded from or stored to.
#[derive(Clone, Copy)]
pub(crate) enum Addressable {
    /// A plain named variable: no memory indirection needed at all,
    /// since phase1 IR treats locals/globals as SSA-friendly operands
    /// directly (dataflow, not storage, is what SSA construction scans
    /// for in §4.D.5).
    Var(VarId),
    /// An address already computed into `addr`; loading/storing through
    /// it requires an explicit `read`/`write` of `size` bytes.
    Indirect { addr: VarId, ty: TypeId, ptr_depth: u8, size: u8 },
}

impl Addressable {
    pub(crate) fn ty_ptr(&self, p: &Parser<'_, '_>) -> (TypeId, u8, i32) {
        match *self {
            Addressable::Var(v) => {
                let var = p.ctx.var(v);
                (var.type_id, var.ptr_depth, var.array_size)
            }
            Addressable::Indirect { ty, ptr_depth, .. } => (ty, ptr_depth, 0),
        }
    }
}

impl<'a, 'b> Parser<'a, 'b> {
    /// Element size in bytes for a scalar/pointer of this shape: 1 for
    /// a bare `char`, 4 otherwise (int, any pointer, struct-by-address).
    pub(crate) fn elem_size(&self, ty: TypeId, ptr_depth: u8) -> u8 {
        if ptr_depth > 0 {
            return 4;
        }
        if self.ctx.types.get(ty).base_kind == BaseKind::Char {
            1
        } else {
            4
        }
    }

    /// Read the value named by `addr_of`, materializing a `read`
    /// instruction only when actual memory indirection is involved. A
    /// bare (non-pointer) `char` is sign-extended right after the load
    /// (spec §9: `char` is signed 8-bit) so a byte of `0xff` compares
    /// equal to `-1` rather than to `255`.
    pub(crate) fn load(&mut self, block: BlockId, a: Addressable) -> VarId {
        match a {
            Addressable::Var(v) => v,
            Addressable::Indirect { addr, ty, ptr_depth, size } => {
                let dest = self.new_temp(ty, ptr_depth, 0);
                let mut instr = Phase1Instr::new(Opcode::Read);
                instr.dest = Some(dest);
                instr.src0 = Some(addr);
                instr.size = size;
                self.emit(block, instr);
                if size == 1 && ptr_depth == 0 && self.ctx.types.get(ty).base_kind == BaseKind::Char {
                    let mut ext = Phase1Instr::new(Opcode::SignExt);
                    ext.dest = Some(dest);
                    ext.src0 = Some(dest);
                    self.emit(block, ext);
                }
                dest
            }
        }
    }

    /// Store `rhs` into `a`, returning the value of the assignment
    /// expression (`rhs` itself, per C's "assignment yields its
    /// right-hand value" rule).
    pub(crate) fn store(&mut self, block: BlockId, a: Addressable, rhs: VarId) -> VarId {
        match a {
            Addressable::Var(v) => {
                let mut instr = Phase1Instr::new(Opcode::Assign);
                instr.dest = Some(v);
                instr.src0 = Some(rhs);
                self.emit(block, instr);
                rhs
            }
            Addressable::Indirect { addr, size, .. } => {
                let mut instr = Phase1Instr::new(Opcode::Write);
                instr.src0 = Some(addr);
                instr.src1 = Some(rhs);
                instr.size = size;
                self.emit(block, instr);
                rhs
            }
        }
    }

    /// `&a` — the address of `a` as a value. For a plain variable this
    /// is `address_of`; for an already-indirect addressable it is the
    /// address itself (no new instruction needed).
    pub(crate) fn address_of(&mut self, block: BlockId, a: Addressable) -> VarId {
        match a {
            Addressable::Var(v) => {
                let var = self.ctx.var(v);
                let (ty, ptr_depth) = (var.type_id, var.ptr_depth + 1);
                let dest = self.new_temp(ty, ptr_depth, 0);
                let mut instr = Phase1Instr::new(Opcode::AddressOf);
                instr.dest = Some(dest);
                instr.src0 = Some(v);
                self.emit(block, instr);
                dest
            }
            Addressable::Indirect { addr, .. } => addr,
        }
    }

    /// Compute `base_addr + index * elem_size`, scaling the index by
    /// the pointee's size the way C's pointer arithmetic requires.
    pub(crate) fn scaled_add(&mut self, block: BlockId, base: VarId, index: VarId, elem_size: i32) -> VarId {
        if elem_size == 1 {
            return self.emit_binop(block, Opcode::Add, base, index);
        }
        let scale = self.load_constant(block, elem_size);
        let scaled = self.emit_binop(block, Opcode::Mul, index, scale);
        self.emit_binop(block, Opcode::Add, base, scaled)
    }
}

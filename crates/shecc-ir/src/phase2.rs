//! Phase-2 IR: three-address code over physical registers and stack
//! offsets, produced by the register allocator (§4.F) and consumed by
//! architecture lowering, peephole, and the encoders (§4.G, §4.H).

use crate::interner::Symbol;
use crate::phase1::Opcode;

/// An operand of phase-2 IR: either a physical register index or a
/// stack-frame byte offset.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RegOrSlot {
    Reg(u8),
    Slot(i32),
    Imm(i32),
    None,
}

/// Phase-2 opcode. A strict subset of `Opcode` survives past register
/// allocation: SSA-only forms (`Phi`) are unwound before this point, and
/// storage-reservation forms (`Allocat`) have already been turned into
/// concrete slot assignments.
pub type Phase2Op = Opcode;

#[derive(Clone, Debug)]
pub struct Phase2Instr {
    pub op: Phase2Op,
    pub dest: RegOrSlot,
    pub src0: RegOrSlot,
    pub src1: RegOrSlot,
    pub func_name: Option<Symbol>,
    pub true_label: Option<Symbol>,
    pub false_label: Option<Symbol>,
    pub label: Option<Symbol>,
    pub size: u8,
    /// Set by architecture lowering when the `else_` successor is not
    /// the immediately following block in layout order, requiring the
    /// long branch encoding (§4.G).
    pub is_branch_detached: bool,
}

impl Phase2Instr {
    pub fn new(op: Phase2Op) -> Self {
        Self {
            op,
            dest: RegOrSlot::None,
            src0: RegOrSlot::None,
            src1: RegOrSlot::None,
            func_name: None,
            true_label: None,
            false_label: None,
            label: None,
            size: 4,
            is_branch_detached: false,
        }
    }
}

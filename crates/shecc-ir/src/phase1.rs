//! Phase-1 IR: three-address code over symbolic variables, and the
//! basic-block / function graph it lives in (spec §3 "Phase-1 IR
//! instruction", "Basic block", "Function").

use crate::arena::BlockId;
use crate::interner::Symbol;
use crate::var::VarId;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Opcode {
    Allocat,
    LoadConstant,
    LoadDataAddress,
    Assign,
    AddressOf,
    Read,
    Write,
    Branch,
    Jump,
    Label,
    Push,
    Call,
    Indirect,
    FuncRet,
    Return,
    BlockStart,
    BlockEnd,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lshift,
    Rshift,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    LogAnd,
    LogOr,
    LogNot,
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    Negate,
    Phi,
    UnwoundPhi,
    SignExt,
    Trunc,
}

impl Opcode {
    pub fn is_binary_arith(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            Add | Sub
                | Mul
                | Div
                | Mod
                | Lshift
                | Rshift
                | BitAnd
                | BitOr
                | BitXor
                | Eq
                | Neq
                | Lt
                | Leq
                | Gt
                | Geq
        )
    }

    pub fn is_terminator(self) -> bool {
        matches!(self, Opcode::Branch | Opcode::Jump | Opcode::Return)
    }
}

/// A three-address phase-1 instruction. Not every field is meaningful
/// for every opcode; see the op-specific constructors below for the
/// fields each opcode actually uses.
#[derive(Clone, Debug)]
pub struct Phase1Instr {
    pub op: Opcode,
    pub dest: Option<VarId>,
    pub src0: Option<VarId>,
    pub src1: Option<VarId>,
    pub size: u8,
    pub func_name: Option<Symbol>,
    pub param_num: u8,
    /// For `load_constant`.
    pub constant: Option<i32>,
    /// For `branch`/`jump`: symbolic label targets, resolved to block
    /// ids once the CFG is fully built.
    pub true_label: Option<Symbol>,
    pub false_label: Option<Symbol>,
    /// For `label`.
    pub label: Option<Symbol>,
    /// For `phi`: one `(predecessor_block, value)` pair per incoming
    /// edge. A basic block's predecessor count isn't bounded at two the
    /// way its *outgoing* edges are (`next` xor `then_`/`else_`), since
    /// several distinct blocks can all jump into the same successor, so
    /// a phi needs an operand list rather than the fixed `src0`/`src1`
    /// pair every other opcode gets by with.
    pub phi_operands: Vec<(BlockId, VarId)>,
}

impl Phase1Instr {
    pub fn new(op: Opcode) -> Self {
        Self {
            op,
            dest: None,
            src0: None,
            src1: None,
            size: 4,
            func_name: None,
            param_num: 0,
            constant: None,
            true_label: None,
            false_label: None,
            label: None,
            phi_operands: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EdgeKind {
    Next,
    Then,
    Else,
}

/// A basic block. Control-flow shape invariant: a block has `next` xor
/// (`then_` and `else_`) — enforced by `BasicBlock::set_next` /
/// `set_branch` being the only mutators of those fields.
#[derive(Clone, Debug, Default)]
pub struct BasicBlock {
    pub instructions: Vec<Phase1Instr>,
    pub phase2_instructions: Vec<crate::phase2::Phase2Instr>,
    pub next: Option<BlockId>,
    pub then_: Option<BlockId>,
    pub else_: Option<BlockId>,
    pub predecessors: Vec<(BlockId, EdgeKind)>,
    pub rpo: i32,
    pub rpo_r: i32,
    pub idom: Option<BlockId>,
    pub dominance_children: Vec<BlockId>,
    pub dominance_frontier: Vec<BlockId>,
    pub live_gen: Vec<VarId>,
    pub live_kill: Vec<VarId>,
    pub live_in: Vec<VarId>,
    pub live_out: Vec<VarId>,
    pub scope_depth: u32,
    pub symbol_list: Vec<VarId>,
    pub visited: bool,
    pub is_branch_detached: bool,
}

impl BasicBlock {
    pub fn new() -> Self {
        Self {
            rpo: -1,
            rpo_r: -1,
            ..Default::default()
        }
    }

    pub fn set_next(&mut self, target: BlockId) {
        debug_assert!(self.then_.is_none() && self.else_.is_none());
        self.next = Some(target);
    }

    pub fn set_branch(&mut self, then_: BlockId, else_: BlockId) {
        debug_assert!(self.next.is_none());
        self.then_ = Some(then_);
        self.else_ = Some(else_);
    }

    pub fn successors(&self) -> Vec<(BlockId, EdgeKind)> {
        let mut out = Vec::new();
        if let Some(n) = self.next {
            out.push((n, EdgeKind::Next));
        }
        if let Some(t) = self.then_ {
            out.push((t, EdgeKind::Then));
        }
        if let Some(e) = self.else_ {
            out.push((e, EdgeKind::Else));
        }
        out
    }
}

#[derive(Clone, Debug)]
pub struct Function {
    pub name: Symbol,
    pub return_type: crate::types::TypeId,
    pub params: Vec<VarId>,
    pub is_variadic: bool,
    pub entry_bb: BlockId,
    pub exit_bb: BlockId,
    pub stack_size: i32,
    pub params_size: i32,
    /// Blocks belonging to this function in RPO order, populated once
    /// SSA construction numbers the CFG.
    pub bb_list: Vec<BlockId>,
    /// Where the function was declared, for diagnostics that apply to
    /// the function as a whole (e.g. a stack-size overflow) rather than
    /// to any one instruction.
    pub decl_loc: crate::source::SourceLoc,
}

impl Function {
    pub fn new(
        name: Symbol,
        return_type: crate::types::TypeId,
        entry_bb: BlockId,
        exit_bb: BlockId,
        decl_loc: crate::source::SourceLoc,
    ) -> Self {
        Self {
            name,
            return_type,
            params: Vec::new(),
            is_variadic: false,
            entry_bb,
            exit_bb,
            decl_loc,
            stack_size: 0,
            params_size: 0,
            bb_list: Vec::new(),
        }
    }
}

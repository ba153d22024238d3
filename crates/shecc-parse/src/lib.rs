//! Parser and phase-1 IR builder: turns an already-preprocessed token
//! stream into a list of functions, each with its own basic-block graph
//! and three-address phase-1 instructions (spec §4.C).
//!
//! Nothing here performs SSA construction, optimization, or register
//! allocation — those are `shecc-ssa` and `shecc-regalloc`'s jobs. This
//! crate's only output is the raw, not-yet-SSA `Function`/`BasicBlock`
//! graph recorded into the shared `Context`.

mod constfold;
mod cursor;
mod decl;
mod expr;
mod lvalue;
mod stmt;
mod types_parse;

use rustc_hash::FxHashMap;
use shecc_ir::{
    BasicBlock, BlockId, Context, FuncId, Opcode, Phase1Instr, Result, Symbol, TypeId, VarId,
    Variable, MAX_LOCALS,
};
use tracing::trace;

use crate::cursor::Cursor;
use crate::lvalue::Addressable;
use crate::types_parse::BaseTypes;

/// Parse a complete translation unit, populating `ctx.funcs`/`ctx.types`
/// with every function, global, and type the source defines.
pub fn parse(tokens: Vec<Token>, ctx: &mut Context) -> Result<()> {
    let filtered = cursor::filter_trivia(tokens);
    let base_types = types_parse::register_base_types(ctx);
    let mut parser = Parser {
        ctx,
        cursor: Cursor::new(&filtered),
        base_types,
        funcs_by_name: FxHashMap::default(),
        enum_constants: FxHashMap::default(),
        typedef_shapes: FxHashMap::default(),
        scopes: vec![FxHashMap::default()],
        func: None,
        label_counter: 0,
    };
    parser.parse_translation_unit()
}

pub use shecc_ir::Token;

struct FuncState {
    id: FuncId,
    locals_count: usize,
    loop_stack: Vec<LoopTargets>,
    switch_stack: Vec<SwitchState>,
    side_effects: Vec<(Addressable, VarId)>,
    nesting: usize,
}

/// `break_block` is where a `break` statement jumps; `continue_block` is
/// `None` for a `switch` frame, since `continue` always targets the
/// nearest enclosing *loop*, skipping over switch frames.
#[derive(Clone, Copy)]
struct LoopTargets {
    break_block: BlockId,
    continue_block: Option<BlockId>,
}

/// Per-`switch` bookkeeping for lowering `case`/`default` into a chain
/// of equality tests against `switch_val` (spec §4.C "Switch"). Each
/// `case` label emits a compare in `test_block` and advances it to a
/// freshly allocated block; `default_block`, if seen, becomes the
/// chain's final fallback instead of `after_block`.
struct SwitchState {
    switch_val: VarId,
    test_block: BlockId,
    after_block: BlockId,
    default_block: Option<BlockId>,
}

pub(crate) struct Parser<'a, 'b> {
    ctx: &'a mut Context,
    cursor: Cursor<'b>,
    base_types: BaseTypes,
    /// Function prototypes/definitions seen so far, by name. `ctx.funcs`
    /// is a plain arena (no name index, per `shecc-ir`'s "IR stays
    /// structural" split); name resolution is entirely this crate's
    /// concern.
    funcs_by_name: FxHashMap<Symbol, FuncId>,
    enum_constants: FxHashMap<Symbol, i32>,
    typedef_shapes: FxHashMap<Symbol, (u8, i32)>,
    scopes: Vec<FxHashMap<Symbol, VarId>>,
    func: Option<FuncState>,
    label_counter: u32,
}

impl<'a, 'b> Parser<'a, 'b> {
    fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare_var(&mut self, name: Symbol, var: Variable, is_global: bool) -> Result<VarId> {
        if !is_global {
            if let Some(f) = &mut self.func {
                f.locals_count += 1;
                if f.locals_count > MAX_LOCALS {
                    return Err(shecc_ir::CompileError::TooManyLocals { loc: self.cursor.loc() });
                }
            }
        }
        let scope = self.scopes.last_mut().expect("at least one scope always active");
        if scope.contains_key(&name) {
            return Err(shecc_ir::CompileError::Redeclaration {
                name: self.ctx.interner.resolve(name).to_string(),
                loc: self.cursor.loc(),
            });
        }
        let id = self.ctx.alloc_var(var);
        scope.insert(name, id);
        if is_global {
            self.ctx.globals.push(id);
        }
        Ok(id)
    }

    fn lookup_var(&self, name: Symbol) -> Option<VarId> {
        self.scopes.iter().rev().find_map(|s| s.get(&name).copied())
    }

    fn new_temp(&mut self, ty: TypeId, ptr_depth: u8, array_size: i32) -> VarId {
        let name = self.ctx.intern("%t");
        let var = Variable::new_local(ty, name, ptr_depth, array_size);
        self.ctx.alloc_var(var)
    }

    fn new_block(&mut self) -> BlockId {
        self.ctx.blocks.alloc(BasicBlock::new())
    }

    /// Enter one level of statement nesting (loop/switch/if), erroring
    /// once `MAX_NESTING` is exceeded (spec §4.C "≤ MAX_NESTING deep").
    fn enter_nesting(&mut self) -> Result<()> {
        let loc = self.cursor.loc();
        let f = self.func.as_mut().expect("nesting only tracked inside a function body");
        f.nesting += 1;
        if f.nesting > shecc_ir::MAX_NESTING {
            return Err(shecc_ir::CompileError::TooManyBlocks { loc });
        }
        Ok(())
    }

    fn exit_nesting(&mut self) {
        self.func.as_mut().expect("nesting only tracked inside a function body").nesting -= 1;
    }

    fn emit(&mut self, block: BlockId, instr: Phase1Instr) {
        self.ctx.blocks.get_mut(block).instructions.push(instr);
    }

    fn emit_binop(&mut self, block: BlockId, op: Opcode, lhs: VarId, rhs: VarId) -> VarId {
        let ty = self.ctx.var(lhs).type_id;
        let dest = self.new_temp(ty, 0, 0);
        let mut instr = Phase1Instr::new(op);
        instr.dest = Some(dest);
        instr.src0 = Some(lhs);
        instr.src1 = Some(rhs);
        self.emit(block, instr);
        dest
    }

    fn load_constant(&mut self, block: BlockId, value: i32) -> VarId {
        let dest = self.new_temp(self.base_types.int, 0, 0);
        let mut instr = Phase1Instr::new(Opcode::LoadConstant);
        instr.dest = Some(dest);
        instr.constant = Some(value);
        self.emit(block, instr);
        dest
    }

    fn gen_label(&mut self, prefix: &str) -> Symbol {
        self.label_counter += 1;
        self.ctx.intern(&format!(".{prefix}{}", self.label_counter))
    }

    fn link_next(&mut self, from: BlockId, to: BlockId) {
        self.ctx.blocks.get_mut(from).set_next(to);
        self.ctx.blocks.get_mut(to).predecessors.push((from, shecc_ir::EdgeKind::Next));
    }

    fn link_branch(&mut self, from: BlockId, then_: BlockId, else_: BlockId) {
        self.ctx.blocks.get_mut(from).set_branch(then_, else_);
        self.ctx.blocks.get_mut(then_).predecessors.push((from, shecc_ir::EdgeKind::Then));
        self.ctx.blocks.get_mut(else_).predecessors.push((from, shecc_ir::EdgeKind::Else));
    }

    /// Emit a `branch` terminator on `cond` between `then_`/`else_`,
    /// carrying the symbolic labels spec §4.C asks for even though the
    /// block graph itself is the mechanism arch lowering actually
    /// follows (the labels are debug-dump aids, per §9's "load_label
    /// dump names").
    fn emit_branch(&mut self, block: BlockId, cond: VarId, then_: BlockId, else_: BlockId) {
        let true_label = self.gen_label("L");
        let false_label = self.gen_label("L");
        let mut instr = Phase1Instr::new(Opcode::Branch);
        instr.src0 = Some(cond);
        instr.true_label = Some(true_label);
        instr.false_label = Some(false_label);
        self.emit(block, instr);
        self.link_branch(block, then_, else_);
    }

    fn emit_jump(&mut self, block: BlockId, target: BlockId) {
        let label = self.gen_label("L");
        let mut instr = Phase1Instr::new(Opcode::Jump);
        instr.true_label = Some(label);
        self.emit(block, instr);
        self.link_next(block, target);
    }

    /// Drain the post-increment/post-decrement side-effect queue
    /// (spec §4.C "side-effect queue"), in the order they were queued.
    fn drain_side_effects(&mut self, block: BlockId) {
        let queued = std::mem::take(&mut self.func.as_mut().expect("side effects only inside a function body").side_effects);
        for (addr, new_value) in queued {
            self.store(block, addr, new_value);
        }
    }

    fn queue_side_effect(&mut self, addr: Addressable, new_value: VarId) {
        self.func
            .as_mut()
            .expect("post-inc/dec only valid inside a function body")
            .side_effects
            .push((addr, new_value));
    }

    fn push_loop(&mut self, continue_block: Option<BlockId>, break_block: BlockId) {
        self.func
            .as_mut()
            .expect("loop/switch only inside a function body")
            .loop_stack
            .push(LoopTargets { break_block, continue_block });
    }

    fn pop_loop(&mut self) {
        self.func
            .as_mut()
            .expect("loop/switch only inside a function body")
            .loop_stack
            .pop();
    }

    fn break_target(&self) -> Option<BlockId> {
        self.func.as_ref()?.loop_stack.last().map(|t| t.break_block)
    }

    fn continue_target(&self) -> Option<BlockId> {
        self.func
            .as_ref()?
            .loop_stack
            .iter()
            .rev()
            .find_map(|t| t.continue_block)
    }
}

impl<'a, 'b> Parser<'a, 'b> {
    fn parse_translation_unit(&mut self) -> Result<()> {
        while !self.cursor.is_eof() {
            trace!(loc = ?self.cursor.loc(), "parsing external declaration");
            self.parse_external_declaration()?;
        }
        Ok(())
    }
}


//! Expression lowering (spec §4.C "Expression lowering"): an operand
//! stack driven by precedence-climbing recursive descent, emitting
//! phase1 IR as it goes rather than building an intermediate AST.

use shecc_ir::{
    BaseKind, BlockId, CompileError, Keyword, Opcode, Phase1Instr, Punct, Result, TokenKind,
    TypeId, VarId, NUM_REGISTERS,
};

use crate::lvalue::Addressable;
use crate::Parser;

/// Binary operator binding power, mirroring the table in spec §4.C
/// (ported from the original implementation's `get_operator_prio`,
/// with shift operators given the standard-C slot between relational
/// and additive that the original's table leaves unhandled).
fn binop_prio(p: Punct) -> u8 {
    use Punct::*;
    match p {
        PipePipe => 4,
        AmpAmp => 5,
        Pipe => 6,
        Caret => 7,
        Amp => 8,
        EqEq | BangEq => 9,
        Lt | LtEq | Gt | GtEq => 10,
        LtLt | GtGt => 11,
        Plus | Minus => 12,
        Star | Slash | Percent => 13,
        _ => 0,
    }
}

fn arith_opcode(p: Punct) -> Opcode {
    use Punct::*;
    match p {
        Pipe => Opcode::BitOr,
        Caret => Opcode::BitXor,
        Amp => Opcode::BitAnd,
        EqEq => Opcode::Eq,
        BangEq => Opcode::Neq,
        Lt => Opcode::Lt,
        LtEq => Opcode::Leq,
        Gt => Opcode::Gt,
        GtEq => Opcode::Geq,
        LtLt => Opcode::Lshift,
        GtGt => Opcode::Rshift,
        Plus => Opcode::Add,
        Minus => Opcode::Sub,
        Star => Opcode::Mul,
        Slash => Opcode::Div,
        Percent => Opcode::Mod,
        _ => unreachable!("not an arithmetic punct"),
    }
}

fn compound_assign_op(p: Punct) -> Option<Opcode> {
    use Punct::*;
    Some(match p {
        PlusEq => Opcode::Add,
        MinusEq => Opcode::Sub,
        PipeEq => Opcode::BitOr,
        AmpEq => Opcode::BitAnd,
        _ => return None,
    })
}

/// The result of parsing a unary/postfix expression: either something
/// assignable (fed straight to `lvalue::Parser::store`) or a value that
/// already lives in a temp (a call result, a literal, a sub-expression).
enum Operand {
    Addr(Addressable),
    Val(VarId),
}

impl<'a, 'b> Parser<'a, 'b> {
    /// Parses a full assignment-expression: `unary assign-op
    /// assignment-expr | conditional-expr`. Entry point used by
    /// statements, call arguments, `for` clauses, and initializers.
    pub(crate) fn parse_expr(&mut self, block: &mut BlockId) -> Result<VarId> {
        let operand = self.parse_unary(block)?;

        if let Operand::Addr(addr) = operand {
            if self.cursor.accept_punct(Punct::Eq) {
                let rhs = self.parse_expr(block)?;
                return Ok(self.store(*block, addr, rhs));
            }
            if let TokenKind::Punct(p) = self.cursor.peek().kind {
                if let Some(op) = compound_assign_op(p) {
                    self.cursor.bump();
                    let rhs = self.parse_expr(block)?;
                    let lhs = self.load(*block, addr);
                    let combined = self.emit_binop(*block, op, lhs, rhs);
                    return Ok(self.store(*block, addr, combined));
                }
            }
            let lhs = self.load(*block, addr);
            return self.parse_ternary_rest(block, lhs);
        }

        let Operand::Val(lhs) = operand else { unreachable!() };
        self.parse_ternary_rest(block, lhs)
    }

    fn parse_ternary_rest(&mut self, block: &mut BlockId, cond: VarId) -> Result<VarId> {
        let lhs = self.parse_binary_rest(block, cond, 0)?;
        if self.cursor.accept_punct(Punct::Question) {
            return self.parse_ternary(block, lhs);
        }
        Ok(lhs)
    }

    /// Precedence-climbing binary chain starting from an already-parsed
    /// left operand, per spec: "Each non-ternary binary operator
    /// produces a fresh temp via `require_var`." `&&`/`||` are handled
    /// separately since they lower to control flow, not an opcode.
    fn parse_binary_rest(&mut self, block: &mut BlockId, mut lhs: VarId, min_prio: u8) -> Result<VarId> {
        loop {
            let p = match self.cursor.peek().kind {
                TokenKind::Punct(p) if binop_prio(p) > 0 => p,
                _ => break,
            };
            let prio = binop_prio(p);
            if prio < min_prio {
                break;
            }
            self.cursor.bump();

            if matches!(p, Punct::AmpAmp | Punct::PipePipe) {
                lhs = self.lower_short_circuit(block, p, prio, lhs)?;
                continue;
            }

            let rhs_operand = self.parse_unary(block)?;
            let rhs_start = self.rvalue(*block, rhs_operand);
            // Climb every operator binding tighter than `p` into the
            // right-hand side before combining, giving left-associative
            // grouping at equal precedence.
            let rhs = self.parse_binary_rest(block, rhs_start, prio + 1)?;
            lhs = self.lower_binop(*block, p, lhs, rhs);
        }
        Ok(lhs)
    }

    /// Pointer-aware `+`/`-`: scales the integer operand by the
    /// pointee's size when either side is a pointer/array.
    fn lower_binop(&mut self, block: BlockId, p: Punct, lhs: VarId, rhs: VarId) -> VarId {
        let op = arith_opcode(p);
        if matches!(op, Opcode::Add | Opcode::Sub) {
            let lhs_ptr = self.ctx.var(lhs).is_pointer() || self.ctx.var(lhs).is_array();
            let rhs_ptr = self.ctx.var(rhs).is_pointer() || self.ctx.var(rhs).is_array();
            if lhs_ptr && !rhs_ptr {
                let (ty, ptr_depth, _) = (self.ctx.var(lhs).type_id, self.ctx.var(lhs).ptr_depth, 0);
                let elem = self.pointee_size(ty, ptr_depth);
                return self.scaled_add_or_sub(block, op, lhs, rhs, elem);
            }
            if rhs_ptr && !lhs_ptr && op == Opcode::Add {
                let (ty, ptr_depth, _) = (self.ctx.var(rhs).type_id, self.ctx.var(rhs).ptr_depth, 0);
                let elem = self.pointee_size(ty, ptr_depth);
                return self.scaled_add_or_sub(block, op, rhs, lhs, elem);
            }
        }
        self.emit_binop(block, op, lhs, rhs)
    }

    fn pointee_size(&self, ty: TypeId, ptr_depth: u8) -> i32 {
        if ptr_depth > 1 {
            return 4;
        }
        if self.ctx.types.get(ty).base_kind == BaseKind::Char {
            1
        } else {
            4
        }
    }

    fn scaled_add_or_sub(&mut self, block: BlockId, op: Opcode, base: VarId, idx: VarId, elem: i32) -> VarId {
        if elem == 1 {
            return self.emit_binop(block, op, base, idx);
        }
        let scale = self.load_constant(block, elem);
        let scaled = self.emit_binop(block, Opcode::Mul, idx, scale);
        self.emit_binop(block, op, base, scaled)
    }

    /// `a && b` / `a || b`: lowers to branches rather than a bitwise
    /// opcode (spec §4.C). The result lives in a fresh temp assigned
    /// `1`/`0` on each path and joined after. Only climbs operators that
    /// bind tighter than `op` itself into `b` — a trailing same-or-lower
    /// precedence operator (`a && b || c`) belongs to the caller's loop,
    /// not to this short-circuit's right-hand side.
    fn lower_short_circuit(&mut self, block: &mut BlockId, op: Punct, prio: u8, lhs: VarId) -> Result<VarId> {
        let rhs_block = self.new_block();
        let short_block = self.new_block();
        let join = self.new_block();

        if op == Punct::AmpAmp {
            self.emit_branch(*block, lhs, rhs_block, short_block);
        } else {
            self.emit_branch(*block, lhs, short_block, rhs_block);
        }

        let result = self.new_temp(self.base_types.int, 0, 0);

        let mut rhs_cur = rhs_block;
        let rhs_operand = self.parse_unary(&mut rhs_cur)?;
        let rhs_start = self.rvalue(rhs_cur, rhs_operand);
        let rhs_val = self.parse_binary_rest(&mut rhs_cur, rhs_start, prio + 1)?;
        let truthy = self.truthify(rhs_cur, rhs_val);
        self.store(rhs_cur, Addressable::Var(result), truthy);
        self.emit_jump(rhs_cur, join);

        let short_value = if op == Punct::AmpAmp { 0 } else { 1 };
        let short_const = self.load_constant(short_block, short_value);
        self.store(short_block, Addressable::Var(result), short_const);
        self.emit_jump(short_block, join);

        *block = join;
        Ok(result)
    }

    fn truthify(&mut self, block: BlockId, v: VarId) -> VarId {
        let zero = self.load_constant(block, 0);
        self.emit_binop(block, Opcode::Neq, v, zero)
    }

    /// `cond ? then : else` — three basic blocks wired with
    /// `THEN`/`ELSE`/`NEXT` edges, per spec §4.C.
    fn parse_ternary(&mut self, block: &mut BlockId, cond: VarId) -> Result<VarId> {
        let then_block = self.new_block();
        let else_block = self.new_block();
        let join = self.new_block();
        self.emit_branch(*block, cond, then_block, else_block);

        let result = self.new_temp(self.base_types.int, 0, 0);

        let mut then_cur = then_block;
        let then_val = self.parse_expr(&mut then_cur)?;
        self.store(then_cur, Addressable::Var(result), then_val);
        self.emit_jump(then_cur, join);

        self.cursor.expect_punct(Punct::Colon)?;

        let mut else_cur = else_block;
        let else_val = self.parse_expr(&mut else_cur)?;
        self.store(else_cur, Addressable::Var(result), else_val);
        self.emit_jump(else_cur, join);

        *block = join;
        Ok(result)
    }

    fn rvalue(&mut self, block: BlockId, operand: Operand) -> VarId {
        match operand {
            Operand::Val(v) => v,
            Operand::Addr(a) => self.load(block, a),
        }
    }

    /// Unary level: prefix `& * - ! ~ ++ --`, falling through to
    /// postfix/primary.
    fn parse_unary(&mut self, block: &mut BlockId) -> Result<Operand> {
        if self.cursor.accept_punct(Punct::Amp) {
            let operand = self.parse_unary(block)?;
            let addr = match operand {
                Operand::Addr(a) => self.address_of(*block, a),
                Operand::Val(_) => {
                    return Err(CompileError::UnsupportedConstruct {
                        what: "address-of a non-lvalue",
                        loc: self.cursor.loc(),
                    })
                }
            };
            return Ok(Operand::Val(addr));
        }
        if self.cursor.accept_punct(Punct::Star) {
            let operand = self.parse_unary(block)?;
            let val = self.rvalue(*block, operand);
            let (ty, ptr_depth) = {
                let var = self.ctx.var(val);
                (var.type_id, var.ptr_depth.saturating_sub(1))
            };
            let size = self.elem_size(ty, ptr_depth);
            return Ok(Operand::Addr(Addressable::Indirect { addr: val, ty, ptr_depth, size }));
        }
        if self.cursor.accept_punct(Punct::Minus) {
            let operand = self.parse_unary(block)?;
            let v = self.rvalue(*block, operand);
            let dest = self.new_temp(self.ctx.var(v).type_id, 0, 0);
            let mut instr = Phase1Instr::new(Opcode::Negate);
            instr.dest = Some(dest);
            instr.src0 = Some(v);
            self.emit(*block, instr);
            return Ok(Operand::Val(dest));
        }
        if self.cursor.accept_punct(Punct::Bang) {
            let operand = self.parse_unary(block)?;
            let v = self.rvalue(*block, operand);
            let dest = self.new_temp(self.base_types.int, 0, 0);
            let mut instr = Phase1Instr::new(Opcode::LogNot);
            instr.dest = Some(dest);
            instr.src0 = Some(v);
            self.emit(*block, instr);
            return Ok(Operand::Val(dest));
        }
        if self.cursor.accept_punct(Punct::Tilde) {
            let operand = self.parse_unary(block)?;
            let v = self.rvalue(*block, operand);
            let dest = self.new_temp(self.ctx.var(v).type_id, 0, 0);
            let mut instr = Phase1Instr::new(Opcode::BitNot);
            instr.dest = Some(dest);
            instr.src0 = Some(v);
            self.emit(*block, instr);
            return Ok(Operand::Val(dest));
        }
        if self.cursor.accept_punct(Punct::PlusPlus) {
            return self.parse_pre_incdec(block, 1);
        }
        if self.cursor.accept_punct(Punct::MinusMinus) {
            return self.parse_pre_incdec(block, -1);
        }
        self.parse_postfix(block)
    }

    fn parse_pre_incdec(&mut self, block: &mut BlockId, delta: i32) -> Result<Operand> {
        let operand = self.parse_unary(block)?;
        let addr = match operand {
            Operand::Addr(a) => a,
            Operand::Val(_) => {
                return Err(CompileError::UnsupportedConstruct {
                    what: "increment/decrement of a non-lvalue",
                    loc: self.cursor.loc(),
                })
            }
        };
        let old = self.load(*block, addr);
        let elem = self.pointee_size(self.ctx.var(old).type_id, self.ctx.var(old).ptr_depth);
        let step = if self.ctx.var(old).ptr_depth > 0 { elem } else { 1 };
        let delta_val = self.load_constant(*block, delta * step);
        let new = self.emit_binop(*block, Opcode::Add, old, delta_val);
        self.store(*block, addr, new);
        Ok(Operand::Val(new))
    }

    /// Postfix chain: `primary (`[`expr`]` | `.`ident | `->`ident |
    /// `(`args`)` | `++` | `--`)*`.
    fn parse_postfix(&mut self, block: &mut BlockId) -> Result<Operand> {
        let mut operand = self.parse_primary(block)?;
        loop {
            if self.cursor.accept_punct(Punct::LBracket) {
                let (base_addr, is_array) = match operand {
                    Operand::Addr(Addressable::Var(v)) if self.ctx.var(v).is_array() => {
                        (self.address_of(*block, Addressable::Var(v)), true)
                    }
                    other => (self.rvalue(*block, other), false),
                };
                let src = self.ctx.var(base_addr);
                let (ty, src_ptr_depth, name) = (src.type_id, src.ptr_depth, src.name);
                if !is_array && src_ptr_depth == 0 {
                    return Err(CompileError::NotSubscriptable {
                        name: self.ctx.interner.resolve(name).to_string(),
                        loc: self.cursor.loc(),
                    });
                }
                let ptr_depth = src_ptr_depth.max(1) - 1;
                let index = self.parse_expr(block)?;
                self.cursor.expect_punct(Punct::RBracket)?;
                let elem_size = self.pointee_size(ty, 0);
                let addr = self.scaled_add(*block, base_addr, index, elem_size);
                let size = self.elem_size(ty, ptr_depth);
                operand = Operand::Addr(Addressable::Indirect { addr, ty, ptr_depth, size });
                continue;
            }
            if self.cursor.accept_punct(Punct::Dot) {
                let field_name = self.cursor.expect_identifier()?;
                let base = match operand {
                    Operand::Addr(a) => a,
                    Operand::Val(_) => {
                        return Err(CompileError::UnsupportedConstruct {
                            what: "member access on a non-lvalue",
                            loc: self.cursor.loc(),
                        })
                    }
                };
                let (struct_ty, _, _) = base.ty_ptr(self);
                let base_addr = self.address_of(*block, base);
                operand = Operand::Addr(self.member_addressable(*block, struct_ty, base_addr, field_name)?);
                continue;
            }
            if self.cursor.accept_punct(Punct::Arrow) {
                let field_name = self.cursor.expect_identifier()?;
                let ptr_val = self.rvalue(*block, operand);
                let struct_ty = self.ctx.var(ptr_val).type_id;
                operand = Operand::Addr(self.member_addressable(*block, struct_ty, ptr_val, field_name)?);
                continue;
            }
            if self.cursor.at_punct(Punct::LParen) {
                operand = Operand::Val(self.parse_call(block, operand)?);
                continue;
            }
            if self.cursor.accept_punct(Punct::PlusPlus) {
                operand = self.parse_post_incdec(block, operand, 1)?;
                continue;
            }
            if self.cursor.accept_punct(Punct::MinusMinus) {
                operand = self.parse_post_incdec(block, operand, -1)?;
                continue;
            }
            break;
        }
        Ok(operand)
    }

    fn parse_post_incdec(&mut self, block: &mut BlockId, operand: Operand, delta: i32) -> Result<Operand> {
        let addr = match operand {
            Operand::Addr(a) => a,
            Operand::Val(_) => {
                return Err(CompileError::UnsupportedConstruct {
                    what: "increment/decrement of a non-lvalue",
                    loc: self.cursor.loc(),
                })
            }
        };
        let old = self.load(*block, addr);
        let elem = self.pointee_size(self.ctx.var(old).type_id, self.ctx.var(old).ptr_depth);
        let step = if self.ctx.var(old).ptr_depth > 0 { elem } else { 1 };
        let delta_val = self.load_constant(*block, delta * step);
        let new = self.emit_binop(*block, Opcode::Add, old, delta_val);
        self.queue_side_effect(addr, new);
        Ok(Operand::Val(old))
    }

    fn member_addressable(
        &mut self,
        block: BlockId,
        struct_ty: TypeId,
        base_addr: VarId,
        field_name: shecc_ir::Symbol,
    ) -> Result<Addressable> {
        let ty = self.ctx.types.get(struct_ty);
        let field = ty
            .fields
            .iter()
            .find(|f| f.var_name == field_name)
            .cloned()
            .ok_or_else(|| CompileError::UnknownIdentifier {
                name: self.ctx.interner.resolve(field_name).to_string(),
                loc: self.cursor.loc(),
            })?;
        let field_ty = self.ctx.types.lookup(field.type_name).unwrap_or(self.base_types.int);
        let addr = if field.offset == 0 {
            base_addr
        } else {
            let offset = self.load_constant(block, field.offset);
            self.emit_binop(block, Opcode::Add, base_addr, offset)
        };
        Ok(Addressable::Indirect {
            addr,
            ty: field_ty,
            ptr_depth: field.ptr_depth,
            size: self.elem_size(field_ty, field.ptr_depth),
        })
    }

    fn parse_call(&mut self, block: &mut BlockId, callee: Operand) -> Result<VarId> {
        self.cursor.expect_punct(Punct::LParen)?;
        let mut args = Vec::new();
        if !self.cursor.at_punct(Punct::RParen) {
            loop {
                args.push(self.parse_expr(block)?);
                if !self.cursor.accept_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.cursor.expect_punct(Punct::RParen)?;

        // Direct calls spend every argument register on arguments;
        // indirect calls additionally need one register to hold the
        // callee address across the branch, so one fewer argument fits.
        let is_direct = matches!(&callee, Operand::Val(v) if self.ctx.var(*v).is_func);
        let max_args = if is_direct { NUM_REGISTERS } else { NUM_REGISTERS - 1 };
        if args.len() > max_args {
            return Err(CompileError::TooManyArguments { loc: self.cursor.loc() });
        }

        for &arg in &args {
            let mut push = Phase1Instr::new(Opcode::Push);
            push.src0 = Some(arg);
            self.emit(*block, push);
        }

        match callee {
            Operand::Val(callee_val) if self.ctx.var(callee_val).is_func => {
                let func_name = self.ctx.var(callee_val).name;
                let ret_ty = self
                    .funcs_by_name
                    .get(&func_name)
                    .map(|id| self.ctx.funcs.get(*id).return_type)
                    .unwrap_or(self.base_types.int);
                let dest = self.new_temp(ret_ty, 0, 0);
                let mut instr = Phase1Instr::new(Opcode::Call);
                instr.dest = Some(dest);
                instr.func_name = Some(func_name);
                instr.param_num = args.len() as u8;
                self.emit(*block, instr);
                Ok(dest)
            }
            Operand::Val(fp) | Operand::Addr(Addressable::Var(fp)) => {
                let dest = self.new_temp(self.base_types.int, 0, 0);
                let mut instr = Phase1Instr::new(Opcode::Indirect);
                instr.dest = Some(dest);
                instr.src0 = Some(fp);
                instr.param_num = args.len() as u8;
                self.emit(*block, instr);
                Ok(dest)
            }
            Operand::Addr(a) => {
                let fp = self.load(*block, a);
                let dest = self.new_temp(self.base_types.int, 0, 0);
                let mut instr = Phase1Instr::new(Opcode::Indirect);
                instr.dest = Some(dest);
                instr.src0 = Some(fp);
                instr.param_num = args.len() as u8;
                self.emit(*block, instr);
                Ok(dest)
            }
        }
    }

    fn parse_primary(&mut self, block: &mut BlockId) -> Result<Operand> {
        let loc = self.cursor.loc();
        match self.cursor.peek().kind.clone() {
            TokenKind::Numeric(sym) => {
                self.cursor.bump();
                let text = self.ctx.interner.resolve(sym).to_string();
                let value = shecc_lex::parse_numeric(&text).ok_or(CompileError::InvalidNumericDigit { loc })?;
                Ok(Operand::Val(self.load_constant(*block, value)))
            }
            TokenKind::CharLit(sym) => {
                self.cursor.bump();
                let text = self.ctx.interner.resolve(sym).to_string();
                let value = shecc_lex::decode_char_escape(&text) as i32;
                Ok(Operand::Val(self.load_constant(*block, value)))
            }
            TokenKind::StringLit(sym) => {
                self.cursor.bump();
                let text = self.ctx.interner.resolve(sym).to_string();
                let bytes = shecc_lex::decode_escapes(&text);
                let offset = self.ctx.data_section.len() as i32;
                self.ctx.data_section.extend_from_slice(&bytes);
                self.ctx.data_section.push(0);
                let dest = self.new_temp(self.base_types.char, 1, 0);
                let mut instr = Phase1Instr::new(Opcode::LoadDataAddress);
                instr.dest = Some(dest);
                instr.constant = Some(offset);
                self.emit(*block, instr);
                Ok(Operand::Val(dest))
            }
            TokenKind::Keyword(Keyword::Sizeof) => {
                self.cursor.bump();
                self.cursor.expect_punct(Punct::LParen)?;
                let ty = self.try_parse_type_specifier()?.ok_or_else(|| self.cursor.unexpected())?;
                let mut ptr_depth = 0u8;
                while self.cursor.accept_punct(Punct::Star) {
                    ptr_depth += 1;
                }
                self.cursor.expect_punct(Punct::RParen)?;
                let size = if ptr_depth > 0 { 4 } else { self.ctx.types.get(ty).size };
                Ok(Operand::Val(self.load_constant(*block, size)))
            }
            TokenKind::Punct(Punct::LParen) => {
                self.cursor.bump();
                if let Some(v) = self.try_parse_compound_literal(block)? {
                    return Ok(Operand::Val(v));
                }
                let v = self.parse_expr(block)?;
                self.cursor.expect_punct(Punct::RParen)?;
                Ok(Operand::Val(v))
            }
            TokenKind::Identifier(sym) => {
                self.cursor.bump();
                if let Some(&value) = self.enum_constants.get(&sym) {
                    return Ok(Operand::Val(self.load_constant(*block, value)));
                }
                if let Some(id) = self.lookup_var(sym) {
                    return Ok(Operand::Addr(Addressable::Var(id)));
                }
                if self.funcs_by_name.contains_key(&sym) || self.cursor.at_punct(Punct::LParen) {
                    let func_id = self.ctx.alloc_var(shecc_ir::Variable {
                        is_func: true,
                        ..shecc_ir::Variable::new_local(self.base_types.int, sym, 0, 0)
                    });
                    return Ok(Operand::Val(func_id));
                }
                Err(CompileError::UnknownIdentifier {
                    name: self.ctx.interner.resolve(sym).to_string(),
                    loc,
                })
            }
            _ => Err(self.cursor.unexpected()),
        }
    }

    /// `(int){ expr }` / `(int[]){ e1, e2, … }` — restricted compound
    /// literal forms (spec §4.C). Returns `Ok(None)` if the lookahead
    /// doesn't actually start one, so the caller falls back to a
    /// parenthesized sub-expression.
    fn try_parse_compound_literal(&mut self, block: &mut BlockId) -> Result<Option<VarId>> {
        let checkpoint = self.cursor_pos();
        let Some(ty) = self.try_parse_type_specifier()? else {
            return Ok(None);
        };
        let is_array = self.cursor.accept_punct(Punct::LBracket) && self.cursor.accept_punct(Punct::RBracket);
        if !self.cursor.at_punct(Punct::RParen) {
            self.restore_cursor(checkpoint);
            return Ok(None);
        }
        self.cursor.bump(); // `)`
        if !self.cursor.at_punct(Punct::LBrace) {
            self.restore_cursor(checkpoint);
            return Ok(None);
        }
        self.cursor.bump(); // `{`

        if !is_array {
            let v = self.parse_expr(block)?;
            self.cursor.expect_punct(Punct::RBrace)?;
            return Ok(Some(v));
        }

        let mut elems = Vec::new();
        if !self.cursor.at_punct(Punct::RBrace) {
            loop {
                elems.push(self.parse_expr(block)?);
                if !self.cursor.accept_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.cursor.expect_punct(Punct::RBrace)?;

        let array_name = self.ctx.intern("%clit");
        let array_var = self.ctx.alloc_var(shecc_ir::Variable::new_local(ty, array_name, 0, elems.len() as i32));
        let mut alloc = Phase1Instr::new(Opcode::Allocat);
        alloc.dest = Some(array_var);
        self.emit(*block, alloc);
        let base = self.address_of(*block, Addressable::Var(array_var));
        let elem_size = self.pointee_size(ty, 0);
        for (i, elem) in elems.into_iter().enumerate() {
            let offset = self.load_constant(*block, i as i32 * elem_size);
            let addr = self.emit_binop(*block, Opcode::Add, base, offset);
            let size = self.elem_size(ty, 0);
            let mut write = Phase1Instr::new(Opcode::Write);
            write.src0 = Some(addr);
            write.src1 = Some(elem);
            write.size = size;
            self.emit(*block, write);
        }
        Ok(Some(base))
    }

    fn cursor_pos(&self) -> usize {
        self.cursor.pos()
    }

    fn restore_cursor(&mut self, pos: usize) {
        self.cursor.restore(pos);
    }
}

//! Compile-time constant expressions: enum member values, array
//! declarator sizes, and global scalar initializers (spec §4.C
//! "Globals": "the parser evaluates arithmetic + ternary folds directly
//! during parsing using `eval_expression_imm`").
//!
//! This walks the same precedence table as `expr.rs` but never touches
//! the IR — every operand must already be a literal or a previously
//! declared `enum` constant.

use shecc_ir::{CompileError, Punct, Result};

use crate::Parser;

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

impl<'a, 'b> Parser<'a, 'b> {
    /// Parses a constant expression up to and including `?:`, folding
    /// it to an `i32` as it goes.
    pub(crate) fn parse_const_expr(&mut self) -> Result<i32> {
        let cond = self.parse_const_binary(0)?;
        if self.cursor.accept_punct(Punct::Question) {
            let then_val = self.parse_const_expr()?;
            self.cursor.expect_punct(Punct::Colon)?;
            let else_val = self.parse_const_binary(0)?;
            return Ok(if cond != 0 { then_val } else { else_val });
        }
        Ok(cond)
    }

    fn parse_const_binary(&mut self, min_prio: u8) -> Result<i32> {
        let mut lhs = self.parse_const_unary()?;
        loop {
            let Some(p) = self.peek_const_punct() else { break };
            let prio = binop_prio(p);
            if prio == 0 || prio < min_prio {
                break;
            }
            self.cursor.bump();
            let rhs = self.parse_const_binary(prio + 1)?;
            lhs = apply_const_binop(p, lhs, rhs, self.cursor.loc())?;
        }
        Ok(lhs)
    }

    fn peek_const_punct(&self) -> Option<Punct> {
        match self.cursor.peek().kind {
            shecc_ir::TokenKind::Punct(p) => Some(p),
            _ => None,
        }
    }

    fn parse_const_unary(&mut self) -> Result<i32> {
        if self.cursor.accept_punct(Punct::Minus) {
            return Ok(self.parse_const_unary()?.wrapping_neg());
        }
        if self.cursor.accept_punct(Punct::Plus) {
            return self.parse_const_unary();
        }
        if self.cursor.accept_punct(Punct::Bang) {
            return Ok(i32::from(self.parse_const_unary()? == 0));
        }
        if self.cursor.accept_punct(Punct::Tilde) {
            return Ok(!self.parse_const_unary()?);
        }
        if self.cursor.accept_punct(Punct::LParen) {
            let v = self.parse_const_expr()?;
            self.cursor.expect_punct(Punct::RParen)?;
            return Ok(v);
        }
        match self.cursor.peek().kind.clone() {
            shecc_ir::TokenKind::Numeric(sym) => {
                self.cursor.bump();
                let text = self.ctx.interner.resolve(sym).to_string();
                shecc_lex::parse_numeric(&text).ok_or_else(|| CompileError::MalformedConstExpr {
                    reason: format!("invalid numeric literal {text:?}"),
                    loc: self.cursor.loc(),
                })
            }
            shecc_ir::TokenKind::CharLit(sym) => {
                self.cursor.bump();
                let text = self.ctx.interner.resolve(sym).to_string();
                Ok(shecc_lex::decode_char_escape(&text) as i32)
            }
            shecc_ir::TokenKind::Identifier(sym) => {
                self.cursor.bump();
                self.enum_constants.get(&sym).copied().ok_or_else(|| {
                    CompileError::MalformedConstExpr {
                        reason: format!(
                            "{:?} is not a compile-time constant",
                            self.ctx.interner.resolve(sym)
                        ),
                        loc: self.cursor.loc(),
                    }
                })
            }
            _ => Err(self.cursor.unexpected()),
        }
    }
}

fn apply_const_binop(op: Punct, lhs: i32, rhs: i32, loc: shecc_ir::SourceLoc) -> Result<i32> {
    use Punct::*;
    Ok(match op {
        PipePipe => i32::from(lhs != 0 || rhs != 0),
        AmpAmp => i32::from(lhs != 0 && rhs != 0),
        Pipe => lhs | rhs,
        Caret => lhs ^ rhs,
        Amp => lhs & rhs,
        EqEq => i32::from(lhs == rhs),
        BangEq => i32::from(lhs != rhs),
        Lt => i32::from(lhs < rhs),
        LtEq => i32::from(lhs <= rhs),
        Gt => i32::from(lhs > rhs),
        GtEq => i32::from(lhs >= rhs),
        LtLt => lhs.wrapping_shl(rhs as u32),
        GtGt => lhs.wrapping_shr(rhs as u32),
        Plus => lhs.wrapping_add(rhs),
        Minus => lhs.wrapping_sub(rhs),
        Star => lhs.wrapping_mul(rhs),
        Slash => {
            if rhs == 0 {
                return Err(CompileError::MalformedConstExpr {
                    reason: "division by zero".into(),
                    loc,
                });
            }
            lhs.wrapping_div(rhs)
        }
        Percent => {
            if rhs == 0 {
                return Err(CompileError::MalformedConstExpr {
                    reason: "division by zero".into(),
                    loc,
                });
            }
            lhs.wrapping_rem(rhs)
        }
        _ => unreachable!("not a binary operator punct"),
    })
}

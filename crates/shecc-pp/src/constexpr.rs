//! Constant expression evaluation for `#if`/`#elif` (spec §4.B
//! "Constant expression evaluator").
//!
//! A precedence-climbing evaluator over the same operator set the
//! parser's expression grammar uses, with one deliberate divergence
//! recorded as an Open Question decision: `&&` and `||` both evaluate
//! their right-hand side unconditionally here, unlike the parser's
//! short-circuiting lowering for runtime expressions. `defined(X)` and
//! `defined X` are recognized as a pseudo-unary operator ahead of the
//! climb, since `defined` is not itself a C keyword.

use shecc_ir::{CompileError, Context, Result, SourceLoc, Token, TokenKind};

pub fn eval_const_expr(ctx: &mut Context, tokens: &[Token], loc: SourceLoc) -> Result<i32> {
    let rewritten = rewrite_defined(ctx, tokens);
    let mut p = Parser {
        ctx,
        tokens: &rewritten,
        pos: 0,
        loc,
    };
    let value = p.parse_expr(0)?;
    if p.pos != p.tokens.len() {
        return Err(CompileError::MalformedConstExpr {
            reason: "trailing tokens in constant expression".to_string(),
            loc,
        });
    }
    Ok(value)
}

/// Replace `defined(X)` / `defined X` with a literal `1` or `0` before
/// the climb, and every remaining bare identifier with `0` (undefined
/// macros evaluate to zero in a constant expression, matching the
/// original's treatment of unexpanded identifiers in `#if`).
fn rewrite_defined(ctx: &mut Context, tokens: &[Token]) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if let TokenKind::Identifier(sym) = &tokens[i].kind {
            let sym = *sym;
            if ctx.interner.resolve(sym) == "defined" {
                let loc = tokens[i].loc;
                let (name_idx, consumed) = if tokens
                    .get(i + 1)
                    .map(|t| matches!(t.kind, TokenKind::Punct(shecc_ir::Punct::LParen)))
                    .unwrap_or(false)
                {
                    (i + 2, 4) // defined ( X )
                } else {
                    (i + 1, 2) // defined X
                };
                let defined = matches!(
                    tokens.get(name_idx).map(|t| &t.kind),
                    Some(TokenKind::Identifier(target)) if ctx.macros.contains_key(target)
                );
                out.push(int_token(ctx, defined as i32, loc));
                i += consumed;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

fn int_token(ctx: &mut Context, value: i32, loc: SourceLoc) -> Token {
    let sym = ctx.intern(if value != 0 { "1" } else { "0" });
    Token::new(TokenKind::Numeric(sym), loc)
}

struct Parser<'a> {
    ctx: &'a Context,
    tokens: &'a [Token],
    pos: usize,
    loc: SourceLoc,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn bump(&mut self) -> Option<&TokenKind> {
        let t = self.tokens.get(self.pos).map(|t| &t.kind);
        self.pos += 1;
        t
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<i32> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some((op, lbp, rbp)) = self.peek_binop() else {
                break;
            };
            if lbp < min_bp {
                break;
            }
            self.pos += 1;
            if op == "?" {
                let then_val = self.parse_expr(0)?;
                self.expect_colon()?;
                let else_val = self.parse_expr(rbp)?;
                lhs = if lhs != 0 { then_val } else { else_val };
                continue;
            }
            let rhs = self.parse_expr(rbp)?;
            lhs = apply_binop(op, lhs, rhs, self.loc)?;
        }
        Ok(lhs)
    }

    fn expect_colon(&mut self) -> Result<()> {
        use shecc_ir::Punct::Colon;
        match self.bump() {
            Some(TokenKind::Punct(Colon)) => Ok(()),
            _ => Err(CompileError::MalformedConstExpr {
                reason: "expected ':' in ternary constant expression".to_string(),
                loc: self.loc,
            }),
        }
    }

    fn peek_binop(&self) -> Option<(&'static str, u8, u8)> {
        use shecc_ir::Punct::*;
        let TokenKind::Punct(p) = self.peek()? else {
            return None;
        };
        // (name, left binding power, right binding power) — higher
        // binds tighter; right-associative ops (ternary) use rbp < lbp.
        Some(match p {
            PipePipe => ("||", 4, 5),
            AmpAmp => ("&&", 6, 7),
            Pipe => ("|", 8, 9),
            Caret => ("^", 10, 11),
            Amp => ("&", 12, 13),
            EqEq => ("==", 14, 15),
            BangEq => ("!=", 14, 15),
            Lt => ("<", 16, 17),
            LtEq => ("<=", 16, 17),
            Gt => (">", 16, 17),
            GtEq => (">=", 16, 17),
            LtLt => ("<<", 18, 19),
            GtGt => (">>", 18, 19),
            Plus => ("+", 20, 21),
            Minus => ("-", 20, 21),
            Star => ("*", 22, 23),
            Slash => ("/", 22, 23),
            Percent => ("%", 22, 23),
            Question => ("?", 2, 1),
            _ => return None,
        })
    }

    fn parse_unary(&mut self) -> Result<i32> {
        use shecc_ir::Punct::*;
        match self.peek() {
            Some(TokenKind::Punct(Minus)) => {
                self.pos += 1;
                Ok(-self.parse_unary()?)
            }
            Some(TokenKind::Punct(Bang)) => {
                self.pos += 1;
                Ok((self.parse_unary()? == 0) as i32)
            }
            Some(TokenKind::Punct(Tilde)) => {
                self.pos += 1;
                Ok(!self.parse_unary()?)
            }
            Some(TokenKind::Punct(Plus)) => {
                self.pos += 1;
                self.parse_unary()
            }
            Some(TokenKind::Punct(LParen)) => {
                self.pos += 1;
                let v = self.parse_expr(0)?;
                match self.bump() {
                    Some(TokenKind::Punct(RParen)) => Ok(v),
                    _ => Err(CompileError::MalformedConstExpr {
                        reason: "unbalanced parentheses".to_string(),
                        loc: self.loc,
                    }),
                }
            }
            Some(TokenKind::Numeric(sym)) => {
                let sym = *sym;
                self.pos += 1;
                shecc_lex::parse_numeric(self.ctx.interner.resolve(sym)).ok_or_else(|| {
                    CompileError::MalformedConstExpr {
                        reason: "invalid numeric literal".to_string(),
                        loc: self.loc,
                    }
                })
            }
            Some(TokenKind::Identifier(_)) => {
                // Any identifier surviving `rewrite_defined` is an
                // undefined macro name; it evaluates to 0.
                self.pos += 1;
                Ok(0)
            }
            _ => Err(CompileError::MalformedConstExpr {
                reason: "expected a term in constant expression".to_string(),
                loc: self.loc,
            }),
        }
    }
}

fn apply_binop(op: &str, lhs: i32, rhs: i32, loc: SourceLoc) -> Result<i32> {
    Ok(match op {
        "||" => ((lhs != 0) || (rhs != 0)) as i32,
        "&&" => ((lhs != 0) && (rhs != 0)) as i32,
        "|" => lhs | rhs,
        "^" => lhs ^ rhs,
        "&" => lhs & rhs,
        "==" => (lhs == rhs) as i32,
        "!=" => (lhs != rhs) as i32,
        "<" => (lhs < rhs) as i32,
        "<=" => (lhs <= rhs) as i32,
        ">" => (lhs > rhs) as i32,
        ">=" => (lhs >= rhs) as i32,
        "<<" => lhs.wrapping_shl(rhs as u32),
        ">>" => lhs.wrapping_shr(rhs as u32),
        "+" => lhs.wrapping_add(rhs),
        "-" => lhs.wrapping_sub(rhs),
        "*" => lhs.wrapping_mul(rhs),
        "/" => {
            if rhs == 0 {
                return Err(CompileError::MalformedConstExpr {
                    reason: "division by zero".to_string(),
                    loc,
                });
            }
            lhs.wrapping_div(rhs)
        }
        "%" => {
            if rhs == 0 {
                return Err(CompileError::MalformedConstExpr {
                    reason: "modulo by zero".to_string(),
                    loc,
                });
            }
            lhs.wrapping_rem(rhs)
        }
        _ => unreachable!(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shecc_ir::CompileOptions;

    fn eval(src: &str) -> i32 {
        let mut ctx = Context::new(CompileOptions::default());
        let file = ctx.intern("test.c");
        let tokens = shecc_lex::lex(src, file, &mut ctx.interner).unwrap();
        let tokens: Vec<_> = tokens
            .into_iter()
            .filter(|t| {
                !t.is_trivia()
                    && !matches!(
                        t.kind,
                        TokenKind::Whitespace | TokenKind::Newline | TokenKind::Eof
                    )
            })
            .collect();
        let loc = shecc_ir::SourceLoc::new(file, 1, 1, 0, 0);
        eval_const_expr(&mut ctx, &tokens, loc).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(eval("1 + 2 * 3"), 7);
        assert_eq!(eval("(1 + 2) * 3"), 9);
    }

    #[test]
    fn non_short_circuit_logical_ops() {
        assert_eq!(eval("1 || 0"), 1);
        assert_eq!(eval("0 && 1"), 0);
    }

    #[test]
    fn ternary() {
        assert_eq!(eval("1 ? 10 : 20"), 10);
        assert_eq!(eval("0 ? 10 : 20"), 20);
    }
}

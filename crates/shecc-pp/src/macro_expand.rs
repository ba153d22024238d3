//! Object-like and function-like macro definition and expansion (spec
//! §4.B "Macro expansion"), including `__VA_ARGS__` variadic support
//! and hide-set-guarded rescanning.

use shecc_ir::{
    CompileError, MacroDef, Punct, Result, SourceLoc, Symbol, Token, TokenKind,
};

use crate::builtin;
use crate::hideset::HideSet;
use crate::PpState;
use crate::SourceLoader;

pub struct Expansion {
    pub tokens: Vec<Token>,
    /// Number of tokens consumed from the *original* input stream
    /// starting at the invocation's first token (the macro name for an
    /// object-like macro; name through closing `)` for function-like).
    pub consumed: usize,
}

/// Parse a `#define` directive's token line (with the macro name as the
/// first token) and install the resulting [`MacroDef`].
pub fn define<L: SourceLoader>(state: &mut PpState<L>, line: &[Token], loc: SourceLoc) -> Result<()> {
    let Some(Token {
        kind: TokenKind::Identifier(name),
        ..
    }) = line.first()
    else {
        return Err(CompileError::MalformedConstExpr {
            reason: "#define requires a macro name".to_string(),
            loc,
        });
    };
    let name = *name;

    // Function-like iff `(` immediately follows the name with no
    // intervening token (object-like macros may still start with `(`
    // after a gap, but this lexer never emits a trivia token between
    // directive-line tokens since `line_tokens` already strips them —
    // so adjacency here is structural, not lexical).
    if matches!(line.get(1), Some(Token { kind: TokenKind::Punct(Punct::LParen), .. })) {
        let mut i = 2;
        let mut params = Vec::new();
        let mut is_variadic = false;
        loop {
            match line.get(i) {
                Some(Token { kind: TokenKind::Punct(Punct::RParen), .. }) => {
                    i += 1;
                    break;
                }
                Some(Token { kind: TokenKind::Identifier(p), .. }) => {
                    params.push(*p);
                    i += 1;
                    match line.get(i) {
                        Some(Token { kind: TokenKind::Punct(Punct::Comma), .. }) => i += 1,
                        Some(Token { kind: TokenKind::Punct(Punct::RParen), .. }) => {}
                        _ => {
                            return Err(CompileError::MalformedConstExpr {
                                reason: "expected ',' or ')' in macro parameter list".to_string(),
                                loc,
                            })
                        }
                    }
                }
                Some(Token { kind: TokenKind::Punct(Punct::Dot), .. })
                    if matches!(
                        (line.get(i + 1), line.get(i + 2)),
                        (
                            Some(Token { kind: TokenKind::Punct(Punct::Dot), .. }),
                            Some(Token { kind: TokenKind::Punct(Punct::Dot), .. })
                        )
                    ) =>
                {
                    is_variadic = true;
                    i += 3;
                }
                _ => {
                    return Err(CompileError::MalformedConstExpr {
                        reason: "malformed macro parameter list".to_string(),
                        loc,
                    })
                }
            }
        }
        let replacement = line[i..].to_vec();
        state.ctx.macros.insert(
            name,
            MacroDef::function_like(name, params, is_variadic, replacement),
        );
    } else {
        let replacement = line[1..].to_vec();
        state.ctx.macros.insert(name, MacroDef::object_like(name, replacement));
    }
    Ok(())
}

/// Attempt to expand the macro invocation (if any) starting at
/// `input[idx]`, which has already been confirmed to be `Identifier(name)`.
/// Returns `None` if `name` is not a macro, is currently hidden on this
/// token's hide-set, or (for a function-like macro) is not followed by
/// `(` — in all those cases the identifier passes through unexpanded.
pub fn try_expand<L: SourceLoader>(
    state: &mut PpState<L>,
    name: Symbol,
    input: &[Token],
    idx: usize,
) -> Result<Option<Expansion>> {
    let Some(def) = state.ctx.macros.get(&name).cloned() else {
        return Ok(None);
    };

    if let Some(kind) = def.builtin {
        let tok = builtin::expand(kind, state.ctx, input[idx].loc);
        return Ok(Some(Expansion {
            tokens: vec![tok],
            consumed: 1,
        }));
    }

    if def.is_disabled {
        return Ok(None);
    }

    if !def.is_function_like {
        let hs = HideSet::empty().insert(name);
        let body = apply_hideset(&def.replacement, &hs);
        let rescanned = rescan_disabled(state, name, body)?;
        return Ok(Some(Expansion {
            tokens: rescanned,
            consumed: 1,
        }));
    }

    // Function-like: the next significant token must be `(`.
    let mut j = idx + 1;
    while matches!(input.get(j).map(|t| &t.kind), Some(TokenKind::Whitespace) | Some(TokenKind::Tab)) {
        j += 1;
    }
    if !matches!(input.get(j).map(|t| &t.kind), Some(TokenKind::Punct(Punct::LParen))) {
        return Ok(None);
    }
    let open = j;
    let (args, close) = collect_args(input, open)?;

    let min_args = def.params.len();
    if args.len() < min_args {
        return Err(CompileError::TooFewMacroArgs {
            name: state.ctx.interner.resolve(name).to_string(),
            loc: input[idx].loc,
        });
    }
    if !def.is_variadic && args.len() > min_args {
        return Err(CompileError::TooManyMacroArgs {
            name: state.ctx.interner.resolve(name).to_string(),
            loc: input[idx].loc,
        });
    }

    let expanded_args: Vec<Vec<Token>> = {
        let mut out = Vec::with_capacity(args.len());
        for arg in &args {
            out.push(run_argument(state, arg.clone())?);
        }
        out
    };

    let mut body = substitute(state, &def, &expanded_args);
    let hs = HideSet::empty().insert(name);
    body = apply_hideset(&body, &hs);
    let rescanned = rescan_disabled(state, name, body)?;

    Ok(Some(Expansion {
        tokens: rescanned,
        consumed: close - idx + 1,
    }))
}

/// Split a function-like invocation's argument list at top-level commas
/// (ignoring commas nested inside balanced parens), honoring the single
/// collected `__VA_ARGS__` argument verbatim. Returns the arguments and
/// the index of the closing `)`.
fn collect_args(input: &[Token], open: usize) -> Result<(Vec<Vec<Token>>, usize)> {
    let mut depth = 0i32;
    let mut args: Vec<Vec<Token>> = Vec::new();
    let mut current = Vec::new();
    let mut i = open;
    loop {
        let Some(tok) = input.get(i) else {
            return Err(CompileError::MalformedConstExpr {
                reason: "unterminated macro argument list".to_string(),
                loc: input[open].loc,
            });
        };
        match &tok.kind {
            TokenKind::Punct(Punct::LParen) => {
                depth += 1;
                if depth > 1 {
                    current.push(tok.clone());
                }
            }
            TokenKind::Punct(Punct::RParen) => {
                depth -= 1;
                if depth == 0 {
                    if !current.is_empty() || !args.is_empty() {
                        args.push(std::mem::take(&mut current));
                    }
                    return Ok((args, i));
                }
                current.push(tok.clone());
            }
            TokenKind::Punct(Punct::Comma) if depth == 1 => {
                args.push(std::mem::take(&mut current));
            }
            TokenKind::Whitespace | TokenKind::Tab | TokenKind::Newline => {}
            _ => {
                if depth >= 1 {
                    current.push(tok.clone());
                }
            }
        }
        i += 1;
    }
}

/// Fully macro-expand an argument *before* substitution, per the
/// standard rescan-then-substitute order.
fn run_argument<L: SourceLoader>(state: &mut PpState<L>, arg: Vec<Token>) -> Result<Vec<Token>> {
    let trimmed: Vec<Token> = arg
        .into_iter()
        .filter(|t| !matches!(t.kind, TokenKind::Whitespace | TokenKind::Tab | TokenKind::Newline))
        .collect();
    rescan(state, trimmed)
}

/// Replace each parameter occurrence in the macro body with its
/// (already-expanded) argument; `__VA_ARGS__` maps to the trailing
/// variadic arguments joined by `,`.
fn substitute<L: SourceLoader>(
    state: &PpState<L>,
    def: &MacroDef,
    args: &[Vec<Token>],
) -> Vec<Token> {
    let mut out = Vec::new();
    for tok in &def.replacement {
        if let TokenKind::Identifier(sym) = &tok.kind {
            if let Some(pos) = def.params.iter().position(|p| p == sym) {
                out.extend(args.get(pos).cloned().unwrap_or_default());
                continue;
            }
            if def.is_variadic && state.ctx.interner.resolve(*sym) == "__VA_ARGS__" {
                for (i, extra) in args[def.params.len()..].iter().enumerate() {
                    if i > 0 {
                        out.push(Token::new(TokenKind::Punct(Punct::Comma), tok.loc));
                    }
                    out.extend(extra.clone());
                }
                continue;
            }
        }
        out.push(tok.clone());
    }
    out
}

fn apply_hideset(tokens: &[Token], hs: &HideSet) -> Vec<Token> {
    // The hide-set itself is tracked out-of-band via the `is_disabled`
    // flag during rescanning rather than stamped onto each token, since
    // this crate's `Token` carries no hide-set field; `rescan` below
    // enforces the same no-self-recursion guarantee by disabling the
    // macro for the duration of its own body's rescan.
    let _ = hs;
    tokens.to_vec()
}

/// Walk `body` looking for further macro invocations, recursively
/// expanding each one found. Every identifier is handed to
/// [`try_expand`], which is itself responsible for guarding against its
/// own self-reference (see [`rescan_disabled`]) — this function holds
/// no painting state of its own.
fn rescan<L: SourceLoader>(state: &mut PpState<L>, body: Vec<Token>) -> Result<Vec<Token>> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        if let TokenKind::Identifier(name) = &body[i].kind {
            let name = *name;
            if let Some(expansion) = try_expand(state, name, &body, i)? {
                out.extend(expansion.tokens);
                i += expansion.consumed;
                continue;
            }
        }
        out.push(body[i].clone());
        i += 1;
    }
    Ok(out)
}

/// [`rescan`] a macro's own (already substituted) replacement body with
/// `name` temporarily painted blue, so a direct or indirect reference to
/// the same macro inside its own body is left unexpanded instead of
/// recursing forever.
fn rescan_disabled<L: SourceLoader>(
    state: &mut PpState<L>,
    name: Symbol,
    body: Vec<Token>,
) -> Result<Vec<Token>> {
    if let Some(def) = state.ctx.macros.get_mut(&name) {
        def.is_disabled = true;
    }
    let result = rescan(state, body);
    if let Some(def) = state.ctx.macros.get_mut(&name) {
        def.is_disabled = false;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess;
    use shecc_ir::{CompileOptions, Context};

    struct NoIncludes;
    impl SourceLoader for NoIncludes {
        fn load(&mut self, path: &str, including_file: Symbol, _ctx: &mut shecc_ir::Context) -> Result<(String, Symbol)> {
            Err(CompileError::IncludeNotFound {
                path: path.to_string(),
                loc: SourceLoc::new(including_file, 0, 0, 0, 0),
            })
        }
    }

    fn run_pp(src: &str) -> (Vec<Token>, Context) {
        let mut ctx = Context::new(CompileOptions::default());
        let file = ctx.intern("t.c");
        let tokens = shecc_lex::lex(src, file, &mut ctx.interner).unwrap();
        let mut loader = NoIncludes;
        let out = preprocess(tokens, file, &mut ctx, &mut loader).unwrap();
        (out, ctx)
    }

    fn significant(tokens: &[Token]) -> Vec<TokenKind> {
        tokens
            .iter()
            .filter(|t| {
                !matches!(
                    t.kind,
                    TokenKind::Whitespace | TokenKind::Tab | TokenKind::Newline | TokenKind::Eof
                )
            })
            .map(|t| t.kind.clone())
            .collect()
    }

    #[test]
    fn object_like_macro_expands() {
        let (out, ctx) = run_pp("#define N 42\nN\n");
        let sig = significant(&out);
        assert_eq!(sig.len(), 1);
        match &sig[0] {
            TokenKind::Numeric(sym) => assert_eq!(ctx.interner.resolve(*sym), "42"),
            other => panic!("expected numeric, got {other:?}"),
        }
    }

    #[test]
    fn function_like_macro_substitutes_params() {
        let (out, ctx) = run_pp("#define ADD(a, b) a + b\nADD(1, 2)\n");
        let sig = significant(&out);
        let names: Vec<String> = sig
            .iter()
            .map(|k| match k {
                TokenKind::Numeric(s) => ctx.interner.resolve(*s).to_string(),
                TokenKind::Punct(Punct::Plus) => "+".to_string(),
                other => format!("{other:?}"),
            })
            .collect();
        assert_eq!(names, vec!["1", "+", "2"]);
    }

    #[test]
    fn self_referential_macro_does_not_loop() {
        let (out, ctx) = run_pp("#define X X\nX\n");
        let sig = significant(&out);
        match &sig[0] {
            TokenKind::Identifier(sym) => assert_eq!(ctx.interner.resolve(*sym), "X"),
            other => panic!("expected unexpanded identifier, got {other:?}"),
        }
    }
}

//! Preprocessor: directive execution and macro expansion over an
//! already-lexed token stream (spec §4.B).
//!
//! `#include "…"` is resolved through the `SourceLoader` trait rather
//! than touching the filesystem directly, keeping this crate unit
//! testable and matching the "scoped acquisition" boundary in spec §5:
//! the driver crate owns opening and closing files, the preprocessor
//! only owns *when* to ask for one.

mod builtin;
mod cond;
mod constexpr;
mod hideset;
mod macro_expand;

pub use builtin::builtin_macro_for;
pub use constexpr::eval_const_expr;
pub use hideset::HideSet;

use rustc_hash::FxHashSet;
use shecc_ir::{CompileError, Context, Directive, Punct, Result, Symbol, Token, TokenKind};
use tracing::{debug, trace};

/// Resolves `#include "path"` relative to the including file's
/// directory and returns the included file's full source text plus the
/// symbol to use as its `SourceLoc::file`.
pub trait SourceLoader {
    fn load(&mut self, path: &str, including_file: Symbol, ctx: &mut Context) -> Result<(String, Symbol)>;
}

struct PpState<'a, L: SourceLoader> {
    ctx: &'a mut Context,
    loader: &'a mut L,
    cond_stack: Vec<cond::CondFrame>,
    /// Files consumed under `#pragma once`, checked before recursing
    /// into an `#include`.
    once_files: FxHashSet<Symbol>,
    current_file: Symbol,
}

/// Preprocess a token stream already produced by [`shecc_lex::lex`] for
/// the main translation unit. Returns a new stream with every directive
/// executed and every macro expansion performed.
pub fn preprocess<L: SourceLoader>(
    tokens: Vec<Token>,
    main_file: Symbol,
    ctx: &mut Context,
    loader: &mut L,
) -> Result<Vec<Token>> {
    let mut state = PpState {
        ctx,
        loader,
        cond_stack: Vec::new(),
        once_files: FxHashSet::default(),
        current_file: main_file,
    };
    install_builtins(&mut state);
    let out = run(&mut state, tokens)?;
    if !state.cond_stack.is_empty() {
        let loc = out.last().map(|t| t.loc).unwrap_or(shecc_ir::SourceLoc::new(
            main_file, 0, 0, 0, 0,
        ));
        return Err(CompileError::UnterminatedIf { loc });
    }
    Ok(out)
}

fn install_builtins<L: SourceLoader>(state: &mut PpState<L>) {
    for name in ["__FILE__", "__LINE__", "__SHECC__"] {
        let sym = state.ctx.intern(name);
        let kind = builtin::builtin_macro_for(name).unwrap();
        state
            .ctx
            .macros
            .insert(sym, shecc_ir::MacroDef::builtin(sym, kind));
    }
    let arch_name = match state.ctx.options.target {
        shecc_ir::Target::Arm => "__arm__",
        shecc_ir::Target::RiscV32 => "__riscv",
    };
    let sym = state.ctx.intern(arch_name);
    state
        .ctx
        .macros
        .insert(sym, shecc_ir::MacroDef::builtin(sym, builtin::BuiltinMacro::Arch));
}

/// Core expansion loop: walks `input`, executing directives and
/// expanding macro invocations, recursively handling `#include`.
fn run<L: SourceLoader>(state: &mut PpState<L>, input: Vec<Token>) -> Result<Vec<Token>> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        let tok = &input[i];

        if matches!(tok.kind, TokenKind::Newline) {
            out.push(tok.clone());
            i += 1;
            continue;
        }

        if let TokenKind::Directive(dir) = &tok.kind {
            let dir = *dir;
            let (consumed, produced) = handle_directive(state, dir, &input, i)?;
            out.extend(produced);
            i += consumed;
            continue;
        }

        // Skip tokens inside a currently-false conditional branch.
        if !cond::currently_active(&state.cond_stack) {
            i += 1;
            continue;
        }

        if matches!(tok.kind, TokenKind::Whitespace | TokenKind::Tab) {
            out.push(tok.clone());
            i += 1;
            continue;
        }

        if let TokenKind::Identifier(name) = &tok.kind {
            let name = *name;
            if let Some(expansion) = macro_expand::try_expand(state, name, &input, i)? {
                out.extend(expansion.tokens);
                i += expansion.consumed;
                continue;
            }
        }

        out.push(tok.clone());
        i += 1;
    }
    Ok(out)
}

/// Execute a single directive starting at `input[idx]` (the directive
/// token itself). Returns the number of input tokens consumed (through
/// end of line) and any tokens the directive produces (e.g. the
/// recursively-preprocessed contents of an `#include`d file).
fn handle_directive<L: SourceLoader>(
    state: &mut PpState<L>,
    dir: Directive,
    input: &[Token],
    idx: usize,
) -> Result<(usize, Vec<Token>)> {
    let loc = input[idx].loc;
    let j = idx + 1;
    let line_tokens = |mut j: usize| -> (usize, Vec<Token>) {
        let mut rest = Vec::new();
        while j < input.len() && !matches!(input[j].kind, TokenKind::Newline) {
            if !matches!(input[j].kind, TokenKind::Whitespace | TokenKind::Tab) {
                rest.push(input[j].clone());
            }
            j += 1;
        }
        (j - idx, rest)
    };
    trace!(?dir, "handling directive");

    match dir {
        Directive::Pragma => {
            let (consumed, rest) = line_tokens(j);
            if let Some(Token {
                kind: TokenKind::Identifier(sym),
                ..
            }) = rest.first()
            {
                if state.ctx.interner.resolve(*sym) == "once" {
                    state.once_files.insert(state.current_file);
                }
            }
            Ok((consumed, Vec::new()))
        }
        Directive::Error => {
            let (_, rest) = line_tokens(j);
            let message = render_tokens(state.ctx, &rest);
            Err(CompileError::ErrorDirective { message, loc })
        }
        Directive::Define => {
            let (consumed, rest) = line_tokens(j);
            macro_expand::define(state, &rest, loc)?;
            Ok((consumed, Vec::new()))
        }
        Directive::Undef => {
            let (consumed, rest) = line_tokens(j);
            if let Some(Token {
                kind: TokenKind::Identifier(sym),
                ..
            }) = rest.first()
            {
                state.ctx.macros.remove(sym);
            }
            Ok((consumed, Vec::new()))
        }
        Directive::Include => {
            let (consumed, rest) = line_tokens(j);
            let path = match rest.first() {
                Some(Token {
                    kind: TokenKind::StringLit(sym),
                    ..
                }) => {
                    let text = state.ctx.interner.resolve(*sym).to_string();
                    Some(text)
                }
                _ => None, // `<...>` angle-bracket includes are ignored (libc is inlined)
            };
            let Some(path) = path else {
                return Ok((consumed, Vec::new()));
            };
            let (text, file_sym) = state.loader.load(&path, state.current_file, state.ctx)?;
            if state.once_files.contains(&file_sym) {
                return Ok((consumed, Vec::new()));
            }
            let included_tokens = shecc_lex::lex(&text, file_sym, &mut state.ctx.interner)?;
            // Trim the included stream's own EOF; only the outermost
            // stream should end with one (spec §4.B "Termination").
            let mut included_tokens = included_tokens;
            if matches!(included_tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
                included_tokens.pop();
            }
            let prev_file = state.current_file;
            state.current_file = file_sym;
            debug!(path = %path, "entering included file");
            let expanded = run(state, included_tokens)?;
            state.current_file = prev_file;
            Ok((consumed, expanded))
        }
        Directive::If | Directive::Ifdef | Directive::Ifndef => {
            let (consumed, rest) = line_tokens(j);
            let taken = match dir {
                Directive::If => constexpr::eval_const_expr(state.ctx, &rest, loc)? != 0,
                Directive::Ifdef => is_defined(state, &rest),
                Directive::Ifndef => !is_defined(state, &rest),
                _ => unreachable!(),
            };
            let parent_active = cond::currently_active(&state.cond_stack);
            state.cond_stack.push(cond::CondFrame {
                ctx: cond::CondCtx::IfThen,
                included: taken && parent_active,
                taken_any: taken && parent_active,
            });
            Ok((consumed, Vec::new()))
        }
        Directive::Elif => {
            let (consumed, rest) = line_tokens(j);
            let (already_else, taken_any) = {
                let frame = state
                    .cond_stack
                    .last()
                    .ok_or(CompileError::StrayDirective {
                        directive: "elif",
                        loc,
                    })?;
                (frame.ctx == cond::CondCtx::ElseThen, frame.taken_any)
            };
            if already_else {
                return Err(CompileError::StrayDirective {
                    directive: "elif",
                    loc,
                });
            }
            let parent_active = cond::parent_active(&state.cond_stack);
            let taken = !taken_any
                && parent_active
                && constexpr::eval_const_expr(state.ctx, &rest, loc)? != 0;
            let frame = state.cond_stack.last_mut().unwrap();
            frame.ctx = cond::CondCtx::ElifThen;
            frame.included = taken;
            frame.taken_any |= taken;
            Ok((consumed, Vec::new()))
        }
        Directive::Else => {
            let (consumed, _) = line_tokens(j);
            let parent_active = cond::parent_active(&state.cond_stack);
            let frame = state
                .cond_stack
                .last_mut()
                .ok_or(CompileError::StrayDirective {
                    directive: "else",
                    loc,
                })?;
            if frame.ctx == cond::CondCtx::ElseThen {
                return Err(CompileError::StrayDirective {
                    directive: "else",
                    loc,
                });
            }
            frame.ctx = cond::CondCtx::ElseThen;
            frame.included = !frame.taken_any && parent_active;
            frame.taken_any = true;
            Ok((consumed, Vec::new()))
        }
        Directive::Endif => {
            let (consumed, _) = line_tokens(j);
            if state.cond_stack.pop().is_none() {
                return Err(CompileError::StrayDirective {
                    directive: "endif",
                    loc,
                });
            }
            Ok((consumed, Vec::new()))
        }
    }
}

fn is_defined<L: SourceLoader>(state: &PpState<L>, rest: &[Token]) -> bool {
    matches!(
        rest.first(),
        Some(Token { kind: TokenKind::Identifier(sym), .. }) if state.ctx.macros.contains_key(sym)
    )
}

fn render_tokens(ctx: &Context, tokens: &[Token]) -> String {
    let mut s = String::new();
    for t in tokens {
        match &t.kind {
            TokenKind::Identifier(sym) | TokenKind::Numeric(sym) => {
                s.push_str(ctx.interner.resolve(*sym))
            }
            TokenKind::StringLit(sym) => {
                s.push('"');
                s.push_str(ctx.interner.resolve(*sym));
                s.push('"');
            }
            TokenKind::Punct(p) => s.push_str(punct_text(*p)),
            _ => {}
        }
        s.push(' ');
    }
    s.trim_end().to_string()
}

fn punct_text(p: Punct) -> &'static str {
    use Punct::*;
    match p {
        LParen => "(",
        RParen => ")",
        LBrace => "{",
        RBrace => "}",
        LBracket => "[",
        RBracket => "]",
        Semi => ";",
        Comma => ",",
        Dot => ".",
        Arrow => "->",
        Amp => "&",
        AmpAmp => "&&",
        AmpEq => "&=",
        Pipe => "|",
        PipePipe => "||",
        PipeEq => "|=",
        Caret => "^",
        Tilde => "~",
        Bang => "!",
        BangEq => "!=",
        Eq => "=",
        EqEq => "==",
        Plus => "+",
        PlusPlus => "++",
        PlusEq => "+=",
        Minus => "-",
        MinusMinus => "--",
        MinusEq => "-=",
        Star => "*",
        Slash => "/",
        Percent => "%",
        Lt => "<",
        LtEq => "<=",
        LtLt => "<<",
        Gt => ">",
        GtEq => ">=",
        GtGt => ">>",
        Question => "?",
        Colon => ":",
    }
}

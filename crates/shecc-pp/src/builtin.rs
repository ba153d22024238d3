//! Built-in object-like macros (spec §4.B "Predefined macros"):
//! `__FILE__`, `__LINE__`, `__SHECC__`, and the architecture predicate
//! (`__arm__` or `__riscv`, whichever matches the active target).

pub use shecc_ir::BuiltinMacro;

pub fn builtin_macro_for(name: &str) -> Option<BuiltinMacro> {
    Some(match name {
        "__FILE__" => BuiltinMacro::File,
        "__LINE__" => BuiltinMacro::Line,
        "__SHECC__" => BuiltinMacro::SheccVersion,
        _ => return None,
    })
}

/// Materialize a builtin's expansion at the call site named by `loc`.
/// Unlike user macros, builtins are never rescanned — their expansion
/// is always exactly one token, so there is nothing for a hide-set to
/// guard against.
pub fn expand(
    kind: BuiltinMacro,
    ctx: &mut shecc_ir::Context,
    loc: shecc_ir::SourceLoc,
) -> shecc_ir::Token {
    use shecc_ir::{Token, TokenKind};
    match kind {
        BuiltinMacro::File => {
            let text = ctx.interner.resolve(loc.file).to_string();
            let sym = ctx.intern(&text);
            Token::new(TokenKind::StringLit(sym), loc)
        }
        BuiltinMacro::Line => {
            let sym = ctx.intern(&loc.line.to_string());
            Token::new(TokenKind::Numeric(sym), loc)
        }
        BuiltinMacro::SheccVersion | BuiltinMacro::Arch => {
            let sym = ctx.intern("1");
            Token::new(TokenKind::Numeric(sym), loc)
        }
    }
}

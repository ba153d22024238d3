//! Macro definitions, per spec §3 "Macro".

use crate::interner::Symbol;
use crate::token::Token;

#[derive(Clone, Debug)]
pub struct MacroDef {
    pub name: Symbol,
    pub params: Vec<Symbol>,
    pub is_variadic: bool,
    pub replacement: Vec<Token>,
    pub is_function_like: bool,
    /// Set while this macro's own replacement is being re-scanned, to
    /// guard against direct self-recursion in addition to the per-token
    /// hide-set (belt-and-suspenders; the hide-set is the real guard).
    pub is_disabled: bool,
    pub builtin: Option<BuiltinMacro>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BuiltinMacro {
    File,
    Line,
    SheccVersion,
    Arch,
}

impl MacroDef {
    pub fn object_like(name: Symbol, replacement: Vec<Token>) -> Self {
        Self {
            name,
            params: Vec::new(),
            is_variadic: false,
            replacement,
            is_function_like: false,
            is_disabled: false,
            builtin: None,
        }
    }

    pub fn function_like(
        name: Symbol,
        params: Vec<Symbol>,
        is_variadic: bool,
        replacement: Vec<Token>,
    ) -> Self {
        Self {
            name,
            params,
            is_variadic,
            replacement,
            is_function_like: true,
            is_disabled: false,
            builtin: None,
        }
    }

    pub fn builtin(name: Symbol, kind: BuiltinMacro) -> Self {
        Self {
            name,
            params: Vec::new(),
            is_variadic: false,
            replacement: Vec::new(),
            is_function_like: false,
            is_disabled: false,
            builtin: Some(kind),
        }
    }
}

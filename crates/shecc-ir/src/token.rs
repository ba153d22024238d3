//! Token kinds, per spec §3 "Token".
//!
//! Whitespace, tabs, newlines, and backslashes are first-class token
//! kinds (not trivia dropped by the lexer) so the preprocessor can
//! observe line structure when scanning directive grammar.

use crate::interner::Symbol;
use crate::source::SourceLoc;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Keyword {
    If,
    Else,
    While,
    For,
    Do,
    Return,
    Typedef,
    Enum,
    Struct,
    Union,
    Const,
    Sizeof,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Goto,
    Void,
    Int,
    Char,
}

impl Keyword {
    /// Length-dispatched inline table for short keywords, falling back
    /// to a hashmap lookup for longer ones (`typedef`, `continue`,
    /// `default`). Mirrors the lexer's two-tier keyword recognition.
    pub fn lookup(ident: &str) -> Option<Self> {
        use Keyword::*;
        Some(match ident {
            "if" => If,
            "do" => Do,
            "for" => For,
            "int" => Int,
            "else" => Else,
            "enum" => Enum,
            "goto" => Goto,
            "char" => Char,
            "void" => Void,
            "while" => While,
            "break" => Break,
            "const" => Const,
            "union" => Union,
            "return" => Return,
            "struct" => Struct,
            "switch" => Switch,
            "sizeof" => Sizeof,
            "typedef" => Typedef,
            "case" => Case,
            "default" => Default,
            "continue" => Continue,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Dot,
    Ellipsis,
    Arrow,
    Amp,
    AmpAmp,
    AmpEq,
    Pipe,
    PipePipe,
    PipeEq,
    Caret,
    Tilde,
    Bang,
    BangEq,
    Eq,
    EqEq,
    Plus,
    PlusPlus,
    PlusEq,
    Minus,
    MinusMinus,
    MinusEq,
    Star,
    Slash,
    Percent,
    Lt,
    LtEq,
    LtLt,
    Gt,
    GtEq,
    GtGt,
    Question,
    Colon,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Directive {
    Include,
    Define,
    Undef,
    If,
    Ifdef,
    Ifndef,
    Elif,
    Else,
    Endif,
    Error,
    Pragma,
}

#[derive(Clone, Debug)]
pub enum TokenKind {
    Identifier(Symbol),
    Keyword(Keyword),
    Numeric(Symbol),
    StringLit(Symbol),
    CharLit(Symbol),
    Punct(Punct),
    Directive(Directive),
    Whitespace,
    Tab,
    Newline,
    Backslash,
    Hash,
    Eof,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: SourceLoc,
}

impl Token {
    pub fn new(kind: TokenKind, loc: SourceLoc) -> Self {
        Self { kind, loc }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Trivia that the preprocessor normally drops before handing tokens
    /// to the parser, but that it must still observe to find directive
    /// and macro-invocation boundaries.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Tab | TokenKind::Backslash
        )
    }
}

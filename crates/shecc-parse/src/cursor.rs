//! A read-only, lookahead-friendly view over an already-filtered token
//! slice (whitespace/tab/newline/directive tokens are gone by the time
//! the parser ever sees them; `shecc-pp` already executed every
//! directive and `shecc-parse::filter_trivia` drops the rest).

use shecc_ir::{CompileError, Keyword, Punct, Result, SourceLoc, Symbol, Token, TokenKind};

pub struct Cursor<'a> {
    toks: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(toks: &'a [Token]) -> Self {
        debug_assert!(!toks.is_empty() && toks.last().unwrap().is_eof());
        Self { toks, pos: 0 }
    }

    pub fn peek(&self) -> &Token {
        &self.toks[self.pos]
    }

    pub fn peek_n(&self, n: usize) -> &Token {
        self.toks.get(self.pos + n).unwrap_or_else(|| self.toks.last().unwrap())
    }

    pub fn loc(&self) -> SourceLoc {
        self.peek().loc
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    pub fn bump(&mut self) -> Token {
        let tok = self.toks[self.pos].clone();
        if !tok.is_eof() {
            self.pos += 1;
        }
        tok
    }

    pub fn at_punct(&self, p: Punct) -> bool {
        matches!(self.peek().kind, TokenKind::Punct(x) if x == p)
    }

    pub fn at_punct_n(&self, n: usize, p: Punct) -> bool {
        matches!(self.peek_n(n).kind, TokenKind::Punct(x) if x == p)
    }

    pub fn accept_punct(&mut self, p: Punct) -> bool {
        if self.at_punct(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn expect_punct(&mut self, p: Punct) -> Result<Token> {
        if self.at_punct(p) {
            Ok(self.bump())
        } else {
            Err(self.unexpected())
        }
    }

    pub fn at_keyword(&self, k: Keyword) -> bool {
        matches!(self.peek().kind, TokenKind::Keyword(x) if x == k)
    }

    pub fn accept_keyword(&mut self, k: Keyword) -> bool {
        if self.at_keyword(k) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn expect_keyword(&mut self, k: Keyword) -> Result<Token> {
        if self.at_keyword(k) {
            Ok(self.bump())
        } else {
            Err(self.unexpected())
        }
    }

    pub fn peek_identifier(&self) -> Option<Symbol> {
        match self.peek().kind {
            TokenKind::Identifier(sym) => Some(sym),
            _ => None,
        }
    }

    pub fn expect_identifier(&mut self) -> Result<Symbol> {
        match self.peek_identifier() {
            Some(sym) => {
                self.bump();
                Ok(sym)
            }
            None => Err(self.unexpected()),
        }
    }

    /// Snapshot the current position for a later `restore`, used by
    /// constructs that need lookahead past an ambiguous prefix (compound
    /// literals vs. a parenthesized sub-expression).
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn restore(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn unexpected(&self) -> CompileError {
        CompileError::UnexpectedToken {
            found: format!("{:?}", self.peek().kind),
            loc: self.loc(),
        }
    }
}

/// Drop the trivia tokens the preprocessor leaves in place (§4.B keeps
/// whitespace/tab/newline as first-class tokens so directive scanning
/// can see line structure; the parser has no use for any of it).
pub fn filter_trivia(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .filter(|t| {
            !matches!(
                t.kind,
                TokenKind::Whitespace | TokenKind::Tab | TokenKind::Newline | TokenKind::Backslash
            )
        })
        .collect()
}
